//! Asynchronous resource loading and the texture LRU cache. Load work
//! runs on a small worker pool; completed results only become visible
//! when the main thread drains them via [`AsyncLoader::poll`], which
//! keeps the renderer and cache effectively single-threaded.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

pub type TaskId = u64;

type Job<T> = (TaskId, Box<dyn FnOnce() -> T + Send>);

/// Worker-pool loader. `submit` returns immediately with a task id;
/// finished results are collected with `poll(max_completions)` on the
/// main thread, oldest first.
pub struct AsyncLoader<T: Send + 'static> {
    job_tx: Sender<Job<T>>,
    result_rx: Receiver<(TaskId, T)>,
    next_task_id: TaskId,
    pending: usize,
}

impl<T: Send + 'static> AsyncLoader<T> {
    pub fn new(worker_count: usize) -> Self {
        let (job_tx, job_rx) = mpsc::channel::<Job<T>>();
        let (result_tx, result_rx) = mpsc::channel::<(TaskId, T)>();
        let job_rx = Arc::new(Mutex::new(job_rx));

        for index in 0..worker_count.max(1) {
            let job_rx = Arc::clone(&job_rx);
            let result_tx = result_tx.clone();
            thread::Builder::new()
                .name(format!("loader-{index}"))
                .spawn(move || loop {
                    let job = {
                        let job_rx = job_rx
                            .lock()
                            .unwrap_or_else(|poisoned| poisoned.into_inner());
                        job_rx.recv()
                    };
                    let Ok((task_id, work)) = job else {
                        return;
                    };
                    let result = work();
                    if result_tx.send((task_id, result)).is_err() {
                        return;
                    }
                })
                .expect("spawn loader worker");
        }

        Self {
            job_tx,
            result_rx,
            next_task_id: 1,
            pending: 0,
        }
    }

    /// Queues a load task on the pool.
    pub fn submit(&mut self, work: impl FnOnce() -> T + Send + 'static) -> TaskId {
        let task_id = self.next_task_id;
        self.next_task_id += 1;
        self.pending += 1;
        let _ = self.job_tx.send((task_id, Box::new(work)));
        task_id
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Drains up to `max_completions` finished tasks without blocking.
    pub fn poll(&mut self, max_completions: usize) -> Vec<(TaskId, T)> {
        let mut completed = Vec::new();
        while completed.len() < max_completions {
            match self.result_rx.try_recv() {
                Ok(result) => {
                    self.pending = self.pending.saturating_sub(1);
                    completed.push(result);
                }
                Err(_) => break,
            }
        }
        completed
    }

    /// Blocks until every submitted task has completed, returning the
    /// stragglers. Test helper; production code polls.
    pub fn drain_blocking(&mut self) -> Vec<(TaskId, T)> {
        let mut completed = Vec::new();
        while self.pending > 0 {
            match self.result_rx.recv() {
                Ok(result) => {
                    self.pending -= 1;
                    completed.push(result);
                }
                Err(_) => break,
            }
        }
        completed
    }
}

/// Least-recently-used cache with a shrinkable capacity. `get` counts
/// as a use.
pub struct LruCache<K: Eq + Hash + Clone, V> {
    entries: HashMap<K, (V, u64)>,
    capacity: usize,
    use_counter: u64,
}

impl<K: Eq + Hash + Clone, V> LruCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            use_counter: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.use_counter += 1;
        let counter = self.use_counter;
        match self.entries.get_mut(key) {
            Some((value, last_used)) => {
                *last_used = counter;
                Some(&*value)
            }
            None => None,
        }
    }

    pub fn put(&mut self, key: K, value: V) {
        self.use_counter += 1;
        let counter = self.use_counter;
        self.entries.insert(key, (value, counter));
        self.evict_to_capacity();
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|(value, _)| value)
    }

    /// Shrinks (or grows) the capacity, evicting LRU entries to fit.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        self.evict_to_capacity();
    }

    fn evict_to_capacity(&mut self) {
        while self.entries.len() > self.capacity {
            let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, (_, last_used))| *last_used)
                .map(|(key, _)| key.clone())
            else {
                break;
            };
            self.entries.remove(&oldest);
        }
    }
}
