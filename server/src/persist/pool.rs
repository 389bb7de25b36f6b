use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Condvar, Mutex};

/// Fixed-size connection pool. `acquire` blocks on a condition variable
/// until a connection is free; the returned guard hands the connection
/// back on drop.
pub struct ConnectionPool<T> {
    inner: Arc<PoolInner<T>>,
}

struct PoolInner<T> {
    idle: Mutex<Vec<T>>,
    available: Condvar,
}

impl<T> ConnectionPool<T> {
    pub fn new(connections: Vec<T>) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                idle: Mutex::new(connections),
                available: Condvar::new(),
            }),
        }
    }

    pub fn idle_count(&self) -> usize {
        self.inner
            .idle
            .lock()
            .map(|idle| idle.len())
            .unwrap_or(0)
    }

    /// Blocks until a connection is available.
    pub fn acquire(&self) -> PooledConnection<T> {
        let mut idle = self
            .inner
            .idle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        loop {
            if let Some(connection) = idle.pop() {
                return PooledConnection {
                    connection: Some(connection),
                    pool: Arc::clone(&self.inner),
                };
            }
            idle = self
                .inner
                .available
                .wait(idle)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// Non-blocking variant.
    pub fn try_acquire(&self) -> Option<PooledConnection<T>> {
        let mut idle = self
            .inner
            .idle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        idle.pop().map(|connection| PooledConnection {
            connection: Some(connection),
            pool: Arc::clone(&self.inner),
        })
    }
}

impl<T> Clone for ConnectionPool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// RAII guard over a pooled connection.
pub struct PooledConnection<T> {
    connection: Option<T>,
    pool: Arc<PoolInner<T>>,
}

impl<T> Deref for PooledConnection<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.connection.as_ref().expect("connection present until drop")
    }
}

impl<T> DerefMut for PooledConnection<T> {
    fn deref_mut(&mut self) -> &mut T {
        self.connection.as_mut().expect("connection present until drop")
    }
}

impl<T> Drop for PooledConnection<T> {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            let mut idle = self
                .pool
                .idle
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            idle.push(connection);
            self.pool.available.notify_one();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn connections_return_on_drop() {
        let pool = ConnectionPool::new(vec![1, 2]);
        let a = pool.acquire();
        let b = pool.acquire();
        assert_eq!(pool.idle_count(), 0);
        assert!(pool.try_acquire().is_none());

        drop(a);
        assert_eq!(pool.idle_count(), 1);
        drop(b);
        assert_eq!(pool.idle_count(), 2);
    }

    #[test]
    fn acquire_blocks_until_a_connection_frees() {
        let pool = ConnectionPool::new(vec![0u32]);
        let held = pool.acquire();

        let pool_clone = pool.clone();
        let waiter = thread::spawn(move || {
            let connection = pool_clone.acquire();
            *connection
        });

        thread::sleep(Duration::from_millis(50));
        drop(held);
        assert_eq!(waiter.join().unwrap(), 0);
    }
}
