use std::rc::{Rc, Weak};

/// A stored callback with an optional owner-expiry handle. When the
/// owner token is dropped, invocation becomes a no-op, so handlers can
/// outlive the screens that registered them without dangling into torn-
/// down state.
pub struct Callback<T> {
    func: Box<dyn Fn(&T)>,
    owner: Option<Weak<()>>,
}

impl<T> Callback<T> {
    pub fn new(func: impl Fn(&T) + 'static) -> Self {
        Self {
            func: Box::new(func),
            owner: None,
        }
    }

    /// Ties the callback to an owner token; keep the `Rc` alive for as
    /// long as the callback should fire.
    pub fn with_owner(owner: &Rc<()>, func: impl Fn(&T) + 'static) -> Self {
        Self {
            func: Box::new(func),
            owner: Some(Rc::downgrade(owner)),
        }
    }

    /// Invokes the callback unless its owner expired. Returns whether
    /// it actually ran.
    pub fn invoke(&self, value: &T) -> bool {
        if let Some(owner) = &self.owner {
            if owner.upgrade().is_none() {
                return false;
            }
        }
        (self.func)(value);
        true
    }
}

/// Invokes an optional callback slot.
pub(crate) fn fire<T>(slot: &Option<Callback<T>>, value: &T) {
    if let Some(callback) = slot {
        callback.invoke(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn expired_owner_short_circuits() {
        let hits = Rc::new(Cell::new(0));

        let owner = Rc::new(());
        let callback = {
            let hits = hits.clone();
            Callback::with_owner(&owner, move |_: &i32| hits.set(hits.get() + 1))
        };

        assert!(callback.invoke(&1));
        assert_eq!(hits.get(), 1);

        drop(owner);
        assert!(!callback.invoke(&2));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn ownerless_callbacks_always_fire() {
        let hits = Rc::new(Cell::new(0));
        let callback = {
            let hits = hits.clone();
            Callback::new(move |_: &i32| hits.set(hits.get() + 1))
        };
        assert!(callback.invoke(&1));
        assert_eq!(hits.get(), 1);
    }
}
