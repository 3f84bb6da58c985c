//! Synchronous observable value.
//!
//! A [`ReactiveCell`] holds one value and an ordered list of subscribers.
//! Every `set` hands the new value to each subscriber, in the order they
//! subscribed, before returning. A new subscriber is called once right away
//! with the current value, so it never has to poll.
//!
//! The cell is single-threaded (`Rc` + `RefCell`) and holds no borrow while
//! a subscriber runs. A subscriber may therefore read the cell, set it,
//! subscribe to it or unsubscribe from it. A nested `set` finishes its own
//! notification pass before the outer pass resumes; the outer pass keeps
//! delivering the value it started with.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

type Callback<T> = Rc<dyn Fn(&T)>;

struct Subscriber<T> {
    id: u64,
    callback: Callback<T>,
    // Cleared on unsubscribe; lets an in-flight pass skip it without a scan.
    live: Rc<Cell<bool>>,
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Subscriber {
            id: self.id,
            callback: Rc::clone(&self.callback),
            live: Rc::clone(&self.live),
        }
    }
}

struct Inner<T> {
    value: T,
    subscribers: Vec<Subscriber<T>>,
    next_id: u64,
}

/// Shared handle to an observable value. Clones observe the same value.
pub struct ReactiveCell<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T: Clone + 'static> ReactiveCell<T> {
    pub fn new(value: T) -> Self {
        ReactiveCell {
            inner: Rc::new(RefCell::new(Inner {
                value,
                subscribers: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Returns a copy of the current value.
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Runs `f` against the current value without cloning it.
    ///
    /// # Panics
    ///
    /// The value stays borrowed while `f` runs, so calling `set`, `update`
    /// or `subscribe` on this cell from inside `f` panics with a
    /// `BorrowMutError`. Use [`get`](Self::get) when `f` needs to write back.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Replaces the value and notifies every subscriber with it.
    pub fn set(&self, value: T) {
        let (value, subscribers) = {
            let mut inner = self.inner.borrow_mut();
            inner.value = value;
            (inner.value.clone(), inner.subscribers.clone())
        };

        for subscriber in subscribers {
            // Skip subscribers removed earlier in this pass.
            if subscriber.live.get() {
                invoke(subscriber.id, &subscriber.callback, &value);
            }
        }
    }

    /// Sets the value to `f(current)`.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = f(&self.inner.borrow().value);
        self.set(next);
    }

    /// Registers `callback` and calls it once with the current value.
    ///
    /// The returned [`Subscription`] removes the callback. Dropping it does
    /// not; the callback then stays registered for the life of the cell.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + 'static,
    {
        let callback: Callback<T> = Rc::new(callback);
        let live = Rc::new(Cell::new(true));
        let (id, current) = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.subscribers.push(Subscriber {
                id,
                callback: Rc::clone(&callback),
                live: Rc::clone(&live),
            });
            (id, inner.value.clone())
        };

        invoke(id, &callback, &current);

        let weak = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            live.set(false);
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().subscribers.retain(|s| s.id != id);
            }
        })
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }
}

/// A panicking subscriber is logged and skipped; the rest still run.
fn invoke<T>(id: u64, callback: &Callback<T>, value: &T) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback(value))) {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        tracing::error!("Subscriber {} panicked during notification: {}", id, message);
    }
}

impl<T> Clone for ReactiveCell<T> {
    fn clone(&self) -> Self {
        ReactiveCell {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Default + 'static> Default for ReactiveCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for ReactiveCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ReactiveCell")
            .field("value", &inner.value)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

/// Handle returned by [`ReactiveCell::subscribe`].
///
/// `unsubscribe` may be called any number of times; only the first call
/// has an effect.
pub struct Subscription {
    remove: Cell<Option<Box<dyn FnOnce()>>>,
}

impl Subscription {
    fn new(remove: impl FnOnce() + 'static) -> Self {
        Subscription {
            remove: Cell::new(Some(Box::new(remove))),
        }
    }

    pub fn unsubscribe(&self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }

    pub fn is_active(&self) -> bool {
        // Cell<Option<Box<_>>> cannot be inspected without taking it.
        let remove = self.remove.take();
        let active = remove.is_some();
        self.remove.set(remove);
        active
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder<T: Clone + 'static>() -> (Rc<RefCell<Vec<T>>>, impl Fn(&T) + 'static) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        (seen, move |value: &T| sink.borrow_mut().push(value.clone()))
    }

    #[test]
    fn test_get_and_set() {
        let cell = ReactiveCell::new(None::<String>);
        assert_eq!(cell.get(), None);

        cell.set(Some("abc".to_string()));
        assert_eq!(cell.get(), Some("abc".to_string()));
        assert!(cell.with(|v| v.as_deref() == Some("abc")));
    }

    #[test]
    fn test_subscribe_replays_current_value() {
        let cell = ReactiveCell::new(7);
        let (seen, callback) = recorder();

        let _subscription = cell.subscribe(callback);
        assert_eq!(*seen.borrow(), vec![7]);
    }

    #[test]
    fn test_set_notifies_once_per_set() {
        let cell = ReactiveCell::new(0);
        let (seen, callback) = recorder();
        let _subscription = cell.subscribe(callback);

        cell.set(1);
        cell.set(2);
        // Equal values are still delivered.
        cell.set(2);
        assert_eq!(*seen.borrow(), vec![0, 1, 2, 2]);
    }

    #[test]
    fn test_subscribers_run_in_subscription_order() {
        let cell = ReactiveCell::new(0);
        let order = Rc::new(RefCell::new(Vec::new()));

        let mut subscriptions = Vec::new();
        for name in ["first", "second", "third"] {
            let order = Rc::clone(&order);
            subscriptions.push(cell.subscribe(move |_| order.borrow_mut().push(name)));
        }
        order.borrow_mut().clear();

        cell.set(1);
        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let cell = ReactiveCell::new(0);
        let (seen, callback) = recorder();
        let subscription = cell.subscribe(callback);

        cell.set(1);
        subscription.unsubscribe();
        cell.set(2);

        assert_eq!(*seen.borrow(), vec![0, 1]);
        assert_eq!(cell.subscriber_count(), 0);
        assert!(!subscription.is_active());
    }

    #[test]
    fn test_unsubscribe_twice_is_noop() {
        let cell = ReactiveCell::new(0);
        let (seen_a, callback_a) = recorder();
        let (seen_b, callback_b) = recorder();
        let a = cell.subscribe(callback_a);
        let _b = cell.subscribe(callback_b);

        a.unsubscribe();
        a.unsubscribe();
        assert_eq!(cell.subscriber_count(), 1);

        cell.set(5);
        assert_eq!(*seen_a.borrow(), vec![0]);
        assert_eq!(*seen_b.borrow(), vec![0, 5]);
    }

    #[test]
    fn test_unsubscribe_after_cell_dropped() {
        let cell = ReactiveCell::new(0);
        let subscription = cell.subscribe(|_| {});
        drop(cell);
        subscription.unsubscribe();
        assert!(!subscription.is_active());
    }

    #[test]
    fn test_dropping_subscription_keeps_callback() {
        let cell = ReactiveCell::new(0);
        let (seen, callback) = recorder();
        drop(cell.subscribe(callback));

        cell.set(1);
        assert_eq!(*seen.borrow(), vec![0, 1]);
    }

    #[test]
    fn test_panicking_subscriber_does_not_block_others() {
        let cell = ReactiveCell::new(0);
        let _bad = cell.subscribe(|value: &i32| {
            if *value > 0 {
                panic!("subscriber failure");
            }
        });
        let (seen, callback) = recorder();
        let _good = cell.subscribe(callback);

        cell.set(1);
        cell.set(2);
        assert_eq!(cell.get(), 2);
        assert_eq!(*seen.borrow(), vec![0, 1, 2]);
        assert_eq!(cell.subscriber_count(), 2);
    }

    #[test]
    fn test_reentrant_set_renotifies() {
        let cell = ReactiveCell::new(0);
        let writer = cell.clone();
        // Clamp anything above 10 back to 10.
        let _clamp = cell.subscribe(move |value: &i32| {
            if *value > 10 {
                writer.set(10);
            }
        });
        let (seen, callback) = recorder();
        let _observer = cell.subscribe(callback);

        cell.set(42);
        assert_eq!(cell.get(), 10);
        // Nested pass delivers 10 first, then the outer pass resumes with 42.
        assert_eq!(*seen.borrow(), vec![0, 10, 42]);
    }

    #[test]
    fn test_unsubscribe_during_notification_skips_removed() {
        let cell = ReactiveCell::new(0);
        let later: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let handle = Rc::clone(&later);
        let _remover = cell.subscribe(move |value: &i32| {
            if *value == 1
                && let Some(subscription) = handle.borrow().as_ref()
            {
                subscription.unsubscribe();
            }
        });
        let (seen, callback) = recorder();
        *later.borrow_mut() = Some(cell.subscribe(callback));

        cell.set(1);
        assert_eq!(*seen.borrow(), vec![0]);
    }

    #[test]
    fn test_subscribe_during_notification_gets_replay_only() {
        let cell = ReactiveCell::new(0);
        let (seen, callback) = recorder();
        let callback = Rc::new(callback);
        let subscriptions: Rc<RefCell<Vec<Subscription>>> = Rc::new(RefCell::new(Vec::new()));

        let source = cell.clone();
        let subs = Rc::clone(&subscriptions);
        let _spawner = cell.subscribe(move |value: &i32| {
            if *value == 1 {
                let callback = Rc::clone(&callback);
                subs.borrow_mut()
                    .push(source.subscribe(move |v: &i32| callback(v)));
            }
        });

        cell.set(1);
        assert_eq!(*seen.borrow(), vec![1]);
        cell.set(2);
        assert_eq!(*seen.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_update() {
        let cell = ReactiveCell::new(vec![1]);
        let (seen, callback) = recorder();
        let _subscription = cell.subscribe(callback);

        cell.update(|v| {
            let mut next = v.clone();
            next.push(2);
            next
        });
        assert_eq!(cell.get(), vec![1, 2]);
        assert_eq!(seen.borrow().last(), Some(&vec![1, 2]));
    }

    #[test]
    #[should_panic(expected = "already borrowed")]
    fn test_set_inside_with_panics() {
        let cell = ReactiveCell::new(1);
        let writer = cell.clone();
        cell.with(|v| writer.set(*v + 1));
    }

    #[test]
    fn test_clones_share_value() {
        let cell = ReactiveCell::<Option<u32>>::default();
        let other = cell.clone();
        other.set(Some(3));
        assert_eq!(cell.get(), Some(3));
        assert!(format!("{:?}", cell).contains("Some(3)"));
    }
}
