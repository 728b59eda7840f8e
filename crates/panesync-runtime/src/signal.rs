#![forbid(unsafe_code)]

//! Minimal publish mechanism with weakly held subscribers.
//!
//! # Design
//!
//! [`ChangeNotifier<T>`] stores each handler as a `Weak` reference. The
//! strong `Rc` lives in the [`Subscription`] returned to the subscriber, so
//! a notifier never keeps its listeners alive and a listener never keeps the
//! notifier's owner alive. Dropping the subscription kills the handler; the
//! dead entry is pruned on the next emission.
//!
//! # Invariants
//!
//! 1. Live handlers run exactly once per `emit`, in subscription order.
//! 2. A handler whose subscription was dropped is never called again.
//! 3. Dead entries are pruned lazily during `emit`, not eagerly.
//!
//! Re-entrant `emit` (and `subscribe`) from inside a handler is allowed: the
//! live handler list is snapshotted before any handler runs.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type Handler<T> = Rc<dyn Fn(&T)>;
type WeakHandler<T> = Weak<dyn Fn(&T)>;

struct Slot<T: ?Sized> {
    id: u64,
    handler: WeakHandler<T>,
}

/// Publishes payloads of type `T` to weakly held handlers.
pub struct ChangeNotifier<T: ?Sized> {
    slots: RefCell<Vec<Slot<T>>>,
    next_id: Cell<u64>,
    emitted: Cell<u64>,
}

impl<T: ?Sized> fmt::Debug for ChangeNotifier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscriber_count", &self.subscriber_count())
            .field("emitted", &self.emitted.get())
            .finish()
    }
}

impl<T: ?Sized> Default for ChangeNotifier<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> ChangeNotifier<T> {
    /// Create a notifier with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
            emitted: Cell::new(0),
        }
    }

    /// Register `handler`. It stays live for as long as the returned
    /// [`Subscription`] is held.
    #[must_use = "dropping the subscription unsubscribes the handler"]
    pub fn subscribe(&self, handler: impl Fn(&T) + 'static) -> Subscription
    where
        T: 'static,
    {
        let strong: Handler<T> = Rc::new(handler);
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.slots.borrow_mut().push(Slot {
            id,
            handler: Rc::downgrade(&strong),
        });
        Subscription {
            id,
            _guard: Box::new(strong),
        }
    }

    /// Remove a handler explicitly.
    pub fn unsubscribe(&self, subscription: Subscription) {
        self.slots.borrow_mut().retain(|slot| slot.id != subscription.id);
    }

    /// Invoke every live handler with `payload`, then prune dead entries.
    pub fn emit(&self, payload: &T) {
        self.emitted.set(self.emitted.get() + 1);
        let live: Vec<Handler<T>> = self
            .slots
            .borrow()
            .iter()
            .filter_map(|slot| slot.handler.upgrade())
            .collect();
        for handler in &live {
            handler(payload);
        }
        drop(live);
        self.slots
            .borrow_mut()
            .retain(|slot| slot.handler.strong_count() > 0);
    }

    /// Number of registered handlers, including dead ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.slots.borrow().len()
    }

    /// True when at least one registered handler is still live.
    #[must_use]
    pub fn has_subscribers(&self) -> bool {
        self.slots
            .borrow()
            .iter()
            .any(|slot| slot.handler.strong_count() > 0)
    }

    /// Number of `emit` calls so far.
    #[must_use]
    pub fn emit_count(&self) -> u64 {
        self.emitted.get()
    }
}

/// Strong handle keeping a handler alive.
///
/// Dropping it makes the handler unreachable; passing it to
/// [`ChangeNotifier::unsubscribe`] removes the entry immediately.
pub struct Subscription {
    id: u64,
    _guard: Box<dyn std::any::Any>,
}

impl Subscription {
    /// Identifier of this subscription within its notifier.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(log: &Rc<RefCell<Vec<String>>>, name: &'static str) -> impl Fn(&str) + 'static {
        let log = Rc::clone(log);
        move |payload: &str| log.borrow_mut().push(format!("{name}:{payload}"))
    }

    #[test]
    fn handlers_run_in_subscription_order() {
        let notifier: ChangeNotifier<str> = ChangeNotifier::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let _w1 = notifier.subscribe(recorder(&log, "w1"));
        notifier.emit("hello");
        let _w2 = notifier.subscribe(recorder(&log, "w2"));
        notifier.emit("there");
        assert_eq!(*log.borrow(), vec!["w1:hello", "w1:there", "w2:there"]);
    }

    #[test]
    fn dropped_subscription_is_pruned_on_emit() {
        let notifier: ChangeNotifier<str> = ChangeNotifier::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let w1 = notifier.subscribe(recorder(&log, "w1"));
        let _w2 = notifier.subscribe(recorder(&log, "w2"));
        drop(w1);
        assert_eq!(notifier.subscriber_count(), 2, "pruning is lazy");
        notifier.emit("bob");
        assert_eq!(*log.borrow(), vec!["w2:bob"]);
        assert_eq!(notifier.subscriber_count(), 1);
    }

    #[test]
    fn unsubscribe_removes_immediately() {
        let notifier: ChangeNotifier<str> = ChangeNotifier::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let w1 = notifier.subscribe(recorder(&log, "w1"));
        notifier.unsubscribe(w1);
        assert_eq!(notifier.subscriber_count(), 0);
        assert!(!notifier.has_subscribers());
        notifier.emit("x");
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn notifier_does_not_keep_subscriber_state_alive() {
        let notifier: ChangeNotifier<u32> = ChangeNotifier::new();
        let state = Rc::new(Cell::new(0u32));
        let held = Rc::clone(&state);
        let sub = notifier.subscribe(move |v| held.set(*v));
        assert_eq!(Rc::strong_count(&state), 2);
        drop(sub);
        assert_eq!(Rc::strong_count(&state), 1);
    }

    #[test]
    fn reentrant_emit_is_allowed() {
        let notifier: Rc<ChangeNotifier<u32>> = Rc::new(ChangeNotifier::new());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let weak = Rc::downgrade(&notifier);
        let _sub = notifier.subscribe(move |v| {
            seen_clone.borrow_mut().push(*v);
            if *v > 0 {
                if let Some(n) = weak.upgrade() {
                    n.emit(&(*v - 1));
                }
            }
        });
        notifier.emit(&2);
        assert_eq!(*seen.borrow(), vec![2, 1, 0]);
        assert_eq!(notifier.emit_count(), 3);
    }

    #[test]
    fn subscribe_during_emit_does_not_run_new_handler_this_round() {
        let notifier: Rc<ChangeNotifier<u32>> = Rc::new(ChangeNotifier::new());
        let late_hits = Rc::new(Cell::new(0u32));
        let keep = Rc::new(RefCell::new(Vec::new()));
        let weak = Rc::downgrade(&notifier);
        let hits = Rc::clone(&late_hits);
        let keep_clone = Rc::clone(&keep);
        let _sub = notifier.subscribe(move |_| {
            if let Some(n) = weak.upgrade() {
                let hits = Rc::clone(&hits);
                keep_clone
                    .borrow_mut()
                    .push(n.subscribe(move |_| hits.set(hits.get() + 1)));
            }
        });
        notifier.emit(&1);
        assert_eq!(late_hits.get(), 0);
        notifier.emit(&2);
        assert_eq!(late_hits.get(), 1);
    }
}
