//! Observers and their owners.
//!
//! An [`Observer`] is a typed subscription: one owner, at most one bound
//! [`Value`], one callback. When the bound value changes the observer
//! enqueues a task on its owner's scheduler; the callback runs during the
//! next flush with a [`Change`] describing what happened.
//!
//! # Ownership
//!
//! Every observer sits in exactly one [`Owner`]'s list from construction to
//! drop. [`Observer::transfer`] moves it to another owner, removing it from
//! the first list before adding it to the second. Observers hold their owner
//! strongly, so an owner's storage cannot be freed while it still has
//! observers.
//!
//! # Cancellation
//!
//! A queued task holds the observer weakly and checks, at delivery time:
//!
//! 1. the observer still exists
//! 2. its owner has not been released
//! 3. it is still bound to the value that enqueued the task
//!
//! Any failed check makes the task a no-op. Unmounting a component releases
//! its owner, so notifications queued before the unmount never reach it.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use super::change::{Change, NoEdit};
use super::scheduler::Scheduler;
use super::value::{Pending, Value};
use crate::error::{fatal, Error, Result};

// =============================================================================
// Identity and counters
// =============================================================================

/// Identity of an observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obs{}", self.0)
    }
}

/// Identity of an owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwnerId(u64);

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "own{}", self.0)
    }
}

thread_local! {
    static NEXT_OBSERVER_ID: Cell<u64> = const { Cell::new(1) };
    static NEXT_OWNER_ID: Cell<u64> = const { Cell::new(1) };
    /// Observers currently alive on this thread.
    static LIVE_OBSERVERS: Cell<usize> = const { Cell::new(0) };
}

fn next_id(counter: &'static std::thread::LocalKey<Cell<u64>>) -> u64 {
    counter.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    })
}

/// Number of observers alive on the current thread.
pub fn live_observer_count() -> usize {
    LIVE_OBSERVERS.with(Cell::get)
}

// =============================================================================
// Owner
// =============================================================================

struct OwnerInner {
    id: OwnerId,
    label: &'static str,
    scheduler: Scheduler,
    observers: RefCell<Vec<ObserverId>>,
    alive: Cell<bool>,
}

impl Drop for OwnerInner {
    fn drop(&mut self) {
        debug_assert!(
            self.observers.borrow().is_empty(),
            "owner '{}' destroyed with live observers",
            self.label
        );
    }
}

/// An entity that owns observers, usually a mounted component.
///
/// Cloning shares the same owner.
#[derive(Clone)]
pub struct Owner {
    inner: Rc<OwnerInner>,
}

impl fmt::Debug for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Owner")
            .field("id", &self.inner.id)
            .field("label", &self.inner.label)
            .field("alive", &self.inner.alive.get())
            .field("observers", &self.inner.observers.borrow().len())
            .finish()
    }
}

impl Owner {
    /// Create an owner whose observers deliver through `scheduler`.
    pub fn new(scheduler: &Scheduler, label: &'static str) -> Self {
        Self {
            inner: Rc::new(OwnerInner {
                id: OwnerId(next_id(&NEXT_OWNER_ID)),
                label,
                scheduler: scheduler.clone(),
                observers: RefCell::new(Vec::new()),
                alive: Cell::new(true),
            }),
        }
    }

    pub fn id(&self) -> OwnerId {
        self.inner.id
    }

    pub fn label(&self) -> &'static str {
        self.inner.label
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.inner.scheduler
    }

    /// Whether observers of this owner may still be invoked.
    pub fn is_alive(&self) -> bool {
        self.inner.alive.get()
    }

    /// Stop delivering to this owner's observers.
    ///
    /// Queued notifications become no-ops. Irreversible.
    pub fn release(&self) {
        if self.inner.alive.replace(false) {
            tracing::trace!(owner = %self.inner.id, label = self.inner.label, "owner released");
        }
    }

    /// Number of observers currently in this owner's list.
    pub fn observer_count(&self) -> usize {
        self.inner.observers.borrow().len()
    }

    /// Identities of the observers in this owner's list.
    pub fn observer_ids(&self) -> Vec<ObserverId> {
        self.inner.observers.borrow().clone()
    }

    /// Whether `id` is in this owner's list.
    pub fn owns(&self, id: ObserverId) -> bool {
        self.inner.observers.borrow().contains(&id)
    }

    /// Whether both handles refer to the same owner.
    pub fn ptr_eq(&self, other: &Owner) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn register(&self, id: ObserverId) {
        let mut list = self.inner.observers.borrow_mut();
        debug_assert!(!list.contains(&id), "observer {id} registered twice");
        list.push(id);
    }

    fn deregister(&self, id: ObserverId) {
        let mut list = self.inner.observers.borrow_mut();
        let before = list.len();
        list.retain(|existing| *existing != id);
        debug_assert_eq!(before, list.len() + 1, "observer {id} was not in its owner's list");
    }
}

// =============================================================================
// Observer
// =============================================================================

pub(crate) struct ObserverCore<T, E> {
    id: ObserverId,
    owner: RefCell<Owner>,
    source: RefCell<Option<Value<T, E>>>,
    /// Bumped on every rebind so tasks queued for an old binding are dropped.
    epoch: Cell<u64>,
    callback: Box<dyn Fn(&Change<T, E>)>,
}

impl<T, E> ObserverCore<T, E>
where
    T: Clone + PartialEq + 'static,
    E: Clone + 'static,
{
    pub(crate) fn enqueue(self: &Rc<Self>, pending: Pending<T, E>) {
        let owner = self.owner.borrow().clone();
        if !owner.is_alive() {
            return;
        }
        let weak = Rc::downgrade(self);
        let epoch = self.epoch.get();
        owner.scheduler().schedule(move || {
            if let Some(core) = weak.upgrade() {
                core.deliver(epoch, pending);
            }
        });
    }

    fn deliver(&self, epoch: u64, pending: Pending<T, E>) {
        if self.epoch.get() != epoch || !self.owner.borrow().is_alive() {
            tracing::trace!(observer = %self.id, "dropping stale notification");
            return;
        }
        let Some(source) = self.source.borrow().clone() else {
            return;
        };
        let change = match pending {
            Pending::Replaced(old) => Change::replaced(old, source.get()),
            Pending::Edited(edits) => Change::Edited(edits),
        };
        tracing::trace!(observer = %self.id, value = %source.id(), "delivering change");
        (self.callback)(&change);
    }
}

/// Typed subscription to a [`Value`].
pub struct Observer<T, E = NoEdit>
where
    T: Clone + PartialEq + 'static,
    E: Clone + 'static,
{
    core: Rc<ObserverCore<T, E>>,
}

impl<T, E> fmt::Debug for Observer<T, E>
where
    T: Clone + PartialEq + 'static,
    E: Clone + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("id", &self.core.id)
            .field("owner", &self.core.owner.borrow().id())
            .field("bound", &self.is_bound())
            .finish()
    }
}

impl<T, E> Observer<T, E>
where
    T: Clone + PartialEq + 'static,
    E: Clone + 'static,
{
    /// Create an unbound observer in `owner`'s list.
    pub fn new(owner: &Owner, callback: impl Fn(&Change<T, E>) + 'static) -> Self {
        let id = ObserverId(next_id(&NEXT_OBSERVER_ID));
        owner.register(id);
        LIVE_OBSERVERS.with(|live| live.set(live.get() + 1));
        Self {
            core: Rc::new(ObserverCore {
                id,
                owner: RefCell::new(owner.clone()),
                source: RefCell::new(None),
                epoch: Cell::new(0),
                callback: Box::new(callback),
            }),
        }
    }

    /// Create an observer already bound to `value`.
    pub fn bound(
        owner: &Owner,
        value: &Value<T, E>,
        callback: impl Fn(&Change<T, E>) + 'static,
    ) -> Self {
        let observer = Self::new(owner, callback);
        observer.assign(value);
        observer
    }

    pub fn id(&self) -> ObserverId {
        self.core.id
    }

    /// Current owner. Always present.
    pub fn owner(&self) -> Owner {
        self.core.owner.borrow().clone()
    }

    /// Bind to `value`, unsubscribing from the previous value first.
    pub fn assign(&self, value: &Value<T, E>) {
        self.unbind();
        value.node.subscribe(Rc::downgrade(&self.core));
        *self.core.source.borrow_mut() = Some(value.clone());
    }

    /// Drop the binding. Pending notifications for it become no-ops.
    pub fn unbind(&self) {
        let previous = self.core.source.borrow_mut().take();
        if let Some(previous) = previous {
            previous.node.unsubscribe(&self.core);
        }
        self.core.epoch.set(self.core.epoch.get() + 1);
    }

    pub fn is_bound(&self) -> bool {
        self.core.source.borrow().is_some()
    }

    /// Bound value handle, if any.
    pub fn value(&self) -> Option<Value<T, E>> {
        self.core.source.borrow().clone()
    }

    /// Read the bound value.
    pub fn try_get(&self) -> Result<T> {
        self.value()
            .map(|value| value.get())
            .ok_or(Error::UnboundObserver)
    }

    /// Read the bound value. Panics when unbound.
    pub fn get(&self) -> T {
        self.try_get().unwrap_or_else(|err| fatal(err))
    }

    /// Move this observer into `owner`'s list.
    pub fn transfer(&self, owner: &Owner) {
        let previous = self.core.owner.replace(owner.clone());
        if previous.ptr_eq(owner) {
            return;
        }
        previous.deregister(self.core.id);
        owner.register(self.core.id);
    }
}

impl<T, E> Drop for Observer<T, E>
where
    T: Clone + PartialEq + 'static,
    E: Clone + 'static,
{
    fn drop(&mut self) {
        self.unbind();
        self.core.owner.borrow().deregister(self.core.id);
        LIVE_OBSERVERS.with(|live| live.set(live.get().saturating_sub(1)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::change::ListEdit;

    fn recording_observer<T, E>(
        owner: &Owner,
        value: &Value<T, E>,
    ) -> (Observer<T, E>, Rc<RefCell<Vec<Change<T, E>>>>)
    where
        T: Clone + PartialEq + 'static,
        E: Clone + 'static,
    {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        let observer = Observer::bound(owner, value, move |change: &Change<T, E>| {
            seen_clone.borrow_mut().push(change.clone());
        });
        (observer, seen)
    }

    #[test]
    fn test_set_defers_callback_until_flush() {
        let scheduler = Scheduler::new();
        let owner = Owner::new(&scheduler, "test");
        let value = Value::external(1);
        let (_observer, seen) = recording_observer(&owner, &value);

        value.set(2);
        assert!(seen.borrow().is_empty(), "callback must not run inside set");
        assert_eq!(value.get(), 2, "get is fresh before delivery");

        scheduler.flush();
        assert_eq!(*seen.borrow(), vec![Change::Replaced { old: 1, new: 2 }]);
    }

    #[test]
    fn test_every_mark_notifies() {
        let scheduler = Scheduler::new();
        let owner = Owner::new(&scheduler, "test");
        let value = Value::external(5);
        let parity = value.map(|v| v % 2);
        let (_observer, seen) = recording_observer(&owner, &parity);

        value.set(7);
        scheduler.flush();
        assert_eq!(*seen.borrow(), vec![Change::Unchanged]);
    }

    #[test]
    fn test_derived_consistent_at_delivery() {
        let scheduler = Scheduler::new();
        let owner = Owner::new(&scheduler, "test");
        let value = Value::external(1);
        let doubled = value.map(|v| v * 2);
        let (_observer, seen) = recording_observer(&owner, &doubled);

        value.set(5);
        scheduler.flush();
        assert_eq!(*seen.borrow(), vec![Change::Replaced { old: 2, new: 10 }]);
    }

    #[test]
    fn test_list_edits_delivered_in_order() {
        let scheduler = Scheduler::new();
        let owner = Owner::new(&scheduler, "test");
        let list = Value::list(vec![1, 2]);
        let (_observer, seen) = recording_observer(&owner, &list);

        list.push(3);
        list.remove(0);
        list.set(vec![9]);
        scheduler.flush();

        assert_eq!(
            *seen.borrow(),
            vec![
                Change::Edited(vec![ListEdit::Insert { index: 2, value: 3 }]),
                Change::Edited(vec![ListEdit::Remove { index: 0 }]),
                Change::Replaced {
                    old: vec![2, 3],
                    new: vec![9]
                },
            ]
        );
    }

    #[test]
    fn test_released_owner_cancels_pending() {
        let scheduler = Scheduler::new();
        let owner = Owner::new(&scheduler, "test");
        let value = Value::external(0);
        let (_observer, seen) = recording_observer(&owner, &value);

        value.set(1);
        owner.release();
        scheduler.flush();
        assert!(seen.borrow().is_empty());

        value.set(2);
        assert_eq!(scheduler.pending(), 0, "released owners enqueue nothing");
    }

    #[test]
    fn test_dropped_observer_cancels_pending() {
        let scheduler = Scheduler::new();
        let owner = Owner::new(&scheduler, "test");
        let value = Value::external(0);
        let (observer, seen) = recording_observer(&owner, &value);

        value.set(1);
        drop(observer);
        scheduler.flush();
        assert!(seen.borrow().is_empty());
        assert_eq!(owner.observer_count(), 0);
        assert_eq!(value.observer_count(), 0);
    }

    #[test]
    fn test_assign_rebinds_and_drops_stale() {
        let scheduler = Scheduler::new();
        let owner = Owner::new(&scheduler, "test");
        let first = Value::external("a");
        let second = Value::external("x");
        let (observer, seen) = recording_observer(&owner, &first);

        first.set("b");
        observer.assign(&second);
        first.set("c");
        second.set("y");
        scheduler.flush();

        assert_eq!(*seen.borrow(), vec![Change::Replaced { old: "x", new: "y" }]);
        assert_eq!(first.observer_count(), 0);
        assert_eq!(second.observer_count(), 1);
    }

    #[test]
    fn test_unbound_read_is_error() {
        let scheduler = Scheduler::new();
        let owner = Owner::new(&scheduler, "test");
        let observer: Observer<i32> = Observer::new(&owner, |_| {});

        assert!(!observer.is_bound());
        assert_eq!(observer.try_get(), Err(Error::UnboundObserver));
    }

    #[test]
    #[should_panic(expected = "not bound")]
    fn test_unbound_get_panics() {
        let scheduler = Scheduler::new();
        let owner = Owner::new(&scheduler, "test");
        let observer: Observer<i32> = Observer::new(&owner, |_| {});
        observer.get();
    }

    #[test]
    fn test_owner_membership_exactly_once() {
        let scheduler = Scheduler::new();
        let a = Owner::new(&scheduler, "a");
        let b = Owner::new(&scheduler, "b");
        let observer: Observer<i32> = Observer::new(&a, |_| {});
        let id = observer.id();

        assert!(a.owns(id) && !b.owns(id));
        assert_eq!(a.observer_ids(), vec![id]);
        observer.transfer(&b);
        assert!(!a.owns(id) && b.owns(id));
        assert!(a.observer_ids().is_empty());
        assert_eq!(b.observer_ids(), vec![id]);
        assert!(observer.owner().ptr_eq(&b));

        // Moving the handle keeps its membership.
        let moved = observer;
        assert!(b.owns(moved.id()));
        drop(moved);
        assert_eq!(a.observer_count() + b.observer_count(), 0);
    }

    #[test]
    fn test_live_observer_counter() {
        let scheduler = Scheduler::new();
        let owner = Owner::new(&scheduler, "test");
        let before = live_observer_count();
        let first: Observer<u8> = Observer::new(&owner, |_| {});
        let second: Observer<u8> = Observer::new(&owner, |_| {});
        assert_eq!(live_observer_count(), before + 2);
        drop(first);
        drop(second);
        assert_eq!(live_observer_count(), before);
    }

    #[test]
    fn test_constant_never_notifies() {
        let scheduler = Scheduler::new();
        let owner = Owner::new(&scheduler, "test");
        let value = Value::constant(3);
        let (observer, _seen) = recording_observer(&owner, &value);
        assert_eq!(observer.get(), 3);
        assert_eq!(scheduler.pending(), 0);
    }
}
