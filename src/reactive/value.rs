//! Reactive Value - Observable cells with a stable identity.
//!
//! A [`Value`] is one of:
//!
//! - **constant** - fixed forever, never notifies
//! - **external** - a mutable cell; `set` stores immediately and enqueues
//!   notifications for its observers and everything derived from it
//! - **derived** - a pure recipe over other values (`map`, `combine`),
//!   marked dirty eagerly when an input changes and recomputed lazily on read
//! - **list** - an external `Vec<T>` whose in-place edits carry
//!   [`ListEdit`] payloads
//!
//! # Freshness
//!
//! `get` always reflects the latest `set`. Only the *notification* is
//! deferred through the [`Scheduler`](super::Scheduler).
//!
//! # Ownership
//!
//! A `Value` handle is reference counted. Derived values hold their inputs
//! strongly; inputs hold derived values and observers weakly, so dropping the
//! last handle to a derived value detaches it from its inputs.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use super::change::{ListEdit, NoEdit};
use super::observer::ObserverCore;
use crate::error::{fatal, Error, Result};

// =============================================================================
// Identity
// =============================================================================

/// Stable identity of a reactive value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(u64);

impl ValueId {
    fn next() -> Self {
        NEXT_VALUE_ID.with(|next| {
            let id = next.get();
            next.set(id + 1);
            ValueId(id)
        })
    }

    /// Raw numeric identity.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

thread_local! {
    static NEXT_VALUE_ID: Cell<u64> = const { Cell::new(1) };
}

// =============================================================================
// Node
// =============================================================================

enum Source<T> {
    Constant,
    External,
    Derived(Box<dyn Fn() -> T>),
}

impl<T> Source<T> {
    fn kind(&self) -> &'static str {
        match self {
            Source::Constant => "constant",
            Source::External => "external",
            Source::Derived(_) => "derived",
        }
    }
}

/// Payload captured at mark time, resolved into a [`Change`](super::Change)
/// when the notification is delivered.
#[derive(Clone)]
pub(crate) enum Pending<T, E> {
    Replaced(T),
    Edited(Vec<E>),
}

/// Anything that must be marked dirty when an input changes.
pub(crate) trait Invalidate {
    fn invalidate(&self);
}

pub(crate) struct Node<T, E> {
    id: ValueId,
    current: RefCell<T>,
    source: Source<T>,
    dirty: Cell<bool>,
    version: Cell<u64>,
    observers: RefCell<Vec<Weak<ObserverCore<T, E>>>>,
    dependents: RefCell<Vec<Weak<dyn Invalidate>>>,
}

impl<T, E> Node<T, E>
where
    T: Clone + PartialEq + 'static,
    E: Clone + 'static,
{
    fn new(initial: T, source: Source<T>) -> Self {
        Self {
            id: ValueId::next(),
            current: RefCell::new(initial),
            source,
            dirty: Cell::new(false),
            version: Cell::new(0),
            observers: RefCell::new(Vec::new()),
            dependents: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn subscribe(&self, core: Weak<ObserverCore<T, E>>) {
        let mut list = self.observers.borrow_mut();
        list.retain(|weak| weak.strong_count() > 0);
        list.push(core);
    }

    pub(crate) fn unsubscribe(&self, core: &Rc<ObserverCore<T, E>>) {
        let target = Rc::as_ptr(core);
        self.observers
            .borrow_mut()
            .retain(|weak| weak.as_ptr() != target);
    }

    /// Prunes dropped dependents first, so a value that never notifies
    /// still holds at most its live dependents plus the new one.
    fn add_dependent(&self, dependent: Weak<dyn Invalidate>) {
        let mut list = self.dependents.borrow_mut();
        list.retain(|weak| weak.strong_count() > 0);
        list.push(dependent);
    }

    fn bump_version(&self) {
        self.version.set(self.version.get() + 1);
    }

    /// Enqueue for direct observers, then mark every dependent dirty.
    fn notify(&self, pending: Pending<T, E>) {
        let observers: Vec<Rc<ObserverCore<T, E>>> = {
            let mut list = self.observers.borrow_mut();
            list.retain(|weak| weak.strong_count() > 0);
            list.iter().filter_map(Weak::upgrade).collect()
        };
        for core in observers {
            core.enqueue(pending.clone());
        }

        let dependents: Vec<Rc<dyn Invalidate>> = {
            let mut list = self.dependents.borrow_mut();
            list.retain(|weak| weak.strong_count() > 0);
            list.iter().filter_map(Weak::upgrade).collect()
        };
        for dependent in dependents {
            dependent.invalidate();
        }
    }

    fn refresh(&self) {
        if let Source::Derived(recipe) = &self.source {
            if self.dirty.get() {
                let fresh = recipe();
                *self.current.borrow_mut() = fresh;
                self.dirty.set(false);
            }
        }
    }
}

impl<T, E> Invalidate for Node<T, E>
where
    T: Clone + PartialEq + 'static,
    E: Clone + 'static,
{
    fn invalidate(&self) {
        // Every mark notifies, even when already dirty.
        self.dirty.set(true);
        self.bump_version();
        let old = self.current.borrow().clone();
        self.notify(Pending::Replaced(old));
    }
}

// =============================================================================
// Value handle
// =============================================================================

/// Handle to a reactive value.
///
/// `E` is the in-place edit type: [`NoEdit`] for scalars, [`ListEdit<T>`]
/// for list values. Cloning the handle shares the same cell.
pub struct Value<T, E = NoEdit> {
    pub(crate) node: Rc<Node<T, E>>,
}

/// Ordered collection value with structural edit payloads.
pub type ValueList<T> = Value<Vec<T>, ListEdit<T>>;

impl<T, E> Clone for Value<T, E> {
    fn clone(&self) -> Self {
        Self {
            node: Rc::clone(&self.node),
        }
    }
}

impl<T: fmt::Debug, E> fmt::Debug for Value<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Value");
        out.field("id", &self.node.id)
            .field("kind", &self.node.source.kind())
            .field("dirty", &self.node.dirty.get());
        match self.node.current.try_borrow() {
            Ok(current) => out.field("current", &*current),
            Err(_) => out.field("current", &"<borrowed>"),
        };
        out.finish()
    }
}

impl<T> Value<T, NoEdit>
where
    T: Clone + PartialEq + 'static,
{
    /// A value that never changes and never notifies.
    pub fn constant(value: T) -> Self {
        Self::from_node(Node::new(value, Source::Constant))
    }

    /// A mutable cell.
    pub fn external(value: T) -> Self {
        Self::from_node(Node::new(value, Source::External))
    }

    /// Alias of [`Value::external`].
    pub fn new(value: T) -> Self {
        Self::external(value)
    }

    fn derived(recipe: impl Fn() -> T + 'static) -> Self {
        let initial = recipe();
        Self::from_node(Node::new(initial, Source::Derived(Box::new(recipe))))
    }

    /// Derived value over two inputs.
    pub fn combine<A, EA, B, EB>(
        a: &Value<A, EA>,
        b: &Value<B, EB>,
        combine: impl Fn(&A, &B) -> T + 'static,
    ) -> Self
    where
        A: Clone + PartialEq + 'static,
        EA: Clone + 'static,
        B: Clone + PartialEq + 'static,
        EB: Clone + 'static,
    {
        let (a_in, b_in) = (a.clone(), b.clone());
        let derived = Self::derived(move || a_in.with(|va| b_in.with(|vb| combine(va, vb))));
        a.node.add_dependent(derived.as_dependent());
        b.node.add_dependent(derived.as_dependent());
        derived
    }

    /// Derived value over three inputs.
    pub fn combine3<A, EA, B, EB, C, EC>(
        a: &Value<A, EA>,
        b: &Value<B, EB>,
        c: &Value<C, EC>,
        combine: impl Fn(&A, &B, &C) -> T + 'static,
    ) -> Self
    where
        A: Clone + PartialEq + 'static,
        EA: Clone + 'static,
        B: Clone + PartialEq + 'static,
        EB: Clone + 'static,
        C: Clone + PartialEq + 'static,
        EC: Clone + 'static,
    {
        let (a_in, b_in, c_in) = (a.clone(), b.clone(), c.clone());
        let derived = Self::derived(move || {
            a_in.with(|va| b_in.with(|vb| c_in.with(|vc| combine(va, vb, vc))))
        });
        a.node.add_dependent(derived.as_dependent());
        b.node.add_dependent(derived.as_dependent());
        c.node.add_dependent(derived.as_dependent());
        derived
    }
}

impl<T> From<T> for Value<T, NoEdit>
where
    T: Clone + PartialEq + 'static,
{
    fn from(value: T) -> Self {
        Value::constant(value)
    }
}

impl<T, E> Value<T, E>
where
    T: Clone + PartialEq + 'static,
    E: Clone + 'static,
{
    fn from_node(node: Node<T, E>) -> Self {
        Self {
            node: Rc::new(node),
        }
    }

    fn as_dependent(&self) -> Weak<dyn Invalidate> {
        let weak: Weak<Node<T, E>> = Rc::downgrade(&self.node);
        weak
    }

    /// Stable identity of this value.
    pub fn id(&self) -> ValueId {
        self.node.id
    }

    /// Whether both handles refer to the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    /// Whether this value can never change.
    pub fn is_constant(&self) -> bool {
        matches!(self.node.source, Source::Constant)
    }

    /// Whether this value is computed from other values.
    pub fn is_derived(&self) -> bool {
        matches!(self.node.source, Source::Derived(_))
    }

    /// Number of times this value has been set, edited, or marked dirty.
    pub fn version(&self) -> u64 {
        self.node.version.get()
    }

    /// Number of live observers bound to this value.
    pub fn observer_count(&self) -> usize {
        self.node
            .observers
            .borrow()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Current value, recomputing a dirty derived value first.
    pub fn get(&self) -> T {
        self.node.refresh();
        self.node.current.borrow().clone()
    }

    /// Borrow the current value.
    ///
    /// `read` must not set this same value.
    pub fn with<R>(&self, read: impl FnOnce(&T) -> R) -> R {
        self.node.refresh();
        read(&self.node.current.borrow())
    }

    /// Store a new value and enqueue notifications.
    ///
    /// Panics on constant and derived values.
    pub fn set(&self, value: T) {
        self.try_set(value).unwrap_or_else(|err| fatal(err));
    }

    /// Store a new value, reporting an immutable value as an error.
    pub fn try_set(&self, value: T) -> Result<()> {
        self.ensure_writable()?;
        let old = self.node.current.replace(value);
        self.node.bump_version();
        self.node.notify(Pending::Replaced(old));
        Ok(())
    }

    /// Mutate the value in place and enqueue a replacement notification.
    pub fn update(&self, mutate: impl FnOnce(&mut T)) {
        self.ensure_writable().unwrap_or_else(|err| fatal(err));
        let old = self.node.current.borrow().clone();
        mutate(&mut self.node.current.borrow_mut());
        self.node.bump_version();
        self.node.notify(Pending::Replaced(old));
    }

    /// Derived value computed from this one.
    pub fn map<U>(&self, map: impl Fn(&T) -> U + 'static) -> Value<U>
    where
        U: Clone + PartialEq + 'static,
    {
        let input = self.clone();
        let derived = Value::derived(move || input.with(|value| map(value)));
        self.node.add_dependent(derived.as_dependent());
        derived
    }

    fn ensure_writable(&self) -> Result<()> {
        match self.node.source {
            Source::External => Ok(()),
            ref other => Err(Error::ImmutableValue {
                id: self.node.id.as_u64(),
                kind: other.kind(),
            }),
        }
    }

    fn edit(&self, edit: E, apply: impl FnOnce(&mut T)) {
        self.ensure_writable().unwrap_or_else(|err| fatal(err));
        apply(&mut self.node.current.borrow_mut());
        self.node.bump_version();
        self.node.notify(Pending::Edited(vec![edit]));
    }
}

// =============================================================================
// List values
// =============================================================================

impl<T> Value<Vec<T>, ListEdit<T>>
where
    T: Clone + PartialEq + 'static,
{
    /// A mutable ordered collection.
    pub fn list(items: Vec<T>) -> Self {
        Self::from_node(Node::new(items, Source::External))
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.with(Vec::len)
    }

    /// Whether the list has no items.
    pub fn is_empty(&self) -> bool {
        self.with(Vec::is_empty)
    }

    /// Append an item.
    pub fn push(&self, value: T) {
        let index = self.len();
        self.insert(index, value);
    }

    /// Insert an item at `index`.
    ///
    /// Panics if `index > len`.
    pub fn insert(&self, index: usize, value: T) {
        let len = self.len();
        assert!(index <= len, "insert index {index} out of bounds for list of {len}");
        let edit = ListEdit::Insert {
            index,
            value: value.clone(),
        };
        self.edit(edit, move |items| items.insert(index, value));
    }

    /// Remove and return the item at `index`.
    ///
    /// Panics if `index >= len`.
    pub fn remove(&self, index: usize) -> T {
        let len = self.len();
        assert!(index < len, "remove index {index} out of bounds for list of {len}");
        let mut removed = None;
        self.edit(ListEdit::Remove { index }, |items| {
            removed = Some(items.remove(index));
        });
        removed.unwrap_or_else(|| unreachable!("edit closure always runs"))
    }

    /// Overwrite the item at `index`, returning the previous item.
    ///
    /// Panics if `index >= len`.
    pub fn replace(&self, index: usize, value: T) -> T {
        let len = self.len();
        assert!(index < len, "replace index {index} out of bounds for list of {len}");
        let edit = ListEdit::Replace {
            index,
            value: value.clone(),
        };
        let mut previous = None;
        self.edit(edit, |items| {
            previous = Some(std::mem::replace(&mut items[index], value));
        });
        previous.unwrap_or_else(|| unreachable!("edit closure always runs"))
    }
}
