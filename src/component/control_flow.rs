//! Control Flow - Components that swap one active branch.
//!
//! - [`If`] - Mounts `then` while a boolean value is true, `otherwise` while false
//! - [`Switch`] - Mounts the first case equal to a value, or the default
//!
//! # Pattern: Factory Branches
//!
//! A component value is mounted at most once, so branches are registered as
//! factories. Every activation builds a fresh component; the previous one is
//! unmounted first and dropped.
//!
//! # Pattern: Deferred Swap
//!
//! The swap runs from an observer callback, i.e. during a scheduler flush,
//! never inside the `set` that changed the value. Until the flush, the old
//! branch stays mounted.
//!
//! ```text
//! cond.set(false)            scheduler.flush()
//!   [.. TextA ..]    ──▶     unmount TextA, mount TextB before next sibling
//!                              [.. TextB ..]
//! ```
//!
//! A notification that resolves to the branch already mounted is a no-op.
//!
//! # Example
//!
//! ```ignore
//! let logged_in = Value::external(false);
//! If::new(&logged_in)
//!     .then(|| Simple::new(|h: &mut MemoryHost| h.create_text("Welcome back")))
//!     .otherwise(|| Simple::new(|h: &mut MemoryHost| h.create_text("Sign in")));
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::{AnyComponent, Child, Component, Scope};
use crate::host::Host;
use crate::reactive::Value;

type Factory<H> = Box<dyn Fn() -> AnyComponent<H>>;

fn factory<H: Host, C: Component<H>>(make: impl Fn() -> C + 'static) -> Factory<H> {
    Box::new(move || Box::new(make()) as AnyComponent<H>)
}

// =============================================================================
// Shared branch state
// =============================================================================

/// Which registered branch is mounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Case(usize),
    Default,
}

struct Branches<K, H: Host> {
    keys: Vec<K>,
    cases: Vec<Factory<H>>,
    default: Option<Factory<H>>,
    active: Option<(Slot, Child<H>)>,
}

impl<K, H: Host> Branches<K, H> {
    fn new() -> Self {
        Self {
            keys: Vec::new(),
            cases: Vec::new(),
            default: None,
            active: None,
        }
    }

    fn active_slot(&self) -> Option<Slot> {
        self.active.as_ref().map(|(slot, _)| *slot)
    }
}

impl<K: PartialEq, H: Host> Branches<K, H> {
    fn add_case(&mut self, key: K, make: Factory<H>) {
        self.keys.push(key);
        self.cases.push(make);
    }

    /// The first case equal to `key`, else the default.
    fn resolve(&self, key: &K) -> Option<Slot> {
        match self.keys.iter().position(|candidate| candidate == key) {
            Some(index) => Some(Slot::Case(index)),
            None => self.default.as_ref().map(|_| Slot::Default),
        }
    }

    fn show(&mut self, key: &K, scope: &Scope<H>) {
        let next = self.resolve(key);
        let current = self.active_slot();
        if next == current {
            tracing::trace!(component = scope.name(), branch = ?current, "branch unchanged");
            return;
        }

        if let Some((_, mut child)) = self.active.take() {
            child.unmount();
        }
        let make = match next {
            Some(Slot::Case(index)) => self.cases.get(index),
            Some(Slot::Default) => self.default.as_ref(),
            None => None,
        };
        if let (Some(slot), Some(make)) = (next, make) {
            let mut child = Child::from_box(make());
            child.mount(scope);
            self.active = Some((slot, child));
        }
        tracing::debug!(component = scope.name(), from = ?current, to = ?next, "switch branch");
    }

    fn clear(&mut self) {
        if let Some((_, mut child)) = self.active.take() {
            child.unmount();
        }
    }
}

// =============================================================================
// Switch
// =============================================================================

/// Mounts the branch registered for the current value.
///
/// Keys are compared with `==` in registration order; the first match wins,
/// even over a default that is currently mounted. With no match and no
/// default, nothing is mounted.
pub struct Switch<K, H: Host> {
    name: &'static str,
    value: Value<K>,
    branches: Rc<RefCell<Branches<K, H>>>,
}

impl<K: fmt::Debug, H: Host> fmt::Debug for Switch<K, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let branches = self.branches.borrow();
        f.debug_struct(self.name)
            .field("value", &self.value)
            .field("cases", &branches.keys)
            .field("default", &branches.default.is_some())
            .field("active", &branches.active_slot())
            .finish()
    }
}

impl<K, H> Switch<K, H>
where
    K: Clone + PartialEq + 'static,
    H: Host,
{
    pub fn new(value: &Value<K>) -> Self {
        Self {
            name: "Switch",
            value: value.clone(),
            branches: Rc::new(RefCell::new(Branches::new())),
        }
    }

    /// Register the branch for `key`.
    pub fn case<C: Component<H>>(self, key: K, make: impl Fn() -> C + 'static) -> Self {
        self.branches.borrow_mut().add_case(key, factory(make));
        self
    }

    /// Register the branch used when no case matches.
    pub fn default<C: Component<H>>(self, make: impl Fn() -> C + 'static) -> Self {
        self.branches.borrow_mut().default = Some(factory(make));
        self
    }

    fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

impl<K, H> Component<H> for Switch<K, H>
where
    K: Clone + PartialEq + 'static,
    H: Host,
{
    fn mount(&mut self, scope: &Scope<H>) {
        self.branches.borrow_mut().show(&self.value.get(), scope);

        let weak = scope.downgrade();
        let branches = Rc::clone(&self.branches);
        let value = self.value.clone();
        scope.observe(&self.value, move |_change| {
            let Some(scope) = weak.upgrade() else {
                return;
            };
            branches.borrow_mut().show(&value.get(), &scope);
        });
    }

    fn unmount(&mut self, _scope: &Scope<H>) {
        self.branches.borrow_mut().clear();
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

// =============================================================================
// If
// =============================================================================

/// Mounts `then` while the condition is true, `otherwise` while it is false.
///
/// A missing branch mounts nothing.
pub struct If<H: Host> {
    inner: Switch<bool, H>,
    then: Option<Factory<H>>,
    otherwise: Option<Factory<H>>,
}

impl<H: Host> fmt::Debug for If<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("If")
            .field("condition", &self.inner.value)
            .field("then", &self.then.is_some())
            .field("otherwise", &self.otherwise.is_some())
            .field("active", &self.inner.branches.borrow().active_slot())
            .finish()
    }
}

impl<H: Host> If<H> {
    pub fn new(condition: &Value<bool>) -> Self {
        Self {
            inner: Switch::new(condition).named("If"),
            then: None,
            otherwise: None,
        }
    }

    pub fn then<C: Component<H>>(mut self, make: impl Fn() -> C + 'static) -> Self {
        self.then = Some(factory(make));
        self
    }

    pub fn otherwise<C: Component<H>>(mut self, make: impl Fn() -> C + 'static) -> Self {
        self.otherwise = Some(factory(make));
        self
    }
}

impl<H: Host> Component<H> for If<H> {
    fn mount(&mut self, scope: &Scope<H>) {
        {
            let mut branches = self.inner.branches.borrow_mut();
            for (key, make) in [(true, self.then.take()), (false, self.otherwise.take())] {
                if let Some(make) = make {
                    branches.add_case(key, make);
                }
            }
        }
        self.inner.mount(scope);
    }

    fn unmount(&mut self, scope: &Scope<H>) {
        self.inner.unmount(scope);
    }

    fn name(&self) -> &'static str {
        "If"
    }
}
