//! Components - Declarative descriptions mounted into a [`Scope`] tree.
//!
//! This module provides the component kinds:
//! - [`Simple`] - Owns exactly one element and binds its attributes to values
//! - [`List`] - A fixed sequence of children, no element of its own
//! - [`Composite`] - Renders another component once, at mount
//! - [`If`] / [`Switch`] - Swap a single active branch when a value changes
//! - [`Provider`] - Makes a value available to descendants via [`UseContext`]
//!
//! # Lifecycle
//!
//! A component value is mounted at most once. Wrap it in a [`Child`] to get
//! the state machine:
//!
//! ```text
//! Detached ──mount──▶ Mounted ──unmount──▶ Retired
//!                        │                    │
//!                  mount: AlreadyMounted  mount: Remount
//! ```
//!
//! Mount runs top-down (a component mounts, then mounts its children);
//! unmount runs bottom-up (children first, in reverse order, then the
//! component's own scope is torn down).
//!
//! # Example
//!
//! ```ignore
//! use spark_components::prelude::*;
//!
//! let name = Value::external(String::from("world"));
//! let label = Simple::new({
//!     let name = name.clone();
//!     move |host: &mut MemoryHost| host.create_text(format!("hello {}", name.get()))
//! })
//! .bind(&name, |host, node, name| host.set_text(*node, format!("hello {name}")));
//! ```

use std::fmt;

use crate::error::{fatal, Error, Result};
use crate::host::Host;

mod composite;
mod context;
mod control_flow;
mod list;
mod scope;
mod simple;

pub use composite::Composite;
pub use context::{ContextKind, Provider, UseContext};
pub use control_flow::{If, Switch};
pub use list::List;
pub use scope::{Scope, ScopeId, WeakScope};
pub use simple::Simple;

// =============================================================================
// Component trait
// =============================================================================

/// A node in the component tree.
///
/// `mount` receives the component's own freshly created scope. Children are
/// mounted by wrapping them in [`Child`] and calling [`Child::mount`] with
/// that scope. `unmount` must unmount every child mounted in `mount`; the
/// scope itself (element, observers, contexts) is torn down afterwards.
pub trait Component<H: Host>: 'static {
    fn mount(&mut self, scope: &Scope<H>);

    fn unmount(&mut self, scope: &Scope<H>) {
        let _ = scope;
    }

    /// Name used in logs and errors.
    fn name(&self) -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }
}

/// Boxed component of any kind.
pub type AnyComponent<H> = Box<dyn Component<H>>;

impl<H: Host> Component<H> for AnyComponent<H> {
    fn mount(&mut self, scope: &Scope<H>) {
        (**self).mount(scope)
    }

    fn unmount(&mut self, scope: &Scope<H>) {
        (**self).unmount(scope)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// `a::b::Widget<c::Host>` → `Widget`.
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

// =============================================================================
// Child
// =============================================================================

/// Where a [`Child`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Detached,
    Mounted,
    Retired,
}

enum State<H: Host> {
    Detached,
    Mounted(Scope<H>),
    Retired,
}

/// A component plus its mount state.
pub struct Child<H: Host> {
    component: AnyComponent<H>,
    state: State<H>,
}

impl<H: Host> fmt::Debug for Child<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Child")
            .field("component", &self.component.name())
            .field("lifecycle", &self.lifecycle())
            .finish()
    }
}

impl<H: Host> Child<H> {
    pub fn new(component: impl Component<H>) -> Self {
        Self::from_box(Box::new(component))
    }

    pub fn from_box(component: AnyComponent<H>) -> Self {
        Self {
            component,
            state: State::Detached,
        }
    }

    pub fn name(&self) -> &'static str {
        self.component.name()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        match self.state {
            State::Detached => Lifecycle::Detached,
            State::Mounted(_) => Lifecycle::Mounted,
            State::Retired => Lifecycle::Retired,
        }
    }

    pub fn is_mounted(&self) -> bool {
        matches!(self.state, State::Mounted(_))
    }

    /// Scope of the mounted component.
    pub fn scope(&self) -> Option<&Scope<H>> {
        match &self.state {
            State::Mounted(scope) => Some(scope),
            _ => None,
        }
    }

    /// Mount under `parent`, after its existing children.
    pub fn try_mount(&mut self, parent: &Scope<H>) -> Result<()> {
        let component = self.component.name();
        match self.state {
            State::Detached => {}
            State::Mounted(_) => return Err(Error::AlreadyMounted { component }),
            State::Retired => return Err(Error::Remount { component }),
        }

        let scope = parent.child(component);
        tracing::debug!(component, scope = %scope.id(), depth = scope.depth(), "mount");
        self.state = State::Mounted(scope.clone());
        self.component.mount(&scope);
        Ok(())
    }

    /// Mount under `parent`. Panics on a lifecycle violation.
    #[track_caller]
    pub fn mount(&mut self, parent: &Scope<H>) {
        if let Err(err) = self.try_mount(parent) {
            fatal(err);
        }
    }

    /// Unmount the component and tear down its scope.
    pub fn try_unmount(&mut self) -> Result<()> {
        let component = self.component.name();
        let scope = match std::mem::replace(&mut self.state, State::Retired) {
            State::Mounted(scope) => scope,
            other => {
                self.state = other;
                return Err(Error::NotMounted { component });
            }
        };

        self.component.unmount(&scope);
        scope.teardown();
        tracing::debug!(component, scope = %scope.id(), "unmount");
        Ok(())
    }

    /// Unmount. Panics if not mounted.
    #[track_caller]
    pub fn unmount(&mut self) {
        if let Err(err) = self.try_unmount() {
            fatal(err);
        }
    }
}

impl<H: Host> Drop for Child<H> {
    fn drop(&mut self) {
        let State::Mounted(scope) = &self.state else {
            return;
        };
        if std::thread::panicking() {
            return;
        }
        let component = self.component.name();
        if scope.scheduler().config().strict_lifecycle {
            panic!("component '{component}' dropped while mounted");
        }
        tracing::warn!(component, "component dropped while mounted; unmounting");
        self.unmount();
    }
}

// =============================================================================
// Children
// =============================================================================

/// An ordered set of children mounted and unmounted together.
///
/// Mounts in order, unmounts in reverse.
pub struct Children<H: Host> {
    items: Vec<Child<H>>,
}

impl<H: Host> Default for Children<H> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<H: Host> fmt::Debug for Children<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.items).finish()
    }
}

impl<H: Host> Children<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, component: impl Component<H>) {
        self.items.push(Child::new(component));
    }

    pub fn push_boxed(&mut self, component: AnyComponent<H>) {
        self.items.push(Child::from_box(component));
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Child<H>> {
        self.items.iter()
    }

    pub fn mount_all(&mut self, parent: &Scope<H>) {
        for child in &mut self.items {
            child.mount(parent);
        }
    }

    pub fn unmount_all(&mut self) {
        for child in self.items.iter_mut().rev() {
            if child.is_mounted() {
                child.unmount();
            }
        }
    }
}

impl<H: Host> FromIterator<AnyComponent<H>> for Children<H> {
    fn from_iter<I: IntoIterator<Item = AnyComponent<H>>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().map(Child::from_box).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::host::{shared, MemoryHost};
    use crate::reactive::Scheduler;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Probe {
        label: &'static str,
        log: Log,
    }

    impl Component<MemoryHost> for Probe {
        fn mount(&mut self, _scope: &Scope<MemoryHost>) {
            self.log.borrow_mut().push(format!("mount {}", self.label));
        }

        fn unmount(&mut self, _scope: &Scope<MemoryHost>) {
            self.log.borrow_mut().push(format!("unmount {}", self.label));
        }
    }

    fn root_scope(scheduler: Scheduler) -> Scope<MemoryHost> {
        let host = shared(MemoryHost::new());
        let container = host.borrow().root();
        Scope::root(host, scheduler, container)
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("a::b::Widget<c::Host>"), "Widget");
        assert_eq!(short_type_name("Plain"), "Plain");
    }

    #[test]
    fn test_default_name_is_type_name() {
        let log = Log::default();
        let child = Child::<MemoryHost>::new(Probe { label: "a", log });
        assert_eq!(child.name(), "Probe");
    }

    #[test]
    fn test_lifecycle_transitions() {
        let root = root_scope(Scheduler::new());
        let log = Log::default();
        let mut child = Child::new(Probe { label: "a", log: log.clone() });

        assert_eq!(child.lifecycle(), Lifecycle::Detached);
        child.mount(&root);
        assert_eq!(child.lifecycle(), Lifecycle::Mounted);
        assert_eq!(
            child.try_mount(&root),
            Err(Error::AlreadyMounted { component: "Probe" })
        );

        child.unmount();
        assert_eq!(child.lifecycle(), Lifecycle::Retired);
        assert_eq!(child.try_mount(&root), Err(Error::Remount { component: "Probe" }));
        assert_eq!(child.try_unmount(), Err(Error::NotMounted { component: "Probe" }));
        assert_eq!(*log.borrow(), vec!["mount a", "unmount a"]);
    }

    #[test]
    #[should_panic(expected = "was already unmounted")]
    fn test_remount_is_fatal() {
        let root = root_scope(Scheduler::new());
        let mut child = Child::new(Probe { label: "a", log: Log::default() });
        child.mount(&root);
        child.unmount();
        child.mount(&root);
    }

    #[test]
    fn test_children_unmount_in_reverse() {
        let root = root_scope(Scheduler::new());
        let log = Log::default();
        let mut children = Children::new();
        for label in ["a", "b"] {
            children.push(Probe { label, log: log.clone() });
        }
        children.push_boxed(Box::new(Probe { label: "c", log: log.clone() }));
        assert_eq!(children.len(), 3);

        children.mount_all(&root);
        assert_eq!(root.child_count(), 3);
        assert!(children.iter().all(Child::is_mounted));
        children.unmount_all();
        assert_eq!(root.child_count(), 0);
        assert!(children.iter().all(|child| child.lifecycle() == Lifecycle::Retired));
        assert_eq!(
            *log.borrow(),
            vec!["mount a", "mount b", "mount c", "unmount c", "unmount b", "unmount a"]
        );
    }

    #[test]
    fn test_drop_while_mounted_unmounts() {
        let root = root_scope(Scheduler::new());
        let log = Log::default();
        let mut child = Child::new(Probe { label: "a", log: log.clone() });
        child.mount(&root);
        drop(child);
        assert_eq!(*log.borrow(), vec!["mount a", "unmount a"]);
        assert_eq!(root.child_count(), 0);
    }

    #[test]
    #[should_panic(expected = "dropped while mounted")]
    fn test_drop_while_mounted_panics_when_strict() {
        let config = crate::config::Config::default().with_strict_lifecycle(true);
        let root = root_scope(Scheduler::with_config(config));
        let mut child = Child::new(Probe { label: "a", log: Log::default() });
        child.mount(&root);
        drop(child);
    }
}
