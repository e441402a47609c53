//! Scope - The tree of mounted component instances.
//!
//! Components are short-lived descriptions; a [`Scope`] is what exists while
//! one of them is mounted. Each scope records:
//!
//! - a weak back-reference to its parent (never keeps ancestors alive)
//! - its mounted child scopes, in sibling order
//! - the element it owns, if the component is a simple one
//! - the [`Owner`] for its observers, plus observers kept alive until unmount
//! - the contexts it provides to descendants
//!
//! # Sibling position
//!
//! A component that produces no element of its own (a list, a conditional)
//! still occupies a position in the flat element tree. When a scope inserts
//! its element, the element goes before the first element found in the
//! scopes that follow it; if there is none, the search moves up to the parent
//! scope, stopping at the first ancestor that owns an element (then the new
//! element is appended inside that ancestor).
//!
//! ```text
//! List                      root container: [A, B]
//! ├── If ── Text A          swap If to A' → insert A' before B
//! └── Text B
//! ```

use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::{Error, Result};
use crate::host::{Host, SharedHost};
use crate::reactive::{Change, ObserverId, Observer, Owner, Scheduler, Value};

use super::context::ContextKind;

// =============================================================================
// Identity
// =============================================================================

/// Identity of a mounted scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u64);

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

thread_local! {
    static NEXT_SCOPE_ID: Cell<u64> = const { Cell::new(1) };
}

fn next_scope_id() -> ScopeId {
    NEXT_SCOPE_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        ScopeId(id)
    })
}

// =============================================================================
// Scope
// =============================================================================

struct ScopeNode<H: Host> {
    id: ScopeId,
    name: &'static str,
    parent: Option<Weak<ScopeNode<H>>>,
    host: SharedHost<H>,
    scheduler: Scheduler,
    owner: Owner,
    /// Mount point; set only on a root scope and never removed.
    container: Option<H::Node>,
    element: RefCell<Option<H::Node>>,
    children: RefCell<Vec<Scope<H>>>,
    contexts: RefCell<HashMap<TypeId, Box<dyn Any>>>,
    keep_alive: RefCell<Vec<Box<dyn Any>>>,
    mounted: Cell<bool>,
}

/// A mounted component instance.
///
/// Cloning yields another handle to the same scope.
pub struct Scope<H: Host> {
    node: Rc<ScopeNode<H>>,
}

/// Non-owning handle to a [`Scope`], for observer callbacks.
pub struct WeakScope<H: Host> {
    node: Weak<ScopeNode<H>>,
}

impl<H: Host> Clone for Scope<H> {
    fn clone(&self) -> Self {
        Self {
            node: Rc::clone(&self.node),
        }
    }
}

impl<H: Host> Clone for WeakScope<H> {
    fn clone(&self) -> Self {
        Self {
            node: Weak::clone(&self.node),
        }
    }
}

impl<H: Host> fmt::Debug for Scope<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.node.id)
            .field("name", &self.node.name)
            .field("mounted", &self.node.mounted.get())
            .field("element", &self.node.element.borrow())
            .field("children", &self.node.children.borrow().len())
            .finish()
    }
}

impl<H: Host> WeakScope<H> {
    /// Upgrade to a live scope that is still mounted.
    pub fn upgrade(&self) -> Option<Scope<H>> {
        self.node
            .upgrade()
            .map(|node| Scope { node })
            .filter(Scope::is_mounted)
    }
}

impl<H: Host> Scope<H> {
    /// Create a root scope anchored at `container`.
    pub(crate) fn root(host: SharedHost<H>, scheduler: Scheduler, container: H::Node) -> Self {
        let owner = Owner::new(&scheduler, "root");
        Self {
            node: Rc::new(ScopeNode {
                id: next_scope_id(),
                name: "root",
                parent: None,
                host,
                scheduler,
                owner,
                container: Some(container),
                element: RefCell::new(None),
                children: RefCell::new(Vec::new()),
                contexts: RefCell::new(HashMap::new()),
                keep_alive: RefCell::new(Vec::new()),
                mounted: Cell::new(true),
            }),
        }
    }

    /// Create a mounted child scope appended after the existing children.
    pub(crate) fn child(&self, name: &'static str) -> Self {
        let child = Self {
            node: Rc::new(ScopeNode {
                id: next_scope_id(),
                name,
                parent: Some(Rc::downgrade(&self.node)),
                host: Rc::clone(&self.node.host),
                scheduler: self.node.scheduler.clone(),
                owner: Owner::new(&self.node.scheduler, name),
                container: None,
                element: RefCell::new(None),
                children: RefCell::new(Vec::new()),
                contexts: RefCell::new(HashMap::new()),
                keep_alive: RefCell::new(Vec::new()),
                mounted: Cell::new(true),
            }),
        };
        self.node.children.borrow_mut().push(child.clone());
        child
    }

    pub fn id(&self) -> ScopeId {
        self.node.id
    }

    /// Name of the component mounted in this scope.
    pub fn name(&self) -> &'static str {
        self.node.name
    }

    pub fn is_mounted(&self) -> bool {
        self.node.mounted.get()
    }

    /// Whether both handles refer to the same scope.
    pub fn ptr_eq(&self, other: &Scope<H>) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    pub fn downgrade(&self) -> WeakScope<H> {
        WeakScope {
            node: Rc::downgrade(&self.node),
        }
    }

    /// Parent scope; `None` at the root.
    pub fn parent(&self) -> Option<Scope<H>> {
        self.node
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|node| Scope { node })
    }

    /// Distance from the root scope.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.parent();
        while let Some(scope) = current {
            depth += 1;
            current = scope.parent();
        }
        depth
    }

    /// Number of mounted child scopes.
    pub fn child_count(&self) -> usize {
        self.node.children.borrow().len()
    }

    /// Mounted child scopes in sibling order.
    pub fn children(&self) -> Vec<Scope<H>> {
        self.node.children.borrow().clone()
    }

    pub fn host(&self) -> &SharedHost<H> {
        &self.node.host
    }

    /// Run `f` with the host mutably borrowed.
    ///
    /// `f` must not mount or unmount components.
    pub fn with_host<R>(&self, f: impl FnOnce(&mut H) -> R) -> R {
        f(&mut self.node.host.borrow_mut())
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.node.scheduler
    }

    /// Owner of every observer this scope creates.
    pub fn owner(&self) -> Owner {
        self.node.owner.clone()
    }

    /// Element owned by this scope.
    pub fn element(&self) -> Option<H::Node> {
        self.node.element.borrow().clone()
    }

    // =========================================================================
    // Elements
    // =========================================================================

    /// Insert `node` at this scope's position and take ownership of it.
    ///
    /// Panics if the scope already owns an element.
    pub fn attach_element(&self, node: H::Node) {
        assert!(
            self.node.element.borrow().is_none(),
            "scope {} ({}) already owns an element",
            self.node.id,
            self.node.name
        );
        let container = self.container();
        let before = self.next_sibling_element();
        tracing::trace!(
            scope = %self.node.id,
            component = self.node.name,
            ?container,
            ?node,
            ?before,
            "insert element"
        );
        self.node
            .host
            .borrow_mut()
            .insert_before(&container, &node, before.as_ref());
        *self.node.element.borrow_mut() = Some(node);
    }

    /// Element that holds this scope's element: the nearest ancestor element,
    /// or the root mount point.
    fn container(&self) -> H::Node {
        let mut current = self.parent();
        while let Some(scope) = current {
            if let Some(element) = scope.element() {
                return element;
            }
            if let Some(container) = scope.node.container.clone() {
                return container;
            }
            current = scope.parent();
        }
        panic!(
            "scope {} ({}) is not attached to a root",
            self.node.id, self.node.name
        );
    }

    /// First element in this scope's subtree, in tree order.
    pub fn first_element(&self) -> Option<H::Node> {
        if let Some(element) = self.element() {
            return Some(element);
        }
        self.node
            .children
            .borrow()
            .iter()
            .find_map(Scope::first_element)
    }

    /// Element the next element of this scope must be inserted before.
    fn next_sibling_element(&self) -> Option<H::Node> {
        let mut current = self.clone();
        loop {
            let parent = current.parent()?;
            {
                let siblings = parent.node.children.borrow();
                if let Some(position) = siblings.iter().position(|s| s.ptr_eq(&current)) {
                    if let Some(found) = siblings[position + 1..].iter().find_map(Scope::first_element) {
                        return Some(found);
                    }
                }
            }
            if parent.element().is_some() || parent.node.container.is_some() {
                return None;
            }
            current = parent;
        }
    }

    // =========================================================================
    // Observers
    // =========================================================================

    /// Bind an observer owned by this scope; it lives until unmount.
    pub fn observe<T, E>(
        &self,
        value: &Value<T, E>,
        callback: impl Fn(&Change<T, E>) + 'static,
    ) -> ObserverId
    where
        T: Clone + PartialEq + 'static,
        E: Clone + 'static,
    {
        let observer = Observer::bound(&self.node.owner, value, callback);
        let id = observer.id();
        self.keep(observer);
        id
    }

    /// Keep `item` alive until this scope is torn down.
    pub fn keep(&self, item: impl Any) {
        self.node.keep_alive.borrow_mut().push(Box::new(item));
    }

    // =========================================================================
    // Contexts
    // =========================================================================

    /// Make `value` available to descendants asking for `C`.
    pub fn provide<C: ContextKind>(&self, value: Value<C::Value>) {
        tracing::trace!(scope = %self.node.id, context = C::name(), "provide context");
        self.node
            .contexts
            .borrow_mut()
            .insert(TypeId::of::<C>(), Box::new(value));
    }

    /// Stop providing `C` from this scope.
    pub fn withdraw<C: ContextKind>(&self) {
        self.node.contexts.borrow_mut().remove(&TypeId::of::<C>());
    }

    /// Whether this scope itself provides `C`.
    pub fn provides<C: ContextKind>(&self) -> bool {
        self.node.contexts.borrow().contains_key(&TypeId::of::<C>())
    }

    /// Walk the ancestors for the nearest provider of `C`.
    pub fn find_context<C: ContextKind>(&self) -> Result<Value<C::Value>> {
        let key = TypeId::of::<C>();
        let mut current = self.parent();
        while let Some(scope) = current {
            let found = scope
                .node
                .contexts
                .borrow()
                .get(&key)
                .and_then(|entry| entry.downcast_ref::<Value<C::Value>>())
                .cloned();
            if let Some(value) = found {
                return Ok(value);
            }
            current = scope.parent();
        }
        Err(Error::MissingContext { kind: C::name() })
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Release everything this scope holds and detach it from its parent.
    ///
    /// Called after the component has unmounted its own children.
    pub(crate) fn teardown(&self) {
        let leftover: Vec<Scope<H>> = self.node.children.borrow().clone();
        debug_assert!(
            leftover.is_empty(),
            "component '{}' left {} child scope(s) mounted",
            self.node.name,
            leftover.len()
        );
        if !leftover.is_empty() {
            tracing::warn!(
                component = self.node.name,
                count = leftover.len(),
                "tearing down child scopes the component did not unmount"
            );
            for child in leftover.iter().rev() {
                child.teardown();
            }
        }

        if let Some(element) = self.node.element.borrow_mut().take() {
            tracing::trace!(scope = %self.node.id, component = self.node.name, ?element, "remove element");
            self.node.host.borrow_mut().remove(&element);
        }

        debug_assert!(
            self.node.contexts.borrow().is_empty(),
            "component '{}' unmounted while still providing context",
            self.node.name
        );
        self.node.contexts.borrow_mut().clear();

        self.node.owner.release();
        let kept = std::mem::take(&mut *self.node.keep_alive.borrow_mut());
        drop(kept);
        self.node.mounted.set(false);

        if let Some(parent) = self.parent() {
            parent
                .node
                .children
                .borrow_mut()
                .retain(|sibling| !sibling.ptr_eq(self));
        }
    }
}
