//! Simple - A component that owns exactly one element.
//!
//! The element is created from the host once at mount and inserted at the
//! component's position. Each binding connects one value to one attribute
//! setter: the setter runs on updates only, never at mount (the create
//! closure is responsible for the initial state).

use std::fmt;

use super::{Children, Component, Scope};
use crate::host::Host;
use crate::reactive::{Change, Value};

type Create<H> = Box<dyn FnOnce(&mut H) -> <H as Host>::Node>;
type Binding<H> = Box<dyn FnOnce(&Scope<H>, &<H as Host>::Node)>;

/// A component owning one element, with attribute bindings and children
/// nested inside the element.
pub struct Simple<H: Host> {
    name: &'static str,
    create: Option<Create<H>>,
    bindings: Vec<Binding<H>>,
    children: Children<H>,
}

impl<H: Host> fmt::Debug for Simple<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simple")
            .field("name", &self.name)
            .field("bindings", &self.bindings.len())
            .field("children", &self.children)
            .finish()
    }
}

impl<H: Host> Simple<H> {
    /// Element produced by `create` at mount.
    pub fn new(create: impl FnOnce(&mut H) -> H::Node + 'static) -> Self {
        Self {
            name: "Simple",
            create: Some(Box::new(create)),
            bindings: Vec::new(),
            children: Children::new(),
        }
    }

    /// Name used in logs and errors.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Call `apply` with the new value each time `value` actually changes.
    ///
    /// List edits pass the whole list after the edit.
    pub fn bind<T, E>(
        self,
        value: &Value<T, E>,
        apply: impl Fn(&mut H, &H::Node, &T) + 'static,
    ) -> Self
    where
        T: Clone + PartialEq + 'static,
        E: Clone + 'static,
    {
        let source = value.clone();
        self.bind_change(value, move |host, node, change| match change {
            Change::Unchanged => {}
            Change::Replaced { new, .. } => apply(host, node, new),
            Change::Edited(_) => apply(host, node, &source.get()),
        })
    }

    /// Call `apply` with every delivered change, including
    /// [`Change::Unchanged`].
    pub fn bind_change<T, E>(
        mut self,
        value: &Value<T, E>,
        apply: impl Fn(&mut H, &H::Node, &Change<T, E>) + 'static,
    ) -> Self
    where
        T: Clone + PartialEq + 'static,
        E: Clone + 'static,
    {
        let value = value.clone();
        self.bindings.push(Box::new(move |scope: &Scope<H>, node: &H::Node| {
            let host = scope.host().clone();
            let node = node.clone();
            scope.observe(&value, move |change| {
                apply(&mut host.borrow_mut(), &node, change);
            });
        }));
        self
    }

    /// Nest `component` inside this element.
    pub fn child(mut self, component: impl Component<H>) -> Self {
        self.children.push(component);
        self
    }
}

impl<H: Host> Component<H> for Simple<H> {
    fn mount(&mut self, scope: &Scope<H>) {
        let Some(create) = self.create.take() else {
            panic!("simple component '{}' mounted twice", self.name);
        };
        let node = scope.with_host(create);
        scope.attach_element(node.clone());
        for bind in self.bindings.drain(..) {
            bind(scope, &node);
        }
        self.children.mount_all(scope);
    }

    fn unmount(&mut self, _scope: &Scope<H>) {
        self.children.unmount_all();
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
