//! List - A fixed sequence of children with no element of its own.

use std::fmt;

use super::{AnyComponent, Children, Component, Scope};
use crate::host::Host;

/// Children mounted in order at the list's position.
pub struct List<H: Host> {
    children: Children<H>,
}

impl<H: Host> Default for List<H> {
    fn default() -> Self {
        Self {
            children: Children::new(),
        }
    }
}

impl<H: Host> fmt::Debug for List<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("List").field("children", &self.children).finish()
    }
}

impl<H: Host> List<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn child(mut self, component: impl Component<H>) -> Self {
        self.children.push(component);
        self
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl<H: Host> FromIterator<AnyComponent<H>> for List<H> {
    fn from_iter<I: IntoIterator<Item = AnyComponent<H>>>(iter: I) -> Self {
        Self {
            children: iter.into_iter().collect(),
        }
    }
}

impl<H: Host> Component<H> for List<H> {
    fn mount(&mut self, scope: &Scope<H>) {
        self.children.mount_all(scope);
    }

    fn unmount(&mut self, _scope: &Scope<H>) {
        self.children.unmount_all();
    }
}
