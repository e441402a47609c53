//! Element tree collaborator.
//!
//! The core never draws anything. It talks to the retained element tree
//! through the [`Host`] trait: insert a node before a sibling inside a
//! container, and remove a node. Creating nodes and the type-specific setters
//! are the host's own API, called by [`Simple`](crate::component::Simple)
//! components from their create and bind closures.
//!
//! [`memory::MemoryHost`] is an in-memory tree with an operation log, used by
//! the tests and demos.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

pub mod memory;

pub use memory::{Element, ElementKind, Font, FontStyle, HostOp, MemoryHost, NodeId};

/// A retained element tree the component tree is reconciled against.
pub trait Host: 'static {
    /// Handle to one element.
    type Node: Clone + PartialEq + fmt::Debug + 'static;

    /// Insert `node` into `container` before `before`, or at the end.
    fn insert_before(&mut self, container: &Self::Node, node: &Self::Node, before: Option<&Self::Node>);

    /// Detach `node` from its container and release it.
    fn remove(&mut self, node: &Self::Node);
}

/// Host shared between the root, the scopes, and observer callbacks.
///
/// Borrows are short: one element operation each. Never hold a borrow while
/// mounting or unmounting components.
pub type SharedHost<H> = Rc<RefCell<H>>;

/// Wrap a host for sharing.
pub fn shared<H: Host>(host: H) -> SharedHost<H> {
    Rc::new(RefCell::new(host))
}
