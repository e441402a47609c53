//! MemoryHost - In-memory element tree.
//!
//! Elements are indices into a slab with a free list, the same way the
//! component registry in a terminal renderer hands out array indices:
//! released slots are reused by the next allocation.
//!
//! Every mutation is appended to an operation log so callers can assert on
//! exactly which element-tree calls the reconciler issued.
//!
//! ```text
//! root (Container)
//! ├── n1 Text "Hello"
//! └── n2 Container "row"
//!     └── n3 Text "World"
//! ```

use std::fmt;

use bitflags::bitflags;

use super::Host;
use crate::error::{fatal, Error};

// =============================================================================
// Types
// =============================================================================

/// Handle to an element in a [`MemoryHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

bitflags! {
    /// Font style attributes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FontStyle: u8 {
        const BOLD      = 1 << 0;
        const ITALIC    = 1 << 1;
        const UNDERLINE = 1 << 2;
        const MONOSPACE = 1 << 3;
    }
}

/// Font applied to text elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Font {
    pub family: String,
    pub size: u16,
    pub style: FontStyle,
}

impl Font {
    pub fn new(family: impl Into<String>, size: u16) -> Self {
        Self {
            family: family.into(),
            size,
            style: FontStyle::empty(),
        }
    }

    pub fn with_style(mut self, style: FontStyle) -> Self {
        self.style = style;
        self
    }
}

impl Default for Font {
    fn default() -> Self {
        Self::new("sans", 12)
    }
}

/// Element variety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Holds other elements.
    Container,
    /// Displays a string.
    Text,
}

/// One element in the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub kind: ElementKind,
    pub label: String,
    pub text: String,
    pub font: Option<Font>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl Element {
    fn new(kind: ElementKind, label: String) -> Self {
        Self {
            kind,
            label,
            text: String::new(),
            font: None,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// Recorded element-tree operation.
#[derive(Debug, Clone, PartialEq)]
pub enum HostOp {
    Create { node: NodeId, kind: ElementKind },
    Insert { container: NodeId, node: NodeId, before: Option<NodeId> },
    Remove { node: NodeId },
    SetText { node: NodeId, text: String },
    SetFont { node: NodeId, font: Font },
}

// =============================================================================
// MemoryHost
// =============================================================================

/// In-memory retained element tree.
#[derive(Debug, Clone)]
pub struct MemoryHost {
    slots: Vec<Option<Element>>,
    free: Vec<usize>,
    ops: Vec<HostOp>,
    root: NodeId,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    /// Create a tree holding a single root container.
    pub fn new() -> Self {
        let mut host = Self {
            slots: Vec::new(),
            free: Vec::new(),
            ops: Vec::new(),
            root: NodeId(0),
        };
        host.root = host.allocate(Element::new(ElementKind::Container, "root".into()));
        host.ops.clear();
        host
    }

    /// Root container, the usual mount point.
    pub fn root(&self) -> NodeId {
        self.root
    }

    fn allocate(&mut self, element: Element) -> NodeId {
        let kind = element.kind;
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(element);
                index
            }
            None => {
                self.slots.push(Some(element));
                self.slots.len() - 1
            }
        };
        let node = NodeId(index);
        self.ops.push(HostOp::Create { node, kind });
        node
    }

    /// Create a detached container.
    pub fn create_container(&mut self, label: impl Into<String>) -> NodeId {
        self.allocate(Element::new(ElementKind::Container, label.into()))
    }

    /// Create a detached text element.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        let mut element = Element::new(ElementKind::Text, String::from("text"));
        element.text = text.into();
        self.allocate(element)
    }

    fn element_mut(&mut self, node: NodeId) -> &mut Element {
        match self.slots.get_mut(node.0).and_then(Option::as_mut) {
            Some(element) => element,
            None => fatal(Error::ChildNotFound {
                node: node.to_string(),
            }),
        }
    }

    /// Element at `node`, if it exists.
    pub fn get(&self, node: NodeId) -> Option<&Element> {
        self.slots.get(node.0).and_then(Option::as_ref)
    }

    /// Whether `node` exists.
    pub fn contains(&self, node: NodeId) -> bool {
        self.get(node).is_some()
    }

    /// Replace the text of `node`.
    pub fn set_text(&mut self, node: NodeId, text: impl Into<String>) {
        let text = text.into();
        self.element_mut(node).text = text.clone();
        self.ops.push(HostOp::SetText { node, text });
    }

    /// Replace the font of `node`.
    pub fn set_font(&mut self, node: NodeId, font: Font) {
        self.element_mut(node).font = Some(font.clone());
        self.ops.push(HostOp::SetFont { node, font });
    }

    /// Text of `node`, empty for containers or missing nodes.
    pub fn text(&self, node: NodeId) -> &str {
        self.get(node).map(|e| e.text.as_str()).unwrap_or("")
    }

    /// Font of `node`.
    pub fn font(&self, node: NodeId) -> Option<&Font> {
        self.get(node).and_then(|e| e.font.as_ref())
    }

    /// Children of `node` in order.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.get(node).map(|e| e.children.as_slice()).unwrap_or(&[])
    }

    /// Parent of `node`.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node).and_then(|e| e.parent)
    }

    /// Texts of the direct children of `container`, in order.
    pub fn child_texts(&self, container: NodeId) -> Vec<String> {
        self.children(container)
            .iter()
            .map(|child| self.text(*child).to_string())
            .collect()
    }

    /// Number of elements besides the root.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count() - 1
    }

    /// Operation log since creation or the last [`MemoryHost::take_ops`].
    pub fn ops(&self) -> &[HostOp] {
        &self.ops
    }

    /// Drain the operation log.
    pub fn take_ops(&mut self) -> Vec<HostOp> {
        std::mem::take(&mut self.ops)
    }

    /// Number of logged operations matching `filter`.
    pub fn count_ops(&self, filter: impl Fn(&HostOp) -> bool) -> usize {
        self.ops.iter().filter(|op| filter(op)).count()
    }

    /// Indented outline of the subtree under `node`.
    pub fn outline(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.outline_into(node, 0, &mut out);
        out
    }

    fn outline_into(&self, node: NodeId, depth: usize, out: &mut String) {
        let Some(element) = self.get(node) else { return };
        let indent = "  ".repeat(depth);
        match element.kind {
            ElementKind::Container => out.push_str(&format!("{indent}{node} [{}]\n", element.label)),
            ElementKind::Text => out.push_str(&format!("{indent}{node} {:?}\n", element.text)),
        }
        for child in &element.children {
            self.outline_into(*child, depth + 1, out);
        }
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.element_mut(node).parent.take() {
            self.element_mut(parent).children.retain(|child| *child != node);
        }
    }
}

impl Host for MemoryHost {
    type Node = NodeId;

    fn insert_before(&mut self, container: &NodeId, node: &NodeId, before: Option<&NodeId>) {
        let (container, node) = (*container, *node);
        self.detach(node);

        let position = match before {
            Some(sibling) => {
                let children = &self.element_mut(container).children;
                match children.iter().position(|child| child == sibling) {
                    Some(position) => position,
                    None => fatal(Error::ChildNotFound {
                        node: sibling.to_string(),
                    }),
                }
            }
            None => self.element_mut(container).children.len(),
        };

        self.element_mut(container).children.insert(position, node);
        self.element_mut(node).parent = Some(container);
        self.ops.push(HostOp::Insert {
            container,
            node,
            before: before.copied(),
        });
    }

    fn remove(&mut self, node: &NodeId) {
        let node = *node;
        if self.element_mut(node).parent.is_none() {
            fatal(Error::ChildNotFound {
                node: node.to_string(),
            });
        }
        debug_assert!(
            self.children(node).is_empty(),
            "element {node} removed before its children"
        );
        self.detach(node);
        self.slots[node.0] = None;
        self.free.push(node.0);
        self.ops.push(HostOp::Remove { node });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_orders_children() {
        let mut host = MemoryHost::new();
        let root = host.root();
        let a = host.create_text("a");
        let b = host.create_text("b");
        let c = host.create_text("c");

        host.insert_before(&root, &a, None);
        host.insert_before(&root, &c, None);
        host.insert_before(&root, &b, Some(&c));

        assert_eq!(host.child_texts(root), vec!["a", "b", "c"]);
        assert_eq!(host.parent(b), Some(root));
    }

    #[test]
    fn test_remove_releases_and_reuses_slot() {
        let mut host = MemoryHost::new();
        let root = host.root();
        let a = host.create_text("a");
        host.insert_before(&root, &a, None);
        assert_eq!(host.live_count(), 1);

        host.remove(&a);
        assert_eq!(host.live_count(), 0);
        assert!(!host.contains(a));

        let b = host.create_text("b");
        assert_eq!(b, a, "freed slot should be reused");
    }

    #[test]
    #[should_panic(expected = "is not a child")]
    fn test_remove_detached_is_fatal() {
        let mut host = MemoryHost::new();
        let a = host.create_text("a");
        host.remove(&a);
    }

    #[test]
    #[should_panic(expected = "is not a child")]
    fn test_insert_before_foreign_sibling_is_fatal() {
        let mut host = MemoryHost::new();
        let root = host.root();
        let a = host.create_text("a");
        let stray = host.create_text("stray");
        host.insert_before(&root, &a, Some(&stray));
    }

    #[test]
    fn test_ops_are_logged() {
        let mut host = MemoryHost::new();
        let root = host.root();
        let a = host.create_text("a");
        host.insert_before(&root, &a, None);
        host.set_font(a, Font::new("mono", 10).with_style(FontStyle::BOLD | FontStyle::MONOSPACE));
        host.set_text(a, "b");

        assert_eq!(
            host.take_ops(),
            vec![
                HostOp::Create { node: a, kind: ElementKind::Text },
                HostOp::Insert { container: root, node: a, before: None },
                HostOp::SetFont {
                    node: a,
                    font: Font::new("mono", 10).with_style(FontStyle::BOLD | FontStyle::MONOSPACE),
                },
                HostOp::SetText { node: a, text: "b".into() },
            ]
        );
        assert!(host.ops().is_empty());
    }

    #[test]
    fn test_outline() {
        let mut host = MemoryHost::new();
        let root = host.root();
        let row = host.create_container("row");
        let text = host.create_text("hi");
        host.insert_before(&root, &row, None);
        host.insert_before(&row, &text, None);
        assert_eq!(host.outline(root), "n0 [root]\n  n1 [row]\n    n2 \"hi\"\n");
    }
}
