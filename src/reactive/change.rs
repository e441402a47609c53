//! Change payloads delivered to observers.
//!
//! A notification says *how* a value changed:
//!
//! - [`Change::Unchanged`] - the value was re-marked but reads the same
//! - [`Change::Replaced`] - the whole value was swapped
//! - [`Change::Edited`] - an ordered collection was edited in place
//!
//! Scalar values only ever produce the first two. List values produce
//! `Edited` for `push`/`insert`/`remove`/`replace`, so a consumer can patch
//! its element children instead of rebuilding them.

use std::fmt;

/// Edit type for values that are never edited in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoEdit {}

/// One structural edit to an ordered collection.
#[derive(Debug, Clone, PartialEq)]
pub enum ListEdit<T> {
    /// `value` was inserted at `index`; later items shifted right.
    Insert { index: usize, value: T },
    /// The item at `index` was removed; later items shifted left.
    Remove { index: usize },
    /// The item at `index` was overwritten.
    Replace { index: usize, value: T },
}

impl<T: Clone> ListEdit<T> {
    /// Replay this edit on a mirror of the collection.
    ///
    /// Panics if `index` is out of bounds for `target`, which means the mirror
    /// has diverged from the source.
    pub fn apply(&self, target: &mut Vec<T>) {
        match self {
            ListEdit::Insert { index, value } => target.insert(*index, value.clone()),
            ListEdit::Remove { index } => {
                target.remove(*index);
            }
            ListEdit::Replace { index, value } => target[*index] = value.clone(),
        }
    }

    /// Index this edit touches.
    pub fn index(&self) -> usize {
        match self {
            ListEdit::Insert { index, .. }
            | ListEdit::Remove { index }
            | ListEdit::Replace { index, .. } => *index,
        }
    }
}

/// Description of how an observed value changed.
#[derive(Clone, PartialEq)]
pub enum Change<T, E = NoEdit> {
    /// Notification without a visible difference.
    Unchanged,
    /// The value was replaced.
    Replaced { old: T, new: T },
    /// The collection was edited in place, edits in application order.
    Edited(Vec<E>),
}

impl<T, E> Change<T, E> {
    /// Whether the consumer can skip this notification.
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Change::Unchanged)
    }

    /// New value for a replacement.
    pub fn new_value(&self) -> Option<&T> {
        match self {
            Change::Replaced { new, .. } => Some(new),
            _ => None,
        }
    }

    /// Old value for a replacement.
    pub fn old_value(&self) -> Option<&T> {
        match self {
            Change::Replaced { old, .. } => Some(old),
            _ => None,
        }
    }

    /// Edits for an in-place change.
    pub fn edits(&self) -> &[E] {
        match self {
            Change::Edited(edits) => edits,
            _ => &[],
        }
    }
}

impl<T: PartialEq, E> Change<T, E> {
    /// Build a replacement payload, collapsing equal values to `Unchanged`.
    pub fn replaced(old: T, new: T) -> Self {
        if old == new {
            Change::Unchanged
        } else {
            Change::Replaced { old, new }
        }
    }
}

impl<T: fmt::Debug, E: fmt::Debug> fmt::Debug for Change<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::Unchanged => f.write_str("Unchanged"),
            Change::Replaced { old, new } => f
                .debug_struct("Replaced")
                .field("old", old)
                .field("new", new)
                .finish(),
            Change::Edited(edits) => f.debug_tuple("Edited").field(edits).finish(),
        }
    }
}
