//! Error types for contract violations.
//!
//! Everything in here describes a programmer error in the component tree
//! description, not an environmental failure. The `try_*` entry points hand
//! these back as `Result`; everything else goes through [`fatal`], which logs
//! and panics, because continuing after a half-applied tree mutation is worse
//! than stopping.

use thiserror::Error;

/// Contract violations detected by the reactive engine and the component
/// lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A consumer asked for a context that no ancestor provides.
    #[error("missing context '{kind}': no ancestor provider is mounted")]
    MissingContext { kind: &'static str },

    /// `mount` was called on a component that is already mounted.
    #[error("component '{component}' is already mounted")]
    AlreadyMounted { component: &'static str },

    /// `mount` was called on a component that was mounted and unmounted before.
    #[error("component '{component}' was already unmounted; construct a fresh value instead")]
    Remount { component: &'static str },

    /// `unmount` was called on a component that is not mounted.
    #[error("component '{component}' is not mounted")]
    NotMounted { component: &'static str },

    /// An observer was read before any value was assigned to it.
    #[error("observer is not bound to a value")]
    UnboundObserver,

    /// The element tree was asked to remove a node it does not hold.
    #[error("element {node} is not a child of its container")]
    ChildNotFound { node: String },

    /// `set` was called on a constant or derived value.
    #[error("value #{id} is {kind} and cannot be set")]
    ImmutableValue { id: u64, kind: &'static str },

    /// A single flush delivered more tasks than the configured limit.
    #[error("flush exceeded {limit} tasks; an observer keeps re-marking its own input")]
    FlushLimitExceeded { limit: usize },
}

/// Convenience alias used by the `try_*` entry points.
pub type Result<T> = std::result::Result<T, Error>;

/// Log a contract violation and abort the current operation.
#[track_caller]
pub fn fatal(error: Error) -> ! {
    tracing::error!(%error, "contract violation");
    panic!("{error}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_context_message_names_kind() {
        let err = Error::MissingContext { kind: "Font" };
        assert_eq!(
            err.to_string(),
            "missing context 'Font': no ancestor provider is mounted"
        );
    }

    #[test]
    #[should_panic(expected = "observer is not bound")]
    fn test_fatal_panics_with_display_text() {
        fatal(Error::UnboundObserver);
    }
}
