//! # spark-components
//!
//! Declarative component reconciliation over a retained element tree.
//!
//! A program describes its interface as a tree of components whose attributes
//! are bound to reactive values. When a value changes, only the affected
//! element attributes are updated, and only the affected subtrees are mounted
//! or unmounted.
//!
//! ## Architecture
//!
//! ```text
//! Value::set ─▶ dependents marked dirty ─▶ observers queue tasks
//!                                               │
//! Root::tick ◀──────────────────────────────────┘
//!     └─▶ callbacks: attribute setters, If/Switch branch swaps
//!             └─▶ Host::insert_before / Host::remove
//! ```
//!
//! Reads are always fresh; notification is the only deferred step. A tree
//! mutation triggered by a change happens during the next tick, never inside
//! the `set` that caused it.
//!
//! ## Modules
//!
//! - [`reactive`] - Values, observers, owners, and the scheduler
//! - [`component`] - Component kinds, the scope tree, context
//! - [`host`] - Element tree trait and the in-memory host
//! - [`root`] - Mount point tying a component tree to a host
//! - [`config`] - Runtime settings read from the environment
//! - [`error`] - Contract violation errors

pub mod component;
pub mod config;
pub mod error;
pub mod host;
pub mod reactive;
pub mod root;

pub use component::{
    AnyComponent, Child, Children, Component, Composite, ContextKind, If, Lifecycle, List,
    Provider, Scope, ScopeId, Simple, Switch, UseContext, WeakScope,
};
pub use config::Config;
pub use error::{fatal, Error, Result};
pub use host::{shared, Host, MemoryHost, SharedHost};
pub use reactive::{
    live_observer_count, Change, FlushStats, ListEdit, NoEdit, Observer, ObserverId, Owner,
    OwnerId, Scheduler, Value, ValueId, ValueList,
};
pub use root::Root;

/// Everything needed to describe and mount a tree.
pub mod prelude {
    pub use crate::component::{
        AnyComponent, Child, Children, Component, Composite, ContextKind, If, List, Provider,
        Scope, Simple, Switch, UseContext,
    };
    pub use crate::host::{shared, Font, FontStyle, Host, MemoryHost, NodeId, SharedHost};
    pub use crate::reactive::{Change, ListEdit, Observer, Owner, Scheduler, Value, ValueList};
    pub use crate::root::Root;
}
