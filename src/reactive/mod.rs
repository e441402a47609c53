//! Reactive engine - values, observers, and the update scheduler.
//!
//! # Data Flow
//!
//! ```text
//! value.set(v) ─▶ observers enqueue tasks ─▶ Scheduler::flush ─▶ callbacks(&Change)
//!      │
//!      └─▶ derived values marked dirty ─▶ their observers enqueue tasks
//! ```
//!
//! Values are always fresh on read. Notification is the only deferred step,
//! so structural changes (mount/unmount) made by a callback never interleave
//! with the `set` that caused them.

pub mod change;
pub mod observer;
pub mod scheduler;
pub mod value;

pub use change::{Change, ListEdit, NoEdit};
pub use observer::{live_observer_count, Observer, ObserverId, Owner, OwnerId};
pub use scheduler::{FlushStats, Scheduler, Task};
pub use value::{Value, ValueId, ValueList};
