//! Shared helpers for the integration tests.

#![allow(dead_code)]

use spark_components::prelude::*;
use tracing_subscriber::EnvFilter;

/// Route `tracing` output through the test harness. Filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Fresh host and its root container.
pub fn setup() -> (SharedHost<MemoryHost>, NodeId) {
    init_tracing();
    let host = shared(MemoryHost::new());
    let container = host.borrow().root();
    (host, container)
}

/// A text leaf with a fixed string.
pub fn text(label: &'static str) -> Simple<MemoryHost> {
    Simple::new(move |h: &mut MemoryHost| h.create_text(label)).named("Text")
}

/// Texts of the root container's children, in order.
pub fn texts(host: &SharedHost<MemoryHost>) -> Vec<String> {
    let host = host.borrow();
    host.child_texts(host.root())
}
