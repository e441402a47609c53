//! Basic Example - Mount a static tree and tear it down
//!
//! This example demonstrates:
//! - Describing a tree with `Simple` and `List`
//! - Mounting it into a `MemoryHost` through a `Root`
//! - Unmounting, which leaves the container empty
//!
//! Run with: cargo run --example basic
//! Set RUST_LOG=spark_components=debug to see mount/unmount logs.

use spark_components::prelude::*;
use tracing_subscriber::EnvFilter;

fn label(text: &'static str) -> Simple<MemoryHost> {
    Simple::new(move |h: &mut MemoryHost| h.create_text(text)).named("Label")
}

fn main() -> Result<(), spark_components::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== spark-components Basic Example ===\n");

    let host = shared(MemoryHost::new());
    let container = host.borrow().root();

    let tree = List::new()
        .child(label("Title"))
        .child(
            Simple::new(|h: &mut MemoryHost| h.create_container("row"))
                .named("Row")
                .child(label("left"))
                .child(label("right")),
        )
        .child(label("Footer"));

    let mut root = Root::new(host.clone(), tree);
    root.mount(container)?;

    println!("Mounted:");
    print!("{}", host.borrow().outline(container));
    println!("Elements alive: {}", host.borrow().live_count());

    root.unmount()?;
    println!("\nAfter unmount:");
    print!("{}", host.borrow().outline(container));
    println!("Elements alive: {}", host.borrow().live_count());

    println!("\n=== Example Complete ===");
    Ok(())
}
