//! Reactive Example - Values driving attribute updates and branch swaps
//!
//! This example demonstrates:
//! - Binding a text element to a value
//! - `If` and `Switch` swapping branches during `tick`
//! - A font provided by an ancestor and consumed by a descendant
//!
//! Run with: cargo run --example reactive
//! Set RUST_LOG=spark_components=trace to watch every notification.

use spark_components::host::HostOp;
use spark_components::prelude::*;
use tracing_subscriber::EnvFilter;

struct UseFont;
impl ContextKind for UseFont {
    type Value = Font;
}

fn label(text: &'static str) -> Simple<MemoryHost> {
    Simple::new(move |h: &mut MemoryHost| h.create_text(text)).named("Label")
}

/// A caption that follows the nearest `UseFont`.
fn caption(text: &'static str) -> Composite<MemoryHost> {
    Composite::new(move |scope: &Scope<MemoryHost>| {
        let font = UseContext::<UseFont>::new().resolve(scope);
        let initial = font.get();
        Box::new(
            Simple::new(move |h: &mut MemoryHost| {
                let node = h.create_text(text);
                h.set_font(node, initial);
                node
            })
            .bind(&font, |h, node, font: &Font| h.set_font(*node, font.clone())),
        ) as AnyComponent<MemoryHost>
    })
    .named("Caption")
}

fn show(step: &str, host: &SharedHost<MemoryHost>) {
    let mut host = host.borrow_mut();
    let ops = host.take_ops();
    println!("--- {step} ({} element ops) ---", ops.len());
    for op in ops.iter().filter(|op| !matches!(op, HostOp::Create { .. })) {
        println!("  {op:?}");
    }
    print!("{}", host.outline(host.root()));
}

fn main() -> Result<(), spark_components::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== spark-components Reactive Example ===\n");

    let counter = Value::external(0i32);
    let message = counter.map(|n| format!("Count: {n}"));
    let visible = Value::external(true);
    let mode = Value::external("list");
    let font = Value::external(Font::default());

    let initial = message.clone();
    let tree = Provider::<UseFont, MemoryHost>::new(&font).with(
        List::new()
            .child(
                Simple::new(move |h: &mut MemoryHost| h.create_text(initial.get()))
                    .named("Counter")
                    .bind(&message, |h, node, text: &String| h.set_text(*node, text.clone())),
            )
            .child(If::new(&visible).then(|| label("Details shown")).otherwise(|| label("Details hidden")))
            .child(
                Switch::new(&mode)
                    .case("list", || label("[list view]"))
                    .case("grid", || label("[grid view]"))
                    .default(|| label("[unknown view]")),
            )
            .child(caption("Styled caption")),
    );

    let host = shared(MemoryHost::new());
    let container = host.borrow().root();
    let mut root = Root::new(host.clone(), tree);
    root.mount(container)?;
    show("mounted", &host);

    counter.set(1);
    counter.set(2);
    let stats = root.tick();
    println!("tick delivered {} notifications", stats.delivered);
    show("counter = 2", &host);

    visible.set(false);
    root.tick();
    show("visible = false", &host);

    mode.set("grid");
    root.tick();
    show("mode = grid", &host);

    mode.set("table");
    root.tick();
    show("mode = table", &host);

    font.set(Font::new("mono", 11).with_style(FontStyle::BOLD | FontStyle::MONOSPACE));
    root.tick();
    show("font changed", &host);

    root.unmount()?;
    show("unmounted", &host);

    println!("\n=== Example Complete ===");
    Ok(())
}
