//! Composite - Renders another component once, at mount.
//!
//! The render closure sees the composite's scope, so it can resolve contexts
//! and bind observers before deciding what to produce. It never re-runs;
//! reactivity inside the produced tree comes from its own bindings and
//! control-flow components.

use std::fmt;

use super::{AnyComponent, Child, Component, Scope};
use crate::host::Host;

type Render<H> = Box<dyn FnOnce(&Scope<H>) -> AnyComponent<H>>;

pub struct Composite<H: Host> {
    name: &'static str,
    render: Option<Render<H>>,
    rendered: Option<Child<H>>,
}

impl<H: Host> fmt::Debug for Composite<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composite")
            .field("name", &self.name)
            .field("rendered", &self.rendered)
            .finish()
    }
}

impl<H: Host> Composite<H> {
    pub fn new(render: impl FnOnce(&Scope<H>) -> AnyComponent<H> + 'static) -> Self {
        Self {
            name: "Composite",
            render: Some(Box::new(render)),
            rendered: None,
        }
    }

    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

impl<H: Host> Component<H> for Composite<H> {
    fn mount(&mut self, scope: &Scope<H>) {
        let Some(render) = self.render.take() else {
            panic!("composite component '{}' mounted twice", self.name);
        };
        let mut child = Child::from_box(render(scope));
        child.mount(scope);
        self.rendered = Some(child);
    }

    fn unmount(&mut self, _scope: &Scope<H>) {
        if let Some(mut child) = self.rendered.take() {
            child.unmount();
        }
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::component::Simple;
    use crate::host::{shared, MemoryHost};
    use crate::reactive::Scheduler;

    #[test]
    fn test_render_runs_once_at_mount() {
        let host = shared(MemoryHost::new());
        let container = host.borrow().root();
        let root = Scope::root(host.clone(), Scheduler::new(), container);
        let renders = Rc::new(Cell::new(0));

        let counter = renders.clone();
        let mut child = Child::new(
            Composite::new(move |_scope: &Scope<MemoryHost>| {
                counter.set(counter.get() + 1);
                Box::new(Simple::new(|h: &mut MemoryHost| h.create_text("inner"))) as AnyComponent<MemoryHost>
            })
            .named("Card"),
        );
        assert_eq!(renders.get(), 0, "render is deferred to mount");

        child.mount(&root);
        assert_eq!(renders.get(), 1);
        assert_eq!(child.name(), "Card");
        assert_eq!(host.borrow().child_texts(container), vec!["inner"]);

        child.unmount();
        assert_eq!(host.borrow().live_count(), 0);
        assert_eq!(root.child_count(), 0);
    }
}
