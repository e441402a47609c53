//! Root - Where a component tree meets a host.
//!
//! ```ignore
//! let host = shared(MemoryHost::new());
//! let container = host.borrow().root();
//!
//! let mut root = Root::new(host.clone(), app);
//! root.mount(container)?;   // builds the element tree synchronously
//! state.set(next);          // marks dependents, queues notifications
//! root.tick();              // delivers them, applying structural changes
//! root.unmount()?;          // element tree back to empty
//! ```

use std::fmt;

use crate::component::{Child, Component, Scope};
use crate::error::{Error, Result};
use crate::host::{Host, SharedHost};
use crate::reactive::{FlushStats, Scheduler};

/// Owns the top-level component and the scheduler driving it.
pub struct Root<H: Host> {
    host: SharedHost<H>,
    scheduler: Scheduler,
    child: Child<H>,
    scope: Option<Scope<H>>,
}

impl<H: Host> fmt::Debug for Root<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Root")
            .field("child", &self.child)
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

impl<H: Host> Root<H> {
    /// Root with a scheduler configured from the environment.
    pub fn new(host: SharedHost<H>, component: impl Component<H>) -> Self {
        Self::with_scheduler(host, Scheduler::from_env(), component)
    }

    pub fn with_scheduler(host: SharedHost<H>, scheduler: Scheduler, component: impl Component<H>) -> Self {
        Self {
            host,
            scheduler,
            child: Child::new(component),
            scope: None,
        }
    }

    pub fn host(&self) -> &SharedHost<H> {
        &self.host
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn is_mounted(&self) -> bool {
        self.child.is_mounted()
    }

    /// Scope of the top-level component while mounted.
    pub fn scope(&self) -> Option<&Scope<H>> {
        self.child.scope()
    }

    /// Build the element tree inside `container`.
    pub fn mount(&mut self, container: H::Node) -> Result<()> {
        if self.scope.is_some() {
            return Err(Error::AlreadyMounted {
                component: self.child.name(),
            });
        }
        let scope = Scope::root(self.host.clone(), self.scheduler.clone(), container);
        tracing::info!(component = self.child.name(), "mounting root");
        if let Err(err) = self.child.try_mount(&scope) {
            scope.teardown();
            return Err(err);
        }
        self.scope = Some(scope);
        Ok(())
    }

    /// Tear the tree down, leaving the container as it was before mount.
    pub fn unmount(&mut self) -> Result<()> {
        self.child.try_unmount()?;
        if let Some(scope) = self.scope.take() {
            scope.teardown();
        }
        tracing::info!(component = self.child.name(), "unmounted root");
        Ok(())
    }

    /// Deliver every pending notification, including ones queued by the
    /// delivered callbacks.
    pub fn tick(&self) -> FlushStats {
        self.scheduler.flush()
    }

    /// Like [`Root::tick`], reporting an exceeded flush limit as an error.
    pub fn try_tick(&self) -> Result<FlushStats> {
        self.scheduler.try_flush()
    }
}

impl<H: Host> Drop for Root<H> {
    fn drop(&mut self) {
        if self.child.is_mounted() && !std::thread::panicking() {
            tracing::debug!(component = self.child.name(), "root dropped while mounted; unmounting");
            if let Err(err) = self.unmount() {
                tracing::error!(error = %err, "unmount on drop failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Simple;
    use crate::host::{shared, MemoryHost};

    fn label(text: &'static str) -> Simple<MemoryHost> {
        Simple::new(move |h: &mut MemoryHost| h.create_text(text)).named("Label")
    }

    #[test]
    fn test_mount_and_unmount_restore_container() {
        let host = shared(MemoryHost::new());
        let container = host.borrow().root();
        let mut root = Root::with_scheduler(host.clone(), Scheduler::new(), label("hi"));

        root.mount(container).expect("mount");
        assert!(root.is_mounted());
        assert_eq!(host.borrow().child_texts(container), vec!["hi"]);

        root.unmount().expect("unmount");
        assert!(!root.is_mounted());
        assert!(host.borrow().children(container).is_empty());
        assert_eq!(host.borrow().live_count(), 0);
    }

    #[test]
    fn test_double_mount_is_an_error() {
        let host = shared(MemoryHost::new());
        let container = host.borrow().root();
        let mut root = Root::with_scheduler(host, Scheduler::new(), label("hi"));
        root.mount(container).expect("mount");
        assert_eq!(
            root.mount(container),
            Err(Error::AlreadyMounted { component: "Label" })
        );
    }

    #[test]
    fn test_remount_after_unmount_is_an_error() {
        let host = shared(MemoryHost::new());
        let container = host.borrow().root();
        let mut root = Root::with_scheduler(host, Scheduler::new(), label("hi"));
        root.mount(container).expect("mount");
        root.unmount().expect("unmount");
        assert_eq!(root.mount(container), Err(Error::Remount { component: "Label" }));
        assert_eq!(root.unmount(), Err(Error::NotMounted { component: "Label" }));
    }

    #[test]
    fn test_drop_unmounts() {
        let host = shared(MemoryHost::new());
        let container = host.borrow().root();
        {
            let mut root = Root::with_scheduler(host.clone(), Scheduler::new(), label("hi"));
            root.mount(container).expect("mount");
        }
        assert_eq!(host.borrow().live_count(), 0);
    }
}
