//! Context - Values provided by an ancestor and resolved by descendants.
//!
//! A context kind is a zero-sized marker type implementing [`ContextKind`].
//! A [`Provider`] registers a [`Value`] for its kind in its own scope while
//! mounted; a descendant resolves the nearest registration by walking its
//! parent chain with [`UseContext`].
//!
//! Consumers hold the resolved value strongly. Changes reach them through an
//! observer owned by the consumer's scope, so a consumer updates only the
//! attributes it bound, without re-rendering.
//!
//! # Example
//!
//! ```ignore
//! struct FontContext;
//! impl ContextKind for FontContext {
//!     type Value = Font;
//! }
//!
//! let font = Value::external(Font::default());
//! Provider::<FontContext, MemoryHost>::new(&font).with(Button::new("OK"));
//!
//! // inside Button::mount
//! let mut use_font = UseContext::<FontContext>::new();
//! let initial = use_font.get(scope);
//! use_font.observe(scope, move |change| { /* set_font */ });
//! ```

use std::fmt;
use std::marker::PhantomData;

use super::{Child, Component, Scope};
use crate::error::{fatal, Result};
use crate::host::Host;
use crate::reactive::{Change, ObserverId, Value};

/// Marker type naming one kind of context.
pub trait ContextKind: 'static {
    type Value: Clone + PartialEq + 'static;

    /// Name used in logs and errors.
    fn name() -> &'static str {
        super::short_type_name(std::any::type_name::<Self>())
    }
}

// =============================================================================
// Provider
// =============================================================================

/// Provides a value of kind `C` to everything mounted beneath it.
pub struct Provider<C: ContextKind, H: Host> {
    value: Value<C::Value>,
    child: Option<Child<H>>,
    _kind: PhantomData<C>,
}

impl<C: ContextKind, H: Host> fmt::Debug for Provider<C, H>
where
    C::Value: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("kind", &C::name())
            .field("value", &self.value)
            .field("child", &self.child)
            .finish()
    }
}

impl<C: ContextKind, H: Host> Provider<C, H> {
    pub fn new(value: &Value<C::Value>) -> Self {
        Self {
            value: value.clone(),
            child: None,
            _kind: PhantomData,
        }
    }

    /// Component that sees the provided value.
    pub fn with(mut self, child: impl Component<H>) -> Self {
        self.child = Some(Child::new(child));
        self
    }
}

impl<C: ContextKind, H: Host> Component<H> for Provider<C, H> {
    fn mount(&mut self, scope: &Scope<H>) {
        scope.provide::<C>(self.value.clone());
        if let Some(child) = self.child.as_mut() {
            child.mount(scope);
        }
    }

    fn unmount(&mut self, scope: &Scope<H>) {
        if let Some(child) = self.child.as_mut() {
            child.unmount();
        }
        scope.withdraw::<C>();
    }

    fn name(&self) -> &'static str {
        "Provider"
    }
}

// =============================================================================
// UseContext
// =============================================================================

/// Resolves and caches the nearest provider of `C`.
pub struct UseContext<C: ContextKind> {
    resolved: Option<Value<C::Value>>,
    _kind: PhantomData<C>,
}

impl<C: ContextKind> Default for UseContext<C> {
    fn default() -> Self {
        Self {
            resolved: None,
            _kind: PhantomData,
        }
    }
}

impl<C: ContextKind> fmt::Debug for UseContext<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UseContext")
            .field("kind", &C::name())
            .field("resolved", &self.resolved.is_some())
            .finish()
    }
}

impl<C: ContextKind> UseContext<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provided value, resolving it from `scope`'s ancestors on first use.
    pub fn try_resolve<H: Host>(&mut self, scope: &Scope<H>) -> Result<Value<C::Value>> {
        if let Some(value) = &self.resolved {
            return Ok(value.clone());
        }
        let value = scope.find_context::<C>()?;
        tracing::trace!(context = C::name(), scope = %scope.id(), value = %value.id(), "resolved context");
        self.resolved = Some(value.clone());
        Ok(value)
    }

    /// Like [`UseContext::try_resolve`]. Panics when no ancestor provides `C`.
    #[track_caller]
    pub fn resolve<H: Host>(&mut self, scope: &Scope<H>) -> Value<C::Value> {
        self.try_resolve(scope).unwrap_or_else(|err| fatal(err))
    }

    /// Current provided value.
    #[track_caller]
    pub fn get<H: Host>(&mut self, scope: &Scope<H>) -> C::Value {
        self.resolve(scope).get()
    }

    /// Observe the provided value with an observer owned by `scope`.
    #[track_caller]
    pub fn observe<H: Host>(
        &mut self,
        scope: &Scope<H>,
        callback: impl Fn(&Change<C::Value>) + 'static,
    ) -> ObserverId {
        let value = self.resolve(scope);
        scope.observe(&value, callback)
    }

    /// Whether a value has been resolved.
    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }
}
