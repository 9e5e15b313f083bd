//! Default values: a literal, or a factory resolved at most once.
//!
//! The fallback a reader receives when a key is absent or undecodable is
//! either a literal value or a factory. The factory variant runs exactly
//! once, on first resolution, never per read.

use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

/// A caller-supplied default for one key.
pub struct DefaultValue<T> {
    inner: DefaultInner<T>,
}

enum DefaultInner<T> {
    Literal(Arc<T>),
    Factory {
        factory: Arc<dyn Fn() -> T + Send + Sync>,
        resolved: Arc<OnceCell<Arc<T>>>,
    },
}

impl<T> DefaultValue<T> {
    /// A literal default value.
    pub fn literal(value: T) -> Self {
        Self {
            inner: DefaultInner::Literal(Arc::new(value)),
        }
    }

    /// A default computed by a factory, run at most once.
    pub fn factory(factory: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self {
            inner: DefaultInner::Factory {
                factory: Arc::new(factory),
                resolved: Arc::new(OnceCell::new()),
            },
        }
    }

    /// Resolve the default. Factories are memoized: repeated resolution
    /// returns the same `Arc`.
    pub fn resolve(&self) -> Arc<T> {
        match &self.inner {
            DefaultInner::Literal(value) => Arc::clone(value),
            DefaultInner::Factory { factory, resolved } => {
                Arc::clone(resolved.get_or_init(|| Arc::new(factory())))
            }
        }
    }
}

impl<T> Clone for DefaultValue<T> {
    fn clone(&self) -> Self {
        let inner = match &self.inner {
            DefaultInner::Literal(value) => DefaultInner::Literal(Arc::clone(value)),
            DefaultInner::Factory { factory, resolved } => DefaultInner::Factory {
                factory: Arc::clone(factory),
                resolved: Arc::clone(resolved),
            },
        };
        Self { inner }
    }
}

impl<T> From<T> for DefaultValue<T> {
    fn from(value: T) -> Self {
        Self::literal(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for DefaultValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            DefaultInner::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            DefaultInner::Factory { resolved, .. } => f
                .debug_struct("Factory")
                .field("resolved", &resolved.get())
                .finish(),
        }
    }
}
