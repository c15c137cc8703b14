//! Interceptor providers.
//!
//! Every layer that contributes interceptors to a chain (runtime, endpoint,
//! client or server, binding) exposes them through the same trait, so chain
//! assembly can treat all layers uniformly.

use crate::interceptor::Interceptor;
use std::sync::Arc;

/// A source of interceptors for outbound and inbound chains.
pub trait InterceptorProvider: Send + Sync {
    /// Interceptors contributed to outbound chains.
    fn out_interceptors(&self) -> &[Arc<dyn Interceptor>];

    /// Interceptors contributed to inbound chains.
    fn in_interceptors(&self) -> &[Arc<dyn Interceptor>];
}

/// A plain provider backed by two registration lists.
///
/// # Example
///
/// ```
/// use hermes_pipeline::{phase, FnInterceptor, InterceptorProvider, InterceptorRegistry};
///
/// let mut registry = InterceptorRegistry::new();
/// registry.add_out(FnInterceptor::new("tag", phase::names::SETUP, |_| Ok(())).into_arc());
/// assert_eq!(registry.out_interceptors().len(), 1);
/// assert!(registry.in_interceptors().is_empty());
/// ```
#[derive(Default)]
pub struct InterceptorRegistry {
    out: Vec<Arc<dyn Interceptor>>,
    inbound: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an interceptor for outbound chains.
    pub fn add_out(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.out.push(interceptor);
    }

    /// Registers an interceptor for inbound chains.
    pub fn add_in(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.inbound.push(interceptor);
    }
}

impl InterceptorProvider for InterceptorRegistry {
    fn out_interceptors(&self) -> &[Arc<dyn Interceptor>] {
        &self.out
    }

    fn in_interceptors(&self) -> &[Arc<dyn Interceptor>] {
        &self.inbound
    }
}

impl std::fmt::Debug for InterceptorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorRegistry")
            .field("out", &self.out.iter().map(|i| i.id()).collect::<Vec<_>>())
            .field(
                "in",
                &self.inbound.iter().map(|i| i.id()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
