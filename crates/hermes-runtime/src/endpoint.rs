//! Endpoints.
//!
//! An endpoint ties a reachable address ([`EndpointInfo`]) to the binding
//! speaking its protocol, and carries its own interceptor registrations:
//! the layer between the runtime-wide bus contributions and the
//! per-client/server ones.

use crate::binding::Binding;
use hermes_core::EndpointInfo;
use hermes_pipeline::InterceptorRegistry;
use std::sync::Arc;

/// One reachable service endpoint: address, binding, and its interceptor
/// contributions.
pub struct Endpoint {
    info: EndpointInfo,
    binding: Arc<dyn Binding>,
    registry: InterceptorRegistry,
}

impl Endpoint {
    /// Creates an endpoint for the given address and binding.
    #[must_use]
    pub fn new(info: EndpointInfo, binding: Arc<dyn Binding>) -> Self {
        Self {
            info,
            binding,
            registry: InterceptorRegistry::new(),
        }
    }

    /// Returns the endpoint description.
    #[must_use]
    pub const fn info(&self) -> &EndpointInfo {
        &self.info
    }

    /// Returns the binding serving this endpoint.
    #[must_use]
    pub fn binding(&self) -> &Arc<dyn Binding> {
        &self.binding
    }

    /// Returns the endpoint's interceptor registry.
    #[must_use]
    pub const fn registry(&self) -> &InterceptorRegistry {
        &self.registry
    }

    /// Returns the endpoint's interceptor registry mutably.
    pub fn registry_mut(&mut self) -> &mut InterceptorRegistry {
        &mut self.registry
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("info", &self.info)
            .field("binding", &self.binding.name())
            .finish_non_exhaustive()
    }
}
