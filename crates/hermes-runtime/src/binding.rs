//! Protocol bindings.
//!
//! A binding owns the protocol-specific half of a chain: it creates and
//! enriches messages for its wire protocol and contributes the interceptors
//! that marshal and unmarshal it. The runtime is deliberately ignorant of
//! any concrete protocol; everything protocol-shaped flows through this
//! trait.

use hermes_core::Message;
use hermes_pipeline::{Interceptor, InterceptorProvider, InterceptorRegistry};
use std::sync::Arc;

/// A protocol binding: message factory plus interceptor contributor.
///
/// The binding's interceptors are appended *last* when chains are built,
/// after the runtime, endpoint, and client/server layers.
pub trait Binding: Send + Sync {
    /// Returns the binding name, used in logs.
    fn name(&self) -> &str;

    /// Creates a fresh message shaped for this binding's protocol.
    fn create_message(&self) -> Message {
        Message::new()
    }

    /// Wraps or augments a message produced elsewhere so it satisfies this
    /// binding's protocol expectations.
    ///
    /// The default leaves the message untouched.
    fn enrich_message(&self, message: Message) -> Message {
        message
    }

    /// Interceptors this binding contributes to outbound chains.
    fn out_interceptors(&self) -> &[Arc<dyn Interceptor>];

    /// Interceptors this binding contributes to inbound chains.
    fn in_interceptors(&self) -> &[Arc<dyn Interceptor>];
}

/// A binding with no protocol behavior beyond its registered interceptors.
///
/// Useful as a base for simple protocols and as the binding for tests.
pub struct BaseBinding {
    name: String,
    registry: InterceptorRegistry,
}

impl BaseBinding {
    /// Creates a binding with an empty interceptor registry.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registry: InterceptorRegistry::new(),
        }
    }

    /// Returns the binding's interceptor registry mutably.
    pub fn registry_mut(&mut self) -> &mut InterceptorRegistry {
        &mut self.registry
    }
}

impl Binding for BaseBinding {
    fn name(&self) -> &str {
        &self.name
    }

    fn out_interceptors(&self) -> &[Arc<dyn Interceptor>] {
        self.registry.out_interceptors()
    }

    fn in_interceptors(&self) -> &[Arc<dyn Interceptor>] {
        self.registry.in_interceptors()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_pipeline::{phase, FnInterceptor};

    #[test]
    fn test_base_binding_defaults() {
        let binding = BaseBinding::new("null");
        assert_eq!(binding.name(), "null");
        assert!(binding.out_interceptors().is_empty());

        // Default enrichment is the identity.
        let mut message = binding.create_message();
        message.set_content(7u32);
        let message = binding.enrich_message(message);
        assert_eq!(message.content::<u32>(), Some(&7));
    }

    #[test]
    fn test_base_binding_contributes_registered_interceptors() {
        let mut binding = BaseBinding::new("framed");
        binding
            .registry_mut()
            .add_out(FnInterceptor::new("frame", phase::names::MARSHAL, |_| Ok(())).into_arc());
        binding
            .registry_mut()
            .add_in(FnInterceptor::new("deframe", phase::names::READ, |_| Ok(())).into_arc());

        assert_eq!(binding.out_interceptors().len(), 1);
        assert_eq!(binding.in_interceptors().len(), 1);
    }
}
