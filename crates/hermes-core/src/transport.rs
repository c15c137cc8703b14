//! Transport-facing collaborator interfaces.
//!
//! The core never implements a transport. It talks to them through three
//! narrow traits: a [`Conduit`] sends outbound messages, a [`Destination`]
//! produces inbound ones, and a [`MessageObserver`] is the callback either
//! side invokes when a message crosses the boundary into the pipeline.
//!
//! Conduits are created on demand by a [`ConduitInitiator`] looked up by
//! transport id in the [`ConduitInitiatorRegistry`].

use crate::error::TransportError;
use crate::message::Message;
use crate::service::EndpointInfo;
use std::collections::HashMap;
use std::sync::Arc;

/// The callback invoked when a transport delivers a message to the core,
/// and the entry point the core hands to transports for responses.
pub trait MessageObserver: Send + Sync {
    /// Called with a freshly received message.
    ///
    /// Runs on the delivering thread (which may be an I/O thread); the
    /// implementation builds and executes the inbound chain before
    /// releasing any waiter correlated with the message.
    fn on_message(&self, message: Message);
}

/// An outbound transport endpoint.
pub trait Conduit: Send + Sync {
    /// Sends the outbound message.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the message could not be handed to
    /// the wire; the sending interceptor converts it into a fault.
    fn send(&self, message: &mut Message) -> Result<(), TransportError>;

    /// Registers the observer that receives correlated responses.
    fn set_message_observer(&self, observer: Arc<dyn MessageObserver>);

    /// Returns the back channel for decoupled responses, if the transport
    /// supports one.
    fn back_channel(&self) -> Option<Arc<dyn Conduit>> {
        None
    }
}

/// An inbound transport endpoint.
pub trait Destination: Send + Sync {
    /// Registers the observer that receives messages arriving at this
    /// destination.
    fn set_message_observer(&self, observer: Arc<dyn MessageObserver>);

    /// Returns a conduit for sending a response correlated with the given
    /// inbound message, if the transport supports one.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the back channel could not be
    /// established.
    fn back_channel(&self, in_message: &Message)
        -> Result<Option<Arc<dyn Conduit>>, TransportError>;
}

/// Creates conduits for one transport technology.
pub trait ConduitInitiator: Send + Sync {
    /// Creates a conduit that can reach the given endpoint.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the endpoint address cannot be
    /// served by this transport.
    fn new_conduit(&self, endpoint: &EndpointInfo) -> Result<Arc<dyn Conduit>, TransportError>;
}

/// Registry of conduit initiators, keyed by transport id.
///
/// The runtime resolves a client's conduit lazily through this registry
/// using the endpoint's `transport_id`.
#[derive(Default)]
pub struct ConduitInitiatorRegistry {
    initiators: HashMap<String, Arc<dyn ConduitInitiator>>,
}

impl ConduitInitiatorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an initiator for a transport id, replacing any previous
    /// registration.
    pub fn register(
        &mut self,
        transport_id: impl Into<String>,
        initiator: Arc<dyn ConduitInitiator>,
    ) {
        let transport_id = transport_id.into();
        tracing::debug!(transport = %transport_id, "registering conduit initiator");
        self.initiators.insert(transport_id, initiator);
    }

    /// Creates a conduit for the endpoint's transport.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::UnknownTransport`] if no initiator is
    /// registered for the endpoint's transport id.
    pub fn new_conduit(
        &self,
        endpoint: &EndpointInfo,
    ) -> Result<Arc<dyn Conduit>, TransportError> {
        let initiator = self.initiators.get(&endpoint.transport_id).ok_or_else(|| {
            TransportError::UnknownTransport {
                transport_id: endpoint.transport_id.clone(),
            }
        })?;
        initiator.new_conduit(endpoint)
    }

    /// Returns `true` if an initiator is registered for the transport id.
    #[must_use]
    pub fn contains(&self, transport_id: &str) -> bool {
        self.initiators.contains_key(transport_id)
    }
}

impl std::fmt::Debug for ConduitInitiatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.initiators.keys()).finish()
    }
}
