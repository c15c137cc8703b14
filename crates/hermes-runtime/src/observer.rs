//! Server-side chain initiation.
//!
//! A [`ServerObserver`] is the [`MessageObserver`] a destination delivers
//! freshly received requests to. It gives each request an exchange, wires
//! the destination reference for back-channel responses, and runs the
//! inbound chain on the delivering thread.

use crate::bus::Bus;
use crate::endpoint::Endpoint;
use hermes_core::{keys, Destination, Exchange, Fault, Message, MessageObserver};
use hermes_pipeline::{ChainBuilder, InterceptorProvider};
use std::sync::Arc;

/// Initiates inbound processing for messages arriving at an endpoint.
pub struct ServerObserver {
    bus: Arc<Bus>,
    endpoint: Arc<Endpoint>,
    destination: Option<Arc<dyn Destination>>,
}

impl ServerObserver {
    /// Creates an observer for the endpoint.
    #[must_use]
    pub fn new(bus: Arc<Bus>, endpoint: Arc<Endpoint>) -> Self {
        Self {
            bus,
            endpoint,
            destination: None,
        }
    }

    /// Attaches the destination the observer serves, so exchanges can
    /// reach its back channel for responses.
    #[must_use]
    pub fn with_destination(mut self, destination: Arc<dyn Destination>) -> Self {
        self.destination = Some(destination);
        self
    }
}

impl MessageObserver for ServerObserver {
    /// Runs the inbound chain for a received request.
    ///
    /// The message gets a fresh exchange unless the transport correlated
    /// it with an existing one. After the chain runs, the message (with
    /// any recorded fault) is committed to the exchange's in slot.
    fn on_message(&self, mut message: Message) {
        let exchange = message.exchange().unwrap_or_else(Exchange::new);
        message.set_exchange(&exchange);
        if let Some(destination) = &self.destination {
            exchange.set_destination(Arc::clone(destination));
        }
        message.properties_mut().set(keys::MESSAGE_OUTBOUND, false);

        tracing::debug!(
            exchange = %exchange.id(),
            message = %message.id(),
            endpoint = %self.endpoint.info().name,
            "request received"
        );

        let chain = ChainBuilder::new(self.bus.in_phases().clone())
            .add_layer(self.bus.registry().in_interceptors())
            .add_layer(self.endpoint.registry().in_interceptors())
            .add_layer(self.endpoint.binding().in_interceptors())
            .build();
        match chain {
            Ok(mut chain) => {
                chain.do_intercept(&mut message);
                exchange.notify_in_message(message);
            }
            Err(err) => {
                exchange.notify_error(
                    Fault::server("failed to assemble inbound chain").with_source(err),
                );
            }
        }
    }
}

impl std::fmt::Debug for ServerObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerObserver")
            .field("endpoint", &self.endpoint)
            .field("has_destination", &self.destination.is_some())
            .finish()
    }
}
