//! The synchronous client.
//!
//! A [`Client`] turns one operation invocation into a full message
//! exchange: it assembles the outbound chain from the four contributor
//! layers (bus, endpoint, client, binding), drives the request out through
//! a lazily resolved conduit, and blocks the calling thread on the
//! exchange monitor until the transport's delivery thread commits a fully
//! processed response.
//!
//! The client is itself the [`MessageObserver`] its conduit delivers
//! responses to: `on_message` runs on the delivering thread, executes the
//! inbound chain there, and only then wakes the waiter.

use crate::bus::Bus;
use crate::config::ClientConfig;
use crate::endpoint::Endpoint;
use crate::sender::MessageSenderInterceptor;
use hermes_core::{
    keys, BindingOperationInfo, Conduit, Exchange, Fault, Message, MessageObserver, OperationInfo,
    TransportError, WaitError,
};
use hermes_pipeline::{
    ChainBuilder, ChainSetupError, Interceptor, InterceptorProvider, InterceptorRegistry,
};
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by a client invocation.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The outbound chain recorded a fault; the request never left.
    #[error("request failed before send: {0}")]
    Send(Fault),

    /// The response carried a fault, or the inbound side failed.
    #[error("response failed: {0}")]
    Receive(Fault),

    /// A chain could not be assembled from the registered interceptors.
    #[error(transparent)]
    ChainSetup(#[from] ChainSetupError),

    /// The conduit could not be created.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// No response arrived within the configured timeout.
    #[error("no response within {waited:?}")]
    ResponseTimeout {
        /// How long the caller waited.
        waited: std::time::Duration,
    },

    /// The response message arrived but carried no content of the
    /// requested type.
    #[error("response carried no content of the requested type")]
    MissingResponseContent,
}

/// Builds a [`Client`], collecting its per-client interceptors.
#[must_use]
pub struct ClientBuilder {
    bus: Arc<Bus>,
    endpoint: Arc<Endpoint>,
    config: ClientConfig,
    registry: InterceptorRegistry,
}

impl ClientBuilder {
    /// Starts a builder for a client of the given endpoint.
    pub fn new(bus: Arc<Bus>, endpoint: Arc<Endpoint>) -> Self {
        Self {
            bus,
            endpoint,
            config: ClientConfig::default(),
            registry: InterceptorRegistry::new(),
        }
    }

    /// Overrides the client configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Adds a per-client outbound interceptor.
    pub fn out_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.registry.add_out(interceptor);
        self
    }

    /// Adds a per-client inbound interceptor.
    pub fn in_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.registry.add_in(interceptor);
        self
    }

    /// Finishes the client.
    ///
    /// The sending interceptor is registered here, so it is always the
    /// client layer that contributes the terminal SEND stage.
    pub fn build(mut self) -> Arc<Client> {
        self.registry
            .add_out(Arc::new(MessageSenderInterceptor::new()));
        Arc::new(Client {
            bus: self.bus,
            endpoint: self.endpoint,
            config: self.config,
            registry: self.registry,
            conduit: Mutex::new(None),
        })
    }
}

/// A synchronous client for one endpoint.
///
/// Cheap to share: all invocation state lives on the per-call exchange,
/// so one client instance serves any number of concurrent callers.
pub struct Client {
    bus: Arc<Bus>,
    endpoint: Arc<Endpoint>,
    config: ClientConfig,
    registry: InterceptorRegistry,
    conduit: Mutex<Option<Arc<dyn Conduit>>>,
}

impl Client {
    /// Invokes an operation with a typed payload and returns the typed
    /// response content.
    ///
    /// Returns `Ok(None)` for one-way operations. For request/response
    /// operations the response message stays populated on the exchange;
    /// only the typed content of type `R` is taken out of it.
    ///
    /// # Errors
    ///
    /// See [`ClientError`]; notably [`ClientError::MissingResponseContent`]
    /// when the response holds no `R` representation.
    pub fn invoke<P, R>(
        self: &Arc<Self>,
        operation: &OperationInfo,
        payload: P,
    ) -> Result<Option<R>, ClientError>
    where
        P: Send + Sync + 'static,
        R: Send + Sync + 'static,
    {
        let mut request = self.endpoint.binding().create_message();
        request.set_content(payload);

        let exchange = self.invoke_message(operation, request)?;
        if exchange.is_one_way() {
            return Ok(None);
        }
        exchange
            .with_in_message(|message| message.and_then(Message::take_content::<R>))
            .map(Some)
            .ok_or(ClientError::MissingResponseContent)
    }

    /// Invokes an operation with a prepared request message and returns
    /// the completed exchange.
    ///
    /// On success the exchange holds the request in its out slot and, for
    /// request/response operations, the fully processed response in its
    /// in slot.
    ///
    /// # Errors
    ///
    /// [`ClientError::Send`] if the outbound chain recorded a fault (the
    /// request never left); [`ClientError::Receive`] if the response
    /// carried a fault or the inbound side failed;
    /// [`ClientError::ResponseTimeout`] if no response arrived in time.
    pub fn invoke_message(
        self: &Arc<Self>,
        operation: &OperationInfo,
        mut request: Message,
    ) -> Result<Arc<Exchange>, ClientError> {
        let exchange = Exchange::new();
        exchange.set_one_way(operation.is_one_way());
        exchange.set_synchronous(true);
        exchange.put_operation(Arc::new(BindingOperationInfo::new(operation.clone())));

        request.set_exchange(&exchange);
        request.properties_mut().set(keys::MESSAGE_OUTBOUND, true);
        request.properties_mut().set(keys::REQUESTOR_ROLE, true);
        let mut request = self.endpoint.binding().enrich_message(request);

        let conduit = self.conduit()?;
        exchange.set_conduit(conduit);

        tracing::debug!(
            operation = %operation.name,
            exchange = %exchange.id(),
            one_way = exchange.is_one_way(),
            "invoking operation"
        );

        let mut chain = ChainBuilder::new(self.bus.out_phases().clone())
            .add_layer(self.bus.registry().out_interceptors())
            .add_layer(self.endpoint.registry().out_interceptors())
            .add_layer(self.registry.out_interceptors())
            .add_layer(self.endpoint.binding().out_interceptors())
            .build()?;
        chain.do_intercept(&mut request);

        let fault = request.take_fault();
        exchange.put_out_message(request);
        if let Some(fault) = fault {
            return Err(ClientError::Send(fault));
        }

        if exchange.is_one_way() {
            return Ok(exchange);
        }

        match exchange.wait_for_in_message(self.config.response_timeout()) {
            Ok(()) => {}
            Err(WaitError::TimedOut { waited }) => {
                return Err(ClientError::ResponseTimeout { waited });
            }
        }
        if let Some(fault) = exchange.take_error() {
            return Err(ClientError::Receive(fault));
        }
        if let Some(fault) = exchange.with_in_message(|message| message.and_then(Message::take_fault))
        {
            return Err(ClientError::Receive(fault));
        }
        Ok(exchange)
    }

    /// Resolves the conduit on first use and caches it.
    ///
    /// The client registers itself as the conduit's observer so responses
    /// flow back into `on_message`.
    fn conduit(self: &Arc<Self>) -> Result<Arc<dyn Conduit>, ClientError> {
        let mut slot = self.conduit.lock();
        if let Some(conduit) = slot.as_ref() {
            return Ok(Arc::clone(conduit));
        }
        let conduit = self.bus.conduits().new_conduit(self.endpoint.info())?;
        conduit.set_message_observer(Arc::clone(self) as Arc<dyn MessageObserver>);
        *slot = Some(Arc::clone(&conduit));
        Ok(conduit)
    }
}

impl MessageObserver for Client {
    /// Processes a delivered response on the delivering thread.
    ///
    /// Builds the inbound chain from the same four layers (inbound lists),
    /// runs it, then commits the message to the exchange even when the
    /// chain aborted, since the recorded fault must wake the waiter.
    fn on_message(&self, mut message: Message) {
        let Some(exchange) = message.exchange() else {
            tracing::warn!(message = %message.id(), "dropping uncorrelated response");
            return;
        };
        message.properties_mut().set(keys::MESSAGE_OUTBOUND, false);

        let chain = ChainBuilder::new(self.bus.in_phases().clone())
            .add_layer(self.bus.registry().in_interceptors())
            .add_layer(self.endpoint.registry().in_interceptors())
            .add_layer(self.registry.in_interceptors())
            .add_layer(self.endpoint.binding().in_interceptors())
            .build();
        match chain {
            Ok(mut chain) => {
                let state = chain.do_intercept(&mut message);
                tracing::debug!(
                    exchange = %exchange.id(),
                    ?state,
                    "inbound chain finished"
                );
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

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.endpoint)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
