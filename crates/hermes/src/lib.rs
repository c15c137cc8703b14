//! # Hermes
//!
//! **Phase-ordered message pipeline runtime for request/response RPC**
//!
//! Hermes is a transport-agnostic messaging runtime built around three
//! ideas:
//!
//! - **Messages and exchanges**: every call is an exchange correlating
//!   up to four messages, each carrying typed content slots and a
//!   property bag.
//! - **Phase-ordered interceptor chains**: processing stages declare a
//!   phase and optional same-phase constraints; chains are assembled from
//!   independent contributor layers and resolved with a stable
//!   topological sort, failing fast on conflicts.
//! - **Synchronous correlation**: a client thread blocks on the exchange
//!   monitor while the transport's delivery thread runs the inbound chain
//!   and commits the fully processed response.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hermes::prelude::*;
//!
//! let mut bus = Bus::new();
//! bus.conduits_mut().register("tcp", my_transport());
//!
//! let endpoint = Endpoint::new(
//!     EndpointInfo::new("greeter", "tcp://localhost:9000", "tcp"),
//!     Arc::new(BaseBinding::new("json")),
//! );
//!
//! let client = ClientBuilder::new(Arc::new(bus), Arc::new(endpoint)).build();
//! let reply: Option<Greeting> =
//!     client.invoke(&OperationInfo::request_response("greet"), request)?;
//! ```
//!
//! ## Architecture
//!
//! Outbound, a request flows through one resolved chain and out the
//! conduit; inbound, the delivering thread runs the mirror chain before
//! the waiter wakes:
//!
//! ```text
//! invoke → [bus | endpoint | client | binding] chain → SEND → conduit
//!                                                               ↓
//! waiter ← exchange monitor ← inbound chain ← observer ← transport
//! ```

#![doc(html_root_url = "https://docs.rs/hermes/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export the core data model
pub use hermes_core as core;

// Re-export the chain engine
pub use hermes_pipeline as pipeline;

// Re-export the client/server runtime
pub use hermes_runtime as runtime;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use hermes::prelude::*;
/// ```
pub mod prelude {
    pub use hermes_core::{
        Attachment, BindingOperationInfo, ChainControl, Conduit, ConduitInitiator, Destination,
        EndpointInfo, Exchange, ExchangeId, Fault, FaultCode, Message, MessageId, MessageObserver,
        OperationInfo, PropertyBag, TransportError,
    };

    // Re-export chain and handler machinery
    pub use hermes_pipeline::{
        phase, ChainBuilder, ChainSetupError, ChainState, ContinuationState, FnInterceptor,
        Handler, HandlerChainInvoker, HandlerContext, HandlerError, HandlerKind, Interceptor,
        InterceptorProvider, InterceptorRegistry, PhaseInterceptorChain, PhaseOrder,
    };

    // Re-export the runtime layer
    pub use hermes_runtime::{
        BaseBinding, Binding, Bus, Client, ClientBuilder, ClientConfig, ClientError, Endpoint,
        MessageSenderInterceptor, ServerObserver,
    };
}
