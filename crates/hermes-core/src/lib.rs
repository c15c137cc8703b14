//! Core data model for the Hermes messaging runtime.
//!
//! This crate defines the types every other Hermes crate builds on:
//!
//! - [`Message`]: one direction of one exchange, carrying a typed property
//!   bag, content slots holding the payload in multiple representations,
//!   and a fault slot.
//! - [`Exchange`]: the correlation unit for one logical call's up-to-four
//!   messages, doubling as the monitor a synchronous caller waits on.
//! - [`Fault`] / [`TransportError`]: the error taxonomy of the pipeline.
//! - Transport-facing traits ([`Conduit`], [`Destination`],
//!   [`MessageObserver`]) through which transports plug in.
//! - Read-only service-model lookup types ([`OperationInfo`] and friends).
//!
//! No wire format, transport, or data binding lives here; this is the
//! library contract those components are written against.

pub mod control;
pub mod error;
pub mod exchange;
pub mod message;
pub mod properties;
pub mod service;
pub mod transport;

pub use control::ChainControl;
pub use error::{Fault, FaultCode, FaultEnvelope, TransportError, WaitError};
pub use exchange::{Exchange, ExchangeId};
pub use message::{Attachment, Message, MessageId};
pub use properties::{keys, PropertyBag};
pub use service::{BindingOperationInfo, EndpointInfo, MessageInfo, OperationInfo};
pub use transport::{
    Conduit, ConduitInitiator, ConduitInitiatorRegistry, Destination, MessageObserver,
};
