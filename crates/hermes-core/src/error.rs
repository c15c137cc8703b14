//! Error types for the Hermes core.
//!
//! Two families of failure flow through the pipeline:
//!
//! - [`Fault`]: a recoverable, protocol-representable error. Faults travel
//!   the fault-handling path of a chain and may still produce a valid
//!   wire-level error response.
//! - [`TransportError`]: a failure raised by a conduit or destination.
//!   Transports surface these; the sending interceptor converts them into
//!   server faults before they enter the pipeline.
//!
//! Unchecked failures inside interceptors or handlers are *not* modelled
//! here: they are fatal for the chain or invoker instance that observed
//! them and propagate to the caller unchanged.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Classifies which party a fault is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultCode {
    /// The caller sent something the service cannot process.
    Client,
    /// The service or its infrastructure failed while processing.
    Server,
}

impl std::fmt::Display for FaultCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Client => write!(f, "client"),
            Self::Server => write!(f, "server"),
        }
    }
}

/// A recoverable, protocol-representable processing error.
///
/// Interceptors raise faults from `handle_message`; the chain records the
/// fault on the message and unwinds interceptors that already ran. A fault
/// is distinct from an unchecked runtime failure: it stays on the normal
/// error-reporting path and can be rendered as a wire-level error.
///
/// # Example
///
/// ```
/// use hermes_core::{Fault, FaultCode};
///
/// let fault = Fault::client("malformed request envelope")
///     .with_detail(serde_json::json!({ "offset": 12 }));
/// assert_eq!(fault.code(), FaultCode::Client);
/// ```
#[derive(Error, Debug)]
#[error("{code} fault: {message}")]
pub struct Fault {
    code: FaultCode,
    message: String,
    detail: Option<serde_json::Value>,
    /// The underlying error, if the fault wraps a lower-level failure.
    #[source]
    source: Option<anyhow::Error>,
}

impl Fault {
    /// Creates a client fault (the caller is at fault).
    #[must_use]
    pub fn client(message: impl Into<String>) -> Self {
        Self::new(FaultCode::Client, message)
    }

    /// Creates a server fault (the service is at fault).
    #[must_use]
    pub fn server(message: impl Into<String>) -> Self {
        Self::new(FaultCode::Server, message)
    }

    /// Creates a fault with an explicit code.
    #[must_use]
    pub fn new(code: FaultCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            detail: None,
            source: None,
        }
    }

    /// Attaches structured detail to the fault.
    #[must_use]
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = Some(detail);
        self
    }

    /// Attaches the underlying error the fault was converted from.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns the fault code.
    #[must_use]
    pub const fn code(&self) -> FaultCode {
        self.code
    }

    /// Returns the human-readable fault message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the structured detail, if any.
    #[must_use]
    pub const fn detail(&self) -> Option<&serde_json::Value> {
        self.detail.as_ref()
    }

    /// Converts this fault to a serializable envelope for wire-level
    /// error responses.
    #[must_use]
    pub fn to_envelope(&self) -> FaultEnvelope {
        FaultEnvelope {
            code: self.code,
            message: self.message.clone(),
            detail: self.detail.clone(),
        }
    }
}

/// Serializable fault envelope for wire-level error responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaultEnvelope {
    /// Which party the fault is attributed to.
    pub code: FaultCode,
    /// Human-readable fault message.
    pub message: String,
    /// Additional structured detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

/// Errors raised by conduits and destinations.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Sending the outbound message failed.
    #[error("failed to send message: {message}")]
    Send {
        /// Human-readable description of the failure.
        message: String,
        /// The underlying transport error, if any.
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Receiving or acknowledging an inbound message failed.
    #[error("failed to receive message: {message}")]
    Receive {
        /// Human-readable description of the failure.
        message: String,
    },

    /// No conduit initiator is registered for the requested transport.
    #[error("no conduit initiator registered for transport '{transport_id}'")]
    UnknownTransport {
        /// The transport identifier that failed to resolve.
        transport_id: String,
    },
}

impl TransportError {
    /// Creates a send failure with a message only.
    #[must_use]
    pub fn send(message: impl Into<String>) -> Self {
        Self::Send {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a send failure wrapping a lower-level error.
    #[must_use]
    pub fn send_with_source(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Send {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a receive failure.
    #[must_use]
    pub fn receive(message: impl Into<String>) -> Self {
        Self::Receive {
            message: message.into(),
        }
    }
}

impl From<TransportError> for Fault {
    fn from(err: TransportError) -> Self {
        let message = err.to_string();
        Fault::server(message).with_source(err)
    }
}

/// Error returned when waiting on an exchange monitor times out.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitError {
    /// The inbound message did not arrive within the allotted time.
    #[error("timed out after {waited:?} waiting for the inbound message")]
    TimedOut {
        /// How long the caller waited before giving up.
        waited: Duration,
    },
}
