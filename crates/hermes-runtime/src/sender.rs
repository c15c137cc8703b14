//! The sending interceptor.
//!
//! The terminal stage of every outbound chain: hands the message to the
//! exchange's resolved conduit. Transport failures become server faults
//! here, so they travel the chain's normal unwind path like any other
//! fault.

use hermes_core::{Fault, Message};
use hermes_pipeline::{phase, Interceptor};

/// Interceptor id of the sender, for `before`/`after` constraints.
pub const MESSAGE_SENDER_ID: &str = "message-sender";

/// Sends the outbound message through the exchange's conduit.
///
/// Registered by the client in the SEND phase; interceptors that must run
/// before the wire write constrain themselves with
/// `run_before([MESSAGE_SENDER_ID])`.
#[derive(Debug, Default)]
pub struct MessageSenderInterceptor;

impl MessageSenderInterceptor {
    /// Creates the sender interceptor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Interceptor for MessageSenderInterceptor {
    fn id(&self) -> &str {
        MESSAGE_SENDER_ID
    }

    fn phase(&self) -> &str {
        phase::names::SEND
    }

    fn handle_message(&self, message: &mut Message) -> Result<(), Fault> {
        let exchange = message
            .exchange()
            .ok_or_else(|| Fault::server("outbound message has no exchange"))?;
        let conduit = exchange
            .conduit()
            .ok_or_else(|| Fault::server("no conduit resolved for exchange"))?;
        tracing::trace!(exchange = %exchange.id(), message = %message.id(), "sending message");
        conduit.send(message).map_err(Fault::from)
    }
}
