//! Phases: the ordering buckets of an interceptor chain.
//!
//! Interceptors never order themselves globally. Each declares the named
//! phase it runs in; the total order of phases is supplied externally as a
//! [`PhaseOrder`]. The defaults below cover the standard outbound and
//! inbound processing sequences, but bindings may supply their own order
//! for specialized chains.

use std::collections::HashMap;

/// Standard phase names.
///
/// Outbound processing runs roughly `SETUP → … → WRITE → SEND`; inbound
/// runs `RECEIVE → … → INVOKE → POST_INVOKE`. Not every chain uses every
/// phase.
pub mod names {
    /// Outbound: chain and exchange setup.
    pub const SETUP: &str = "setup";
    /// Outbound: before logical (application-level) processing.
    pub const PRE_LOGICAL: &str = "pre-logical";
    /// Logical (application-level) processing.
    pub const LOGICAL: &str = "logical";
    /// After logical processing.
    pub const POST_LOGICAL: &str = "post-logical";
    /// Outbound: before payload marshalling.
    pub const PRE_MARSHAL: &str = "pre-marshal";
    /// Outbound: payload marshalling.
    pub const MARSHAL: &str = "marshal";
    /// Outbound: after payload marshalling.
    pub const POST_MARSHAL: &str = "post-marshal";
    /// Before protocol-specific processing.
    pub const PRE_PROTOCOL: &str = "pre-protocol";
    /// Protocol-specific processing.
    pub const PROTOCOL: &str = "protocol";
    /// After protocol-specific processing.
    pub const POST_PROTOCOL: &str = "post-protocol";
    /// Before stream-level processing.
    pub const PRE_STREAM: &str = "pre-stream";
    /// Stream-level processing.
    pub const STREAM: &str = "stream";
    /// After stream-level processing.
    pub const POST_STREAM: &str = "post-stream";
    /// Outbound: serializing onto the wire representation.
    pub const WRITE: &str = "write";
    /// Outbound: handing the message to the conduit.
    pub const SEND: &str = "send";

    /// Inbound: the transport delivered bytes.
    pub const RECEIVE: &str = "receive";
    /// Inbound: parsing the wire representation.
    pub const READ: &str = "read";
    /// Inbound: payload unmarshalling.
    pub const UNMARSHAL: &str = "unmarshal";
    /// Inbound: before service invocation.
    pub const PRE_INVOKE: &str = "pre-invoke";
    /// Inbound: service invocation.
    pub const INVOKE: &str = "invoke";
    /// Inbound: after service invocation.
    pub const POST_INVOKE: &str = "post-invoke";
}

/// An externally supplied total order of phase names.
///
/// A chain is parameterized by one `PhaseOrder`; interceptors whose phase
/// is not in the order cannot be added to that chain.
///
/// # Example
///
/// ```
/// use hermes_pipeline::phase::PhaseOrder;
///
/// let order = PhaseOrder::new(["receive", "read", "invoke"]);
/// assert_eq!(order.position("read"), Some(1));
/// assert!(order.position("send").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct PhaseOrder {
    phases: Vec<String>,
    index: HashMap<String, usize>,
}

impl PhaseOrder {
    /// Creates a phase order from a sequence of names.
    ///
    /// Duplicate names keep their first position.
    #[must_use]
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut phases = Vec::new();
        let mut index = HashMap::new();
        for name in names {
            let name = name.into();
            if !index.contains_key(&name) {
                index.insert(name.clone(), phases.len());
                phases.push(name);
            }
        }
        Self { phases, index }
    }

    /// The standard outbound phase order.
    #[must_use]
    pub fn default_out() -> Self {
        Self::new([
            names::SETUP,
            names::PRE_LOGICAL,
            names::LOGICAL,
            names::POST_LOGICAL,
            names::PRE_MARSHAL,
            names::MARSHAL,
            names::POST_MARSHAL,
            names::PRE_PROTOCOL,
            names::PROTOCOL,
            names::POST_PROTOCOL,
            names::PRE_STREAM,
            names::STREAM,
            names::POST_STREAM,
            names::WRITE,
            names::SEND,
        ])
    }

    /// The standard inbound phase order.
    #[must_use]
    pub fn default_in() -> Self {
        Self::new([
            names::RECEIVE,
            names::PRE_STREAM,
            names::STREAM,
            names::POST_STREAM,
            names::READ,
            names::PRE_PROTOCOL,
            names::PROTOCOL,
            names::POST_PROTOCOL,
            names::UNMARSHAL,
            names::PRE_LOGICAL,
            names::LOGICAL,
            names::POST_LOGICAL,
            names::PRE_INVOKE,
            names::INVOKE,
            names::POST_INVOKE,
        ])
    }

    /// Returns the position of a phase in the order.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Returns `true` if the order contains the phase.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterates over the phase names in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.phases.iter().map(String::as_str)
    }

    /// Returns the number of phases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    /// Returns `true` if the order holds no phases.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }
}
