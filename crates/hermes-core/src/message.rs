//! The message data model.
//!
//! A [`Message`] represents one direction of one exchange: either a request
//! travelling toward a transport or a response travelling back from one.
//! Beyond its property bag it carries *content slots*, keyed by the
//! representation's type: the same logical payload may be present
//! simultaneously in several representations (raw bytes, a parsed tree, a
//! typed body) without redundant conversion.

use crate::control::ChainControl;
use crate::error::Fault;
use crate::exchange::Exchange;
use crate::properties::PropertyBag;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// A unique identifier for each message, using UUID v7.
///
/// UUID v7 is time-ordered, which makes message ids naturally sortable in
/// logs and traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Creates a new unique message ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `MessageId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A binary attachment carried alongside the message payload.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// Attachment identifier (e.g. a content id header value).
    pub id: String,
    /// MIME content type of the attachment data.
    pub content_type: String,
    /// The attachment bytes.
    pub data: Bytes,
}

impl Attachment {
    /// Creates a new attachment.
    #[must_use]
    pub fn new(id: impl Into<String>, content_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            id: id.into(),
            content_type: content_type.into(),
            data,
        }
    }
}

/// One direction of one exchange: a mutable, typed property bag plus
/// content slots for payload representations.
///
/// A message belongs to exactly one [`Exchange`] for its lifetime. The
/// back-reference is weak: messages stored in exchange slots must not keep
/// the exchange alive on their own.
///
/// # Content slots
///
/// Content is keyed by representation type, not by value. Setting a new
/// representation never invalidates previously cached ones; callers that
/// rewrite a payload must either overwrite every representation they care
/// about or accept staleness in the others.
///
/// # Example
///
/// ```
/// use hermes_core::Message;
///
/// let mut message = Message::new();
/// message.set_content(vec![1u8, 2, 3]);
/// message.set_content("parsed".to_string());
///
/// assert_eq!(message.content::<Vec<u8>>(), Some(&vec![1, 2, 3]));
/// assert_eq!(message.content::<String>().map(String::as_str), Some("parsed"));
/// ```
pub struct Message {
    id: MessageId,
    properties: PropertyBag,
    content: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    attachments: Vec<Attachment>,
    exchange: Weak<Exchange>,
    fault: Option<Fault>,
    chain: Option<ChainControl>,
}

impl Message {
    /// Creates a detached message with no owning exchange.
    ///
    /// Bindings and transports create messages before the exchange exists;
    /// the owner attaches it with [`Message::set_exchange`] once the
    /// exchange is built.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: MessageId::new(),
            properties: PropertyBag::new(),
            content: HashMap::new(),
            attachments: Vec::new(),
            exchange: Weak::new(),
            fault: None,
            chain: None,
        }
    }

    /// Creates a message already attached to an exchange.
    #[must_use]
    pub fn for_exchange(exchange: &Arc<Exchange>) -> Self {
        let mut message = Self::new();
        message.set_exchange(exchange);
        message
    }

    /// Returns the message ID.
    #[must_use]
    pub const fn id(&self) -> MessageId {
        self.id
    }

    /// Returns the message property bag.
    #[must_use]
    pub const fn properties(&self) -> &PropertyBag {
        &self.properties
    }

    /// Returns the message property bag mutably.
    pub fn properties_mut(&mut self) -> &mut PropertyBag {
        &mut self.properties
    }

    /// Attaches this message to its owning exchange.
    ///
    /// A message belongs to exactly one exchange for its lifetime;
    /// re-attaching an already-attached message is a bug in the caller.
    pub fn set_exchange(&mut self, exchange: &Arc<Exchange>) {
        self.exchange = Arc::downgrade(exchange);
    }

    /// Returns the owning exchange, if the message is attached and the
    /// exchange is still alive.
    #[must_use]
    pub fn exchange(&self) -> Option<Arc<Exchange>> {
        self.exchange.upgrade()
    }

    /// Stores a content representation, keyed by its type.
    ///
    /// Previously stored representations of other types are untouched.
    pub fn set_content<T: Send + Sync + 'static>(&mut self, value: T) {
        self.content.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Returns the content representation of type `T`, if present.
    #[must_use]
    pub fn content<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.content
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Returns the content representation of type `T` mutably.
    pub fn content_mut<T: Send + Sync + 'static>(&mut self) -> Option<&mut T> {
        self.content
            .get_mut(&TypeId::of::<T>())
            .and_then(|v| v.downcast_mut())
    }

    /// Removes and returns the content representation of type `T`.
    pub fn take_content<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.content
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }

    /// Returns `true` if a representation of type `T` is stored.
    #[must_use]
    pub fn has_content<T: Send + Sync + 'static>(&self) -> bool {
        self.content.contains_key(&TypeId::of::<T>())
    }

    /// Returns the attachments carried by this message.
    #[must_use]
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Adds an attachment.
    pub fn add_attachment(&mut self, attachment: Attachment) {
        self.attachments.push(attachment);
    }

    /// Records a fault on this message.
    ///
    /// This is the message's "exception slot": a populated fault means the
    /// processing run that produced this message failed, and the caller
    /// must observe the fault rather than the payload.
    pub fn set_fault(&mut self, fault: Fault) {
        self.fault = Some(fault);
    }

    /// Returns the recorded fault, if any.
    #[must_use]
    pub const fn fault(&self) -> Option<&Fault> {
        self.fault.as_ref()
    }

    /// Removes and returns the recorded fault.
    pub fn take_fault(&mut self) -> Option<Fault> {
        self.fault.take()
    }

    /// Returns `true` if a fault is recorded on this message.
    #[must_use]
    pub const fn has_fault(&self) -> bool {
        self.fault.is_some()
    }

    /// Binds the control handle of the chain currently driving this message.
    ///
    /// Set by the chain when execution starts; interceptors use it to pause
    /// or abort without holding a reference to the chain itself.
    pub fn set_chain_control(&mut self, control: ChainControl) {
        self.chain = Some(control);
    }

    /// Returns the control handle of the chain driving this message.
    #[must_use]
    pub const fn chain_control(&self) -> Option<&ChainControl> {
        self.chain.as_ref()
    }
}

impl Default for Message {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Message")
            .field("id", &self.id)
            .field("properties", &self.properties)
            .field("content_slots", &self.content.len())
            .field("attachments", &self.attachments.len())
            .field("fault", &self.fault)
            .finish_non_exhaustive()
    }
}
