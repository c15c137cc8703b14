//! The exchange correlation unit.
//!
//! An [`Exchange`] correlates the up-to-four messages of one logical call
//! (in, out, in-fault, out-fault), holds the transport handles, and exposes
//! a property bag shared by every stage of the call.
//!
//! The exchange doubles as the synchronization point for synchronous calls:
//! the sending thread blocks on [`Exchange::wait_for_in_message`] until the
//! transport's observer commits the inbound message (fully processed by its
//! chain) or records an error, and then wakes every waiter.

use crate::error::{Fault, WaitError};
use crate::message::Message;
use crate::properties::{keys, PropertyBag};
use crate::service::BindingOperationInfo;
use crate::transport::{Conduit, Destination};
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// A unique identifier for each exchange, using UUID v7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeId(Uuid);

impl ExchangeId {
    /// Creates a new unique exchange ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ExchangeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The mutable slots of an exchange, guarded by one mutex.
///
/// Both the sending thread and the receiving thread touch these; all
/// access goes through the mutex paired with the condition variable.
#[derive(Default)]
struct Slots {
    in_message: Option<Message>,
    out_message: Option<Message>,
    in_fault_message: Option<Message>,
    out_fault_message: Option<Message>,
    error: Option<Fault>,
    properties: PropertyBag,
}

/// The correlation unit for one logical call.
///
/// Exchanges are always shared behind an `Arc`: the client thread, the
/// interceptors, and the transport's delivery thread all hold references
/// to the same instance.
///
/// # Example
///
/// ```
/// use hermes_core::{Exchange, Message};
///
/// let exchange = Exchange::new();
/// exchange.set_one_way(false);
///
/// let response = Message::for_exchange(&exchange);
/// exchange.notify_in_message(response);
/// assert!(exchange.has_in_message());
/// ```
pub struct Exchange {
    id: ExchangeId,
    one_way: AtomicBool,
    synchronous: AtomicBool,
    slots: Mutex<Slots>,
    arrived: Condvar,
    conduit: Mutex<Option<Arc<dyn Conduit>>>,
    destination: Mutex<Option<Arc<dyn Destination>>>,
}

impl Exchange {
    /// Creates a fresh exchange with empty message slots.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            id: ExchangeId::new(),
            one_way: AtomicBool::new(false),
            synchronous: AtomicBool::new(true),
            slots: Mutex::new(Slots::default()),
            arrived: Condvar::new(),
            conduit: Mutex::new(None),
            destination: Mutex::new(None),
        })
    }

    /// Returns the exchange ID.
    #[must_use]
    pub const fn id(&self) -> ExchangeId {
        self.id
    }

    /// Marks the exchange one-way (no response expected).
    pub fn set_one_way(&self, one_way: bool) {
        self.one_way.store(one_way, Ordering::SeqCst);
    }

    /// Returns `true` if no response is expected.
    #[must_use]
    pub fn is_one_way(&self) -> bool {
        self.one_way.load(Ordering::SeqCst)
    }

    /// Hints that the caller processes this exchange synchronously.
    pub fn set_synchronous(&self, synchronous: bool) {
        self.synchronous.store(synchronous, Ordering::SeqCst);
    }

    /// Returns the synchronous-processing hint.
    #[must_use]
    pub fn is_synchronous(&self) -> bool {
        self.synchronous.load(Ordering::SeqCst)
    }

    /// Sets the resolved outbound conduit.
    ///
    /// Conduits are resolved lazily (which conduit applies may depend on
    /// the message being sent), so the slot starts empty.
    pub fn set_conduit(&self, conduit: Arc<dyn Conduit>) {
        *self.conduit.lock() = Some(conduit);
    }

    /// Returns the resolved outbound conduit, if any.
    #[must_use]
    pub fn conduit(&self) -> Option<Arc<dyn Conduit>> {
        self.conduit.lock().clone()
    }

    /// Sets the inbound destination.
    ///
    /// Anonymous/decoupled exchanges have none.
    pub fn set_destination(&self, destination: Arc<dyn Destination>) {
        *self.destination.lock() = Some(destination);
    }

    /// Returns the inbound destination, if any.
    #[must_use]
    pub fn destination(&self) -> Option<Arc<dyn Destination>> {
        self.destination.lock().clone()
    }

    /// Runs `f` with the shared property bag, under the exchange lock.
    ///
    /// The bag is visible from any of the four messages via their exchange
    /// back-reference.
    pub fn with_properties<R>(&self, f: impl FnOnce(&mut PropertyBag) -> R) -> R {
        f(&mut self.slots.lock().properties)
    }

    /// Stores the resolved operation metadata for routing decisions.
    pub fn put_operation(&self, operation: Arc<BindingOperationInfo>) {
        self.with_properties(|props| props.set(keys::OPERATION_INFO, operation));
    }

    /// Returns the operation metadata, if resolved.
    #[must_use]
    pub fn operation(&self) -> Option<Arc<BindingOperationInfo>> {
        self.with_properties(|props| {
            props
                .get::<Arc<BindingOperationInfo>>(keys::OPERATION_INFO)
                .cloned()
        })
    }

    /// Stores the outbound message.
    ///
    /// Called once the outbound chain has completed (or faulted); the
    /// request stays available alongside its eventual response for
    /// logging and retry.
    pub fn put_out_message(&self, message: Message) {
        self.slots.lock().out_message = Some(message);
    }

    /// Runs `f` with the outbound message slot.
    pub fn with_out_message<R>(&self, f: impl FnOnce(Option<&mut Message>) -> R) -> R {
        f(self.slots.lock().out_message.as_mut())
    }

    /// Returns `true` if the outbound message slot is populated.
    #[must_use]
    pub fn has_out_message(&self) -> bool {
        self.slots.lock().out_message.is_some()
    }

    /// Stores the inbound fault message.
    pub fn put_in_fault_message(&self, message: Message) {
        self.slots.lock().in_fault_message = Some(message);
    }

    /// Returns `true` if the inbound fault message slot is populated.
    #[must_use]
    pub fn has_in_fault_message(&self) -> bool {
        self.slots.lock().in_fault_message.is_some()
    }

    /// Stores the outbound fault message.
    pub fn put_out_fault_message(&self, message: Message) {
        self.slots.lock().out_fault_message = Some(message);
    }

    /// Returns `true` if the outbound fault message slot is populated.
    #[must_use]
    pub fn has_out_fault_message(&self) -> bool {
        self.slots.lock().out_fault_message.is_some()
    }

    /// Commits the inbound message and wakes every waiter.
    ///
    /// The caller must have finished running the inbound chain first: a
    /// waiter woken by this call observes a fully-processed message.
    pub fn notify_in_message(&self, message: Message) {
        tracing::debug!(exchange = %self.id, message = %message.id(), "inbound message arrived");
        let mut slots = self.slots.lock();
        slots.in_message = Some(message);
        self.arrived.notify_all();
    }

    /// Records an error on the exchange and wakes every waiter.
    ///
    /// Used when no inbound message will ever arrive (e.g. the inbound
    /// chain could not even be assembled).
    pub fn notify_error(&self, fault: Fault) {
        tracing::debug!(exchange = %self.id, %fault, "error recorded on exchange");
        let mut slots = self.slots.lock();
        slots.error = Some(fault);
        self.arrived.notify_all();
    }

    /// Removes and returns the recorded exchange-level error.
    pub fn take_error(&self) -> Option<Fault> {
        self.slots.lock().error.take()
    }

    /// Runs `f` with the inbound message slot.
    pub fn with_in_message<R>(&self, f: impl FnOnce(Option<&mut Message>) -> R) -> R {
        f(self.slots.lock().in_message.as_mut())
    }

    /// Returns `true` if the inbound message slot is populated.
    #[must_use]
    pub fn has_in_message(&self) -> bool {
        self.slots.lock().in_message.is_some()
    }

    /// Blocks the calling thread until the inbound message arrives or an
    /// error is recorded.
    ///
    /// `timeout: None` waits forever. On success the inbound slot or the
    /// error slot is populated; the caller inspects them to decide between
    /// payload and fault.
    ///
    /// # Errors
    ///
    /// Returns [`WaitError::TimedOut`] if the deadline passes first.
    pub fn wait_for_in_message(&self, timeout: Option<Duration>) -> Result<(), WaitError> {
        let start = Instant::now();
        let mut slots = self.slots.lock();
        loop {
            if slots.in_message.is_some() || slots.error.is_some() {
                return Ok(());
            }
            match timeout {
                None => self.arrived.wait(&mut slots),
                Some(limit) => {
                    let elapsed = start.elapsed();
                    if elapsed >= limit {
                        return Err(WaitError::TimedOut { waited: elapsed });
                    }
                    let result = self.arrived.wait_for(&mut slots, limit - elapsed);
                    if result.timed_out()
                        && slots.in_message.is_none()
                        && slots.error.is_none()
                    {
                        return Err(WaitError::TimedOut {
                            waited: start.elapsed(),
                        });
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for Exchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exchange")
            .field("id", &self.id)
            .field("one_way", &self.is_one_way())
            .field("synchronous", &self.is_synchronous())
            .field("in_message", &self.has_in_message())
            .field("out_message", &self.has_out_message())
            .finish_non_exhaustive()
    }
}
