//! User-level handler chains.
//!
//! Handlers are coarse-grained, application-facing processing units layered
//! on top of the interceptor chain. Unlike interceptors they come in three
//! fixed kinds (logical, protocol, stream), traverse in declaration order
//! outbound and reverse order inbound, and participate in an explicit
//! lifecycle: every handler that ran during a message exchange gets exactly
//! one `close` when the exchange completes.
//!
//! The [`HandlerChainInvoker`] mediates one message exchange's traversals.
//! It is created per exchange and driven by the owning binding, which
//! decides when each handler kind runs and when to re-drive after a
//! reversal.

use anyhow::Error as AnyError;
use hermes_core::{keys, Fault, PropertyBag};
use std::sync::Arc;
use thiserror::Error;

/// The processing level a handler operates at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// Payload-level processing, independent of protocol.
    Logical,
    /// Protocol-specific processing (headers, envelopes).
    Protocol,
    /// Raw stream processing closest to the transport.
    Stream,
}

/// Errors a handler may raise, and the invoker's own failure mode.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// A protocol-level failure that becomes a fault message.
    ///
    /// Raising this reverses the traversal direction; handlers that
    /// already ran see the fault via `handle_fault`.
    #[error("protocol fault: {0}")]
    Protocol(Fault),

    /// An unrecoverable failure; the exchange terminates immediately
    /// with no fault traversal.
    #[error("handler failure: {0}")]
    Fatal(#[from] AnyError),

    /// The invoker was used after its exchange completed.
    #[error("handler chain already closed")]
    Closed,
}

/// Outcome of one traversal over a handler kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinuationState {
    /// Every handler ran; proceed with normal processing.
    Continue,
    /// A handler vetoed or faulted; the traversal direction has been
    /// reversed and normal processing must not continue.
    Reversed,
}

/// Mutable state shared by all handlers during one traversal.
///
/// Carries the direction flag, a property bag scoped to the exchange, and
/// the fault slot populated when a protocol handler fails.
#[derive(Debug)]
pub struct HandlerContext {
    properties: PropertyBag,
    outbound: bool,
    fault: Option<Fault>,
}

impl HandlerContext {
    /// Creates a context for a traversal in the given direction.
    #[must_use]
    pub fn new(outbound: bool) -> Self {
        let mut properties = PropertyBag::new();
        properties.set(keys::MESSAGE_OUTBOUND, outbound);
        Self {
            properties,
            outbound,
            fault: None,
        }
    }

    /// Returns `true` if the current traversal is outbound.
    #[must_use]
    pub const fn is_outbound(&self) -> bool {
        self.outbound
    }

    pub(crate) fn set_outbound(&mut self, outbound: bool) {
        self.outbound = outbound;
        self.properties.set(keys::MESSAGE_OUTBOUND, outbound);
    }

    /// Returns the context property bag.
    #[must_use]
    pub const fn properties(&self) -> &PropertyBag {
        &self.properties
    }

    /// Returns the context property bag mutably.
    pub fn properties_mut(&mut self) -> &mut PropertyBag {
        &mut self.properties
    }

    /// Records a fault raised during this traversal.
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

    /// Returns `true` if a fault has been recorded.
    #[must_use]
    pub const fn fault_raised(&self) -> bool {
        self.fault.is_some()
    }
}

/// One user-level processing unit.
///
/// Handler instances are shared across exchanges and must be internally
/// thread-safe.
pub trait Handler: Send + Sync {
    /// Returns the handler's name, used in logs.
    fn name(&self) -> &str;

    /// Returns the kind of this handler.
    fn kind(&self) -> HandlerKind;

    /// Processes the message on the normal path.
    ///
    /// Returning `Ok(false)` vetoes further processing without error: the
    /// traversal reverses direction and normal processing stops.
    ///
    /// # Errors
    ///
    /// [`HandlerError::Protocol`] converts the failure into a fault and
    /// reverses the traversal; [`HandlerError::Fatal`] terminates the
    /// exchange outright.
    fn handle_message(&self, context: &mut HandlerContext) -> Result<bool, HandlerError>;

    /// Processes the message on the fault path.
    ///
    /// Invoked instead of `handle_message` when the context carries a
    /// fault. Returning `Ok(false)` stops fault traversal and reverses
    /// direction again; remaining handlers are not consulted.
    ///
    /// # Errors
    ///
    /// [`HandlerError::Fatal`] terminates fault processing.
    fn handle_fault(&self, context: &mut HandlerContext) -> Result<bool, HandlerError> {
        let _ = context;
        Ok(true)
    }

    /// Releases per-exchange resources.
    ///
    /// Called exactly once, at the end of the message exchange, on every
    /// handler whose `handle_message` or `handle_fault` ran.
    fn close(&self, context: &mut HandlerContext) {
        let _ = context;
    }
}

/// Drives one message exchange's handler traversals.
///
/// The invoker partitions its handlers by kind at construction and keeps
/// the declaration order within each kind. Outbound traversals run in
/// declaration order; inbound traversals run reversed, so the handler
/// closest to the application is always the first to see an outgoing
/// message and the last to see an incoming one.
pub struct HandlerChainInvoker {
    logical: Vec<Arc<dyn Handler>>,
    protocol: Vec<Arc<dyn Handler>>,
    stream: Vec<Arc<dyn Handler>>,
    invoked: Vec<Arc<dyn Handler>>,
    close_list: Vec<Arc<dyn Handler>>,
    outbound: bool,
    response_expected: bool,
    fault_expected: bool,
    processing_aborted: bool,
    closed: bool,
}

impl HandlerChainInvoker {
    /// Creates an invoker over the given handlers for one exchange.
    ///
    /// Declaration order within each kind is preserved.
    #[must_use]
    pub fn new(handlers: Vec<Arc<dyn Handler>>, outbound: bool) -> Self {
        let mut logical = Vec::new();
        let mut protocol = Vec::new();
        let mut stream = Vec::new();
        for handler in handlers {
            match handler.kind() {
                HandlerKind::Logical => logical.push(handler),
                HandlerKind::Protocol => protocol.push(handler),
                HandlerKind::Stream => stream.push(handler),
            }
        }
        Self {
            logical,
            protocol,
            stream,
            invoked: Vec::new(),
            close_list: Vec::new(),
            outbound,
            response_expected: true,
            fault_expected: false,
            processing_aborted: false,
            closed: false,
        }
    }

    /// Returns `true` if the current traversal direction is outbound.
    #[must_use]
    pub const fn is_outbound(&self) -> bool {
        self.outbound
    }

    /// Returns `true` if the exchange expects a response message.
    #[must_use]
    pub const fn is_response_expected(&self) -> bool {
        self.response_expected
    }

    /// Records whether the exchange expects a response.
    ///
    /// One-way exchanges set this to `false`; the owning binding consults
    /// it when deciding whether to re-drive after a reversal.
    pub fn set_response_expected(&mut self, expected: bool) {
        self.response_expected = expected;
    }

    /// Returns `true` if the next traversal is forced onto the fault path.
    #[must_use]
    pub const fn fault_expected(&self) -> bool {
        self.fault_expected
    }

    /// Forces the fault path for subsequent traversals.
    ///
    /// Bindings set this when the wire already carries a fault the context
    /// cannot represent yet; path selection consults this flag in addition
    /// to the context's recorded fault.
    pub fn set_fault_expected(&mut self, expected: bool) {
        self.fault_expected = expected;
    }

    /// Returns `true` if a handler vetoed or faulted and normal
    /// processing must not continue.
    ///
    /// While latched, traversals only touch handlers that were already
    /// invoked: the reversed return path revisits what ran, never
    /// reaches handlers that were skipped.
    #[must_use]
    pub const fn processing_aborted(&self) -> bool {
        self.processing_aborted
    }

    /// Returns `true` if the exchange completed and the invoker is spent.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Traverses the logical handlers.
    ///
    /// # Errors
    ///
    /// Propagates [`HandlerError::Fatal`] from a handler, or
    /// [`HandlerError::Closed`] if the exchange already completed.
    pub fn invoke_logical(
        &mut self,
        context: &mut HandlerContext,
    ) -> Result<ContinuationState, HandlerError> {
        self.invoke_kind(HandlerKind::Logical, context)
    }

    /// Traverses the protocol handlers.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`HandlerChainInvoker::invoke_logical`].
    pub fn invoke_protocol(
        &mut self,
        context: &mut HandlerContext,
    ) -> Result<ContinuationState, HandlerError> {
        self.invoke_kind(HandlerKind::Protocol, context)
    }

    /// Traverses the stream handlers.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`HandlerChainInvoker::invoke_logical`].
    pub fn invoke_stream(
        &mut self,
        context: &mut HandlerContext,
    ) -> Result<ContinuationState, HandlerError> {
        self.invoke_kind(HandlerKind::Stream, context)
    }

    fn invoke_kind(
        &mut self,
        kind: HandlerKind,
        context: &mut HandlerContext,
    ) -> Result<ContinuationState, HandlerError> {
        let mut ordered: Vec<Arc<dyn Handler>> = match kind {
            HandlerKind::Logical => self.logical.clone(),
            HandlerKind::Protocol => self.protocol.clone(),
            HandlerKind::Stream => self.stream.clone(),
        };
        if ordered.is_empty() {
            return Ok(ContinuationState::Continue);
        }
        if self.closed {
            return Err(HandlerError::Closed);
        }
        // Every traversal re-stamps the direction on the context; the
        // invoker's direction is authoritative after a reversal.
        context.set_outbound(self.outbound);
        if !self.outbound {
            ordered.reverse();
        }

        for handler in ordered {
            // Once aborted, the reversed traversal revisits handlers that
            // already ran and never reaches the rest.
            if self.processing_aborted && !self.was_invoked(&handler) {
                continue;
            }
            // Eligible for close as soon as it is handed the context; the
            // invoked list grows only after a clean pass, so the handler
            // that stops a traversal is closed but never revisited.
            self.mark_closable(&handler);

            if self.fault_expected || context.fault_raised() {
                tracing::trace!(handler = handler.name(), "invoking handler (fault path)");
                match handler.handle_fault(context) {
                    Ok(true) => {}
                    Ok(false) => {
                        tracing::debug!(handler = handler.name(), "handler stopped fault traversal");
                        self.reverse_direction(context);
                        self.processing_aborted = true;
                        return Ok(ContinuationState::Reversed);
                    }
                    Err(err) => {
                        self.closed = true;
                        return Err(err);
                    }
                }
                self.record_invocation(&handler);
                continue;
            }

            tracing::trace!(handler = handler.name(), "invoking handler");
            match handler.handle_message(context) {
                Ok(true) => {}
                Ok(false) => {
                    tracing::debug!(handler = handler.name(), "handler vetoed; reversing");
                    self.reverse_direction(context);
                    self.processing_aborted = true;
                    return Ok(ContinuationState::Reversed);
                }
                Err(HandlerError::Protocol(fault)) => {
                    tracing::debug!(handler = handler.name(), %fault, "protocol fault; reversing");
                    context.set_fault(fault);
                    self.reverse_direction(context);
                    self.processing_aborted = true;
                    return Ok(ContinuationState::Reversed);
                }
                Err(err) => {
                    self.closed = true;
                    return Err(err);
                }
            }
            self.record_invocation(&handler);
        }
        Ok(ContinuationState::Continue)
    }

    /// Completes the message exchange: closes every handler that ran.
    ///
    /// Close order is the reverse of declaration order within each kind,
    /// protocol handlers first, then logical, then stream. The layers
    /// closest to the wire shut down before the layers closest to the
    /// application's payload, with stream handlers last since they may own
    /// the underlying I/O. Calling this more than once is a no-op.
    pub fn mep_complete(&mut self, context: &mut HandlerContext) {
        let closable: Vec<Arc<dyn Handler>> = Self::started(&self.protocol, &self.close_list)
            .chain(Self::started(&self.logical, &self.close_list))
            .chain(Self::started(&self.stream, &self.close_list))
            .cloned()
            .collect();
        for handler in closable {
            tracing::trace!(handler = handler.name(), "closing handler");
            handler.close(context);
        }
        self.invoked.clear();
        self.close_list.clear();
        self.closed = true;
    }

    fn started<'a>(
        declared: &'a [Arc<dyn Handler>],
        close_list: &'a [Arc<dyn Handler>],
    ) -> impl Iterator<Item = &'a Arc<dyn Handler>> {
        declared
            .iter()
            .rev()
            .filter(|h| close_list.iter().any(|c| Arc::ptr_eq(c, h)))
    }

    fn was_invoked(&self, handler: &Arc<dyn Handler>) -> bool {
        self.invoked.iter().any(|h| Arc::ptr_eq(h, handler))
    }

    fn record_invocation(&mut self, handler: &Arc<dyn Handler>) {
        if !self.was_invoked(handler) {
            self.invoked.push(Arc::clone(handler));
        }
    }

    fn mark_closable(&mut self, handler: &Arc<dyn Handler>) {
        if !self.close_list.iter().any(|h| Arc::ptr_eq(h, handler)) {
            self.close_list.push(Arc::clone(handler));
        }
    }

    fn reverse_direction(&mut self, context: &mut HandlerContext) {
        self.outbound = !self.outbound;
        context.set_outbound(self.outbound);
        context
            .properties_mut()
            .set(keys::DIRECTION_REVERSED, true);
    }
}

impl std::fmt::Debug for HandlerChainInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = |hs: &[Arc<dyn Handler>]| -> Vec<String> {
            hs.iter().map(|h| h.name().to_string()).collect()
        };
        f.debug_struct("HandlerChainInvoker")
            .field("logical", &names(&self.logical))
            .field("protocol", &names(&self.protocol))
            .field("stream", &names(&self.stream))
            .field("outbound", &self.outbound)
            .field("response_expected", &self.response_expected)
            .field("fault_expected", &self.fault_expected)
            .field("processing_aborted", &self.processing_aborted)
            .field("closed", &self.closed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    enum Behavior {
        Pass,
        Veto,
        ProtocolFault,
        Fatal,
        StopFaultPath,
        RecordDirection,
    }

    struct Scripted {
        name: String,
        kind: HandlerKind,
        behavior: Behavior,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Scripted {
        fn new(
            name: &str,
            kind: HandlerKind,
            behavior: Behavior,
            log: &Arc<Mutex<Vec<String>>>,
        ) -> Arc<dyn Handler> {
            Arc::new(Self {
                name: name.to_string(),
                kind,
                behavior,
                log: Arc::clone(log),
            })
        }
    }

    impl Handler for Scripted {
        fn name(&self) -> &str {
            &self.name
        }

        fn kind(&self) -> HandlerKind {
            self.kind
        }

        fn handle_message(&self, context: &mut HandlerContext) -> Result<bool, HandlerError> {
            if let Behavior::RecordDirection = self.behavior {
                self.log
                    .lock()
                    .unwrap()
                    .push(format!("dir:{}", context.is_outbound()));
                return Ok(true);
            }
            self.log.lock().unwrap().push(format!("msg:{}", self.name));
            match self.behavior {
                Behavior::Pass | Behavior::StopFaultPath | Behavior::RecordDirection => Ok(true),
                Behavior::Veto => Ok(false),
                Behavior::ProtocolFault => Err(HandlerError::Protocol(Fault::server(format!(
                    "{} broke",
                    self.name
                )))),
                Behavior::Fatal => Err(HandlerError::Fatal(anyhow::anyhow!("boom"))),
            }
        }

        fn handle_fault(&self, _context: &mut HandlerContext) -> Result<bool, HandlerError> {
            self.log.lock().unwrap().push(format!("fault:{}", self.name));
            match self.behavior {
                Behavior::StopFaultPath => Ok(false),
                _ => Ok(true),
            }
        }

        fn close(&self, _context: &mut HandlerContext) {
            self.log.lock().unwrap().push(format!("close:{}", self.name));
        }
    }

    fn log() -> Arc<Mutex<Vec<String>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn entries(log: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[test]
    fn test_outbound_runs_in_declaration_order() {
        let log = log();
        let mut invoker = HandlerChainInvoker::new(
            vec![
                Scripted::new("l1", HandlerKind::Logical, Behavior::Pass, &log),
                Scripted::new("l2", HandlerKind::Logical, Behavior::Pass, &log),
            ],
            true,
        );
        let mut context = HandlerContext::new(true);
        assert!(matches!(
            invoker.invoke_logical(&mut context).unwrap(),
            ContinuationState::Continue
        ));
        assert_eq!(entries(&log), vec!["msg:l1", "msg:l2"]);
    }

    #[test]
    fn test_inbound_runs_reversed() {
        let log = log();
        let mut invoker = HandlerChainInvoker::new(
            vec![
                Scripted::new("l1", HandlerKind::Logical, Behavior::Pass, &log),
                Scripted::new("l2", HandlerKind::Logical, Behavior::Pass, &log),
            ],
            false,
        );
        let mut context = HandlerContext::new(false);
        invoker.invoke_logical(&mut context).unwrap();
        assert_eq!(entries(&log), vec!["msg:l2", "msg:l1"]);
    }

    #[test]
    fn test_kinds_are_partitioned() {
        let log = log();
        let mut invoker = HandlerChainInvoker::new(
            vec![
                Scripted::new("s", HandlerKind::Stream, Behavior::Pass, &log),
                Scripted::new("l", HandlerKind::Logical, Behavior::Pass, &log),
                Scripted::new("p", HandlerKind::Protocol, Behavior::Pass, &log),
            ],
            true,
        );
        let mut context = HandlerContext::new(true);
        invoker.invoke_logical(&mut context).unwrap();
        invoker.invoke_protocol(&mut context).unwrap();
        invoker.invoke_stream(&mut context).unwrap();
        assert_eq!(entries(&log), vec!["msg:l", "msg:p", "msg:s"]);
    }

    #[test]
    fn test_veto_reverses_direction_and_aborts() {
        let log = log();
        let mut invoker = HandlerChainInvoker::new(
            vec![
                Scripted::new("l1", HandlerKind::Logical, Behavior::Pass, &log),
                Scripted::new("l2", HandlerKind::Logical, Behavior::Veto, &log),
                Scripted::new("l3", HandlerKind::Logical, Behavior::Pass, &log),
            ],
            true,
        );
        let mut context = HandlerContext::new(true);
        assert!(matches!(
            invoker.invoke_logical(&mut context).unwrap(),
            ContinuationState::Reversed
        ));

        assert_eq!(entries(&log), vec!["msg:l1", "msg:l2"], "l3 never runs");
        assert!(!invoker.is_outbound());
        assert!(!context.is_outbound());
        assert!(invoker.processing_aborted());
        assert!(context.properties().flag(keys::DIRECTION_REVERSED));
        assert!(!context.fault_raised(), "a veto is not an error");
    }

    #[test]
    fn test_protocol_fault_recorded_and_direction_reversed() {
        let log = log();
        let mut invoker = HandlerChainInvoker::new(
            vec![
                Scripted::new("p1", HandlerKind::Protocol, Behavior::Pass, &log),
                Scripted::new("p2", HandlerKind::Protocol, Behavior::ProtocolFault, &log),
            ],
            true,
        );
        let mut context = HandlerContext::new(true);
        assert!(matches!(
            invoker.invoke_protocol(&mut context).unwrap(),
            ContinuationState::Reversed
        ));

        assert!(context.fault_raised());
        assert!(context.fault().unwrap().message().contains("p2 broke"));
        assert!(invoker.processing_aborted());
        assert!(!invoker.is_outbound());
    }

    #[test]
    fn test_fault_path_invokes_handle_fault() {
        let log = log();
        let mut invoker = HandlerChainInvoker::new(
            vec![
                Scripted::new("l1", HandlerKind::Logical, Behavior::Pass, &log),
                Scripted::new("p1", HandlerKind::Protocol, Behavior::ProtocolFault, &log),
            ],
            true,
        );
        let mut context = HandlerContext::new(true);
        invoker.invoke_logical(&mut context).unwrap();
        invoker.invoke_protocol(&mut context).unwrap();

        // The exchange travels back inbound on the fault path; l1 already
        // ran, so the abort latch lets it see the fault.
        invoker.invoke_logical(&mut context).unwrap();
        assert_eq!(
            entries(&log),
            vec!["msg:l1", "msg:p1", "fault:l1"],
            "fault traversal uses handle_fault"
        );
    }

    #[test]
    fn test_fatal_error_propagates_without_reversal() {
        let log = log();
        let mut invoker = HandlerChainInvoker::new(
            vec![Scripted::new("l1", HandlerKind::Logical, Behavior::Fatal, &log)],
            true,
        );
        let mut context = HandlerContext::new(true);
        let err = invoker.invoke_logical(&mut context).unwrap_err();
        assert!(matches!(err, HandlerError::Fatal(_)));
        assert!(invoker.is_outbound(), "fatal errors never reverse");
        assert!(invoker.is_closed());

        let err = invoker.invoke_logical(&mut context).unwrap_err();
        assert!(matches!(err, HandlerError::Closed));
    }

    #[test]
    fn test_mep_complete_close_order() {
        let log = log();
        let mut invoker = HandlerChainInvoker::new(
            vec![
                Scripted::new("l1", HandlerKind::Logical, Behavior::Pass, &log),
                Scripted::new("l2", HandlerKind::Logical, Behavior::Pass, &log),
                Scripted::new("p1", HandlerKind::Protocol, Behavior::Pass, &log),
                Scripted::new("s1", HandlerKind::Stream, Behavior::Pass, &log),
            ],
            true,
        );
        let mut context = HandlerContext::new(true);
        invoker.invoke_logical(&mut context).unwrap();
        invoker.invoke_protocol(&mut context).unwrap();
        invoker.invoke_stream(&mut context).unwrap();

        log.lock().unwrap().clear();
        invoker.mep_complete(&mut context);
        assert_eq!(
            entries(&log),
            vec!["close:p1", "close:l2", "close:l1", "close:s1"]
        );

        // Second completion is a no-op.
        log.lock().unwrap().clear();
        invoker.mep_complete(&mut context);
        assert!(entries(&log).is_empty());
    }

    #[test]
    fn test_only_invoked_handlers_are_closed() {
        let log = log();
        let mut invoker = HandlerChainInvoker::new(
            vec![
                Scripted::new("l1", HandlerKind::Logical, Behavior::Veto, &log),
                Scripted::new("l2", HandlerKind::Logical, Behavior::Pass, &log),
                Scripted::new("p1", HandlerKind::Protocol, Behavior::Pass, &log),
            ],
            true,
        );
        let mut context = HandlerContext::new(true);
        invoker.invoke_logical(&mut context).unwrap();

        log.lock().unwrap().clear();
        invoker.mep_complete(&mut context);
        assert_eq!(entries(&log), vec!["close:l1"], "l2 and p1 never ran");
    }

    #[test]
    fn test_aborted_invoker_skips_further_traversals() {
        let log = log();
        let mut invoker = HandlerChainInvoker::new(
            vec![
                Scripted::new("l1", HandlerKind::Logical, Behavior::Veto, &log),
                Scripted::new("p1", HandlerKind::Protocol, Behavior::Pass, &log),
            ],
            true,
        );
        let mut context = HandlerContext::new(true);
        invoker.invoke_logical(&mut context).unwrap();

        assert!(matches!(
            invoker.invoke_protocol(&mut context).unwrap(),
            ContinuationState::Continue
        ));
        assert_eq!(entries(&log), vec!["msg:l1"], "p1 is skipped after abort");
    }

    #[test]
    fn test_handle_fault_can_stop_traversal() {
        let log = log();
        let mut invoker = HandlerChainInvoker::new(
            vec![
                Scripted::new("l1", HandlerKind::Logical, Behavior::Pass, &log),
                Scripted::new("l2", HandlerKind::Logical, Behavior::StopFaultPath, &log),
                Scripted::new("p1", HandlerKind::Protocol, Behavior::ProtocolFault, &log),
            ],
            true,
        );
        let mut context = HandlerContext::new(true);
        invoker.invoke_logical(&mut context).unwrap();
        invoker.invoke_protocol(&mut context).unwrap();

        log.lock().unwrap().clear();
        assert!(matches!(
            invoker.invoke_logical(&mut context).unwrap(),
            ContinuationState::Reversed
        ));
        assert_eq!(entries(&log), vec!["fault:l2"], "l1 not reached after stop");
    }

    #[test]
    fn test_traversal_restamps_context_direction() {
        let log = log();
        let mut invoker = HandlerChainInvoker::new(
            vec![Scripted::new(
                "l1",
                HandlerKind::Logical,
                Behavior::RecordDirection,
                &log,
            )],
            false,
        );

        // The context was built for the opposite direction; the invoker's
        // direction wins at traversal entry.
        let mut context = HandlerContext::new(true);
        invoker.invoke_logical(&mut context).unwrap();
        assert_eq!(entries(&log), vec!["dir:false"]);
        assert!(!context.is_outbound());
        assert!(!context.properties().flag(keys::MESSAGE_OUTBOUND));
    }

    #[test]
    fn test_fault_expected_forces_fault_path() {
        let log = log();
        let mut invoker = HandlerChainInvoker::new(
            vec![
                Scripted::new("l1", HandlerKind::Logical, Behavior::Pass, &log),
                Scripted::new("l2", HandlerKind::Logical, Behavior::Pass, &log),
            ],
            true,
        );
        invoker.set_fault_expected(true);
        assert!(invoker.fault_expected());

        // No fault is recorded on the context, yet the traversal runs
        // handle_fault on every handler.
        let mut context = HandlerContext::new(true);
        assert!(matches!(
            invoker.invoke_logical(&mut context).unwrap(),
            ContinuationState::Continue
        ));
        assert_eq!(entries(&log), vec!["fault:l1", "fault:l2"]);
        assert!(!context.fault_raised());
    }

    #[test]
    fn test_response_expected_flag() {
        let log = log();
        let mut invoker = HandlerChainInvoker::new(
            vec![Scripted::new("l1", HandlerKind::Logical, Behavior::Pass, &log)],
            true,
        );
        assert!(invoker.is_response_expected());

        invoker.set_response_expected(false);
        assert!(!invoker.is_response_expected());
    }

    #[test]
    fn test_vetoing_handler_is_closed_but_not_revisited() {
        let log = log();
        let mut invoker = HandlerChainInvoker::new(
            vec![
                Scripted::new("l1", HandlerKind::Logical, Behavior::Pass, &log),
                Scripted::new("l2", HandlerKind::Logical, Behavior::Veto, &log),
            ],
            true,
        );
        let mut context = HandlerContext::new(true);
        invoker.invoke_logical(&mut context).unwrap();

        // The reversed re-drive only reaches handlers that completed a
        // pass; the vetoer itself is skipped.
        log.lock().unwrap().clear();
        invoker.invoke_logical(&mut context).unwrap();
        assert_eq!(entries(&log), vec!["msg:l1"]);

        log.lock().unwrap().clear();
        invoker.mep_complete(&mut context);
        assert_eq!(entries(&log), vec!["close:l2", "close:l1"]);
    }

    #[test]
    fn test_empty_kind_succeeds_even_when_closed() {
        let log = log();
        let mut invoker = HandlerChainInvoker::new(
            vec![Scripted::new("l1", HandlerKind::Logical, Behavior::Pass, &log)],
            true,
        );
        let mut context = HandlerContext::new(true);
        invoker.invoke_logical(&mut context).unwrap();
        invoker.mep_complete(&mut context);

        assert!(matches!(
            invoker.invoke_protocol(&mut context).unwrap(),
            ContinuationState::Continue
        ));
        let err = invoker.invoke_logical(&mut context).unwrap_err();
        assert!(matches!(err, HandlerError::Closed));
    }
}
