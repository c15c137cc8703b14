//! The runtime bus.
//!
//! A [`Bus`] holds everything that is shared across every endpoint in the
//! process: the runtime-wide interceptor registrations, the outbound and
//! inbound phase orders chains are built against, and the registry of
//! conduit initiators transports plug into. Clients and server observers
//! hold the bus behind an `Arc` and consult it when assembling chains.

use hermes_core::ConduitInitiatorRegistry;
use hermes_pipeline::{InterceptorRegistry, PhaseOrder};

/// Shared runtime state: interceptor registrations, phase orders, and
/// transport wiring.
///
/// The bus is assembled once at startup, then frozen behind an `Arc`.
/// Mutation happens through the `_mut` accessors before sharing.
///
/// # Example
///
/// ```
/// use hermes_runtime::Bus;
/// use hermes_pipeline::InterceptorProvider;
///
/// let bus = Bus::new();
/// assert!(bus.registry().out_interceptors().is_empty());
/// assert!(!bus.out_phases().is_empty());
/// ```
#[derive(Debug)]
pub struct Bus {
    registry: InterceptorRegistry,
    out_phases: PhaseOrder,
    in_phases: PhaseOrder,
    conduits: ConduitInitiatorRegistry,
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus {
    /// Creates a bus with the standard phase orders and no registrations.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: InterceptorRegistry::new(),
            out_phases: PhaseOrder::default_out(),
            in_phases: PhaseOrder::default_in(),
            conduits: ConduitInitiatorRegistry::new(),
        }
    }

    /// Returns the runtime-wide interceptor registry.
    #[must_use]
    pub const fn registry(&self) -> &InterceptorRegistry {
        &self.registry
    }

    /// Returns the runtime-wide interceptor registry mutably.
    pub fn registry_mut(&mut self) -> &mut InterceptorRegistry {
        &mut self.registry
    }

    /// Returns the phase order used for outbound chains.
    #[must_use]
    pub const fn out_phases(&self) -> &PhaseOrder {
        &self.out_phases
    }

    /// Returns the phase order used for inbound chains.
    #[must_use]
    pub const fn in_phases(&self) -> &PhaseOrder {
        &self.in_phases
    }

    /// Replaces both phase orders.
    ///
    /// Bindings with non-standard processing sequences install their own
    /// orders here before any chain is built.
    pub fn set_phases(&mut self, out_phases: PhaseOrder, in_phases: PhaseOrder) {
        self.out_phases = out_phases;
        self.in_phases = in_phases;
    }

    /// Returns the conduit initiator registry.
    #[must_use]
    pub const fn conduits(&self) -> &ConduitInitiatorRegistry {
        &self.conduits
    }

    /// Returns the conduit initiator registry mutably.
    pub fn conduits_mut(&mut self) -> &mut ConduitInitiatorRegistry {
        &mut self.conduits
    }
}
