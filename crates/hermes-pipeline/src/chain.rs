//! Chain assembly and execution.
//!
//! A [`ChainBuilder`] collects interceptors contributed by independent
//! layers (runtime, endpoint, client/server, binding) and resolves them
//! into one totally ordered [`PhaseInterceptorChain`]. Ordering is
//! two-level and must stay that way: layers are concatenated first, then a
//! stable topological sort runs *within* each phase over the concatenated
//! list. Swapping the levels would change which interceptor wins when two
//! layers contribute to the same phase with no explicit constraint between
//! them.
//!
//! Chains are per-call and single-threaded; the interceptors they hold are
//! shared and must tolerate concurrent use from many chains.

use crate::interceptor::Interceptor;
use crate::phase::PhaseOrder;
use hermes_core::{ChainControl, Message};
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use thiserror::Error;

/// Execution state of a chain instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    /// Built but not yet executed.
    Pending,
    /// Currently invoking interceptors.
    Executing,
    /// Stopped at the cursor; re-invoking resumes from there.
    Paused,
    /// Terminally stopped; no interceptor will run again.
    Aborted,
    /// Every interceptor ran to completion.
    Complete,
}

/// Configuration errors detected while assembling a chain.
///
/// These are raised at build time and never deferred to execution.
#[derive(Error, Debug)]
pub enum ChainSetupError {
    /// Before/after constraints within one phase form a cycle.
    #[error("ordering constraints form a cycle in phase '{phase}' among {ids:?}")]
    ConstraintCycle {
        /// The phase whose constraints cannot be satisfied.
        phase: String,
        /// Ids of the interceptors involved in the cycle.
        ids: Vec<String>,
    },

    /// An interceptor declared a phase the chain's order does not contain.
    #[error("interceptor '{interceptor}' declares unknown phase '{phase}'")]
    UnknownPhase {
        /// Id of the offending interceptor.
        interceptor: String,
        /// The phase name that failed to resolve.
        phase: String,
    },
}

/// Builder that assembles interceptors from multiple layers into a chain.
///
/// # Example
///
/// ```
/// use hermes_pipeline::{phase, ChainBuilder, FnInterceptor};
///
/// let chain = ChainBuilder::new(phase::PhaseOrder::default_out())
///     .add(FnInterceptor::new("stamp", phase::names::SETUP, |_| Ok(())).into_arc())
///     .build()
///     .expect("no ordering conflicts");
/// assert_eq!(chain.len(), 1);
/// ```
#[must_use]
pub struct ChainBuilder {
    order: PhaseOrder,
    registered: Vec<Arc<dyn Interceptor>>,
}

impl ChainBuilder {
    /// Creates a builder for the given phase order.
    pub fn new(order: PhaseOrder) -> Self {
        Self {
            order,
            registered: Vec::new(),
        }
    }

    /// Registers one interceptor.
    pub fn add(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.registered.push(interceptor);
        self
    }

    /// Registers a whole layer's interceptors, preserving their order.
    ///
    /// Layers are appended, never interleaved, so plugin ordering stays
    /// predictable regardless of registration timing.
    pub fn add_layer(mut self, interceptors: &[Arc<dyn Interceptor>]) -> Self {
        self.registered.extend(interceptors.iter().cloned());
        self
    }

    /// Resolves the total order and produces an executable chain.
    ///
    /// # Errors
    ///
    /// Returns a [`ChainSetupError`] if an interceptor names a phase the
    /// order does not contain, or if same-phase constraints form a cycle.
    /// Nothing is ever silently dropped.
    pub fn build(self) -> Result<PhaseInterceptorChain, ChainSetupError> {
        let mut buckets: IndexMap<String, Vec<Arc<dyn Interceptor>>> = self
            .order
            .iter()
            .map(|name| (name.to_string(), Vec::new()))
            .collect();

        for interceptor in self.registered {
            let phase = interceptor.phase().to_string();
            let Some(bucket) = buckets.get_mut(&phase) else {
                return Err(ChainSetupError::UnknownPhase {
                    interceptor: interceptor.id().to_string(),
                    phase,
                });
            };
            tracing::trace!(
                interceptor = interceptor.id(),
                phase = %phase,
                "adding interceptor to phase"
            );
            bucket.push(interceptor);
        }

        let mut resolved = Vec::new();
        for (phase, bucket) in buckets {
            resolved.extend(sort_phase(&phase, bucket)?);
        }

        Ok(PhaseInterceptorChain {
            interceptors: resolved,
            cursor: 0,
            invoked: Vec::new(),
            state: ChainState::Pending,
            control: ChainControl::new(),
        })
    }
}

/// Stable topological sort of one phase's interceptors.
///
/// Edges come from the before/after declarations; ties are broken by
/// registration order so repeated builds from the same input always agree.
/// Constraints naming ids absent from the phase are ignored.
fn sort_phase(
    phase: &str,
    bucket: Vec<Arc<dyn Interceptor>>,
) -> Result<Vec<Arc<dyn Interceptor>>, ChainSetupError> {
    let n = bucket.len();
    if n <= 1 {
        return Ok(bucket);
    }

    let positions: HashMap<String, usize> = bucket
        .iter()
        .enumerate()
        .map(|(i, ic)| (ic.id().to_string(), i))
        .collect();

    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut indegree = vec![0usize; n];
    for (i, interceptor) in bucket.iter().enumerate() {
        for target in interceptor.before() {
            if let Some(&j) = positions.get(&target) {
                if j != i {
                    successors[i].push(j);
                    indegree[j] += 1;
                }
            }
        }
        for target in interceptor.after() {
            if let Some(&j) = positions.get(&target) {
                if j != i {
                    successors[j].push(i);
                    indegree[i] += 1;
                }
            }
        }
    }

    // Kahn's algorithm; the ready set is ordered by registration index.
    let mut ready: BTreeSet<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
    let mut sorted = Vec::with_capacity(n);
    while let Some(&i) = ready.iter().next() {
        ready.remove(&i);
        sorted.push(i);
        for &j in &successors[i] {
            indegree[j] -= 1;
            if indegree[j] == 0 {
                ready.insert(j);
            }
        }
    }

    if sorted.len() < n {
        let placed: BTreeSet<usize> = sorted.iter().copied().collect();
        let ids = (0..n)
            .filter(|i| !placed.contains(i))
            .map(|i| bucket[i].id().to_string())
            .collect();
        return Err(ChainSetupError::ConstraintCycle {
            phase: phase.to_string(),
            ids,
        });
    }

    Ok(sorted.into_iter().map(|i| Arc::clone(&bucket[i])).collect())
}

/// A resolved, executable interceptor chain for one processing run.
///
/// The chain advances a cursor over its flattened interceptor sequence.
/// Execution may pause (and later resume from the cursor), abort, complete,
/// or unwind on a fault. Once `Complete` or `Aborted`, further calls to
/// [`PhaseInterceptorChain::do_intercept`] are no-ops.
pub struct PhaseInterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
    cursor: usize,
    invoked: Vec<usize>,
    state: ChainState,
    control: ChainControl,
}

impl PhaseInterceptorChain {
    /// Returns the current chain state.
    #[must_use]
    pub const fn state(&self) -> ChainState {
        self.state
    }

    /// Returns the control handle bound to messages this chain drives.
    #[must_use]
    pub fn control(&self) -> ChainControl {
        self.control.clone()
    }

    /// Returns the number of interceptors in the resolved order.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    /// Returns `true` if the chain holds no interceptors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Returns the resolved interceptor ids in execution order.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.interceptors.iter().map(|ic| ic.id()).collect()
    }

    /// Executes the chain against the message.
    ///
    /// Invoking a `Paused` chain resumes exactly where it left off;
    /// invoking a `Complete` or `Aborted` chain returns immediately
    /// without touching any interceptor.
    ///
    /// On a fault the chain records it on the message, invokes
    /// `handle_fault` on every interceptor that ran (in reverse invocation
    /// order, the thrower first), and aborts.
    pub fn do_intercept(&mut self, message: &mut Message) -> ChainState {
        if matches!(self.state, ChainState::Complete | ChainState::Aborted) {
            return self.state;
        }
        self.state = ChainState::Executing;
        message.set_chain_control(self.control.clone());

        while self.cursor < self.interceptors.len() {
            if self.control.abort_requested() {
                tracing::debug!("abort requested; chain stops");
                self.state = ChainState::Aborted;
                return self.state;
            }

            let interceptor = Arc::clone(&self.interceptors[self.cursor]);
            tracing::trace!(
                interceptor = interceptor.id(),
                phase = interceptor.phase(),
                "invoking interceptor"
            );
            self.invoked.push(self.cursor);
            self.cursor += 1;

            match interceptor.handle_message(message) {
                Ok(()) => {
                    if self.control.take_pause_request() {
                        tracing::debug!(
                            interceptor = interceptor.id(),
                            "chain paused; awaiting resume"
                        );
                        self.state = ChainState::Paused;
                        return self.state;
                    }
                }
                Err(fault) => {
                    tracing::debug!(
                        interceptor = interceptor.id(),
                        %fault,
                        "interceptor raised fault; unwinding"
                    );
                    message.set_fault(fault);
                    self.unwind(message);
                    self.state = ChainState::Aborted;
                    return self.state;
                }
            }
        }

        self.state = ChainState::Complete;
        self.state
    }

    /// Invokes `handle_fault` on every interceptor that actually ran, in
    /// reverse invocation order.
    ///
    /// Interceptors skipped by a pause or abort never ran and get no
    /// lifecycle callback.
    fn unwind(&mut self, message: &mut Message) {
        for &index in self.invoked.iter().rev() {
            self.interceptors[index].handle_fault(message);
        }
    }
}

impl std::fmt::Debug for PhaseInterceptorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseInterceptorChain")
            .field("state", &self.state)
            .field("cursor", &self.cursor)
            .field("interceptors", &self.ids())
            .finish_non_exhaustive()
    }
}
