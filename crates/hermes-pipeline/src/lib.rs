//! Phase-ordered interceptor chains and handler mediation.
//!
//! This crate implements the processing engine of the Hermes runtime:
//!
//! - [`Interceptor`]: one fine-grained pipeline stage, tagged with a
//!   phase and optional same-phase ordering constraints.
//! - [`PhaseOrder`](phase::PhaseOrder): the externally supplied total
//!   order of phases a chain executes through.
//! - [`ChainBuilder`] / [`PhaseInterceptorChain`]: assembly (layer
//!   concatenation plus per-phase topological sort) and execution
//!   (pause, resume, abort, fault unwind).
//! - [`HandlerChainInvoker`]: the coarse-grained, application-facing
//!   handler layer with direction reversal and close lifecycle.
//!
//! Chain construction is fail-fast: unknown phases and constraint cycles
//! are configuration errors surfaced from [`ChainBuilder::build`], never
//! silently dropped or deferred to execution.

pub mod chain;
pub mod handlers;
pub mod interceptor;
pub mod phase;
pub mod provider;

pub use chain::{ChainBuilder, ChainSetupError, ChainState, PhaseInterceptorChain};
pub use handlers::{
    ContinuationState, Handler, HandlerChainInvoker, HandlerContext, HandlerError, HandlerKind,
};
pub use interceptor::{FnInterceptor, Interceptor};
pub use phase::PhaseOrder;
pub use provider::{InterceptorProvider, InterceptorRegistry};
