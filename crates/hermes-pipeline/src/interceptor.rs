//! The interceptor trait.
//!
//! An interceptor is one unit of message processing, tagged with the phase
//! it executes in plus optional fine-grained ordering constraints relative
//! to other interceptors in the same phase. Interceptor instances are
//! shared across many concurrently executing chains, so implementations
//! must be stateless or internally thread-safe.

use hermes_core::{Fault, Message};
use std::sync::Arc;

/// A pipeline stage operating on a [`Message`].
///
/// # Ordering
///
/// `phase` selects the ordering bucket; `before`/`after` constrain the
/// position within that bucket, naming other interceptors by id. The
/// constraints are resolved once, when the chain is built; a cycle is a
/// configuration error reported at that point, never at execution time.
///
/// # Control flow
///
/// `handle_message` may:
///
/// - return `Ok(())` to fall through to the next interceptor,
/// - pause or abort the chain through the message's
///   [`ChainControl`](hermes_core::ChainControl) handle and return `Ok(())`,
/// - return `Err(fault)`: the chain records the fault on the message and
///   unwinds: every interceptor that already ran gets `handle_fault`, in
///   reverse invocation order.
///
/// # Example
///
/// ```
/// use hermes_core::{Fault, Message};
/// use hermes_pipeline::{phase, Interceptor};
///
/// struct RejectEmpty;
///
/// impl Interceptor for RejectEmpty {
///     fn id(&self) -> &str {
///         "reject-empty"
///     }
///
///     fn phase(&self) -> &str {
///         phase::names::READ
///     }
///
///     fn handle_message(&self, message: &mut Message) -> Result<(), Fault> {
///         if message.content::<Vec<u8>>().is_some_and(Vec::is_empty) {
///             return Err(Fault::client("empty payload"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Interceptor: Send + Sync {
    /// Returns the unique id of this interceptor.
    ///
    /// Ids are what `before`/`after` constraints refer to, and what shows
    /// up in logs.
    fn id(&self) -> &str;

    /// Returns the name of the phase this interceptor executes in.
    fn phase(&self) -> &str;

    /// Ids of same-phase interceptors this one must run before.
    fn before(&self) -> Vec<String> {
        Vec::new()
    }

    /// Ids of same-phase interceptors this one must run after.
    fn after(&self) -> Vec<String> {
        Vec::new()
    }

    /// Processes the message on the normal path.
    ///
    /// # Errors
    ///
    /// Returns a [`Fault`] to terminate forward execution and trigger the
    /// chain's unwind.
    fn handle_message(&self, message: &mut Message) -> Result<(), Fault>;

    /// Reacts to a fault raised further down the chain.
    ///
    /// Called in reverse invocation order on interceptors that already
    /// ran, mirroring try/finally semantics over a partially applied
    /// pipeline. The fault is available on the message.
    fn handle_fault(&self, message: &mut Message) {
        let _ = message;
    }
}

/// An interceptor built from a closure, for simple stages and tests.
///
/// # Example
///
/// ```
/// use hermes_pipeline::{phase, FnInterceptor};
///
/// let stamp = FnInterceptor::new("stamp", phase::names::SETUP, |message| {
///     message.properties_mut().set("stamped", true);
///     Ok(())
/// })
/// .run_before(["message-sender"]);
/// ```
pub struct FnInterceptor<F> {
    id: String,
    phase: String,
    before: Vec<String>,
    after: Vec<String>,
    func: F,
}

impl<F> FnInterceptor<F>
where
    F: Fn(&mut Message) -> Result<(), Fault> + Send + Sync,
{
    /// Creates a closure-backed interceptor.
    #[must_use]
    pub fn new(id: impl Into<String>, phase: impl Into<String>, func: F) -> Self {
        Self {
            id: id.into(),
            phase: phase.into(),
            before: Vec::new(),
            after: Vec::new(),
            func,
        }
    }

    /// Adds before constraints (ids this interceptor must precede).
    #[must_use]
    pub fn run_before<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.before.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Adds after constraints (ids this interceptor must follow).
    #[must_use]
    pub fn run_after<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.after.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Boxes this interceptor for registration.
    #[must_use]
    pub fn into_arc(self) -> Arc<dyn Interceptor>
    where
        F: 'static,
    {
        Arc::new(self)
    }
}

impl<F> Interceptor for FnInterceptor<F>
where
    F: Fn(&mut Message) -> Result<(), Fault> + Send + Sync,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn phase(&self) -> &str {
        &self.phase
    }

    fn before(&self) -> Vec<String> {
        self.before.clone()
    }

    fn after(&self) -> Vec<String> {
        self.after.clone()
    }

    fn handle_message(&self, message: &mut Message) -> Result<(), Fault> {
        (self.func)(message)
    }
}
