//! Client/server runtime for the Hermes messaging pipeline.
//!
//! This crate assembles the pieces defined by `hermes-core` and
//! `hermes-pipeline` into a working request/response runtime:
//!
//! - [`Bus`]: process-wide interceptor registrations, phase orders, and
//!   transport wiring.
//! - [`Binding`] / [`Endpoint`]: the protocol and addressing layers that
//!   contribute interceptors to every chain.
//! - [`Client`]: synchronous invocation with an outbound chain, lazy
//!   conduit resolution, and a monitor wait on the exchange until the
//!   response (processed by its own inbound chain on the delivering
//!   thread) is committed.
//! - [`ServerObserver`]: the inbound entry point destinations deliver
//!   requests to.
//!
//! Chains are always assembled from four contributor layers in a fixed
//! concatenation order (bus, endpoint, client/server, binding), so
//! same-phase interceptors from different layers end up in a predictable
//! relative order.

pub mod binding;
pub mod bus;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod observer;
pub mod sender;

pub use binding::{BaseBinding, Binding};
pub use bus::Bus;
pub use client::{Client, ClientBuilder, ClientError};
pub use config::ClientConfig;
pub use endpoint::Endpoint;
pub use observer::ServerObserver;
pub use sender::{MessageSenderInterceptor, MESSAGE_SENDER_ID};
