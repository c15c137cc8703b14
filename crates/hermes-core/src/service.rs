//! Read-only service-model lookup types.
//!
//! These types describe the operations an endpoint offers. The pipeline
//! consumes them for routing decisions (one-way detection, operation
//! resolution); it never produces or validates them. Schema and interface
//! tooling live outside this runtime.

use serde::{Deserialize, Serialize};

/// Describes one logical message of an operation (its request or response).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageInfo {
    /// The message name from the service contract.
    pub name: String,
}

impl MessageInfo {
    /// Creates a message description.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Describes one operation of a service interface.
///
/// An operation without an output message is one-way: the runtime never
/// waits for a response to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationInfo {
    /// The operation name.
    pub name: String,
    /// The input message, if the operation takes one.
    pub input: Option<MessageInfo>,
    /// The output message, if the operation returns one.
    pub output: Option<MessageInfo>,
}

impl OperationInfo {
    /// Creates a request/response operation.
    #[must_use]
    pub fn request_response(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            input: Some(MessageInfo::new(format!("{name}Request"))),
            output: Some(MessageInfo::new(format!("{name}Response"))),
            name,
        }
    }

    /// Creates a one-way operation (no response message).
    #[must_use]
    pub fn one_way(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            input: Some(MessageInfo::new(format!("{name}Request"))),
            output: None,
            name,
        }
    }

    /// Returns `true` if the operation expects no response.
    #[must_use]
    pub const fn is_one_way(&self) -> bool {
        self.output.is_none()
    }
}

/// An operation as bound to a concrete protocol binding.
///
/// Stored on the exchange so any stage can resolve the operation being
/// invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingOperationInfo {
    operation: OperationInfo,
}

impl BindingOperationInfo {
    /// Wraps an operation for a binding.
    #[must_use]
    pub fn new(operation: OperationInfo) -> Self {
        Self { operation }
    }

    /// Returns the underlying operation.
    #[must_use]
    pub const fn operation(&self) -> &OperationInfo {
        &self.operation
    }
}

/// Describes a reachable endpoint of a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointInfo {
    /// The endpoint name.
    pub name: String,
    /// The transport address the endpoint listens on.
    pub address: String,
    /// Identifier of the transport technology serving the address.
    pub transport_id: String,
}

impl EndpointInfo {
    /// Creates an endpoint description.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        transport_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            transport_id: transport_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_response_operation() {
        let op = OperationInfo::request_response("getQuote");
        assert_eq!(op.name, "getQuote");
        assert_eq!(op.input.as_ref().unwrap().name, "getQuoteRequest");
        assert_eq!(op.output.as_ref().unwrap().name, "getQuoteResponse");
        assert!(!op.is_one_way());
    }

    #[test]
    fn test_one_way_operation() {
        let op = OperationInfo::one_way("publishEvent");
        assert!(op.output.is_none());
        assert!(op.is_one_way());
    }

    #[test]
    fn test_binding_operation_wraps_operation() {
        let boi = BindingOperationInfo::new(OperationInfo::one_way("ping"));
        assert!(boi.operation().is_one_way());
    }

    #[test]
    fn test_endpoint_info_serialization() {
        let info = EndpointInfo::new("greeter", "local://greeter", "local");
        let json = serde_json::to_string(&info).expect("serialization should work");
        let parsed: EndpointInfo = serde_json::from_str(&json).expect("deserialization");
        assert_eq!(parsed, info);
    }
}
