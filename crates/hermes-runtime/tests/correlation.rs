//! End-to-end client tests over a loopback transport fixture.
//!
//! The loopback conduit plays the remote side: it answers each request
//! from a spawned thread, so these tests exercise the real cross-thread
//! wait/wake path through the exchange monitor.

use hermes_core::{
    Conduit, ConduitInitiator, EndpointInfo, Fault, Message, MessageObserver, OperationInfo,
    TransportError,
};
use hermes_pipeline::{phase, FnInterceptor};
use hermes_runtime::{BaseBinding, Bus, Client, ClientBuilder, ClientConfig, ClientError, Endpoint};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Clone, Copy)]
enum Mode {
    /// Respond with the upper-cased request payload.
    Echo,
    /// Accept the request and never respond.
    Silent,
    /// Refuse to send.
    FailSend,
}

struct LoopbackConduit {
    mode: Mode,
    observer: Mutex<Option<Arc<dyn MessageObserver>>>,
}

impl Conduit for LoopbackConduit {
    fn send(&self, message: &mut Message) -> Result<(), TransportError> {
        match self.mode {
            Mode::FailSend => Err(TransportError::send("wire down")),
            Mode::Silent => Ok(()),
            Mode::Echo => {
                let exchange = message
                    .exchange()
                    .ok_or_else(|| TransportError::send("uncorrelated request"))?;
                let payload = message.content::<String>().cloned().unwrap_or_default();
                let observer = self
                    .observer
                    .lock()
                    .unwrap()
                    .clone()
                    .ok_or_else(|| TransportError::send("no observer registered"))?;
                thread::spawn(move || {
                    thread::sleep(Duration::from_millis(10));
                    let mut response = Message::for_exchange(&exchange);
                    response.set_content(payload.to_uppercase());
                    observer.on_message(response);
                });
                Ok(())
            }
        }
    }

    fn set_message_observer(&self, observer: Arc<dyn MessageObserver>) {
        *self.observer.lock().unwrap() = Some(observer);
    }
}

struct LoopbackInitiator(Mode);

impl ConduitInitiator for LoopbackInitiator {
    fn new_conduit(&self, _endpoint: &EndpointInfo) -> Result<Arc<dyn Conduit>, TransportError> {
        Ok(Arc::new(LoopbackConduit {
            mode: self.0,
            observer: Mutex::new(None),
        }))
    }
}

fn bus_with(mode: Mode) -> Arc<Bus> {
    let mut bus = Bus::new();
    bus.conduits_mut()
        .register("loopback", Arc::new(LoopbackInitiator(mode)));
    Arc::new(bus)
}

fn greeter_endpoint() -> Arc<Endpoint> {
    Arc::new(Endpoint::new(
        EndpointInfo::new("greeter", "loopback://greeter", "loopback"),
        Arc::new(BaseBinding::new("null")),
    ))
}

fn client_for(mode: Mode) -> Arc<Client> {
    ClientBuilder::new(bus_with(mode), greeter_endpoint()).build()
}

#[test]
fn test_synchronous_round_trip() {
    let client = client_for(Mode::Echo);
    let response: Option<String> = client
        .invoke(&OperationInfo::request_response("greet"), "hello".to_string())
        .unwrap();
    assert_eq!(response.as_deref(), Some("HELLO"));
}

#[test]
fn test_request_and_response_both_kept_on_exchange() {
    let client = client_for(Mode::Echo);
    let mut request = Message::new();
    request.set_content("ping".to_string());

    let exchange = client
        .invoke_message(&OperationInfo::request_response("greet"), request)
        .unwrap();

    assert!(exchange.has_out_message());
    assert!(exchange.has_in_message());
    let response = exchange.with_in_message(|m| m.and_then(|m| m.content::<String>().cloned()));
    assert_eq!(response.as_deref(), Some("PING"));
}

#[test]
fn test_one_way_does_not_wait() {
    let client = client_for(Mode::Silent);
    let mut request = Message::new();
    request.set_content("fire and forget".to_string());

    // A silent transport never responds; a one-way call must return anyway.
    let exchange = client
        .invoke_message(&OperationInfo::one_way("publish"), request)
        .unwrap();
    assert!(exchange.is_one_way());
    assert!(exchange.has_out_message());
    assert!(!exchange.has_in_message());
}

#[test]
fn test_fault_on_send() {
    let client = client_for(Mode::FailSend);
    let result: Result<Option<String>, _> = client.invoke(
        &OperationInfo::request_response("greet"),
        "hello".to_string(),
    );

    match result.unwrap_err() {
        ClientError::Send(fault) => assert!(fault.message().contains("wire down")),
        other => panic!("expected send fault, got {other}"),
    }
}

#[test]
fn test_fault_on_receive() {
    let client = ClientBuilder::new(bus_with(Mode::Echo), greeter_endpoint())
        .in_interceptor(
            FnInterceptor::new("response-rejector", phase::names::READ, |_: &mut Message| {
                Err(Fault::client("bad response envelope"))
            })
            .into_arc(),
        )
        .build();

    let result: Result<Option<String>, _> = client.invoke(
        &OperationInfo::request_response("greet"),
        "hello".to_string(),
    );

    match result.unwrap_err() {
        ClientError::Receive(fault) => {
            assert_eq!(fault.message(), "bad response envelope");
        }
        other => panic!("expected receive fault, got {other}"),
    }
}

#[test]
fn test_response_timeout() {
    let client = ClientBuilder::new(bus_with(Mode::Silent), greeter_endpoint())
        .config(ClientConfig {
            response_timeout_ms: 50,
        })
        .build();

    let result: Result<Option<String>, _> = client.invoke(
        &OperationInfo::request_response("greet"),
        "hello".to_string(),
    );

    match result.unwrap_err() {
        ClientError::ResponseTimeout { waited } => {
            assert!(waited >= Duration::from_millis(50));
        }
        other => panic!("expected timeout, got {other}"),
    }
}

#[test]
fn test_missing_response_content() {
    let client = client_for(Mode::Echo);
    // The echo transport responds with a String; asking for a u64 must
    // fail without consuming the response message itself.
    let result: Result<Option<u64>, _> = client.invoke(
        &OperationInfo::request_response("greet"),
        "hello".to_string(),
    );
    assert!(matches!(
        result.unwrap_err(),
        ClientError::MissingResponseContent
    ));
}

#[test]
fn test_out_chain_assembled_from_all_four_layers() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let stage = |id: &str, log: &Arc<Mutex<Vec<String>>>| {
        let log = Arc::clone(log);
        let id_owned = id.to_string();
        FnInterceptor::new(id, phase::names::LOGICAL, move |_: &mut Message| {
            log.lock().unwrap().push(id_owned.clone());
            Ok(())
        })
        .into_arc()
    };

    let mut bus = Bus::new();
    bus.conduits_mut()
        .register("loopback", Arc::new(LoopbackInitiator(Mode::Echo)));
    bus.registry_mut().add_out(stage("bus-stage", &log));

    let mut binding = BaseBinding::new("tagged");
    binding.registry_mut().add_out(stage("binding-stage", &log));

    let mut endpoint = Endpoint::new(
        EndpointInfo::new("greeter", "loopback://greeter", "loopback"),
        Arc::new(binding),
    );
    endpoint.registry_mut().add_out(stage("endpoint-stage", &log));

    let client = ClientBuilder::new(Arc::new(bus), Arc::new(endpoint))
        .out_interceptor(stage("client-stage", &log))
        .build();

    let _: Option<String> = client
        .invoke(&OperationInfo::request_response("greet"), "hi".to_string())
        .unwrap();

    // Same phase, no constraints: layer concatenation order decides.
    assert_eq!(
        *log.lock().unwrap(),
        vec!["bus-stage", "endpoint-stage", "client-stage", "binding-stage"]
    );
}

#[test]
fn test_response_fully_processed_before_waiter_wakes() {
    // An inbound interceptor rewrites the response; the waiter must only
    // ever observe the rewritten form.
    let client = ClientBuilder::new(bus_with(Mode::Echo), greeter_endpoint())
        .in_interceptor(
            FnInterceptor::new("decorator", phase::names::UNMARSHAL, |message: &mut Message| {
                if let Some(body) = message.content::<String>().cloned() {
                    message.set_content(format!("{body}!"));
                }
                Ok(())
            })
            .into_arc(),
        )
        .build();

    for _ in 0..10 {
        let response: Option<String> = client
            .invoke(&OperationInfo::request_response("greet"), "hey".to_string())
            .unwrap();
        assert_eq!(response.as_deref(), Some("HEY!"));
    }
}

#[test]
fn test_concurrent_invocations_do_not_cross_wires() {
    let client = client_for(Mode::Echo);
    let mut workers = Vec::new();
    for i in 0..8 {
        let client = Arc::clone(&client);
        workers.push(thread::spawn(move || {
            let body = format!("msg-{i}");
            let response: Option<String> = client
                .invoke(&OperationInfo::request_response("greet"), body.clone())
                .unwrap();
            assert_eq!(response, Some(body.to_uppercase()));
        }));
    }
    for worker in workers {
        worker.join().unwrap();
    }
}
