//! Tests for the public macros: `injectable!`, `args!` and `resolve!`.

use fibre_inject::{args, injectable, resolve, Container, Owned, Param};
use pretty_assertions::assert_eq;
use std::sync::Arc;

// --- Test Fixtures ---

#[derive(Debug, Clone, PartialEq)]
struct Port(u16);

#[derive(Debug, Clone, PartialEq)]
struct Endpoint {
  host: String,
  port: u16,
}

injectable!(Port, Endpoint,);

trait Clock: Send + Sync {
  fn now(&self) -> u64;
}

struct FixedClock(u64);

impl Clock for FixedClock {
  fn now(&self) -> u64 {
    self.0
  }
}

// --- injectable! ---

#[test]
fn test_injectable_types_are_keyed_by_themselves() {
  assert_eq!(<Port as Param>::key(), <Arc<Port> as Param>::key());
  assert_eq!(<Port as Param>::key(), <Owned<Port> as Param>::key());
  assert_eq!(<Port as Param>::key().name(), std::any::type_name::<Port>());
}

#[test]
fn test_injectable_types_flow_by_value() {
  let container = Container::new();
  container.bind(Port(8080));
  container.register(|port: Port| Endpoint {
    host: "localhost".to_string(),
    port: port.0,
  });

  let endpoint = container.resolve::<Endpoint>().unwrap();

  assert_eq!(
    endpoint,
    Endpoint {
      host: "localhost".to_string(),
      port: 8080,
    }
  );
}

// --- args! ---

#[test]
fn test_args_macro_builds_positional_arguments() {
  let empty = args![];
  let filled = args![1u8, "two", 3.0f64,];

  assert!(empty.is_empty());
  assert_eq!(filled.len(), 3);
}

#[test]
fn test_args_macro_feeds_invocation() {
  let container = Container::new();
  container.bind(Port(443));

  let url = container
    .invoke_as::<String, _, _>(
      |scheme: &'static str, host: String, port: Port| format!("{scheme}://{host}:{}", port.0),
      args!["https", "example.org".to_string()],
    )
    .unwrap();

  assert_eq!(url, "https://example.org:443");
}

// --- resolve! ---

#[test]
fn test_resolve_macro_returns_requested_shape() {
  // Arrange
  let container = Container::new();
  container.bind(Port(22));
  container.register(|| -> Arc<dyn Clock> { Arc::new(FixedClock(1_700_000_000)) });

  // Act
  let port = resolve!(container, Port);
  let shared_port = resolve!(container, Arc<Port>);
  let clock = resolve!(container, Arc<dyn Clock>);

  // Assert
  assert_eq!(port, Port(22));
  assert_eq!(*shared_port, Port(22));
  assert_eq!(clock.now(), 1_700_000_000);
}

#[test]
fn test_resolve_macro_accepts_container_expressions() {
  let parent = Container::new();
  parent.bind(Port(5432));

  let port = resolve!(parent.child(), Port);

  assert_eq!(port, Port(5432));
}

#[test]
#[should_panic(expected = "Failed to resolve required service")]
fn test_resolve_macro_panics_on_missing() {
  let container = Container::new();
  let _endpoint = resolve!(container, Endpoint);
}

#[test]
#[should_panic(expected = "unresolved")]
fn test_resolve_macro_panic_carries_the_error() {
  let container = Container::new();
  let _clock = resolve!(container, Arc<dyn Clock>);
}
