use fibre_inject::{args, injectable, Container, InjectError, Owned};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// --- Test Fixtures ---

#[derive(Debug, Clone, PartialEq)]
struct Name(String);

#[derive(Debug, Clone, PartialEq)]
struct Greeting(String);

#[derive(Debug, Clone, PartialEq)]
struct Settings {
  verbose: bool,
}

injectable!(Name, Greeting, Settings);

// --- Basic Tests ---

#[test]
fn test_bound_value_resolves_in_both_shapes() {
  // Arrange
  let container = Container::new();
  container.bind(Settings { verbose: true });

  // Act
  let by_value = container.resolve::<Settings>().unwrap();
  let shared_1 = container.resolve::<Arc<Settings>>().unwrap();
  let shared_2 = container.resolve::<Arc<Settings>>().unwrap();

  // Assert
  assert_eq!(by_value, Settings { verbose: true });
  assert_eq!(*shared_1, Settings { verbose: true });
  // A bound value is one value: shared requests see the same allocation.
  assert!(Arc::ptr_eq(&shared_1, &shared_2));
}

#[test]
fn test_bound_arc_is_handed_out_unchanged() {
  let settings = Arc::new(Settings { verbose: false });
  let container = Container::new();
  container.bind(Arc::clone(&settings));

  let resolved = container.resolve::<Arc<Settings>>().unwrap();
  assert!(Arc::ptr_eq(&settings, &resolved));

  let by_value = container.resolve::<Owned<Settings>>().unwrap();
  assert_eq!(by_value.into_inner(), *settings);
}

#[test]
fn test_value_provider_serves_shared_requests() {
  // Arrange
  let container = Container::new();
  container.register(|| Settings { verbose: true });

  // Act
  let by_value = container.resolve::<Settings>().unwrap();
  let shared = container.resolve::<Arc<Settings>>().unwrap();

  // Assert
  assert_eq!(*shared, by_value);
}

#[test]
fn test_shared_provider_serves_value_requests() {
  let container = Container::new();
  container.register(|| Arc::new(Settings { verbose: true }));

  let shared = container.resolve::<Arc<Settings>>().unwrap();
  let by_value = container.resolve::<Settings>().unwrap();

  assert_eq!(*shared, by_value);
}

#[test]
fn test_provider_parameters_are_injected() {
  // Arrange
  let container = Container::new();
  container.bind(Name("alice".to_string()));
  container.register(|name: Name| Greeting(format!("hi {}", name.0)));

  // Act
  let greeting = container
    .invoke_as::<Greeting, _, _>(|greeting: Greeting| greeting, args![])
    .unwrap();

  // Assert
  assert_eq!(greeting, Greeting("hi alice".to_string()));
}

#[test]
fn test_plain_provider_runs_on_every_resolution() {
  // Arrange
  let calls = Arc::new(AtomicUsize::new(0));
  let counter = Arc::clone(&calls);
  let container = Container::new();
  container.register(move || {
    counter.fetch_add(1, Ordering::SeqCst);
    Arc::new(Settings { verbose: false })
  });

  // Act
  let first = container.resolve::<Arc<Settings>>().unwrap();
  let second = container.resolve::<Arc<Settings>>().unwrap();

  // Assert
  assert_eq!(calls.load(Ordering::SeqCst), 2);
  assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn test_unbound_type_is_unresolved() {
  #[derive(Clone)]
  struct Widget;

  let container = Container::new();

  for err in [
    container.resolve::<Owned<Widget>>().map(|_| ()).unwrap_err(),
    container.resolve::<Arc<Widget>>().map(|_| ()).unwrap_err(),
  ] {
    assert!(err.is_unresolved());
    let message = err.to_string();
    assert!(message.contains("unresolved"), "{message}");
    assert!(message.contains("Widget"), "{message}");
  }
}

#[test]
fn test_later_registration_wins() {
  // Arrange
  let container = Container::new();
  container.bind(Name("first".to_string()));

  // Act
  container.bind(Name("second".to_string()));
  let first_wins = container.resolve::<Name>().unwrap();
  container.register(|| Name("third".to_string()));
  let provider_wins = container.resolve::<Name>().unwrap();

  // Assert
  assert_eq!(first_wins, Name("second".to_string()));
  assert_eq!(provider_wins, Name("third".to_string()));
  assert_eq!(container.len(), 1);
}

#[test]
fn test_value_and_shared_registrations_share_a_key() {
  let container = Container::new();
  container.bind(Settings { verbose: true });
  container.register(|| Arc::new(Settings { verbose: false }));

  assert!(container.contains::<Settings>());
  assert_eq!(container.len(), 1);
  assert_eq!(container.resolve::<Settings>().unwrap(), Settings { verbose: false });
}

#[test]
fn test_invoke_without_return_value_yields_nothing() {
  let container = Container::new();
  container.bind(Name("bob".to_string()));

  let result = container.invoke(|_: Name| {}, args![]).unwrap();

  assert!(result.is_none());
}

#[test]
fn test_invoke_returns_first_value() {
  let container = Container::new();

  let produced = container.invoke(|| 5u32, args![]).unwrap().unwrap();

  assert_eq!(produced.take::<u32>().unwrap(), 5);
}

#[test]
fn test_invoke_surfaces_target_error() {
  let container = Container::new();

  let err = container
    .invoke(
      || -> anyhow::Result<u32> { Err(anyhow::anyhow!("boom")) },
      args![],
    )
    .unwrap_err();

  assert!(matches!(err, InjectError::Target(_)));
  assert_eq!(err.to_string(), "boom");
}

#[test]
fn test_invoke_ok_result_yields_value() {
  let container = Container::new();

  let value = container
    .invoke_as::<u32, _, _>(|| -> Result<u32, std::io::Error> { Ok(7) }, args![])
    .unwrap();

  assert_eq!(value, 7);
}

#[test]
fn test_invoke_as_reports_type_mismatch() {
  let container = Container::new();

  let err = container
    .invoke_as::<String, _, _>(|| 5u32, args![])
    .unwrap_err();

  let message = err.to_string();
  assert!(matches!(err, InjectError::TypeMismatch { .. }));
  assert!(message.contains("unable to convert return value to expected type"), "{message}");
  assert!(message.contains("u32"), "{message}");
}

#[test]
fn test_invoke_as_unit_for_function_without_value() {
  let container = Container::new();

  container.invoke_as::<(), _, _>(|| {}, args![]).unwrap();
}

#[test]
fn test_container_can_be_injected() {
  // Arrange
  let container = Container::new();
  container.bind(Name("carol".to_string()));

  // Act
  let local = container
    .invoke_as::<usize, _, _>(|injected: Container| injected.len(), args![])
    .unwrap();
  let shared = container.resolve::<Arc<Container>>().unwrap();

  // Assert
  assert_eq!(local, 1);
  assert!(shared.contains::<Name>());
}

#[test]
#[should_panic(expected = "unresolved")]
fn test_must_resolve_panics_on_missing_dependency() {
  struct Missing;
  Container::new().must_resolve::<Arc<Missing>>();
}

#[test]
#[should_panic(expected = "unresolved")]
fn test_must_invoke_panics_on_missing_dependency() {
  Container::new().must_invoke::<String, _, _>(|name: Name| name.0, args![]);
}

#[test]
#[should_panic(expected = "provider must return a value")]
fn test_register_rejects_provider_without_value() {
  Container::new().register(|_: Name| {});
}
