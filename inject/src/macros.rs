//! Public macros for declaring injectable types and building calls.

/// Declares value types that may appear directly as parameters and return
/// values of injected functions.
///
/// A declared type `T` is registered under its own key and resolved by
/// value: a provider returning `T` is handed over as-is, one returning
/// `Arc<T>` is cloned out of the `Arc`. Declared types must be
/// `Clone + Send + Sync + 'static`.
///
/// # Examples
///
/// ```
/// use fibre_inject::{injectable, Container};
///
/// #[derive(Clone)]
/// struct Name(String);
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Greeting(String);
///
/// injectable!(Name, Greeting);
///
/// let container = Container::new();
/// container.bind(Name("alice".to_string()));
/// container.register(|name: Name| Greeting(format!("hi {}", name.0)));
///
/// let greeting = container.must_resolve::<Greeting>();
/// assert_eq!(greeting, Greeting("hi alice".to_string()));
/// ```
#[macro_export]
macro_rules! injectable {
  ($($type:ty),+ $(,)?) => {
    $(
      impl $crate::Param for $type {
        fn key() -> $crate::TypeKey {
          $crate::TypeKey::of::<$type>()
        }

        fn from_instance(
          instance: $crate::Instance,
        ) -> ::std::result::Result<Self, $crate::Instance> {
          instance.into_value::<$type>()
        }
      }

      impl $crate::Output for $type {
        fn key() -> ::std::option::Option<$crate::TypeKey> {
          ::std::option::Option::Some($crate::TypeKey::of::<$type>())
        }

        fn into_instance(self) -> $crate::Result<::std::option::Option<$crate::Instance>> {
          ::std::result::Result::Ok(::std::option::Option::Some($crate::Instance::cloneable(self)))
        }
      }
    )+
  };
}

/// Builds positional [`Arguments`](crate::Arguments) for an invocation.
///
/// ```
/// use fibre_inject::{args, Container};
///
/// let container = Container::new();
/// let total = container
///   .invoke_as::<i64, _, _>(|a: i64, b: i64| a + b, args![40i64, 2i64])
///   .unwrap();
/// assert_eq!(total, 42);
/// ```
#[macro_export]
macro_rules! args {
  () => {
    $crate::Arguments::new()
  };
  ($($value:expr),+ $(,)?) => {
    $crate::Arguments::new()$(.arg($value))+
  };
}

/// Resolves a dependency from a container, panicking if it cannot be
/// resolved.
///
/// # Panics
///
/// Panics with the resolution error's message. For a non-panicking version,
/// use [`Container::resolve`](crate::Container::resolve) directly.
///
/// # Examples
///
/// ```
/// use fibre_inject::{resolve, Container};
/// use std::sync::Arc;
///
/// struct Settings {
///   verbose: bool,
/// }
///
/// let container = Container::new();
/// container.bind(Arc::new(Settings { verbose: true }));
///
/// let settings = resolve!(container, Arc<Settings>);
/// assert!(settings.verbose);
/// ```
#[macro_export]
macro_rules! resolve {
  ($container:expr, $type:ty) => {
    match $container.resolve::<$type>() {
      ::std::result::Result::Ok(value) => value,
      ::std::result::Result::Err(err) => {
        panic!(
          "Failed to resolve required service {}: {}",
          ::std::any::type_name::<$type>(),
          err
        )
      }
    }
  };
}
