//! Functions whose parameters are supplied by the container.

use crate::container::Container;
use crate::core::TypeKey;
use crate::error::{InjectError, Result};
use crate::instance::Instance;
use crate::param::{Output, Param};
use std::any::{type_name, Any};
use std::collections::VecDeque;
use std::fmt;
use std::panic::Location;

/// A callable the container can invoke, supplying its parameters.
///
/// Implemented for every `Fn(A1, .., An) -> R` with up to twelve parameters
/// where each `Ai: Param` and `R: Output`, and for the provider combinators.
/// `Args` is the tuple of parameter types; it only exists to keep the
/// implementations for different arities apart and is always inferred.
pub trait Injectable<Args> {
  /// Describes the callable for diagnostics.
  fn signature(&self) -> Signature;

  /// The base type of the produced value, or `None` if it produces nothing.
  fn output_key(&self) -> Option<TypeKey>;

  /// Fills the parameters from `call` and calls through.
  fn call(&self, call: &mut Call<'_>) -> Result<Option<Instance>>;
}

/// The state of a single invocation: the container parameters are resolved
/// from, the positional arguments not yet consumed, and the call site.
pub struct Call<'a> {
  container: &'a Container,
  args: Arguments,
  location: &'static Location<'static>,
}

impl<'a> Call<'a> {
  pub(crate) fn new(
    container: &'a Container,
    args: Arguments,
    location: &'static Location<'static>,
  ) -> Self {
    Self {
      container,
      args,
      location,
    }
  }

  /// Consumes the next positional argument if it fits `P`.
  ///
  /// Arguments are only ever tried front to back; a mismatch leaves the
  /// argument in place for the next slot.
  pub fn next_positional<P: Param>(&mut self) -> Option<P> {
    let next = self.args.values.pop_front()?;
    match P::from_instance(next) {
      Ok(value) => Some(value),
      Err(next) => {
        self.args.values.push_front(next);
        None
      }
    }
  }

  /// Fills a parameter slot: positional first, then by type.
  ///
  /// `position` is 1-based and only used to describe a failure.
  pub fn fill<P: Param>(&mut self, position: usize, signature: impl FnOnce() -> Signature) -> Result<P> {
    if let Some(value) = self.next_positional::<P>() {
      return Ok(value);
    }
    P::resolve(self.container).map_err(|source| {
      InjectError::argument(position, signature().at(self.location), source)
    })
  }

  pub(crate) fn remaining(&self) -> usize {
    self.args.len()
  }
}

/// Positional arguments for an invocation. See [`args!`](crate::args).
#[derive(Debug, Default)]
pub struct Arguments {
  values: VecDeque<Instance>,
}

impl Arguments {
  pub fn new() -> Self {
    Self::default()
  }

  /// Appends an argument, builder style.
  pub fn arg<T: Any + Send + Sync>(mut self, value: T) -> Self {
    self.push(value);
    self
  }

  pub fn push<T: Any + Send + Sync>(&mut self, value: T) {
    self.values.push_back(Instance::new(value));
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }
}

/// A printable description of an injected function: its name, parameter and
/// return types and, once known, the source location it was registered or
/// invoked at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
  name: &'static str,
  params: Vec<&'static str>,
  output: &'static str,
  location: Option<&'static Location<'static>>,
}

impl Signature {
  pub fn new(name: &'static str, params: Vec<&'static str>, output: &'static str) -> Self {
    Self {
      name,
      params,
      output,
      location: None,
    }
  }

  /// Attaches a source location, keeping an existing one.
  pub fn at(mut self, location: &'static Location<'static>) -> Self {
    self.location.get_or_insert(location);
    self
  }

  pub fn name(&self) -> &'static str {
    self.name
  }

  pub fn params(&self) -> &[&'static str] {
    &self.params
  }

  pub fn output(&self) -> &'static str {
    self.output
  }

  pub fn location(&self) -> Option<&'static Location<'static>> {
    self.location
  }
}

impl fmt::Display for Signature {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}({})", self.name, self.params.join(", "))?;
    if self.output != "()" {
      write!(f, " -> {}", self.output)?;
    }
    if let Some(location) = self.location {
      write!(f, " @ ({}:{})", location.file(), location.line())?;
    }
    Ok(())
  }
}

macro_rules! impl_injectable {
  ($($param:ident),*) => {
    impl<F, R, $($param,)*> Injectable<($($param,)*)> for F
    where
      F: Fn($($param),*) -> R,
      R: Output,
      $($param: Param,)*
    {
      fn signature(&self) -> Signature {
        Signature::new(
          type_name::<F>(),
          vec![$(type_name::<$param>()),*],
          type_name::<R>(),
        )
      }

      fn output_key(&self) -> Option<TypeKey> {
        <R as Output>::key()
      }

      #[allow(non_snake_case, unused_mut, unused_variables, unused_assignments)]
      fn call(&self, call: &mut Call<'_>) -> Result<Option<Instance>> {
        let mut position = 0;
        $(
          position += 1;
          let $param = call.fill::<$param>(position, || self.signature())?;
        )*
        (self)($($param),*).into_instance()
      }
    }
  };
}

impl_injectable!();
impl_injectable!(A1);
impl_injectable!(A1, A2);
impl_injectable!(A1, A2, A3);
impl_injectable!(A1, A2, A3, A4);
impl_injectable!(A1, A2, A3, A4, A5);
impl_injectable!(A1, A2, A3, A4, A5, A6);
impl_injectable!(A1, A2, A3, A4, A5, A6, A7);
impl_injectable!(A1, A2, A3, A4, A5, A6, A7, A8);
impl_injectable!(A1, A2, A3, A4, A5, A6, A7, A8, A9);
impl_injectable!(A1, A2, A3, A4, A5, A6, A7, A8, A9, A10);
impl_injectable!(A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11);
impl_injectable!(A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11, A12);

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn signature_renders_params_output_and_location() {
    let location = Location::caller();
    let signature = Signature::new("demo::build", vec!["u32", "alloc::string::String"], "bool")
      .at(location);

    let rendered = signature.to_string();
    assert!(rendered.starts_with("demo::build(u32, alloc::string::String) -> bool @ ("));
    assert!(rendered.contains(location.file()));
  }

  #[test]
  fn signature_omits_unit_output() {
    let signature = Signature::new("demo::run", vec![], "()");
    assert_eq!(signature.to_string(), "demo::run()");
  }

  #[test]
  fn positional_arguments_are_consumed_front_to_back() {
    let container = Container::new();
    let mut call = Call::new(&container, Arguments::new().arg(1u8).arg(2u16), Location::caller());

    // A u16 slot does not skip over the leading u8.
    assert_eq!(call.next_positional::<u16>(), None);
    assert_eq!(call.next_positional::<u8>(), Some(1));
    assert_eq!(call.next_positional::<u16>(), Some(2));
    assert_eq!(call.remaining(), 0);
  }
}
