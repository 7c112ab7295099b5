//! Parameter and return shapes understood by the container.

use crate::container::Container;
use crate::core::TypeKey;
use crate::error::{InjectError, Result};
use crate::instance::Instance;
use std::any::{type_name, Any};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// A type that can fill a parameter slot of an injected function.
///
/// The declared type selects the resolution mode: `Arc<T>` asks for a shared
/// handle, while `T` itself (or `Owned<T>`) asks for an owned value. Both are
/// served by the same provider, registered under the base type `T`.
pub trait Param: Sized + 'static {
  /// The base type this parameter is resolved by.
  fn key() -> TypeKey;

  /// Converts an instance into this parameter's shape, handing it back if
  /// the carried type does not fit.
  fn from_instance(instance: Instance) -> std::result::Result<Self, Instance>;

  /// Resolves this parameter through `container`.
  fn resolve(container: &Container) -> Result<Self> {
    let instance = container.resolve_key(&Self::key())?;
    Self::from_instance(instance).map_err(|instance| InjectError::TypeMismatch {
      target: type_name::<Self>().to_owned(),
      actual: instance.type_name(),
    })
  }
}

/// How the return value of an injected function is interpreted.
///
/// `()` produces nothing, `Result<R, E>` turns `Err` into
/// [`InjectError::Target`] and otherwise defers to `R`.
pub trait Output: 'static {
  /// The base type of the produced value, or `None` if nothing is produced.
  fn key() -> Option<TypeKey>;

  fn into_instance(self) -> Result<Option<Instance>>;
}

impl Output for () {
  fn key() -> Option<TypeKey> {
    None
  }

  fn into_instance(self) -> Result<Option<Instance>> {
    Ok(None)
  }
}

impl<R, E> Output for std::result::Result<R, E>
where
  R: Output,
  E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
  fn key() -> Option<TypeKey> {
    R::key()
  }

  fn into_instance(self) -> Result<Option<Instance>> {
    match self {
      Ok(value) => value.into_instance(),
      Err(err) => Err(InjectError::Target(err.into())),
    }
  }
}

impl<T: ?Sized + Send + Sync + 'static> Param for Arc<T> {
  fn key() -> TypeKey {
    TypeKey::of::<T>()
  }

  fn from_instance(instance: Instance) -> std::result::Result<Self, Instance> {
    instance.into_arc::<T>()
  }
}

impl<T: ?Sized + Send + Sync + 'static> Output for Arc<T> {
  fn key() -> Option<TypeKey> {
    Some(TypeKey::of::<T>())
  }

  fn into_instance(self) -> Result<Option<Instance>> {
    Ok(Some(Instance::shared(self)))
  }
}

/// Requests or produces a `T` by value.
///
/// Use this for types that have not been declared with
/// [`injectable!`](crate::injectable), e.g. types from other crates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Owned<T>(pub T);

impl<T> Owned<T> {
  pub fn into_inner(self) -> T {
    self.0
  }
}

impl<T> Deref for Owned<T> {
  type Target = T;

  fn deref(&self) -> &T {
    &self.0
  }
}

impl<T> DerefMut for Owned<T> {
  fn deref_mut(&mut self) -> &mut T {
    &mut self.0
  }
}

impl<T: Any + Clone + Send + Sync> Param for Owned<T> {
  fn key() -> TypeKey {
    TypeKey::of::<T>()
  }

  fn from_instance(instance: Instance) -> std::result::Result<Self, Instance> {
    match instance.take::<Owned<T>>() {
      Ok(owned) => Ok(owned),
      Err(instance) => instance.into_value::<T>().map(Owned),
    }
  }
}

impl<T: Any + Clone + Send + Sync> Output for Owned<T> {
  fn key() -> Option<TypeKey> {
    Some(TypeKey::of::<T>())
  }

  fn into_instance(self) -> Result<Option<Instance>> {
    Ok(Some(Instance::cloneable(self.0)))
  }
}

crate::injectable!(
  Container,
  String,
  &'static str,
  bool,
  char,
  i8,
  i16,
  i32,
  i64,
  i128,
  isize,
  u8,
  u16,
  u32,
  u64,
  u128,
  usize,
  f32,
  f64,
);
