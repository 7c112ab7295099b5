//! Provider wrappers that change how a provider's value is produced.

use crate::core::TypeKey;
use crate::error::{InjectError, Result};
use crate::injectable::{Call, Injectable, Signature};
use crate::instance::{Instance, Recorded};
use once_cell::sync::OnceCell;
use std::any::{type_name, Any};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// A provider that runs its inner provider once and then keeps serving the
/// same outcome. See [`singleton`].
pub struct Singleton<P> {
  provider: P,
  cell: OnceCell<std::result::Result<Option<Recorded>, Arc<InjectError>>>,
}

/// Wraps `provider` so it is called at most once.
///
/// The first call records the outcome; every later call returns it without
/// running the provider or resolving its parameters again. The produced value
/// keeps its shape: a provider returning `Foo` still produces a `Foo` (a
/// copy of the recorded one), while shared requests receive the same `Arc`
/// each time. A failure is recorded too and returned as
/// [`InjectError::Memoized`] on every call. Concurrent first calls block on
/// each other and the provider still runs only once.
///
/// There is no way to reset the recorded outcome; it lives as long as the
/// wrapper does.
///
/// Cycle detection is per thread. Two singletons that depend on each other
/// and are first resolved from two threads at once wait on each other
/// forever instead of reporting [`InjectError::Circular`].
pub fn singleton<P>(provider: P) -> Singleton<P> {
  Singleton {
    provider,
    cell: OnceCell::new(),
  }
}

impl<P, Args> Injectable<Args> for Singleton<P>
where
  P: Injectable<Args>,
{
  fn signature(&self) -> Signature {
    self.provider.signature()
  }

  fn output_key(&self) -> Option<TypeKey> {
    self.provider.output_key()
  }

  fn call(&self, call: &mut Call<'_>) -> Result<Option<Instance>> {
    let recorded = self.cell.get_or_init(|| {
      let outcome = self.provider.call(call).and_then(|produced| match produced {
        Some(instance) => instance
          .record()
          .map(Some)
          .map_err(|instance| InjectError::TypeMismatch {
            target: self.provider.signature().to_string(),
            actual: instance.type_name(),
          }),
        None => Ok(None),
      });
      match &outcome {
        Ok(_) => debug!(provider = self.provider.signature().name(), "singleton initialised"),
        Err(err) => debug!(
          provider = self.provider.signature().name(),
          error = %err,
          "singleton failed; failure recorded"
        ),
      }
      outcome.map_err(Arc::new)
    });
    match recorded {
      Ok(value) => Ok(value.as_ref().map(Recorded::replay)),
      Err(err) => Err(InjectError::Memoized(Arc::clone(err))),
    }
  }
}

/// A provider whose value is passed through a decorator function. See
/// [`decorate`].
pub struct Decorated<P, D, T> {
  provider: P,
  decorator: D,
  _value: PhantomData<fn(T) -> T>,
}

/// Wraps `provider` so its value is passed through `decorator` on every call.
///
/// The decorator only runs when the produced value is exactly a `T`: a
/// provider returning `Arc<Foo>` needs a `Fn(Arc<Foo>) -> Arc<Foo>`, one
/// returning `Foo` a `Fn(Foo) -> Foo`. Any other value, and any error, passes
/// through untouched.
pub fn decorate<P, D, T>(provider: P, decorator: D) -> Decorated<P, D, T>
where
  D: Fn(T) -> T,
  T: Any + Send + Sync,
{
  Decorated {
    provider,
    decorator,
    _value: PhantomData,
  }
}

impl<P, D, T, Args> Injectable<Args> for Decorated<P, D, T>
where
  P: Injectable<Args>,
  D: Fn(T) -> T,
  T: Any + Send + Sync,
{
  fn signature(&self) -> Signature {
    self.provider.signature()
  }

  fn output_key(&self) -> Option<TypeKey> {
    self.provider.output_key()
  }

  fn call(&self, call: &mut Call<'_>) -> Result<Option<Instance>> {
    let Some(instance) = self.provider.call(call)? else {
      return Ok(None);
    };
    let (instance, decorated) = instance.map::<T>(&self.decorator);
    if !decorated {
      debug!(
        produced = instance.type_name(),
        expected = type_name::<T>(),
        "decorator skipped"
      );
    }
    Ok(Some(instance))
  }
}
