//! The main `Container` struct and its associated methods.

use crate::combinator::singleton;
use crate::core::{Provide, Registered, ResolutionGuard, TypeKey};
use crate::error::{InjectError, Result};
use crate::injectable::{Arguments, Call, Injectable, Signature};
use crate::instance::{Instance, SharedValue};
use crate::param::{Output, Param};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::any::{type_name, Any};
use std::fmt;
use std::panic::Location;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, trace};

static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(1);

/// The dependency resolution container.
///
/// A container maps base types to providers: functions (or bound values)
/// that produce a value of that type, resolving their own parameters through
/// the same container. Types without a local provider are looked up in the
/// parent containers, in order.
///
/// `Container` is a cheap handle; clones share the same registrations. It is
/// thread-safe, and registration may happen at any time, though the intended
/// pattern is to register during setup and resolve afterwards.
#[derive(Clone)]
pub struct Container {
  inner: Arc<Inner>,
}

struct Inner {
  id: u64,
  strict: bool,
  providers: DashMap<TypeKey, Arc<dyn Provide>>,
  parents: Vec<Container>,
}

impl Default for Container {
  fn default() -> Self {
    Self::builder().build()
  }
}

/// Configures a [`Container`] before it is created.
#[derive(Default)]
pub struct ContainerBuilder {
  parents: Vec<Container>,
  strict: bool,
}

impl ContainerBuilder {
  /// Appends a parent to consult when a type has no local provider.
  pub fn parent(mut self, parent: Container) -> Self {
    self.parents.push(parent);
    self
  }

  pub fn parents(mut self, parents: impl IntoIterator<Item = Container>) -> Self {
    self.parents.extend(parents);
    self
  }

  /// In strict mode, registering a second provider for a type that already
  /// has one panics instead of replacing it.
  pub fn strict(mut self, strict: bool) -> Self {
    self.strict = strict;
    self
  }

  pub fn build(self) -> Container {
    Container {
      inner: Arc::new(Inner {
        id: NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed),
        strict: self.strict,
        providers: DashMap::new(),
        parents: self.parents,
      }),
    }
  }
}

/// A bound value, served as a zero-argument provider.
struct Bound {
  value: SharedValue,
  signature: Signature,
}

impl Provide for Bound {
  fn provide(&self, _container: &Container) -> Result<Option<Instance>> {
    Ok(Some(self.value.clone().into_instance()))
  }

  fn signature(&self) -> Signature {
    self.signature.clone()
  }
}

impl Container {
  /// Creates a new, empty `Container` without parents.
  pub fn new() -> Self {
    Self::default()
  }

  /// Creates a new, empty `Container` delegating to `parents` on a miss.
  pub fn with_parents(parents: impl IntoIterator<Item = Container>) -> Self {
    Self::builder().parents(parents).build()
  }

  pub fn builder() -> ContainerBuilder {
    ContainerBuilder::default()
  }

  /// Creates a new, empty `Container` whose only parent is `self`.
  pub fn child(&self) -> Self {
    Self::with_parents([self.clone()])
  }

  // --- PRIVATE HELPERS ---

  fn insert(&self, key: TypeKey, provider: Arc<dyn Provide>) {
    match self.inner.providers.entry(key) {
      Entry::Occupied(mut entry) => {
        if self.inner.strict {
          panic!(
            "a provider for '{}' is already registered: {} (rejected: {})",
            key,
            entry.get().signature(),
            provider.signature()
          );
        }
        debug!(container = self.inner.id, %key, "replacing existing provider");
        entry.insert(provider);
      }
      Entry::Vacant(entry) => {
        debug!(container = self.inner.id, %key, "registered provider");
        entry.insert(provider);
      }
    }
  }

  fn local(&self, key: &TypeKey) -> Option<Arc<dyn Provide>> {
    // Clone the provider out so no shard lock is held while it runs.
    self
      .inner
      .providers
      .get(key)
      .map(|entry| Arc::clone(entry.value()))
  }

  fn invoke_at<P, Args>(
    &self,
    f: &P,
    args: Arguments,
    location: &'static Location<'static>,
  ) -> Result<Option<Instance>>
  where
    P: Injectable<Args>,
  {
    let mut call = Call::new(self, args, location);
    let result = f.call(&mut call);
    if call.remaining() > 0 {
      debug!(
        container = self.inner.id,
        unused = call.remaining(),
        "positional arguments left unconsumed"
      );
    }
    result
  }

  // --- PUBLIC API ---

  // --- Registration ---

  /// Registers a provider under the base type of its return value.
  ///
  /// The provider's own parameters are resolved from this container each
  /// time it runs. A later registration for the same type replaces this one
  /// (unless the container is strict).
  ///
  /// # Panics
  ///
  /// Panics if the provider returns nothing (`()` or `Result<(), E>`), or if
  /// the container is strict and the type already has a provider.
  #[track_caller]
  pub fn register<P, Args>(&self, provider: P) -> &Self
  where
    P: Injectable<Args> + Send + Sync + 'static,
    Args: 'static,
  {
    let location = Location::caller();
    let Some(key) = provider.output_key() else {
      panic!(
        "provider must return a value, or a value and an error, but returns nothing: {}",
        provider.signature().at(location)
      );
    };
    self.insert(key, Arc::new(Registered::new(provider, location)));
    self
  }

  /// Registers a provider wrapped in [`singleton`].
  #[track_caller]
  pub fn register_singleton<P, Args>(&self, provider: P) -> &Self
  where
    P: Injectable<Args> + Send + Sync + 'static,
    Args: 'static,
  {
    self.register(singleton(provider))
  }

  /// Binds a value directly. Every resolution of its type is served from
  /// this one value: shared requests receive the same `Arc`, owned requests
  /// receive a clone.
  ///
  /// # Panics
  ///
  /// Panics if `value` is `()` or an `Err`.
  #[track_caller]
  pub fn bind<V: Output>(&self, value: V) -> &Self {
    let location = Location::caller();
    let Some(key) = V::key() else {
      panic!("cannot bind a value of type {}", type_name::<V>());
    };
    let instance = match value.into_instance() {
      Ok(Some(instance)) => instance,
      Ok(None) => panic!("cannot bind a value of type {}", type_name::<V>()),
      Err(err) => panic!("cannot bind a failed value of type {}: {}", type_name::<V>(), err),
    };
    let value = match instance.into_shared_value() {
      Ok(value) => value,
      Err(instance) => panic!("cannot share a bound value of type {}", instance.type_name()),
    };
    let signature = Signature::new("bind", Vec::new(), type_name::<V>()).at(location);
    self.insert(key, Arc::new(Bound { value, signature }));
    self
  }

  /// Returns `true` if this container itself has a provider for `T`.
  /// Parents are not consulted.
  pub fn contains<T: ?Sized + Any>(&self) -> bool {
    self.inner.providers.contains_key(&TypeKey::of::<T>())
  }

  /// The number of providers registered directly in this container.
  pub fn len(&self) -> usize {
    self.inner.providers.len()
  }

  pub fn is_empty(&self) -> bool {
    self.inner.providers.is_empty()
  }

  pub fn parents(&self) -> &[Container] {
    &self.inner.parents
  }

  // --- Resolution ---

  /// Resolves the value for a base type, without shape conversion.
  ///
  /// A request for `Container` itself returns this container. Otherwise the
  /// local provider runs if there is one; if not, each parent is tried in
  /// order. A parent that reports [`InjectError::Unresolved`] is skipped,
  /// any other error ends the search.
  pub fn resolve_key(&self, key: &TypeKey) -> Result<Instance> {
    if key.is::<Container>() {
      return Ok(Instance::new(self.clone()));
    }

    if let Some(provider) = self.local(key) {
      let _guard = ResolutionGuard::enter(self.inner.id, *key)?;
      trace!(container = self.inner.id, %key, "resolving from local provider");
      return provider
        .provide(self)?
        .ok_or(InjectError::Unresolved {
          type_name: key.name(),
        });
    }

    for parent in &self.inner.parents {
      match parent.resolve_key(key) {
        Err(err) if err.is_unresolved() => {
          trace!(container = self.inner.id, parent = parent.inner.id, %key, "not found in parent");
        }
        result => return result,
      }
    }

    Err(InjectError::Unresolved {
      type_name: key.name(),
    })
  }

  /// Resolves a dependency in the shape `P` asks for: `Arc<T>` for a shared
  /// handle, `T` or `Owned<T>` for a value.
  pub fn resolve<P: Param>(&self) -> Result<P> {
    P::resolve(self)
  }

  /// Like [`resolve`](Self::resolve), but panics on failure. Meant for
  /// startup wiring, where a missing dependency is a configuration bug.
  #[track_caller]
  pub fn must_resolve<P: Param>(&self) -> P {
    match self.resolve::<P>() {
      Ok(value) => value,
      Err(err) => {
        error!(error = %err, "failed to resolve required dependency");
        panic!("{err}")
      }
    }
  }

  // --- Invocation ---

  /// Calls `f`, filling each parameter in order: from the next positional
  /// argument if it fits the parameter's type, otherwise by resolution.
  ///
  /// The first parameter that cannot be resolved aborts the call with an
  /// [`InjectError::Argument`] naming its 1-based position and `f`'s
  /// signature. If `f` returns `Err`, that becomes [`InjectError::Target`].
  #[track_caller]
  pub fn invoke<P, Args>(&self, f: P, args: Arguments) -> Result<Option<Instance>>
  where
    P: Injectable<Args>,
  {
    self.invoke_at(&f, args, Location::caller())
  }

  /// Like [`invoke`](Self::invoke), then downcasts the produced value to
  /// exactly `T`.
  #[track_caller]
  pub fn invoke_as<T: Any, P, Args>(&self, f: P, args: Arguments) -> Result<T>
  where
    P: Injectable<Args>,
  {
    let location = Location::caller();
    // A function producing nothing still satisfies `T = ()`.
    let instance = self
      .invoke_at(&f, args, location)?
      .unwrap_or_else(|| Instance::new(()));
    instance
      .take::<T>()
      .map_err(|instance| InjectError::TypeMismatch {
        target: format!("{} as {}", f.signature().at(location), type_name::<T>()),
        actual: instance.type_name(),
      })
  }

  /// Like [`invoke_as`](Self::invoke_as), but panics on failure.
  #[track_caller]
  pub fn must_invoke<T: Any, P, Args>(&self, f: P, args: Arguments) -> T
  where
    P: Injectable<Args>,
  {
    match self.invoke_as::<T, P, Args>(f, args) {
      Ok(value) => value,
      Err(err) => {
        error!(error = %err, "failed to invoke function");
        panic!("{err}")
      }
    }
  }
}

impl fmt::Debug for Container {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let parents: Vec<u64> = self.inner.parents.iter().map(|parent| parent.inner.id).collect();
    f.debug_struct("Container")
      .field("id", &self.inner.id)
      .field("strict", &self.inner.strict)
      .field("providers", &self.inner.providers.len())
      .field("parents", &parents)
      .finish()
  }
}
