//! Core, mostly non-public data structures for the container.

use crate::container::Container;
use crate::error::{InjectError, Result};
use crate::injectable::{Arguments, Call, Injectable, Signature};
use crate::instance::Instance;
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::panic::Location;

thread_local! {
  // The (container, type) pairs currently being resolved on this thread.
  // A container delegating to a parent for the same type is not a cycle, so
  // the container id is part of the entry.
  static RESOLVING_STACK: RefCell<HashSet<(u64, TypeKey)>> = RefCell::new(HashSet::new());
}

/// An RAII guard that detects circular dependencies.
///
/// Entering pushes `(container, key)` on the thread-local resolution stack and
/// fails if it is already there. Dropping the guard pops it again.
pub(crate) struct ResolutionGuard {
  entry: (u64, TypeKey),
}

impl ResolutionGuard {
  pub(crate) fn enter(container: u64, key: TypeKey) -> Result<Self> {
    let entry = (container, key);
    let inserted = RESOLVING_STACK.with(|stack| stack.borrow_mut().insert(entry));
    if !inserted {
      return Err(InjectError::Circular {
        type_name: key.name(),
      });
    }
    Ok(Self { entry })
  }
}

impl Drop for ResolutionGuard {
  fn drop(&mut self) {
    RESOLVING_STACK.with(|stack| {
      stack.borrow_mut().remove(&self.entry);
    });
  }
}

/// The identity of a type as the container sees it.
///
/// Keys are always built from the *base* type: a provider returning `Foo` and
/// one returning `Arc<Foo>` both register under the key of `Foo`. Equality and
/// hashing only look at the `TypeId`; the name is kept for diagnostics.
#[derive(Clone, Copy)]
pub struct TypeKey {
  id: TypeId,
  name: &'static str,
}

impl TypeKey {
  pub fn of<T: ?Sized + Any>() -> Self {
    Self {
      id: TypeId::of::<T>(),
      name: std::any::type_name::<T>(),
    }
  }

  pub fn name(&self) -> &'static str {
    self.name
  }

  pub(crate) fn is<T: ?Sized + Any>(&self) -> bool {
    self.id == TypeId::of::<T>()
  }
}

impl PartialEq for TypeKey {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id
  }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.id.hash(state);
  }
}

impl fmt::Debug for TypeKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Key({})", self.name)
  }
}

impl fmt::Display for TypeKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name)
  }
}

/// A registered provider with its parameter list erased.
pub(crate) trait Provide: Send + Sync {
  fn provide(&self, container: &Container) -> Result<Option<Instance>>;
  fn signature(&self) -> Signature;
}

/// Adapts any `Injectable` into a `Provide` by fixing its registration site
/// and calling it without positional arguments.
pub(crate) struct Registered<P, Args> {
  provider: P,
  location: &'static Location<'static>,
  _args: PhantomData<fn() -> Args>,
}

impl<P, Args> Registered<P, Args> {
  pub(crate) fn new(provider: P, location: &'static Location<'static>) -> Self {
    Self {
      provider,
      location,
      _args: PhantomData,
    }
  }
}

impl<P, Args> Provide for Registered<P, Args>
where
  P: Injectable<Args> + Send + Sync,
{
  fn provide(&self, container: &Container) -> Result<Option<Instance>> {
    let mut call = Call::new(container, Arguments::new(), self.location);
    self.provider.call(&mut call)
  }

  fn signature(&self) -> Signature {
    self.provider.signature().at(self.location)
  }
}
