//! Type-erased values moving between providers and consumers.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

type AnyBox = Box<dyn Any + Send + Sync>;

/// A value produced by a provider or invoked function, with its type erased.
///
/// An instance is either *owned* (a plain `T`) or *shared* (an `Arc<T>`).
/// Consumers pick the shape they want; the conversions between the two follow
/// these rules:
///
/// - same shape: the value is handed over unchanged;
/// - owned to shared: the value is moved into a fresh `Arc`;
/// - shared to owned: the `Arc` is unwrapped, cloning the value if other
///   handles to it are still alive.
pub struct Instance {
  repr: Repr,
  type_name: &'static str,
}

enum Repr {
  Owned {
    value: AnyBox,
    share: fn(AnyBox) -> Result<SharedValue, AnyBox>,
  },
  // `owned` marks a value produced as a plain `T` but kept in shared storage.
  // It still behaves as a `T`, and shared requests see the stored `Arc`.
  Shared { value: SharedValue, owned: bool },
}

/// A shared value that can be handed out any number of times.
///
/// `slot` holds the `Arc<T>` itself (not `T`), so cloning a `SharedValue`
/// never touches the value. `unpack` knows the concrete `T` and produces a
/// boxed `Arc<T>` clone from the slot; `restore`, when `T: Clone` was known,
/// produces an owned copy of `T`.
#[derive(Clone)]
pub(crate) struct SharedValue {
  slot: Arc<dyn Any + Send + Sync>,
  unpack: fn(&(dyn Any + Send + Sync + 'static)) -> Option<AnyBox>,
  restore: Option<fn(&(dyn Any + Send + Sync + 'static)) -> Option<Instance>>,
  type_name: &'static str,
}

impl SharedValue {
  fn new<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
    Self {
      slot: Arc::new(value),
      unpack: unpack_shared::<T>,
      restore: None,
      type_name: type_name::<Arc<T>>(),
    }
  }

  fn unpack(&self) -> Option<AnyBox> {
    (self.unpack)(&*self.slot)
  }

  fn restore(&self) -> Option<Instance> {
    self.restore.and_then(|restore| restore(&*self.slot))
  }

  pub(crate) fn into_instance(self) -> Instance {
    Instance {
      type_name: self.type_name,
      repr: Repr::Shared {
        value: self,
        owned: false,
      },
    }
  }
}

/// A produced value kept for repeated hand-out in the shape it was produced
/// in. Replaying an owned value yields a fresh clone of it, replaying a
/// shared one the same `Arc`.
#[derive(Clone)]
pub(crate) struct Recorded {
  value: SharedValue,
  owned: bool,
  type_name: &'static str,
}

impl Recorded {
  pub(crate) fn replay(&self) -> Instance {
    Instance {
      type_name: self.type_name,
      repr: Repr::Shared {
        value: self.value.clone(),
        owned: self.owned,
      },
    }
  }
}

fn unpack_shared<T: ?Sized + Send + Sync + 'static>(
  slot: &(dyn Any + Send + Sync + 'static),
) -> Option<AnyBox> {
  slot
    .downcast_ref::<Arc<T>>()
    .map(|shared| Box::new(Arc::clone(shared)) as AnyBox)
}

fn restore_owned<T: Any + Clone + Send + Sync>(
  slot: &(dyn Any + Send + Sync + 'static),
) -> Option<Instance> {
  slot
    .downcast_ref::<Arc<T>>()
    .map(|shared| Instance::cloneable(T::clone(shared)))
}

fn share_owned<T: Any + Send + Sync>(value: AnyBox) -> Result<SharedValue, AnyBox> {
  value.downcast::<T>().map(|value| SharedValue::new(Arc::new(*value)))
}

fn share_cloneable<T: Any + Clone + Send + Sync>(value: AnyBox) -> Result<SharedValue, AnyBox> {
  share_owned::<T>(value).map(|shared| SharedValue {
    restore: Some(restore_owned::<T>),
    ..shared
  })
}

impl Instance {
  /// Wraps an owned value.
  pub fn new<T: Any + Send + Sync>(value: T) -> Self {
    Self {
      repr: Repr::Owned {
        value: Box::new(value),
        share: share_owned::<T>,
      },
      type_name: type_name::<T>(),
    }
  }

  /// Wraps an owned value that can be copied. Unlike [`new`](Self::new), the
  /// value keeps behaving as an owned `T` after it has been recorded by a
  /// [`singleton`](crate::singleton).
  pub fn cloneable<T: Any + Clone + Send + Sync>(value: T) -> Self {
    Self {
      repr: Repr::Owned {
        value: Box::new(value),
        share: share_cloneable::<T>,
      },
      type_name: type_name::<T>(),
    }
  }

  /// Wraps a shared value. `T` may be unsized, e.g. `dyn Trait`.
  pub fn shared<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
    SharedValue::new(value).into_instance()
  }

  /// The concrete type name of the carried value.
  pub fn type_name(&self) -> &'static str {
    self.type_name
  }

  pub fn is_shared(&self) -> bool {
    matches!(self.repr, Repr::Shared { owned: false, .. })
  }

  /// Extracts the carried value as exactly `T`, without shape conversion.
  ///
  /// For a shared instance `T` has to be the `Arc` type itself. On mismatch
  /// the instance is handed back untouched.
  pub fn take<T: Any>(self) -> Result<T, Self> {
    let Instance { repr, type_name } = self;
    match repr {
      Repr::Owned { value, share } => match value.downcast::<T>() {
        Ok(value) => Ok(*value),
        Err(value) => Err(Instance {
          repr: Repr::Owned { value, share },
          type_name,
        }),
      },
      Repr::Shared { value, owned: false } => {
        match value.unpack().map(|unpacked| unpacked.downcast::<T>()) {
          Some(Ok(unpacked)) => Ok(*unpacked),
          _ => Err(value.into_instance()),
        }
      }
      Repr::Shared { value, owned: true } => {
        match value.restore().map(|restored| restored.take::<T>()) {
          Some(Ok(restored)) => Ok(restored),
          _ => Err(Instance {
            repr: Repr::Shared { value, owned: true },
            type_name,
          }),
        }
      }
    }
  }

  /// Extracts the value as an `Arc<T>`, moving an owned `T` into fresh
  /// storage if needed.
  pub fn into_arc<T: ?Sized + Send + Sync + 'static>(self) -> Result<Arc<T>, Self> {
    match self.take::<Arc<T>>() {
      Ok(shared) => Ok(shared),
      Err(instance) => instance.into_shared().take::<Arc<T>>(),
    }
  }

  /// Extracts the value as an owned `T`, cloning out of a shared `Arc<T>`
  /// when other handles still reference it.
  pub fn into_value<T: Any + Clone + Send + Sync>(self) -> Result<T, Self> {
    match self.take::<T>() {
      Ok(value) => Ok(value),
      Err(instance) => instance.take::<Arc<T>>().map(Arc::unwrap_or_clone),
    }
  }

  /// Converts an owned instance into a shared one. Shared instances are
  /// returned as they are.
  pub(crate) fn into_shared(self) -> Self {
    match self.into_shared_value() {
      Ok(shared) => shared.into_instance(),
      Err(instance) => instance,
    }
  }

  pub(crate) fn into_shared_value(self) -> Result<SharedValue, Self> {
    let Instance { repr, type_name } = self;
    match repr {
      Repr::Shared { value, .. } => Ok(value),
      Repr::Owned { value, share } => share(value).map_err(|value| Instance {
        repr: Repr::Owned { value, share },
        type_name,
      }),
    }
  }

  /// Moves the value into shared storage while remembering its shape.
  ///
  /// An owned value keeps its owned shape only if it was created with
  /// [`cloneable`](Self::cloneable); otherwise it is recorded as shared.
  pub(crate) fn record(self) -> Result<Recorded, Self> {
    let type_name = self.type_name;
    let owned = !self.is_shared();
    self.into_shared_value().map(|value| {
      let owned = owned && value.restore.is_some();
      Recorded {
        type_name: if owned { type_name } else { value.type_name },
        value,
        owned,
      }
    })
  }

  /// Replaces the carried value with `f(value)` if it is exactly a `T`,
  /// keeping the instance's shape. Returns the instance and whether `f` ran.
  pub(crate) fn map<T: Any + Send + Sync>(self, f: impl FnOnce(T) -> T) -> (Self, bool) {
    let Instance { repr, type_name } = self;
    match repr {
      Repr::Owned { value, share } => match value.downcast::<T>() {
        Ok(value) => {
          let repr = Repr::Owned {
            value: Box::new(f(*value)),
            share,
          };
          (Instance { repr, type_name }, true)
        }
        Err(value) => {
          let repr = Repr::Owned { value, share };
          (Instance { repr, type_name }, false)
        }
      },
      Repr::Shared { value: shared, owned: false } => {
        match shared.unpack().map(|value| value.downcast::<T>()) {
          // The slot stores the `Arc` itself, so a decorated `Arc` of the same
          // type can take its place under the same `unpack`.
          Some(Ok(value)) => {
            let mapped = SharedValue {
              slot: Arc::new(f(*value)),
              ..shared
            };
            (mapped.into_instance(), true)
          }
          _ => (shared.into_instance(), false),
        }
      }
      Repr::Shared { value: shared, owned: true } => {
        // A recorded owned value is decorated on a copy; the record stays.
        if let Some((mapped, true)) = shared.restore().map(|restored| restored.map(f)) {
          return (mapped, true);
        }
        let repr = Repr::Shared {
          value: shared,
          owned: true,
        };
        (Instance { repr, type_name }, false)
      }
    }
  }
}

impl fmt::Debug for Instance {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Instance")
      .field("type", &self.type_name)
      .field("shared", &self.is_shared())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, Clone, PartialEq)]
  struct Point {
    x: i32,
  }

  #[test]
  fn owned_value_converts_to_fresh_arc() {
    let instance = Instance::new(Point { x: 1 });
    let shared = instance.into_arc::<Point>().unwrap();
    assert_eq!(*shared, Point { x: 1 });
  }

  #[test]
  fn shared_value_keeps_identity_and_clones_for_owned_requests() {
    let original = Arc::new(Point { x: 2 });
    let shared = SharedValue::new(Arc::clone(&original));

    let again = shared.clone().into_instance().into_arc::<Point>().unwrap();
    assert!(Arc::ptr_eq(&original, &again));

    let owned = shared.into_instance().into_value::<Point>().unwrap();
    assert_eq!(owned, Point { x: 2 });
  }

  #[test]
  fn take_hands_back_mismatched_instance() {
    let instance = Instance::new(7u32);
    let instance = instance.take::<String>().unwrap_err();
    assert_eq!(instance.type_name(), "u32");
    assert_eq!(instance.take::<u32>().unwrap(), 7);
  }

  #[test]
  fn map_preserves_shape() {
    let (mapped, applied) = Instance::shared(Arc::new(Point { x: 3 }))
      .map(|point: Arc<Point>| Arc::new(Point { x: point.x * 10 }));
    assert!(applied);
    assert!(mapped.is_shared());
    assert_eq!(mapped.into_arc::<Point>().unwrap().x, 30);

    let (skipped, applied) = Instance::new(Point { x: 4 }).map(|s: String| s);
    assert!(!applied);
    assert_eq!(skipped.into_value::<Point>().unwrap().x, 4);
  }

  #[test]
  fn recorded_owned_value_replays_as_owned() {
    let recorded = Instance::cloneable(Point { x: 5 }).record().unwrap();

    let first = recorded.replay();
    assert!(!first.is_shared());
    assert_eq!(first.type_name(), type_name::<Point>());
    assert_eq!(first.take::<Point>().unwrap(), Point { x: 5 });

    // Shared requests all see the one recorded allocation.
    let a = recorded.replay().into_arc::<Point>().unwrap();
    let b = recorded.replay().into_arc::<Point>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    let (mapped, applied) = recorded.replay().map(|point: Point| Point { x: point.x + 1 });
    assert!(applied);
    assert_eq!(mapped.take::<Point>().unwrap(), Point { x: 6 });
    assert_eq!(recorded.replay().take::<Point>().unwrap(), Point { x: 5 });
  }

  #[test]
  fn recorded_value_without_clone_replays_as_shared() {
    let recorded = Instance::new(Point { x: 8 }).record().unwrap();

    let replayed = recorded.replay();
    assert!(replayed.is_shared());
    assert_eq!(replayed.into_arc::<Point>().unwrap().x, 8);
  }

  #[test]
  fn trait_objects_round_trip_through_shared_slot() {
    trait Named: Send + Sync {
      fn name(&self) -> &str;
    }
    struct Fixed;
    impl Named for Fixed {
      fn name(&self) -> &str {
        "fixed"
      }
    }

    let instance = Instance::shared::<dyn Named>(Arc::new(Fixed));
    let named = instance.into_arc::<dyn Named>().unwrap();
    assert_eq!(named.name(), "fixed");
  }
}
