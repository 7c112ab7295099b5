use crate::injectable::Signature;
use std::sync::Arc;
use thiserror::Error;

/// The error type returned by resolution and invocation.
#[derive(Debug, Error)]
pub enum InjectError {
  /// No provider for the type exists in the container or any of its parents.
  #[error("unresolved: '{type_name}'")]
  Unresolved { type_name: &'static str },

  /// Filling a parameter of the target function failed.
  #[error("{source} while resolving argument {position} for {signature}")]
  Argument {
    position: usize,
    signature: Signature,
    source: Box<InjectError>,
  },

  /// The invoked function itself returned an error.
  #[error("{0}")]
  Target(Box<dyn std::error::Error + Send + Sync>),

  /// A typed wrapper received a value of a different type than it expected.
  #[error("unable to convert return value to expected type from: {target} got: {actual}")]
  TypeMismatch { target: String, actual: &'static str },

  /// A singleton's provider failed on its first call. The recorded failure
  /// is returned on every call.
  #[error(transparent)]
  Memoized(Arc<InjectError>),

  /// A provider (transitively) requested its own type while being constructed.
  #[error("circular dependency detected while resolving '{type_name}'")]
  Circular { type_name: &'static str },
}

impl InjectError {
  /// Returns `true` for a plain "not found" error.
  ///
  /// Wrapped errors do not count: a parent whose provider failed to fill a
  /// parameter reports a real failure, not a miss.
  pub fn is_unresolved(&self) -> bool {
    matches!(self, InjectError::Unresolved { .. })
  }

  /// Walks `Argument` and `Memoized` wrappers down to the error that started
  /// the failure.
  pub fn root(&self) -> &InjectError {
    match self {
      InjectError::Argument { source, .. } => source.root(),
      InjectError::Memoized(source) => source.root(),
      other => other,
    }
  }

  pub(crate) fn argument(position: usize, signature: Signature, source: InjectError) -> Self {
    InjectError::Argument {
      position,
      signature,
      source: Box::new(source),
    }
  }
}

/// A specialized `Result` type for `fibre_inject` operations.
pub type Result<T, E = InjectError> = std::result::Result<T, E>;
