//! # Fibre Inject
//!
//! A runtime, type-keyed dependency resolution container for Rust.
//!
//! Fibre Inject maps types to the functions (or bound values) that produce
//! them, and calls arbitrary functions by supplying their parameters from
//! those registrations. Calling code declares "I need a `T`" without knowing
//! how a `T` is built; construction can be deferred, shared, decorated or
//! overridden per call.
//!
//! ## Core Concepts
//!
//! - **Container**: holds providers keyed by base type, plus parent containers
//!   to consult when a type has no local provider.
//! - **Provider**: any `Fn` whose parameters are themselves injectable and
//!   whose return value is a `T`, an `Arc<T>`, or a `Result` of either.
//! - **Shapes**: a parameter declared as `Arc<T>` gets a shared handle, one
//!   declared as `T` (see [`injectable!`]) or [`Owned<T>`] gets a value. A
//!   single provider for `T` serves both.
//! - **Invocation**: [`Container::invoke`] fills parameters from positional
//!   arguments first, strictly in order, and resolves the rest.
//! - **Combinators**: [`singleton`] records a provider's outcome, [`decorate`]
//!   post-processes its value.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_inject::{args, injectable, singleton, Container};
//! use std::sync::Arc;
//!
//! #[derive(Clone)]
//! struct DatabaseUrl(String);
//!
//! struct Database {
//!   url: String,
//! }
//!
//! struct UserService {
//!   db: Arc<Database>,
//! }
//!
//! injectable!(DatabaseUrl);
//!
//! let container = Container::new();
//! container
//!   .bind(DatabaseUrl("postgres://localhost/app".to_string()))
//!   .register(singleton(|url: DatabaseUrl| Arc::new(Database { url: url.0 })))
//!   .register(|db: Arc<Database>| Arc::new(UserService { db }));
//!
//! let describe = container
//!   .invoke_as::<String, _, _>(
//!     |users: Arc<UserService>, prefix: &'static str| format!("{prefix} {}", users.db.url),
//!     args!["users at"],
//!   )
//!   .unwrap();
//! assert_eq!(describe, "users at postgres://localhost/app");
//! ```
//!
//! ## Errors
//!
//! Resolution and invocation errors are returned as [`InjectError`]. Mistakes
//! in wiring that can only be programmer errors (registering a provider that
//! returns nothing, overriding a registration in a strict container) panic at
//! registration time. The `must_*` methods and [`resolve!`] panic on any
//! error.
//!
//! ## Threading
//!
//! `Container` is `Send + Sync`. Providers are cloned out of the registry
//! before they run, so providers may resolve from the container they are
//! registered in. [`singleton`] guarantees its provider runs once even when
//! first resolved from several threads at the same time.
//!
//! Circular dependencies are detected per thread. Two singletons that depend
//! on each other and are first resolved concurrently from different threads
//! block on each other instead of failing with [`InjectError::Circular`].

mod combinator;
mod container;
mod core;
mod error;
mod injectable;
mod instance;
mod macros;
mod param;

pub use crate::core::TypeKey;
pub use combinator::{decorate, singleton, Decorated, Singleton};
pub use container::{Container, ContainerBuilder};
pub use error::{InjectError, Result};
pub use injectable::{Arguments, Call, Injectable, Signature};
pub use instance::Instance;
pub use param::{Output, Owned, Param};
