//! Client-side todo store for a remote todo CRUD service.
//!
//! # Overview
//! `TodoStore` owns the in-memory todo collection, exposes derived views
//! (active, completed, count) and five async operations that round-trip to
//! the remote service before touching local state. Consumers observe changes
//! by subscribing a listener.
//!
//! # Design
//! - `TodoClient` is stateless: `build_*` produces an `HttpRequest`,
//!   `parse_*` consumes an `HttpResponse`. The wire format stays plain data.
//! - A `Transport` executes the round-trip. `ReqwestTransport` is the
//!   production one; tests script responses instead.
//! - The store is an explicit instance owned by the composition root, not a
//!   global.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.
//!
//! ```no_run
//! use todo_core::{ReqwestTransport, StoreConfig, TodoStore};
//!
//! # async fn run() -> Result<(), todo_core::StoreError> {
//! let store = TodoStore::open(StoreConfig::from_env(), ReqwestTransport::new()).await;
//! store.subscribe(|snapshot| println!("{} todos", snapshot.count()));
//!
//! if let Some(todo) = store.create_todo("Buy milk").await? {
//!     store.toggle_complete(todo.id).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod store;
pub mod transport;
pub mod types;

pub use client::TodoClient;
pub use config::StoreConfig;
pub use error::{ApiError, StoreError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use store::{StoreSnapshot, SubscriptionId, TodoStore};
pub use transport::{ReqwestTransport, Transport};
pub use types::{validate_message, CreateTodo, MessageError, Todo, TodoId, UpdateTodo, MAX_MESSAGE_LEN};
