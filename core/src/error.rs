//! Error types for the todo client and store.
//!
//! # Design
//! `ApiError` describes what went wrong on one remote round-trip. `NotFound`
//! gets a dedicated variant because callers frequently distinguish "the
//! resource does not exist" from "the server returned an unexpected status."
//!
//! `StoreError` wraps an `ApiError` with the store operation that failed and
//! the target it was aimed at. Both are `Clone` so the store can hand out the
//! last recorded failure while also returning it to the caller.

use thiserror::Error;

use crate::types::{CreateTodo, MessageError, TodoId, UpdateTodo};

/// Errors produced by a single request/response exchange.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server returned 404 for the requested todo.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The request never produced a response (connect, DNS, reset, ...).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),
}

/// A failed store operation, recorded in `TodoStore::error`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("failed to load todos from {url}: {source}")]
    LoadFailed {
        url: String,
        #[source]
        source: ApiError,
    },

    #[error("failed to create todo {:?}: {source}", .payload.message)]
    CreateFailed {
        payload: CreateTodo,
        #[source]
        source: ApiError,
    },

    #[error("failed to update todo {id}: {source}")]
    UpdateFailed {
        id: TodoId,
        patch: UpdateTodo,
        #[source]
        source: ApiError,
    },

    #[error("failed to delete todo {id}: {source}")]
    DeleteFailed {
        id: TodoId,
        #[source]
        source: ApiError,
    },

    /// Rejected locally; no request was issued.
    #[error("invalid todo message: {0}")]
    InvalidMessage(#[from] MessageError),
}

impl StoreError {
    /// The remote failure underneath, if the operation reached the network.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            StoreError::LoadFailed { source, .. }
            | StoreError::CreateFailed { source, .. }
            | StoreError::UpdateFailed { source, .. }
            | StoreError::DeleteFailed { source, .. } => Some(source),
            StoreError::InvalidMessage(_) => None,
        }
    }

    /// The todo this failure was aimed at, for update and delete.
    pub fn target_id(&self) -> Option<TodoId> {
        match self {
            StoreError::UpdateFailed { id, .. } | StoreError::DeleteFailed { id, .. } => Some(*id),
            _ => None,
        }
    }
}
