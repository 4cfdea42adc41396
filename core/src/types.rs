//! Domain DTOs for the todo API.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently.
//! Integration tests catch any schema drift between the two crates. Timestamps
//! are opaque strings: the store carries them through without interpreting them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on a todo message, counted in characters after trimming.
pub const MAX_MESSAGE_LEN: usize = 200;

/// Server-assigned todo identity.
pub type TodoId = i64;

/// A single todo item returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub message: String,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Request payload for creating a new todo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateTodo {
    pub message: String,
    #[serde(default)]
    pub completed: bool,
}

impl CreateTodo {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            completed: false,
        }
    }
}

/// Request payload for updating an existing todo. Only the fields present in
/// the JSON are applied; omitted fields remain unchanged on the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateTodo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl UpdateTodo {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            completed: None,
        }
    }

    pub fn completed(completed: bool) -> Self {
        Self {
            message: None,
            completed: Some(completed),
        }
    }
}

/// Why a message was refused before reaching the server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    #[error("message is empty")]
    Empty,

    #[error("message is {len} characters, limit is {max}")]
    TooLong { len: usize, max: usize },
}

/// Trim `raw` and check it against the message rules.
///
/// Returns the trimmed message on success.
pub fn validate_message(raw: &str) -> Result<String, MessageError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(MessageError::Empty);
    }
    let len = trimmed.chars().count();
    if len > MAX_MESSAGE_LEN {
        return Err(MessageError::TooLong {
            len,
            max: MAX_MESSAGE_LEN,
        });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn todo_uses_camel_case_timestamps() {
        let todo: Todo = serde_json::from_str(
            r#"{"id":7,"message":"A","completed":false,"createdAt":"t0","updatedAt":"t1"}"#,
        )
        .unwrap();
        assert_eq!(todo.created_at.as_deref(), Some("t0"));
        assert_eq!(todo.updated_at.as_deref(), Some("t1"));

        let json = serde_json::to_value(&todo).unwrap();
        assert_eq!(json["createdAt"], "t0");
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn todo_without_timestamps_omits_them() {
        let todo: Todo = serde_json::from_str(r#"{"id":1,"message":"A","completed":true}"#).unwrap();
        assert!(todo.created_at.is_none());
        let json = serde_json::to_value(&todo).unwrap();
        assert!(json.get("createdAt").is_none());
        assert!(json.get("updatedAt").is_none());
    }

    #[test]
    fn create_todo_defaults_completed_to_false() {
        let input: CreateTodo = serde_json::from_str(r#"{"message":"x"}"#).unwrap();
        assert!(!input.completed);
    }

    #[test]
    fn update_todo_skips_absent_fields() {
        let json = serde_json::to_value(UpdateTodo::completed(true)).unwrap();
        assert_eq!(json, serde_json::json!({"completed": true}));
    }

    #[test]
    fn validate_message_trims() {
        assert_eq!(validate_message("  Buy milk \n").unwrap(), "Buy milk");
    }

    #[test]
    fn validate_message_rejects_blank() {
        assert_eq!(validate_message(""), Err(MessageError::Empty));
        assert_eq!(validate_message("   "), Err(MessageError::Empty));
    }

    #[test]
    fn validate_message_counts_characters_not_bytes() {
        let at_limit = "é".repeat(MAX_MESSAGE_LEN);
        assert!(validate_message(&at_limit).is_ok());

        let over = "x".repeat(MAX_MESSAGE_LEN + 1);
        assert_eq!(
            validate_message(&over),
            Err(MessageError::TooLong { len: 201, max: 200 })
        );
    }
}
