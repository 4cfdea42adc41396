use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;

pub const MAX_MESSAGE_LEN: usize = 200;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: i64,
    pub message: String,
    pub completed: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Deserialize)]
pub struct CreateTodo {
    pub message: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Deserialize)]
pub struct UpdateTodo {
    pub message: Option<String>,
    pub completed: Option<bool>,
}

/// Ids increase monotonically, so `BTreeMap` order is insertion order.
#[derive(Default)]
pub struct Todos {
    next_id: i64,
    items: BTreeMap<i64, Todo>,
}

pub type Db = Arc<RwLock<Todos>>;

pub enum ApiError {
    NotFound,
    Invalid(&'static str),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND.into_response(),
            ApiError::Invalid(reason) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "error": reason }))).into_response()
            }
        }
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Todos::default()));
    Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/{id}", get(get_todo).patch(update_todo).delete(delete_todo))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn clean_message(raw: &str) -> Result<String, ApiError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Invalid("message must not be empty"));
    }
    if trimmed.chars().count() > MAX_MESSAGE_LEN {
        return Err(ApiError::Invalid("message exceeds 200 characters"));
    }
    Ok(trimmed.to_string())
}

async fn list_todos(State(db): State<Db>) -> Json<Vec<Todo>> {
    let todos = db.read().await;
    Json(todos.items.values().cloned().collect())
}

async fn create_todo(
    State(db): State<Db>,
    Json(input): Json<CreateTodo>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let message = clean_message(&input.message)?;
    let mut todos = db.write().await;
    todos.next_id += 1;
    let stamp = now();
    let todo = Todo {
        id: todos.next_id,
        message,
        completed: input.completed,
        created_at: stamp.clone(),
        updated_at: stamp,
    };
    todos.items.insert(todo.id, todo.clone());
    info!(id = todo.id, "todo created");
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn get_todo(State(db): State<Db>, Path(id): Path<i64>) -> Result<Json<Todo>, ApiError> {
    let todos = db.read().await;
    todos.items.get(&id).cloned().map(Json).ok_or(ApiError::NotFound)
}

async fn update_todo(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateTodo>,
) -> Result<Json<Todo>, ApiError> {
    let message = input.message.as_deref().map(clean_message).transpose()?;
    let mut todos = db.write().await;
    let todo = todos.items.get_mut(&id).ok_or(ApiError::NotFound)?;
    if let Some(message) = message {
        todo.message = message;
    }
    if let Some(completed) = input.completed {
        todo.completed = completed;
    }
    todo.updated_at = now();
    info!(id, "todo updated");
    Ok(Json(todo.clone()))
}

async fn delete_todo(State(db): State<Db>, Path(id): Path<i64>) -> Result<StatusCode, ApiError> {
    let mut todos = db.write().await;
    todos.items.remove(&id).ok_or(ApiError::NotFound)?;
    info!(id, "todo deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn todo_serializes_camel_case() {
        let todo = Todo {
            id: 1,
            message: "Test".to_string(),
            completed: false,
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
            updated_at: "2026-01-01T00:00:00.000Z".to_string(),
        };
        let json = serde_json::to_value(&todo).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["message"], "Test");
        assert_eq!(json["completed"], false);
        assert_eq!(json["createdAt"], "2026-01-01T00:00:00.000Z");
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn create_todo_defaults_completed_to_false() {
        let input: CreateTodo = serde_json::from_str(r#"{"message":"No completed field"}"#).unwrap();
        assert_eq!(input.message, "No completed field");
        assert!(!input.completed);
    }

    #[test]
    fn create_todo_rejects_missing_message() {
        let result: Result<CreateTodo, _> = serde_json::from_str(r#"{"completed":true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn update_todo_all_fields_optional() {
        let input: UpdateTodo = serde_json::from_str(r#"{}"#).unwrap();
        assert!(input.message.is_none());
        assert!(input.completed.is_none());
    }

    #[test]
    fn clean_message_trims_and_bounds() {
        assert_eq!(clean_message("  hi ").ok().as_deref(), Some("hi"));
        assert!(matches!(clean_message("   "), Err(ApiError::Invalid(_))));
        assert!(clean_message(&"x".repeat(MAX_MESSAGE_LEN)).is_ok());
        assert!(matches!(
            clean_message(&"x".repeat(MAX_MESSAGE_LEN + 1)),
            Err(ApiError::Invalid(_))
        ));
    }

    #[test]
    fn timestamps_are_rfc3339_utc() {
        let stamp = now();
        assert!(chrono::DateTime::parse_from_rfc3339(&stamp).is_ok());
        assert!(stamp.ends_with('Z'));
    }
}
