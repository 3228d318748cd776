use crate::error::ApiError;
use crate::models::{
    CreateTodoRequest, DeleteManyResponse, HealthBody, ListQuery, MessageResponse,
    UpdateTodoRequest,
};
use crate::state::AppState;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use domain::{Todo, TodoFilter, TodoId, TodoStats};
use tracing::info;

/// ヘルスチェック
pub async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

/// GET /todos?filter=all|active|completed
/// 不正なクエリや未知の filter は all として扱う
pub async fn list_todos(
    State(state): State<AppState>,
    query: Option<Query<ListQuery>>,
) -> Result<Json<Vec<Todo>>, ApiError> {
    let filter = TodoFilter::from_query(
        query
            .as_ref()
            .and_then(|Query(q)| q.filter.as_deref()),
    );

    let todos = state
        .store
        .find_all(filter)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to fetch todos"))?;

    Ok(Json(todos))
}

/// GET /todos/stats
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<TodoStats>, ApiError> {
    let stats = state
        .store
        .count()
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to fetch statistics"))?;

    Ok(Json(stats))
}

/// POST /todos
pub async fn create_todo(
    State(state): State<AppState>,
    payload: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let Json(request) = payload?;
    let text = request.validate()?;

    let todo = state
        .store
        .create(text)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to create todo"))?;

    info!(todo_id = %todo.id, "ToDo作成");
    Ok((StatusCode::CREATED, Json(todo)))
}

/// PUT /todos/:id
pub async fn update_todo(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> Result<Json<Todo>, ApiError> {
    let Path(id) = path?;
    let id = TodoId::parse(&id)?;
    let Json(request) = payload?;
    let patch = request.into_patch()?;

    let todo = state
        .store
        .update_by_id(&id, patch)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to update todo"))?;

    Ok(Json(todo))
}

/// DELETE /todos
pub async fn delete_all_todos(
    State(state): State<AppState>,
) -> Result<Json<DeleteManyResponse>, ApiError> {
    let deleted_count = state
        .store
        .delete_all()
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to delete all todos"))?;

    info!(deleted_count, "全ToDo削除");
    Ok(Json(DeleteManyResponse {
        message: "All todos deleted".to_string(),
        deleted_count,
    }))
}

/// DELETE /todos/completed
pub async fn delete_completed_todos(
    State(state): State<AppState>,
) -> Result<Json<DeleteManyResponse>, ApiError> {
    let deleted_count = state
        .store
        .delete_completed()
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to delete completed todos"))?;

    info!(deleted_count, "完了済みToDo削除");
    Ok(Json(DeleteManyResponse {
        message: format!("{deleted_count} completed todos deleted successfully"),
        deleted_count,
    }))
}

/// DELETE /todos/:id
pub async fn delete_todo(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(id) = path?;
    let id = TodoId::parse(&id)?;

    state
        .store
        .delete_by_id(&id)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to delete todo"))?;

    Ok(Json(MessageResponse {
        message: "Todo deleted successfully".to_string(),
    }))
}

/// 未定義のルート
pub async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}
