use crate::handlers::{
    create_todo, delete_all_todos, delete_completed_todos, delete_todo, get_stats, health,
    list_todos, route_not_found, update_todo,
};
use crate::middleware::trace_requests;
use crate::state::AppState;
use axum::routing::{delete, get, put};
use axum::Router;

/// API のベースパス
pub const TODOS_BASE_PATH: &str = "/api/todos";

/// ルータを構築して返します
///
/// 未対応のメソッドも含め、どのルートにも一致しなければ JSON の 404 を返す
pub fn app(state: AppState) -> Router {
    let collection = get(list_todos)
        .post(create_todo)
        .delete(delete_all_todos)
        .fallback(route_not_found);

    // 静的パス（stats / completed）は :id より優先される
    Router::new()
        .route("/health", get(health).fallback(route_not_found))
        .route(TODOS_BASE_PATH, collection.clone())
        .route(&format!("{TODOS_BASE_PATH}/"), collection)
        .route(
            &format!("{TODOS_BASE_PATH}/stats"),
            get(get_stats).fallback(route_not_found),
        )
        .route(
            &format!("{TODOS_BASE_PATH}/completed"),
            delete(delete_completed_todos).fallback(route_not_found),
        )
        .route(
            &format!("{TODOS_BASE_PATH}/:id"),
            put(update_todo).delete(delete_todo).fallback(route_not_found),
        )
        .fallback(route_not_found)
        .layer(axum::middleware::from_fn(trace_requests))
        .with_state(state)
}
