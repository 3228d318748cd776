//! ToDo の REST API（axum）
//!
//! `/api/todos` 以下に一覧・集計・作成・更新・削除を提供します。

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::app;
pub use state::AppState;
