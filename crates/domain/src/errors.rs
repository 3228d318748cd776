use crate::todo::TodoId;
use thiserror::Error;

/// 入力値の検証エラー
///
/// 表示文字列はそのまま API のエラーレスポンスに使われる
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Todo text is required")]
    TextRequired,

    #[error("Todo text cannot exceed 500 characters")]
    TextTooLong { length: usize },

    #[error("Invalid todo ID")]
    InvalidTodoId(String),
}

/// ストア操作のエラー
#[derive(Debug, Clone, Error)]
pub enum TodoError {
    #[error("{0}")]
    Validation(#[from] DomainError),

    #[error("Todo not found: {0}")]
    NotFound(TodoId),

    #[error("Store error: {0}")]
    Store(String),
}

impl TodoError {
    pub fn store(message: impl Into<String>) -> Self {
        TodoError::Store(message.into())
    }
}
