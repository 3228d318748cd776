use domain::{DomainError, TodoPatch, TodoText};
use serde::{Deserialize, Serialize};

/// GET /todos のクエリ
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub filter: Option<String>,
}

/// POST /todos リクエスト
#[derive(Debug, Deserialize)]
pub struct CreateTodoRequest {
    #[serde(default)]
    pub text: Option<String>,
}

impl CreateTodoRequest {
    pub fn validate(&self) -> Result<TodoText, DomainError> {
        TodoText::parse(self.text.as_deref().unwrap_or_default())
    }
}

/// PUT /todos/:id リクエスト。指定されたフィールドのみ更新する
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTodoRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
}

impl UpdateTodoRequest {
    pub fn into_patch(self) -> Result<TodoPatch, DomainError> {
        let mut patch = TodoPatch::new();
        if let Some(text) = self.text {
            patch = patch.with_text(TodoText::parse(&text)?);
        }
        if let Some(completed) = self.completed {
            patch = patch.with_completed(completed);
        }
        Ok(patch)
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// 一括削除のレスポンス
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteManyResponse {
    pub message: String,
    pub deleted_count: u64,
}

#[derive(Debug, Serialize)]
pub struct HealthBody {
    /// サービスの簡易ステータス
    pub status: &'static str,
}
