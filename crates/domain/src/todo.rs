use crate::errors::DomainError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// ToDo本文の最大文字数（トリム後）
pub const MAX_TEXT_LENGTH: usize = 500;

/// ToDo の識別子（ULID）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(String);

impl TodoId {
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    /// 外部入力（URL パスなど）から生成する。ULID として解釈できなければエラー
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        ulid::Ulid::from_string(value)
            .map(|ulid| Self(ulid.to_string()))
            .map_err(|_| DomainError::InvalidTodoId(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn timestamp_ms(&self) -> Option<u64> {
        ulid::Ulid::from_string(&self.0)
            .ok()
            .map(|ulid| ulid.timestamp_ms())
    }
}

impl Default for TodoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 検証済みの ToDo 本文
///
/// 前後の空白を除去した上で 1〜500 文字であることを保証する。
/// 保存される本文は必ずこの型を経由する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TodoText(String);

impl TodoText {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::TextRequired);
        }

        let length = trimmed.chars().count();
        if length > MAX_TEXT_LENGTH {
            return Err(DomainError::TextTooLong { length });
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TodoText {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TodoText> for String {
    fn from(text: TodoText) -> Self {
        text.0
    }
}

impl fmt::Display for TodoText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ToDo レコード
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub text: TodoText,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// 新規作成。createdAt と updatedAt は同じ時刻になる
    pub fn new(text: TodoText, now: DateTime<Utc>) -> Self {
        Self {
            id: TodoId::new(),
            text,
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// 部分更新を適用し updatedAt を更新する
    ///
    /// updatedAt は必ず前回値より大きくなる（時計が進んでいなければ 1ms 進める）
    pub fn apply_patch(&mut self, patch: TodoPatch, now: DateTime<Utc>) {
        if let Some(text) = patch.text {
            self.text = text;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        self.touch(now);
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = next_updated_at(self.updated_at, now);
    }
}

/// 前回の updatedAt より必ず後になる更新時刻を返す
pub fn next_updated_at(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + Duration::milliseconds(1)
    }
}

/// 部分更新の内容。None のフィールドは変更しない
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub text: Option<TodoText>,
    pub completed: Option<bool>,
}

impl TodoPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: TodoText) -> Self {
        self.text = Some(text);
        self
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.completed.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> TodoText {
        TodoText::parse(value).unwrap()
    }

    #[test]
    fn test_todo_id_new_generates_26_char_string() {
        let todo_id = TodoId::new();
        let id_str = todo_id.as_str();

        // 26文字のBase32形式であることを確認
        assert_eq!(id_str.len(), 26);
        let valid_chars = "0123456789ABCDEFGHJKMNPQRSTVWXYZ";
        for c in id_str.chars() {
            assert!(valid_chars.contains(c), "Invalid character: {c}");
        }
        assert!(todo_id.timestamp_ms().is_some());
    }

    #[test]
    fn test_todo_id_parse() {
        let id = TodoId::new();
        assert_eq!(TodoId::parse(id.as_str()).unwrap(), id);

        assert_eq!(
            TodoId::parse("not-an-id"),
            Err(DomainError::InvalidTodoId("not-an-id".to_string()))
        );
        assert!(TodoId::parse("").is_err());
        // MongoDB 形式の ObjectId は受け付けない
        assert!(TodoId::parse("507f1f77bcf86cd799439011").is_err());
    }

    #[test]
    fn test_todo_text_trims_whitespace() {
        assert_eq!(text("  Buy milk \n").as_str(), "Buy milk");
    }

    #[test]
    fn test_todo_text_rejects_empty() {
        assert_eq!(TodoText::parse(""), Err(DomainError::TextRequired));
        assert_eq!(TodoText::parse("   "), Err(DomainError::TextRequired));
        assert_eq!(TodoText::parse("\t\n"), Err(DomainError::TextRequired));
    }

    #[test]
    fn test_todo_text_length_limit() {
        let max = "あ".repeat(MAX_TEXT_LENGTH);
        assert_eq!(text(&max).as_str().chars().count(), MAX_TEXT_LENGTH);

        // トリム後の文字数で判定する
        let padded = format!("  {}  ", "a".repeat(MAX_TEXT_LENGTH));
        assert!(TodoText::parse(&padded).is_ok());

        let too_long = "a".repeat(MAX_TEXT_LENGTH + 1);
        assert_eq!(
            TodoText::parse(&too_long),
            Err(DomainError::TextTooLong { length: 501 })
        );
    }

    #[test]
    fn test_todo_creation() {
        // Arrange
        let now = Utc::now();

        // Act
        let todo = Todo::new(text("テストTODO"), now);

        // Assert
        assert!(!todo.completed);
        assert_eq!(todo.created_at, todo.updated_at);
        assert_eq!(todo.text.as_str(), "テストTODO");
        assert_ne!(todo.id, Todo::new(text("別のTODO"), now).id);
    }

    #[test]
    fn test_apply_patch_completed_only() {
        // Arrange
        let created = Utc::now();
        let mut todo = Todo::new(text("Buy milk"), created);
        let before = todo.clone();

        // Act
        todo.apply_patch(
            TodoPatch::new().with_completed(true),
            created + Duration::seconds(1),
        );

        // Assert: completed と updatedAt のみ変わる
        assert!(todo.completed);
        assert_eq!(todo.text, before.text);
        assert_eq!(todo.created_at, before.created_at);
        assert_eq!(todo.id, before.id);
        assert!(todo.updated_at > before.updated_at);
    }

    #[test]
    fn test_apply_patch_updated_at_strictly_increases_with_stale_clock() {
        let created = Utc::now();
        let mut todo = Todo::new(text("Buy milk"), created);

        // 時計が進んでいない、または巻き戻った場合でも単調増加する
        todo.apply_patch(TodoPatch::new().with_text(text("Buy bread")), created);
        assert_eq!(todo.updated_at, created + Duration::milliseconds(1));

        let previous = todo.updated_at;
        todo.apply_patch(TodoPatch::new(), created - Duration::seconds(10));
        assert!(todo.updated_at > previous);
        assert!(todo.updated_at >= todo.created_at);
        assert_eq!(todo.text.as_str(), "Buy bread");
    }

    #[test]
    fn test_next_updated_at() {
        let previous = Utc::now();

        assert_eq!(
            next_updated_at(previous, previous + Duration::seconds(1)),
            previous + Duration::seconds(1)
        );
        assert_eq!(
            next_updated_at(previous, previous),
            previous + Duration::milliseconds(1)
        );
        assert_eq!(
            next_updated_at(previous, previous - Duration::seconds(5)),
            previous + Duration::milliseconds(1)
        );
    }

    #[test]
    fn test_todo_json_shape() {
        let todo = Todo::new(text("Buy milk"), Utc::now());
        let json = serde_json::to_value(&todo).unwrap();

        assert_eq!(json["id"], todo.id.as_str());
        assert_eq!(json["text"], "Buy milk");
        assert_eq!(json["completed"], false);
        assert!(json["createdAt"].is_string());
        assert!(json["updatedAt"].is_string());
        assert_eq!(json.as_object().unwrap().len(), 5);
    }

    #[test]
    fn test_todo_deserialize_rejects_invalid_text() {
        let json = serde_json::json!({
            "id": TodoId::new(),
            "text": "   ",
            "completed": false,
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z",
        });

        assert!(serde_json::from_value::<Todo>(json).is_err());
    }

    #[test]
    fn test_patch_builder() {
        let patch = TodoPatch::new()
            .with_text(text("新しいタイトル"))
            .with_completed(true);

        assert_eq!(patch.text, Some(text("新しいタイトル")));
        assert_eq!(patch.completed, Some(true));
        assert!(!patch.is_empty());
        assert!(TodoPatch::new().is_empty());
    }
}
