use async_trait::async_trait;
use domain::{Todo, TodoError, TodoFilter, TodoId, TodoPatch, TodoStats, TodoText};

/// ToDo レコードを保持するストアの抽象
///
/// 各操作はストア側で原子的に実行される。複数操作をまたぐトランザクションはない。
/// 本文の検証は `TodoText` の型で保証され、updatedAt の更新は
/// `Todo::apply_patch` を通して全ての更新系操作で行う。
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// 新しい ToDo を作成（ID と日時はストアが付与）
    async fn create(&self, text: TodoText) -> Result<Todo, TodoError>;

    /// 条件に合う ToDo を作成日時の降順で取得
    async fn find_all(&self, filter: TodoFilter) -> Result<Vec<Todo>, TodoError>;

    /// 件数を集計
    async fn count(&self) -> Result<TodoStats, TodoError>;

    /// 部分更新。存在しなければ `TodoError::NotFound`
    async fn update_by_id(&self, id: &TodoId, patch: TodoPatch) -> Result<Todo, TodoError>;

    /// 削除して削除前のレコードを返す。存在しなければ `TodoError::NotFound`
    async fn delete_by_id(&self, id: &TodoId) -> Result<Todo, TodoError>;

    /// 全件削除して削除件数を返す
    async fn delete_all(&self) -> Result<u64, TodoError>;

    /// 完了済みを削除して削除件数を返す
    async fn delete_completed(&self) -> Result<u64, TodoError>;
}
