use crate::store::TodoStore;
use async_trait::async_trait;
use chrono::Utc;
use domain::{sort_newest_first, Todo, TodoError, TodoFilter, TodoId, TodoPatch, TodoStats, TodoText};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// プロセス内メモリで保持するストア（開発/テスト用）
///
/// 各操作はロックを保持したまま完了するため操作単位で原子的
#[derive(Default)]
pub struct InMemoryTodoStore {
    todos: RwLock<HashMap<TodoId, Todo>>,
}

impl InMemoryTodoStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn delete_where(&self, predicate: impl Fn(&Todo) -> bool) -> u64 {
        let mut todos = self.todos.write().await;
        let before = todos.len();
        todos.retain(|_, todo| !predicate(todo));
        (before - todos.len()) as u64
    }
}

#[async_trait]
impl TodoStore for InMemoryTodoStore {
    async fn create(&self, text: TodoText) -> Result<Todo, TodoError> {
        let todo = Todo::new(text, Utc::now());
        debug!(todo_id = %todo.id, "ToDo作成");

        self.todos.write().await.insert(todo.id.clone(), todo.clone());
        Ok(todo)
    }

    async fn find_all(&self, filter: TodoFilter) -> Result<Vec<Todo>, TodoError> {
        let mut todos: Vec<Todo> = self
            .todos
            .read()
            .await
            .values()
            .filter(|todo| filter.matches(todo))
            .cloned()
            .collect();
        sort_newest_first(&mut todos);
        Ok(todos)
    }

    async fn count(&self) -> Result<TodoStats, TodoError> {
        Ok(TodoStats::from_todos(self.todos.read().await.values()))
    }

    async fn update_by_id(&self, id: &TodoId, patch: TodoPatch) -> Result<Todo, TodoError> {
        let mut todos = self.todos.write().await;
        let todo = todos
            .get_mut(id)
            .ok_or_else(|| TodoError::NotFound(id.clone()))?;

        todo.apply_patch(patch, Utc::now());
        Ok(todo.clone())
    }

    async fn delete_by_id(&self, id: &TodoId) -> Result<Todo, TodoError> {
        self.todos
            .write()
            .await
            .remove(id)
            .ok_or_else(|| TodoError::NotFound(id.clone()))
    }

    async fn delete_all(&self) -> Result<u64, TodoError> {
        Ok(self.delete_where(|_| true).await)
    }

    async fn delete_completed(&self) -> Result<u64, TodoError> {
        Ok(self.delete_where(|todo| todo.completed).await)
    }
}
