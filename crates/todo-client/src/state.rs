use domain::{Todo, TodoFilter, TodoId, TodoStats};

/// 編集確定時の判定結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// トリム済みの新しい本文で保存する
    Save(String),
    /// 空、または変更なしのため元に戻す
    Revert,
}

/// クライアントが保持する状態
///
/// `todos` は現在のフィルターでサーバーから取得した一覧。
/// 編集中の項目は高々 1 件。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientState {
    pub todos: Vec<Todo>,
    pub current_filter: TodoFilter,
    pub editing: Option<TodoId>,
    pub stats: TodoStats,
}

impl ClientState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, id: &TodoId) -> Option<&Todo> {
        self.todos.iter().find(|todo| &todo.id == id)
    }

    /// 一覧を置き換える。編集中の項目が無くなれば編集も終了
    pub fn replace_all(&mut self, todos: Vec<Todo>) {
        self.todos = todos;
        if let Some(id) = &self.editing {
            if self.find(id).is_none() {
                self.editing = None;
            }
        }
    }

    /// 新規作成分を先頭に追加
    pub fn prepend(&mut self, todo: Todo) {
        self.todos.insert(0, todo);
    }

    /// 同じ ID の項目をその場で置き換える。見つからなければ false
    pub fn replace(&mut self, todo: Todo) -> bool {
        match self.todos.iter_mut().find(|current| current.id == todo.id) {
            Some(current) => {
                *current = todo;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &TodoId) -> Option<Todo> {
        let index = self.todos.iter().position(|todo| &todo.id == id)?;
        if self.editing.as_ref() == Some(id) {
            self.editing = None;
        }
        Some(self.todos.remove(index))
    }

    pub fn clear(&mut self) {
        self.todos.clear();
        self.editing = None;
    }

    pub fn set_filter(&mut self, filter: TodoFilter) {
        self.current_filter = filter;
    }

    /// 編集を開始する。他の項目の編集は取り消される
    pub fn begin_edit(&mut self, id: &TodoId) -> bool {
        if self.find(id).is_none() {
            return false;
        }
        self.editing = Some(id.clone());
        true
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    pub fn is_editing(&self, id: &TodoId) -> bool {
        self.editing.as_ref() == Some(id)
    }

    /// 編集入力を保存すべきか判定する
    pub fn edit_outcome(&self, id: &TodoId, input: &str) -> EditOutcome {
        let text = input.trim();
        match self.find(id) {
            Some(todo) if !text.is_empty() && text != todo.text.as_str() => {
                EditOutcome::Save(text.to_string())
            }
            _ => EditOutcome::Revert,
        }
    }

    pub fn set_stats(&mut self, stats: TodoStats) {
        self.stats = stats;
    }

    /// 手元の一覧だけで数えた集計（サーバーから取得できない場合に使う）
    pub fn local_stats(&self) -> TodoStats {
        TodoStats::from_todos(&self.todos)
    }

    pub fn completed_count(&self) -> usize {
        self.todos.iter().filter(|todo| todo.completed).count()
    }
}
