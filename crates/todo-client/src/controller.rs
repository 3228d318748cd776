use crate::api::{ClientError, TodoApi, UpdateTodo};
use crate::state::{ClientState, EditOutcome};
use crate::view::{render_html, ViewModel};
use domain::{TodoFilter, TodoId};
use tracing::{debug, warn};

/// 描画・通知・確認ダイアログの境界
pub trait Ui {
    fn render(&mut self, view: &ViewModel);
    fn alert(&mut self, message: &str);
    fn confirm(&mut self, message: &str) -> bool;
}

/// 編集中に押されたキー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKey {
    Enter,
    Escape,
}

/// 画面の状態を保持し、操作ごとに API を呼び出して再描画するコントローラー
pub struct TodoController<A: TodoApi, U: Ui> {
    api: A,
    ui: U,
    state: ClientState,
}

impl<A: TodoApi, U: Ui> TodoController<A, U> {
    pub fn new(api: A, ui: U) -> Self {
        Self {
            api,
            ui,
            state: ClientState::new(),
        }
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    /// 初回表示
    pub async fn init(&mut self) {
        self.load_todos().await;
        self.refresh_stats().await;
        self.render();
    }

    /// 現在のフィルターで一覧を取り直す。失敗時は空の一覧になる
    pub async fn load_todos(&mut self) {
        match self.api.list(self.state.current_filter).await {
            Ok(todos) => {
                debug!(filter = %self.state.current_filter, count = todos.len(), "Todos loaded");
                self.state.replace_all(todos);
            }
            Err(e) => {
                warn!(filter = %self.state.current_filter, error = %e, "Failed to load todos");
                self.state.clear();
            }
        }
    }

    /// 集計を取得する。失敗時は手元の一覧から数える
    pub async fn refresh_stats(&mut self) {
        let stats = match self.api.stats().await {
            Ok(stats) => stats,
            Err(e) => {
                warn!(error = %e, "Failed to load stats, counting local todos");
                self.state.local_stats()
            }
        };
        self.state.set_stats(stats);
    }

    pub fn render(&mut self) {
        let view = ViewModel::from_state(&self.state);
        self.ui.render(&view);
    }

    pub fn html(&self) -> String {
        render_html(&ViewModel::from_state(&self.state))
    }

    pub async fn add(&mut self, input: &str) {
        let text = input.trim();
        if text.is_empty() {
            return;
        }

        match self.api.create(text).await {
            Ok(todo) => {
                self.state.prepend(todo);
                self.after_mutation().await;
            }
            Err(e) => self.report_failure("add todo", e),
        }
    }

    pub async fn toggle(&mut self, id: &TodoId) {
        let Some(completed) = self.state.find(id).map(|todo| todo.completed) else {
            return;
        };

        match self.api.update(id, &UpdateTodo::completed(!completed)).await {
            Ok(todo) => {
                self.state.replace(todo);
                self.after_mutation().await;
            }
            Err(e) => self.report_failure("update todo", e),
        }
    }

    pub fn start_edit(&mut self, id: &TodoId) {
        if self.state.begin_edit(id) {
            self.render();
        }
    }

    pub fn cancel_edit(&mut self) {
        self.state.cancel_edit();
        self.render();
    }

    /// 本文が変わっていれば保存する。結果に関わらず編集は終了
    pub async fn save_edit(&mut self, id: &TodoId, input: &str) {
        if let EditOutcome::Save(text) = self.state.edit_outcome(id, input) {
            match self.api.update(id, &UpdateTodo::text(text)).await {
                Ok(todo) => {
                    self.state.replace(todo);
                    self.state.cancel_edit();
                    self.after_mutation().await;
                    return;
                }
                Err(e) => self.report_failure("update todo", e),
            }
        }

        self.cancel_edit();
    }

    pub async fn handle_edit_key(&mut self, id: &TodoId, key: EditKey, input: &str) {
        match key {
            EditKey::Enter => self.save_edit(id, input).await,
            EditKey::Escape => self.cancel_edit(),
        }
    }

    pub async fn delete(&mut self, id: &TodoId) {
        if !self.ui.confirm("Are you sure you want to delete this todo?") {
            return;
        }

        match self.api.delete(id).await {
            Ok(()) => {
                self.state.remove(id);
                self.after_mutation().await;
            }
            Err(e) => self.report_failure("delete todo", e),
        }
    }

    pub async fn clear_completed(&mut self) {
        let count = self.state.completed_count();
        if count == 0 {
            return;
        }
        let question = format!("Are you sure you want to delete {count} completed todo(s)?");
        if !self.ui.confirm(&question) {
            return;
        }

        match self.api.delete_completed().await {
            Ok(deleted) => {
                debug!(deleted, "Completed todos cleared");
                self.load_todos().await;
                self.after_mutation().await;
            }
            Err(e) => self.report_failure("clear completed todos", e),
        }
    }

    pub async fn reset_all(&mut self) {
        if self.state.todos.is_empty() {
            self.ui.alert("No todos to reset.");
            return;
        }
        if !self.ui.confirm("This will delete ALL todos. Continue?") {
            return;
        }

        match self.api.delete_all().await {
            Ok(deleted) => {
                debug!(deleted, "All todos deleted");
                self.state.clear();
                self.after_mutation().await;
            }
            Err(e) => self.report_failure("reset todos", e),
        }
    }

    /// フィルターを切り替え、サーバーから取り直す
    pub async fn set_filter(&mut self, filter: TodoFilter) {
        self.state.set_filter(filter);
        self.load_todos().await;
        self.render();
    }

    async fn after_mutation(&mut self) {
        self.refresh_stats().await;
        self.render();
    }

    fn report_failure(&mut self, action: &str, error: ClientError) {
        match error {
            ClientError::Server { status, message } => {
                warn!(action, status, %message, "Request rejected");
                self.ui.alert(&format!("Error: {message}"));
            }
            other => {
                warn!(action, error = %other, "Request failed");
                self.ui
                    .alert(&format!("Failed to {action}. Please try again."));
            }
        }
    }
}
