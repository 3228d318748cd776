use crate::state::ClientState;
use domain::{TodoFilter, TodoId, TodoStats};
use std::fmt::Write;

/// 1 項目分の表示内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoItemView {
    pub id: TodoId,
    pub text: String,
    pub completed: bool,
    pub editing: bool,
}

/// 描画に必要な内容をまとめた表示モデル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewModel {
    pub items: Vec<TodoItemView>,
    pub show_empty_state: bool,
    pub filter: TodoFilter,
    pub stats: TodoStats,
    /// 一覧中の完了済み件数（0 なら「完了済みを削除」は無効）
    pub completed_in_view: usize,
}

impl ViewModel {
    pub fn from_state(state: &ClientState) -> Self {
        let items: Vec<TodoItemView> = state
            .todos
            .iter()
            .map(|todo| TodoItemView {
                id: todo.id.clone(),
                text: todo.text.to_string(),
                completed: todo.completed,
                editing: state.is_editing(&todo.id),
            })
            .collect();

        Self {
            show_empty_state: items.is_empty(),
            items,
            filter: state.current_filter,
            stats: state.stats,
            completed_in_view: state.completed_count(),
        }
    }
}

const FILTERS: [TodoFilter; 3] = [TodoFilter::All, TodoFilter::Active, TodoFilter::Completed];

/// 表示モデルから HTML を生成する。同じ入力からは常に同じ出力になる
pub fn render_html(view: &ViewModel) -> String {
    let mut html = String::new();

    html.push_str("<div class=\"filters\">");
    for filter in FILTERS {
        let active = if filter == view.filter { " active" } else { "" };
        let _ = write!(
            html,
            "<button class=\"filter-btn{active}\" data-filter=\"{filter}\">{filter}</button>"
        );
    }
    html.push_str("</div>");

    if view.show_empty_state {
        html.push_str("<div id=\"empty-state\">No todos yet</div>");
    } else {
        html.push_str("<ul id=\"todos-list\">");
        for item in &view.items {
            render_item(&mut html, item);
        }
        html.push_str("</ul>");
    }

    let _ = write!(
        html,
        "<div class=\"stats\"><span id=\"total-todos\">{}</span><span id=\"completed-todos\">{}</span><span id=\"active-todos\">{}</span></div>",
        view.stats.total, view.stats.completed, view.stats.active
    );

    if view.completed_in_view > 0 {
        html.push_str("<button id=\"clear-completed\">Clear completed</button>");
    }

    html
}

fn render_item(html: &mut String, item: &TodoItemView) {
    let mut classes = String::from("todo-item");
    if item.completed {
        classes.push_str(" completed");
    }
    if item.editing {
        classes.push_str(" editing");
    }
    let checked = if item.completed { " checked" } else { "" };
    let text = escape_html(&item.text);

    let _ = write!(
        html,
        "<li class=\"{classes}\" data-id=\"{id}\">\
         <div class=\"todo-checkbox{checked}\"></div>\
         <span class=\"todo-text\">{text}</span>\
         <input type=\"text\" class=\"edit-input\" value=\"{text}\">\
         </li>",
        id = item.id,
    );
}

/// HTML 特殊文字のエスケープ
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
