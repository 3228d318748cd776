use crate::todo::Todo;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 一覧取得時の絞り込み条件
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodoFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl TodoFilter {
    /// クエリ文字列の値から解釈する。未知の値や未指定は All として扱う
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("active") => TodoFilter::Active,
            Some("completed") => TodoFilter::Completed,
            _ => TodoFilter::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TodoFilter::All => "all",
            TodoFilter::Active => "active",
            TodoFilter::Completed => "completed",
        }
    }

    /// この条件で対象となる completed の値。All は None
    pub fn completed(&self) -> Option<bool> {
        match self {
            TodoFilter::All => None,
            TodoFilter::Active => Some(false),
            TodoFilter::Completed => Some(true),
        }
    }

    pub fn matches(&self, todo: &Todo) -> bool {
        self.completed()
            .map_or(true, |completed| todo.completed == completed)
    }
}

impl fmt::Display for TodoFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 作成日時の降順に並べる（同時刻は ID の降順）
pub fn sort_newest_first(todos: &mut [Todo]) {
    todos.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::todo::{TodoPatch, TodoText};
    use chrono::{Duration, Utc};

    #[test]
    fn test_from_query_is_permissive() {
        assert_eq!(TodoFilter::from_query(None), TodoFilter::All);
        assert_eq!(TodoFilter::from_query(Some("all")), TodoFilter::All);
        assert_eq!(TodoFilter::from_query(Some("active")), TodoFilter::Active);
        assert_eq!(TodoFilter::from_query(Some("completed")), TodoFilter::Completed);
        assert_eq!(TodoFilter::from_query(Some("done")), TodoFilter::All);
        assert_eq!(TodoFilter::from_query(Some("ACTIVE")), TodoFilter::All);
        assert_eq!(TodoFilter::from_query(Some("")), TodoFilter::All);
    }

    #[test]
    fn test_matches() {
        let now = Utc::now();
        let active = Todo::new(TodoText::parse("a").unwrap(), now);
        let mut done = Todo::new(TodoText::parse("b").unwrap(), now);
        done.apply_patch(TodoPatch::new().with_completed(true), now);

        assert!(TodoFilter::All.matches(&active) && TodoFilter::All.matches(&done));
        assert!(TodoFilter::Active.matches(&active) && !TodoFilter::Active.matches(&done));
        assert!(!TodoFilter::Completed.matches(&active) && TodoFilter::Completed.matches(&done));
    }

    #[test]
    fn test_sort_newest_first() {
        let now = Utc::now();
        let oldest = Todo::new(TodoText::parse("1").unwrap(), now - Duration::seconds(2));
        let middle = Todo::new(TodoText::parse("2").unwrap(), now - Duration::seconds(1));
        let newest = Todo::new(TodoText::parse("3").unwrap(), now);

        let mut todos = vec![middle.clone(), oldest.clone(), newest.clone()];
        sort_newest_first(&mut todos);

        let ids: Vec<_> = todos.into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![newest.id, middle.id, oldest.id]);
    }
}
