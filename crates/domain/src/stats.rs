use serde::{Deserialize, Serialize};

/// 件数の集計結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoStats {
    pub total: u64,
    pub completed: u64,
    pub active: u64,
}

impl TodoStats {
    /// active は total - completed で求める
    pub fn from_counts(total: u64, completed: u64) -> Self {
        Self {
            total,
            completed,
            active: total.saturating_sub(completed),
        }
    }

    pub fn from_todos<'a>(todos: impl IntoIterator<Item = &'a crate::Todo>) -> Self {
        let (total, completed) = todos
            .into_iter()
            .fold((0, 0), |(total, completed), todo| {
                (total + 1, completed + u64::from(todo.completed))
            });
        Self::from_counts(total, completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_counts() {
        let stats = TodoStats::from_counts(5, 2);
        assert_eq!(stats, TodoStats { total: 5, completed: 2, active: 3 });
        assert_eq!(stats.total, stats.completed + stats.active);
    }

    #[test]
    fn test_from_todos_empty() {
        assert_eq!(TodoStats::from_todos(&Vec::<crate::Todo>::new()), TodoStats::default());
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(TodoStats::from_counts(1, 1)).unwrap();
        assert_eq!(json, serde_json::json!({"total": 1, "completed": 1, "active": 0}));
    }
}
