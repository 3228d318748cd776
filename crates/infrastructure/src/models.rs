use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, SecondsFormat, Utc};
use domain::{Todo, TodoId, TodoPatch, TodoText};
use std::collections::HashMap;

/// ToDo を格納するパーティションキーの値
pub const TODO_PARTITION: &str = "TODO";

/// DynamoDB Single Table Design のキー構造
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoKeys {
    pub pk: String, // パーティションキー
    pub sk: String, // ソートキー
}

impl TodoKeys {
    pub fn for_todo(todo_id: &TodoId) -> Self {
        Self {
            pk: TODO_PARTITION.to_string(),
            sk: format!("TODO#{}", todo_id.as_str()),
        }
    }

    pub fn to_key_map(&self) -> HashMap<String, AttributeValue> {
        HashMap::from([
            ("PK".to_string(), AttributeValue::S(self.pk.clone())),
            ("SK".to_string(), AttributeValue::S(self.sk.clone())),
        ])
    }

    /// アイテムからキー部分だけを取り出す
    pub fn from_attribute_map(map: &HashMap<String, AttributeValue>) -> Result<Self, String> {
        Ok(Self {
            pk: string_attr(map, "PK")?,
            sk: string_attr(map, "SK")?,
        })
    }
}

/// ToDo 1件分の DynamoDB アイテム
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoItem {
    pub keys: TodoKeys,
    pub todo: Todo,
}

impl TodoItem {
    pub fn new(todo: Todo) -> Self {
        Self {
            keys: TodoKeys::for_todo(&todo.id),
            todo,
        }
    }

    /// DynamoDB AttributeValue マップに変換
    pub fn to_attribute_map(&self) -> HashMap<String, AttributeValue> {
        let mut map = self.keys.to_key_map();

        map.insert("Id".to_string(), AttributeValue::S(self.todo.id.to_string()));
        map.insert("Text".to_string(), AttributeValue::S(self.todo.text.to_string()));
        map.insert("Completed".to_string(), AttributeValue::Bool(self.todo.completed));
        map.insert(
            "CreatedAt".to_string(),
            AttributeValue::S(format_timestamp(self.todo.created_at)),
        );
        map.insert(
            "UpdatedAt".to_string(),
            AttributeValue::S(format_timestamp(self.todo.updated_at)),
        );

        map
    }

    /// DynamoDB AttributeValue マップから復元
    pub fn from_attribute_map(map: &HashMap<String, AttributeValue>) -> Result<Self, String> {
        let keys = TodoKeys::from_attribute_map(map)?;

        let id = TodoId::parse(&string_attr(map, "Id")?)
            .map_err(|e| format!("Invalid Id: {e}"))?;

        let text = TodoText::parse(&string_attr(map, "Text")?)
            .map_err(|e| format!("Invalid Text: {e}"))?;

        let completed = *map
            .get("Completed")
            .and_then(|v| v.as_bool().ok())
            .ok_or("Missing or invalid Completed")?;

        Ok(Self {
            keys,
            todo: Todo {
                id,
                text,
                completed,
                created_at: timestamp_attr(map, "CreatedAt")?,
                updated_at: timestamp_attr(map, "UpdatedAt")?,
            },
        })
    }
}

/// UpdateItem に渡す式と値
///
/// 指定されたフィールドと UpdatedAt だけを SET する。
/// 条件式はアイテムの存在と、保存済みの UpdatedAt が新しい値より前であること。
#[derive(Debug, Clone, PartialEq)]
pub struct TodoUpdate {
    pub update_expression: String,
    pub condition_expression: &'static str,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, AttributeValue>,
}

impl TodoUpdate {
    pub fn new(patch: &TodoPatch, updated_at: DateTime<Utc>) -> Self {
        let mut assignments = vec!["#updated_at = :updated_at"];
        let mut names = HashMap::from([("#updated_at".to_string(), "UpdatedAt".to_string())]);
        let mut values = HashMap::from([(
            ":updated_at".to_string(),
            AttributeValue::S(format_timestamp(updated_at)),
        )]);

        if let Some(text) = &patch.text {
            assignments.push("#text = :text");
            names.insert("#text".to_string(), "Text".to_string());
            values.insert(":text".to_string(), AttributeValue::S(text.to_string()));
        }
        if let Some(completed) = patch.completed {
            assignments.push("#completed = :completed");
            names.insert("#completed".to_string(), "Completed".to_string());
            values.insert(":completed".to_string(), AttributeValue::Bool(completed));
        }

        Self {
            update_expression: format!("SET {}", assignments.join(", ")),
            condition_expression: "attribute_exists(PK) AND #updated_at < :updated_at",
            names,
            values,
        }
    }
}

/// 固定幅の RFC 3339（ナノ秒, `Z`）。文字列比較が時刻順と一致する
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn string_attr(map: &HashMap<String, AttributeValue>, name: &str) -> Result<String, String> {
    map.get(name)
        .and_then(|v| v.as_s().ok())
        .cloned()
        .ok_or_else(|| format!("Missing {name}"))
}

fn timestamp_attr(map: &HashMap<String, AttributeValue>, name: &str) -> Result<DateTime<Utc>, String> {
    map.get(name)
        .and_then(|v| v.as_s().ok())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| format!("Missing or invalid {name}"))
}
