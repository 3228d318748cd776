use crate::models::{TodoItem, TodoKeys, TodoUpdate, TODO_PARTITION};
use crate::store::TodoStore;
use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, BillingMode, DeleteRequest, KeySchemaElement, KeyType,
    ReturnValue, ReturnValuesOnConditionCheckFailure, ScalarAttributeType, Select, WriteRequest,
};
use aws_sdk_dynamodb::Client;
use chrono::{DateTime, Utc};
use domain::{
    next_updated_at, sort_newest_first, Todo, TodoError, TodoFilter, TodoId, TodoPatch, TodoStats,
    TodoText,
};
use shared::telemetry::trace_store_operation;
use shared::Config;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// BatchWriteItem 1回あたりの最大リクエスト数
const BATCH_WRITE_LIMIT: usize = 25;

/// UnprocessedItems を再送する最大回数
const MAX_BATCH_ROUNDS: u32 = 8;

/// UpdatedAt の競合で UpdateItem をやり直す最大回数
const MAX_UPDATE_ATTEMPTS: u32 = 5;

type Item = HashMap<String, AttributeValue>;

enum UpdateAttempt {
    Updated(Todo),
    /// 保存済みの UpdatedAt が新しい値以上だった
    Stale(DateTime<Utc>),
}

#[derive(Clone)]
pub struct DynamoDbClient {
    client: Client,
    table_name: String,
}

impl DynamoDbClient {
    pub async fn new(config: &Config) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.aws_region.clone()));

        // DynamoDB Local 用
        if let Some(endpoint) = &config.dynamodb_endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let aws_config = loader.load().await;
        Self::from_client(Client::new(&aws_config), &config.dynamodb_table)
    }

    pub fn from_client(client: Client, table_name: &str) -> Self {
        Self {
            client,
            table_name: table_name.to_string(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

/// DynamoDB をドキュメントストアとして使う実装
///
/// 全 ToDo を 1 パーティション（PK = "TODO"）に格納し、SK は `TODO#<ULID>`。
#[derive(Clone)]
pub struct DynamoTodoStore {
    db: DynamoDbClient,
}

impl DynamoTodoStore {
    pub fn new(db: DynamoDbClient) -> Self {
        Self { db }
    }

    /// テーブルが無ければ作成する（ローカル開発用）
    pub async fn create_table_if_missing(&self) -> Result<(), TodoError> {
        let table = self.db.table_name();

        match self.db.client().describe_table().table_name(table).send().await {
            Ok(_) => return Ok(()),
            Err(e) => {
                let service_error = e.into_service_error();
                if !service_error.is_resource_not_found_exception() {
                    return Err(store_error(service_error));
                }
            }
        }

        info!(table = table, "テーブルを作成します");

        let attribute = |name: &str| {
            AttributeDefinition::builder()
                .attribute_name(name)
                .attribute_type(ScalarAttributeType::S)
                .build()
                .map_err(store_error)
        };
        let key = |name: &str, key_type: KeyType| {
            KeySchemaElement::builder()
                .attribute_name(name)
                .key_type(key_type)
                .build()
                .map_err(store_error)
        };

        self.db
            .client()
            .create_table()
            .table_name(table)
            .attribute_definitions(attribute("PK")?)
            .attribute_definitions(attribute("SK")?)
            .key_schema(key("PK", KeyType::Hash)?)
            .key_schema(key("SK", KeyType::Range)?)
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await
            .map_err(store_error)?;

        Ok(())
    }

    /// パーティション内のアイテムを全ページ分取得
    async fn query_items(&self, completed: Option<bool>) -> Result<Vec<Item>, TodoError> {
        let mut items = Vec::new();
        let mut start_key: Option<Item> = None;

        loop {
            let mut request = self
                .db
                .client()
                .query()
                .table_name(self.db.table_name())
                .key_condition_expression("PK = :pk")
                .expression_attribute_values(":pk", AttributeValue::S(TODO_PARTITION.to_string()))
                .set_exclusive_start_key(start_key.take());

            if let Some(completed) = completed {
                request = request
                    .filter_expression("Completed = :completed")
                    .expression_attribute_values(":completed", AttributeValue::Bool(completed));
            }

            let output = request.send().await.map_err(store_error)?;
            items.extend(output.items().iter().cloned());

            match output.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        Ok(items)
    }

    async fn query_count(&self, completed: Option<bool>) -> Result<u64, TodoError> {
        let mut count: u64 = 0;
        let mut start_key: Option<Item> = None;

        loop {
            let mut request = self
                .db
                .client()
                .query()
                .table_name(self.db.table_name())
                .select(Select::Count)
                .key_condition_expression("PK = :pk")
                .expression_attribute_values(":pk", AttributeValue::S(TODO_PARTITION.to_string()))
                .set_exclusive_start_key(start_key.take());

            if let Some(completed) = completed {
                request = request
                    .filter_expression("Completed = :completed")
                    .expression_attribute_values(":completed", AttributeValue::Bool(completed));
            }

            let output = request.send().await.map_err(store_error)?;
            count += u64::try_from(output.count()).unwrap_or_default();

            match output.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        Ok(count)
    }

    /// 条件に合うアイテムをまとめて削除し、削除件数を返す
    ///
    /// 件数は Query で見つかったキーの数。BatchWriteItem は存在しないキーの削除も成功扱いにするため、
    /// Query と削除の間に別の操作で消えたアイテムも件数に含まれる。
    async fn delete_matching(&self, completed: Option<bool>) -> Result<u64, TodoError> {
        let keys = self
            .query_items(completed)
            .await?
            .iter()
            .map(TodoKeys::from_attribute_map)
            .collect::<Result<Vec<_>, _>>()
            .map_err(TodoError::Store)?;

        for chunk in keys.chunks(BATCH_WRITE_LIMIT) {
            let requests = chunk
                .iter()
                .map(|keys| {
                    DeleteRequest::builder()
                        .set_key(Some(keys.to_key_map()))
                        .build()
                        .map(|delete| WriteRequest::builder().delete_request(delete).build())
                })
                .collect::<Result<Vec<_>, _>>()
                .map_err(store_error)?;

            self.batch_write(requests).await?;
        }

        Ok(keys.len() as u64)
    }

    /// 条件付き UpdateItem を 1 回実行する
    async fn update_item(
        &self,
        id: &TodoId,
        patch: &TodoPatch,
        updated_at: DateTime<Utc>,
    ) -> Result<UpdateAttempt, TodoError> {
        let update = TodoUpdate::new(patch, updated_at);

        let result = self
            .db
            .client()
            .update_item()
            .table_name(self.db.table_name())
            .set_key(Some(TodoKeys::for_todo(id).to_key_map()))
            .update_expression(update.update_expression)
            .condition_expression(update.condition_expression)
            .set_expression_attribute_names(Some(update.names))
            .set_expression_attribute_values(Some(update.values))
            .return_values(ReturnValue::AllNew)
            .return_values_on_condition_check_failure(ReturnValuesOnConditionCheckFailure::AllOld)
            .send()
            .await;

        match result {
            Ok(output) => {
                let attributes = output
                    .attributes()
                    .ok_or_else(|| TodoError::store("UpdateItem returned no attributes"))?;
                TodoItem::from_attribute_map(attributes)
                    .map(|item| UpdateAttempt::Updated(item.todo))
                    .map_err(TodoError::Store)
            }
            Err(e) => match e.into_service_error() {
                // 条件不成立: アイテムが無ければ NotFound、あれば UpdatedAt が追い越している
                UpdateItemError::ConditionalCheckFailedException(failure) => match failure.item() {
                    Some(item) => TodoItem::from_attribute_map(item)
                        .map(|item| UpdateAttempt::Stale(item.todo.updated_at))
                        .map_err(TodoError::Store),
                    None => Err(TodoError::NotFound(id.clone())),
                },
                other => Err(store_error(other)),
            },
        }
    }

    /// BatchWriteItem を実行し、UnprocessedItems が無くなるまで再送する
    async fn batch_write(&self, requests: Vec<WriteRequest>) -> Result<(), TodoError> {
        let mut pending = HashMap::from([(self.db.table_name().to_string(), requests)]);

        for round in 0..MAX_BATCH_ROUNDS {
            let output = self
                .db
                .client()
                .batch_write_item()
                .set_request_items(Some(std::mem::take(&mut pending)))
                .send()
                .await
                .map_err(store_error)?;

            match output.unprocessed_items() {
                Some(unprocessed) if !unprocessed.is_empty() => {
                    warn!(round = round, "未処理のアイテムを再送します");
                    pending = unprocessed.clone();
                    tokio::time::sleep(Duration::from_millis(50 * u64::from(round + 1))).await;
                }
                _ => return Ok(()),
            }
        }

        Err(TodoError::store("BatchWriteItem left unprocessed items"))
    }
}

#[async_trait]
impl TodoStore for DynamoTodoStore {
    async fn create(&self, text: TodoText) -> Result<Todo, TodoError> {
        let todo = Todo::new(text, Utc::now());
        let item = TodoItem::new(todo.clone());

        trace_store_operation(self.db.table_name(), "create", async {
            self.db
                .client()
                .put_item()
                .table_name(self.db.table_name())
                .set_item(Some(item.to_attribute_map()))
                .condition_expression("attribute_not_exists(PK)")
                .send()
                .await
                .map_err(store_error)
        })
        .await?;

        Ok(todo)
    }

    async fn find_all(&self, filter: TodoFilter) -> Result<Vec<Todo>, TodoError> {
        let items = trace_store_operation(
            self.db.table_name(),
            "find_all",
            self.query_items(filter.completed()),
        )
        .await?;

        let mut todos = items
            .iter()
            .map(|item| TodoItem::from_attribute_map(item).map(|item| item.todo))
            .collect::<Result<Vec<_>, _>>()
            .map_err(TodoError::Store)?;

        sort_newest_first(&mut todos);
        Ok(todos)
    }

    async fn count(&self) -> Result<TodoStats, TodoError> {
        trace_store_operation(self.db.table_name(), "count", async {
            let total = self.query_count(None).await?;
            let completed = self.query_count(Some(true)).await?;
            Ok::<_, TodoError>(TodoStats::from_counts(total, completed))
        })
        .await
    }

    async fn update_by_id(&self, id: &TodoId, patch: TodoPatch) -> Result<Todo, TodoError> {
        trace_store_operation(self.db.table_name(), "update_by_id", async {
            let mut updated_at = Utc::now();

            // 指定フィールドだけを 1 回の UpdateItem で書き換える。
            // 保存済みの UpdatedAt が追い越していれば、その値から進めて再試行する
            for attempt in 0..MAX_UPDATE_ATTEMPTS {
                match self.update_item(id, &patch, updated_at).await? {
                    UpdateAttempt::Updated(todo) => return Ok(todo),
                    UpdateAttempt::Stale(current) => {
                        debug!(attempt = attempt, todo_id = %id, "updatedAt を進めて再試行します");
                        updated_at = next_updated_at(current, Utc::now());
                    }
                }
            }

            Err(TodoError::store("UpdatedAt kept moving during update"))
        })
        .await
    }

    async fn delete_by_id(&self, id: &TodoId) -> Result<Todo, TodoError> {
        trace_store_operation(self.db.table_name(), "delete_by_id", async {
            let output = self
                .db
                .client()
                .delete_item()
                .table_name(self.db.table_name())
                .set_key(Some(TodoKeys::for_todo(id).to_key_map()))
                .return_values(ReturnValue::AllOld)
                .send()
                .await
                .map_err(store_error)?;

            let attributes = output
                .attributes()
                .filter(|attributes| !attributes.is_empty())
                .ok_or_else(|| TodoError::NotFound(id.clone()))?;

            TodoItem::from_attribute_map(attributes)
                .map(|item| item.todo)
                .map_err(TodoError::Store)
        })
        .await
    }

    async fn delete_all(&self) -> Result<u64, TodoError> {
        trace_store_operation(self.db.table_name(), "delete_all", self.delete_matching(None)).await
    }

    async fn delete_completed(&self) -> Result<u64, TodoError> {
        trace_store_operation(
            self.db.table_name(),
            "delete_completed",
            self.delete_matching(Some(true)),
        )
        .await
    }
}

/// SDK のエラーを内部詳細付きのストアエラーに変換
fn store_error<E: std::error::Error>(error: E) -> TodoError {
    TodoError::Store(DisplayErrorContext(error).to_string())
}
