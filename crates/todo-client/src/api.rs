use async_trait::async_trait;
use domain::{Todo, TodoFilter, TodoId, TodoStats};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// API 呼び出しのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// サーバーがエラーを返した（`{"error": ...}` の内容）
    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    Decode(String),
}

/// PUT /todos/:id のリクエスト
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateTodo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl UpdateTodo {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            completed: None,
        }
    }

    pub fn completed(completed: bool) -> Self {
        Self {
            text: None,
            completed: Some(completed),
        }
    }
}

/// REST API の抽象
#[async_trait]
pub trait TodoApi: Send + Sync {
    async fn list(&self, filter: TodoFilter) -> Result<Vec<Todo>, ClientError>;
    async fn stats(&self) -> Result<TodoStats, ClientError>;
    async fn create(&self, text: &str) -> Result<Todo, ClientError>;
    async fn update(&self, id: &TodoId, update: &UpdateTodo) -> Result<Todo, ClientError>;
    async fn delete(&self, id: &TodoId) -> Result<(), ClientError>;
    /// 削除件数を返す
    async fn delete_all(&self) -> Result<u64, ClientError>;
    /// 削除件数を返す
    async fn delete_completed(&self) -> Result<u64, ClientError>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteManyBody {
    deleted_count: u64,
}

#[derive(Debug, Serialize)]
struct CreateTodoBody<'a> {
    text: &'a str,
}

/// reqwest による実装
#[derive(Debug, Clone)]
pub struct HttpTodoApi {
    client: Client,
    base_url: String,
}

impl HttpTodoApi {
    /// `base_url` はサーバーのオリジン（例: `http://127.0.0.1:1000`）
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/todos{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        read_json(response).await
    }
}

/// 成功なら本文をデコードし、失敗ならサーバーのエラーメッセージを取り出す
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();

    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()));
    }

    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string(),
    };

    Err(ClientError::Server {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl TodoApi for HttpTodoApi {
    async fn list(&self, filter: TodoFilter) -> Result<Vec<Todo>, ClientError> {
        let mut request = self.client.get(self.url(""));
        if filter != TodoFilter::All {
            request = request.query(&[("filter", filter.as_str())]);
        }
        self.send(request).await
    }

    async fn stats(&self) -> Result<TodoStats, ClientError> {
        self.send(self.client.get(self.url("/stats"))).await
    }

    async fn create(&self, text: &str) -> Result<Todo, ClientError> {
        self.send(self.client.post(self.url("")).json(&CreateTodoBody { text }))
            .await
    }

    async fn update(&self, id: &TodoId, update: &UpdateTodo) -> Result<Todo, ClientError> {
        self.send(self.client.put(self.url(&format!("/{id}"))).json(update))
            .await
    }

    async fn delete(&self, id: &TodoId) -> Result<(), ClientError> {
        let _: serde::de::IgnoredAny = self
            .send(self.client.delete(self.url(&format!("/{id}"))))
            .await?;
        Ok(())
    }

    async fn delete_all(&self) -> Result<u64, ClientError> {
        let body: DeleteManyBody = self.send(self.client.delete(self.url(""))).await?;
        Ok(body.deleted_count)
    }

    async fn delete_completed(&self) -> Result<u64, ClientError> {
        let body: DeleteManyBody = self
            .send(self.client.delete(self.url("/completed")))
            .await?;
        Ok(body.deleted_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_building() {
        let api = HttpTodoApi::new("http://localhost:1000/");
        assert_eq!(api.url(""), "http://localhost:1000/api/todos");
        assert_eq!(api.url("/stats"), "http://localhost:1000/api/todos/stats");
    }

    #[test]
    fn test_update_body_skips_missing_fields() {
        let body = serde_json::to_string(&UpdateTodo::completed(true)).unwrap();
        assert_eq!(body, r#"{"completed":true}"#);

        let body = serde_json::to_string(&UpdateTodo::text("Buy bread")).unwrap();
        assert_eq!(body, r#"{"text":"Buy bread"}"#);
    }
}
