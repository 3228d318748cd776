use std::env;
use thiserror::Error;

/// ストアの実装種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// プロセス内のメモリ（開発/テスト用）
    Memory,
    DynamoDb,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid PORT: {0}")]
    InvalidPort(String),

    #[error("Invalid TODO_STORE: {0} (expected `memory` or `dynamodb`)")]
    InvalidStoreBackend(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub store_backend: StoreBackend,
    pub dynamodb_table: String,
    /// DynamoDB Local などのエンドポイント上書き
    pub dynamodb_endpoint: Option<String>,
    pub aws_region: String,
    pub environment: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 任意の取得関数から設定を組み立てる
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PORT") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidPort(value.clone()))?,
            None => 1000,
        };

        let store_backend = match lookup("TODO_STORE").as_deref() {
            None | Some("memory") => StoreBackend::Memory,
            Some("dynamodb") => StoreBackend::DynamoDb,
            Some(other) => return Err(ConfigError::InvalidStoreBackend(other.to_string())),
        };

        Ok(Config {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            store_backend,
            dynamodb_table: lookup("DYNAMODB_TABLE").unwrap_or_else(|| "todo-app".to_string()),
            dynamodb_endpoint: lookup("DYNAMODB_ENDPOINT").filter(|v| !v.is_empty()),
            aws_region: lookup("AWS_REGION").unwrap_or_else(|| "ap-northeast-1".to_string()),
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "dev".to_string()),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.port, 1000);
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.dynamodb_table, "todo-app");
        assert_eq!(config.dynamodb_endpoint, None);
        assert_eq!(config.bind_address(), "127.0.0.1:1000");
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("HOST", "0.0.0.0"),
            ("TODO_STORE", "dynamodb"),
            ("DYNAMODB_TABLE", "todos-test"),
            ("DYNAMODB_ENDPOINT", "http://localhost:8000"),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.store_backend, StoreBackend::DynamoDb);
        assert_eq!(config.dynamodb_table, "todos-test");
        assert_eq!(config.dynamodb_endpoint.as_deref(), Some("http://localhost:8000"));
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(
            config_from(&[("PORT", "abc")]).unwrap_err(),
            ConfigError::InvalidPort("abc".to_string())
        );
        assert_eq!(
            config_from(&[("TODO_STORE", "mongodb")]).unwrap_err(),
            ConfigError::InvalidStoreBackend("mongodb".to_string())
        );
    }
}
