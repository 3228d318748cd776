//! todo-api バイナリのエントリポイント

use anyhow::Context;
use infrastructure::{DynamoDbClient, DynamoTodoStore, InMemoryTodoStore, TodoStore};
use shared::{init_tracing, Config, StoreBackend};
use std::sync::Arc;
use todo_api::{app, AppState};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing().map_err(|e| anyhow::anyhow!("failed to initialise tracing: {e}"))?;

    let config = Config::from_env()?;
    info!(
        environment = %config.environment,
        store = ?config.store_backend,
        "設定読み込み完了"
    );

    let store = build_store(&config).await?;
    let router = app(AppState::new(store));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "server starting");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn TodoStore>> {
    match config.store_backend {
        StoreBackend::Memory => Ok(Arc::new(InMemoryTodoStore::new())),
        StoreBackend::DynamoDb => {
            let store = DynamoTodoStore::new(DynamoDbClient::new(config).await);

            // DynamoDB Local ではテーブルを自動作成する
            if config.dynamodb_endpoint.is_some() {
                store
                    .create_table_if_missing()
                    .await
                    .context("failed to prepare DynamoDB table")?;
            }

            Ok(Arc::new(store))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
