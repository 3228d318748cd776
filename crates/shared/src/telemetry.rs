use std::fmt::Display;
use std::future::Future;
use std::time::Instant;
use tracing::{error, info, warn};

/// ストア操作をトレース
/// 所要時間と成否をログに残し、結果はそのまま返す
pub async fn trace_store_operation<T, E, Fut>(
    table_name: &str,
    operation_name: &str,
    operation: Fut,
) -> Result<T, E>
where
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let start_time = Instant::now();
    let result = operation.await;
    let duration = start_time.elapsed();

    match &result {
        Ok(_) => {
            info!(
                table = table_name,
                operation = operation_name,
                duration_ms = duration.as_millis() as u64,
                "Store operation completed successfully"
            );
        }
        Err(e) => {
            error!(
                table = table_name,
                operation = operation_name,
                duration_ms = duration.as_millis() as u64,
                error = %e,
                "Store operation failed"
            );
        }
    }

    result
}

/// HTTP リクエスト/レスポンスを記録
pub fn trace_http_request(
    request_id: &str,
    method: &str,
    path: &str,
    status_code: u16,
    duration_ms: u64,
) {
    if status_code >= 400 {
        warn!(
            request_id = request_id,
            method = method,
            path = path,
            status_code = status_code,
            duration_ms = duration_ms,
            "HTTP request failed"
        );
    } else {
        info!(
            request_id = request_id,
            method = method,
            path = path,
            status_code = status_code,
            duration_ms = duration_ms,
            "HTTP request completed"
        );
    }
}
