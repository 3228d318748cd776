use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use shared::telemetry::trace_http_request;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// リクエストIDのヘッダー名
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// 全リクエストをリクエストID付きのスパンで包み、結果をログに残す
///
/// クライアントが `x-request-id` を送ってきた場合はそれを使い、無ければ UUID v4 を採番する。
/// レスポンスにも同じ値を付与する。
pub async fn trace_requests(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let span = tracing::info_span!(
        "http_request",
        request_id = %request_id,
        method = %method,
        path = %path
    );

    let start_time = Instant::now();
    let mut response = next.run(request).instrument(span).await;

    trace_http_request(
        &request_id,
        &method,
        &path,
        response.status().as_u16(),
        start_time.elapsed().as_millis() as u64,
    );

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}
