use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use tracing::{info_span, Instrument};
use uuid::Uuid;

/// HTTP header name for trace ID
pub const TRACE_ID_HEADER: &str = "X-Trace-Id";

tokio::task_local! {
    static CURRENT_TRACE_ID: String;
}

/// Trace ID of the request being handled on this task, or a fresh one
/// outside of a request.
pub fn current_trace_id() -> String {
    CURRENT_TRACE_ID
        .try_with(|id| id.clone())
        .unwrap_or_else(|_| Uuid::new_v4().to_string())
}

/// Middleware that assigns a trace ID to each request.
///
/// A well-formed UUID in the incoming `X-Trace-Id` header is reused, anything
/// else is replaced. The ID is stored in request extensions, scoped to the
/// handler task for failure envelopes, attached to the `http_request` span
/// and echoed in the response header.
pub async fn trace_id_middleware(mut request: Request, next: Next) -> Response {
    let trace_id = request
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value).ok())
        .unwrap_or_else(Uuid::new_v4)
        .to_string();

    let span = info_span!(
        "http_request",
        trace_id = %trace_id,
        method = %request.method(),
        uri = %request.uri().path(),
    );

    request.extensions_mut().insert(TraceId(trace_id.clone()));

    let response = CURRENT_TRACE_ID
        .scope(trace_id.clone(), async move {
            tracing::debug!("Request started");
            let response = next.run(request).await;
            tracing::info!(status = %response.status(), "Request completed");
            response
        })
        .instrument(span)
        .await;

    let (mut parts, body) = response.into_parts();
    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        parts.headers.insert(TRACE_ID_HEADER, value);
    }

    Response::from_parts(parts, body)
}

/// Extension type for storing trace ID in request extensions
#[derive(Clone, Debug)]
pub struct TraceId(pub String);

impl TraceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ServiceError;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware,
        response::IntoResponse,
        routing::get,
        Router,
    };
    use tower::util::ServiceExt;

    async fn echo_handler(request: Request<Body>) -> impl IntoResponse {
        let trace_id = request
            .extensions()
            .get::<TraceId>()
            .map(|t| t.as_str().to_string())
            .unwrap_or_else(|| "no-trace-id".to_string());

        (StatusCode::OK, trace_id)
    }

    async fn failing_handler() -> Result<String, ServiceError> {
        Err(ServiceError::InvalidCredentials)
    }

    fn app() -> Router {
        Router::new()
            .route("/echo", get(echo_handler))
            .route("/fail", get(failing_handler))
            .layer(middleware::from_fn(trace_id_middleware))
    }

    fn header_trace_id(response: &Response) -> String {
        response
            .headers()
            .get(TRACE_ID_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_trace_id_available_in_handler() {
        let request = Request::builder().uri("/echo").body(Body::empty()).unwrap();

        let response = app().oneshot(request).await.unwrap();
        let header = header_trace_id(&response);
        assert!(Uuid::parse_str(&header).is_ok());

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(header, String::from_utf8(body.to_vec()).unwrap());
    }

    #[tokio::test]
    async fn test_incoming_trace_id_is_reused() {
        let incoming = Uuid::new_v4().to_string();
        let request = Request::builder()
            .uri("/echo")
            .header(TRACE_ID_HEADER, &incoming)
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(header_trace_id(&response), incoming);
    }

    #[tokio::test]
    async fn test_garbage_trace_id_is_replaced() {
        let request = Request::builder()
            .uri("/echo")
            .header(TRACE_ID_HEADER, "<script>")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        let header = header_trace_id(&response);
        assert_ne!(header, "<script>");
        assert!(Uuid::parse_str(&header).is_ok());
    }

    #[tokio::test]
    async fn test_failure_envelope_carries_request_trace_id() {
        let request = Request::builder().uri("/fail").body(Body::empty()).unwrap();

        let response = app().oneshot(request).await.unwrap();
        let header = header_trace_id(&response);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["traceId"], header.as_str());
    }

    #[tokio::test]
    async fn test_trace_id_unique_per_request() {
        let app = app();

        let first = app
            .clone()
            .oneshot(Request::builder().uri("/echo").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let second = app
            .oneshot(Request::builder().uri("/echo").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_ne!(header_trace_id(&first), header_trace_id(&second));
    }

    #[test]
    fn test_current_trace_id_outside_request() {
        assert!(Uuid::parse_str(&current_trace_id()).is_ok());
    }
}
