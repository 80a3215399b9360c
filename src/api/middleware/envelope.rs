//! Failure envelopes for responses produced outside the handlers

use crate::core::error::ServiceError;
use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Router fallback for paths that match no route
pub async fn route_not_found(request: Request) -> ServiceError {
    ServiceError::RouteNotFound(request.uri().path().to_string())
}

/// Middleware that rewrites bodiless 405 and 408 responses into failure envelopes.
///
/// Axum answers unmatched methods and `TimeoutLayer` answers slow requests
/// with an empty body. Must run inside `trace_id_middleware` so the envelope
/// carries the request's trace ID.
pub async fn failure_envelope_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;
    if response.headers().contains_key(header::CONTENT_TYPE) {
        return response;
    }

    match response.status() {
        StatusCode::METHOD_NOT_ALLOWED => {
            let allow = response.headers().get(header::ALLOW).cloned();
            let mut rewritten =
                ServiceError::MethodNotAllowed(format!("{} {}", method, path)).into_response();
            if let Some(allow) = allow {
                rewritten.headers_mut().insert(header::ALLOW, allow);
            }
            rewritten
        }
        StatusCode::REQUEST_TIMEOUT => ServiceError::RequestTimeout(path).into_response(),
        _ => response,
    }
}
