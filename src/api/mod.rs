//! REST API module
//!
//! - HTTP server and router assembly
//! - Request tracing middleware
//! - Response envelope

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use handlers::AppState;
pub use middleware::{trace_id_middleware, TraceId, TRACE_ID_HEADER};
pub use models::{ApiResponse, ResponseStatus};
pub use server::ApiServer;
