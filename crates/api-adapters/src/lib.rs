//! # api-adapters
//!
//! The web routing layer for threadline. Handlers translate HTTP requests
//! into service calls and the domain error taxonomy into status codes.

pub mod metrics;

#[cfg(feature = "web-axum")]
pub mod http;

#[cfg(feature = "web-axum")]
pub use http::{router, AppState};
pub use metrics::ApiMetrics;
