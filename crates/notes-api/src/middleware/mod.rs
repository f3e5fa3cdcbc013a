//! # Middleware Stack
//!
//! - [`auth`](crate::auth::auth_middleware): bearer-token authentication for `/notes`.
//! - [`metrics`]: Prometheus request metrics.
//!
//! Request tracing is `tower_http::trace::TraceLayer`, applied in [`crate::app`].

pub mod metrics;
