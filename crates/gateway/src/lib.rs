//! Remote session gateway: typed request functions for the session and
//! message operations.
//!
//! Pure I/O boundary with no state of its own. Errors are propagated as
//! typed [`proto::ApiError`] values; retries and compensation are caller
//! policy.

pub mod api;
pub mod http;

/// Gateway operation contract and request context types.
pub use api::{AuthContext, GatewayConfig, SessionGateway};
/// HTTP+JSON gateway implementation.
pub use http::HttpGateway;
