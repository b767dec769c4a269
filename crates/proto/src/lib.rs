//! Shared protocol types for the gateway and chat core.
//!
//! This crate defines the serializable session/message structures exchanged
//! with the remote service and the strongly-typed error enums shared across
//! the workspace.

pub mod error;
pub mod session;

/// Re-export of all protocol error types.
pub use error::*;
/// Re-export of conversation/session identity types.
pub use session::{Message, Role, Session, SessionId, SessionSummary};
