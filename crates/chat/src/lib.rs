//! Conversation-session synchronization core.
//!
//! Keeps a local view of sessions and messages consistent with the remote
//! source of truth under asynchronous, fallible network operations, while
//! giving the user immediate feedback:
//!
//! - [`SessionStore`] — the in-memory session list and active transcript,
//!   with the atomic mutation rules the rest of the core relies on.
//! - [`SendProtocol`] — the per-send state machine: optimistic insertion,
//!   remote round-trip, rollback on failure.
//! - [`ChatController`] — the facade tying store, protocol, and gateway
//!   together; tracks which session is active and mediates switching,
//!   creation, and deletion.

pub mod controller;
pub mod protocol;
pub mod store;

/// Facade over store, protocol, and gateway.
pub use controller::ChatController;
/// Send state machine and its observable states.
pub use protocol::{PendingSend, SendOutcome, SendPhase, SendProtocol};
/// In-memory session/transcript state.
pub use store::SessionStore;
