//! Per-send state machine: optimistic insertion, remote round-trip,
//! rollback on failure.

use proto::{ApiError, Message, SessionId};
use tracing::{debug, warn};

use crate::store::SessionStore;

/// Observable state of the send machine.
///
/// One attempt walks `Idle → EnsuringSession → Optimistic → AwaitingReply`
/// and terminates in either `Settled` or `RolledBack`. The machine is busy
/// (rejects new sends) in the three middle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendPhase {
    /// No attempt in progress and none has run yet.
    #[default]
    Idle,
    /// Creating a session because none was active.
    EnsuringSession,
    /// User message inserted locally, not yet on the wire.
    Optimistic,
    /// Request issued; reply outstanding.
    AwaitingReply,
    /// Terminal: reply appended after the user message.
    Settled,
    /// Terminal: attempt abandoned; any optimistic insert was undone.
    RolledBack,
}

/// Handle for one admitted send: the target session and the content that
/// was optimistically inserted.
#[derive(Debug, Clone)]
pub struct PendingSend {
    /// Session the request targets. Captured at admission; the active
    /// selection may change while the reply is outstanding.
    pub session_id: SessionId,
    /// Content of the optimistic user message.
    pub content: String,
    /// Transcript generation the optimistic message went into. A transcript
    /// reload while the reply is outstanding leaves this stale, and the
    /// completion then has no buffer it may legally touch.
    transcript_generation: u64,
}

/// How one send attempt ended.
#[derive(Debug)]
pub enum SendOutcome {
    /// The assistant reply was appended after the user message.
    Settled { reply: Message },
    /// The remote call failed; the optimistic message was removed and the
    /// transcript is exactly as it was before the attempt.
    RolledBack { error: ApiError },
    /// The reply arrived for a session that was deleted or deselected while
    /// in flight; it was logged and dropped, resurrecting nothing.
    Discarded,
}

/// The state machine itself. Owns nothing but its phase; every transition
/// that touches data takes the store explicitly.
#[derive(Debug, Default)]
pub struct SendProtocol {
    phase: SendPhase,
}

impl SendProtocol {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase, for display layers and tests.
    pub fn phase(&self) -> SendPhase {
        self.phase
    }

    /// `true` while an attempt is outstanding. New sends are rejected
    /// (silently ignored) until the current one terminates.
    pub fn is_busy(&self) -> bool {
        matches!(
            self.phase,
            SendPhase::EnsuringSession | SendPhase::Optimistic | SendPhase::AwaitingReply
        )
    }

    /// Enters `EnsuringSession`. The caller resolves the active session —
    /// adopting a freshly created one if necessary — before moving on.
    pub fn enter_ensuring(&mut self) {
        self.phase = SendPhase::EnsuringSession;
    }

    /// Aborts from `EnsuringSession` when session creation failed. Nothing
    /// has been inserted yet, so there is nothing to undo.
    pub fn abort_ensuring(&mut self) {
        debug!("send aborted: session creation failed before optimistic insert");
        self.phase = SendPhase::RolledBack;
    }

    /// Performs the optimistic insert: appends a user message stamped with
    /// the current time and returns the pending-send handle.
    pub fn insert_optimistic(
        &mut self,
        store: &mut SessionStore,
        session_id: SessionId,
        content: &str,
    ) -> PendingSend {
        self.phase = SendPhase::Optimistic;
        let transcript_generation = store.transcript_generation();
        store.append_message(Message::user(content));
        PendingSend {
            session_id,
            content: content.to_string(),
            transcript_generation,
        }
    }

    /// Marks the request as issued.
    pub fn await_reply(&mut self) {
        self.phase = SendPhase::AwaitingReply;
    }

    /// Applies the remote outcome for a pending send.
    ///
    /// `active` is the currently selected session. When the target session
    /// no longer exists in the store, is no longer the one on display, or
    /// the transcript was reloaded since the optimistic insert, the reply
    /// is discarded: the buffer belongs to whatever the user is viewing
    /// now (it no longer holds the optimistic message), and a deleted
    /// session must not be resurrected by a late reply.
    pub fn complete(
        &mut self,
        store: &mut SessionStore,
        active: Option<&SessionId>,
        pending: &PendingSend,
        outcome: Result<Message, ApiError>,
    ) -> SendOutcome {
        let target_is_active = active == Some(&pending.session_id);
        let same_transcript = pending.transcript_generation == store.transcript_generation();
        if !target_is_active || !same_transcript || !store.contains(&pending.session_id) {
            warn!(
                session = %pending.session_id,
                ok = outcome.is_ok(),
                "discarding send outcome for deleted, deselected, or reloaded session"
            );
            self.phase = SendPhase::RolledBack;
            return SendOutcome::Discarded;
        }

        match outcome {
            Ok(reply) => {
                store.append_message(reply.clone());
                self.phase = SendPhase::Settled;
                SendOutcome::Settled { reply }
            }
            Err(error) => {
                // Undo the optimistic insert; the transcript ends up exactly
                // as it was before the attempt.
                store.remove_last_message();
                self.phase = SendPhase::RolledBack;
                SendOutcome::RolledBack { error }
            }
        }
    }
}
