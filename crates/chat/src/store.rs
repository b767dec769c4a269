//! In-memory session list and active transcript.

use proto::{Message, SessionId, SessionSummary};
use tracing::warn;

/// Owns the canonical session-summary list and the active session's
/// message sequence.
///
/// The store applies each mutation as one atomic step and never infers
/// selection changes: removing the active session's summary does not clear
/// the transcript — that is the controller's call to make.
#[derive(Debug, Default)]
pub struct SessionStore {
    /// Session summaries in display order (server-defined, newest first).
    summaries: Vec<SessionSummary>,
    /// Message sequence of the active session, in send order.
    messages: Vec<Message>,
    /// Bumped on every wholesale transcript replacement. Appends and
    /// rollbacks belong to the current load and do not bump it.
    transcript_generation: u64,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Read access ──────────────────────────────────────────

    /// Session summaries in display order.
    pub fn summaries(&self) -> &[SessionSummary] {
        &self.summaries
    }

    /// The active session's transcript.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns `true` when a summary with the given id is present.
    pub fn contains(&self, id: &SessionId) -> bool {
        self.summaries.iter().any(|s| &s.id == id)
    }

    /// Identifies the current transcript load. A completion captured under
    /// an older generation targets a buffer that has since been replaced
    /// and must not touch the messages on display.
    pub fn transcript_generation(&self) -> u64 {
        self.transcript_generation
    }

    // ── Summary-list mutations ───────────────────────────────

    /// Replaces the whole summary list after a full refresh. Preserves no
    /// stale entries.
    pub fn replace_all(&mut self, summaries: Vec<SessionSummary>) {
        self.summaries = summaries;
    }

    /// Inserts a newly created session at the front (most-recent-first).
    pub fn insert_at_front(&mut self, summary: SessionSummary) {
        self.summaries.insert(0, summary);
    }

    /// Removes the summary with the given id. Returns `false` when no such
    /// entry existed.
    pub fn remove(&mut self, id: &SessionId) -> bool {
        let before = self.summaries.len();
        self.summaries.retain(|s| &s.id != id);
        self.summaries.len() != before
    }

    // ── Transcript mutations ─────────────────────────────────

    /// Replaces the full message sequence for display and starts a new
    /// transcript generation.
    pub fn set_active_messages(&mut self, messages: Vec<Message>) {
        self.messages = messages;
        self.transcript_generation += 1;
    }

    /// Appends one message to the active transcript.
    pub fn append_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Removes the most recent message (rollback of an optimistic insert).
    ///
    /// No-ops on an empty sequence so that a rollback applied twice cannot
    /// eat a message it did not insert.
    pub fn remove_last_message(&mut self) {
        if self.messages.pop().is_none() {
            warn!("rollback requested on empty transcript; ignoring");
        }
    }
}
