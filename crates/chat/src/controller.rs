//! Selection controller and facade over store, protocol, and gateway.

use std::future::Future;
use std::sync::Arc;

use gateway::SessionGateway;
use proto::{ApiError, Error, Message, SessionId};
use tracing::{debug, warn};

use crate::protocol::{PendingSend, SendOutcome, SendPhase, SendProtocol};
use crate::store::SessionStore;

/// Owns the session store and send protocol, tracks the active session,
/// and mediates every gateway interaction.
///
/// All state transitions are driven by discrete calls on `&mut self`, so no
/// two mutations interleave mid-step. Network completions for sends arrive
/// as separate events: [`ChatController::begin_send`] admits and inserts,
/// [`ChatController::dispatch`] produces the detached request future, and
/// [`ChatController::complete_send`] applies the outcome — which lets a
/// deletion land while the reply is still in flight.
pub struct ChatController<G> {
    gateway: Arc<G>,
    store: SessionStore,
    active: Option<SessionId>,
    protocol: SendProtocol,
}

impl<G: SessionGateway + 'static> ChatController<G> {
    pub fn new(gateway: G) -> Self {
        Self::from_arc(Arc::new(gateway))
    }

    /// Builds a controller over a shared gateway handle. Useful when the
    /// caller keeps its own reference (tests, background refreshers).
    pub fn from_arc(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            store: SessionStore::new(),
            active: None,
            protocol: SendProtocol::new(),
        }
    }

    // ── Read access ──────────────────────────────────────────

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Id of the session currently on display, if any.
    pub fn active_session(&self) -> Option<&SessionId> {
        self.active.as_ref()
    }

    pub fn send_phase(&self) -> SendPhase {
        self.protocol.phase()
    }

    /// `true` while a send is outstanding.
    pub fn is_busy(&self) -> bool {
        self.protocol.is_busy()
    }

    // ── Session list ─────────────────────────────────────────

    /// Fetches the summary list and replaces the store's copy. The server's
    /// order is authoritative. Never touches the active transcript.
    pub async fn refresh_sessions(&mut self) -> Result<(), Error> {
        let summaries = self.gateway.list_sessions().await?;
        self.store.replace_all(summaries);
        Ok(())
    }

    // ── Selection ────────────────────────────────────────────

    /// Fetches the full session and makes it active. On failure the prior
    /// selection stays in place — the display never points at a session
    /// whose messages failed to load.
    pub async fn select_existing(&mut self, id: &SessionId) -> Result<(), Error> {
        let session = self.gateway.fetch_session(id).await?;
        if !self.store.contains(&session.id) {
            // Selected from outside the local list (stale or never loaded);
            // the next refresh restores the server's order.
            self.store.insert_at_front(session.summary());
        }
        self.active = Some(session.id.clone());
        self.store.set_active_messages(session.messages);
        Ok(())
    }

    /// Creates a session remotely, inserts it at the front of the list, and
    /// selects it with an empty transcript.
    pub async fn create_and_select(&mut self) -> Result<(), Error> {
        let session = self.gateway.create_session().await?;
        self.store.insert_at_front(session.summary());
        self.active = Some(session.id.clone());
        self.store.set_active_messages(Vec::new());
        Ok(())
    }

    /// Deletes a session remotely and removes it from the list. When the
    /// deleted session was active, selection and transcript are cleared —
    /// even while a send for it is awaiting its reply; the late reply will
    /// be discarded by [`ChatController::complete_send`].
    pub async fn delete_session(&mut self, id: &SessionId) -> Result<(), Error> {
        match self.gateway.delete_session(id).await {
            Ok(()) => {}
            // Already gone server-side: the desired end state holds.
            Err(ApiError::NotFound(_)) => {
                debug!(session = %id, "delete of unknown session treated as success");
            }
            Err(e) => return Err(e.into()),
        }

        self.store.remove(id);
        if self.active.as_ref() == Some(id) {
            self.active = None;
            self.store.set_active_messages(Vec::new());
        }
        Ok(())
    }

    // ── Send protocol ────────────────────────────────────────

    /// Admits a send attempt: ensures a session is active (creating one if
    /// needed), inserts the optimistic user message, and returns the
    /// pending handle to dispatch.
    ///
    /// Returns `Ok(None)` while a previous send is outstanding — admission
    /// control, not a queue; the extra request is silently ignored.
    pub async fn begin_send(&mut self, content: &str) -> Result<Option<PendingSend>, Error> {
        if self.protocol.is_busy() {
            debug!("send ignored: another send is outstanding");
            return Ok(None);
        }

        let content = content.trim();
        if content.is_empty() {
            return Err(ApiError::Validation("message content is empty".to_string()).into());
        }

        self.protocol.enter_ensuring();
        let session_id = match self.active.clone() {
            Some(id) => id,
            None => match self.gateway.create_session().await {
                Ok(session) => {
                    self.store.insert_at_front(session.summary());
                    self.active = Some(session.id.clone());
                    self.store.set_active_messages(Vec::new());
                    session.id
                }
                Err(e) => {
                    self.protocol.abort_ensuring();
                    return Err(e.into());
                }
            },
        };

        let pending = self
            .protocol
            .insert_optimistic(&mut self.store, session_id, content);
        self.protocol.await_reply();
        Ok(Some(pending))
    }

    /// Produces the network request for a pending send as an owned future,
    /// detached from the controller borrow. No cancellation is offered;
    /// a stale completion is disregarded instead.
    pub fn dispatch(
        &self,
        pending: &PendingSend,
    ) -> impl Future<Output = Result<Message, ApiError>> + Send + 'static {
        let gateway = Arc::clone(&self.gateway);
        let session_id = pending.session_id.clone();
        let content = pending.content.clone();
        async move { gateway.send_message(&session_id, &content).await }
    }

    /// Applies the remote outcome of a send. On success, additionally
    /// refreshes the summary list so sidebar titles and timestamps pick up
    /// server-side changes; a refresh failure is logged and never undoes
    /// the already-succeeded send.
    pub async fn complete_send(
        &mut self,
        pending: PendingSend,
        outcome: Result<Message, ApiError>,
    ) -> SendOutcome {
        let result =
            self.protocol
                .complete(&mut self.store, self.active.as_ref(), &pending, outcome);

        if matches!(result, SendOutcome::Settled { .. })
            && let Err(e) = self.refresh_sessions().await
        {
            warn!(error = %e, "session list refresh after send failed");
        }

        result
    }

    /// Sequential convenience: begin, dispatch, complete. Returns `None`
    /// when the send was ignored because another one is outstanding.
    pub async fn send(&mut self, content: &str) -> Result<Option<SendOutcome>, Error> {
        let Some(pending) = self.begin_send(content).await? else {
            return Ok(None);
        };
        let reply = self.dispatch(&pending).await;
        Ok(Some(self.complete_send(pending, reply).await))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use proto::{Session, SessionSummary};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Minimal scripted gateway: each op pops its next result in the order
    /// it was scripted; an empty script is a test bug.
    #[derive(Default)]
    struct ScriptedGateway {
        create: Mutex<VecDeque<Result<Session, ApiError>>>,
        list: Mutex<VecDeque<Result<Vec<SessionSummary>, ApiError>>>,
        fetch: Mutex<VecDeque<Result<Session, ApiError>>>,
        delete: Mutex<VecDeque<Result<(), ApiError>>>,
        send: Mutex<VecDeque<Result<Message, ApiError>>>,
    }

    fn pop<T>(queue: &Mutex<VecDeque<T>>, op: &str) -> T {
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted {op} result"))
    }

    #[async_trait]
    impl SessionGateway for ScriptedGateway {
        async fn create_session(&self) -> Result<Session, ApiError> {
            pop(&self.create, "create")
        }
        async fn list_sessions(&self) -> Result<Vec<SessionSummary>, ApiError> {
            pop(&self.list, "list")
        }
        async fn fetch_session(&self, _id: &SessionId) -> Result<Session, ApiError> {
            pop(&self.fetch, "fetch")
        }
        async fn delete_session(&self, _id: &SessionId) -> Result<(), ApiError> {
            pop(&self.delete, "delete")
        }
        async fn send_message(&self, _id: &SessionId, _content: &str) -> Result<Message, ApiError> {
            pop(&self.send, "send")
        }
    }

    fn session(id: &str, messages: Vec<Message>) -> Session {
        Session {
            id: SessionId::from(id),
            title: "New Chat".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            messages,
        }
    }

    #[tokio::test]
    async fn select_existing_failure_leaves_selection_unchanged() {
        let gateway = ScriptedGateway::default();
        gateway
            .fetch
            .lock()
            .unwrap()
            .push_back(Ok(session("s1", vec![Message::user("hi")])));
        gateway
            .fetch
            .lock()
            .unwrap()
            .push_back(Err(ApiError::NotFound("s2".to_string())));

        let mut controller = ChatController::new(gateway);
        controller
            .select_existing(&SessionId::from("s1"))
            .await
            .expect("first select");
        assert_eq!(controller.active_session().unwrap().as_str(), "s1");

        let err = controller
            .select_existing(&SessionId::from("s2"))
            .await
            .expect_err("second select should fail");
        assert!(err.to_string().contains("Not found"));
        // Prior selection and transcript intact.
        assert_eq!(controller.active_session().unwrap().as_str(), "s1");
        assert_eq!(controller.store().messages().len(), 1);
    }

    #[tokio::test]
    async fn delete_treats_not_found_as_success() {
        let gateway = ScriptedGateway::default();
        gateway
            .delete
            .lock()
            .unwrap()
            .push_back(Err(ApiError::NotFound("s1".to_string())));

        let mut controller = ChatController::new(gateway);
        controller
            .delete_session(&SessionId::from("s1"))
            .await
            .expect("not-found delete is success");
    }

    #[tokio::test]
    async fn delete_failure_leaves_list_intact() {
        let gateway = ScriptedGateway::default();
        gateway.create.lock().unwrap().push_back(Ok(session("s1", vec![])));
        gateway.delete.lock().unwrap().push_back(Err(ApiError::Network(
            "connection reset".to_string(),
        )));

        let mut controller = ChatController::new(gateway);
        controller.create_and_select().await.expect("create");

        let err = controller
            .delete_session(&SessionId::from("s1"))
            .await
            .expect_err("network failure propagates");
        assert!(err.to_string().contains("Network"));
        assert_eq!(controller.store().summaries().len(), 1);
        assert_eq!(controller.active_session().unwrap().as_str(), "s1");
    }

    #[tokio::test]
    async fn begin_send_rejects_empty_content_before_any_state_change() {
        let gateway = ScriptedGateway::default();
        let mut controller = ChatController::new(gateway);

        let err = controller.begin_send("   ").await.expect_err("empty content");
        assert!(err.to_string().contains("Invalid input"));
        assert!(controller.store().messages().is_empty());
        assert!(!controller.is_busy());
    }

    #[tokio::test]
    async fn ensure_session_failure_surfaces_without_insert() {
        let gateway = ScriptedGateway::default();
        gateway.create.lock().unwrap().push_back(Err(ApiError::Server {
            status: 500,
            detail: "cannot create".to_string(),
        }));

        let mut controller = ChatController::new(gateway);
        let err = controller.begin_send("hello").await.expect_err("create fails");
        assert!(err.to_string().contains("500"));
        assert!(controller.store().messages().is_empty());
        assert!(controller.store().summaries().is_empty());
        assert_eq!(controller.send_phase(), SendPhase::RolledBack);
        assert!(!controller.is_busy());
    }
}
