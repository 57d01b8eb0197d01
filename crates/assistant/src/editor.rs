//! One user's editor session: drives [`EditorState`] through the service
//! gateways.
//!
//! State lives behind an async mutex that is never held across a gateway
//! call. A request claims the busy slot under the lock, releases it for the
//! agent round trip and re-takes it to record the reply, so a second
//! submission during that window is rejected with `Busy`. Switching
//! sessions bumps an epoch; replies and refreshes carrying an older epoch
//! are dropped.

use tokio::sync::Mutex;

use vidchat_core::edit_queue::{EditMutation, EditQueueSnapshot, EditQueueTracker};
use vidchat_core::error::CoreError;
use vidchat_core::session::{NewSession, Session, SessionStateBlob, SessionVersion};
use vidchat_core::state::{AcceptStep, EditorState, PendingTurn, TurnReport};
use vidchat_core::types::SessionPk;
use vidchat_gateway::{AgentRequest, Gateways, SessionFilter};

use crate::error::SessionError;

/// Hidden instruction sent as the first turn of a new session.
pub fn bootstrap_instruction(video_url: &str, feature_id: Option<&str>) -> String {
    match feature_id {
        Some(feature) => format!(
            "The video to edit is at {video_url}. The requested change is tracked as feature {feature}."
        ),
        None => format!("The video to edit is at {video_url}."),
    }
}

/// Identity of the session currently open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenSession {
    pub session_id: String,
    pub session_pk: SessionPk,
    pub video_id: Option<String>,
    pub original_video_url: String,
}

/// Result of accepting a recommendation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptOutcome {
    /// The recommendation already carried a video and went straight to the
    /// timeline.
    Applied { video_url: String },
    /// The agent was asked to produce the video; this is what its reply did.
    Materialized(TurnReport),
}

struct Inner {
    open: Option<OpenSession>,
    state: EditorState,
    tracker: EditQueueTracker,
    edit_queue: Option<EditQueueSnapshot>,
    persist_error: Option<String>,
    epoch: u64,
}

impl Inner {
    fn empty(epoch: u64) -> Self {
        Self {
            open: None,
            state: EditorState::new(String::new()),
            tracker: EditQueueTracker::new(),
            edit_queue: None,
            persist_error: None,
            epoch,
        }
    }

    /// Drop everything belonging to the current session.
    fn reset(&mut self) -> u64 {
        *self = Self::empty(self.epoch + 1);
        self.epoch
    }

    fn require_open(&self) -> Result<OpenSession, SessionError> {
        self.open.clone().ok_or(SessionError::NoSession)
    }
}

/// A request that has claimed the busy slot.
struct Ticket {
    pending: PendingTurn,
    epoch: u64,
    open: OpenSession,
}

pub struct EditorSession {
    gateways: Gateways,
    user_id: String,
    feature_id: Option<String>,
    inner: Mutex<Inner>,
}

impl EditorSession {
    pub fn new(gateways: Gateways, user_id: impl Into<String>, feature_id: Option<String>) -> Self {
        Self {
            gateways,
            user_id: user_id.into(),
            feature_id,
            inner: Mutex::new(Inner::empty(0)),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    // -----------------------------------------------------------------------
    // Session lifecycle
    // -----------------------------------------------------------------------

    /// Create a session for `video_url`, make it current and send the hidden
    /// opening turn. A failed opening turn is recorded in the transcript and
    /// does not fail the call.
    pub async fn open_new(
        &self,
        video_id: Option<String>,
        video_url: &str,
    ) -> Result<SessionPk, SessionError> {
        let session_id = uuid::Uuid::new_v4().to_string();
        let session_pk = self
            .gateways
            .sessions
            .create(&NewSession {
                user_id: self.user_id.clone(),
                session_id: session_id.clone(),
                video_id: video_id.clone(),
                video_url: Some(video_url.to_string()),
                feature_id: self.feature_id.clone(),
            })
            .await?;

        let open = OpenSession {
            session_id,
            session_pk,
            video_id,
            original_video_url: video_url.to_string(),
        };
        let ticket = {
            let mut inner = self.inner.lock().await;
            let epoch = inner.reset();
            inner.open = Some(open.clone());
            inner.state = EditorState::new(video_url);
            let instruction = bootstrap_instruction(video_url, self.feature_id.as_deref());
            let pending = inner.state.begin_bootstrap(&instruction)?;
            Ticket {
                pending,
                epoch,
                open,
            }
        };

        tracing::info!(
            session_id = %ticket.open.session_id,
            session_pk,
            "Opened new session"
        );
        if let Err(e) = self.run(ticket).await {
            tracing::warn!(session_pk, error = %e, "Opening turn failed");
        }
        Ok(session_pk)
    }

    /// Switch to an existing session. In-memory state is cleared before the
    /// stored session is fetched, then rebuilt from its persisted blob.
    pub async fn load(&self, session_id: &str) -> Result<OpenSession, SessionError> {
        let epoch = self.inner.lock().await.reset();

        let session = self.gateways.sessions.get(&self.user_id, session_id).await?;
        let blob = SessionStateBlob::from_state(session.state.as_ref())?;
        let original = session.video_url.clone().unwrap_or_else(|| {
            tracing::warn!(session_id, "Session has no original video");
            String::new()
        });
        let open = OpenSession {
            session_id: session.session_id.clone(),
            session_pk: session.pk,
            video_id: session.video_id.clone(),
            original_video_url: original.clone(),
        };

        {
            let mut inner = self.inner.lock().await;
            if inner.epoch != epoch {
                return Err(SessionError::Superseded);
            }
            inner.open = Some(open.clone());
            inner.state = EditorState::restore(original, blob);
            tracing::info!(
                session_id,
                turns = inner.state.turns().len(),
                recommendations = inner.state.ledger().len(),
                versions = inner.state.timeline().len(),
                "Session restored"
            );
        }

        self.refresh_edit_queue(&open, epoch).await;
        Ok(open)
    }

    pub async fn list_sessions(&self, filter: &SessionFilter) -> Result<Vec<Session>, SessionError> {
        Ok(self.gateways.sessions.list(&self.user_id, filter).await?)
    }

    pub async fn rename(&self, new_name: &str) -> Result<(), SessionError> {
        let open = self.inner.lock().await.require_open()?;
        self.gateways
            .sessions
            .rename(&self.user_id, &open.session_id, new_name)
            .await?;
        tracing::info!(session_id = %open.session_id, new_name, "Session renamed");
        Ok(())
    }

    /// Delete the current session and close it.
    pub async fn delete(&self) -> Result<(), SessionError> {
        let open = self.inner.lock().await.require_open()?;
        self.gateways
            .sessions
            .delete(&self.user_id, &open.session_id)
            .await?;
        self.inner.lock().await.reset();
        tracing::info!(session_id = %open.session_id, "Session deleted");
        Ok(())
    }

    /// Delete every session of this user and close the current one.
    pub async fn delete_all(&self) -> Result<u64, SessionError> {
        let deleted = self.gateways.sessions.delete_all(&self.user_id).await?;
        self.inner.lock().await.reset();
        Ok(deleted)
    }

    /// Stored version snapshots of the current session, oldest first.
    pub async fn versions(&self) -> Result<Vec<SessionVersion>, SessionError> {
        let open = self.inner.lock().await.require_open()?;
        Ok(self.gateways.sessions.versions(open.session_pk).await?)
    }

    // -----------------------------------------------------------------------
    // Turns and decisions
    // -----------------------------------------------------------------------

    /// Send text typed by the user to the agent.
    pub async fn submit(&self, text: &str) -> Result<TurnReport, SessionError> {
        let ticket = self.begin(|state| state.begin_turn(text)).await?;
        self.run(ticket).await
    }

    pub async fn accept(&self, id: &str) -> Result<AcceptOutcome, SessionError> {
        let (step, open, epoch) = {
            let mut inner = self.inner.lock().await;
            let open = inner.require_open()?;
            (inner.state.accept(id)?, open, inner.epoch)
        };

        match step {
            AcceptStep::Applied { video_url } => {
                self.snapshot(&open, &video_url).await;
                self.sync(&open, epoch).await;
                Ok(AcceptOutcome::Applied { video_url })
            }
            AcceptStep::Confirm(pending) => {
                let report = self
                    .run(Ticket {
                        pending,
                        epoch,
                        open,
                    })
                    .await?;
                Ok(AcceptOutcome::Materialized(report))
            }
        }
    }

    pub async fn reject(&self, id: &str) -> Result<(), SessionError> {
        let (open, epoch) = {
            let mut inner = self.inner.lock().await;
            let open = inner.require_open()?;
            inner.state.reject(id)?;
            (open, inner.epoch)
        };
        self.sync(&open, epoch).await;
        Ok(())
    }

    /// Undo `id` if it is the most recent acceptance. Returns whether
    /// anything changed; undoing anything else is a no-op.
    pub async fn undo(&self, id: &str) -> Result<bool, SessionError> {
        let (open, epoch, changed) = {
            let mut inner = self.inner.lock().await;
            let open = inner.require_open()?;
            let changed = inner.state.undo(id);
            (open, inner.epoch, changed)
        };
        if changed {
            self.sync(&open, epoch).await;
        }
        Ok(changed)
    }

    /// Ask the agent to remove, reactivate or deactivate an edit. The edit
    /// queue is refreshed whatever the outcome.
    pub async fn mutate_edit(
        &self,
        mutation: EditMutation,
        edit_id: &str,
    ) -> Result<TurnReport, SessionError> {
        let ticket = self
            .begin(|state| state.begin_edit_mutation(mutation, edit_id))
            .await?;
        self.run(ticket).await
    }

    // -----------------------------------------------------------------------
    // Navigation and export
    // -----------------------------------------------------------------------

    pub async fn step_back(&self) -> bool {
        self.inner.lock().await.state.step_back()
    }

    pub async fn step_forward(&self) -> bool {
        self.inner.lock().await.state.step_forward()
    }

    /// Publish the version under the cursor; returns its public URL.
    pub async fn export_current(&self) -> Result<String, SessionError> {
        let video_url = {
            let inner = self.inner.lock().await;
            inner.require_open()?;
            inner.state.timeline().current_url().to_string()
        };
        if video_url.is_empty() {
            return Err(CoreError::Validation("No video to export".to_string()).into());
        }
        Ok(self.gateways.export.export(&video_url).await?)
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    /// Run `f` against the current state.
    pub async fn view<R>(&self, f: impl FnOnce(&EditorState) -> R) -> R {
        f(&self.inner.lock().await.state)
    }

    pub async fn session(&self) -> Option<OpenSession> {
        self.inner.lock().await.open.clone()
    }

    pub async fn is_busy(&self) -> bool {
        self.inner.lock().await.state.is_busy()
    }

    pub async fn edit_queue(&self) -> Option<EditQueueSnapshot> {
        self.inner.lock().await.edit_queue.clone()
    }

    /// Whether the edit queue grew since the indicator was last cleared.
    pub async fn has_new_edits(&self) -> bool {
        self.inner.lock().await.tracker.has_new_edits()
    }

    pub async fn acknowledge_new_edits(&self) {
        self.inner.lock().await.tracker.acknowledge();
    }

    /// Message of the last failed state save, until dismissed.
    pub async fn persist_error(&self) -> Option<String> {
        self.inner.lock().await.persist_error.clone()
    }

    pub async fn dismiss_persist_error(&self) {
        self.inner.lock().await.persist_error = None;
    }

    // ---- private helpers ----

    async fn begin(
        &self,
        start: impl FnOnce(&mut EditorState) -> Result<PendingTurn, CoreError>,
    ) -> Result<Ticket, SessionError> {
        let mut inner = self.inner.lock().await;
        let open = inner.require_open()?;
        let pending = start(&mut inner.state)?;
        Ok(Ticket {
            pending,
            epoch: inner.epoch,
            open,
        })
    }

    /// Send a claimed request, record the reply and sync. Agent failures are
    /// written to the transcript and then returned.
    async fn run(&self, ticket: Ticket) -> Result<TurnReport, SessionError> {
        let request = AgentRequest {
            query: ticket.pending.query.clone(),
            feature_id: self.feature_id.clone(),
            user_id: self.user_id.clone(),
            session_id: ticket.open.session_id.clone(),
        };
        let reply = self.gateways.agent.ask(&request).await;

        let result = {
            let mut inner = self.inner.lock().await;
            if inner.epoch != ticket.epoch {
                tracing::debug!(
                    session_id = %ticket.open.session_id,
                    request_id = ticket.pending.request_id,
                    "Discarding reply for a closed session"
                );
                return Err(SessionError::Superseded);
            }
            match reply {
                Ok(response) => inner
                    .state
                    .complete_turn(&ticket.pending, response)
                    .map_err(SessionError::from),
                Err(err) => {
                    tracing::warn!(
                        session_id = %ticket.open.session_id,
                        timeout = err.is_timeout(),
                        error = %err,
                        "Agent call failed"
                    );
                    inner.state.fail_turn(&ticket.pending, &err)?;
                    Err(err.into())
                }
            }
        };

        if let Ok(report) = &result {
            tracing::debug!(session_id = %ticket.open.session_id, ?report, "Turn completed");
            if let Some(url) = report.snapshot_url() {
                self.snapshot(&ticket.open, url).await;
            }
        }
        self.sync(&ticket.open, ticket.epoch).await;
        result
    }

    /// Record a version snapshot. Failures are logged only; the acceptance
    /// stands.
    async fn snapshot(&self, open: &OpenSession, video_url: &str) {
        match self
            .gateways
            .sessions
            .create_version(open.session_pk, Some(video_url))
            .await
        {
            Ok(version_id) => tracing::info!(
                session_pk = open.session_pk,
                version_id,
                video_url,
                "Version snapshot stored"
            ),
            Err(e) => tracing::warn!(
                session_pk = open.session_pk,
                video_url,
                error = %e,
                "Version snapshot failed"
            ),
        }
    }

    /// Persist the state blob and refresh the edit queue concurrently.
    async fn sync(&self, open: &OpenSession, epoch: u64) {
        tokio::join!(self.persist(open, epoch), self.refresh_edit_queue(open, epoch));
    }

    async fn persist(&self, open: &OpenSession, epoch: u64) {
        let blob = {
            let inner = self.inner.lock().await;
            if inner.epoch != epoch {
                return;
            }
            inner.state.to_blob()
        };

        let result = match blob.to_value() {
            Ok(state) => self
                .gateways
                .sessions
                .update_state(&self.user_id, &open.session_id, &state)
                .await
                .map_err(SessionError::from),
            Err(e) => Err(e.into()),
        };

        if let Err(e) = result {
            tracing::warn!(session_id = %open.session_id, error = %e, "Saving session state failed");
            let mut inner = self.inner.lock().await;
            if inner.epoch == epoch {
                inner.persist_error = Some(e.to_string());
            }
        }
    }

    async fn refresh_edit_queue(&self, open: &OpenSession, epoch: u64) {
        let snapshot = match self
            .gateways
            .edit_queue
            .fetch(&self.user_id, &open.session_id)
            .await
        {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(session_id = %open.session_id, error = %e, "Edit queue refresh failed");
                return;
            }
        };

        let mut inner = self.inner.lock().await;
        if inner.epoch != epoch {
            return;
        }
        if inner.tracker.observe(&snapshot) {
            tracing::debug!(
                session_id = %open.session_id,
                edits = snapshot.edits.len(),
                "New edits in queue"
            );
        }
        inner.edit_queue = Some(snapshot);
    }
}
