//! Combined single-session state: transcript, recommendation ledger and
//! version timeline, plus the one request that may be in flight.
//!
//! Every request goes through two steps so the caller can do the I/O in
//! between: a `begin_*` call that claims the busy slot and appends the
//! user turn and a placeholder, then exactly one of
//! [`EditorState::complete_turn`] or [`EditorState::fail_turn`].

use crate::agent_response::AgentResponse;
use crate::chat::ChatTurn;
use crate::classifier::{self, TurnOutcome};
use crate::edit_queue::{self, EditMutation};
use crate::error::CoreError;
use crate::ledger::{Acceptance, RecommendationLedger};
use crate::merger::{self, TimelineItem};
use crate::recommendation::{Recommendation, RecommendationStatus};
use crate::session::SessionStateBlob;
use crate::types::{EditId, RecommendationId};
use crate::version_timeline::VersionTimeline;

/// Instruction sent to the agent when a recommendation without a video is
/// accepted.
pub const CONFIRM_APPLY_QUERY: &str = "apply this change";

/// Why a request was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnKind {
    /// Hidden opening instruction of a new session.
    Bootstrap,
    /// Free text typed by the user.
    Chat,
    /// Confirmation that materializes an accepted recommendation.
    Apply { recommendation_id: RecommendationId },
    /// Natural-language edit-queue mutation.
    EditMutation {
        mutation: EditMutation,
        edit_id: EditId,
    },
}

/// Context of the single in-flight request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTurn {
    pub request_id: u64,
    pub query: String,
    pub kind: TurnKind,
    /// Index of the placeholder agent turn the reply will replace.
    pub placeholder_index: usize,
}

impl PendingTurn {
    /// The recommendation this request is applying, if any.
    pub fn applying(&self) -> Option<&str> {
        match &self.kind {
            TurnKind::Apply { recommendation_id } => Some(recommendation_id),
            _ => None,
        }
    }
}

/// What completing a request did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnReport {
    Classified(TurnOutcome),
    EditMutation { edit_id: EditId, succeeded: bool },
}

impl TurnReport {
    pub fn snapshot_url(&self) -> Option<&str> {
        match self {
            Self::Classified(outcome) => outcome.snapshot_url(),
            Self::EditMutation { .. } => None,
        }
    }
}

/// Next step after the user accepts a recommendation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptStep {
    /// Accepted and appended to the timeline; persist a version for it.
    Applied { video_url: String },
    /// The confirmation request must be sent to the agent.
    Confirm(PendingTurn),
}

#[derive(Debug, Clone)]
pub struct EditorState {
    turns: Vec<ChatTurn>,
    ledger: RecommendationLedger,
    timeline: VersionTimeline,
    in_flight: Option<PendingTurn>,
    next_request_id: u64,
}

impl EditorState {
    pub fn new(original_video_url: impl Into<String>) -> Self {
        Self {
            turns: Vec::new(),
            ledger: RecommendationLedger::new(),
            timeline: VersionTimeline::new(original_video_url),
            in_flight: None,
            next_request_id: 1,
        }
    }

    /// Rehydrate from a persisted blob.
    ///
    /// The version timeline is rebuilt from the original video followed by
    /// every video-bearing ACCEPTED recommendation in acceptance order.
    /// Recommendations persisted mid-apply go back to PENDING.
    pub fn restore(original_video_url: impl Into<String>, blob: SessionStateBlob) -> Self {
        let mut recommendations = blob.recommendations;
        for rec in &mut recommendations {
            if rec.status == RecommendationStatus::Processing {
                tracing::debug!(recommendation_id = %rec.id, "Reopening interrupted apply");
                rec.status = RecommendationStatus::Pending;
            }
        }
        let ledger = RecommendationLedger::from_recommendations(recommendations);

        let mut timeline = VersionTimeline::new(original_video_url);
        for rec in ledger.accepted_in_order() {
            if let Some(url) = &rec.video_url {
                timeline.append(url.clone());
            }
        }

        Self {
            turns: blob.messages,
            ledger,
            timeline,
            in_flight: None,
            next_request_id: 1,
        }
    }

    pub fn to_blob(&self) -> SessionStateBlob {
        SessionStateBlob {
            messages: self.turns.clone(),
            recommendations: self.ledger.as_slice().to_vec(),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn ledger(&self) -> &RecommendationLedger {
        &self.ledger
    }

    pub fn timeline(&self) -> &VersionTimeline {
        &self.timeline
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<&PendingTurn> {
        self.in_flight.as_ref()
    }

    /// Recommendation currently being applied, if any.
    pub fn applying(&self) -> Option<&str> {
        self.in_flight.as_ref().and_then(PendingTurn::applying)
    }

    pub fn recommendation(&self, id: &str) -> Option<&Recommendation> {
        self.ledger.get(id)
    }

    /// Render-ordered view of turns and recommendation cards.
    pub fn merged(&self) -> Vec<TimelineItem> {
        merger::merge(&self.turns, self.ledger.as_slice())
    }

    pub fn version_label(&self, index: usize) -> String {
        self.timeline.label(index, self.applying().is_some())
    }

    // -----------------------------------------------------------------------
    // Requests
    // -----------------------------------------------------------------------

    /// Start a chat turn for text typed by the user.
    pub fn begin_turn(&mut self, query: &str) -> Result<PendingTurn, CoreError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(CoreError::Validation("Message must not be empty".to_string()));
        }
        self.begin(ChatTurn::user(query), TurnKind::Chat)
    }

    /// Start the hidden opening turn of a new session.
    pub fn begin_bootstrap(&mut self, instruction: &str) -> Result<PendingTurn, CoreError> {
        self.begin(ChatTurn::bootstrap(instruction), TurnKind::Bootstrap)
    }

    pub fn begin_edit_mutation(
        &mut self,
        mutation: EditMutation,
        edit_id: &str,
    ) -> Result<PendingTurn, CoreError> {
        self.begin(
            ChatTurn::user(mutation.query(edit_id)),
            TurnKind::EditMutation {
                mutation,
                edit_id: edit_id.to_string(),
            },
        )
    }

    /// Finish the in-flight request with the agent's reply.
    pub fn complete_turn(
        &mut self,
        pending: &PendingTurn,
        response: AgentResponse,
    ) -> Result<TurnReport, CoreError> {
        self.release(pending)?;
        let index = pending.placeholder_index;

        match &pending.kind {
            TurnKind::EditMutation { mutation, edit_id } => {
                let succeeded = !edit_queue::mutation_failed(&response.text);
                self.turns[index] = if succeeded {
                    ChatTurn::agent(response.text, response.media).with_edit_queue_success()
                } else {
                    tracing::warn!(%edit_id, verb = mutation.verb(), "Edit mutation rejected");
                    ChatTurn::error(format_args!(
                        "{} edit {edit_id} failed: {}",
                        mutation.verb(),
                        response.text
                    ))
                };
                Ok(TurnReport::EditMutation {
                    edit_id: edit_id.clone(),
                    succeeded,
                })
            }
            kind => {
                self.turns[index] = ChatTurn::agent(response.text.clone(), response.media.clone());
                let applying = match kind {
                    TurnKind::Apply { recommendation_id } => Some(recommendation_id.as_str()),
                    _ => None,
                };
                let outcome = classifier::apply_response(
                    &mut self.ledger,
                    &mut self.timeline,
                    &response,
                    index,
                    applying,
                );
                Ok(TurnReport::Classified(outcome))
            }
        }
    }

    /// Finish the in-flight request after the agent call itself failed.
    ///
    /// The placeholder becomes an error turn; an apply in progress goes back
    /// to PENDING. Nothing else changes.
    pub fn fail_turn(
        &mut self,
        pending: &PendingTurn,
        error: impl std::fmt::Display,
    ) -> Result<(), CoreError> {
        self.release(pending)?;
        self.turns[pending.placeholder_index] = ChatTurn::error(error);
        if let Some(id) = pending.applying() {
            self.ledger.revert_processing(id)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Decisions
    // -----------------------------------------------------------------------

    pub fn accept(&mut self, id: &str) -> Result<AcceptStep, CoreError> {
        let rec = self.ledger.get(id).ok_or_else(|| CoreError::NotFound {
            entity: "recommendation",
            id: id.to_string(),
        })?;
        // The confirmation request needs the busy slot; claim nothing if taken.
        if rec.needs_materialization() && self.is_busy() {
            return Err(CoreError::Busy(
                "A request is already in flight".to_string(),
            ));
        }

        match self.ledger.accept(id)? {
            Acceptance::Applied { video_url } => {
                self.timeline.append(video_url.clone());
                tracing::info!(recommendation_id = %id, %video_url, "Recommendation accepted");
                Ok(AcceptStep::Applied { video_url })
            }
            Acceptance::NeedsMaterialization => {
                tracing::info!(recommendation_id = %id, "Recommendation processing");
                let pending = self.begin(
                    ChatTurn::user(CONFIRM_APPLY_QUERY),
                    TurnKind::Apply {
                        recommendation_id: id.to_string(),
                    },
                )?;
                Ok(AcceptStep::Confirm(pending))
            }
        }
    }

    pub fn reject(&mut self, id: &str) -> Result<(), CoreError> {
        self.ledger.reject(id)?;
        tracing::info!(recommendation_id = %id, "Recommendation rejected");
        Ok(())
    }

    /// Undo the most recently accepted recommendation. Any other id is a
    /// silent no-op; returns whether anything changed.
    pub fn undo(&mut self, id: &str) -> bool {
        let Some(undone) = self.ledger.undo(id) else {
            tracing::debug!(recommendation_id = %id, "Undo ignored: not the latest acceptance");
            return false;
        };
        if let Some(url) = undone.video_url {
            self.timeline.pop_latest_accepted(&url);
        }
        tracing::info!(recommendation_id = %id, "Recommendation undone");
        true
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    pub fn step_back(&mut self) -> bool {
        self.timeline.step_back()
    }

    pub fn step_forward(&mut self) -> bool {
        self.timeline.step_forward()
    }

    // ---- private helpers ----

    fn begin(&mut self, user_turn: ChatTurn, kind: TurnKind) -> Result<PendingTurn, CoreError> {
        if self.is_busy() {
            return Err(CoreError::Busy(
                "A request is already in flight".to_string(),
            ));
        }
        let query = user_turn.text.clone();
        self.turns.push(user_turn);
        self.turns.push(ChatTurn::placeholder());

        let pending = PendingTurn {
            request_id: self.next_request_id,
            query,
            kind,
            placeholder_index: self.turns.len() - 1,
        };
        self.next_request_id += 1;
        self.in_flight = Some(pending.clone());
        Ok(pending)
    }

    fn release(&mut self, pending: &PendingTurn) -> Result<(), CoreError> {
        match &self.in_flight {
            Some(current) if current.request_id == pending.request_id => {
                self.in_flight = None;
                Ok(())
            }
            _ => Err(CoreError::Conflict(format!(
                "Request {} is not in flight",
                pending.request_id
            ))),
        }
    }
}
