//! Recommendation ledger: the set of recommendations of one session and the
//! only place their status changes.
//!
//! ```text
//! PENDING    --accept (has video)------------> ACCEPTED
//! PENDING    --accept (no video)-------------> PROCESSING --materialized--> ACCEPTED
//! PENDING    --reject------------------------> REJECTED
//! ACCEPTED   --undo (latest accepted only)---> PENDING
//! PROCESSING --apply failure-----------------> PENDING
//! ```
//!
//! Recommendations are never deleted.

use crate::error::CoreError;
use crate::recommendation::{Recommendation, RecommendationStatus};

/// What the caller must do after a successful `accept`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acceptance {
    /// Accepted immediately; the video becomes a new version.
    Applied { video_url: String },
    /// Moved to PROCESSING; the agent must be asked to apply it.
    NeedsMaterialization,
}

/// Result of a successful `undo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Undone {
    pub video_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationLedger {
    items: Vec<Recommendation>,
    next_seq: u64,
}

impl RecommendationLedger {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            next_seq: 1,
        }
    }

    /// Rebuild a ledger from persisted recommendations.
    pub fn from_recommendations(items: Vec<Recommendation>) -> Self {
        let next_seq = items
            .iter()
            .filter_map(|r| r.acceptance_seq)
            .max()
            .unwrap_or(0)
            + 1;
        Self { items, next_seq }
    }

    pub fn as_slice(&self) -> &[Recommendation] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recommendation> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Recommendation> {
        self.items.iter().find(|r| r.id == id)
    }

    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    /// Add a new PENDING recommendation unless it duplicates an existing one.
    ///
    /// Returns the stored recommendation, or `None` when suppressed.
    pub fn propose(&mut self, mut candidate: Recommendation) -> Option<&Recommendation> {
        if let Some(existing) = self.items.iter().find(|r| candidate.duplicates(r)) {
            tracing::debug!(
                existing_id = %existing.id,
                "Suppressed duplicate recommendation"
            );
            return None;
        }
        candidate.status = RecommendationStatus::Pending;
        candidate.acceptance_seq = None;
        self.items.push(candidate);
        self.items.last()
    }

    /// Record an edit the agent already applied, as ACCEPTED.
    pub fn record_applied(&mut self, mut record: Recommendation) -> &Recommendation {
        record.status = RecommendationStatus::Accepted;
        record.acceptance_seq = Some(self.take_seq());
        self.items.push(record);
        &self.items[self.items.len() - 1]
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    pub fn accept(&mut self, id: &str) -> Result<Acceptance, CoreError> {
        let seq = self.next_seq;
        let rec = self.get_mut(id)?;
        expect_status(rec, RecommendationStatus::Pending, "accept")?;

        match rec.video_url.clone() {
            Some(video_url) => {
                rec.status = RecommendationStatus::Accepted;
                rec.acceptance_seq = Some(seq);
                self.next_seq += 1;
                Ok(Acceptance::Applied { video_url })
            }
            None => {
                rec.status = RecommendationStatus::Processing;
                Ok(Acceptance::NeedsMaterialization)
            }
        }
    }

    /// Finish an apply: the agent produced `video_url` for `id`.
    pub fn complete_materialization(&mut self, id: &str, video_url: &str) -> Result<(), CoreError> {
        let seq = self.next_seq;
        let rec = self.get_mut(id)?;
        if !matches!(
            rec.status,
            RecommendationStatus::Pending | RecommendationStatus::Processing
        ) {
            return Err(CoreError::Conflict(format!(
                "Cannot materialize recommendation {id} in status {}",
                rec.status
            )));
        }
        rec.status = RecommendationStatus::Accepted;
        rec.video_url = Some(video_url.to_string());
        rec.acceptance_seq = Some(seq);
        self.next_seq += 1;
        Ok(())
    }

    /// Apply failed: PROCESSING goes back to PENDING.
    pub fn revert_processing(&mut self, id: &str) -> Result<(), CoreError> {
        let rec = self.get_mut(id)?;
        expect_status(rec, RecommendationStatus::Processing, "revert")?;
        rec.status = RecommendationStatus::Pending;
        Ok(())
    }

    pub fn reject(&mut self, id: &str) -> Result<(), CoreError> {
        let rec = self.get_mut(id)?;
        expect_status(rec, RecommendationStatus::Pending, "reject")?;
        rec.status = RecommendationStatus::Rejected;
        Ok(())
    }

    /// Re-open the most recently accepted recommendation.
    ///
    /// Any other id, including earlier accepted ones, is ignored and yields
    /// `None` without changing anything.
    pub fn undo(&mut self, id: &str) -> Option<Undone> {
        if !self.is_latest_accepted(id) {
            return None;
        }
        let rec = self.items.iter_mut().find(|r| r.id == id)?;
        rec.status = RecommendationStatus::Pending;
        rec.acceptance_seq = None;
        Some(Undone {
            video_url: rec.video_url.clone(),
        })
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The tail of the ACCEPTED subsequence in acceptance order.
    pub fn latest_accepted(&self) -> Option<&Recommendation> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, r)| r.status == RecommendationStatus::Accepted)
            .max_by_key(|(position, r)| (r.acceptance_seq.unwrap_or(0), *position))
            .map(|(_, r)| r)
    }

    pub fn is_latest_accepted(&self, id: &str) -> bool {
        self.latest_accepted().is_some_and(|r| r.id == id)
    }

    /// ACCEPTED recommendations, oldest acceptance first.
    pub fn accepted_in_order(&self) -> Vec<&Recommendation> {
        let mut accepted: Vec<(usize, &Recommendation)> = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, r)| r.status == RecommendationStatus::Accepted)
            .collect();
        accepted.sort_by_key(|(position, r)| (r.acceptance_seq.unwrap_or(0), *position));
        accepted.into_iter().map(|(_, r)| r).collect()
    }

    /// Normalized copies of every recommendation in `status`.
    pub fn with_status(&self, status: RecommendationStatus) -> Vec<Recommendation> {
        self.items
            .iter()
            .filter(|r| r.status == status)
            .map(Recommendation::normalized)
            .collect()
    }

    pub fn count_with_status(&self, status: RecommendationStatus) -> usize {
        self.items.iter().filter(|r| r.status == status).count()
    }

    // ---- private helpers ----

    fn get_mut(&mut self, id: &str) -> Result<&mut Recommendation, CoreError> {
        self.items
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| CoreError::NotFound {
                entity: "recommendation",
                id: id.to_string(),
            })
    }

    fn take_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

impl Default for RecommendationLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn expect_status(
    rec: &Recommendation,
    expected: RecommendationStatus,
    action: &str,
) -> Result<(), CoreError> {
    if rec.status == expected {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "Cannot {action} recommendation {} in status {}",
            rec.id, rec.status
        )))
    }
}
