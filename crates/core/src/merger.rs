//! Timeline merger: one render-ordered sequence of chat turns, each
//! optionally carrying the recommendation card derived from it.
//!
//! Pure and stateless; recomputed from the turns and the ledger whenever
//! either changes.

use serde::Serialize;

use crate::chat::ChatTurn;
use crate::recommendation::Recommendation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineItem {
    /// Position of the turn in the full transcript (bootstrap included).
    pub turn_index: usize,
    pub turn: ChatTurn,
    /// Card shown under this turn, with legacy titles normalized.
    pub recommendation: Option<Recommendation>,
}

/// Interleave `turns` with the recommendations linked to them.
///
/// Bootstrap turns are skipped. When several recommendations point at the
/// same turn only the first one is attached.
pub fn merge(turns: &[ChatTurn], recommendations: &[Recommendation]) -> Vec<TimelineItem> {
    turns
        .iter()
        .enumerate()
        .filter(|(_, turn)| !turn.is_bootstrap)
        .map(|(turn_index, turn)| TimelineItem {
            turn_index,
            turn: turn.clone(),
            recommendation: recommendations
                .iter()
                .find(|r| r.turn_index == Some(turn_index))
                .map(Recommendation::normalized),
        })
        .collect()
}
