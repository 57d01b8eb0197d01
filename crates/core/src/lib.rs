//! Recommendation and version-timeline engine for chat-driven video editing.
//!
//! Pure domain logic, no I/O:
//!
//! - [`agent_response`]: one canonical decode of agent replies.
//! - [`classifier`]: decides whether a reply is a message, a proposal, an
//!   auto-applied edit, or the materialization of an accepted proposal.
//! - [`ledger`]: recommendation status transitions and single-step undo.
//! - [`version_timeline`]: cursor-addressable stack of produced videos.
//! - [`merger`]: render order of turns and recommendation cards.
//! - [`state`]: the combined per-session state machine.
//! - [`edit_queue`] and [`session`]: mirrors of the external services' data.

pub mod agent_response;
pub mod chat;
pub mod classifier;
pub mod edit_queue;
pub mod error;
pub mod ledger;
pub mod merger;
pub mod recommendation;
pub mod session;
pub mod state;
pub mod types;
pub mod version_timeline;
