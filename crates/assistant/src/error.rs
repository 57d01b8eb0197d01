use vidchat_core::error::CoreError;
use vidchat_gateway::error::{ConfigError, GatewayError};

/// Errors surfaced by an [`EditorSession`](crate::editor::EditorSession).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("No session is open")]
    NoSession,

    /// The session was switched while a request was in flight; its reply
    /// was discarded.
    #[error("Session changed while a request was in flight")]
    Superseded,
}
