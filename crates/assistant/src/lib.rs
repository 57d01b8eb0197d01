//! Chat-driven video editing assistant: an [`editor::EditorSession`] ties
//! the pure editor state of `vidchat-core` to the service gateways of
//! `vidchat-gateway`. The `vidchat` binary is a terminal front end over it.

pub mod commands;
pub mod editor;
pub mod error;
pub mod render;

pub use editor::{AcceptOutcome, EditorSession, OpenSession};
pub use error::SessionError;
