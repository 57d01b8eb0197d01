//! HTTP gateways to the services behind the editor: the editing agent, the
//! session store, the edit queue and the export service.
//!
//! Each service sits behind an async trait in [`traits`]; [`Gateways`]
//! bundles the reqwest-backed implementations built from one
//! [`GatewayConfig`].

pub mod agent;
pub mod config;
pub mod edit_queue;
pub mod error;
pub mod export;
mod http;
pub mod sessions;
pub mod traits;

use std::sync::Arc;

pub use config::GatewayConfig;
pub use error::{ConfigError, GatewayError};
pub use traits::{
    AgentGateway, AgentRequest, EditQueueSource, ExportService, SessionFilter, SessionStore,
};

/// The full set of service gateways an editor session talks to. Built from
/// HTTP clients by [`Gateways::from_config`]; tests assemble their own.
#[derive(Clone)]
pub struct Gateways {
    pub agent: Arc<dyn AgentGateway>,
    pub sessions: Arc<dyn SessionStore>,
    pub edit_queue: Arc<dyn EditQueueSource>,
    pub export: Arc<dyn ExportService>,
}

impl Gateways {
    /// Build every client from `config`, sharing one connection pool.
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: &GatewayConfig) -> Self {
        Self {
            agent: Arc::new(agent::AgentClient::with_client(
                client.clone(),
                config.api_url.clone(),
                config.agent_timeout,
            )),
            sessions: Arc::new(sessions::SessionStoreClient::with_client(
                client.clone(),
                config.api_url.clone(),
                config.request_timeout,
            )),
            edit_queue: Arc::new(edit_queue::EditQueueClient::with_client(
                client.clone(),
                config.api_url.clone(),
                config.request_timeout,
            )),
            export: Arc::new(export::ExportClient::with_client(
                client,
                config.export_url.clone(),
                config.request_timeout,
            )),
        }
    }
}
