use anyhow::Result;
use std::sync::Arc;

use crate::bridge::BridgeContext;
use crate::config::Config;
use crate::reply::ReplyOrchestrator;
use crate::session::SessionRegistry;
use crate::transcription::{TranscriptionClient, UplinkConnector};

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub bridge: BridgeContext,
}

impl AppState {
    pub fn new(config: Config, bridge: BridgeContext) -> Self {
        Self {
            config: Arc::new(config),
            bridge,
        }
    }

    /// Wire the production collaborators from configuration
    pub fn from_config(config: Config) -> Result<Self> {
        let registry = SessionRegistry::new();
        let connector: Arc<dyn UplinkConnector> =
            Arc::new(TranscriptionClient::new(&config.transcription));
        let orchestrator = Arc::new(ReplyOrchestrator::from_config(&config)?);
        let bridge = BridgeContext::new(registry, connector, orchestrator, &config);
        Ok(Self::new(config, bridge))
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.bridge.registry
    }
}
