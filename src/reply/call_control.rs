use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::CallControlConfig;
use crate::error::{BridgeError, BridgeResult};

/// Replaces the live instruction set of an in-progress call
#[async_trait]
pub trait CallControl: Send + Sync {
    async fn update_call(&self, call_id: &str, twiml: &str) -> BridgeResult<()>;
}

/// Twilio REST `Calls` resource
#[derive(Debug, Clone)]
pub struct TwilioCallControl {
    http: reqwest::Client,
    api_base: String,
    account_sid: String,
    auth_token: String,
}

impl TwilioCallControl {
    pub fn new(
        api_base: impl Into<String>,
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .context("failed to create call control client")?;

        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            account_sid: account_sid.into().trim().to_string(),
            auth_token: auth_token.into().trim().to_string(),
        })
    }

    /// `None` unless both account SID and auth token are configured
    pub fn from_config(config: &CallControlConfig) -> Result<Option<Self>> {
        let sid = config.account_sid.as_deref().map(str::trim).unwrap_or_default();
        let token = config.auth_token.as_deref().map(str::trim).unwrap_or_default();
        if sid.is_empty() || token.is_empty() {
            info!("Call control credentials not configured; replies will not be spoken");
            return Ok(None);
        }

        let client = Self::new(
            config.api_base.clone(),
            sid,
            token,
            Duration::from_secs(config.request_timeout_secs.max(1)),
        )?;
        Ok(Some(client))
    }

    fn call_url(&self, call_id: &str) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Calls/{}.json",
            self.api_base, self.account_sid, call_id
        )
    }
}

#[async_trait]
impl CallControl for TwilioCallControl {
    async fn update_call(&self, call_id: &str, twiml: &str) -> BridgeResult<()> {
        let response = self
            .http
            .post(self.call_url(call_id))
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("Twiml", twiml)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BridgeError::Collaborator(format!(
                "call update for {} returned {}: {}",
                call_id, status, body
            )));
        }

        Ok(())
    }
}

pub fn call_control_from_config(config: &CallControlConfig) -> Result<Option<Arc<dyn CallControl>>> {
    Ok(TwilioCallControl::from_config(config)?.map(|client| Arc::new(client) as Arc<dyn CallControl>))
}
