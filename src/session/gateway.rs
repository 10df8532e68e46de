use crate::error::LifecycleError;
use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

use crate::vendor::TokenRequest;

/// HTTP request timeout against the gateway.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A minted vendor session as returned by the gateway
#[derive(Debug, Clone)]
pub struct MintedSession {
    /// Ephemeral credential for the SDP exchange
    pub client_secret: String,
    /// The vendor session object, verbatim
    pub raw: Value,
}

/// Gateway operations the client side performs: token mint, end
/// notification, instruction fetch.
#[async_trait::async_trait]
pub trait ControlPlane: Send + Sync {
    /// Mint a vendor session through the gateway
    async fn mint_session(&self, req: &TokenRequest) -> Result<MintedSession, LifecycleError>;

    /// Notify the gateway that a session ended.
    ///
    /// Fire-and-forget when `unloading` (the surface is going away and
    /// cannot wait); awaited best-effort otherwise. Never fails the caller.
    async fn end_session(&self, unloading: bool);

    /// Fetch a generated conversation instruction
    async fn fetch_prompt(&self) -> Result<String, LifecycleError>;
}

/// HTTP client for our own token gateway
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build gateway HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }
}

#[async_trait::async_trait]
impl ControlPlane for GatewayClient {
    async fn mint_session(&self, req: &TokenRequest) -> Result<MintedSession, LifecycleError> {
        let resp = self
            .http
            .post(format!("{}/token", self.base_url))
            .json(req)
            .send()
            .await
            .map_err(|e| LifecycleError::Transport(e.to_string()))?;

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .map_err(|e| LifecycleError::Transport(e.to_string()))?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(LifecycleError::Overloaded);
        }
        if !status.is_success() {
            return Err(LifecycleError::Vendor {
                status: status.as_u16(),
                body: body.to_string(),
            });
        }

        let client_secret = body
            .pointer("/client_secret/value")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(LifecycleError::MissingCredential)?;

        info!("Minted realtime session");
        Ok(MintedSession {
            client_secret,
            raw: body,
        })
    }

    async fn end_session(&self, unloading: bool) {
        let req = self.http.post(format!("{}/end", self.base_url));

        if unloading {
            // The surface is unloading; deliver without waiting
            tokio::spawn(async move {
                let _ = req.send().await;
            });
        } else if let Err(e) = req.send().await {
            warn!("Failed to notify session end: {}", e);
        }
    }

    async fn fetch_prompt(&self) -> Result<String, LifecycleError> {
        let resp = self
            .http
            .get(format!("{}/prompt", self.base_url))
            .send()
            .await
            .map_err(|e| LifecycleError::Transport(e.to_string()))?;

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .map_err(|e| LifecycleError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(LifecycleError::Vendor {
                status: status.as_u16(),
                body: body.to_string(),
            });
        }

        Ok(body
            .get("instruction")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }
}
