//! Client for the agent gateway's tool-invocation endpoint.

use crate::config::GatewayConfig;
use crate::error::{McError, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct InvokeResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<InvokeError>,
}

#[derive(Debug, Deserialize)]
struct InvokeError {
    #[serde(default)]
    message: Option<String>,
}

impl InvokeResponse {
    fn into_result(self) -> Result<Value> {
        if self.ok {
            return Ok(self.result);
        }
        let message = self
            .error
            .and_then(|e| e.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "Gateway request failed".to_string());
        Err(McError::Gateway(message))
    }
}

pub struct GatewayClient {
    base_url: String,
    cli: Option<String>,
    http: reqwest::blocking::Client,
}

impl GatewayClient {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| McError::GatewayUnavailable(e.to_string()))?;
        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            cli: config.cli.clone().filter(|c| !c.is_empty()),
            http,
        })
    }

    /// POST `{tool, action, args}` to `/tools/invoke` and unwrap `result`.
    pub fn invoke(&self, tool: &str, action: &str, args: Value) -> Result<Value> {
        let url = format!("{}/tools/invoke", self.base_url);
        let resp = self
            .http
            .post(&url)
            .json(&json!({ "tool": tool, "action": action, "args": args }))
            .send()
            .map_err(|e| McError::GatewayUnavailable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(McError::Gateway(format!(
                "Gateway responded with {}",
                status.as_u16()
            )));
        }
        let body: InvokeResponse = resp
            .json()
            .map_err(|e| McError::Gateway(format!("invalid gateway response: {e}")))?;
        body.into_result()
    }

    /// The gateway's cron job list. When the gateway cannot be reached and a
    /// CLI is configured, falls back to `<cli> cron list --json`.
    pub fn cron_list(&self) -> Result<Value> {
        match self.invoke("cron", "list", json!({})) {
            Err(McError::GatewayUnavailable(reason)) if self.cli.is_some() => {
                tracing::warn!(error = %reason, "gateway unreachable, trying CLI fallback");
                self.cron_list_via_cli()
            }
            other => other,
        }
    }

    fn cron_list_via_cli(&self) -> Result<Value> {
        let cli = self.cli.as_deref().unwrap_or_default();
        let program = locate_cli(cli)?;
        let output = Command::new(&program)
            .args(["cron", "list", "--json"])
            .output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(McError::Gateway(format!(
                "{cli} cron list failed: {}",
                stderr.trim()
            )));
        }
        let value: Value = serde_json::from_slice(&output.stdout)?;
        // The CLI may print either the raw result or the full invoke envelope.
        if value.get("ok").is_some() {
            let envelope: InvokeResponse = serde_json::from_value(value)?;
            return envelope.into_result();
        }
        Ok(value)
    }
}

fn locate_cli(cli: &str) -> Result<PathBuf> {
    let candidate = PathBuf::from(cli);
    if candidate.components().count() > 1 {
        return Ok(candidate);
    }
    which::which(cli).map_err(|_| McError::GatewayUnavailable(format!("`{cli}` not found on PATH")))
}
