//! Daily API cost ledger.
//!
//! One JSON file per local calendar day (`YYYY-MM-DD.json`) holding every
//! billable call made that day and a running total.

use crate::error::{McError, Result};
use chrono::{DateTime, Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Longest window `service_summary` will scan.
pub const MAX_SUMMARY_DAYS: u32 = 365;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub timestamp: String,
    pub service: String,
    pub operation: String,
    pub cost_usd: f64,
    #[serde(default)]
    pub metadata: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyLog {
    #[serde(default)]
    pub entries: Vec<LedgerEntry>,
    #[serde(default)]
    pub daily_total: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OperationSummary {
    pub count: u64,
    pub cost: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServiceSummary {
    pub total_cost: f64,
    pub total_calls: u64,
    pub operations: BTreeMap<String, OperationSummary>,
}

// ---------------------------------------------------------------------------
// Billable: known services and their approximate pricing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Billable {
    OpenAi { model: String, tokens: u64 },
    FalImage { model: String },
    FalVideo { model: String },
    ElevenLabs { characters: u64 },
    ExaSearch,
    BrowserUse { cloud: bool },
    GeminiImage { model: String },
    HeyGen { seconds: u64 },
    Runway { seconds: u64 },
    Suno { seconds: u64 },
}

impl Billable {
    /// Build from CLI/API style arguments. `quantity` means tokens, characters
    /// or seconds depending on the service.
    pub fn parse(service: &str, model: Option<&str>, quantity: u64) -> Result<Self> {
        let model = model.map(str::to_string);
        let b = match service.to_ascii_lowercase().as_str() {
            "openai" => Billable::OpenAi {
                model: model.unwrap_or_else(|| "gpt-4".into()),
                tokens: quantity,
            },
            "fal-image" => Billable::FalImage {
                model: model.unwrap_or_else(|| "flux-dev".into()),
            },
            "fal-video" => Billable::FalVideo {
                model: model.unwrap_or_else(|| "runway-gen3".into()),
            },
            "elevenlabs" => Billable::ElevenLabs {
                characters: quantity,
            },
            "exa" => Billable::ExaSearch,
            "browser-use" => Billable::BrowserUse {
                cloud: model.as_deref() == Some("cloud"),
            },
            "gemini-image" => Billable::GeminiImage {
                model: model.unwrap_or_else(|| "gemini-2.5-flash-image".into()),
            },
            "heygen" => Billable::HeyGen { seconds: quantity },
            "runway" => Billable::Runway { seconds: quantity },
            "suno" => Billable::Suno { seconds: quantity },
            other => return Err(McError::UnknownService(other.to_string())),
        };
        Ok(b)
    }

    pub fn service(&self) -> &'static str {
        match self {
            Billable::OpenAi { .. } => "OpenAI",
            Billable::FalImage { .. } => "fal.ai (Images)",
            Billable::FalVideo { .. } => "fal.ai (Video)",
            Billable::ElevenLabs { .. } => "ElevenLabs",
            Billable::ExaSearch => "Exa MCP",
            Billable::BrowserUse { .. } => "Browser-Use",
            Billable::GeminiImage { .. } => "Gemini (Nano Banana)",
            Billable::HeyGen { .. } => "HeyGen",
            Billable::Runway { .. } => "Runway",
            Billable::Suno { .. } => "Suno",
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            Billable::OpenAi { .. } => "completion",
            Billable::FalImage { .. } | Billable::GeminiImage { .. } => "image_generation",
            Billable::FalVideo { .. } | Billable::HeyGen { .. } | Billable::Runway { .. } => {
                "video_generation"
            }
            Billable::ElevenLabs { .. } => "text_to_speech",
            Billable::ExaSearch => "web_search",
            Billable::BrowserUse { cloud: true } => "cloud_session",
            Billable::BrowserUse { cloud: false } => "local_session",
            Billable::Suno { .. } => "music_generation",
        }
    }

    /// Approximate USD cost.
    pub fn cost(&self) -> f64 {
        match self {
            Billable::OpenAi { model, tokens } => {
                let per_1k = match model.as_str() {
                    "gpt-4" => 0.03,
                    "gpt-4-turbo" => 0.01,
                    "gpt-3.5-turbo" => 0.0015,
                    "dall-e-3" => 0.04,
                    _ => 0.01,
                };
                *tokens as f64 / 1000.0 * per_1k
            }
            Billable::FalImage { model } => match model.as_str() {
                "flux-pro" => 0.05,
                "stable-diffusion-xl" => 0.002,
                _ => 0.003,
            },
            Billable::FalVideo { model } => match model.as_str() {
                "luma" => 0.30,
                "kling" => 0.40,
                _ => 0.50,
            },
            Billable::ElevenLabs { characters } => *characters as f64 / 1000.0 * 0.30,
            Billable::ExaSearch | Billable::GeminiImage { .. } => 0.0,
            Billable::BrowserUse { cloud } => {
                if *cloud {
                    0.50
                } else {
                    0.0
                }
            }
            Billable::HeyGen { seconds } => *seconds as f64 * 0.05,
            Billable::Runway { seconds } => *seconds as f64 / 5.0 * 0.50,
            Billable::Suno { seconds } => *seconds as f64 / 30.0 * 0.10,
        }
    }

    pub fn metadata(&self) -> Value {
        match self {
            Billable::OpenAi { model, tokens } => json!({ "model": model, "tokens": tokens }),
            Billable::FalImage { model }
            | Billable::FalVideo { model }
            | Billable::GeminiImage { model } => json!({ "model": model }),
            Billable::ElevenLabs { characters } => json!({ "characters": characters }),
            Billable::ExaSearch => json!({}),
            Billable::BrowserUse { cloud } => json!({ "cloud_mode": cloud }),
            Billable::HeyGen { seconds } | Billable::Runway { seconds } | Billable::Suno { seconds } => {
                json!({ "duration_seconds": seconds })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Ledger {
    dir: PathBuf,
}

impl Ledger {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn day_path(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}.json", date.format("%Y-%m-%d")))
    }

    pub fn record(&self, billable: &Billable) -> Result<LedgerEntry> {
        self.log_usage(
            billable.service(),
            billable.operation(),
            billable.cost(),
            billable.metadata(),
        )
    }

    pub fn log_usage(
        &self,
        service: &str,
        operation: &str,
        cost: f64,
        metadata: Value,
    ) -> Result<LedgerEntry> {
        self.log_usage_at(Local::now(), service, operation, cost, metadata)
    }

    pub fn log_usage_at(
        &self,
        at: DateTime<Local>,
        service: &str,
        operation: &str,
        cost: f64,
        metadata: Value,
    ) -> Result<LedgerEntry> {
        let date = at.date_naive();
        let mut log = self.daily_summary(date)?;
        let entry = LedgerEntry {
            timestamp: at.naive_local().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            service: service.to_string(),
            operation: operation.to_string(),
            cost_usd: cost,
            metadata: if metadata.is_null() { json!({}) } else { metadata },
        };
        log.entries.push(entry.clone());
        log.daily_total += cost;

        let data = serde_json::to_string_pretty(&log)?;
        crate::io::atomic_write(&self.day_path(date), data.as_bytes())?;
        Ok(entry)
    }

    /// The log for one day; a day with no file is empty.
    pub fn daily_summary(&self, date: NaiveDate) -> Result<DailyLog> {
        match crate::io::read_optional(&self.day_path(date))? {
            Some(data) => Ok(serde_json::from_str(&data)?),
            None => Ok(DailyLog::default()),
        }
    }

    /// Per-service totals over the `days` days ending with `today`.
    /// Totals per service over the `days` days ending `today`, at most
    /// [`MAX_SUMMARY_DAYS`].
    pub fn service_summary(
        &self,
        today: NaiveDate,
        days: u32,
    ) -> Result<BTreeMap<String, ServiceSummary>> {
        let mut summary: BTreeMap<String, ServiceSummary> = BTreeMap::new();
        for offset in 0..days.min(MAX_SUMMARY_DAYS) {
            let Some(date) = today.checked_sub_signed(Duration::days(i64::from(offset))) else {
                break;
            };
            let log = match self.daily_summary(date) {
                Ok(log) => log,
                Err(e) => {
                    tracing::warn!(%date, error = %e, "skipping unreadable ledger day");
                    continue;
                }
            };
            for entry in log.entries {
                let s = summary.entry(entry.service.clone()).or_default();
                s.total_cost += entry.cost_usd;
                s.total_calls += 1;
                let op = s.operations.entry(entry.operation.clone()).or_default();
                op.count += 1;
                op.cost += entry.cost_usd;
            }
        }
        Ok(summary)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
