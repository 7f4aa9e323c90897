//! Scheduled jobs owned by the external gateway.
//!
//! Two views exist: the gateway's own job list (opaque JSON, with a lenient
//! typed projection used for grouping) and the legacy on-disk cron store
//! written by the gateway's older releases.

use crate::error::{McError, Result};
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

// ---------------------------------------------------------------------------
// Cron store (legacy file)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCronJob {
    pub id: String,
    pub schedule: Value,
    pub text: Value,
    #[serde(rename = "nextRun", default, skip_serializing_if = "Option::is_none")]
    pub next_run: Option<Value>,
    pub enabled: bool,
}

impl StoredCronJob {
    pub fn next_run_ms(&self) -> Option<i64> {
        self.next_run.as_ref().and_then(Value::as_i64)
    }
}

/// JavaScript-style truthiness, used for the `a || b || default` fallbacks
/// the store format relies on.
fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn first_truthy(job: &Value, keys: &[&str], fallback: &str) -> Value {
    keys.iter()
        .filter_map(|k| job.get(*k))
        .find(|v| truthy(v))
        .cloned()
        .unwrap_or_else(|| Value::String(fallback.to_string()))
}

/// Project one raw store entry.
pub fn stored_job(id: &str, job: &Value) -> StoredCronJob {
    StoredCronJob {
        id: id.to_string(),
        schedule: first_truthy(job, &["schedule", "every"], "Unknown"),
        text: first_truthy(job, &["text", "prompt"], "Unnamed task"),
        next_run: job.get("nextRun").filter(|v| !v.is_null()).cloned(),
        enabled: job.get("enabled") != Some(&Value::Bool(false)),
    }
}

/// Jobs from the `jobs` field of a parsed store document. An object maps
/// ids to jobs (ordered by id); an array uses positions as ids.
pub fn jobs_from_store(doc: &Value) -> Vec<StoredCronJob> {
    match doc.get("jobs") {
        Some(Value::Object(map)) => map.iter().map(|(id, job)| stored_job(id, job)).collect(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, job)| stored_job(&i.to_string(), job))
            .collect(),
        _ => Vec::new(),
    }
}

/// Read the cron store. A missing or unreadable store means "no jobs yet".
pub fn read_cron_store(path: &Path) -> Vec<StoredCronJob> {
    let data = match std::fs::read_to_string(path) {
        Ok(d) => d,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "no cron store");
            return Vec::new();
        }
    };
    match serde_json::from_str::<Value>(&data) {
        Ok(doc) => jobs_from_store(&doc),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cron store is not valid JSON");
            Vec::new()
        }
    }
}

// ---------------------------------------------------------------------------
// Calendar week
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub jobs: Vec<StoredCronJob>,
}

/// The Sunday-to-Saturday week containing `anchor`. Weeks that run past
/// the representable date range are rejected.
pub fn week_days(anchor: NaiveDate) -> Result<Vec<NaiveDate>> {
    let out_of_range = || McError::InvalidDate(anchor.to_string());
    let back = Duration::days(i64::from(anchor.weekday().num_days_from_sunday()));
    let start = anchor.checked_sub_signed(back).ok_or_else(out_of_range)?;
    (0..7)
        .map(|i| {
            start
                .checked_add_signed(Duration::days(i))
                .ok_or_else(out_of_range)
        })
        .collect()
}

/// Place each job on the local day of its next run within the week of
/// `anchor`. Jobs without a next run, or outside the week, are left out.
pub fn calendar_week(jobs: &[StoredCronJob], anchor: NaiveDate) -> Result<Vec<CalendarDay>> {
    let days = week_days(anchor)?
        .into_iter()
        .map(|date| CalendarDay {
            date,
            jobs: jobs
                .iter()
                .filter(|j| {
                    j.next_run_ms()
                        .and_then(|ms| Local.timestamp_millis_opt(ms).single())
                        .map(|dt| dt.date_naive() == date)
                        .unwrap_or(false)
                })
                .cloned()
                .collect(),
        })
        .collect();
    Ok(days)
}

// ---------------------------------------------------------------------------
// Gateway jobs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CronSchedule {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub expr: Option<String>,
    #[serde(default)]
    pub tz: Option<String>,
}

impl CronSchedule {
    /// `kind · expr`; the time zone is not part of the label.
    pub fn label(&self) -> String {
        let parts: Vec<&str> = [self.kind.as_deref(), self.expr.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            "Scheduled".to_string()
        } else {
            parts.join(" · ")
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronState {
    #[serde(default)]
    pub next_run_at_ms: Option<i64>,
    #[serde(default)]
    pub last_run_at_ms: Option<i64>,
    #[serde(default)]
    pub last_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayCronJob {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub delete_after_run: bool,
    #[serde(default)]
    pub created_at_ms: Option<i64>,
    #[serde(default)]
    pub updated_at_ms: Option<i64>,
    #[serde(default)]
    pub schedule: Option<CronSchedule>,
    #[serde(default)]
    pub state: CronState,
}

fn default_enabled() -> bool {
    true
}

impl GatewayCronJob {
    pub fn schedule_label(&self) -> String {
        match &self.schedule {
            Some(s) => s.label(),
            None => "No schedule".to_string(),
        }
    }

    pub fn next_run(&self) -> Option<DateTime<Utc>> {
        self.state
            .next_run_at_ms
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
    }

    pub fn station(&self) -> JobStation {
        if !self.enabled {
            JobStation::Disabled
        } else if self.delete_after_run {
            JobStation::OneShot
        } else if self.state.next_run_at_ms.is_some_and(|ms| ms != 0) {
            JobStation::Scheduled
        } else {
            JobStation::Standby
        }
    }
}

/// Extract typed jobs from a gateway `cron list` result. Accepts either
/// `{ "jobs": [...] }` or a bare array; entries that do not fit are skipped.
pub fn parse_gateway_jobs(result: &Value) -> Vec<GatewayCronJob> {
    let items = match result {
        Value::Array(items) => items.as_slice(),
        other => match other.get("jobs") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => return Vec::new(),
        },
    };
    items
        .iter()
        .filter_map(|item| match serde_json::from_value(item.clone()) {
            Ok(job) => Some(job),
            Err(e) => {
                tracing::debug!(error = %e, "skipping unrecognised gateway job");
                None
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobStation {
    /// Recurring with a queued run.
    Scheduled,
    /// Deleted by the gateway after it runs.
    OneShot,
    /// Recurring, nothing queued.
    Standby,
    Disabled,
}

impl JobStation {
    pub fn all() -> &'static [JobStation] {
        &[
            JobStation::Scheduled,
            JobStation::OneShot,
            JobStation::Standby,
            JobStation::Disabled,
        ]
    }

    pub fn title(self) -> &'static str {
        match self {
            JobStation::Scheduled => "Scheduled",
            JobStation::OneShot => "One-shot",
            JobStation::Standby => "Standby",
            JobStation::Disabled => "Disabled",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationColumn {
    pub id: JobStation,
    pub title: &'static str,
    pub jobs: Vec<GatewayCronJob>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CronOverview {
    pub total: usize,
    pub enabled: usize,
    pub live: bool,
    pub next_run_at_ms: Option<i64>,
    pub columns: Vec<StationColumn>,
}

/// Jobs in `station`, soonest next run first; jobs with nothing queued last.
fn station_jobs(jobs: &[GatewayCronJob], station: JobStation) -> Vec<GatewayCronJob> {
    let mut out: Vec<GatewayCronJob> = jobs
        .iter()
        .filter(|j| j.station() == station)
        .cloned()
        .collect();
    out.sort_by_key(|j| (j.state.next_run_at_ms.is_none(), j.state.next_run_at_ms));
    out
}

/// Group jobs into stations and find the soonest queued run among enabled jobs.
pub fn overview(jobs: &[GatewayCronJob]) -> CronOverview {
    let enabled = jobs.iter().filter(|j| j.enabled).count();
    let next_run_at_ms = jobs
        .iter()
        .filter(|j| j.enabled)
        .filter_map(|j| j.state.next_run_at_ms)
        .min();
    let columns = JobStation::all()
        .iter()
        .map(|&station| StationColumn {
            id: station,
            title: station.title(),
            jobs: station_jobs(jobs, station),
        })
        .collect();
    CronOverview {
        total: jobs.len(),
        enabled,
        live: enabled > 0,
        next_run_at_ms,
        columns,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn store_fallbacks_follow_truthiness() {
        let doc = json!({
            "jobs": {
                "b-digest": { "every": "1h", "prompt": "digest", "enabled": false },
                "a-morning": { "schedule": "0 9 * * *", "text": "brief", "nextRun": 1700000000000i64 },
                "c-empty": { "schedule": "", "text": "" }
            }
        });
        let jobs = jobs_from_store(&doc);
        let ids: Vec<&str> = jobs.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, vec!["a-morning", "b-digest", "c-empty"]);

        assert_eq!(jobs[0].schedule, json!("0 9 * * *"));
        assert_eq!(jobs[0].next_run_ms(), Some(1_700_000_000_000));
        assert!(jobs[0].enabled);

        assert_eq!(jobs[1].schedule, json!("1h"));
        assert_eq!(jobs[1].text, json!("digest"));
        assert!(!jobs[1].enabled);

        assert_eq!(jobs[2].schedule, json!("Unknown"));
        assert_eq!(jobs[2].text, json!("Unnamed task"));
        assert!(jobs[2].next_run.is_none());
    }

    #[test]
    fn missing_or_corrupt_store_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(read_cron_store(&dir.path().join("cron-store.json")).is_empty());
        std::fs::write(dir.path().join("bad.json"), "{oops").unwrap();
        assert!(read_cron_store(&dir.path().join("bad.json")).is_empty());
        std::fs::write(dir.path().join("nojobs.json"), "{}").unwrap();
        assert!(read_cron_store(&dir.path().join("nojobs.json")).is_empty());
    }

    #[test]
    fn serialized_store_job_uses_next_run_key() {
        let job = stored_job("x", &json!({ "nextRun": 5 }));
        let v = serde_json::to_value(&job).unwrap();
        assert_eq!(v["nextRun"], 5);
        assert_eq!(v["enabled"], true);
    }

    #[test]
    fn week_starts_on_sunday() {
        let wed = NaiveDate::from_ymd_opt(2026, 1, 28).unwrap();
        let days = week_days(wed).unwrap();
        assert_eq!(days[0], NaiveDate::from_ymd_opt(2026, 1, 25).unwrap());
        assert_eq!(days[6], NaiveDate::from_ymd_opt(2026, 1, 31).unwrap());
    }

    #[test]
    fn calendar_places_jobs_on_next_run_day() {
        let noon = Local
            .with_ymd_and_hms(2026, 1, 29, 12, 0, 0)
            .earliest()
            .unwrap()
            .timestamp_millis();
        let jobs = vec![
            stored_job("thu", &json!({ "nextRun": noon })),
            stored_job("never", &json!({})),
        ];
        let week = calendar_week(&jobs, NaiveDate::from_ymd_opt(2026, 1, 28).unwrap()).unwrap();
        let thursday = &week[4];
        assert_eq!(thursday.date, NaiveDate::from_ymd_opt(2026, 1, 29).unwrap());
        assert_eq!(thursday.jobs.len(), 1);
        assert_eq!(thursday.jobs[0].id, "thu");
        assert_eq!(week.iter().map(|d| d.jobs.len()).sum::<usize>(), 1);
    }

    #[test]
    fn week_at_the_edge_of_the_calendar_is_rejected() {
        assert!(matches!(
            week_days(NaiveDate::MAX),
            Err(McError::InvalidDate(_))
        ));
        assert!(matches!(
            calendar_week(&[], NaiveDate::MIN),
            Err(McError::InvalidDate(_))
        ));
    }

    fn gateway_fixture() -> Value {
        json!({
            "jobs": [
                {
                    "id": "job-001", "name": "Hourly Metrics Rollup", "enabled": true,
                    "deleteAfterRun": false,
                    "schedule": { "kind": "cron", "expr": "0 * * * *", "tz": "UTC" },
                    "state": { "nextRunAtMs": 2000 }
                },
                {
                    "id": "job-002", "name": "One Shot Cleanup", "enabled": true,
                    "deleteAfterRun": true,
                    "schedule": { "kind": "once", "expr": "now" },
                    "state": { "nextRunAtMs": 1000 }
                },
                {
                    "id": "job-003", "name": "Standby Sync", "enabled": true,
                    "schedule": { "kind": "cron", "expr": "15 9 * * 1" },
                    "state": {}
                },
                {
                    "id": "job-004", "name": "Paused Digest", "enabled": false,
                    "schedule": { "kind": "cron", "expr": "30 6 * * *" },
                    "state": { "nextRunAtMs": 500 }
                },
                { "name": "no id, skipped" }
            ]
        })
    }

    #[test]
    fn gateway_jobs_group_into_stations() {
        let jobs = parse_gateway_jobs(&gateway_fixture());
        assert_eq!(jobs.len(), 4);
        assert_eq!(jobs[0].station(), JobStation::Scheduled);
        assert_eq!(jobs[1].station(), JobStation::OneShot);
        assert_eq!(jobs[2].station(), JobStation::Standby);
        assert_eq!(jobs[3].station(), JobStation::Disabled);

        let o = overview(&jobs);
        assert_eq!(o.total, 4);
        assert_eq!(o.enabled, 3);
        assert!(o.live);
        assert_eq!(o.next_run_at_ms, Some(1000));
        assert_eq!(o.columns.len(), 4);
        assert_eq!(o.columns[1].jobs[0].id, "job-002");
    }

    #[test]
    fn station_columns_order_by_next_run() {
        let jobs = parse_gateway_jobs(&json!([
            { "id": "idle", "state": {} },
            { "id": "late", "state": { "nextRunAtMs": 5000 } },
            { "id": "early", "state": { "nextRunAtMs": 1000 } },
            { "id": "off-late", "enabled": false, "state": { "nextRunAtMs": 9000 } },
            { "id": "off-none", "enabled": false },
            { "id": "off-early", "enabled": false, "state": { "nextRunAtMs": 10 } }
        ]));
        let o = overview(&jobs);
        let ids = |col: usize| -> Vec<&str> {
            o.columns[col].jobs.iter().map(|j| j.id.as_str()).collect()
        };
        assert_eq!(ids(0), vec!["early", "late"]);
        assert_eq!(ids(2), vec!["idle"]);
        assert_eq!(ids(3), vec!["off-early", "off-late", "off-none"]);
    }

    #[test]
    fn schedule_labels() {
        let jobs = parse_gateway_jobs(&gateway_fixture());
        assert_eq!(jobs[0].schedule_label(), "cron · 0 * * * *");
        assert_eq!(jobs[1].schedule_label(), "once · now");
        assert_eq!(CronSchedule::default().label(), "Scheduled");
        let bare: GatewayCronJob = serde_json::from_value(json!({ "id": "x" })).unwrap();
        assert_eq!(bare.schedule_label(), "No schedule");
        assert!(bare.enabled);
    }

    #[test]
    fn bare_array_result_is_accepted() {
        let jobs = parse_gateway_jobs(&json!([{ "id": "solo" }]));
        assert_eq!(jobs.len(), 1);
        assert!(parse_gateway_jobs(&json!("nope")).is_empty());
    }
}
