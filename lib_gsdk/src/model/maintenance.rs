//! # Maintenance Schedule
//!
//! Scheduled host-level disruptions announced by the agent. Two forms exist:
//! the legacy `nextScheduledMaintenanceUtc` timestamp and the structured
//! schedule defined here. Both are parsed with [`parse_utc_timestamp`].

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::null_as_default;

/// A full maintenance notice, replaced wholesale on every response carrying one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceSchedule {
    /// Version stamp of the schedule document.
    #[serde(default, deserialize_with = "null_as_default")]
    pub document_incarnation: String,
    /// Upcoming events in agent order.
    #[serde(default, alias = "Events", deserialize_with = "null_as_default")]
    pub events: Vec<MaintenanceEvent>,
}

/// One scheduled maintenance event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceEvent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub event_id: String,
    /// For example `Reboot`, `Redeploy`, `Freeze`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub event_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub resource_type: String,
    /// Names of the affected resources.
    #[serde(default, alias = "Resources", deserialize_with = "null_as_default")]
    pub resources: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub event_status: String,
    /// Earliest start of the event, if the agent knows it.
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub not_before: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub event_source: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub duration_in_seconds: i64,
}

/// Parses an agent timestamp as UTC.
///
/// Accepts RFC 3339 (`2026-10-20T08:00:00Z`, with or without offset or
/// fraction) and the bare `YYYY-MM-DDThh:mm:ss` form, which is taken as UTC.
pub fn parse_utc_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_utc_timestamp))
}
