//! Quota data types parsed from the language server's model-config API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One per-model quota entry from a successful refresh.
///
/// Records are immutable once constructed and owned by the snapshot that
/// contains them; response order is display-relevant and preserved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotaRecord {
    /// Model display name
    pub label: String,
    /// Remaining quota as a fraction (nominally 0..=1, passed through as-is)
    pub remaining_fraction: f64,
    /// Reset timestamp as reported by the server, if any
    pub reset_time: Option<String>,
}

impl QuotaRecord {
    /// Remaining quota as a percentage
    pub fn remaining_percent(&self) -> f64 {
        self.remaining_fraction * 100.0
    }

    /// Parse the reset timestamp leniently.
    ///
    /// The server's format is not contractual; an absent or unparsable
    /// value yields `None` rather than an error.
    pub fn reset_time_utc(&self) -> Option<DateTime<Utc>> {
        self.reset_time
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Wire format of the model-config response.
///
/// Every field is optional: servers that are up but have no quota data
/// return an empty or absent list, which is not an error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigsResponse {
    #[serde(default)]
    pub client_model_configs: Option<Vec<ModelConfig>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub quota_info: Option<QuotaInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaInfo {
    #[serde(default)]
    pub remaining_fraction: Option<f64>,
    #[serde(default)]
    pub reset_time: Option<String>,
}

impl ConfigsResponse {
    /// Flatten the wire shape into display records, preserving server order.
    ///
    /// Entries without a label are dropped; a missing config list is an
    /// empty one.
    pub fn into_records(self) -> Vec<QuotaRecord> {
        self.client_model_configs
            .unwrap_or_default()
            .into_iter()
            .filter_map(|config| {
                let label = config.label.unwrap_or_default();
                if label.is_empty() {
                    return None;
                }
                let quota = config.quota_info.unwrap_or_default();
                Some(QuotaRecord {
                    label,
                    remaining_fraction: quota.remaining_fraction.unwrap_or(0.0),
                    reset_time: quota.reset_time,
                })
            })
            .collect()
    }
}
