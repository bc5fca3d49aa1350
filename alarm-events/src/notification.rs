//! Upstream alert notifications (spec.md §4.5), modeled after the
//! Alertmanager webhook shape as a design choice — no concrete upstream
//! alert source is named by spec.md (SPEC_FULL.md §4.5), a supplemented
//! detail spec.md's distillation left implicit.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertNotification {
    pub fingerprint: String,
    pub status: AlertStatus,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Firing,
    Resolved,
}

impl AlertNotification {
    pub fn alert_name(&self) -> Option<&str> {
        self.labels.get("alertname").map(String::as_str)
    }

    pub fn severity_label(&self) -> Option<&str> {
        self.labels.get("severity").map(String::as_str)
    }
}
