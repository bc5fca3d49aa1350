//! Alarm Event Ingestor (C5, spec.md §4.5): maps upstream alert
//! notifications onto alarm event records, upserts by
//! `(fingerprint, alarm_raised_time)`, resolves stale caas-sourced alarms,
//! and exposes manual acknowledgement.

mod error;
mod ingestor;
mod notification;

pub use error::IngestError;
pub use ingestor::{AlarmEventIngestor, ClusterContext};
pub use notification::{AlertNotification, AlertStatus};
