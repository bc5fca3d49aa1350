//! Alarm Dictionary Synchronizer (C4, spec.md §4.4): resolves per-cluster
//! monitoring rules, deduplicates, upserts dictionaries and definitions,
//! removes orphans.

mod cluster_client;
mod cluster_ref;
mod error;
mod rule;
mod sync;

pub use cluster_client::{ClusterClientResolver, KubeClusterClientResolver};
pub use error::DictionaryError;
pub use rule::{MonitoringRule, MonitoringRuleSource, PrometheusRuleSource};
pub use sync::{DictionarySynchronizer, DictionarySynchronizerRepositories};
