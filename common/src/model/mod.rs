//! Entities shared by every crate in the workspace (spec.md §3).
//!
//! Each struct is `Serialize`/`Deserialize` for wire use and `sqlx::FromRow`
//! for repository mapping, mirroring the teacher's `common/src/types/v0/store`
//! modules — generalized here from an etcd-backed `*Spec`/`*State` split to a
//! single row-shaped struct per table, since our store is relational.

mod alarm_definition;
mod alarm_dictionary;
mod alarm_event;
mod data_source;
mod node_cluster_type;
mod outbox;
mod resource;
mod resource_pool;
mod subscription;

pub use alarm_definition::AlarmDefinition;
pub use alarm_dictionary::AlarmDictionary;
pub use alarm_event::{AlarmEventRecord, AlarmStatus, NotificationEventType, PerceivedSeverity, Source};
pub use data_source::DataSource;
pub use node_cluster_type::NodeClusterType;
pub use outbox::{DataChangeEvent, NotificationCursor, ObjectType, OutboxOperation};
pub use resource::Resource;
pub use resource_pool::ResourcePool;
pub use subscription::Subscription;

use serde_json::Value as Json;

/// The opaque key-value extension bag carried by several entities
/// (`resource_pool.extensions`, `resource.extensions`, …). Stored as
/// `jsonb` by the repository.
pub type Extensions = Json;
