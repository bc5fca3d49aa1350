use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The same `ManagedCluster` CRD `o2ims-collector::ManagedCluster` models,
/// duplicated here rather than depended on to keep this crate's only
/// dependency on the collector's discovery output flowing through
/// `o2ims_common::model::NodeClusterType` rows, not a cross-crate CRD type.
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "cluster.open-cluster-management.io",
    version = "v1",
    kind = "ManagedClusterRef",
    namespaced = false
)]
pub struct ManagedClusterRefSpec {
    pub hub_accepts_client: bool,
}
