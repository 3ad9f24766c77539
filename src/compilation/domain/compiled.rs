use super::{
    AgentId, DirectoryEntry, ExternalFragment, ExternalId, InstanceId, LatestVersion,
    ServiceProvider, Software, SoftwareId, SoftwareSummary,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fully merged view of one catalog record and everything resolved for it
///
/// This is the unit of reuse between compilation runs: the orchestrator
/// compares the identity fields of `software` with the ones the derived
/// fields were resolved from before deciding to keep them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledRecord {
    #[serde(flatten)]
    pub software: Software,
    #[serde(default)]
    pub external_fragment: Option<ExternalFragment>,
    #[serde(default)]
    pub directory_entry: Option<DirectoryEntry>,
    /// Repository URL the latest version was looked up with
    #[serde(default)]
    pub repository_url: Option<String>,
    #[serde(default)]
    pub latest_version: Option<LatestVersion>,
    #[serde(default)]
    pub service_providers: Vec<ServiceProvider>,
    #[serde(default)]
    pub parent_software: Option<SoftwareSummary>,
    #[serde(default)]
    pub similar_software: Vec<SoftwareSummary>,
    #[serde(default)]
    pub instances: Vec<CompiledInstance>,
    #[serde(default)]
    pub referents: Vec<CompiledReferent>,
    #[serde(default)]
    pub users: Vec<CompiledUser>,
    #[serde(default)]
    pub organization_counts: BTreeMap<String, OrganizationCount>,
    #[serde(default)]
    pub has_expert_referent: bool,
}

impl CompiledRecord {
    /// A record carrying only the catalog fields, nothing resolved yet
    pub fn from_software(software: Software) -> Self {
        Self {
            software,
            external_fragment: None,
            directory_entry: None,
            repository_url: None,
            latest_version: None,
            service_providers: Vec::new(),
            parent_software: None,
            similar_software: Vec::new(),
            instances: Vec::new(),
            referents: Vec::new(),
            users: Vec::new(),
            organization_counts: BTreeMap::new(),
            has_expert_referent: false,
        }
    }

    pub fn id(&self) -> SoftwareId {
        self.software.id
    }

    pub fn name(&self) -> &str {
        &self.software.name
    }

    pub fn external_id(&self) -> Option<&ExternalId> {
        self.software.external_id.as_ref()
    }

    pub fn instance(&self, id: InstanceId) -> Option<&CompiledInstance> {
        self.instances.iter().find(|i| i.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledInstance {
    pub id: InstanceId,
    pub organization: String,
    pub target_audience: String,
    #[serde(default)]
    pub public_url: Option<String>,
    #[serde(default)]
    pub other_software: Vec<SoftwareSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledReferent {
    pub agent_id: AgentId,
    pub email: String,
    pub organization: String,
    pub is_expert: bool,
    pub use_case_description: String,
    #[serde(default)]
    pub service_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledUser {
    pub agent_id: AgentId,
    pub organization: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub service_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationCount {
    pub user_count: usize,
    pub referent_count: usize,
}
