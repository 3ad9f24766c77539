use super::{CompiledRecord, ExternalId, SoftwareId, SoftwareSummary};
use serde::{Deserialize, Serialize};

/// A software mentioned in a similarity cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SoftwareReference {
    /// A catalog entry, identified by its name
    #[serde(rename_all = "camelCase")]
    Catalog { software_id: SoftwareId, name: String },
    /// Software only known to an external registry
    External(SoftwareSummary),
}

/// Identity used for visited-tracking during clustering
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReferenceKey {
    Catalog(String),
    External(ExternalId),
}

impl SoftwareReference {
    pub fn catalog(record: &CompiledRecord) -> Self {
        SoftwareReference::Catalog {
            software_id: record.id(),
            name: record.name().to_string(),
        }
    }

    pub fn key(&self) -> ReferenceKey {
        match self {
            SoftwareReference::Catalog { name, .. } => ReferenceKey::Catalog(name.clone()),
            SoftwareReference::External(summary) => {
                ReferenceKey::External(summary.external_id.clone())
            }
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            SoftwareReference::Catalog { name, .. } => name,
            SoftwareReference::External(summary) => &summary.label,
        }
    }

    pub fn is_catalog_entry(&self, software_name: &str) -> bool {
        matches!(self, SoftwareReference::Catalog { name, .. } if name == software_name)
    }
}

/// Connected component of the undirected "similar software" graph
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SimilaritySet {
    members: Vec<SoftwareReference>,
}

impl SimilaritySet {
    pub fn new(members: Vec<SoftwareReference>) -> Self {
        Self { members }
    }

    pub fn members(&self) -> &[SoftwareReference] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains_catalog_entry(&self, software_name: &str) -> bool {
        self.members
            .iter()
            .any(|m| m.is_catalog_entry(software_name))
    }

    /// The cluster seen from one of its catalog members
    pub fn without(&self, software_name: &str) -> Vec<SoftwareReference> {
        self.members
            .iter()
            .filter(|m| !m.is_catalog_entry(software_name))
            .cloned()
            .collect()
    }
}
