use crate::shared::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum length for external identifiers (security limit)
const MAX_EXTERNAL_ID_LENGTH: usize = 64;

/// NewType wrapper for an identifier issued by an external registry (e.g. `Q1234`)
///
/// External ids end up in request URLs, so they are restricted to a
/// conservative character set at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExternalId(String);

impl ExternalId {
    pub fn new(id: String) -> Result<Self> {
        if id.is_empty() {
            anyhow::bail!("External id cannot be empty");
        }

        if id.len() > MAX_EXTERNAL_ID_LENGTH {
            anyhow::bail!(
                "External id is too long ({} bytes). Maximum allowed: {} bytes",
                id.len(),
                MAX_EXTERNAL_ID_LENGTH
            );
        }

        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':')
        {
            anyhow::bail!(
                "External id '{}' contains invalid characters. Only ASCII alphanumeric, hyphens, underscores and colons are allowed.",
                id
            );
        }

        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ExternalId {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ExternalId> for String {
    fn from(id: ExternalId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ExternalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Registry an external fragment was obtained from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceKind {
    KnowledgeBase,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::KnowledgeBase => write!(f, "knowledge base"),
        }
    }
}

/// Enrichment data fetched from the knowledge base, identified by `(source, external_id)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalFragment {
    pub source: SourceKind,
    pub external_id: ExternalId,
    pub label: String,
    pub description: String,
    #[serde(default)]
    pub website_url: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub documentation_url: Option<String>,
    #[serde(default)]
    pub developers: Vec<String>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub is_libre: bool,
}

impl ExternalFragment {
    /// Compact reference used wherever this software is mentioned by another record
    pub fn summary(&self) -> SoftwareSummary {
        SoftwareSummary {
            external_id: self.external_id.clone(),
            label: self.label.clone(),
            description: self.description.clone(),
            is_libre: self.is_libre,
            source: self.source,
        }
    }
}

/// Summary of a software known to an external registry (parent, similar, other software)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftwareSummary {
    pub external_id: ExternalId,
    pub label: String,
    pub description: String,
    pub is_libre: bool,
    pub source: SourceKind,
}

/// Entry of the open-source project directory (logo and keywords)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub id: u64,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Most recent release detected on the source-code host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestVersion {
    pub version: String,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

/// Company offering support for a catalog software
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceProvider {
    pub name: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub directory_url: Option<String>,
}
