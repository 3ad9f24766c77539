use super::ExternalId;
use crate::shared::error::CompilationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type SoftwareId = u64;
pub type AgentId = u64;
pub type InstanceId = u64;

/// Maximum length for software names (security limit)
const MAX_SOFTWARE_NAME_LENGTH: usize = 255;

fn default_true() -> bool {
    true
}

/// Authoritative catalog entry for one software
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Software {
    pub id: SoftwareId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub license: String,
    /// Identifier in the knowledge base
    #[serde(default)]
    pub external_id: Option<ExternalId>,
    /// Identifier in the open-source project directory (logo, keywords)
    #[serde(default)]
    pub service_provider_id: Option<u64>,
    #[serde(default)]
    pub parent_external_id: Option<ExternalId>,
    #[serde(default)]
    pub similar_external_ids: Vec<ExternalId>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub documentation_url: Option<String>,
    #[serde(default)]
    pub added_at: Option<DateTime<Utc>>,
    /// `false` once the software has been withdrawn from the catalog
    #[serde(default = "default_true")]
    pub is_present: bool,
}

impl Software {
    /// Creates a minimal software record; optional linkage is set through the public fields
    pub fn new(id: SoftwareId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            license: String::new(),
            external_id: None,
            service_provider_id: None,
            parent_external_id: None,
            similar_external_ids: Vec::new(),
            keywords: Vec::new(),
            categories: Vec::new(),
            source_url: None,
            documentation_url: None,
            added_at: None,
            is_present: true,
        }
    }

    fn validate(&self) -> Result<(), CompilationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(CompilationError::Validation {
                message: format!("software #{} has an empty name", self.id),
            });
        }
        if name.len() > MAX_SOFTWARE_NAME_LENGTH {
            return Err(CompilationError::Validation {
                message: format!(
                    "software #{} name is too long ({} bytes). Maximum allowed: {} bytes",
                    self.id,
                    name.len(),
                    MAX_SOFTWARE_NAME_LENGTH
                ),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: AgentId,
    pub email: String,
    pub organization: String,
}

/// An agent vouching for a software on behalf of their organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferentDeclaration {
    pub agent_id: AgentId,
    pub software_id: SoftwareId,
    #[serde(default)]
    pub is_expert: bool,
    #[serde(default)]
    pub use_case_description: String,
    #[serde(default)]
    pub service_url: Option<String>,
}

/// An agent declaring that their organization uses a software
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDeclaration {
    pub agent_id: AgentId,
    pub software_id: SoftwareId,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub service_url: Option<String>,
}

/// A public deployment of a catalog software
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub id: InstanceId,
    pub main_software_id: SoftwareId,
    pub organization: String,
    #[serde(default)]
    pub target_audience: String,
    #[serde(default)]
    pub public_url: Option<String>,
    /// Knowledge-base ids of software deployed alongside the main one
    #[serde(default)]
    pub other_software_external_ids: Vec<ExternalId>,
}

/// The complete authoritative catalog snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    #[serde(default)]
    pub software: Vec<Software>,
    #[serde(default)]
    pub agents: Vec<Agent>,
    #[serde(default)]
    pub referents: Vec<ReferentDeclaration>,
    #[serde(default)]
    pub users: Vec<UserDeclaration>,
    #[serde(default)]
    pub instances: Vec<Instance>,
}

/// A single read-modify-write operation on the catalog
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogMutation {
    CreateSoftware(Software),
    UpdateSoftware(Software),
    RemoveSoftware {
        software_id: SoftwareId,
    },
    RegisterAgent(Agent),
    DeclareUser(UserDeclaration),
    RemoveUser {
        agent_id: AgentId,
        software_id: SoftwareId,
    },
    DeclareReferent(ReferentDeclaration),
    RemoveReferent {
        agent_id: AgentId,
        software_id: SoftwareId,
    },
    CreateInstance(Instance),
    UpdateInstance(Instance),
}

impl CatalogMutation {
    /// Human-readable change description recorded alongside persisted snapshots
    pub fn describe(&self) -> String {
        match self {
            CatalogMutation::CreateSoftware(s) => format!("Add software '{}'", s.name),
            CatalogMutation::UpdateSoftware(s) => format!("Update software '{}'", s.name),
            CatalogMutation::RemoveSoftware { software_id } => {
                format!("Remove software #{}", software_id)
            }
            CatalogMutation::RegisterAgent(a) => format!("Register agent {}", a.email),
            CatalogMutation::DeclareUser(d) => format!(
                "Agent #{} declares using software #{}",
                d.agent_id, d.software_id
            ),
            CatalogMutation::RemoveUser {
                agent_id,
                software_id,
            } => format!(
                "Agent #{} no longer uses software #{}",
                agent_id, software_id
            ),
            CatalogMutation::DeclareReferent(d) => format!(
                "Agent #{} becomes referent of software #{}",
                d.agent_id, d.software_id
            ),
            CatalogMutation::RemoveReferent {
                agent_id,
                software_id,
            } => format!(
                "Agent #{} is no longer referent of software #{}",
                agent_id, software_id
            ),
            CatalogMutation::CreateInstance(i) => {
                format!("Add instance #{} of software #{}", i.id, i.main_software_id)
            }
            CatalogMutation::UpdateInstance(i) => format!("Update instance #{}", i.id),
        }
    }
}

impl Catalog {
    pub fn software_by_id(&self, id: SoftwareId) -> Option<&Software> {
        self.software.iter().find(|s| s.id == id)
    }

    pub fn agent_by_id(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    /// Next free software id (ids are never reused)
    pub fn next_software_id(&self) -> SoftwareId {
        self.software.iter().map(|s| s.id).max().map_or(1, |id| id + 1)
    }

    pub fn next_instance_id(&self) -> InstanceId {
        self.instances.iter().map(|i| i.id).max().map_or(1, |id| id + 1)
    }

    /// Applies a mutation in place, validating the references it introduces
    pub fn apply(&mut self, mutation: CatalogMutation) -> Result<(), CompilationError> {
        match mutation {
            CatalogMutation::CreateSoftware(software) => {
                software.validate()?;
                if self.software_by_id(software.id).is_some() {
                    return Err(CompilationError::DuplicateSoftwareId {
                        software_id: software.id,
                    });
                }
                self.ensure_name_available(&software.name, software.id)?;
                self.software.push(software);
            }
            CatalogMutation::UpdateSoftware(software) => {
                software.validate()?;
                self.ensure_name_available(&software.name, software.id)?;
                let slot = self.software_mut(software.id)?;
                *slot = software;
            }
            CatalogMutation::RemoveSoftware { software_id } => {
                self.software_mut(software_id)?.is_present = false;
            }
            CatalogMutation::RegisterAgent(agent) => {
                if self.agent_by_id(agent.id).is_some() {
                    return Err(CompilationError::DuplicateAgent { agent_id: agent.id });
                }
                self.agents.push(agent);
            }
            CatalogMutation::DeclareUser(declaration) => {
                self.ensure_declaration_targets(declaration.agent_id, declaration.software_id)?;
                self.users.retain(|u| {
                    !(u.agent_id == declaration.agent_id && u.software_id == declaration.software_id)
                });
                self.users.push(declaration);
            }
            CatalogMutation::RemoveUser {
                agent_id,
                software_id,
            } => {
                self.users
                    .retain(|u| !(u.agent_id == agent_id && u.software_id == software_id));
            }
            CatalogMutation::DeclareReferent(declaration) => {
                self.ensure_declaration_targets(declaration.agent_id, declaration.software_id)?;
                self.referents.retain(|r| {
                    !(r.agent_id == declaration.agent_id && r.software_id == declaration.software_id)
                });
                self.referents.push(declaration);
            }
            CatalogMutation::RemoveReferent {
                agent_id,
                software_id,
            } => {
                self.referents
                    .retain(|r| !(r.agent_id == agent_id && r.software_id == software_id));
            }
            CatalogMutation::CreateInstance(instance) => {
                if self.instances.iter().any(|i| i.id == instance.id) {
                    return Err(CompilationError::DuplicateInstance {
                        instance_id: instance.id,
                    });
                }
                self.ensure_software_exists(instance.main_software_id)?;
                self.instances.push(instance);
            }
            CatalogMutation::UpdateInstance(instance) => {
                self.ensure_software_exists(instance.main_software_id)?;
                let slot = self
                    .instances
                    .iter_mut()
                    .find(|i| i.id == instance.id)
                    .ok_or(CompilationError::UnknownInstance {
                        instance_id: instance.id,
                    })?;
                *slot = instance;
            }
        }
        Ok(())
    }

    fn software_mut(&mut self, id: SoftwareId) -> Result<&mut Software, CompilationError> {
        self.software
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(CompilationError::UnknownSoftware { software_id: id })
    }

    fn ensure_software_exists(&self, id: SoftwareId) -> Result<(), CompilationError> {
        self.software_by_id(id)
            .map(|_| ())
            .ok_or(CompilationError::UnknownSoftware { software_id: id })
    }

    fn ensure_declaration_targets(
        &self,
        agent_id: AgentId,
        software_id: SoftwareId,
    ) -> Result<(), CompilationError> {
        if self.agent_by_id(agent_id).is_none() {
            return Err(CompilationError::UnknownAgent { agent_id });
        }
        self.ensure_software_exists(software_id)
    }

    fn ensure_name_available(&self, name: &str, owner: SoftwareId) -> Result<(), CompilationError> {
        let taken = self
            .software
            .iter()
            .any(|s| s.id != owner && s.name.eq_ignore_ascii_case(name.trim()));
        if taken {
            return Err(CompilationError::DuplicateSoftwareName {
                name: name.to_string(),
            });
        }
        Ok(())
    }
}
