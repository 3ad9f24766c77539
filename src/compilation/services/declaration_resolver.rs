use crate::compilation::domain::{
    Agent, AgentId, Catalog, CompiledReferent, CompiledUser, OrganizationCount, SoftwareId,
};
use crate::shared::error::CompilationError;
use std::collections::{BTreeMap, HashMap};

/// Referents and users of one software, joined with their agents
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedDeclarations {
    pub referents: Vec<CompiledReferent>,
    pub users: Vec<CompiledUser>,
}

impl ResolvedDeclarations {
    /// Number of users and referents per organization
    pub fn organization_counts(&self) -> BTreeMap<String, OrganizationCount> {
        let mut counts: BTreeMap<String, OrganizationCount> = BTreeMap::new();
        for user in &self.users {
            counts.entry(user.organization.clone()).or_default().user_count += 1;
        }
        for referent in &self.referents {
            counts
                .entry(referent.organization.clone())
                .or_default()
                .referent_count += 1;
        }
        counts
    }

    pub fn has_expert_referent(&self) -> bool {
        self.referents.iter().any(|r| r.is_expert)
    }
}

/// DeclarationResolver joins user and referent declarations with their agents
///
/// A declaration whose agent is missing from the catalog means the catalog
/// itself is corrupted; resolution fails instead of silently dropping it.
pub struct DeclarationResolver;

impl DeclarationResolver {
    pub fn resolve(
        catalog: &Catalog,
    ) -> Result<HashMap<SoftwareId, ResolvedDeclarations>, CompilationError> {
        let agents: HashMap<AgentId, &Agent> = catalog.agents.iter().map(|a| (a.id, a)).collect();
        let mut resolved: HashMap<SoftwareId, ResolvedDeclarations> = HashMap::new();

        for declaration in &catalog.referents {
            let agent = Self::agent(
                &agents,
                "referent",
                declaration.software_id,
                declaration.agent_id,
            )?;
            resolved
                .entry(declaration.software_id)
                .or_default()
                .referents
                .push(CompiledReferent {
                    agent_id: agent.id,
                    email: agent.email.clone(),
                    organization: agent.organization.clone(),
                    is_expert: declaration.is_expert,
                    use_case_description: declaration.use_case_description.clone(),
                    service_url: declaration.service_url.clone(),
                });
        }

        for declaration in &catalog.users {
            let agent = Self::agent(&agents, "user", declaration.software_id, declaration.agent_id)?;
            resolved
                .entry(declaration.software_id)
                .or_default()
                .users
                .push(CompiledUser {
                    agent_id: agent.id,
                    organization: agent.organization.clone(),
                    version: declaration.version.clone(),
                    service_url: declaration.service_url.clone(),
                });
        }

        Ok(resolved)
    }

    fn agent<'a>(
        agents: &HashMap<AgentId, &'a Agent>,
        declaration: &'static str,
        software_id: SoftwareId,
        agent_id: AgentId,
    ) -> Result<&'a Agent, CompilationError> {
        agents
            .get(&agent_id)
            .copied()
            .ok_or(CompilationError::DanglingAgentReference {
                declaration,
                software_id,
                agent_id,
            })
    }
}
