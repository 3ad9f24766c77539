pub mod catalog;
pub mod compiled;
pub mod external;
pub mod similarity;

pub use catalog::{
    Agent, AgentId, Catalog, CatalogMutation, Instance, InstanceId, ReferentDeclaration, Software,
    SoftwareId, UserDeclaration,
};
pub use compiled::{
    CompiledInstance, CompiledRecord, CompiledReferent, CompiledUser, OrganizationCount,
};
pub use external::{
    DirectoryEntry, ExternalFragment, ExternalId, LatestVersion, ServiceProvider, SoftwareSummary,
    SourceKind,
};
pub use similarity::{ReferenceKey, SimilaritySet, SoftwareReference};
