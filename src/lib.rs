//! catalog-compiler - Incremental compiler for a software catalog
//!
//! This library merges an internally-owned software catalog with data from
//! third-party registries (a structured-data knowledge base, an open-source
//! project directory, a service-provider directory and GitHub releases),
//! reusing previous results whenever the upstream identity is unchanged.
//! It follows hexagonal architecture and Domain-Driven Design principles.
//!
//! # Architecture
//!
//! The library is organized into the following layers:
//!
//! - **Domain Layer** (`compilation`): Catalog and compiled models, reuse rules, clustering
//! - **Application Layer** (`application`): Compilation use case, coordinator and scheduler
//! - **Ports** (`ports`): Interface definitions for infrastructure
//! - **Adapters** (`adapters`): Concrete implementations of ports
//! - **Shared** (`shared`): Common utilities and error types
//!
//! # Example
//!
//! ```no_run
//! use catalog_compiler::prelude::*;
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<()> {
//! let http = JsonHttpClient::new(DEFAULT_TIMEOUT)?;
//! let use_case = CompileCatalogUseCase::new(
//!     CachingGateway::new(
//!         KnowledgeBaseClient::new(http.clone(), DEFAULT_KNOWLEDGE_BASE_URL, vec!["en".into()]),
//!         DEFAULT_CACHE_TTL,
//!     ),
//!     CachingGateway::new(
//!         ProjectDirectoryClient::new(http.clone(), "https://directory.example/export.json"),
//!         DEFAULT_CACHE_TTL,
//!     ),
//!     CachingLatestVersionLookup::new(
//!         GitHubReleaseClient::new(http.clone(), DEFAULT_GITHUB_API_URL),
//!         DEFAULT_CACHE_TTL,
//!     ),
//!     ServiceProviderClient::new(http, None),
//!     StderrProgressReporter::new(),
//! );
//!
//! let store = JsonFileStore::new(PathBuf::from("catalog.json"), PathBuf::from("compiled.json"));
//! let coordinator = CompilationCoordinator::new(use_case, store.clone(), store);
//! coordinator.bootstrap().await?;
//!
//! for software in coordinator.get_enriched() {
//!     println!("{}: {} similar", software.name(), software.similar.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod application;
pub mod compilation;
pub mod ports;
pub mod shared;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapters::outbound::console::{SilentProgressReporter, StderrProgressReporter};
    pub use crate::adapters::outbound::filesystem::JsonFileStore;
    pub use crate::adapters::outbound::network::{
        CachingGateway, CachingLatestVersionLookup, CachingServiceProviderDirectory,
        GitHubReleaseClient, JsonHttpClient, KnowledgeBaseClient, ProjectDirectoryClient,
        ServiceProviderClient, TtlCache, DEFAULT_CACHE_TTL, DEFAULT_GITHUB_API_URL,
        DEFAULT_KNOWLEDGE_BASE_URL, DEFAULT_TIMEOUT,
    };
    pub use crate::application::coordinator::{CompilationCoordinator, FullRecompilation};
    pub use crate::application::dto::{CompilationMode, CompilationOutcome, CompilationReport};
    pub use crate::application::read_models::{EnrichedSoftware, EnrichedSoftwareBuilder};
    pub use crate::application::use_cases::CompileCatalogUseCase;
    pub use crate::compilation::domain::{
        Agent, Catalog, CatalogMutation, CompiledInstance, CompiledRecord, DirectoryEntry,
        ExternalFragment, ExternalId, Instance, LatestVersion, ReferentDeclaration,
        ServiceProvider, SimilaritySet, Software, SoftwareReference, SoftwareSummary, SourceKind,
        UserDeclaration,
    };
    pub use crate::compilation::services::SimilarityClustering;
    pub use crate::ports::inbound::{CatalogCompilationPort, CompiledCatalogPort, PublishedSnapshot};
    pub use crate::ports::outbound::{
        CatalogStore, CompiledStore, LatestVersionLookup, LookupStrategy, ProgressReporter,
        ServiceProviderDirectory, ServiceProvidersBySoftware, SourceGateway,
    };
    pub use crate::shared::error::{CompilationError, CoordinatorError, ExitCode, StoreError};
    pub use crate::shared::Result;
}
