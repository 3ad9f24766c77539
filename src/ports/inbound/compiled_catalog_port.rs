use crate::application::read_models::{EnrichedSoftware, EnrichedSoftwareBuilder};
use crate::compilation::domain::{Catalog, CompiledRecord};
use std::sync::Arc;

/// A published (catalog, compiled) pair
///
/// Both halves are always swapped together, so a reader never sees a
/// compiled record whose catalog counterpart is missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublishedSnapshot {
    /// Incremented by every committed catalog mutation
    pub version: u64,
    pub catalog: Catalog,
    pub compiled: Vec<CompiledRecord>,
}

/// CompiledCatalogPort - Read surface consumed by the API layer
pub trait CompiledCatalogPort: Send + Sync {
    /// The currently published pair
    fn snapshot(&self) -> Arc<PublishedSnapshot>;

    /// Asks for a full recompilation; returns immediately
    fn trigger_full_recompilation(&self);

    fn get_compiled(&self) -> Vec<CompiledRecord> {
        self.snapshot().compiled.clone()
    }

    /// Compiled records with their similar-software lists
    fn get_enriched(&self) -> Vec<EnrichedSoftware> {
        EnrichedSoftwareBuilder::build(&self.snapshot().compiled)
    }
}
