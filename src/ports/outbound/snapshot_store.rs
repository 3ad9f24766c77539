use crate::compilation::domain::{Catalog, CompiledRecord};
use crate::shared::Result;
use async_trait::async_trait;

/// CatalogStore port for persisting the authoritative catalog
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Reads the current catalog snapshot
    async fn read_catalog(&self) -> Result<Catalog>;

    /// Replaces the stored catalog in a single atomic step
    ///
    /// # Arguments
    /// * `catalog` - The new catalog snapshot
    /// * `change_description` - What changed, recorded with the snapshot
    async fn write_catalog(&self, catalog: &Catalog, change_description: &str) -> Result<()>;
}

/// CompiledStore port for persisting the last compilation result
///
/// The stored records are the "previous snapshot" of the next run.
#[async_trait]
pub trait CompiledStore: Send + Sync {
    /// Reads the last compiled snapshot
    ///
    /// # Returns
    /// `None` when nothing was compiled yet
    async fn read_compiled(&self) -> Result<Option<Vec<CompiledRecord>>>;

    /// Replaces the stored compiled snapshot in a single atomic step
    async fn write_compiled(
        &self,
        compiled: &[CompiledRecord],
        change_description: &str,
    ) -> Result<()>;
}
