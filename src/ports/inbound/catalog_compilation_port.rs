use crate::application::dto::CompilationOutcome;
use crate::compilation::domain::{Catalog, CompiledRecord};
use crate::shared::Result;
use async_trait::async_trait;

/// CatalogCompilationPort - Inbound port for compiling a catalog snapshot
///
/// # Arguments
/// * `catalog` - Snapshot to compile
/// * `previous` - Result of the previous run; `None` requests a full run
///
/// # Errors
/// Returns an error when the catalog violates an invariant (e.g. a
/// declaration referencing an unknown agent). Upstream failures never
/// surface here; the affected fields are simply absent.
#[async_trait]
pub trait CatalogCompilationPort: Send + Sync {
    async fn compile(
        &self,
        catalog: &Catalog,
        previous: Option<&[CompiledRecord]>,
    ) -> Result<CompilationOutcome>;
}
