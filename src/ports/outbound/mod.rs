/// Outbound ports (Driven ports) - Infrastructure interfaces
///
/// These ports define the interfaces that the application core uses
/// to interact with external systems (registries, file system, console, etc.).
pub mod latest_version_lookup;
pub mod progress_reporter;
pub mod service_provider_directory;
pub mod snapshot_store;
pub mod source_gateway;

pub use latest_version_lookup::{LatestVersionLookup, LookupStrategy};
pub use progress_reporter::ProgressReporter;
pub use service_provider_directory::{ServiceProviderDirectory, ServiceProvidersBySoftware};
pub use snapshot_store::{CatalogStore, CompiledStore};
pub use source_gateway::SourceGateway;
