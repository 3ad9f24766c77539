/// Inbound ports (Driving ports) - Use case interfaces
///
/// These ports define the interfaces that external adapters (e.g., CLI, API)
/// use to interact with the application core.
pub mod catalog_compilation_port;
pub mod compiled_catalog_port;

pub use catalog_compilation_port::CatalogCompilationPort;
pub use compiled_catalog_port::{CompiledCatalogPort, PublishedSnapshot};
