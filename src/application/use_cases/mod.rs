/// Use cases module containing application business logic orchestration
mod compile_catalog;

pub use compile_catalog::{CompileCatalogUseCase, DEFAULT_MAX_CONCURRENT_RECORDS};
