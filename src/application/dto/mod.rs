/// Data Transfer Objects for application layer
///
/// DTOs are used to transfer data between the application layer
/// and adapters, keeping the domain layer isolated.
mod compilation_outcome;

pub use compilation_outcome::{CompilationMode, CompilationOutcome, CompilationReport};
