use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application.
///
/// These codes allow supervisors (systemd, container runtimes) to tell a
/// recoverable failure from one that requires operator attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// Invalid command-line arguments (clap parsing errors)
    InvalidArguments = 2,
    /// Application error (invalid catalog, network error, file I/O error, etc.)
    ApplicationError = 3,
    /// In-memory and persisted state may have diverged; the process must not keep serving
    Unrecoverable = 4,
}

impl ExitCode {
    /// Convert to i32 for use with std::process::exit
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCode::Success => write!(f, "Success (0)"),
            ExitCode::InvalidArguments => write!(f, "Invalid Arguments (2)"),
            ExitCode::ApplicationError => write!(f, "Application Error (3)"),
            ExitCode::Unrecoverable => write!(f, "Unrecoverable (4)"),
        }
    }
}

/// Catalog invariant violations detected while compiling or mutating the catalog.
///
/// These indicate corrupted catalog data rather than an upstream hiccup, so a
/// compilation run that hits one is aborted and nothing gets published.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompilationError {
    #[error("{declaration} declaration for software #{software_id} references unknown agent #{agent_id}\n\n💡 Hint: The catalog is inconsistent; restore the agent or delete the declaration before retrying")]
    DanglingAgentReference {
        declaration: &'static str,
        software_id: u64,
        agent_id: u64,
    },

    #[error("Unknown software #{software_id}")]
    UnknownSoftware { software_id: u64 },

    #[error("Software named '{name}' already exists in the catalog\n\n💡 Hint: Software names identify catalog entries and must be unique")]
    DuplicateSoftwareName { name: String },

    #[error("Software #{software_id} already exists in the catalog")]
    DuplicateSoftwareId { software_id: u64 },

    #[error("Unknown agent #{agent_id}")]
    UnknownAgent { agent_id: u64 },

    #[error("Agent #{agent_id} is already registered")]
    DuplicateAgent { agent_id: u64 },

    #[error("Unknown instance #{instance_id}")]
    UnknownInstance { instance_id: u64 },

    #[error("Instance #{instance_id} already exists in the catalog")]
    DuplicateInstance { instance_id: u64 },

    /// Validation error for catalog values
    #[error("Validation error: {message}")]
    Validation { message: String },
}

/// Errors raised by the compilation coordinator.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("Compilation coordinator halted after an unrecoverable failure: {reason}\n\n💡 Hint: Restart the process; persisted and in-memory state may differ")]
    Halted { reason: String },

    #[error("Failed to persist {what} after a successful compilation\nDetails: {details}")]
    PersistenceFailed { what: &'static str, details: String },
}

/// Errors raised by the JSON file stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read store file: {path}\nDetails: {details}\n\n💡 Hint: Please verify that the file exists and you have read permissions")]
    ReadFailed { path: PathBuf, details: String },

    #[error("Failed to parse store file: {path}\nDetails: {details}\n\n💡 Hint: Please verify that the file contains a valid JSON snapshot")]
    ParseFailed { path: PathBuf, details: String },

    #[error("Failed to write store file: {path}\nDetails: {details}\n\n💡 Hint: Please verify that the directory exists and you have write permissions")]
    WriteFailed { path: PathBuf, details: String },

    #[error("Security violation: {path}\nReason: {reason}")]
    SecurityError { path: PathBuf, reason: String },
}
