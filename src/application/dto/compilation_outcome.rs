use crate::compilation::domain::CompiledRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Whether a run may reuse the previous compilation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CompilationMode {
    /// Every gateway cache is invalidated and everything is fetched again
    Full,
    /// Unchanged field groups are carried over from the previous compilation
    Incremental,
}

impl std::fmt::Display for CompilationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompilationMode::Full => write!(f, "full"),
            CompilationMode::Incremental => write!(f, "incremental"),
        }
    }
}

/// CompilationReport - Statistics of one compilation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilationReport {
    pub run_id: Uuid,
    pub mode: CompilationMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub record_count: usize,
    /// Gateway lookups actually issued
    pub fetched: usize,
    /// Field values carried over from the previous compilation
    pub reused: usize,
    /// Lookups that failed and resolved to absent
    pub failed: usize,
}

impl CompilationReport {
    pub fn summary(&self) -> String {
        format!(
            "{} compilation of {} record(s): {} lookup(s) issued, {} reused, {} failed",
            self.mode, self.record_count, self.fetched, self.reused, self.failed
        )
    }
}

/// CompilationOutcome - Response DTO of the compilation use case
#[derive(Debug, Clone)]
pub struct CompilationOutcome {
    /// Compiled records, in catalog order
    pub records: Vec<CompiledRecord>,
    pub report: CompilationReport,
}

impl CompilationOutcome {
    pub fn new(records: Vec<CompiledRecord>, report: CompilationReport) -> Self {
        Self { records, report }
    }
}
