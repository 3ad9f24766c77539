/// ProgressReporter port for reporting progress during compilation runs
///
/// This port abstracts user-facing progress reporting (e.g., to stderr).
/// Runs resolve records concurrently and may execute on a background task,
/// so implementations must be `Send + Sync`.
pub trait ProgressReporter: Send + Sync {
    /// Reports a progress message
    fn report(&self, message: &str);

    /// Reports progress with a count
    ///
    /// # Arguments
    /// * `current` - Number of records compiled so far
    /// * `total` - Number of records in the run
    /// * `message` - Optional message to include
    fn report_progress(&self, current: usize, total: usize, message: Option<&str>);

    /// Reports an error or warning message
    fn report_error(&self, message: &str);

    /// Reports completion of an operation
    fn report_completion(&self, message: &str);
}
