use crate::compilation::domain::LatestVersion;
use crate::shared::Result;
use async_trait::async_trait;

/// How hard to look for the latest release of a repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupStrategy {
    /// A single cheap request; used by incremental runs
    Quick,
    /// Walks the whole release history; used by full runs
    Exhaustive,
}

/// LatestVersionLookup port for detecting the latest release of a source repository
#[async_trait]
pub trait LatestVersionLookup: Send + Sync {
    /// Looks up the most recent release published in `repository_url`
    ///
    /// # Returns
    /// `None` when the repository is not hosted on a supported forge or has no release
    async fn fetch_latest(
        &self,
        repository_url: &str,
        strategy: LookupStrategy,
    ) -> Result<Option<LatestVersion>>;

    /// Drops any cached result for `repository_url`
    async fn invalidate(&self, _repository_url: &str) {}
}
