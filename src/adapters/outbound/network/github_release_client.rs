use super::http_client::JsonHttpClient;
use crate::compilation::domain::LatestVersion;
use crate::ports::outbound::{LatestVersionLookup, LookupStrategy};
use crate::shared::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::Deserialize;

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

const RELEASES_PER_PAGE: usize = 100;
/// Upper bound on pages walked by an exhaustive lookup
const MAX_RELEASE_PAGES: usize = 10;

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
    #[serde(default)]
    published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    draft: bool,
    #[serde(default)]
    prerelease: bool,
}

impl Release {
    fn is_stable(&self) -> bool {
        !self.draft && !self.prerelease
    }

    fn into_latest_version(self) -> LatestVersion {
        LatestVersion {
            version: self.tag_name,
            published_at: self.published_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Tag {
    name: String,
}

/// Owner and name of a GitHub repository
#[derive(Debug, Clone, PartialEq, Eq)]
struct RepositoryPath {
    owner: String,
    name: String,
}

impl RepositoryPath {
    /// Extracts the repository from a github.com URL; other hosts yield `None`
    fn from_url(repository_url: &str) -> Option<Self> {
        let url = Url::parse(repository_url.trim()).ok()?;
        let host = url.host_str()?.trim_start_matches("www.");
        if host != "github.com" {
            return None;
        }

        let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
        let owner = segments.next()?.to_string();
        let name = segments.next()?.trim_end_matches(".git").to_string();

        let valid = [&owner, &name]
            .iter()
            .all(|part| JsonHttpClient::validate_url_component(part, "Repository path").is_ok());
        valid.then_some(Self { owner, name })
    }
}

/// GitHubReleaseClient adapter detecting the latest release of GitHub repositories
///
/// # Strategies
/// - `Quick`: the "latest release" endpoint, falling back to the most recent tag
/// - `Exhaustive`: walks the release list and keeps the newest stable release
///
/// Repositories hosted elsewhere resolve to `None`.
pub struct GitHubReleaseClient {
    http: JsonHttpClient,
    api_url: String,
}

impl GitHubReleaseClient {
    pub fn new(http: JsonHttpClient, api_url: &str) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    fn repository_endpoint(&self, repository: &RepositoryPath) -> String {
        format!(
            "{}/repos/{}/{}",
            self.api_url,
            urlencoding::encode(&repository.owner),
            urlencoding::encode(&repository.name)
        )
    }

    async fn fetch_quick(&self, repository: &RepositoryPath) -> Result<Option<LatestVersion>> {
        let endpoint = self.repository_endpoint(repository);

        let latest = self
            .http
            .get_json::<Release>(&format!("{}/releases/latest", endpoint))
            .await?;
        if let Some(release) = latest {
            return Ok(Some(release.into_latest_version()));
        }

        // No published release: many projects only push tags
        let tags = self
            .http
            .get_json::<Vec<Tag>>(&format!("{}/tags?per_page=1", endpoint))
            .await?
            .unwrap_or_default();
        Ok(tags.into_iter().next().map(|tag| LatestVersion {
            version: tag.name,
            published_at: None,
        }))
    }

    async fn fetch_exhaustive(&self, repository: &RepositoryPath) -> Result<Option<LatestVersion>> {
        let endpoint = self.repository_endpoint(repository);
        let mut stable = Vec::new();

        for page in 1..=MAX_RELEASE_PAGES {
            let url = format!(
                "{}/releases?per_page={}&page={}",
                endpoint, RELEASES_PER_PAGE, page
            );
            let releases = self
                .http
                .get_json::<Vec<Release>>(&url)
                .await?
                .unwrap_or_default();
            let exhausted = releases.len() < RELEASES_PER_PAGE;
            stable.extend(releases.into_iter().filter(Release::is_stable));
            if exhausted {
                break;
            }
        }

        match Self::newest(stable) {
            Some(release) => Ok(Some(release)),
            // Same tag fallback as the quick lookup
            None => self.fetch_quick(repository).await,
        }
    }

    fn newest(releases: Vec<Release>) -> Option<LatestVersion> {
        releases
            .into_iter()
            .max_by_key(|release| release.published_at)
            .map(Release::into_latest_version)
    }
}

#[async_trait]
impl LatestVersionLookup for GitHubReleaseClient {
    async fn fetch_latest(
        &self,
        repository_url: &str,
        strategy: LookupStrategy,
    ) -> Result<Option<LatestVersion>> {
        let Some(repository) = RepositoryPath::from_url(repository_url) else {
            tracing::debug!(repository_url, "not a GitHub repository, skipping release lookup");
            return Ok(None);
        };

        match strategy {
            LookupStrategy::Quick => self.fetch_quick(&repository).await,
            LookupStrategy::Exhaustive => self.fetch_exhaustive(&repository).await,
        }
    }
}
