use async_trait::async_trait;
use catalog_compiler::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Mock project directory; unknown ids resolve to `None`
#[derive(Clone, Default)]
pub struct MockProjectDirectory {
    entries: Arc<Mutex<HashMap<u64, DirectoryEntry>>>,
    fetches: Arc<AtomicUsize>,
}

impl MockProjectDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(self, id: u64, keywords: &[&str]) -> Self {
        self.entries.lock().unwrap().insert(
            id,
            DirectoryEntry {
                id,
                logo_url: Some(format!("https://directory.example/logos/{}.png", id)),
                keywords: keywords.iter().map(|k| k.to_string()).collect(),
            },
        );
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceGateway for MockProjectDirectory {
    type Key = u64;
    type Data = DirectoryEntry;

    async fn fetch(&self, key: &u64) -> Result<Option<DirectoryEntry>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }
}

/// Mock release lookup recording the strategy of every call
#[derive(Clone, Default)]
pub struct MockLatestVersions {
    versions: Arc<Mutex<HashMap<String, String>>>,
    calls: Arc<Mutex<Vec<(String, LookupStrategy)>>>,
}

impl MockLatestVersions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(self, repository_url: &str, version: &str) -> Self {
        self.versions
            .lock()
            .unwrap()
            .insert(repository_url.to_string(), version.to_string());
        self
    }

    pub fn calls(&self) -> Vec<(String, LookupStrategy)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LatestVersionLookup for MockLatestVersions {
    async fn fetch_latest(
        &self,
        repository_url: &str,
        strategy: LookupStrategy,
    ) -> Result<Option<LatestVersion>> {
        self.calls
            .lock()
            .unwrap()
            .push((repository_url.to_string(), strategy));
        Ok(self
            .versions
            .lock()
            .unwrap()
            .get(repository_url)
            .map(|version| LatestVersion {
                version: version.clone(),
                published_at: None,
            }))
    }
}

/// Mock service-provider directory
#[derive(Clone, Default)]
pub struct MockServiceProviders {
    providers: Arc<Mutex<ServiceProvidersBySoftware>>,
    should_fail: bool,
}

impl MockServiceProviders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(self, software_id: u64, name: &str) -> Self {
        self.providers
            .lock()
            .unwrap()
            .entry(software_id)
            .or_default()
            .push(ServiceProvider {
                name: name.to_string(),
                website: None,
                directory_url: None,
            });
        self
    }

    pub fn with_failure() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl ServiceProviderDirectory for MockServiceProviders {
    async fn fetch_all(&self) -> Result<ServiceProvidersBySoftware> {
        if self.should_fail {
            anyhow::bail!("Mock service provider directory failure");
        }
        Ok(self.providers.lock().unwrap().clone())
    }
}
