use crate::compilation::domain::LatestVersion;
use crate::ports::outbound::{
    LatestVersionLookup, LookupStrategy, ServiceProviderDirectory, ServiceProvidersBySoftware,
    SourceGateway,
};
use crate::shared::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Default time-to-live of cached source results
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3 * 60 * 60);

/// TtlCache - Thread-safe map whose entries expire after a fixed duration
///
/// Expired entries are dropped lazily, on the lookup that finds them.
pub struct TtlCache<K, V> {
    entries: DashMap<K, (Instant, V)>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        {
            let entry = self.entries.get(key)?;
            let (stored_at, value) = entry.value();
            if stored_at.elapsed() < self.ttl {
                return Some(value.clone());
            }
        }
        // Guard released; an entry refreshed in the meantime must survive
        self.entries
            .remove_if(key, |_, (stored_at, _)| stored_at.elapsed() >= self.ttl);
        None
    }

    pub fn insert(&self, key: K, value: V) {
        self.entries.insert(key, (Instant::now(), value));
    }

    pub fn invalidate(&self, key: &K) {
        self.entries.remove(key);
    }

    pub fn invalidate_where(&self, predicate: impl Fn(&K) -> bool) {
        self.entries.retain(|key, _| !predicate(key));
    }

    /// Returns the current cache size (for testing/monitoring)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// CachingGateway wraps a SourceGateway and adds in-memory caching.
///
/// This adapter implements the decorator pattern to add caching capability
/// to any SourceGateway implementation. Both found and unknown entries are
/// cached; failures are not, so the next lookup reaches the source again.
///
/// # Architecture
/// In hexagonal architecture, caching is an implementation detail of the adapter layer.
/// The orchestrator only decides when a cached entry must be dropped, through
/// `invalidate`.
pub struct CachingGateway<G: SourceGateway> {
    inner: G,
    cache: TtlCache<G::Key, Option<G::Data>>,
}

impl<G: SourceGateway> CachingGateway<G> {
    /// Creates a new caching gateway wrapping the given inner gateway
    pub fn new(inner: G, ttl: Duration) -> Self {
        Self {
            inner,
            cache: TtlCache::new(ttl),
        }
    }

    /// Returns the current cache size (for testing/monitoring)
    #[cfg(test)]
    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}

#[async_trait]
impl<G: SourceGateway> SourceGateway for CachingGateway<G> {
    type Key = G::Key;
    type Data = G::Data;

    async fn fetch(&self, key: &G::Key) -> Result<Option<G::Data>> {
        // Check cache first
        if let Some(cached) = self.cache.get(key) {
            return Ok(cached);
        }

        // Cache miss: fetch from inner gateway
        let data = self.inner.fetch(key).await?;
        self.cache.insert(key.clone(), data.clone());
        Ok(data)
    }

    async fn invalidate(&self, key: &G::Key) {
        self.cache.invalidate(key);
        self.inner.invalidate(key).await;
    }
}

/// CachingLatestVersionLookup caches latest-version lookups per (URL, strategy)
pub struct CachingLatestVersionLookup<L: LatestVersionLookup> {
    inner: L,
    cache: TtlCache<(String, LookupStrategy), Option<LatestVersion>>,
}

impl<L: LatestVersionLookup> CachingLatestVersionLookup<L> {
    pub fn new(inner: L, ttl: Duration) -> Self {
        Self {
            inner,
            cache: TtlCache::new(ttl),
        }
    }
}

#[async_trait]
impl<L: LatestVersionLookup> LatestVersionLookup for CachingLatestVersionLookup<L> {
    async fn fetch_latest(
        &self,
        repository_url: &str,
        strategy: LookupStrategy,
    ) -> Result<Option<LatestVersion>> {
        let key = (repository_url.to_string(), strategy);
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }

        let latest = self.inner.fetch_latest(repository_url, strategy).await?;
        self.cache.insert(key, latest.clone());
        Ok(latest)
    }

    async fn invalidate(&self, repository_url: &str) {
        self.cache.invalidate_where(|(url, _)| url == repository_url);
        self.inner.invalidate(repository_url).await;
    }
}

/// CachingServiceProviderDirectory keeps the last downloaded directory for a while
pub struct CachingServiceProviderDirectory<D: ServiceProviderDirectory> {
    inner: D,
    cache: TtlCache<(), ServiceProvidersBySoftware>,
}

impl<D: ServiceProviderDirectory> CachingServiceProviderDirectory<D> {
    pub fn new(inner: D, ttl: Duration) -> Self {
        Self {
            inner,
            cache: TtlCache::new(ttl),
        }
    }
}

#[async_trait]
impl<D: ServiceProviderDirectory> ServiceProviderDirectory for CachingServiceProviderDirectory<D> {
    async fn fetch_all(&self) -> Result<ServiceProvidersBySoftware> {
        if let Some(cached) = self.cache.get(&()) {
            return Ok(cached);
        }

        let providers = self.inner.fetch_all().await?;
        self.cache.insert((), providers.clone());
        Ok(providers)
    }

    async fn invalidate(&self) {
        self.cache.invalidate(&());
        self.inner.invalidate().await;
    }
}
