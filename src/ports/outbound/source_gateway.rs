use crate::shared::Result;
use async_trait::async_trait;
use std::fmt::Debug;
use std::hash::Hash;

/// SourceGateway port for looking data up in an external registry by id
///
/// This port abstracts one external data source (knowledge base, project
/// directory). Sources are slow, rate-limited and unreliable: an unknown id
/// resolves to `Ok(None)`, transport or payload problems to `Err`.
///
/// # Caching
/// Implementations may cache results. `invalidate` drops whatever is cached
/// for an id so that the next `fetch` reaches the source again; it is a no-op
/// for uncached implementations.
#[async_trait]
pub trait SourceGateway: Send + Sync {
    /// Identifier of an entry in this source
    type Key: Clone + Eq + Hash + Debug + Send + Sync + 'static;
    /// Data returned for an entry
    type Data: Clone + Send + Sync + 'static;

    /// Fetches the entry identified by `key`
    ///
    /// # Returns
    /// `None` when the source does not know the entry
    ///
    /// # Errors
    /// Returns an error if:
    /// - The network request fails
    /// - The source returns an error status code
    /// - The response cannot be parsed
    async fn fetch(&self, key: &Self::Key) -> Result<Option<Self::Data>>;

    /// Drops any cached result for `key`
    async fn invalidate(&self, _key: &Self::Key) {}
}
