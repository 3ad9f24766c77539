/// Network adapters for external API calls
mod caching_gateway;
mod github_release_client;
mod http_client;
mod knowledge_base_client;
mod project_directory_client;
mod service_provider_client;

pub use caching_gateway::{
    CachingGateway, CachingLatestVersionLookup, CachingServiceProviderDirectory, TtlCache,
    DEFAULT_CACHE_TTL,
};
pub use github_release_client::{GitHubReleaseClient, DEFAULT_GITHUB_API_URL};
pub use http_client::{JsonHttpClient, DEFAULT_TIMEOUT};
pub use knowledge_base_client::{KnowledgeBaseClient, DEFAULT_KNOWLEDGE_BASE_URL};
pub use project_directory_client::ProjectDirectoryClient;
pub use service_provider_client::ServiceProviderClient;
