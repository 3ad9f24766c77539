/// Mock implementations for testing
mod mock_knowledge_base;
mod mock_progress_reporter;
mod mock_sources;
mod mock_stores;

pub use mock_knowledge_base::{fragment, MockKnowledgeBase};
pub use mock_progress_reporter::MockProgressReporter;
pub use mock_sources::{MockLatestVersions, MockProjectDirectory, MockServiceProviders};
pub use mock_stores::InMemoryStore;
