use crate::compilation::domain::{ServiceProvider, SoftwareId};
use crate::shared::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Service providers listed for each catalog software
pub type ServiceProvidersBySoftware = HashMap<SoftwareId, Vec<ServiceProvider>>;

/// ServiceProviderDirectory port for the directory of public-sector service providers
///
/// The directory is keyed by catalog software id and is fetched as a whole.
#[async_trait]
pub trait ServiceProviderDirectory: Send + Sync {
    async fn fetch_all(&self) -> Result<ServiceProvidersBySoftware>;

    /// Drops any cached copy of the directory
    async fn invalidate(&self) {}
}
