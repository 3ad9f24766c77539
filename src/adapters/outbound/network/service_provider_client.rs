use super::http_client::JsonHttpClient;
use crate::compilation::domain::ServiceProvider;
use crate::ports::outbound::{ServiceProviderDirectory, ServiceProvidersBySoftware};
use crate::shared::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// ServiceProviderClient adapter for the directory of public-sector service providers
///
/// The directory publishes one JSON object mapping catalog software ids
/// (as strings) to the providers offering support for them. Without a
/// configured URL the directory is empty.
pub struct ServiceProviderClient {
    http: JsonHttpClient,
    url: Option<String>,
}

impl ServiceProviderClient {
    pub fn new(http: JsonHttpClient, url: Option<String>) -> Self {
        Self { http, url }
    }

    fn parse(raw: HashMap<String, Vec<ServiceProvider>>) -> ServiceProvidersBySoftware {
        raw.into_iter()
            .filter_map(|(key, providers)| match key.trim().parse::<u64>() {
                Ok(software_id) => Some((software_id, providers)),
                Err(_) => {
                    tracing::warn!(key = %key, "ignoring service providers listed under a non-numeric id");
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl ServiceProviderDirectory for ServiceProviderClient {
    async fn fetch_all(&self) -> Result<ServiceProvidersBySoftware> {
        let Some(url) = self.url.as_deref() else {
            return Ok(ServiceProvidersBySoftware::new());
        };

        let raw = self
            .http
            .get_json::<HashMap<String, Vec<ServiceProvider>>>(url)
            .await?
            .unwrap_or_default();
        Ok(Self::parse(raw))
    }
}
