use super::http_client::JsonHttpClient;
use crate::compilation::domain::DirectoryEntry;
use crate::ports::outbound::SourceGateway;
use crate::shared::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Deserialize)]
struct DirectoryExport {
    #[serde(default, alias = "softwares")]
    software: Vec<ExportedProject>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportedProject {
    id: u64,
    #[serde(default, alias = "logo_url")]
    logo_url: Option<String>,
    #[serde(default, alias = "tags")]
    keywords: Vec<String>,
}

type DirectoryIndex = Arc<HashMap<u64, DirectoryEntry>>;

/// ProjectDirectoryClient adapter for the directory of open-source projects
///
/// The directory only offers a bulk export, so the whole export is
/// downloaded on the first lookup and indexed by project id. Invalidating
/// any id drops the index; the next lookup downloads a fresh export.
pub struct ProjectDirectoryClient {
    http: JsonHttpClient,
    export_url: String,
    index: Mutex<Option<DirectoryIndex>>,
}

impl ProjectDirectoryClient {
    pub fn new(http: JsonHttpClient, export_url: &str) -> Self {
        Self {
            http,
            export_url: export_url.to_string(),
            index: Mutex::new(None),
        }
    }

    /// Loaded index, downloading the export at most once at a time
    async fn index(&self) -> Result<DirectoryIndex> {
        let mut index = self.index.lock().await;
        if let Some(loaded) = index.as_ref() {
            return Ok(loaded.clone());
        }

        let export = self
            .http
            .get_json::<DirectoryExport>(&self.export_url)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Directory export not found at {}", self.export_url))?;
        let loaded = Arc::new(Self::build_index(export));
        tracing::debug!(projects = loaded.len(), "project directory export loaded");

        *index = Some(loaded.clone());
        Ok(loaded)
    }

    fn build_index(export: DirectoryExport) -> HashMap<u64, DirectoryEntry> {
        export
            .software
            .into_iter()
            .map(|project| {
                let entry = DirectoryEntry {
                    id: project.id,
                    logo_url: project.logo_url.filter(|url| !url.trim().is_empty()),
                    keywords: project.keywords,
                };
                (project.id, entry)
            })
            .collect()
    }
}

#[async_trait]
impl SourceGateway for ProjectDirectoryClient {
    type Key = u64;
    type Data = DirectoryEntry;

    async fn fetch(&self, id: &u64) -> Result<Option<DirectoryEntry>> {
        let index = self.index().await?;
        Ok(index.get(id).cloned())
    }

    async fn invalidate(&self, _id: &u64) {
        *self.index.lock().await = None;
    }
}
