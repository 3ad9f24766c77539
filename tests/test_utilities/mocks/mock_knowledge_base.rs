use async_trait::async_trait;
use catalog_compiler::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Builds a libre knowledge-base fragment labelled `label`
pub fn fragment(id: &str, label: &str) -> ExternalFragment {
    ExternalFragment {
        source: SourceKind::KnowledgeBase,
        external_id: ExternalId::new(id.to_string()).unwrap(),
        label: label.to_string(),
        description: format!("{} description", label),
        website_url: None,
        source_url: None,
        documentation_url: None,
        developers: vec![],
        license: None,
        logo_url: None,
        is_libre: true,
    }
}

/// Mock knowledge base counting fetches; clones share their counters
#[derive(Clone, Default)]
pub struct MockKnowledgeBase {
    fragments: Arc<Mutex<HashMap<String, ExternalFragment>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    fetches: Arc<AtomicUsize>,
    invalidations: Arc<Mutex<Vec<String>>>,
}

impl MockKnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fragment(self, fragment: ExternalFragment) -> Self {
        self.set_fragment(fragment);
        self
    }

    /// Replaces the upstream data, as if the registry was edited
    pub fn set_fragment(&self, fragment: ExternalFragment) {
        self.fragments
            .lock()
            .unwrap()
            .insert(fragment.external_id.to_string(), fragment);
    }

    pub fn with_failure(self, id: &str) -> Self {
        self.failing.lock().unwrap().insert(id.to_string());
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn invalidated(&self) -> Vec<String> {
        self.invalidations.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceGateway for MockKnowledgeBase {
    type Key = ExternalId;
    type Data = ExternalFragment;

    async fn fetch(&self, key: &ExternalId) -> Result<Option<ExternalFragment>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(key.as_str()) {
            anyhow::bail!("Mock knowledge base failure for {}", key);
        }
        Ok(self.fragments.lock().unwrap().get(key.as_str()).cloned())
    }

    async fn invalidate(&self, key: &ExternalId) {
        self.invalidations.lock().unwrap().push(key.to_string());
    }
}
