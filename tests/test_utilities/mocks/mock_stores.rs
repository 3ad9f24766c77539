use async_trait::async_trait;
use catalog_compiler::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct StoreState {
    catalog: Mutex<Catalog>,
    compiled: Mutex<Option<Vec<CompiledRecord>>>,
    descriptions: Mutex<Vec<String>>,
    fail_writes: AtomicBool,
}

/// In-memory catalog and compiled store; clones share the same state
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<StoreState>,
}

impl InMemoryStore {
    pub fn with_catalog(catalog: Catalog) -> Self {
        let store = Self::default();
        *store.state.catalog.lock().unwrap() = catalog;
        store
    }

    pub fn stored_catalog(&self) -> Catalog {
        self.state.catalog.lock().unwrap().clone()
    }

    pub fn stored_compiled(&self) -> Option<Vec<CompiledRecord>> {
        self.state.compiled.lock().unwrap().clone()
    }

    /// Change descriptions of every successful write, oldest first
    pub fn descriptions(&self) -> Vec<String> {
        self.state.descriptions.lock().unwrap().clone()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.state.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.state.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("Mock store is read-only");
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn read_catalog(&self) -> Result<Catalog> {
        Ok(self.stored_catalog())
    }

    async fn write_catalog(&self, catalog: &Catalog, change_description: &str) -> Result<()> {
        self.check_writable()?;
        *self.state.catalog.lock().unwrap() = catalog.clone();
        self.state
            .descriptions
            .lock()
            .unwrap()
            .push(change_description.to_string());
        Ok(())
    }
}

#[async_trait]
impl CompiledStore for InMemoryStore {
    async fn read_compiled(&self) -> Result<Option<Vec<CompiledRecord>>> {
        Ok(self.stored_compiled())
    }

    async fn write_compiled(
        &self,
        compiled: &[CompiledRecord],
        change_description: &str,
    ) -> Result<()> {
        self.check_writable()?;
        *self.state.compiled.lock().unwrap() = Some(compiled.to_vec());
        self.state
            .descriptions
            .lock()
            .unwrap()
            .push(change_description.to_string());
        Ok(())
    }
}
