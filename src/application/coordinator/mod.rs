use crate::application::dto::CompilationReport;
use crate::compilation::domain::{Catalog, CatalogMutation, CompiledRecord};
use crate::ports::inbound::{CatalogCompilationPort, CompiledCatalogPort, PublishedSnapshot};
use crate::ports::outbound::{CatalogStore, CompiledStore};
use crate::shared::error::CoordinatorError;
use crate::shared::Result;
use arc_swap::ArcSwap;
use std::sync::Arc;
use tokio::sync::{watch, Mutex, Notify};

/// Default number of attempts of a full recompilation before it is abandoned
pub const DEFAULT_MAX_FULL_RECOMPILATION_ATTEMPTS: usize = 5;

const FULL_RECOMPILATION_DESCRIPTION: &str = "Full recompilation";

/// Result of a full recompilation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FullRecompilation {
    /// The result was published; `attempts` counts the stale runs plus the committed one
    Committed {
        attempts: usize,
        report: CompilationReport,
    },
    /// The catalog kept changing under every attempt
    Abandoned { attempts: usize },
}

/// CompilationCoordinator - Owner of the catalog and of its compiled view
///
/// All read-modify-write sequences go through a single async mutex:
///
/// ```text
/// Idle -> Transacting (lock held) -> publish (catalog, compiled) -> Idle
/// ```
///
/// A mutation is applied to a copy of the catalog and compiled incrementally
/// before anything is committed. Full recompilations run outside the lock
/// and only commit if the catalog version they started from is still the
/// published one.
///
/// When a store write fails after a successful compilation, persisted and
/// in-memory state may have diverged. The coordinator then halts: the reason
/// is broadcast on a watch channel and every later mutation is refused.
///
/// # Type Parameters
/// * `C` - CatalogCompilationPort implementation
/// * `CS` - CatalogStore implementation
/// * `PS` - CompiledStore implementation
pub struct CompilationCoordinator<C, CS, PS> {
    compiler: C,
    catalog_store: CS,
    compiled_store: PS,
    transaction_lock: Mutex<()>,
    published: ArcSwap<PublishedSnapshot>,
    halted: watch::Sender<Option<String>>,
    trigger: Notify,
    max_full_attempts: usize,
}

impl<C, CS, PS> CompilationCoordinator<C, CS, PS>
where
    C: CatalogCompilationPort,
    CS: CatalogStore,
    PS: CompiledStore,
{
    /// Creates a coordinator publishing an empty catalog until `bootstrap` runs
    pub fn new(compiler: C, catalog_store: CS, compiled_store: PS) -> Self {
        let (halted, _) = watch::channel(None);
        Self {
            compiler,
            catalog_store,
            compiled_store,
            transaction_lock: Mutex::new(()),
            published: ArcSwap::from_pointee(PublishedSnapshot::default()),
            halted,
            trigger: Notify::new(),
            max_full_attempts: DEFAULT_MAX_FULL_RECOMPILATION_ATTEMPTS,
        }
    }

    pub fn with_max_full_recompilation_attempts(mut self, attempts: usize) -> Self {
        self.max_full_attempts = attempts.max(1);
        self
    }

    /// Loads both stores and publishes a compilation of the stored catalog
    ///
    /// The stored compiled snapshot, when present, serves as the previous
    /// compilation; otherwise a full run is made.
    ///
    /// # Errors
    /// Returns an error if a store cannot be read or the stored catalog is
    /// inconsistent. A failure to write the compiled snapshot halts the
    /// coordinator.
    pub async fn bootstrap(&self) -> Result<CompilationReport> {
        self.ensure_running()?;
        let _guard = self.transaction_lock.lock().await;

        let catalog = self.catalog_store.read_catalog().await?;
        let previous = self.compiled_store.read_compiled().await?;
        tracing::info!(
            software = catalog.software.len(),
            has_previous = previous.is_some(),
            "bootstrapping compilation coordinator"
        );

        let outcome = self.compiler.compile(&catalog, previous.as_deref()).await?;
        self.persist_compiled(&outcome.records, "Startup compilation").await?;

        let version = self.published.load().version + 1;
        self.publish(version, catalog, outcome.records);
        Ok(outcome.report)
    }

    /// Applies one mutation and publishes the recompiled catalog
    ///
    /// # Errors
    /// Returns an error, leaving the published pair untouched, if:
    /// - The coordinator is halted
    /// - The mutation is invalid for the current catalog
    /// - The mutated catalog cannot be compiled
    /// - A store write fails (the coordinator halts)
    pub async fn mutate(&self, mutation: CatalogMutation) -> Result<CompilationReport> {
        self.ensure_running()?;
        let _guard = self.transaction_lock.lock().await;
        // May have halted while waiting for the lock
        self.ensure_running()?;

        let current = self.published.load_full();
        let description = mutation.describe();
        let mut catalog = current.catalog.clone();
        catalog.apply(mutation)?;

        let outcome = self
            .compiler
            .compile(&catalog, Some(current.compiled.as_slice()))
            .await?;

        self.persist_catalog(&catalog, &description).await?;
        self.persist_compiled(&outcome.records, &description).await?;

        tracing::info!(
            version = current.version + 1,
            change = %description,
            "catalog mutation committed"
        );
        self.publish(current.version + 1, catalog, outcome.records);
        Ok(outcome.report)
    }

    /// Recompiles the whole catalog without holding the transaction lock
    ///
    /// A run whose starting catalog was replaced in the meantime is thrown
    /// away and started over, up to the configured number of attempts.
    pub async fn recompile_full(&self) -> Result<FullRecompilation> {
        for attempt in 1..=self.max_full_attempts {
            self.ensure_running()?;
            let snapshot = self.published.load_full();

            let outcome = self.compiler.compile(&snapshot.catalog, None).await?;

            let _guard = self.transaction_lock.lock().await;
            self.ensure_running()?;
            let published_version = self.published.load().version;
            if published_version != snapshot.version {
                tracing::info!(
                    attempt,
                    started_from = snapshot.version,
                    published = published_version,
                    "catalog changed during full recompilation, retrying"
                );
                continue;
            }

            self.persist_compiled(&outcome.records, FULL_RECOMPILATION_DESCRIPTION)
                .await?;
            self.publish(snapshot.version, snapshot.catalog.clone(), outcome.records);
            tracing::info!(attempt, "full recompilation committed");
            return Ok(FullRecompilation::Committed {
                attempts: attempt,
                report: outcome.report,
            });
        }

        tracing::warn!(
            attempts = self.max_full_attempts,
            "full recompilation abandoned, catalog kept changing"
        );
        Ok(FullRecompilation::Abandoned {
            attempts: self.max_full_attempts,
        })
    }

    /// Waits for the next `trigger_full_recompilation` call
    pub async fn triggered(&self) {
        self.trigger.notified().await;
    }

    /// Receiver notified with the halt reason once the coordinator halts
    pub fn subscribe_halt(&self) -> watch::Receiver<Option<String>> {
        self.halted.subscribe()
    }

    pub fn is_halted(&self) -> bool {
        self.halted.borrow().is_some()
    }

    fn ensure_running(&self) -> Result<()> {
        if let Some(reason) = self.halted.borrow().as_ref() {
            return Err(CoordinatorError::Halted {
                reason: reason.clone(),
            }
            .into());
        }
        Ok(())
    }

    fn publish(&self, version: u64, catalog: Catalog, compiled: Vec<CompiledRecord>) {
        self.published.store(Arc::new(PublishedSnapshot {
            version,
            catalog,
            compiled,
        }));
    }

    async fn persist_catalog(&self, catalog: &Catalog, description: &str) -> Result<()> {
        self.catalog_store
            .write_catalog(catalog, description)
            .await
            .map_err(|e| self.halt("catalog", e))
    }

    async fn persist_compiled(&self, compiled: &[CompiledRecord], description: &str) -> Result<()> {
        self.compiled_store
            .write_compiled(compiled, description)
            .await
            .map_err(|e| self.halt("compiled catalog", e))
    }

    fn halt(&self, what: &'static str, error: anyhow::Error) -> anyhow::Error {
        let details = format!("{:#}", error);
        tracing::error!(what, error = %details, "persistence failed, halting coordinator");
        self.halted
            .send_replace(Some(format!("failed to persist {}: {}", what, details)));
        CoordinatorError::PersistenceFailed { what, details }.into()
    }
}

impl<C, CS, PS> CompiledCatalogPort for CompilationCoordinator<C, CS, PS>
where
    C: CatalogCompilationPort,
    CS: CatalogStore,
    PS: CompiledStore,
{
    fn snapshot(&self) -> Arc<PublishedSnapshot> {
        self.published.load_full()
    }

    fn trigger_full_recompilation(&self) {
        self.trigger.notify_one();
    }
}
