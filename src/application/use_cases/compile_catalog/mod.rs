use crate::application::dto::{CompilationMode, CompilationOutcome, CompilationReport};
use crate::compilation::domain::{
    Catalog, CompiledInstance, CompiledRecord, DirectoryEntry, ExternalFragment, ExternalId,
    Instance, LatestVersion, Software, SoftwareId, SoftwareSummary,
};
use crate::compilation::policies::ReusePolicy;
use crate::compilation::services::{DeclarationResolver, ResolvedDeclarations};
use crate::ports::inbound::CatalogCompilationPort;
use crate::ports::outbound::{
    LatestVersionLookup, LookupStrategy, ProgressReporter, ServiceProviderDirectory,
    ServiceProvidersBySoftware, SourceGateway,
};
use crate::shared::Result;
use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use std::collections::{BTreeSet, HashMap};
use std::fmt::Display;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

/// Default number of records compiled concurrently
pub const DEFAULT_MAX_CONCURRENT_RECORDS: usize = 10;

/// Lookup counters shared by every record of a run
#[derive(Default)]
struct RunStats {
    fetched: AtomicUsize,
    reused: AtomicUsize,
    failed: AtomicUsize,
}

impl RunStats {
    fn record_fetch(&self) {
        self.fetched.fetch_add(1, Ordering::Relaxed);
    }

    fn record_reuse(&self) {
        self.reused.fetch_add(1, Ordering::Relaxed);
    }

    /// Turns a lookup outcome into the field value; failures resolve to absent
    fn settle<T>(
        &self,
        outcome: Result<Option<T>>,
        source: &'static str,
        key: &dyn Display,
    ) -> Option<T> {
        match outcome {
            Ok(value) => value,
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(source, key = %key, error = %e, "lookup failed, field left empty");
                None
            }
        }
    }
}

/// Everything a record needs from the run besides its own catalog entry
struct RunContext<'a> {
    mode: CompilationMode,
    previous: HashMap<SoftwareId, &'a CompiledRecord>,
    declarations: HashMap<SoftwareId, ResolvedDeclarations>,
    instances: HashMap<SoftwareId, Vec<&'a Instance>>,
    service_providers: ServiceProvidersBySoftware,
    stats: RunStats,
}

impl RunContext<'_> {
    fn strategy(&self) -> LookupStrategy {
        match self.mode {
            CompilationMode::Full => LookupStrategy::Exhaustive,
            CompilationMode::Incremental => LookupStrategy::Quick,
        }
    }
}

/// CompileCatalogUseCase - Core use case producing the compiled catalog view
///
/// Every catalog record is merged with the data resolved for it from the
/// external sources. Records are compiled concurrently through a bounded
/// ordered stream, and the field groups of one record are resolved
/// concurrently as well.
///
/// # Type Parameters
/// * `KB` - Knowledge-base gateway (fragments, parent and similar summaries)
/// * `PD` - Open-source project directory gateway (logo and keywords)
/// * `LV` - LatestVersionLookup implementation
/// * `SP` - ServiceProviderDirectory implementation
/// * `PR` - ProgressReporter implementation
pub struct CompileCatalogUseCase<KB, PD, LV, SP, PR> {
    knowledge_base: KB,
    project_directory: PD,
    latest_versions: LV,
    service_providers: SP,
    progress_reporter: PR,
    max_concurrent_records: usize,
}

impl<KB, PD, LV, SP, PR> CompileCatalogUseCase<KB, PD, LV, SP, PR>
where
    KB: SourceGateway<Key = ExternalId, Data = ExternalFragment>,
    PD: SourceGateway<Key = u64, Data = DirectoryEntry>,
    LV: LatestVersionLookup,
    SP: ServiceProviderDirectory,
    PR: ProgressReporter,
{
    /// Creates a new CompileCatalogUseCase with injected dependencies
    pub fn new(
        knowledge_base: KB,
        project_directory: PD,
        latest_versions: LV,
        service_providers: SP,
        progress_reporter: PR,
    ) -> Self {
        Self {
            knowledge_base,
            project_directory,
            latest_versions,
            service_providers,
            progress_reporter,
            max_concurrent_records: DEFAULT_MAX_CONCURRENT_RECORDS,
        }
    }

    /// Sets how many records may be in flight at once (at least one)
    pub fn with_max_concurrent_records(mut self, max_concurrent_records: usize) -> Self {
        self.max_concurrent_records = max_concurrent_records.max(1);
        self
    }

    /// Executes the compilation
    ///
    /// # Arguments
    /// * `catalog` - Catalog snapshot to compile
    /// * `previous` - Previous compilation; `None` requests a full run
    ///
    /// # Returns
    /// The compiled records in catalog order, with the run statistics
    ///
    /// # Errors
    /// Returns an error if a declaration references an agent missing from the
    /// catalog. The check happens before any lookup is issued.
    pub async fn execute(
        &self,
        catalog: &Catalog,
        previous: Option<&[CompiledRecord]>,
    ) -> Result<CompilationOutcome> {
        let started_at = Utc::now();
        let run_id = Uuid::new_v4();

        // Step 1: Join declarations with agents; a dangling reference aborts the run
        let declarations = DeclarationResolver::resolve(catalog)?;

        let mode = match previous {
            Some(_) => CompilationMode::Incremental,
            None => CompilationMode::Full,
        };
        tracing::info!(%run_id, %mode, records = catalog.software.len(), "compilation started");
        self.progress_reporter.report(&format!(
            "📦 Compiling {} software record(s) ({} run)",
            catalog.software.len(),
            mode
        ));

        // Step 2: Full runs never trust a cached value
        if mode == CompilationMode::Full {
            self.invalidate_dependencies(catalog).await;
        }

        // Step 3: Service providers come as a single directory for the whole catalog
        let service_providers = self.fetch_service_providers().await;

        let context = RunContext {
            mode,
            previous: previous
                .unwrap_or_default()
                .iter()
                .map(|record| (record.id(), record))
                .collect(),
            declarations,
            instances: Self::group_instances(catalog),
            service_providers,
            stats: RunStats::default(),
        };

        // Step 4: Compile records concurrently, keeping catalog order
        let total = catalog.software.len();
        let completed = AtomicUsize::new(0);
        let pending: Vec<_> = catalog
            .software
            .iter()
            .map(|software| self.compile_record(software, &context).boxed())
            .collect();
        let records: Vec<CompiledRecord> = stream::iter(pending)
            .buffered(self.max_concurrent_records)
            .inspect(|record| {
                let current = completed.fetch_add(1, Ordering::Relaxed) + 1;
                self.progress_reporter
                    .report_progress(current, total, Some(record.name()));
            })
            .collect()
            .await;

        let report = CompilationReport {
            run_id,
            mode,
            started_at,
            finished_at: Utc::now(),
            record_count: records.len(),
            fetched: context.stats.fetched.load(Ordering::Relaxed),
            reused: context.stats.reused.load(Ordering::Relaxed),
            failed: context.stats.failed.load(Ordering::Relaxed),
        };

        tracing::info!(
            %run_id,
            fetched = report.fetched,
            reused = report.reused,
            failed = report.failed,
            "compilation finished"
        );
        if report.failed > 0 {
            self.progress_reporter.report_error(&format!(
                "⚠️  Warning: {} lookup(s) failed; the affected fields were left empty.",
                report.failed
            ));
        }
        self.progress_reporter
            .report_completion(&format!("✅ {}", report.summary()));

        Ok(CompilationOutcome::new(records, report))
    }

    /// Drops every cached source entry the catalog depends on
    ///
    /// Latest-version lookups are keyed by a repository URL that is only
    /// known once the fragment is fetched; they are invalidated right
    /// before their exhaustive lookup instead.
    async fn invalidate_dependencies(&self, catalog: &Catalog) {
        let mut external_ids: BTreeSet<&ExternalId> = BTreeSet::new();
        let mut directory_ids: BTreeSet<u64> = BTreeSet::new();

        for software in &catalog.software {
            external_ids.extend(software.external_id.as_ref());
            external_ids.extend(software.parent_external_id.as_ref());
            external_ids.extend(software.similar_external_ids.iter());
            directory_ids.extend(software.service_provider_id);
        }
        for instance in &catalog.instances {
            external_ids.extend(instance.other_software_external_ids.iter());
        }

        tracing::debug!(
            external_ids = external_ids.len(),
            directory_ids = directory_ids.len(),
            "invalidating source caches"
        );

        join_all(
            external_ids
                .into_iter()
                .map(|id| self.knowledge_base.invalidate(id)),
        )
        .await;
        join_all(
            directory_ids
                .iter()
                .map(|id| self.project_directory.invalidate(id)),
        )
        .await;
        self.service_providers.invalidate().await;
    }

    async fn fetch_service_providers(&self) -> ServiceProvidersBySoftware {
        match self.service_providers.fetch_all().await {
            Ok(providers) => providers,
            Err(e) => {
                tracing::warn!(error = %e, "service provider directory unavailable");
                self.progress_reporter.report_error(&format!(
                    "⚠️  Warning: Service provider directory unavailable: {}",
                    e
                ));
                ServiceProvidersBySoftware::new()
            }
        }
    }

    fn group_instances(catalog: &Catalog) -> HashMap<SoftwareId, Vec<&Instance>> {
        let mut grouped: HashMap<SoftwareId, Vec<&Instance>> = HashMap::new();
        for instance in &catalog.instances {
            grouped
                .entry(instance.main_software_id)
                .or_default()
                .push(instance);
        }
        grouped
    }

    /// Resolves every field group of one record concurrently and merges the result
    async fn compile_record(&self, software: &Software, context: &RunContext<'_>) -> CompiledRecord {
        let previous = context.previous.get(&software.id).copied();

        // The repository URL depends on the fragment, so these two are chained
        let fragment_and_version = async {
            let fragment = self.resolve_fragment(software, previous, context).await;
            let repository_url =
                ReusePolicy::repository_url(fragment.as_ref(), software.source_url.as_deref())
                    .map(str::to_string);
            let latest_version = match repository_url.as_deref() {
                Some(url) => self.resolve_latest_version(url, previous, context).await,
                None => None,
            };
            (fragment, repository_url, latest_version)
        };

        let (
            (external_fragment, repository_url, latest_version),
            directory_entry,
            parent_software,
            similar_software,
            instances,
        ) = futures::join!(
            fragment_and_version,
            self.resolve_directory_entry(software, previous, context),
            self.resolve_parent(software, previous, context),
            self.resolve_summaries(
                &software.similar_external_ids,
                ReusePolicy::previous_similar(previous),
                context
            ),
            self.resolve_instances(software.id, previous, context),
        );

        let declarations = context
            .declarations
            .get(&software.id)
            .cloned()
            .unwrap_or_default();

        CompiledRecord {
            software: software.clone(),
            external_fragment,
            directory_entry,
            repository_url,
            latest_version,
            service_providers: context
                .service_providers
                .get(&software.id)
                .cloned()
                .unwrap_or_default(),
            parent_software,
            similar_software,
            instances,
            organization_counts: declarations.organization_counts(),
            has_expert_referent: declarations.has_expert_referent(),
            referents: declarations.referents,
            users: declarations.users,
        }
    }

    async fn resolve_fragment(
        &self,
        software: &Software,
        previous: Option<&CompiledRecord>,
        context: &RunContext<'_>,
    ) -> Option<ExternalFragment> {
        let external_id = software.external_id.as_ref()?;
        if let Some(fragment) = ReusePolicy::reusable_fragment(previous, Some(external_id)) {
            context.stats.record_reuse();
            return Some(fragment.clone());
        }
        self.fetch_fragment(external_id, context).await
    }

    async fn resolve_parent(
        &self,
        software: &Software,
        previous: Option<&CompiledRecord>,
        context: &RunContext<'_>,
    ) -> Option<SoftwareSummary> {
        let parent_id = software.parent_external_id.as_ref()?;
        if let Some(parent) = ReusePolicy::reusable_parent(previous, Some(parent_id)) {
            context.stats.record_reuse();
            return Some(parent.clone());
        }
        self.fetch_fragment(parent_id, context)
            .await
            .map(|fragment| fragment.summary())
    }

    /// Resolves a list of external ids independently; unknown or failed ids are dropped
    async fn resolve_summaries(
        &self,
        external_ids: &[ExternalId],
        previous: &[SoftwareSummary],
        context: &RunContext<'_>,
    ) -> Vec<SoftwareSummary> {
        let resolved = join_all(external_ids.iter().map(|external_id| async move {
            if let Some(summary) = ReusePolicy::reusable_summary(previous, external_id) {
                context.stats.record_reuse();
                return Some(summary.clone());
            }
            self.fetch_fragment(external_id, context)
                .await
                .map(|fragment| fragment.summary())
        }))
        .await;

        resolved.into_iter().flatten().collect()
    }

    async fn resolve_instances(
        &self,
        software_id: SoftwareId,
        previous: Option<&CompiledRecord>,
        context: &RunContext<'_>,
    ) -> Vec<CompiledInstance> {
        let Some(instances) = context.instances.get(&software_id) else {
            return Vec::new();
        };

        join_all(instances.iter().map(|instance| async move {
            let other_software = self
                .resolve_summaries(
                    &instance.other_software_external_ids,
                    ReusePolicy::previous_instance_software(previous, instance.id),
                    context,
                )
                .await;
            CompiledInstance {
                id: instance.id,
                organization: instance.organization.clone(),
                target_audience: instance.target_audience.clone(),
                public_url: instance.public_url.clone(),
                other_software,
            }
        }))
        .await
    }

    async fn resolve_latest_version(
        &self,
        repository_url: &str,
        previous: Option<&CompiledRecord>,
        context: &RunContext<'_>,
    ) -> Option<LatestVersion> {
        if let Some(reused) = ReusePolicy::reusable_latest_version(previous, repository_url) {
            context.stats.record_reuse();
            return reused.cloned();
        }

        let strategy = context.strategy();
        if strategy == LookupStrategy::Exhaustive {
            self.latest_versions.invalidate(repository_url).await;
        }
        context.stats.record_fetch();
        let outcome = self
            .latest_versions
            .fetch_latest(repository_url, strategy)
            .await;
        context
            .stats
            .settle(outcome, "latest version", &repository_url)
    }

    async fn resolve_directory_entry(
        &self,
        software: &Software,
        previous: Option<&CompiledRecord>,
        context: &RunContext<'_>,
    ) -> Option<DirectoryEntry> {
        let directory_id = software.service_provider_id?;
        if let Some(entry) = ReusePolicy::reusable_directory_entry(previous, Some(directory_id)) {
            context.stats.record_reuse();
            return Some(entry.clone());
        }
        context.stats.record_fetch();
        let outcome = self.project_directory.fetch(&directory_id).await;
        context
            .stats
            .settle(outcome, "project directory", &directory_id)
    }

    async fn fetch_fragment(
        &self,
        external_id: &ExternalId,
        context: &RunContext<'_>,
    ) -> Option<ExternalFragment> {
        context.stats.record_fetch();
        let outcome = self.knowledge_base.fetch(external_id).await;
        context.stats.settle(outcome, "knowledge base", external_id)
    }
}

#[async_trait]
impl<KB, PD, LV, SP, PR> CatalogCompilationPort for CompileCatalogUseCase<KB, PD, LV, SP, PR>
where
    KB: SourceGateway<Key = ExternalId, Data = ExternalFragment>,
    PD: SourceGateway<Key = u64, Data = DirectoryEntry>,
    LV: LatestVersionLookup,
    SP: ServiceProviderDirectory,
    PR: ProgressReporter,
{
    async fn compile(
        &self,
        catalog: &Catalog,
        previous: Option<&[CompiledRecord]>,
    ) -> Result<CompilationOutcome> {
        self.execute(catalog, previous).await
    }
}
