/// Integration tests for the application layer
mod test_utilities;

use std::sync::Arc;
use tempfile::TempDir;
use test_utilities::mocks::*;
use catalog_compiler::prelude::*;

type TestCompiler = CompileCatalogUseCase<
    MockKnowledgeBase,
    MockProjectDirectory,
    MockLatestVersions,
    MockServiceProviders,
    MockProgressReporter,
>;

fn external_id(id: &str) -> ExternalId {
    ExternalId::new(id.to_string()).unwrap()
}

fn software(id: u64, name: &str, kb_id: &str, similar: &[&str]) -> Software {
    let mut software = Software::new(id, name);
    software.external_id = Some(external_id(kb_id));
    software.similar_external_ids = similar.iter().map(|s| external_id(s)).collect();
    software
}

/// A and B are both similar to Q1, which has no catalog entry
fn office_catalog() -> Catalog {
    Catalog {
        software: vec![
            software(1, "A", "QA", &["Q1"]),
            software(2, "B", "QB", &["Q1"]),
            Software::new(3, "C"),
        ],
        ..Catalog::default()
    }
}

fn office_knowledge_base() -> MockKnowledgeBase {
    MockKnowledgeBase::new()
        .with_fragment(fragment("QA", "A"))
        .with_fragment(fragment("QB", "B"))
        .with_fragment(fragment("Q1", "Q1 suite"))
}

fn compiler(knowledge_base: MockKnowledgeBase) -> TestCompiler {
    CompileCatalogUseCase::new(
        knowledge_base,
        MockProjectDirectory::new(),
        MockLatestVersions::new(),
        MockServiceProviders::new(),
        MockProgressReporter::new(),
    )
}

fn names(references: &[SoftwareReference]) -> Vec<&str> {
    references.iter().map(SoftwareReference::display_name).collect()
}

#[tokio::test]
async fn test_records_similar_to_same_external_software_share_a_cluster() {
    let knowledge_base = office_knowledge_base();
    let store = InMemoryStore::with_catalog(office_catalog());
    let coordinator =
        CompilationCoordinator::new(compiler(knowledge_base), store.clone(), store.clone());

    coordinator.bootstrap().await.unwrap();

    let clusters = SimilarityClustering::partition(&coordinator.get_compiled());
    assert_eq!(clusters.len(), 2);
    assert_eq!(names(clusters[0].members()), vec!["A", "Q1 suite", "B"]);
    assert_eq!(names(clusters[1].members()), vec!["C"]);

    let enriched = coordinator.get_enriched();
    assert_eq!(enriched.len(), 3);
    assert_eq!(names(&enriched[0].similar), vec!["Q1 suite", "B"]);
    assert_eq!(names(&enriched[1].similar), vec!["A", "Q1 suite"]);
    assert!(enriched[2].similar.is_empty());
}

#[tokio::test]
async fn test_bootstrap_runs_full_compilation_and_persists_it() {
    let knowledge_base = office_knowledge_base();
    let reporter = MockProgressReporter::new();
    let use_case = CompileCatalogUseCase::new(
        knowledge_base.clone(),
        MockProjectDirectory::new(),
        MockLatestVersions::new(),
        MockServiceProviders::new().with_provider(1, "Acme Support"),
        reporter.clone(),
    );
    let store = InMemoryStore::with_catalog(office_catalog());
    let coordinator = CompilationCoordinator::new(use_case, store.clone(), store.clone());

    let report = coordinator.bootstrap().await.unwrap();

    assert_eq!(report.mode, CompilationMode::Full);
    assert_eq!(report.record_count, 3);
    // QA, QB and Q1 twice (once per record listing it)
    assert_eq!(knowledge_base.fetch_count(), 4);
    assert_eq!(report.fetched, 4);
    assert_eq!(report.failed, 0);

    let snapshot = coordinator.snapshot();
    assert_eq!(snapshot.version, 1);
    assert_eq!(snapshot.compiled[0].service_providers[0].name, "Acme Support");
    assert_eq!(store.stored_compiled(), Some(snapshot.compiled.clone()));
    assert_eq!(store.descriptions(), vec!["Startup compilation"]);
    assert!(reporter.has_message_containing("Progress: 3/3"));
}

#[tokio::test]
async fn test_mutation_reuses_unchanged_fields() {
    let knowledge_base = office_knowledge_base();
    let store = InMemoryStore::with_catalog(office_catalog());
    let coordinator =
        CompilationCoordinator::new(compiler(knowledge_base.clone()), store.clone(), store.clone());
    coordinator.bootstrap().await.unwrap();
    let before = coordinator.get_compiled();
    let fetches_after_bootstrap = knowledge_base.fetch_count();

    coordinator
        .mutate(CatalogMutation::RegisterAgent(Agent {
            id: 10,
            email: "jane@city.example".to_string(),
            organization: "City of Example".to_string(),
        }))
        .await
        .unwrap();
    let report = coordinator
        .mutate(CatalogMutation::DeclareUser(UserDeclaration {
            agent_id: 10,
            software_id: 1,
            version: None,
            service_url: None,
        }))
        .await
        .unwrap();

    assert_eq!(report.mode, CompilationMode::Incremental);
    assert_eq!(report.fetched, 0);
    assert_eq!(knowledge_base.fetch_count(), fetches_after_bootstrap);

    let after = coordinator.get_compiled();
    assert_eq!(after[0].users.len(), 1);
    assert_eq!(after[0].external_fragment, before[0].external_fragment);
    assert_eq!(after[0].similar_software, before[0].similar_software);
    assert_eq!(after[1], before[1]);
    assert_eq!(coordinator.snapshot().version, 3);
    assert_eq!(store.stored_catalog().users.len(), 1);
}

#[tokio::test]
async fn test_changed_external_id_is_fetched_again() {
    let knowledge_base = office_knowledge_base().with_fragment(fragment("QC", "C upstream"));
    let store = InMemoryStore::with_catalog(office_catalog());
    let coordinator =
        CompilationCoordinator::new(compiler(knowledge_base.clone()), store.clone(), store.clone());
    coordinator.bootstrap().await.unwrap();
    let fetches_after_bootstrap = knowledge_base.fetch_count();

    let mut updated = coordinator.snapshot().catalog.software[2].clone();
    updated.external_id = Some(external_id("QC"));
    coordinator
        .mutate(CatalogMutation::UpdateSoftware(updated))
        .await
        .unwrap();

    assert_eq!(knowledge_base.fetch_count(), fetches_after_bootstrap + 1);
    let compiled = coordinator.get_compiled();
    let fragment = compiled[2].external_fragment.as_ref().unwrap();
    assert_eq!(fragment.label, "C upstream");
}

#[tokio::test]
async fn test_full_recompilation_bypasses_previous_results() {
    let knowledge_base = office_knowledge_base();
    let store = InMemoryStore::with_catalog(office_catalog());
    let coordinator =
        CompilationCoordinator::new(compiler(knowledge_base.clone()), store.clone(), store.clone());
    coordinator.bootstrap().await.unwrap();

    // Upstream edit only a full run can observe
    knowledge_base.set_fragment(fragment("Q1", "Q1 renamed"));

    let outcome = coordinator.recompile_full().await.unwrap();

    let FullRecompilation::Committed { attempts, report } = outcome else {
        panic!("full recompilation should commit on a quiet catalog");
    };
    assert_eq!(attempts, 1);
    assert_eq!(report.mode, CompilationMode::Full);
    assert_eq!(knowledge_base.fetch_count(), 8);
    assert!(knowledge_base.invalidated().contains(&"Q1".to_string()));

    let enriched = coordinator.get_enriched();
    assert_eq!(names(&enriched[0].similar), vec!["Q1 renamed", "B"]);
    assert_eq!(coordinator.snapshot().version, 1);
    assert_eq!(
        store.descriptions().last().map(String::as_str),
        Some("Full recompilation")
    );
}

#[tokio::test]
async fn test_latest_version_strategy_follows_run_mode() {
    let mut upstream = fragment("QA", "A");
    upstream.source_url = Some("https://github.com/example/a".to_string());
    let knowledge_base = MockKnowledgeBase::new().with_fragment(upstream);
    let latest_versions = MockLatestVersions::new().with_version("https://github.com/example/a", "v2.0");

    let catalog = Catalog {
        software: vec![software(1, "A", "QA", &[])],
        ..Catalog::default()
    };
    let use_case = CompileCatalogUseCase::new(
        knowledge_base,
        MockProjectDirectory::new(),
        latest_versions.clone(),
        MockServiceProviders::new(),
        MockProgressReporter::new(),
    );
    let store = InMemoryStore::with_catalog(catalog);
    let coordinator = CompilationCoordinator::new(use_case, store.clone(), store);
    coordinator.bootstrap().await.unwrap();

    let mut with_repository = Software::new(2, "D");
    with_repository.source_url = Some("https://github.com/example/d".to_string());
    coordinator
        .mutate(CatalogMutation::CreateSoftware(with_repository))
        .await
        .unwrap();

    assert_eq!(
        latest_versions.calls(),
        vec![
            ("https://github.com/example/a".to_string(), LookupStrategy::Exhaustive),
            ("https://github.com/example/d".to_string(), LookupStrategy::Quick),
        ]
    );
    let compiled = coordinator.get_compiled();
    assert_eq!(compiled[0].latest_version.as_ref().unwrap().version, "v2.0");
    assert!(compiled[1].latest_version.is_none());
}

#[tokio::test]
async fn test_source_failures_leave_fields_empty() {
    let knowledge_base = office_knowledge_base().with_failure("Q1");
    let reporter = MockProgressReporter::new();
    let use_case = CompileCatalogUseCase::new(
        knowledge_base,
        MockProjectDirectory::new().with_entry(7, &["office"]),
        MockLatestVersions::new(),
        MockServiceProviders::with_failure(),
        reporter.clone(),
    );
    let mut catalog = office_catalog();
    catalog.software[2].service_provider_id = Some(7);
    let store = InMemoryStore::with_catalog(catalog);
    let coordinator = CompilationCoordinator::new(use_case, store.clone(), store);

    let report = coordinator.bootstrap().await.unwrap();

    assert_eq!(report.failed, 2);
    let compiled = coordinator.get_compiled();
    assert!(compiled[0].similar_software.is_empty());
    assert!(compiled[0].external_fragment.is_some());
    assert!(compiled.iter().all(|r| r.service_providers.is_empty()));
    assert_eq!(
        compiled[2].directory_entry.as_ref().map(|e| e.keywords.clone()),
        Some(vec!["office".to_string()])
    );
    assert!(reporter.has_message_containing("Service provider directory unavailable"));
}

#[tokio::test]
async fn test_persistence_failure_halts_coordinator() {
    let store = InMemoryStore::with_catalog(office_catalog());
    let coordinator = CompilationCoordinator::new(
        compiler(office_knowledge_base()),
        store.clone(),
        store.clone(),
    );
    coordinator.bootstrap().await.unwrap();
    let published = coordinator.snapshot();
    let halted = coordinator.subscribe_halt();

    store.fail_writes(true);
    let err = coordinator
        .mutate(CatalogMutation::CreateSoftware(Software::new(4, "E")))
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<CoordinatorError>(),
        Some(CoordinatorError::PersistenceFailed { .. })
    ));
    assert!(coordinator.is_halted());
    assert!(halted.borrow().is_some());
    assert_eq!(coordinator.snapshot(), published);

    // Fail closed, even once the store recovers
    store.fail_writes(false);
    let err = coordinator
        .mutate(CatalogMutation::CreateSoftware(Software::new(4, "E")))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CoordinatorError>(),
        Some(CoordinatorError::Halted { .. })
    ));
    assert_eq!(store.stored_catalog(), office_catalog());
}

#[tokio::test]
async fn test_concurrent_mutations_are_all_committed() {
    let store = InMemoryStore::with_catalog(office_catalog());
    let coordinator = Arc::new(CompilationCoordinator::new(
        compiler(office_knowledge_base()),
        store.clone(),
        store.clone(),
    ));
    coordinator.bootstrap().await.unwrap();

    let handles: Vec<_> = (10..15)
        .map(|id| {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .mutate(CatalogMutation::CreateSoftware(Software::new(
                        id,
                        format!("Software {}", id),
                    )))
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let snapshot = coordinator.snapshot();
    assert_eq!(snapshot.version, 6);
    assert_eq!(snapshot.catalog.software.len(), 8);
    assert_eq!(snapshot.compiled.len(), 8);
    assert_eq!(store.stored_catalog(), snapshot.catalog);
}

#[tokio::test]
async fn test_restart_from_json_files_is_incremental() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path().join("catalog.json"), dir.path().join("compiled.json"));
    store
        .write_catalog(&office_catalog(), "Initial import")
        .await
        .unwrap();

    let knowledge_base = office_knowledge_base();
    let first = CompilationCoordinator::new(compiler(knowledge_base.clone()), store.clone(), store.clone());
    first.bootstrap().await.unwrap();
    let compiled = first.get_compiled();
    assert_eq!(knowledge_base.fetch_count(), 4);

    let second = CompilationCoordinator::new(compiler(knowledge_base.clone()), store.clone(), store.clone());
    let report = second.bootstrap().await.unwrap();

    assert_eq!(report.mode, CompilationMode::Incremental);
    assert_eq!(report.fetched, 0);
    assert_eq!(knowledge_base.fetch_count(), 4);
    assert_eq!(second.get_compiled(), compiled);
}
