mod cli;
mod config;

use anyhow::bail;
use catalog_compiler::adapters::outbound::console::{
    SilentProgressReporter, StderrProgressReporter,
};
use catalog_compiler::adapters::outbound::filesystem::JsonFileStore;
use catalog_compiler::adapters::outbound::network::{
    CachingGateway, CachingLatestVersionLookup, CachingServiceProviderDirectory,
    GitHubReleaseClient, JsonHttpClient, KnowledgeBaseClient, ProjectDirectoryClient,
    ServiceProviderClient,
};
use catalog_compiler::application::coordinator::CompilationCoordinator;
use catalog_compiler::application::dto::CompilationMode;
use catalog_compiler::application::read_models::EnrichedSoftwareBuilder;
use catalog_compiler::application::scheduler;
use catalog_compiler::application::use_cases::CompileCatalogUseCase;
use catalog_compiler::ports::outbound::{CatalogStore, CompiledStore, ProgressReporter};
use catalog_compiler::shared::error::{CoordinatorError, ExitCode};
use catalog_compiler::shared::Result;
use cli::{Args, Command};
use config::Settings;
use std::path::Path;
use std::process;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::EnvFilter;

type Compiler<PR> = CompileCatalogUseCase<
    CachingGateway<KnowledgeBaseClient>,
    CachingGateway<ProjectDirectoryClient>,
    CachingLatestVersionLookup<GitHubReleaseClient>,
    CachingServiceProviderDirectory<ServiceProviderClient>,
    PR,
>;

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("catalog_compiler=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse_args();

    let exit_code = match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("\n❌ An error occurred:\n");
            eprintln!("{}", e);

            // Display error chain
            let mut source = e.source();
            while let Some(err) = source {
                eprintln!("\nCaused by: {}", err);
                source = err.source();
            }

            eprintln!();
            exit_code_for(&e)
        }
    };

    process::exit(exit_code.as_i32());
}

async fn run(args: Args) -> Result<ExitCode> {
    let settings = load_settings(&args)?;
    let store = JsonFileStore::new(
        settings.catalog_path.clone(),
        settings.compiled_path.clone(),
    );

    match args.command {
        Command::Compile {
            full,
            max_concurrent_records,
        } => {
            let mut settings = settings;
            if let Some(limit) = max_concurrent_records {
                settings.max_concurrent_records = limit as usize;
            }
            compile(&settings, store, full).await
        }
        Command::Run { interval_hours } => {
            let mut settings = settings;
            if let Some(hours) = interval_hours {
                settings.recompilation_interval = config::hours(hours);
            }
            serve(&settings, store).await
        }
        Command::Similar { name } => similar(store, &name).await,
    }
}

/// Resolves settings: explicit config file, else auto-discovered one, then CLI overrides
fn load_settings(args: &Args) -> Result<Settings> {
    let config = match &args.config {
        Some(path) => Some(config::load_config_from_path(path)?),
        None => config::discover_config(Path::new("."))?,
    };

    let mut settings = config.map(Settings::from_config).unwrap_or_default();
    if let Some(path) = &args.catalog {
        settings.catalog_path = path.clone();
    }
    if let Some(path) = &args.compiled {
        settings.compiled_path = path.clone();
    }
    Ok(settings)
}

/// Wires the source clients, each behind its cache, into the compilation use case
fn build_compiler<PR: ProgressReporter>(
    settings: &Settings,
    progress_reporter: PR,
) -> Result<Compiler<PR>> {
    let http = JsonHttpClient::new(settings.request_timeout)?;
    let github_token = settings.github_token();
    if github_token.is_none() {
        tracing::debug!(
            env = %settings.github_token_env,
            "no GitHub token, release lookups are rate limited"
        );
    }
    let github_http =
        JsonHttpClient::with_bearer_token(settings.request_timeout, github_token.as_deref())?;

    let knowledge_base = CachingGateway::new(
        KnowledgeBaseClient::new(
            http.clone(),
            &settings.knowledge_base_url,
            settings.languages.clone(),
        ),
        settings.cache_ttl,
    );
    let project_directory = CachingGateway::new(
        ProjectDirectoryClient::new(http.clone(), &settings.project_directory_url),
        settings.cache_ttl,
    );
    let latest_versions = CachingLatestVersionLookup::new(
        GitHubReleaseClient::new(github_http, &settings.github_api_url),
        settings.cache_ttl,
    );
    let service_providers = CachingServiceProviderDirectory::new(
        ServiceProviderClient::new(http, settings.service_providers_url.clone()),
        settings.cache_ttl,
    );

    Ok(CompileCatalogUseCase::new(
        knowledge_base,
        project_directory,
        latest_versions,
        service_providers,
        progress_reporter,
    )
    .with_max_concurrent_records(settings.max_concurrent_records))
}

async fn compile(settings: &Settings, store: JsonFileStore, full: bool) -> Result<ExitCode> {
    let catalog = store.read_catalog().await?;
    let previous = if full {
        None
    } else {
        store.read_compiled().await?
    };

    let compiler = build_compiler(settings, StderrProgressReporter::new())?;
    let outcome = compiler.execute(&catalog, previous.as_deref()).await?;

    let description = match outcome.report.mode {
        CompilationMode::Full => "Full recompilation",
        CompilationMode::Incremental => "Incremental compilation",
    };
    store.write_compiled(&outcome.records, description).await?;
    eprintln!(
        "💾 Compiled snapshot written: {}",
        store.compiled_path().display()
    );

    Ok(ExitCode::Success)
}

async fn serve(settings: &Settings, store: JsonFileStore) -> Result<ExitCode> {
    let compiler = build_compiler(settings, SilentProgressReporter)?;
    let coordinator = Arc::new(
        CompilationCoordinator::new(compiler, store.clone(), store)
            .with_max_full_recompilation_attempts(settings.max_full_recompilation_attempts),
    );

    let report = coordinator.bootstrap().await?;
    tracing::info!(summary = %report.summary(), "catalog published");

    let recompilation = scheduler::spawn(coordinator.clone(), settings.recompilation_interval);
    let mut halted = coordinator.subscribe_halt();

    let exit_code = tokio::select! {
        _ = shutdown_signal() => ExitCode::Success,
        reason = halted.wait_for(|reason| reason.is_some()) => {
            let reason = reason
                .ok()
                .and_then(|reason| (*reason).clone())
                .unwrap_or_default();
            eprintln!(
                "\n❌ Compilation coordinator halted: {}\n\n💡 Hint: Restart the process; persisted and in-memory state may differ",
                reason
            );
            ExitCode::Unrecoverable
        }
    };

    recompilation.abort();
    Ok(exit_code)
}

async fn similar(store: JsonFileStore, name: &str) -> Result<ExitCode> {
    let Some(compiled) = store.read_compiled().await? else {
        bail!(
            "No compiled snapshot found: {}\n\n💡 Hint: Run `catalog-compiler compile` first.",
            store.compiled_path().display()
        );
    };

    let Some(enriched) = EnrichedSoftwareBuilder::build_one(&compiled, name) else {
        bail!(
            "Unknown software '{}'\n\n💡 Hint: Names are matched exactly against the catalog.",
            name
        );
    };

    println!("{}", serde_json::to_string_pretty(&enriched.similar)?);
    Ok(ExitCode::Success)
}

/// Completes on Ctrl+C, or on SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received Ctrl+C, shutting down");
        },
        _ = terminate => {
            tracing::info!("received terminate signal, shutting down");
        },
    }
}

fn exit_code_for(error: &anyhow::Error) -> ExitCode {
    match error.downcast_ref::<CoordinatorError>() {
        Some(_) => ExitCode::Unrecoverable,
        None => ExitCode::ApplicationError,
    }
}
