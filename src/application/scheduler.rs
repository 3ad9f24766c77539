//! Periodic and on-demand full recompilation

use crate::application::coordinator::{CompilationCoordinator, FullRecompilation};
use crate::ports::inbound::CatalogCompilationPort;
use crate::ports::outbound::{CatalogStore, CompiledStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Spawns the recompilation loop on the current runtime
///
/// A full recompilation runs once at startup, then every `interval` and on
/// every manual trigger. The loop stops once the coordinator halts.
pub fn spawn<C, CS, PS>(
    coordinator: Arc<CompilationCoordinator<C, CS, PS>>,
    interval: Duration,
) -> JoinHandle<()>
where
    C: CatalogCompilationPort + 'static,
    CS: CatalogStore + 'static,
    PS: CompiledStore + 'static,
{
    tokio::spawn(run_recompilation_loop(coordinator, interval))
}

async fn run_recompilation_loop<C, CS, PS>(
    coordinator: Arc<CompilationCoordinator<C, CS, PS>>,
    interval: Duration,
) where
    C: CatalogCompilationPort,
    CS: CatalogStore,
    PS: CompiledStore,
{
    let mut halted = coordinator.subscribe_halt();
    let mut timer = tokio::time::interval(interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // The first tick completes immediately, which gives the startup run
    loop {
        tokio::select! {
            _ = timer.tick() => {
                tracing::debug!("scheduled full recompilation");
            }
            _ = coordinator.triggered() => {
                tracing::info!("full recompilation requested");
            }
            _ = halted.changed() => {}
        }

        if coordinator.is_halted() {
            tracing::warn!("coordinator halted, stopping recompilation loop");
            break;
        }

        run_full_recompilation_guarded(&coordinator).await;
    }
}

async fn run_full_recompilation_guarded<C, CS, PS>(
    coordinator: &Arc<CompilationCoordinator<C, CS, PS>>,
) where
    C: CatalogCompilationPort,
    CS: CatalogStore,
    PS: CompiledStore,
{
    match coordinator.recompile_full().await {
        Ok(FullRecompilation::Committed { attempts, report }) => {
            tracing::info!(attempts, summary = %report.summary(), "full recompilation completed");
        }
        Ok(FullRecompilation::Abandoned { attempts }) => {
            tracing::warn!(attempts, "full recompilation gave up, will retry at next tick");
        }
        Err(e) => {
            let details = format!("{:#}", e);
            tracing::error!(error = %details, "full recompilation failed");
        }
    }
}
