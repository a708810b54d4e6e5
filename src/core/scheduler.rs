use crate::core::engine::IngestEngine;
use crate::core::view::MapView;
use crate::core::{ActivityRecord, DisplaySurface, Pipeline, TimeFilter};
use crate::utils::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;

pub const REFRESH_INTERVAL: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewCommand {
    SetFilter(TimeFilter),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RefreshSummary {
    pub cycles_completed: usize,
    pub cycles_failed: usize,
    pub ticks_skipped: usize,
    pub filter_changes: usize,
}

type CycleHandle = JoinHandle<Result<Vec<ActivityRecord>>>;

/// Waits on the outstanding cycle. Only polled while one exists.
async fn join_cycle(
    in_flight: &mut Option<CycleHandle>,
) -> std::result::Result<Result<Vec<ActivityRecord>>, JoinError> {
    match in_flight {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

/// Single-flight refresh loop. A tick that lands while a fetch is still
/// outstanding is skipped; filter changes keep rendering against the cached
/// records in the meantime.
pub struct RefreshScheduler<P: Pipeline + 'static, D: DisplaySurface> {
    engine: Arc<IngestEngine<P>>,
    view: MapView<D>,
    interval: Duration,
}

impl<P: Pipeline + 'static, D: DisplaySurface> RefreshScheduler<P, D> {
    pub fn new(engine: IngestEngine<P>, view: MapView<D>) -> Self {
        Self {
            engine: Arc::new(engine),
            view,
            interval: REFRESH_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    fn start_cycle(&self) -> CycleHandle {
        let engine = Arc::clone(&self.engine);
        tokio::spawn(async move { engine.run().await })
    }

    /// Runs until `shutdown` fires or its sender is dropped. The first tick
    /// fires immediately, which is the initial load. Shutdown aborts whatever
    /// fetch is outstanding.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<ViewCommand>,
        mut shutdown: oneshot::Receiver<()>,
    ) -> RefreshSummary {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut summary = RefreshSummary::default();
        let mut in_flight: Option<CycleHandle> = None;
        let mut cycle: u64 = 0;
        let mut commands_open = true;

        tracing::info!("⏱️ Refreshing every {:?}", self.interval);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    if let Some(handle) = in_flight.take() {
                        handle.abort();
                        tracing::info!("🛑 Aborted outstanding refresh cycle");
                    }
                    break;
                }
                _ = ticker.tick() => {
                    if in_flight.is_some() {
                        summary.ticks_skipped += 1;
                        tracing::warn!("⏭️ Previous refresh still running, skipping this tick");
                        continue;
                    }
                    cycle += 1;
                    tracing::debug!("Starting refresh cycle {}", cycle);
                    in_flight = Some(self.start_cycle());
                }
                joined = join_cycle(&mut in_flight), if in_flight.is_some() => {
                    in_flight = None;
                    match joined {
                        Ok(Ok(records)) => {
                            summary.cycles_completed += 1;
                            if let Err(e) = self.view.load(records).await {
                                tracing::error!(
                                    "❌ Render after cycle {} failed: {} (previous output kept)",
                                    cycle,
                                    e
                                );
                            }
                        }
                        Ok(Err(e)) => {
                            summary.cycles_failed += 1;
                            tracing::error!(
                                "❌ Refresh cycle {} failed: {} (Category: {:?}, Severity: {:?}); keeping previous display",
                                cycle,
                                e,
                                e.category(),
                                e.severity()
                            );
                            if e.is_retryable() {
                                tracing::debug!("💡 {}", e.recovery_suggestion());
                            } else {
                                tracing::warn!("💡 {}", e.recovery_suggestion());
                            }
                        }
                        Err(e) => {
                            // 任務 panic 也算失敗，下一個 tick 照常重試
                            summary.cycles_failed += 1;
                            tracing::error!(
                                "❌ Refresh cycle {} did not finish: {}; keeping previous display",
                                cycle,
                                e
                            );
                        }
                    }
                }
                command = commands.recv(), if commands_open => {
                    match command {
                        Some(ViewCommand::SetFilter(filter)) => {
                            summary.filter_changes += 1;
                            if let Err(e) = self.view.set_filter(filter).await {
                                tracing::error!("❌ Render after filter change failed: {}", e);
                            }
                        }
                        None => {
                            tracing::debug!("Filter control closed");
                            commands_open = false;
                        }
                    }
                }
            }
        }

        tracing::info!(
            "Refresh loop stopped: {} completed, {} failed, {} ticks skipped",
            summary.cycles_completed,
            summary.cycles_failed,
            summary.ticks_skipped
        );
        summary
    }
}
