use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;

use super::config::RunConfig;
use super::error::{Error, Result};
use super::executor::{ExecutionResult, Executor};
use super::lifecycle::{Lifecycle, StopCause};
use super::progress::ProgressFn;
use super::reporter::Reporter;
use super::scheduler::RateScheduler;
use super::stats::{Snapshot, StatsAggregator};
use super::tracker::ConcurrencyTracker;
use super::workload::{WorkItem, WorkloadSource};

/// Final state of a terminated run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub snapshot: Snapshot,
    pub cause: StopCause,
    /// Identifiers created by successful operations, in completion order.
    pub produced: Vec<String>,
    /// Number of intermediate snapshots handed to the progress callback.
    pub reports_emitted: u64,
}

/// Runs `source` through `executor` at the configured pace until the source is exhausted,
/// `interrupt` resolves, or `cfg.max_duration` elapses, then waits for in-flight operations.
///
/// All run state is owned by this future; executor calls run as spawned tasks and report
/// back over a channel, so completions are applied one at a time.
pub async fn run<S, E, F>(
    cfg: RunConfig,
    source: S,
    executor: Arc<E>,
    progress: Option<ProgressFn>,
    interrupt: F,
) -> Result<RunSummary>
where
    S: WorkloadSource,
    E: Executor,
    F: Future<Output = ()>,
{
    cfg.validate()?;
    Controller::new(cfg, source, executor, progress)
        .run(interrupt)
        .await
}

struct Controller<S, E> {
    cfg: RunConfig,
    started: Instant,
    scheduler: RateScheduler<S>,
    reporter: Reporter,
    tracker: ConcurrencyTracker,
    stats: StatsAggregator,
    lifecycle: Lifecycle,
    produced: Vec<String>,
    executor: Arc<E>,
    tx: mpsc::UnboundedSender<ExecutionResult>,
    rx: mpsc::UnboundedReceiver<ExecutionResult>,
}

impl<S, E> Controller<S, E>
where
    S: WorkloadSource,
    E: Executor,
{
    fn new(cfg: RunConfig, source: S, executor: Arc<E>, progress: Option<ProgressFn>) -> Self {
        let started = Instant::now();
        let (tx, rx) = mpsc::unbounded_channel();

        Self {
            scheduler: RateScheduler::new(source, cfg.rate_per_tick, cfg.tick_interval, started),
            reporter: Reporter::new(cfg.report_interval, started, progress),
            tracker: ConcurrencyTracker::default(),
            stats: StatsAggregator::new(started),
            lifecycle: Lifecycle::new(),
            produced: Vec::new(),
            cfg,
            started,
            executor,
            tx,
            rx,
        }
    }

    async fn run<F>(mut self, interrupt: F) -> Result<RunSummary>
    where
        F: Future<Output = ()>,
    {
        tracing::info!(
            rate_per_tick = self.cfg.rate_per_tick,
            tick_ms = self.cfg.tick_interval.as_millis() as u64,
            target_rate_per_sec = self.cfg.target_rate_per_sec(),
            "run started"
        );

        let deadline = self.cfg.max_duration.map(|d| self.started + d);
        let deadline = async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(interrupt);
        tokio::pin!(deadline);

        loop {
            let running = self.lifecycle.is_running();

            tokio::select! {
                biased;

                _ = &mut interrupt, if running => {
                    self.stop_dispatch(StopCause::Interrupted);
                }
                completion = self.rx.recv() => {
                    let Some(result) = completion else {
                        return Err(Error::ChannelClosed { active: self.tracker.active() });
                    };
                    self.on_completion(result)?;
                }
                _ = &mut deadline, if running => {
                    self.stop_dispatch(StopCause::DeadlineReached);
                }
                _ = self.reporter.tick(), if running => {
                    self.reporter.emit(&self.stats, self.tracker.active());
                }
                _ = self.scheduler.tick(), if running => {
                    self.on_tick()?;
                }
            }

            if self.lifecycle.try_terminate(&self.tracker) {
                break;
            }
        }

        Ok(self.finish())
    }

    fn on_tick(&mut self) -> Result<()> {
        for item in self.scheduler.draw_batch()? {
            self.dispatch(item);
        }
        if self.scheduler.is_exhausted() {
            self.stop_dispatch(StopCause::Exhausted);
        }
        Ok(())
    }

    fn dispatch(&mut self, item: WorkItem) {
        self.tracker.dispatched();
        self.stats.record_dispatch();

        let executor = Arc::clone(&self.executor);
        let timeout = self.cfg.op_timeout;
        let guard = CompletionGuard::new(self.tx.clone());

        tokio::spawn(async move {
            let started = Instant::now();
            let result = match tokio::time::timeout(timeout, executor.execute(item, timeout)).await
            {
                Ok(result) => result,
                Err(_) => ExecutionResult::failed(started.elapsed()),
            };
            guard.complete(result);
        });
    }

    fn on_completion(&mut self, result: ExecutionResult) -> Result<()> {
        self.tracker.completed()?;
        self.stats.record(&result);

        if !result.success {
            tracing::debug!(latency_ms = result.latency.as_millis() as u64, "operation failed");
        } else if let Some(id) = result.produced {
            self.produced.push(id);
        }
        Ok(())
    }

    fn stop_dispatch(&mut self, cause: StopCause) {
        if self.lifecycle.begin_drain(cause, &mut self.tracker) {
            tracing::info!(
                %cause,
                in_flight = self.tracker.active(),
                requests_sent = self.stats.requests_sent(),
                "dispatch stopped, draining"
            );
        }
    }

    fn finish(self) -> RunSummary {
        let cause = self.lifecycle.cause().unwrap_or(StopCause::Exhausted);
        let snapshot = self
            .stats
            .snapshot(Instant::now(), self.tracker.active(), self.reporter.emitted());

        tracing::info!(
            %cause,
            requests_sent = snapshot.requests_sent,
            completed = snapshot.completed,
            failed = snapshot.failed,
            "run terminated"
        );

        RunSummary {
            snapshot,
            cause,
            produced: self.produced,
            reports_emitted: self.reporter.emitted(),
        }
    }
}

/// Delivers exactly one result per dispatched operation.
///
/// If the task is dropped before completing (panic in the executor, runtime shutdown),
/// a failed result is sent instead so the in-flight count still reaches zero.
struct CompletionGuard {
    tx: Option<mpsc::UnboundedSender<ExecutionResult>>,
    started: Instant,
}

impl CompletionGuard {
    fn new(tx: mpsc::UnboundedSender<ExecutionResult>) -> Self {
        Self {
            tx: Some(tx),
            started: Instant::now(),
        }
    }

    fn complete(mut self, result: ExecutionResult) {
        if let Some(tx) = self.tx.take() {
            // The controller may already have returned with an error.
            let _ = tx.send(result);
        }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(ExecutionResult::failed(self.started.elapsed()));
        }
    }
}
