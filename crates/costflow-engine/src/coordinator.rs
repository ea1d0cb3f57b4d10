//! Run coordinator (§4.5): creates a run, partitions its date window into
//! independent daily tasks, schedules them with bounded concurrency,
//! aggregates summary statistics, and commits the run's outputs
//! atomically.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use costflow_core::{CostDate, Dimension, RunId};
use costflow_traits::{RepositoryResult, Repositories, RunStatus};

use crate::allocation::{allocate_day, DayAllocationOutput};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::runtime::RunCancellation;

/// Summary statistics aggregated across a run's daily tasks.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// The run this summary describes.
    pub run_id: Option<RunId>,
    /// Number of days whose allocation completed successfully.
    pub days_processed: usize,
    /// Total number of days in the requested window.
    pub days_total: usize,
    /// Sum of direct cost observed per dimension, across the whole run.
    pub direct_totals_by_dimension: BTreeMap<Dimension, Decimal>,
    /// Warnings collected across every day (validator warnings, mostly).
    pub warnings: Vec<String>,
    /// Wall-clock time spent running.
    pub elapsed: Duration,
}

/// Orchestrates a batch allocation run over a date window.
///
/// Mirrors the teacher's calculation-graph scheduler: a bounded worker
/// pool of self-contained, independent tasks (here: one per day) feeding
/// a single aggregation and commit step, rather than a shared mutable
/// cache threaded through the whole run.
pub struct RunCoordinator {
    repos: Repositories,
    config: EngineConfig,
}

impl RunCoordinator {
    /// Creates a coordinator over `repos`, tuned by `config`.
    #[must_use]
    pub fn new(repos: Repositories, config: EngineConfig) -> Self {
        Self { repos, config }
    }

    /// Runs the full coordinator contract (§4.5) over
    /// `[window_start, window_end]` for `dimensions`.
    ///
    /// On success, every allocation and contribution row for the run is
    /// committed atomically and the run is marked `completed`. On any
    /// day's failure (or cancellation), the run is marked `failed` and no
    /// partial outputs are committed.
    ///
    /// # Errors
    ///
    /// Returns whatever `EngineError` aborted the run — the first one
    /// observed if more than one day failed concurrently.
    pub async fn run(
        &self,
        window_start: CostDate,
        window_end: CostDate,
        dimensions: Vec<Dimension>,
        cancellation: RunCancellation,
    ) -> EngineResult<(RunId, RunSummary)> {
        let started = Instant::now();
        let run_id = self.repos.runs.create(window_start, window_end).await?;
        self.repos
            .runs
            .set_status(run_id, RunStatus::Running, None)
            .await?;

        let dates: Vec<CostDate> = window_start.window_through(window_end).collect();
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_days.max(1)));

        let mut join_set: JoinSet<EngineResult<(CostDate, DayAllocationOutput)>> = JoinSet::new();
        for date in &dates {
            if cancellation.is_cancelled() {
                break;
            }
            let date = *date;
            let repos = self.repos.clone();
            let dims = dimensions.clone();
            let config = self.config.clone();
            let cancel = cancellation.clone();
            let sem = semaphore.clone();

            join_set.spawn(async move {
                let _permit = sem
                    .acquire_owned()
                    .await
                    .map_err(|e| EngineError::Internal(e.to_string()))?;
                if cancel.is_cancelled() {
                    return Err(EngineError::Cancelled(format!("day {date} not dispatched")));
                }
                run_day_with_retry(&repos, run_id, date, &dims, &config).await
            });
        }

        let mut per_day: Vec<(CostDate, DayAllocationOutput)> = Vec::new();
        let mut first_error: Option<EngineError> = None;

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(Ok(pair)) => per_day.push(pair),
                Ok(Err(e)) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                    cancellation.cancel();
                }
                Err(join_err) => {
                    if first_error.is_none() {
                        first_error = Some(EngineError::Internal(join_err.to_string()));
                    }
                    cancellation.cancel();
                }
            }
        }

        if let Some(err) = first_error {
            let _ = self
                .repos
                .runs
                .set_status(run_id, RunStatus::Failed, Some(err.to_string()))
                .await;
            return Err(err);
        }
        if cancellation.is_cancelled() {
            let err = EngineError::Cancelled(format!("run {run_id}"));
            let _ = self
                .repos
                .runs
                .set_status(run_id, RunStatus::Failed, Some(err.to_string()))
                .await;
            return Err(err);
        }

        per_day.sort_by_key(|(date, _)| *date);

        let mut direct_totals_by_dimension: BTreeMap<Dimension, Decimal> = BTreeMap::new();
        let mut warnings = Vec::new();
        for (_, out) in &per_day {
            warnings.extend(out.warnings.iter().cloned());
            for alloc in &out.allocations {
                *direct_totals_by_dimension
                    .entry(alloc.dimension.clone())
                    .or_insert(Decimal::ZERO) += alloc.direct_amount;
            }
        }

        if let Err(e) = self.commit_run(run_id, &per_day).await {
            let _ = self
                .repos
                .runs
                .set_status(run_id, RunStatus::Failed, Some(e.to_string()))
                .await;
            return Err(e);
        }

        self.repos
            .runs
            .set_status(run_id, RunStatus::Completed, None)
            .await?;

        Ok((
            run_id,
            RunSummary {
                run_id: Some(run_id),
                days_processed: per_day.len(),
                days_total: dates.len(),
                direct_totals_by_dimension,
                warnings,
                elapsed: started.elapsed(),
            },
        ))
    }

    /// Commits every day's allocation and contribution rows within a
    /// single transactional scope, rolling back on the first failure so
    /// partial output is never visible.
    async fn commit_run(
        &self,
        run_id: RunId,
        per_day: &[(CostDate, DayAllocationOutput)],
    ) -> EngineResult<()> {
        let mut scope = self.repos.runs.begin_transaction(run_id).await?;
        let write_result = self.write_day_outputs(scope.as_mut(), run_id, per_day).await;

        match write_result {
            Ok(()) => {
                scope.commit().await?;
                Ok(())
            }
            Err(e) => {
                let _ = scope.rollback().await;
                Err(EngineError::from(e))
            }
        }
    }

    async fn write_day_outputs(
        &self,
        scope: &mut dyn costflow_traits::TransactionScope,
        run_id: RunId,
        per_day: &[(CostDate, DayAllocationOutput)],
    ) -> RepositoryResult<()> {
        for (date, out) in per_day {
            self.repos
                .runs
                .record_graph_hash(run_id, *date, out.graph_hash.clone())
                .await?;
            self.repos
                .runs
                .write_allocations(scope, run_id, &out.allocations)
                .await?;
            self.repos
                .runs
                .write_contributions(scope, run_id, &out.contributions)
                .await?;
        }
        Ok(())
    }
}

/// Runs one day's allocation, retrying transient repository failures with
/// the configured backoff policy. Non-transient errors (graph validation,
/// invariant violations, unknown strategies) are never retried — they
/// abort the day on the first attempt, per §4.4's failure semantics.
async fn run_day_with_retry(
    repos: &Repositories,
    run_id: RunId,
    date: CostDate,
    dimensions: &[Dimension],
    config: &EngineConfig,
) -> EngineResult<(CostDate, DayAllocationOutput)> {
    let mut attempt: u32 = 0;
    loop {
        match allocate_day(repos, run_id, date, dimensions, config).await {
            Ok(out) => return Ok((date, out)),
            Err(e) if e.is_retryable() && attempt + 1 < config.retry.max_attempts => {
                let delay = config.retry.delay_for_attempt(attempt);
                tracing::warn!(%date, attempt, error = %e, delay_ms = delay.as_millis() as u64, "retrying transient failure");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) if e.is_retryable() => {
                return Err(EngineError::RetriesExhausted(format!("{date}: {e}")));
            }
            Err(e) => return Err(e),
        }
    }
}
