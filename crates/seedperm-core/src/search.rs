//! Search coordinator

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use seedperm_wallet::{AddressDeriver, PhraseValidator};

use crate::error::SearchError;
use crate::partition::{work_source, Partition, WorkSource};
use crate::permute::{Enumeration, Permutations, SeedSet};
use crate::progress::{log_progress, ProgressReporter};
use crate::stats::{SearchPhase, SearchStats};
use crate::worker::{panic_message, Match, Worker, WorkerOutcome};

/// Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Number of worker threads
    pub workers: usize,
    /// Ranks per pull under dynamic partitioning
    pub batch_size: usize,
    pub partition: Partition,
    pub enumeration: Enumeration,
    /// Progress line period
    pub progress_interval_ms: u64,
    /// Checked-candidate budget (0 = unlimited)
    pub max_checked: u64,
    /// Wall-clock budget in seconds (0 = unlimited)
    pub max_time_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
            batch_size: 1000,
            partition: Partition::Dynamic,
            enumeration: Enumeration::Full,
            progress_interval_ms: 10_000,
            max_checked: 0,
            max_time_secs: 0,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.workers == 0 {
            return Err(SearchError::InvalidWorkers(self.workers));
        }
        if self.batch_size == 0 {
            return Err(SearchError::InvalidBatchSize(self.batch_size));
        }
        if self.progress_interval_ms == 0 {
            return Err(SearchError::InvalidProgressInterval);
        }
        Ok(())
    }
}

/// Terminal state of a search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchOutcome {
    Found(Match),
    /// Every unit was processed without a match
    Exhausted,
    /// A checked-count or wall-clock budget ran out first
    LimitReached,
}

impl SearchOutcome {
    pub fn phase(&self) -> SearchPhase {
        match self {
            SearchOutcome::Found(_) => SearchPhase::Found,
            SearchOutcome::Exhausted => SearchPhase::Exhausted,
            SearchOutcome::LimitReached => SearchPhase::LimitReached,
        }
    }
}

/// Final outcome plus run statistics
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub outcome: SearchOutcome,
    /// Candidates that passed validation and were derived
    pub checked: u64,
    pub visited: u64,
    pub space: u128,
    pub derive_failures: u64,
    pub abandoned_units: u64,
    pub workers: usize,
    pub partition: Partition,
    pub enumeration: Enumeration,
    pub time_secs: f64,
    pub checked_per_second: f64,
}

impl SearchReport {
    pub fn found(&self) -> Option<&Match> {
        match &self.outcome {
            SearchOutcome::Found(hit) => Some(hit),
            _ => None,
        }
    }
}

/// Exhaustive search over the orderings of a seed set
pub struct SeedSearch {
    perms: Arc<Permutations>,
    target: Arc<str>,
    validator: Arc<dyn PhraseValidator>,
    deriver: Arc<dyn AddressDeriver>,
    config: SearchConfig,
}

impl SeedSearch {
    /// Validate inputs and build the enumerator. Nothing runs yet.
    pub fn new(
        seed: &SeedSet,
        target: &str,
        validator: Arc<dyn PhraseValidator>,
        deriver: Arc<dyn AddressDeriver>,
        config: SearchConfig,
    ) -> Result<Self, SearchError> {
        if target.trim().is_empty() {
            return Err(SearchError::EmptyTarget);
        }
        config.validate()?;

        let perms = Permutations::new(seed, config.enumeration)?;

        Ok(Self {
            perms: Arc::new(perms),
            target: Arc::from(target),
            validator,
            deriver,
            config,
        })
    }

    /// Number of orderings that will be visited
    pub fn space(&self) -> u128 {
        self.perms.space()
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Run until a match, exhaustion, or a budget, logging progress periodically
    pub fn run(self) -> Result<SearchReport, SearchError> {
        self.run_with_callback(log_progress)
    }

    /// Run the search, calling `callback` with live stats every progress interval
    pub fn run_with_callback<F>(self, callback: F) -> Result<SearchReport, SearchError>
    where
        F: FnMut(&SearchStats) + Send + 'static,
    {
        let space = self.perms.space();
        let workers = self.config.workers;
        let stats = SearchStats::new(space);
        let source: Arc<dyn WorkSource> = Arc::from(work_source(
            self.config.partition,
            space,
            workers,
            self.config.batch_size,
        ));

        let reporter = ProgressReporter::spawn_with(
            Arc::clone(&stats),
            Duration::from_millis(self.config.progress_interval_ms),
            callback,
        )?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("seedperm-worker-{i}"))
            .build()
            .map_err(|e| SearchError::Spawn(e.to_string()))?;

        let deadline = (self.config.max_time_secs > 0)
            .then(|| Instant::now() + Duration::from_secs(self.config.max_time_secs));

        stats.begin();
        info!(
            space = %space,
            workers,
            partition = ?self.config.partition,
            enumeration = ?self.config.enumeration,
            "search started"
        );

        let (tx, rx) = unbounded::<WorkerOutcome>();
        for id in 0..workers {
            let worker = Worker {
                id,
                perms: Arc::clone(&self.perms),
                source: Arc::clone(&source),
                validator: Arc::clone(&self.validator),
                deriver: Arc::clone(&self.deriver),
                target: Arc::clone(&self.target),
                stats: Arc::clone(&stats),
                max_checked: self.config.max_checked,
            };
            let tx = tx.clone();

            pool.spawn(move || {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| worker.run()))
                    .unwrap_or_else(|payload| {
                        error!(worker = id, "worker crashed: {}", panic_message(payload.as_ref()));
                        WorkerOutcome::Crashed
                    });
                let _ = tx.send(outcome);
            });
        }
        drop(tx);

        let outcome = await_outcome(&rx, &stats, deadline);

        // Broadcast cancellation; outstanding workers drain on their own and
        // the pool threads exit once their current item is done.
        stats.stop();
        stats.finish(outcome.phase());
        reporter.stop();
        drop(pool);

        let report = SearchReport {
            outcome,
            checked: stats.total_checked(),
            visited: stats.total_visited(),
            space,
            derive_failures: stats.derive_failures(),
            abandoned_units: stats.abandoned_units(),
            workers,
            partition: self.config.partition,
            enumeration: self.config.enumeration,
            time_secs: stats.elapsed().as_secs_f64(),
            checked_per_second: stats.checked_per_second(),
        };

        match &report.outcome {
            SearchOutcome::Found(hit) => info!(rank = %hit.rank, checked = report.checked, "match found"),
            SearchOutcome::Exhausted => info!(checked = report.checked, "search space exhausted, no match"),
            SearchOutcome::LimitReached => info!(checked = report.checked, "search budget reached, no match"),
        }
        if report.abandoned_units > 0 {
            warn!(
                units = report.abandoned_units,
                "units were abandoned after worker panics; the space was not fully covered"
            );
        }

        Ok(report)
    }
}

/// Wait for the first match, or for every worker to report without one
fn await_outcome(
    rx: &Receiver<WorkerOutcome>,
    stats: &SearchStats,
    deadline: Option<Instant>,
) -> SearchOutcome {
    loop {
        let message = match deadline {
            Some(deadline) => rx.recv_deadline(deadline),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match message {
            Ok(WorkerOutcome::Found(hit)) => return SearchOutcome::Found(hit),
            Ok(WorkerOutcome::Finished { units }) => debug!(units, "worker finished"),
            Ok(WorkerOutcome::Crashed) => {}
            Err(RecvTimeoutError::Disconnected) => {
                // A budget that runs out on the final ordering still leaves
                // the space fully searched.
                return if stats.is_limit_reached() && !stats.is_covered() {
                    SearchOutcome::LimitReached
                } else {
                    SearchOutcome::Exhausted
                };
            }
            Err(RecvTimeoutError::Timeout) => {
                info!("time budget reached");
                stats.mark_limit_reached();
                return SearchOutcome::LimitReached;
            }
        }
    }
}
