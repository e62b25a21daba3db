//! Search worker: pulls units, filters, derives, compares

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use seedperm_wallet::{AddressDeriver, PhraseValidator};

use crate::partition::{SearchUnit, WorkSource};
use crate::permute::{Candidate, Permutations};
use crate::stats::SearchStats;

/// A phrase whose derived address equals the target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub phrase: String,
    pub address: String,
    /// Rank of the ordering in the enumeration
    pub rank: u128,
}

/// What a worker reports to the coordinator, exactly once
#[derive(Debug)]
pub(crate) enum WorkerOutcome {
    Found(Match),
    Finished { units: u64 },
    Crashed,
}

/// Everything a worker reads. All shared state is behind `Arc`.
pub(crate) struct Worker {
    pub id: usize,
    pub perms: Arc<Permutations>,
    pub source: Arc<dyn WorkSource>,
    pub validator: Arc<dyn PhraseValidator>,
    pub deriver: Arc<dyn AddressDeriver>,
    pub target: Arc<str>,
    pub stats: Arc<SearchStats>,
    /// Checked-count budget, 0 = unlimited
    pub max_checked: u64,
}

impl Worker {
    /// Pull and search units until the source runs dry, a match is found,
    /// or the stop flag is raised.
    pub fn run(&self) -> WorkerOutcome {
        let mut units = 0u64;

        while self.stats.is_running() {
            let Some(unit) = self.source.next_unit(self.id) else {
                break;
            };
            units += 1;

            match panic::catch_unwind(AssertUnwindSafe(|| self.search_unit(unit))) {
                Ok(Some(hit)) => return WorkerOutcome::Found(hit),
                Ok(None) => {}
                Err(payload) => {
                    self.stats.record_abandoned_unit();
                    error!(
                        worker = self.id,
                        start = %unit.start,
                        end = %unit.end,
                        "worker panicked, abandoning unit: {}",
                        panic_message(payload.as_ref())
                    );
                }
            }
        }

        WorkerOutcome::Finished { units }
    }

    fn search_unit(&self, unit: SearchUnit) -> Option<Match> {
        let mut visited = 0u64;
        let mut hit = None;

        for candidate in self.perms.range(unit.start, unit.end) {
            if !self.stats.is_running() {
                break;
            }
            visited += 1;

            if let Some(found) = self.check(candidate) {
                hit = Some(found);
                break;
            }
        }

        self.stats.add_visited(visited);
        hit
    }

    fn check(&self, candidate: Candidate) -> Option<Match> {
        if !self.validator.is_valid(&candidate.phrase) {
            return None;
        }

        let address = match self.deriver.derive_address(&candidate.phrase) {
            Ok(address) => address,
            Err(e) => {
                self.stats.record_derive_failure();
                warn!(worker = self.id, rank = %candidate.rank, "derivation failed, skipping candidate: {}", e);
                return None;
            }
        };

        let checked = self.stats.add_checked();

        if address == *self.target {
            if self.stats.mark_found() {
                info!(worker = self.id, rank = %candidate.rank, "target address matched");
            }
            return Some(Match {
                phrase: candidate.phrase,
                address,
                rank: candidate.rank,
            });
        }

        if self.max_checked > 0 && checked >= self.max_checked {
            self.stats.mark_limit_reached();
        }

        None
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::DynamicBatches;
    use crate::permute::{Enumeration, SeedSet};
    use seedperm_wallet::DeriveError;

    fn worker(
        words: &[&str],
        validator: Arc<dyn PhraseValidator>,
        deriver: Arc<dyn AddressDeriver>,
        target: &str,
        batch_size: usize,
    ) -> Worker {
        let seed = SeedSet::new(words.iter().copied()).unwrap();
        let perms = Arc::new(Permutations::new(&seed, Enumeration::Full).unwrap());
        let stats = SearchStats::new(perms.space());
        Worker {
            id: 0,
            source: Arc::new(DynamicBatches::new(perms.space(), batch_size)),
            perms,
            validator,
            deriver,
            target: Arc::from(target),
            stats,
            max_checked: 0,
        }
    }

    fn identity() -> Arc<dyn AddressDeriver> {
        Arc::new(|p: &str| -> Result<String, DeriveError> { Ok(p.to_uppercase()) })
    }

    #[test]
    fn test_invalid_candidates_are_not_counted() {
        let w = worker(&["a", "b", "c"], Arc::new(|p: &str| p == "b a c"), identity(), "NOPE", 2);
        assert!(matches!(w.run(), WorkerOutcome::Finished { units: 3 }));
        assert_eq!(w.stats.total_checked(), 1);
        assert_eq!(w.stats.total_visited(), 6);
    }

    #[test]
    fn test_match_stops_worker() {
        let w = worker(&["a", "b", "c"], Arc::new(|_: &str| true), identity(), "B A C", 6);
        match w.run() {
            WorkerOutcome::Found(hit) => {
                assert_eq!(hit.phrase, "b a c");
                assert_eq!(hit.address, "B A C");
                assert_eq!(hit.rank, 2);
            }
            other => panic!("expected a match, got {other:?}"),
        }
        assert!(w.stats.is_found());
        assert!(!w.stats.is_running());
        assert_eq!(w.stats.total_checked(), 3);
    }

    #[test]
    fn test_derive_failure_is_skipped() {
        let deriver: Arc<dyn AddressDeriver> = Arc::new(|p: &str| -> Result<String, DeriveError> {
            if p.starts_with('a') {
                Err(DeriveError::Derivation("bad seed".into()))
            } else {
                Ok(p.to_string())
            }
        });
        let w = worker(&["a", "b", "c"], Arc::new(|_: &str| true), deriver, "c b a", 1);
        assert!(matches!(w.run(), WorkerOutcome::Found(_)));
        assert_eq!(w.stats.derive_failures(), 2);
    }

    #[test]
    fn test_panicking_unit_is_abandoned() {
        let validator: Arc<dyn PhraseValidator> = Arc::new(|p: &str| {
            if p == "a c b" {
                panic!("validator blew up");
            }
            true
        });
        let w = worker(&["a", "b", "c"], validator, identity(), "C B A", 2);
        assert!(matches!(w.run(), WorkerOutcome::Found(_)));
        assert_eq!(w.stats.abandoned_units(), 1);
    }

    #[test]
    fn test_checked_budget_stops_worker() {
        let mut w = worker(&["a", "b", "c", "d"], Arc::new(|_: &str| true), identity(), "NOPE", 5);
        w.max_checked = 4;
        assert!(matches!(w.run(), WorkerOutcome::Finished { .. }));
        assert!(w.stats.is_limit_reached());
        assert_eq!(w.stats.total_checked(), 4);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }
}
