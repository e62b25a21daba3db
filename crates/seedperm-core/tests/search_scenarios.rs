//! End-to-end searches with in-memory validators and derivers

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use seedperm_core::{
    AddressDeriver, DeriveError, Enumeration, Partition, PhraseValidator, SearchConfig, SearchError, SearchOutcome,
    SeedSearch, SeedSet,
};

fn accept_all() -> Arc<dyn PhraseValidator> {
    Arc::new(|_: &str| true)
}

/// "b a c" derives ADDR1, everything else ADDR_OTHER
fn lookup() -> Arc<dyn AddressDeriver> {
    Arc::new(|p: &str| -> Result<String, DeriveError> {
        Ok(if p == "b a c" { "ADDR1" } else { "ADDR_OTHER" }.to_string())
    })
}

fn config(workers: usize, partition: Partition, batch_size: usize) -> SearchConfig {
    SearchConfig {
        workers,
        partition,
        batch_size,
        progress_interval_ms: 50,
        ..Default::default()
    }
}

fn abc() -> SeedSet {
    SeedSet::new(["a", "b", "c"]).unwrap()
}

#[test]
fn finds_target_under_every_partition_and_worker_count() {
    for partition in [Partition::Static, Partition::Dynamic] {
        for workers in [1, 2, 6] {
            let search = SeedSearch::new(&abc(), "ADDR1", accept_all(), lookup(), config(workers, partition, 1)).unwrap();
            let report = search.run().unwrap();

            let hit = report.found().unwrap_or_else(|| panic!("{partition:?}/{workers}: no match"));
            assert_eq!(hit.phrase, "b a c");
            assert_eq!(hit.address, "ADDR1");
            assert_eq!(hit.rank, 2);
        }
    }
}

#[test]
fn exhausts_when_only_valid_phrase_misses() {
    let validator: Arc<dyn PhraseValidator> = Arc::new(|p: &str| p == "b a c");
    let deriver: Arc<dyn AddressDeriver> =
        Arc::new(|_: &str| -> Result<String, DeriveError> { Ok("ADDR_NONE".to_string()) });

    let report = SeedSearch::new(&abc(), "ADDR1", validator, deriver, config(2, Partition::Static, 1))
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.outcome, SearchOutcome::Exhausted);
    assert_eq!(report.checked, 1);
    assert_eq!(report.visited, 6);
    assert_eq!(report.space, 6);
}

#[test]
fn outcome_is_independent_of_batch_size() {
    let seed = SeedSet::new(["w", "x", "y", "z"]).unwrap();
    let deriver: Arc<dyn AddressDeriver> =
        Arc::new(|p: &str| -> Result<String, DeriveError> { Ok(p.replace(' ', "-")) });

    for batch_size in [1, 2, 5, 24, 1000] {
        let report = SeedSearch::new(
            &seed,
            "z-x-w-y",
            accept_all(),
            Arc::clone(&deriver),
            config(3, Partition::Dynamic, batch_size),
        )
        .unwrap()
        .run()
        .unwrap();

        assert_eq!(report.found().map(|m| m.phrase.as_str()), Some("z x w y"), "batch {batch_size}");
    }
}

#[test]
fn distinct_mode_skips_repeated_orderings() {
    let seed = SeedSet::new(["x", "x", "y"]).unwrap();
    let seen = Arc::new(AtomicUsize::new(0));
    let deriver: Arc<dyn AddressDeriver> = {
        let seen = Arc::clone(&seen);
        Arc::new(move |p: &str| -> Result<String, DeriveError> {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(p.to_string())
        })
    };

    let search = SeedSearch::new(
        &seed,
        "nothing",
        accept_all(),
        deriver,
        SearchConfig { enumeration: Enumeration::Distinct, ..config(2, Partition::Dynamic, 1) },
    )
    .unwrap();
    assert_eq!(search.space(), 3);

    let report = search.run().unwrap();
    assert_eq!(report.outcome, SearchOutcome::Exhausted);
    assert_eq!(seen.load(Ordering::SeqCst), 3);

    let full = SeedSearch::new(&seed, "y x x", accept_all(), lookup(), config(1, Partition::Dynamic, 10)).unwrap();
    assert_eq!(full.space(), 6);
}

#[test]
fn workers_stop_after_first_match() {
    let words: Vec<String> = (0..7).map(|i| format!("w{i}")).collect();
    let seed = SeedSet::new(words).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let deriver: Arc<dyn AddressDeriver> = {
        let calls = Arc::clone(&calls);
        Arc::new(move |p: &str| -> Result<String, DeriveError> {
            calls.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(1));
            Ok(p.to_string())
        })
    };

    let report = SeedSearch::new(
        &seed,
        "w0 w1 w2 w3 w5 w6 w4",
        accept_all(),
        deriver,
        config(4, Partition::Dynamic, 1),
    )
    .unwrap()
    .run()
    .unwrap();
    assert!(report.found().is_some());

    thread::sleep(Duration::from_millis(100));
    let settled = calls.load(Ordering::SeqCst);
    thread::sleep(Duration::from_millis(200));

    assert_eq!(calls.load(Ordering::SeqCst), settled);
    assert!(settled < 5040);
}

#[test]
fn competing_matches_report_exactly_one() {
    let seed = SeedSet::new(["p", "q"]).unwrap();
    let deriver: Arc<dyn AddressDeriver> =
        Arc::new(|_: &str| -> Result<String, DeriveError> { Ok("SAME".to_string()) });

    let report = SeedSearch::new(&seed, "SAME", accept_all(), deriver, config(2, Partition::Static, 1))
        .unwrap()
        .run()
        .unwrap();

    let hit = report.found().unwrap();
    assert!(hit.phrase == "p q" || hit.phrase == "q p");
}

#[test]
fn panicking_validator_abandons_only_its_unit() {
    let validator: Arc<dyn PhraseValidator> = Arc::new(|p: &str| {
        if p == "a c b" {
            panic!("corrupt wordlist entry");
        }
        true
    });

    let found = SeedSearch::new(&abc(), "ADDR1", Arc::clone(&validator), lookup(), config(2, Partition::Dynamic, 1))
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(found.found().map(|m| m.rank), Some(2));

    let missed = SeedSearch::new(&abc(), "ADDR9", validator, lookup(), config(2, Partition::Dynamic, 1))
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(missed.outcome, SearchOutcome::Exhausted);
    assert_eq!(missed.abandoned_units, 1);
    assert_eq!(missed.checked, 5);
}

#[test]
fn derive_failures_are_counted_not_fatal() {
    let deriver: Arc<dyn AddressDeriver> = Arc::new(|p: &str| -> Result<String, DeriveError> {
        if p.ends_with('a') {
            Err(DeriveError::InvalidKey("out of range".into()))
        } else {
            Ok(p.to_string())
        }
    });

    let report = SeedSearch::new(&abc(), "ADDR1", accept_all(), deriver, config(1, Partition::Static, 1))
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.outcome, SearchOutcome::Exhausted);
    assert_eq!(report.derive_failures, 2);
    assert_eq!(report.checked, 4);
}

#[test]
fn checked_budget_ends_with_limit_reached() {
    let seed = SeedSet::new(["a", "b", "c", "d", "e"]).unwrap();
    let report = SeedSearch::new(
        &seed,
        "missing",
        accept_all(),
        lookup(),
        SearchConfig { max_checked: 10, ..config(2, Partition::Dynamic, 3) },
    )
    .unwrap()
    .run()
    .unwrap();

    assert_eq!(report.outcome, SearchOutcome::LimitReached);
    assert!(report.checked >= 10);
    assert!(report.checked < 120);
}

#[test]
fn budget_spent_on_final_ordering_still_exhausts() {
    let echo: Arc<dyn AddressDeriver> = Arc::new(|p: &str| -> Result<String, DeriveError> { Ok(p.to_string()) });

    for workers in [1, 3] {
        let report = SeedSearch::new(
            &abc(),
            "unreachable",
            accept_all(),
            Arc::clone(&echo),
            SearchConfig { max_checked: 6, ..config(workers, Partition::Dynamic, 1) },
        )
        .unwrap()
        .run()
        .unwrap();

        assert_eq!(report.visited, 6, "{workers} workers");
        assert_eq!(report.checked, 6);
        assert_eq!(report.outcome, SearchOutcome::Exhausted, "{workers} workers");
    }
}

#[test]
fn progress_callback_sees_live_counts() {
    let seed = SeedSet::new(["a", "b", "c", "d"]).unwrap();
    let deriver: Arc<dyn AddressDeriver> = Arc::new(|p: &str| -> Result<String, DeriveError> {
        thread::sleep(Duration::from_millis(5));
        Ok(p.to_string())
    });
    let ticks = Arc::new(AtomicUsize::new(0));

    let report = {
        let ticks = Arc::clone(&ticks);
        SeedSearch::new(&seed, "none", accept_all(), deriver, SearchConfig {
            progress_interval_ms: 10,
            ..config(1, Partition::Dynamic, 4)
        })
        .unwrap()
        .run_with_callback(move |stats| {
            assert_eq!(stats.space(), 24);
            ticks.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap()
    };

    assert_eq!(report.outcome, SearchOutcome::Exhausted);
    assert!(ticks.load(Ordering::SeqCst) >= 1);
}

#[test]
fn rejects_invalid_inputs_before_running() {
    assert_eq!(SeedSet::new(Vec::<String>::new()).err(), Some(SearchError::EmptySeedSet));
    assert_eq!(SeedSet::new(["a", " ", "c"]).err(), Some(SearchError::EmptyWord(1)));

    let err = SeedSearch::new(&abc(), "", accept_all(), lookup(), config(1, Partition::Static, 1)).err();
    assert_eq!(err, Some(SearchError::EmptyTarget));

    let err = SeedSearch::new(&abc(), "ADDR1", accept_all(), lookup(), config(0, Partition::Static, 1)).err();
    assert_eq!(err, Some(SearchError::InvalidWorkers(0)));

    let words: Vec<String> = (0..40).map(|i| format!("w{i}")).collect();
    let err = SeedSearch::new(
        &SeedSet::new(words).unwrap(),
        "ADDR1",
        accept_all(),
        lookup(),
        config(1, Partition::Static, 1),
    )
    .err();
    assert_eq!(err, Some(SearchError::SearchSpaceTooLarge { words: 40 }));
}
