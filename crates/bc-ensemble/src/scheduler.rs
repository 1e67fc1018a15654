//! Bounded-concurrency execution of ensemble members.
//!
//! Members run on a dedicated rayon pool with one thread per slot, one job
//! per spec. A free thread takes the next queued spec as soon as its
//! current member finishes, so at most `max_concurrency` members are in
//! flight at any time.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use bc_core::timing::{RunTimings, Stopwatch};
use bc_model::{CancelToken, FailureReason, ModelRunAdapter, RunResult, RunSpec};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{EnsembleError, EnsembleResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    /// Specs remain in the queue.
    Dispatching,
    /// Every spec has started; waiting for the last members.
    Draining,
    Completed,
    Cancelled,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Dispatching => "dispatching",
            Self::Draining => "draining",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

pub struct EnsembleScheduler {
    adapter: Arc<dyn ModelRunAdapter>,
    cancel: CancelToken,
    state: Mutex<SchedulerState>,
    timing: RunTimings,
}

impl EnsembleScheduler {
    pub fn new(adapter: Arc<dyn ModelRunAdapter>) -> Self {
        Self {
            adapter,
            cancel: CancelToken::new(),
            state: Mutex::new(SchedulerState::Idle),
            timing: RunTimings::new(),
        }
    }

    /// Share a token created elsewhere, such as by a signal handler.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that cancels the current and any later run.
    ///
    /// A token never resets. Once it has fired, every later run returns
    /// `Cancelled` until [`Self::reset_cancel_token`] installs a new one.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Install a fresh token and return it, so a cancelled scheduler can
    /// be reused. Clones of the old token no longer reach this scheduler.
    pub fn reset_cancel_token(&mut self) -> CancelToken {
        self.cancel = CancelToken::new();
        self.cancel.clone()
    }

    pub fn state(&self) -> SchedulerState {
        *self.lock_state()
    }

    /// Wall-clock statistics of every member run so far.
    pub fn timing(&self) -> &RunTimings {
        &self.timing
    }

    pub fn run(&self, specs: &[RunSpec], max_concurrency: usize) -> EnsembleResult<Vec<RunResult>> {
        self.run_with_progress(specs, max_concurrency, &|_| {})
    }

    /// Run every spec, calling `on_result` as each member finishes.
    ///
    /// Returns one result per spec, in spec order. A member failure never
    /// stops the others. Cancellation kills in-flight members and discards
    /// all results.
    ///
    /// Only the number of members in flight is bounded. Start order is up
    /// to rayon's work stealing, so a later spec may start, log and finish
    /// before an earlier one; `on_result` sees completion order.
    pub fn run_with_progress(
        &self,
        specs: &[RunSpec],
        max_concurrency: usize,
        on_result: &(dyn Fn(&RunResult) + Sync),
    ) -> EnsembleResult<Vec<RunResult>> {
        if max_concurrency == 0 {
            return Err(EnsembleError::ZeroConcurrency);
        }
        {
            let mut state = self.lock_state();
            if matches!(*state, SchedulerState::Dispatching | SchedulerState::Draining) {
                return Err(EnsembleError::AlreadyRunning);
            }
            *state = SchedulerState::Idle;
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(max_concurrency)
            .thread_name(|i| format!("bc-member-{i}"))
            .build()
            .map_err(|e| EnsembleError::ThreadPool(e.to_string()))?;

        info!(
            "Running {} ensemble members, at most {} at a time",
            specs.len(),
            max_concurrency
        );
        let stopwatch = Stopwatch::start();
        self.transition(SchedulerState::Dispatching);
        if specs.is_empty() {
            self.transition(SchedulerState::Draining);
        }

        let started = AtomicUsize::new(0);
        let results: Vec<RunResult> = pool.install(|| {
            specs
                .par_iter()
                .with_max_len(1)
                .map(|spec| {
                    if started.fetch_add(1, Ordering::SeqCst) + 1 == specs.len() {
                        self.transition(SchedulerState::Draining);
                    }
                    let result = if self.cancel.is_cancelled() {
                        RunResult::failed(spec.clone(), FailureReason::Cancelled, 0.0)
                    } else {
                        self.adapter.execute(spec, &self.cancel)
                    };
                    self.timing.record(result.elapsed_s, result.failure().is_none());
                    on_result(&result);
                    result
                })
                .collect()
        });

        if self.cancel.is_cancelled() {
            self.transition(SchedulerState::Cancelled);
            warn!("Ensemble cancelled; {} member results discarded", results.len());
            return Err(EnsembleError::Cancelled);
        }

        self.transition(SchedulerState::Completed);
        let failed = results.iter().filter(|r| r.failure().is_some()).count();
        info!(
            "Ensemble finished in {:.1} s: {} succeeded, {} failed, longest member {:.1} s",
            stopwatch.elapsed_s(),
            results.len() - failed,
            failed,
            self.timing.slowest_s()
        );
        Ok(results)
    }

    fn lock_state(&self) -> MutexGuard<'_, SchedulerState> {
        // State is a plain enum; a panic elsewhere cannot leave it torn.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn transition(&self, next: SchedulerState) {
        let mut state = self.lock_state();
        if *state != next {
            debug!("Scheduler {} -> {}", *state, next);
            *state = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bc_core::MemberYear;
    use bc_model::{BloomPrediction, InitialConditions, MemberOutputs};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::thread;
    use std::time::Duration;

    fn spec(year: i32) -> RunSpec {
        let member = MemberYear::new(year).unwrap();
        let midnight = |y, m, d| {
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        };
        RunSpec {
            member,
            base_infile: PathBuf::from("infile.yaml"),
            cutoff: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            run_start: midnight(2023, 9, 19),
            run_end: midnight(2024, 7, 31),
            forcing_files: BTreeMap::new(),
            archive_files: BTreeMap::new(),
            initial_conditions: InitialConditions {
                ctd_in: PathBuf::from("ctd"),
                nutrients_in: PathBuf::from("nuts"),
            },
            member_infile: PathBuf::from(format!("infile{}.yaml", member.suffix())),
            outputs: MemberOutputs {
                std_bio_ts: PathBuf::from("bio"),
                std_phys_ts: PathBuf::from("phys"),
                std_chem_ts: None,
            },
            timeout: Duration::from_secs(1),
        }
    }

    /// Tracks how many members are executing at once.
    #[derive(Default)]
    struct CountingAdapter {
        active: AtomicUsize,
        max_active: AtomicUsize,
        calls: AtomicUsize,
        fail_odd_years: bool,
    }

    impl ModelRunAdapter for CountingAdapter {
        fn execute(&self, spec: &RunSpec, _cancel: &CancelToken) -> RunResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(15));
            self.active.fetch_sub(1, Ordering::SeqCst);
            if self.fail_odd_years && spec.member.year() % 2 == 1 {
                RunResult::failed(
                    spec.clone(),
                    FailureReason::ExecutableError {
                        detail: "exit code 1".into(),
                    },
                    0.015,
                )
            } else {
                let prediction = BloomPrediction {
                    date: NaiveDate::from_ymd_opt(2024, 3, 20).unwrap(),
                    biomass: 5.0,
                };
                RunResult::succeeded(spec.clone(), prediction, 0.015)
            }
        }
    }

    fn specs(n: i32) -> Vec<RunSpec> {
        (0..n).map(|i| spec(1981 + i)).collect()
    }

    #[test]
    fn never_exceeds_max_concurrency() {
        let adapter = Arc::new(CountingAdapter::default());
        let scheduler = EnsembleScheduler::new(adapter.clone());
        let results = scheduler.run(&specs(12), 3).unwrap();
        assert_eq!(results.len(), 12);
        assert!(adapter.max_active.load(Ordering::SeqCst) <= 3);
        assert_eq!(adapter.calls.load(Ordering::SeqCst), 12);
        assert_eq!(scheduler.state(), SchedulerState::Completed);
    }

    #[test]
    fn failures_do_not_stop_other_members() {
        let adapter = Arc::new(CountingAdapter {
            fail_odd_years: true,
            ..CountingAdapter::default()
        });
        let scheduler = EnsembleScheduler::new(adapter);
        let results = scheduler.run(&specs(10), 4).unwrap();
        assert_eq!(results.len(), 10);
        let failed = results.iter().filter(|r| r.failure().is_some()).count();
        assert_eq!(failed, 5);
        // Results come back in spec order.
        let years: Vec<i32> = results.iter().map(|r| r.member().year()).collect();
        assert_eq!(years, (1981..1991).collect::<Vec<_>>());
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let scheduler = EnsembleScheduler::new(Arc::new(CountingAdapter::default()));
        assert!(matches!(
            scheduler.run(&specs(2), 0),
            Err(EnsembleError::ZeroConcurrency)
        ));
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[test]
    fn progress_sees_every_member() {
        let scheduler = EnsembleScheduler::new(Arc::new(CountingAdapter::default()));
        let seen = AtomicUsize::new(0);
        scheduler
            .run_with_progress(&specs(6), 2, &|_| {
                seen.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 6);
        assert_eq!(scheduler.timing().finished(), 6);
    }

    #[test]
    fn empty_ensemble_completes() {
        let scheduler = EnsembleScheduler::new(Arc::new(CountingAdapter::default()));
        assert!(scheduler.run(&[], 4).unwrap().is_empty());
        assert_eq!(scheduler.state(), SchedulerState::Completed);
    }

    struct CancellingAdapter {
        token: Mutex<Option<CancelToken>>,
    }

    impl ModelRunAdapter for CancellingAdapter {
        fn execute(&self, spec: &RunSpec, cancel: &CancelToken) -> RunResult {
            if let Some(token) = self.token.lock().unwrap().take() {
                token.cancel();
            }
            if cancel.is_cancelled() {
                return RunResult::failed(spec.clone(), FailureReason::Cancelled, 0.0);
            }
            RunResult::failed(spec.clone(), FailureReason::Timeout { after: spec.timeout }, 1.0)
        }
    }

    #[test]
    fn cancellation_discards_results() {
        let adapter = Arc::new(CancellingAdapter {
            token: Mutex::new(None),
        });
        let scheduler = EnsembleScheduler::new(adapter.clone());
        *adapter.token.lock().unwrap() = Some(scheduler.cancel_token());
        let err = scheduler.run(&specs(8), 2).unwrap_err();
        assert!(matches!(err, EnsembleError::Cancelled));
        assert_eq!(scheduler.state(), SchedulerState::Cancelled);
    }

    #[test]
    fn reset_token_allows_reuse_after_cancellation() {
        let adapter = Arc::new(CancellingAdapter {
            token: Mutex::new(None),
        });
        let mut scheduler = EnsembleScheduler::new(adapter.clone());
        let old = scheduler.cancel_token();
        *adapter.token.lock().unwrap() = Some(old.clone());
        assert!(scheduler.run(&specs(4), 2).is_err());
        // Still cancelled without a new token.
        assert!(matches!(scheduler.run(&specs(4), 2), Err(EnsembleError::Cancelled)));

        let fresh = scheduler.reset_cancel_token();
        assert!(!fresh.is_cancelled());
        assert!(old.is_cancelled());
        let results = scheduler.run(&specs(4), 2).unwrap();
        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| r.failure() != Some(&FailureReason::Cancelled)));
        assert_eq!(scheduler.state(), SchedulerState::Completed);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(16))]

            #[test]
            fn one_result_per_spec_within_bound(n in 1i32..20, k in 1usize..6) {
                let adapter = Arc::new(CountingAdapter {
                    fail_odd_years: true,
                    ..CountingAdapter::default()
                });
                let scheduler = EnsembleScheduler::new(adapter.clone());
                let results = scheduler.run(&specs(n), k).unwrap();
                prop_assert_eq!(results.len(), n as usize);
                prop_assert!(adapter.max_active.load(Ordering::SeqCst) <= k);
            }
        }
    }
}
