//! Reduction of member results to ensemble statistics.

use bc_forcing::CutoffNotice;
use bc_model::RunResult;
use tracing::{debug, info, warn};

use crate::store::BloomDateLog;
use crate::types::{BloomDateLogEntry, EnsembleSummary, MemberPrediction};
use crate::ResultsResult;

#[derive(Debug, Clone, PartialEq)]
pub enum Aggregate {
    Summary(EnsembleSummary),
    /// No member succeeded.
    NoData { members_failed: usize },
}

/// Sorted-array indices of (median, early, late) for `n` successes.
///
/// Median is the lower median, early the 5th percentile by floor, late the
/// 95th percentile by nearest rank. `n` must be non-zero.
pub fn percentile_indices(n: usize) -> (usize, usize, usize) {
    debug_assert!(n > 0);
    let median = (n - 1) / 2;
    let early = (5 * n) / 100;
    let late = ((95 * n).div_ceil(100)).saturating_sub(1).min(n - 1);
    (median, early, late)
}

/// Summarizes ensembles and owns writes to the bloom date log.
#[derive(Debug)]
pub struct ResultAggregator {
    log: BloomDateLog,
}

impl ResultAggregator {
    pub fn new(log: BloomDateLog) -> Self {
        Self { log }
    }

    pub fn log(&self) -> &BloomDateLog {
        &self.log
    }

    /// Most recent logged forecast.
    pub fn last_known_good(&self) -> Option<&BloomDateLogEntry> {
        self.log.last_entry()
    }

    /// Reduce member results; failures are discarded.
    ///
    /// Successes are ordered by bloom date, ties broken by member year.
    pub fn summarize(results: &[RunResult]) -> Aggregate {
        let mut ok: Vec<(MemberPrediction, chrono::NaiveDate)> = results
            .iter()
            .filter_map(|r| {
                r.prediction().map(|p| {
                    (
                        MemberPrediction {
                            member: r.member(),
                            bloom_date: p.date,
                            biomass: p.biomass,
                        },
                        r.spec.cutoff,
                    )
                })
            })
            .collect();
        let members_failed = results.len() - ok.len();
        if ok.is_empty() {
            warn!("All {} ensemble members failed", members_failed);
            return Aggregate::NoData { members_failed };
        }

        ok.sort_by_key(|(p, _)| (p.bloom_date, p.member));
        let cutoff = ok[0].1;
        let sorted: Vec<MemberPrediction> = ok.into_iter().map(|(p, _)| p).collect();
        let n = sorted.len();
        let (median, early, late) = percentile_indices(n);

        let summary = EnsembleSummary {
            cutoff,
            median: sorted[median],
            early: sorted[early],
            late: sorted[late],
            earliest: sorted[0],
            latest: sorted[n - 1],
            members_succeeded: n,
            members_failed,
        };
        info!("Predicted median bloom date is {}", summary.median);
        info!("Predicted early bound bloom date is {}", summary.early);
        info!("Predicted late bound bloom date is {}", summary.late);
        debug!("Predicted earliest bloom date is {}", summary.earliest);
        debug!("Predicted latest bloom date is {}", summary.latest);
        Aggregate::Summary(summary)
    }

    /// Append the summary to the log.
    pub fn record(
        &mut self,
        summary: &EnsembleSummary,
        notice: CutoffNotice,
    ) -> ResultsResult<BloomDateLogEntry> {
        let entry = BloomDateLogEntry::new(summary, notice);
        self.log.append(entry.clone())?;
        Ok(entry)
    }

    pub fn into_log(self) -> BloomDateLog {
        self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bc_core::MemberYear;
    use bc_model::{BloomPrediction, FailureReason, InitialConditions, MemberOutputs, RunSpec};
    use chrono::{Days, NaiveDate};
    use proptest::prelude::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::time::Duration;

    fn spec(year: i32) -> RunSpec {
        let midnight = NaiveDate::from_ymd_opt(2023, 9, 19)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        RunSpec {
            member: MemberYear::new(year).unwrap(),
            base_infile: PathBuf::from("infile.yaml"),
            cutoff: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            run_start: midnight,
            run_end: midnight,
            forcing_files: BTreeMap::new(),
            archive_files: BTreeMap::new(),
            initial_conditions: InitialConditions {
                ctd_in: PathBuf::new(),
                nutrients_in: PathBuf::new(),
            },
            member_infile: PathBuf::new(),
            outputs: MemberOutputs {
                std_bio_ts: PathBuf::new(),
                std_phys_ts: PathBuf::new(),
                std_chem_ts: None,
            },
            timeout: Duration::from_secs(1),
        }
    }

    fn ok(year: i32, date: NaiveDate) -> RunResult {
        RunResult::succeeded(spec(year), BloomPrediction { date, biomass: 3.0 }, 1.0)
    }

    fn failed(year: i32) -> RunResult {
        RunResult::failed(spec(year), FailureReason::Cancelled, 0.0)
    }

    fn march(day: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() + Days::new(day - 1)
    }

    fn summary(results: &[RunResult]) -> EnsembleSummary {
        match ResultAggregator::summarize(results) {
            Aggregate::Summary(s) => s,
            Aggregate::NoData { .. } => panic!("expected a summary"),
        }
    }

    #[test]
    fn twenty_one_members_pick_ranked_elements() {
        // Member i blooms on March i+1, listed out of order.
        let results: Vec<RunResult> = (0..21)
            .rev()
            .map(|i| ok(1981 + i as i32, march(i + 1)))
            .collect();
        let s = summary(&results);
        assert_eq!(s.median.bloom_date, march(11));
        assert_eq!(s.early.bloom_date, march(2));
        assert_eq!(s.late.bloom_date, march(20));
        assert_eq!(s.earliest.bloom_date, march(1));
        assert_eq!(s.latest.bloom_date, march(21));
        assert_eq!(s.members_succeeded, 21);
        assert_eq!(s.members_failed, 0);
    }

    #[test]
    fn all_failed_is_no_data() {
        let results = vec![failed(1981), failed(1982)];
        assert_eq!(
            ResultAggregator::summarize(&results),
            Aggregate::NoData { members_failed: 2 }
        );
        assert_eq!(
            ResultAggregator::summarize(&[]),
            Aggregate::NoData { members_failed: 0 }
        );
    }

    #[test]
    fn failures_are_discarded() {
        let results = vec![failed(1981), ok(1982, march(12)), failed(1983)];
        let s = summary(&results);
        assert_eq!(s.median.member.year(), 1982);
        assert_eq!(s.early, s.late);
        assert_eq!(s.members_failed, 2);
    }

    #[test]
    fn ties_order_by_member_year() {
        let results = vec![ok(1990, march(5)), ok(1985, march(5)), ok(1988, march(5))];
        let s = summary(&results);
        assert_eq!(s.earliest.member.year(), 1985);
        assert_eq!(s.median.member.year(), 1988);
        assert_eq!(s.latest.member.year(), 1990);
    }

    #[test]
    fn small_ensemble_indices() {
        assert_eq!(percentile_indices(1), (0, 0, 0));
        assert_eq!(percentile_indices(2), (0, 0, 1));
        assert_eq!(percentile_indices(3), (1, 0, 2));
        assert_eq!(percentile_indices(20), (9, 1, 18));
        assert_eq!(percentile_indices(21), (10, 1, 19));
        assert_eq!(percentile_indices(30), (14, 1, 28));
    }

    proptest! {
        #[test]
        fn indices_are_ordered_and_in_range(n in 1usize..500) {
            let (median, early, late) = percentile_indices(n);
            prop_assert!(early <= median);
            prop_assert!(median <= late);
            prop_assert!(late < n);
        }
    }
}
