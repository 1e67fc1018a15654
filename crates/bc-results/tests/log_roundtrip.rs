use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use bc_core::MemberYear;
use bc_forcing::CutoffNotice;
use bc_model::{
    BloomPrediction, FailureReason, InitialConditions, MemberOutputs, RunResult, RunSpec,
};
use bc_results::*;
use chrono::NaiveDate;

fn temp_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("bc_results_it_{name}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir.join("bloom_date_evolution.jsonl")
}

fn spec(year: i32, cutoff: NaiveDate) -> RunSpec {
    let midnight = NaiveDate::from_ymd_opt(2023, 9, 19)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    RunSpec {
        member: MemberYear::new(year).unwrap(),
        base_infile: PathBuf::from("infile.yaml"),
        cutoff,
        run_start: midnight,
        run_end: midnight,
        forcing_files: BTreeMap::new(),
        archive_files: BTreeMap::new(),
        initial_conditions: InitialConditions {
            ctd_in: PathBuf::from("ctd"),
            nutrients_in: PathBuf::from("nuts"),
        },
        member_infile: PathBuf::from("infile.yaml"),
        outputs: MemberOutputs {
            std_bio_ts: PathBuf::from("bio"),
            std_phys_ts: PathBuf::from("phys"),
            std_chem_ts: None,
        },
        timeout: Duration::from_secs(60),
    }
}

fn march(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
}

#[test]
fn three_member_ensemble_is_logged_field_for_field() {
    let cutoff = NaiveDate::from_ymd_opt(2024, 2, 14).unwrap();
    let results = vec![
        RunResult::succeeded(
            spec(1983, cutoff),
            BloomPrediction { date: march(15), biomass: 8.5 },
            2.0,
        ),
        RunResult::succeeded(
            spec(1981, cutoff),
            BloomPrediction { date: march(10), biomass: 6.25 },
            2.0,
        ),
        RunResult::succeeded(
            spec(1982, cutoff),
            BloomPrediction { date: march(12), biomass: 7.0 },
            2.0,
        ),
        RunResult::failed(
            spec(1984, cutoff),
            FailureReason::Timeout { after: Duration::from_secs(60) },
            60.0,
        ),
    ];

    let summary = match ResultAggregator::summarize(&results) {
        Aggregate::Summary(s) => s,
        Aggregate::NoData { .. } => panic!("expected a summary"),
    };
    assert_eq!(summary.cutoff, cutoff);
    assert_eq!(summary.median.bloom_date, march(12));
    assert_eq!(summary.median.member.year(), 1982);
    assert_eq!(summary.early.bloom_date, march(10));
    assert_eq!(summary.late.bloom_date, march(15));
    assert_eq!(summary.members_succeeded, 3);
    assert_eq!(summary.members_failed, 1);

    let path = temp_path("three");
    let mut aggregator = ResultAggregator::new(BloomDateLog::open(&path).unwrap());
    assert!(aggregator.last_known_good().is_none());
    let written = aggregator
        .record(&summary, CutoffNotice::UpdatedEstimate)
        .unwrap();
    assert_eq!(aggregator.last_known_good(), Some(&written));

    let reread = BloomDateLog::open(&path).unwrap();
    assert_eq!(reread.entries(), &[written.clone()]);
    let entry = &reread.entries()[0];
    assert_eq!(entry.notice, CutoffNotice::UpdatedEstimate);
    assert_eq!(entry.median.biomass, 7.0);
    assert_eq!(entry.earliest.map(|p| p.member.year()), Some(1981));
    assert_eq!(entry.latest.map(|p| p.member.year()), Some(1983));

    let table = render_legacy(reread.entries());
    assert!(table.contains("2024-02-14      2024-03-12  1982      2024-03-10  1981      2024-03-15  1983"));
    let _ = fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn every_invocation_adds_one_line() {
    let path = temp_path("lines");
    let mut aggregator = ResultAggregator::new(BloomDateLog::open(&path).unwrap());
    for (i, day) in [1u32, 2, 3].into_iter().enumerate() {
        let cutoff = NaiveDate::from_ymd_opt(2024, 2, day).unwrap();
        let results = vec![RunResult::succeeded(
            spec(1990, cutoff),
            BloomPrediction { date: march(20 + i as u32), biomass: 5.0 },
            1.0,
        )];
        let Aggregate::Summary(summary) = ResultAggregator::summarize(&results) else {
            panic!("expected a summary");
        };
        aggregator.record(&summary, CutoffNotice::Fresh).unwrap();
    }
    let log = aggregator.into_log();
    assert_eq!(log.len(), 3);
    assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 3);
    let cutoffs: Vec<String> = BloomDateLog::open(&path)
        .unwrap()
        .entries()
        .iter()
        .map(|e| e.cutoff.to_string())
        .collect();
    assert_eq!(cutoffs, ["2024-02-01", "2024-02-02", "2024-02-03"]);
    let _ = fs::remove_dir_all(path.parent().unwrap());
}
