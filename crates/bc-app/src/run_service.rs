//! One bloomcast invocation: forcing data in, logged forecast out.

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Instant;

use bc_core::MemberYear;
use bc_ensemble::{EnsembleScheduler, RunSpecBuilder};
use bc_forcing::{
    AbortReason, CutoffNotice, FillContext, FillOutcome, FilledSeries, ForcingKind, ForcingSeries,
    GapFiller, PatchRecord, write_series_file,
};
use bc_model::{
    BloomCriteria, CancelToken, FailureReason, ModelRunAdapter, RunResult, SogProcessAdapter,
};
use bc_project::BloomcastConfig;
use bc_results::{
    Aggregate, BloomDateLog, BloomDateLogEntry, DataDateStamp, EnsembleSummary, ResultAggregator,
};
use chrono::{Days, NaiveDate};
use tracing::{debug, error, info, warn};

use crate::config_service;
use crate::error::{AppError, AppResult};
use crate::progress::{EnsembleProgress, RunProgressEvent, RunStage};
use crate::source::ObservationSource;

/// Request to make one forecast.
pub struct RunRequest<'a> {
    pub config_path: &'a Path,
    /// Day the forecast is made; real data is wanted through the day before.
    pub as_of: NaiveDate,
    /// Required when the configuration asks for forcing data collection.
    pub source: Option<&'a dyn ObservationSource>,
    /// Replaces the SOG subprocess adapter.
    pub adapter: Option<Arc<dyn ModelRunAdapter>>,
    pub cancel: Option<CancelToken>,
}

impl<'a> RunRequest<'a> {
    pub fn new(config_path: &'a Path, as_of: NaiveDate) -> Self {
        Self {
            config_path,
            as_of,
            source: None,
            adapter: None,
            cancel: None,
        }
    }

    pub fn with_source(mut self, source: &'a dyn ObservationSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_adapter(mut self, adapter: Arc<dyn ModelRunAdapter>) -> Self {
        self.adapter = Some(adapter);
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberFailure {
    pub member: MemberYear,
    pub reason: FailureReason,
}

/// What a successful invocation did.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// A new forecast was appended to the bloom date log.
    Forecast {
        entry: BloomDateLogEntry,
        summary: EnsembleSummary,
        patches: Vec<PatchRecord>,
        failures: Vec<MemberFailure>,
    },
    /// The data reach no further than the last forecast; nothing was run.
    Unchanged {
        cutoff: NaiveDate,
        last_known_good: Option<BloomDateLogEntry>,
    },
    /// Forcing files were written; running the model is switched off.
    ForcingOnly {
        cutoff: NaiveDate,
        notice: CutoffNotice,
        patches: Vec<PatchRecord>,
    },
}

impl RunOutcome {
    pub fn cutoff(&self) -> NaiveDate {
        match self {
            Self::Forecast { entry, .. } => entry.cutoff,
            Self::Unchanged { cutoff, .. } | Self::ForcingOnly { cutoff, .. } => *cutoff,
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forecast { entry, .. } => {
                write!(
                    f,
                    "Forecast with data through {}: median bloom {}, bounds {} to {}",
                    entry.cutoff,
                    entry.median.bloom_date,
                    entry.early.bloom_date,
                    entry.late.bloom_date
                )?;
                if entry.notice == CutoffNotice::UpdatedEstimate {
                    f.write_str(" (updated estimate, wind data lagging by one day)")?;
                }
                Ok(())
            }
            Self::Unchanged { cutoff, .. } => {
                write!(f, "Data date {cutoff} unchanged since last run")
            }
            Self::ForcingOnly { cutoff, .. } => {
                write!(f, "Forcing data written through {cutoff}; model run skipped")
            }
        }
    }
}

struct Progress<'a> {
    cb: Option<&'a mut dyn FnMut(RunProgressEvent)>,
    started: Instant,
}

impl Progress<'_> {
    fn stage(&mut self, stage: RunStage, message: &str) {
        let elapsed = self.started.elapsed().as_secs_f64();
        if let Some(cb) = self.cb.as_deref_mut() {
            cb(RunProgressEvent::stage(stage, elapsed, Some(message.to_string())));
        }
    }

    fn member(&mut self, member: MemberYear, succeeded: bool, ensemble: &EnsembleProgress) {
        let elapsed = self.started.elapsed().as_secs_f64();
        if let Some(cb) = self.cb.as_deref_mut() {
            cb(RunProgressEvent {
                stage: RunStage::MemberFinished { member, succeeded },
                elapsed_wall_s: elapsed,
                message: None,
                ensemble: Some(ensemble.clone()),
            });
        }
    }
}

/// Filled forcing data ready for the ensemble.
struct PreparedForcing {
    cutoff: NaiveDate,
    notice: CutoffNotice,
    patches: Vec<PatchRecord>,
}

/// Run one invocation.
pub fn run_bloomcast(request: &RunRequest) -> AppResult<RunOutcome> {
    run_bloomcast_with_progress(request, None)
}

/// Run one invocation and stream progress events.
pub fn run_bloomcast_with_progress(
    request: &RunRequest,
    progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunOutcome> {
    let mut progress = Progress {
        cb: progress_cb,
        started: Instant::now(),
    };

    progress.stage(RunStage::LoadingConfig, "Loading configuration");
    let config = config_service::load_config(request.config_path)?;

    let log = BloomDateLog::open(&config.logging.bloom_date_log)?;
    let last_known_good = log.last_entry().cloned();
    let stamp_path = config.logging.data_date_file.clone();
    let mut stamp = DataDateStamp::load(&stamp_path)?;
    debug!("Data date stamp: {:?}", stamp);

    let forcing = if config.get_forcing_data {
        let source = request.source.ok_or_else(|| {
            AppError::Configuration(
                "get_forcing_data is set but no observation source was given".to_string(),
            )
        })?;
        let filler = GapFiller::new()
            .with_max_gap_days(config.forcing.max_gap_days)
            .with_warn_gap_days(config.forcing.warn_gap_days);

        progress.stage(RunStage::FetchingObservations, "Collecting wind data");
        let wind = match fill_wind(&config, &filler, source, request.as_of, &stamp)? {
            FillOutcome::Filled(wind) => wind,
            FillOutcome::Aborted(reason) => {
                if let AbortReason::NoWindData { date } = reason {
                    stamp.pending_missing_day = Some(date);
                    stamp.save(&stamp_path)?;
                }
                error!("Forecast abandoned: {}", reason);
                return Err(AppError::DataGapUnrecoverable {
                    reason,
                    last_known_good: last_known_good.map(Box::new),
                });
            }
        };
        let cutoff = wind.cutoff;
        if stamp.already_forecast(cutoff) {
            info!("Data date {} unchanged since last run", cutoff);
            return Ok(RunOutcome::Unchanged {
                cutoff,
                last_known_good,
            });
        }

        progress.stage(RunStage::FillingGaps, "Filling gaps in forcing data");
        let mut filled = vec![wind];
        for kind in ForcingKind::ALL.into_iter().filter(|k| !k.is_wind()) {
            let observations = source.fetch(kind, config.run_start_date, cutoff)?;
            let series =
                ForcingSeries::from_observations(kind, config.run_start_date, cutoff, &observations)?;
            match filler.fill(&series, cutoff + Days::new(1), FillContext::default())? {
                FillOutcome::Filled(s) => filled.push(s),
                FillOutcome::Aborted(reason) => {
                    error!("Forecast abandoned: {}", reason);
                    return Err(AppError::DataGapUnrecoverable {
                        reason,
                        last_known_good: last_known_good.map(Box::new),
                    });
                }
            }
        }

        progress.stage(RunStage::WritingForcing, "Writing forcing files");
        write_forcing(&config, &filled)?;
        let notice = filled[0].notice;
        let patches = filled.into_iter().flat_map(|s| s.patches).collect();
        PreparedForcing {
            cutoff,
            notice,
            patches,
        }
    } else {
        info!("Skipped collection and processing of forcing data");
        let cutoff = request.as_of - Days::new(1);
        if stamp.already_forecast(cutoff) {
            info!("Data date {} unchanged since last run", cutoff);
            return Ok(RunOutcome::Unchanged {
                cutoff,
                last_known_good,
            });
        }
        PreparedForcing {
            cutoff,
            notice: CutoffNotice::Fresh,
            patches: Vec::new(),
        }
    };

    if !config.run_sog {
        info!("Skipped running SOG");
        save_stamp(&mut stamp, &stamp_path, forcing.cutoff)?;
        return Ok(RunOutcome::ForcingOnly {
            cutoff: forcing.cutoff,
            notice: forcing.notice,
            patches: forcing.patches,
        });
    }

    progress.stage(RunStage::BuildingSpecs, "Preparing ensemble members");
    let specs = RunSpecBuilder::new(&config).build(forcing.cutoff)?;
    prepare_output_dirs(&config)?;

    let adapter = request.adapter.clone().unwrap_or_else(|| {
        let criteria = BloomCriteria {
            nitrate_half_saturation: config.bloom.nitrate_half_saturation,
            peak_window_days: config.bloom.peak_window_days,
            steps_per_day: config.steps_per_day(),
        };
        Arc::new(SogProcessAdapter::new(config.sog_executable.clone(), criteria))
    });
    let mut scheduler = EnsembleScheduler::new(adapter);
    if let Some(cancel) = &request.cancel {
        scheduler = scheduler.with_cancel_token(cancel.clone());
    }

    progress.stage(RunStage::RunningEnsemble, "Running ensemble");
    let max_concurrency = config.ensemble.max_concurrent_jobs;
    let results = thread::scope(|scope| -> AppResult<Vec<RunResult>> {
        let (tx, rx) = mpsc::channel::<(MemberYear, bool)>();
        let scheduler = &scheduler;
        let specs = &specs;
        let handle = scope.spawn(move || {
            scheduler.run_with_progress(specs, max_concurrency, &|result: &RunResult| {
                let _ = tx.send((result.member(), result.failure().is_none()));
            })
        });

        let mut ensemble = EnsembleProgress {
            members_total: specs.len(),
            ..EnsembleProgress::default()
        };
        for (member, succeeded) in rx {
            ensemble.members_done += 1;
            if !succeeded {
                ensemble.members_failed += 1;
            }
            progress.member(member, succeeded, &ensemble);
        }
        let results = handle
            .join()
            .map_err(|_| AppError::Ensemble("scheduler thread panicked".to_string()))??;
        Ok(results)
    })?;

    let failures: Vec<MemberFailure> = results
        .iter()
        .filter_map(|r| {
            r.failure().map(|reason| MemberFailure {
                member: r.member(),
                reason: reason.clone(),
            })
        })
        .collect();
    for failure in &failures {
        warn!("Member {} failed: {}", failure.member, failure.reason);
    }

    progress.stage(RunStage::Aggregating, "Summarizing ensemble results");
    let summary = match ResultAggregator::summarize(&results) {
        Aggregate::Summary(summary) => summary,
        Aggregate::NoData { members_failed } => {
            error!("No ensemble member produced a bloom date");
            return Err(AppError::EnsembleNoData {
                members_failed,
                last_known_good: last_known_good.map(Box::new),
            });
        }
    };

    let mut aggregator = ResultAggregator::new(log);
    let entry = aggregator.record(&summary, forcing.notice)?;
    save_stamp(&mut stamp, &stamp_path, forcing.cutoff)?;
    info!(
        "Forecast for data through {} appended to {}",
        entry.cutoff,
        aggregator.log().path().display()
    );

    progress.stage(RunStage::Completed, "Forecast complete");
    Ok(RunOutcome::Forecast {
        entry,
        summary,
        patches: forcing.patches,
        failures,
    })
}

fn fill_wind(
    config: &BloomcastConfig,
    filler: &GapFiller,
    source: &dyn ObservationSource,
    as_of: NaiveDate,
    stamp: &DataDateStamp,
) -> AppResult<FillOutcome> {
    let most_recent = as_of - Days::new(1);
    let observations = source.fetch(ForcingKind::Wind, config.run_start_date, most_recent)?;
    let series = ForcingSeries::from_observations(
        ForcingKind::Wind,
        config.run_start_date,
        most_recent,
        &observations,
    )?;
    let ctx = FillContext {
        previous_missing_day: stamp.pending_missing_day,
    };
    Ok(filler.fill(&series, as_of, ctx)?)
}

fn write_forcing(config: &BloomcastConfig, filled: &[FilledSeries]) -> AppResult<()> {
    for series in filled {
        let path = config.forcing.output_files.get(&series.kind).ok_or_else(|| {
            AppError::Configuration(format!("no output file for {} forcing", series.kind))
        })?;
        write_series_file(series, &config.forcing.meteo_station_id, path)?;
        if series.patches.is_empty() {
            debug!("Wrote {} forcing to {}", series.kind, path.display());
        } else {
            info!(
                "Wrote {} forcing to {} with {} patched days",
                series.kind,
                path.display(),
                series.patches.len()
            );
        }
    }
    Ok(())
}

fn prepare_output_dirs(config: &BloomcastConfig) -> AppResult<()> {
    let results = &config.results;
    let outputs = [
        Some(&results.std_bio_ts_outfile),
        Some(&results.std_phys_ts_outfile),
        results.std_chem_ts_outfile.as_ref(),
    ];
    for path in outputs.into_iter().flatten() {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
    }
    fs::create_dir_all(&config.ensemble.work_dir)?;
    Ok(())
}

fn save_stamp(stamp: &mut DataDateStamp, path: &Path, cutoff: NaiveDate) -> AppResult<()> {
    stamp.last_run_cutoff = Some(cutoff);
    stamp.pending_missing_day = None;
    Ok(stamp.save(path)?)
}
