//! Subprocess adapter for the SOG executable.

use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use bc_core::timing::Stopwatch;
use tracing::{debug, info, warn};

use crate::adapter::ModelRunAdapter;
use crate::bloom::{BloomCriteria, detect_bloom};
use crate::cancel::CancelToken;
use crate::infile::materialize_infile;
use crate::output::read_timeseries;
use crate::types::{BloomPrediction, FailureReason, RunResult, RunSpec};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Runs members by spawning the simulation executable on each member infile.
#[derive(Debug, Clone)]
pub struct SogProcessAdapter {
    executable: PathBuf,
    criteria: BloomCriteria,
    poll_interval: Duration,
}

impl SogProcessAdapter {
    pub fn new(executable: impl Into<PathBuf>, criteria: BloomCriteria) -> Self {
        Self {
            executable: executable.into(),
            criteria,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    fn run(&self, spec: &RunSpec, cancel: &CancelToken) -> Result<BloomPrediction, FailureReason> {
        if cancel.is_cancelled() {
            return Err(FailureReason::Cancelled);
        }
        materialize_infile(spec).map_err(|e| FailureReason::ExecutableError {
            detail: e.to_string(),
        })?;
        clear_outputs(spec).map_err(|e| FailureReason::ExecutableError {
            detail: format!("cannot remove previous output: {e}"),
        })?;

        let child = self.spawn(spec).map_err(|e| FailureReason::ExecutableError {
            detail: format!("failed to start {}: {e}", self.executable.display()),
        })?;
        let status = self.wait(child, spec.timeout, cancel)?;
        if !status.success() {
            let detail = match status.code() {
                Some(code) => format!("exit code {code}"),
                None => format!("terminated: {status}"),
            };
            return Err(FailureReason::ExecutableError { detail });
        }

        let parse_error = |e: crate::error::ModelError| FailureReason::OutputParseError {
            detail: e.to_string(),
        };
        let table = read_timeseries(&spec.outputs.std_bio_ts).map_err(parse_error)?;
        detect_bloom(&table, spec.run_start, &self.criteria).map_err(parse_error)
    }

    fn spawn(&self, spec: &RunSpec) -> std::io::Result<Child> {
        let stdout = File::create(spec.stdout_path())?;
        let stderr = stdout.try_clone()?;
        debug!(
            "Starting {} {} for member {}",
            self.executable.display(),
            spec.member_infile.display(),
            spec.member
        );
        Command::new(&self.executable)
            .arg(&spec.member_infile)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
    }

    /// Poll the child until it exits, the deadline passes, or cancellation.
    fn wait(
        &self,
        mut child: Child,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<ExitStatus, FailureReason> {
        let deadline = Instant::now() + timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {}
                Err(e) => {
                    stop(&mut child);
                    return Err(FailureReason::ExecutableError {
                        detail: format!("failed to poll process: {e}"),
                    });
                }
            }
            if cancel.is_cancelled() {
                stop(&mut child);
                return Err(FailureReason::Cancelled);
            }
            if Instant::now() >= deadline {
                stop(&mut child);
                return Err(FailureReason::Timeout { after: timeout });
            }
            thread::sleep(self.poll_interval);
        }
    }
}

/// Remove the member's timeseries files left by an earlier run, so that
/// only output written by this run is graded.
fn clear_outputs(spec: &RunSpec) -> std::io::Result<()> {
    let outputs = [
        Some(&spec.outputs.std_bio_ts),
        Some(&spec.outputs.std_phys_ts),
        spec.outputs.std_chem_ts.as_ref(),
    ];
    for path in outputs.into_iter().flatten() {
        match fs::remove_file(path) {
            Ok(()) => debug!("Removed previous output {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Kill and reap; a process that already exited is not an error.
fn stop(child: &mut Child) {
    if let Err(e) = child.kill() {
        debug!("kill of process {} failed: {}", child.id(), e);
    }
    let _ = child.wait();
}

impl ModelRunAdapter for SogProcessAdapter {
    fn execute(&self, spec: &RunSpec, cancel: &CancelToken) -> RunResult {
        let stopwatch = Stopwatch::start();
        match self.run(spec, cancel) {
            Ok(prediction) => {
                info!(
                    "Member {} predicts bloom on {} ({:.4} uM N)",
                    spec.member, prediction.date, prediction.biomass
                );
                RunResult::succeeded(spec.clone(), prediction, stopwatch.elapsed_s())
            }
            Err(reason) => {
                warn!("Member {} failed: {}", spec.member, reason);
                RunResult::failed(spec.clone(), reason, stopwatch.elapsed_s())
            }
        }
    }
}
