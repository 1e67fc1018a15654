//! One [`RunSpec`] per historical continuation year.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bc_core::MemberYear;
use bc_forcing::ForcingKind;
use bc_model::{InitialConditions, MemberOutputs, RunSpec, load_base_infile};
use bc_project::BloomcastConfig;
use chrono::NaiveDate;
use tracing::debug;

use crate::error::{EnsembleError, EnsembleResult};

/// `root` with the member's `_YYZZ` suffix appended to its file name.
pub fn member_path(root: &Path, member: MemberYear) -> PathBuf {
    let mut name = OsString::from(root.as_os_str());
    name.push(member.suffix());
    PathBuf::from(name)
}

/// Member infile name: the base infile's stem, the suffix, then its extension.
fn member_infile(work_dir: &Path, base_infile: &Path, member: MemberYear) -> PathBuf {
    let stem = base_infile
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "infile".to_string());
    let name = match base_infile.extension() {
        Some(ext) => format!("{stem}{}.{}", member.suffix(), ext.to_string_lossy()),
        None => format!("{stem}{}", member.suffix()),
    };
    work_dir.join(name)
}

/// Builds member run specs from the configuration.
#[derive(Debug, Clone)]
pub struct RunSpecBuilder<'a> {
    config: &'a BloomcastConfig,
    check_archives: bool,
}

impl<'a> RunSpecBuilder<'a> {
    pub fn new(config: &'a BloomcastConfig) -> Self {
        Self {
            config,
            check_archives: true,
        }
    }

    /// Skip the archive existence check.
    pub fn without_archive_check(mut self) -> Self {
        self.check_archives = false;
        self
    }

    pub fn members(&self) -> EnsembleResult<Vec<MemberYear>> {
        let ensemble = &self.config.ensemble;
        if ensemble.start_year > ensemble.end_year {
            return Err(EnsembleError::Configuration(format!(
                "start_year {} is after end_year {}",
                ensemble.start_year, ensemble.end_year
            )));
        }
        Ok(MemberYear::range(ensemble.start_year, ensemble.end_year)?)
    }

    /// Specs for every member year, with real forcing data through `cutoff`.
    pub fn build(&self, cutoff: NaiveDate) -> EnsembleResult<Vec<RunSpec>> {
        let config = self.config;
        let ensemble = &config.ensemble;
        let members = self.members()?;

        let base_infile = &ensemble.base_infile;
        load_base_infile(base_infile).map_err(|source| EnsembleError::BaseInfile {
            path: base_infile.clone(),
            source,
        })?;

        let mut forcing_files = BTreeMap::new();
        for kind in ForcingKind::ALL {
            let path = config
                .forcing
                .output_files
                .get(&kind)
                .ok_or(EnsembleError::MissingForcingFile { kind })?;
            forcing_files.insert(kind, path.clone());
        }

        let run_start = config.run_start_date.and_time(chrono::NaiveTime::MIN);
        let run_end = config.run_end_date.and_time(chrono::NaiveTime::MIN);
        let timeout = Duration::from_secs(ensemble.member_timeout_s);

        let mut specs = Vec::with_capacity(members.len());
        for member in members {
            let mut archive_files = BTreeMap::new();
            for kind in ForcingKind::ALL {
                let root = ensemble.forcing_data_file_roots.get(&kind).ok_or_else(|| {
                    EnsembleError::Configuration(format!("no {kind} archive root"))
                })?;
                let path = member_path(root, member);
                if self.check_archives && !path.exists() {
                    return Err(EnsembleError::MissingArchive { kind, member, path });
                }
                archive_files.insert(kind, path);
            }

            let results = &config.results;
            specs.push(RunSpec {
                member,
                base_infile: base_infile.clone(),
                cutoff,
                run_start,
                run_end,
                forcing_files: forcing_files.clone(),
                archive_files,
                initial_conditions: InitialConditions {
                    ctd_in: config.initial_conditions.ctd_in.clone(),
                    nutrients_in: config.initial_conditions.nutrients_in.clone(),
                },
                member_infile: member_infile(&ensemble.work_dir, base_infile, member),
                outputs: MemberOutputs {
                    std_bio_ts: member_path(&results.std_bio_ts_outfile, member),
                    std_phys_ts: member_path(&results.std_phys_ts_outfile, member),
                    std_chem_ts: results
                        .std_chem_ts_outfile
                        .as_deref()
                        .map(|p| member_path(p, member)),
                },
                timeout,
            });
        }
        debug!(
            "Built {} member specs for cutoff {}",
            specs.len(),
            cutoff
        );
        Ok(specs)
    }
}
