//! Configuration schema definitions.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use bc_forcing::ForcingKind;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BloomcastConfig {
    /// Assemble forcing files from fresh observations.
    #[serde(default = "default_true")]
    pub get_forcing_data: bool,
    /// Run the ensemble; when false only the forcing files are produced.
    #[serde(default = "default_true")]
    pub run_sog: bool,
    pub sog_executable: PathBuf,
    #[serde(default = "default_sog_timestep_s")]
    pub sog_timestep_s: u32,
    pub run_start_date: NaiveDate,
    pub run_end_date: NaiveDate,
    pub ensemble: EnsembleDef,
    pub forcing: ForcingDef,
    pub initial_conditions: InitialConditionsDef,
    pub results: ResultsDef,
    #[serde(default)]
    pub logging: LoggingDef,
    #[serde(default)]
    pub bloom: BloomDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnsembleDef {
    pub base_infile: PathBuf,
    pub start_year: i32,
    pub end_year: i32,
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,
    #[serde(default = "default_member_timeout_s")]
    pub member_timeout_s: u64,
    /// Directory for member infiles and outputs.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
    /// Historical archive root per forcing kind; members append `_YYZZ`.
    pub forcing_data_file_roots: BTreeMap<ForcingKind, PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForcingDef {
    /// Where the filled series for each kind are written.
    pub output_files: BTreeMap<ForcingKind, PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_gap_days: Option<usize>,
    #[serde(default = "default_warn_gap_days")]
    pub warn_gap_days: usize,
    #[serde(default = "default_meteo_station_id")]
    pub meteo_station_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InitialConditionsDef {
    pub ctd_in: PathBuf,
    pub nutrients_in: PathBuf,
}

/// Timeseries output roots; members append their `_YYZZ` suffix.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultsDef {
    pub std_bio_ts_outfile: PathBuf,
    pub std_phys_ts_outfile: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std_chem_ts_outfile: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingDef {
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_bloom_date_log")]
    pub bloom_date_log: PathBuf,
    #[serde(default = "default_data_date_file")]
    pub data_date_file: PathBuf,
}

impl Default for LoggingDef {
    fn default() -> Self {
        Self {
            debug: false,
            bloom_date_log: default_bloom_date_log(),
            data_date_file: default_data_date_file(),
        }
    }
}

/// Bloom detection thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BloomDef {
    /// Nitrate concentration (uM) at or below which nutrients are depleted.
    #[serde(default = "default_nitrate_half_saturation")]
    pub nitrate_half_saturation: f64,
    /// Days either side of the depletion pair searched for peak biomass.
    #[serde(default = "default_peak_window_days")]
    pub peak_window_days: usize,
}

impl Default for BloomDef {
    fn default() -> Self {
        Self {
            nitrate_half_saturation: default_nitrate_half_saturation(),
            peak_window_days: default_peak_window_days(),
        }
    }
}

impl BloomcastConfig {
    /// Make every relative path absolute with respect to `base`.
    ///
    /// A bare executable name is left alone so it can be found on `PATH`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let is_bare = |p: &Path| p.is_relative() && p.components().count() == 1;
        if !is_bare(&self.sog_executable) {
            resolve(base, &mut self.sog_executable);
        }
        resolve(base, &mut self.ensemble.base_infile);
        resolve(base, &mut self.ensemble.work_dir);
        self.ensemble
            .forcing_data_file_roots
            .values_mut()
            .for_each(|p| resolve(base, p));
        self.forcing
            .output_files
            .values_mut()
            .for_each(|p| resolve(base, p));
        resolve(base, &mut self.initial_conditions.ctd_in);
        resolve(base, &mut self.initial_conditions.nutrients_in);
        resolve(base, &mut self.results.std_bio_ts_outfile);
        resolve(base, &mut self.results.std_phys_ts_outfile);
        if let Some(p) = self.results.std_chem_ts_outfile.as_mut() {
            resolve(base, p);
        }
        resolve(base, &mut self.logging.bloom_date_log);
        resolve(base, &mut self.logging.data_date_file);
    }

    /// Number of model time steps per day.
    pub fn steps_per_day(&self) -> usize {
        (86_400 / self.sog_timestep_s.max(1)) as usize
    }
}

fn resolve(base: &Path, path: &mut PathBuf) {
    if path.is_relative() {
        *path = base.join(&*path);
    }
}

fn default_true() -> bool {
    true
}

fn default_sog_timestep_s() -> u32 {
    900
}

fn default_max_concurrent_jobs() -> usize {
    32
}

fn default_member_timeout_s() -> u64 {
    7200
}

fn default_work_dir() -> PathBuf {
    PathBuf::from("ensemble")
}

fn default_warn_gap_days() -> usize {
    bc_forcing::DEFAULT_WARN_GAP_DAYS
}

fn default_meteo_station_id() -> String {
    "889".to_string()
}

fn default_bloom_date_log() -> PathBuf {
    PathBuf::from("bloom_date_evolution.jsonl")
}

fn default_data_date_file() -> PathBuf {
    PathBuf::from("data_date.json")
}

fn default_nitrate_half_saturation() -> f64 {
    0.5
}

fn default_peak_window_days() -> usize {
    4
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
sog_executable: SOG
run_start_date: 2011-09-19
run_end_date: 2012-07-31
ensemble:
  base_infile: infile.yaml
  start_year: 1981
  end_year: 2010
  forcing_data_file_roots:
    wind: Sandheads_wind
forcing:
  output_files:
    wind: Sandheads_wind
initial_conditions:
  ctd_in: ctd.txt
  nutrients_in: nuts.txt
results:
  std_bio_ts_outfile: std_bio.out
  std_phys_ts_outfile: std_phys.out
"#;

    #[test]
    fn defaults_are_applied() {
        let config: BloomcastConfig = serde_yaml::from_str(MINIMAL).unwrap();
        assert!(config.get_forcing_data);
        assert!(config.run_sog);
        assert_eq!(config.sog_timestep_s, 900);
        assert_eq!(config.steps_per_day(), 96);
        assert_eq!(config.ensemble.max_concurrent_jobs, 32);
        assert_eq!(config.ensemble.member_timeout_s, 7200);
        assert_eq!(config.forcing.max_gap_days, None);
        assert_eq!(config.forcing.warn_gap_days, 11);
        assert!(!config.logging.debug);
        assert_eq!(config.bloom.peak_window_days, 4);
    }

    #[test]
    fn forcing_kinds_key_the_maps() {
        let config: BloomcastConfig = serde_yaml::from_str(MINIMAL).unwrap();
        assert_eq!(
            config.ensemble.forcing_data_file_roots.get(&ForcingKind::Wind),
            Some(&PathBuf::from("Sandheads_wind"))
        );
    }

    #[test]
    fn relative_paths_resolve_against_base() {
        let mut config: BloomcastConfig = serde_yaml::from_str(MINIMAL).unwrap();
        let base = Path::new("/srv/bloomcast");
        config.resolve_paths(base);
        assert_eq!(config.sog_executable, PathBuf::from("SOG"));
        assert_eq!(config.ensemble.base_infile, base.join("infile.yaml"));
        assert_eq!(config.ensemble.work_dir, base.join("ensemble"));
        assert_eq!(
            config.forcing.output_files[&ForcingKind::Wind],
            base.join("Sandheads_wind")
        );
        assert_eq!(config.logging.bloom_date_log, base.join("bloom_date_evolution.jsonl"));
    }
}
