//! Configuration validation logic.

use bc_core::MemberYear;
use bc_forcing::ForcingKind;

use crate::schema::BloomcastConfig;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing {kind} entry in {field}")]
    MissingEntry { field: String, kind: ForcingKind },
}

pub fn validate_config(config: &BloomcastConfig) -> Result<(), ValidationError> {
    if config.run_start_date > config.run_end_date {
        return Err(ValidationError::InvalidValue {
            field: "run_start_date".to_string(),
            value: config.run_start_date.to_string(),
            reason: format!("after run_end_date {}", config.run_end_date),
        });
    }

    if config.sog_timestep_s == 0 || 86_400 % config.sog_timestep_s != 0 {
        return Err(ValidationError::InvalidValue {
            field: "sog_timestep_s".to_string(),
            value: config.sog_timestep_s.to_string(),
            reason: "must be a non-zero divisor of 86400".to_string(),
        });
    }

    let ensemble = &config.ensemble;
    for (field, year) in [
        ("ensemble.start_year", ensemble.start_year),
        ("ensemble.end_year", ensemble.end_year),
    ] {
        if MemberYear::new(year).is_err() {
            return Err(ValidationError::InvalidValue {
                field: field.to_string(),
                value: year.to_string(),
                reason: "not a four digit year".to_string(),
            });
        }
    }
    if ensemble.start_year > ensemble.end_year {
        return Err(ValidationError::InvalidValue {
            field: "ensemble.start_year".to_string(),
            value: ensemble.start_year.to_string(),
            reason: format!("after end_year {}", ensemble.end_year),
        });
    }

    if ensemble.max_concurrent_jobs == 0 {
        return Err(ValidationError::InvalidValue {
            field: "ensemble.max_concurrent_jobs".to_string(),
            value: "0".to_string(),
            reason: "at least one job must be allowed".to_string(),
        });
    }

    if ensemble.member_timeout_s == 0 {
        return Err(ValidationError::InvalidValue {
            field: "ensemble.member_timeout_s".to_string(),
            value: "0".to_string(),
            reason: "must be positive".to_string(),
        });
    }

    for kind in ForcingKind::ALL {
        if !ensemble.forcing_data_file_roots.contains_key(&kind) {
            return Err(ValidationError::MissingEntry {
                field: "ensemble.forcing_data_file_roots".to_string(),
                kind,
            });
        }
        if !config.forcing.output_files.contains_key(&kind) {
            return Err(ValidationError::MissingEntry {
                field: "forcing.output_files".to_string(),
                kind,
            });
        }
    }

    if config.forcing.max_gap_days == Some(0) {
        return Err(ValidationError::InvalidValue {
            field: "forcing.max_gap_days".to_string(),
            value: "0".to_string(),
            reason: "omit the field for no limit".to_string(),
        });
    }

    let bloom = &config.bloom;
    if !bloom.nitrate_half_saturation.is_finite() || bloom.nitrate_half_saturation < 0.0 {
        return Err(ValidationError::InvalidValue {
            field: "bloom.nitrate_half_saturation".to_string(),
            value: bloom.nitrate_half_saturation.to_string(),
            reason: "must be a finite non-negative concentration".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::*;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn config() -> BloomcastConfig {
        let all = |prefix: &str| -> BTreeMap<ForcingKind, PathBuf> {
            ForcingKind::ALL
                .into_iter()
                .map(|k| (k, PathBuf::from(format!("{prefix}/{k}"))))
                .collect()
        };
        BloomcastConfig {
            get_forcing_data: true,
            run_sog: true,
            sog_executable: PathBuf::from("SOG"),
            sog_timestep_s: 900,
            run_start_date: NaiveDate::from_ymd_opt(2011, 9, 19).unwrap(),
            run_end_date: NaiveDate::from_ymd_opt(2012, 7, 31).unwrap(),
            ensemble: EnsembleDef {
                base_infile: PathBuf::from("infile.yaml"),
                start_year: 1981,
                end_year: 2010,
                max_concurrent_jobs: 4,
                member_timeout_s: 600,
                work_dir: PathBuf::from("ensemble"),
                forcing_data_file_roots: all("archive"),
            },
            forcing: ForcingDef {
                output_files: all("forcing"),
                max_gap_days: None,
                warn_gap_days: 11,
                meteo_station_id: "889".to_string(),
            },
            initial_conditions: InitialConditionsDef {
                ctd_in: PathBuf::from("ctd.txt"),
                nutrients_in: PathBuf::from("nuts.txt"),
            },
            results: ResultsDef {
                std_bio_ts_outfile: PathBuf::from("std_bio.out"),
                std_phys_ts_outfile: PathBuf::from("std_phys.out"),
                std_chem_ts_outfile: None,
            },
            logging: LoggingDef::default(),
            bloom: BloomDef::default(),
        }
    }

    #[test]
    fn valid_config_passes() {
        validate_config(&config()).unwrap();
    }

    #[test]
    fn reversed_year_range_is_rejected() {
        let mut c = config();
        c.ensemble.start_year = 2011;
        c.ensemble.end_year = 2010;
        let err = validate_config(&c).unwrap_err();
        assert!(err.to_string().contains("start_year"));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let mut c = config();
        c.ensemble.max_concurrent_jobs = 0;
        assert!(validate_config(&c).is_err());
    }

    #[test]
    fn bad_timestep_is_rejected() {
        let mut c = config();
        c.sog_timestep_s = 0;
        assert!(validate_config(&c).is_err());
        c.sog_timestep_s = 7;
        assert!(validate_config(&c).is_err());
    }

    #[test]
    fn start_after_end_is_rejected() {
        let mut c = config();
        c.run_start_date = NaiveDate::from_ymd_opt(2013, 1, 1).unwrap();
        assert!(validate_config(&c).is_err());
    }

    #[test]
    fn missing_archive_root_is_rejected() {
        let mut c = config();
        c.ensemble
            .forcing_data_file_roots
            .remove(&ForcingKind::MinorRiver);
        let err = validate_config(&c).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::MissingEntry {
                kind: ForcingKind::MinorRiver,
                ..
            }
        ));
    }

    #[test]
    fn two_digit_year_is_rejected() {
        let mut c = config();
        c.ensemble.start_year = 81;
        assert!(validate_config(&c).is_err());
    }
}
