//! Member infile materialization.
//!
//! The base infile is a YAML mapping of sections; each setting is itself a
//! mapping with a `value` entry. A member infile is the base with a list of
//! dotted-key edits applied.

use std::fs;
use std::path::Path;

use bc_forcing::ForcingKind;
use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::error::{ModelError, ModelResult};
use crate::types::RunSpec;

/// Datetime layout the simulation reads.
const INFILE_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One replacement in the infile.
#[derive(Debug, Clone, PartialEq)]
pub struct InfileEdit {
    pub key: String,
    pub value: Value,
}

impl InfileEdit {
    fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    fn path(key: impl Into<String>, path: &Path) -> Self {
        Self::new(key, path.to_string_lossy().into_owned())
    }
}

fn archive_key(kind: ForcingKind) -> &'static str {
    match kind {
        ForcingKind::Wind => "forcing_data.avg_historical_wind_file.value",
        ForcingKind::AirTemperature => "forcing_data.avg_historical_air_temperature_file.value",
        ForcingKind::RelativeHumidity => "forcing_data.avg_historical_humidity_file.value",
        ForcingKind::CloudFraction => "forcing_data.avg_historical_cloud_file.value",
        ForcingKind::MajorRiver => "forcing_data.avg_historical_major_river_file.value",
        ForcingKind::MinorRiver => "forcing_data.avg_historical_minor_river_file.value",
    }
}

fn forcing_key(kind: ForcingKind) -> &'static str {
    match kind {
        ForcingKind::Wind => "forcing_data.wind_forcing_file.value",
        ForcingKind::AirTemperature => "forcing_data.air_temperature_forcing_file.value",
        ForcingKind::RelativeHumidity => "forcing_data.humidity_forcing_file.value",
        ForcingKind::CloudFraction => "forcing_data.cloud_fraction_forcing_file.value",
        ForcingKind::MajorRiver => "forcing_data.major_river_forcing_file.value",
        ForcingKind::MinorRiver => "forcing_data.minor_river_forcing_file.value",
    }
}

/// Edits turning the base infile into `spec`'s member infile.
pub fn infile_edits(spec: &RunSpec) -> Vec<InfileEdit> {
    let mut edits = vec![
        InfileEdit::new(
            "initial_conditions.init_datetime.value",
            spec.run_start.format(INFILE_DATETIME_FORMAT).to_string(),
        ),
        InfileEdit::new(
            "end_datetime.value",
            spec.run_end.format(INFILE_DATETIME_FORMAT).to_string(),
        ),
        InfileEdit::path(
            "initial_conditions.CTD_file.value",
            &spec.initial_conditions.ctd_in,
        ),
        InfileEdit::path(
            "initial_conditions.nutrients_file.value",
            &spec.initial_conditions.nutrients_in,
        ),
        // Real data through the cutoff, then the member's historical year.
        InfileEdit::new("forcing_data.use_average_forcing_data.value", "histfill"),
    ];
    for (kind, path) in &spec.forcing_files {
        edits.push(InfileEdit::path(forcing_key(*kind), path));
    }
    for (kind, path) in &spec.archive_files {
        edits.push(InfileEdit::path(archive_key(*kind), path));
    }
    edits.push(InfileEdit::path(
        "timeseries_results.std_biology.value",
        &spec.outputs.std_bio_ts,
    ));
    edits.push(InfileEdit::path(
        "timeseries_results.std_physics.value",
        &spec.outputs.std_phys_ts,
    ));
    if let Some(chem) = &spec.outputs.std_chem_ts {
        edits.push(InfileEdit::path("timeseries_results.std_chemistry.value", chem));
    }
    edits
}

/// Read and parse a base infile, which must be a YAML mapping.
pub fn load_base_infile(path: &Path) -> ModelResult<Mapping> {
    let content = fs::read_to_string(path).map_err(|e| ModelError::io(path, e))?;
    match serde_yaml::from_str::<Value>(&content)? {
        Value::Mapping(mapping) => Ok(mapping),
        _ => Err(ModelError::InfileNotMapping {
            path: path.to_path_buf(),
        }),
    }
}

/// Set the value at a dotted key, creating intermediate mappings.
pub fn apply_edit(root: &mut Mapping, edit: &InfileEdit) -> ModelResult<()> {
    let mut parts = edit.key.split('.').peekable();
    let mut current = root;
    while let Some(part) = parts.next() {
        let key = Value::String(part.to_string());
        if parts.peek().is_none() {
            current.insert(key, edit.value.clone());
            return Ok(());
        }
        let next = current
            .entry(key)
            .or_insert_with(|| Value::Mapping(Mapping::new()));
        current = match next {
            Value::Mapping(m) => m,
            other => {
                return Err(ModelError::InfileKey {
                    key: edit.key.clone(),
                    reason: format!("'{part}' holds a {} not a mapping", value_kind(other)),
                });
            }
        };
    }
    Err(ModelError::InfileKey {
        key: edit.key.clone(),
        reason: "empty key".to_string(),
    })
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

/// Write `spec`'s member infile.
pub fn materialize_infile(spec: &RunSpec) -> ModelResult<()> {
    let mut infile = load_base_infile(&spec.base_infile)?;
    for edit in infile_edits(spec) {
        apply_edit(&mut infile, &edit)?;
    }
    if let Some(parent) = spec.member_infile.parent() {
        fs::create_dir_all(parent).map_err(|e| ModelError::io(parent, e))?;
    }
    let content = serde_yaml::to_string(&Value::Mapping(infile))?;
    fs::write(&spec.member_infile, content).map_err(|e| ModelError::io(&spec.member_infile, e))?;
    debug!("Wrote member {} infile {}", spec.member, spec.member_infile.display());
    Ok(())
}
