//! Writers for the simulation's forcing file formats.
//!
//! - wind: 24 hourly lines per day, `DD MM YYYY HH.H cross along`
//! - rivers: `YYYY MM DD flow` with flow in exponent notation
//! - meteorology: `station YYYY MM DD 42` followed by 24 hourly values

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{ForcingError, ForcingResult};
use crate::filler::FilledSeries;
use crate::quantity::ForcingKind;
use crate::series::ForcingValue;
use crate::wind::to_strait_components;

const HOURS_PER_DAY: u32 = 24;

/// Quantity id column of meteorological lines; ignored by the model.
const METEO_QUANTITY_ID: u32 = 42;

/// Write `series` in its kind's format.
pub fn write_series<W: Write>(
    series: &FilledSeries,
    station_id: &str,
    out: &mut W,
) -> ForcingResult<()> {
    let kind = series.kind;
    let io_err = |e: std::io::Error| ForcingError::Write {
        kind,
        message: e.to_string(),
    };
    for (date, value) in series.iter() {
        let Some(line) = format_day(kind, station_id, date, value) else {
            return Err(ForcingError::ValueShape { kind, date });
        };
        out.write_all(line.as_bytes()).map_err(io_err)?;
    }
    out.flush().map_err(io_err)
}

/// Write `series` to `path`, creating parent directories as needed.
pub fn write_series_file(
    series: &FilledSeries,
    station_id: &str,
    path: &Path,
) -> ForcingResult<()> {
    let kind = series.kind;
    let io_err = |e: std::io::Error| ForcingError::Write {
        kind,
        message: format!("{}: {e}", path.display()),
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let mut out = BufWriter::new(File::create(path).map_err(io_err)?);
    write_series(series, station_id, &mut out)?;
    debug!(
        "Wrote {} {} days through {} to {}",
        series.values.len(),
        kind,
        series.cutoff,
        path.display()
    );
    Ok(())
}

fn format_day(
    kind: ForcingKind,
    station_id: &str,
    date: NaiveDate,
    value: ForcingValue,
) -> Option<String> {
    match kind {
        ForcingKind::Wind => {
            let c = to_strait_components(value.as_wind()?);
            let stamp = date.format("%d %m %Y");
            Some(
                (0..HOURS_PER_DAY)
                    .map(|h| format!("{stamp} {:.1} {:.6} {:.6}\n", f64::from(h), c.cross, c.along))
                    .collect(),
            )
        }
        ForcingKind::MajorRiver | ForcingKind::MinorRiver => Some(format!(
            "{} {}\n",
            date.format("%Y %m %d"),
            exponent_notation(value.as_scalar()?)
        )),
        ForcingKind::AirTemperature | ForcingKind::RelativeHumidity | ForcingKind::CloudFraction => {
            let v = value.as_scalar()?;
            // Air temperature is written in tenths of a degree.
            let v = if kind == ForcingKind::AirTemperature {
                v * 10.0
            } else {
                v
            };
            let mut line = format!(
                "{station_id} {} {METEO_QUANTITY_ID}",
                date.format("%Y %m %d")
            );
            for _ in 0..HOURS_PER_DAY {
                line.push_str(&format!(" {v:.2}"));
            }
            line.push('\n');
            Some(line)
        }
    }
}

/// `d.dddddde+XX` with a signed, at least two digit exponent.
pub fn exponent_notation(v: f64) -> String {
    let s = format!("{v:.6e}");
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exp),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => s,
    }
}
