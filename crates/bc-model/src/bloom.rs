//! Spring bloom date detection.
//!
//! The bloom is the peak of daily maximum micro phytoplankton biomass
//! within a window around the first two consecutive days on which the
//! daily minimum nitrate concentration is at or below half saturation.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::error::{ModelError, ModelResult};
use crate::output::TimeseriesTable;
use crate::types::BloomPrediction;

pub const TIME_FIELD: &str = "time";
pub const NITRATE_FIELD: &str = "3 m avg nitrate concentration";
pub const DIATOMS_FIELD: &str = "3 m avg micro phytoplankton biomass";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloomCriteria {
    /// uM N
    pub nitrate_half_saturation: f64,
    pub peak_window_days: usize,
    /// Model output rows per day.
    pub steps_per_day: usize,
}

impl Default for BloomCriteria {
    fn default() -> Self {
        Self {
            nitrate_half_saturation: 0.5,
            peak_window_days: 4,
            steps_per_day: 96,
        }
    }
}

/// 1 January of the year after the run starts.
pub fn bloom_year_start(run_start: NaiveDateTime) -> ModelResult<NaiveDate> {
    NaiveDate::from_ymd_opt(run_start.year() + 1, 1, 1).ok_or_else(|| ModelError::NoBloom {
        detail: format!("no 1 January following {run_start}"),
    })
}

pub fn detect_bloom(
    table: &TimeseriesTable,
    run_start: NaiveDateTime,
    criteria: &BloomCriteria,
) -> ModelResult<BloomPrediction> {
    let jan1 = bloom_year_start(run_start)?;
    let time = table.column(TIME_FIELD)?;
    let nitrate = table.column(NITRATE_FIELD)?;
    let diatoms = table.column(DIATOMS_FIELD)?;

    // Hours are counted from the run start.
    let discard_hours = (jan1.and_time(chrono::NaiveTime::MIN) - run_start).num_seconds() as f64 / 3600.0;
    let first = time.iter().position(|t| *t >= discard_hours).unwrap_or(time.len());

    let daily_nitrate = daily(&nitrate[first..], criteria.steps_per_day, f64::min);
    let daily_diatoms = daily(&diatoms[first..], criteria.steps_per_day, f64::max);
    if daily_nitrate.len() < 2 {
        return Err(ModelError::NoBloom {
            detail: format!("fewer than two days of output after {jan1}"),
        });
    }

    let threshold = criteria.nitrate_half_saturation;
    let low = daily_nitrate
        .windows(2)
        .position(|pair| pair[0] <= threshold && pair[1] <= threshold)
        .ok_or_else(|| ModelError::NoBloom {
            detail: format!("nitrate never at or below {threshold} uM N for two consecutive days"),
        })?;
    debug!(
        "First low nitrate days are {} and {}",
        jan1 + Days::new(low as u64),
        jan1 + Days::new(low as u64 + 1)
    );

    let start = low.saturating_sub(criteria.peak_window_days);
    let end = (low + 1 + criteria.peak_window_days).min(daily_diatoms.len() - 1);
    let (offset, biomass) = daily_diatoms[start..=end]
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
        .ok_or_else(|| ModelError::NoBloom {
            detail: "empty bloom window".to_string(),
        })?;

    let date = jan1 + Days::new((start + offset) as u64);
    if !biomass.is_finite() {
        return Err(ModelError::Timeseries {
            detail: format!("non-finite biomass {biomass} on {date}"),
        });
    }
    Ok(BloomPrediction { date, biomass })
}

/// Reduce samples to one value per complete day.
fn daily(values: &[f64], steps_per_day: usize, reduce: fn(f64, f64) -> f64) -> Vec<f64> {
    values
        .chunks_exact(steps_per_day.max(1))
        .filter_map(|day| day.iter().copied().reduce(reduce))
        .collect()
}

#[cfg(test)]
pub(crate) mod synthetic {
    use super::*;

    /// Timeseries text with one row per hour, time 0 at the run start.
    ///
    /// Nitrate drops below 0.5 uM on `low_day` days after 1 January and
    /// biomass peaks on `peak_day`.
    pub fn bio_output(run_start: NaiveDateTime, low_day: usize, peak_day: usize, days: usize) -> String {
        let jan1 = bloom_year_start(run_start).unwrap().and_time(chrono::NaiveTime::MIN);
        let lead_hours = (jan1 - run_start).num_hours() as usize;
        let mut text = String::from(
            "*FieldNames: time, 3 m avg nitrate concentration, 3 m avg micro phytoplankton biomass\n\
             *FieldUnits: hr, uM N, uM N\n\
             *EndOfHeader\n",
        );
        for h in 0..lead_hours + days * 24 {
            let day = h.checked_sub(lead_hours).map(|d| d / 24);
            let nitrate = match day {
                Some(d) if d >= low_day => 0.1,
                _ => 20.0,
            };
            let biomass = match day {
                Some(d) => 10.0 - (d as f64 - peak_day as f64).abs() * 0.5,
                None => 0.5,
            };
            text.push_str(&format!("{h}.0 {nitrate} {biomass}\n"));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::parse_timeseries;
    use proptest::prelude::*;

    fn run_start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2011, 12, 20)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn hourly() -> BloomCriteria {
        BloomCriteria {
            steps_per_day: 24,
            ..BloomCriteria::default()
        }
    }

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2012, m, d).unwrap()
    }

    #[test]
    fn peak_inside_window_is_the_bloom() {
        let text = synthetic::bio_output(run_start(), 70, 72, 120);
        let table = parse_timeseries(&text).unwrap();
        let bloom = detect_bloom(&table, run_start(), &hourly()).unwrap();
        assert_eq!(bloom.date, date(1, 1) + Days::new(72));
        assert_eq!(bloom.biomass, 10.0);
    }

    #[test]
    fn peak_outside_window_is_clipped_to_window_edge() {
        // Biomass keeps rising towards day 100; the window ends at day 75.
        let text = synthetic::bio_output(run_start(), 70, 100, 120);
        let table = parse_timeseries(&text).unwrap();
        let bloom = detect_bloom(&table, run_start(), &hourly()).unwrap();
        assert_eq!(bloom.date, date(1, 1) + Days::new(75));
    }

    #[test]
    fn early_low_nitrate_window_starts_at_january_first() {
        let text = synthetic::bio_output(run_start(), 1, 0, 30);
        let table = parse_timeseries(&text).unwrap();
        let bloom = detect_bloom(&table, run_start(), &hourly()).unwrap();
        assert_eq!(bloom.date, date(1, 1));
    }

    #[test]
    fn no_nitrate_depletion_is_no_bloom() {
        let text = synthetic::bio_output(run_start(), 500, 10, 60);
        let table = parse_timeseries(&text).unwrap();
        let err = detect_bloom(&table, run_start(), &hourly()).unwrap_err();
        assert!(matches!(err, ModelError::NoBloom { .. }));
    }

    #[test]
    fn single_low_day_is_not_enough() {
        let mut text = String::from("*FieldNames: time, 3 m avg nitrate concentration, 3 m avg micro phytoplankton biomass\n*EndOfHeader\n");
        let start = NaiveDate::from_ymd_opt(2011, 12, 31).unwrap().and_hms_opt(0, 0, 0).unwrap();
        // Rows start on 1 January: high, low, high, high.
        for (h, n) in [(24.0, 5.0), (48.0, 0.2), (72.0, 5.0), (96.0, 5.0)] {
            text.push_str(&format!("{h} {n} 1.0\n"));
        }
        let table = parse_timeseries(&text).unwrap();
        let criteria = BloomCriteria {
            steps_per_day: 1,
            ..BloomCriteria::default()
        };
        assert!(detect_bloom(&table, start, &criteria).is_err());
    }

    #[test]
    fn ties_keep_the_earliest_day() {
        let mut text = String::from("*FieldNames: time, 3 m avg nitrate concentration, 3 m avg micro phytoplankton biomass\n*EndOfHeader\n");
        let start = NaiveDate::from_ymd_opt(2011, 12, 31).unwrap().and_hms_opt(0, 0, 0).unwrap();
        for (h, b) in [(24.0, 3.0), (48.0, 7.0), (72.0, 7.0), (96.0, 2.0)] {
            text.push_str(&format!("{h} 0.1 {b}\n"));
        }
        let table = parse_timeseries(&text).unwrap();
        let criteria = BloomCriteria {
            steps_per_day: 1,
            ..BloomCriteria::default()
        };
        let bloom = detect_bloom(&table, start, &criteria).unwrap();
        assert_eq!(bloom.date, date(1, 2));
        assert_eq!(bloom.biomass, 7.0);
    }

    #[test]
    fn non_finite_peak_biomass_is_an_error() {
        let start = NaiveDate::from_ymd_opt(2011, 12, 31).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let rows = [(24.0, 3.0), (48.0, f64::INFINITY), (72.0, 2.0)]
            .into_iter()
            .map(|(h, b)| vec![h, 0.1, b])
            .collect();
        let table = TimeseriesTable::from_rows(&[TIME_FIELD, NITRATE_FIELD, DIATOMS_FIELD], rows);
        let criteria = BloomCriteria {
            steps_per_day: 1,
            ..BloomCriteria::default()
        };
        let err = detect_bloom(&table, start, &criteria).unwrap_err();
        assert!(matches!(err, ModelError::Timeseries { .. }));
        assert!(err.to_string().contains("non-finite biomass"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn bloom_lies_within_window_of_low_nitrate(low in 0usize..60, peak in 0usize..80) {
            let text = synthetic::bio_output(run_start(), low, peak, 90);
            let table = parse_timeseries(&text).unwrap();
            let bloom = detect_bloom(&table, run_start(), &hourly()).unwrap();
            let day = (bloom.date - date(1, 1)).num_days() as usize;
            prop_assert!(day + 4 >= low);
            prop_assert!(day <= low + 5);
        }
    }
}
