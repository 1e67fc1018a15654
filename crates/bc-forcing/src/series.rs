//! Daily forcing series with explicit missing days.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ForcingError, ForcingResult};
use crate::quantity::{ForcingKind, Observation};
use crate::wind::WindSample;

/// One day's value in a forcing series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ForcingValue {
    Scalar { value: f64 },
    Wind { sample: WindSample },
}

impl ForcingValue {
    pub fn scalar(value: f64) -> Self {
        Self::Scalar { value }
    }

    pub fn wind(sample: WindSample) -> Self {
        Self::Wind { sample }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar { value } => Some(*value),
            Self::Wind { .. } => None,
        }
    }

    pub fn as_wind(&self) -> Option<WindSample> {
        match self {
            Self::Wind { sample } => Some(*sample),
            Self::Scalar { .. } => None,
        }
    }

    /// Whether this value has the shape a `kind` series stores.
    pub fn fits(&self, kind: ForcingKind) -> bool {
        matches!(
            (self, kind.is_wind()),
            (Self::Wind { .. }, true) | (Self::Scalar { .. }, false)
        )
    }
}

/// Ordered daily values of one forcing kind from `start` through `end()`.
///
/// Every date in range has a slot; `None` marks a MISSING day. Dates are
/// implicit in the slot index, so duplicates cannot exist.
#[derive(Debug, Clone, PartialEq)]
pub struct ForcingSeries {
    kind: ForcingKind,
    start: NaiveDate,
    values: Vec<Option<ForcingValue>>,
}

impl ForcingSeries {
    pub fn new(
        kind: ForcingKind,
        start: NaiveDate,
        values: Vec<Option<ForcingValue>>,
    ) -> ForcingResult<Self> {
        if values.is_empty() {
            return Err(ForcingError::EmptyRange {
                kind,
                start,
                end: start,
            });
        }
        let series = Self {
            kind,
            start,
            values,
        };
        for (i, value) in series.values.iter().enumerate() {
            if let Some(v) = value
                && !v.fits(kind)
            {
                return Err(ForcingError::ValueShape {
                    kind,
                    date: series.date_at(i),
                });
            }
        }
        Ok(series)
    }

    /// Build a series spanning `start..=end` from raw observation records.
    ///
    /// Records outside the range are ignored. Two records of the same
    /// quantity on one date are an error. For wind, a day is present only
    /// when both speed and direction are; a zero speed with no direction is
    /// a calm day.
    pub fn from_observations(
        kind: ForcingKind,
        start: NaiveDate,
        end: NaiveDate,
        observations: &[Observation],
    ) -> ForcingResult<Self> {
        let span = (end - start).num_days();
        if span < 0 {
            return Err(ForcingError::EmptyRange { kind, start, end });
        }
        let len = span as usize + 1;

        let quantities = kind.quantities();
        let mut slots: Vec<Vec<Option<Option<f64>>>> = vec![vec![None; len]; quantities.len()];
        let mut skipped = 0usize;

        for obs in observations {
            let Some(q) = quantities.iter().position(|q| *q == obs.kind) else {
                return Err(ForcingError::WrongQuantity {
                    kind,
                    found: obs.kind,
                });
            };
            if obs.unit != obs.kind.unit() {
                return Err(ForcingError::UnitMismatch {
                    kind: obs.kind,
                    expected: obs.kind.unit(),
                    found: obs.unit,
                });
            }
            let date = obs.timestamp.date();
            if let Some(v) = obs.value
                && !v.is_finite()
            {
                return Err(ForcingError::NonFinite {
                    kind: obs.kind,
                    date,
                });
            }
            let offset = (date - start).num_days();
            if offset < 0 || offset as usize >= len {
                skipped += 1;
                continue;
            }
            let slot = &mut slots[q][offset as usize];
            if slot.is_some() {
                return Err(ForcingError::DuplicateDate {
                    kind: obs.kind,
                    date,
                });
            }
            *slot = Some(obs.value);
        }
        if skipped > 0 {
            debug!("{} {} observations outside {} to {} ignored", skipped, kind, start, end);
        }

        let values = if kind.is_wind() {
            slots[0]
                .iter()
                .zip(&slots[1])
                .map(|(speed, direction)| pair_wind(speed.flatten(), direction.flatten()))
                .collect()
        } else {
            slots[0]
                .iter()
                .map(|v| v.flatten().map(ForcingValue::scalar))
                .collect()
        };

        Ok(Self {
            kind,
            start,
            values,
        })
    }

    pub fn kind(&self) -> ForcingKind {
        self.kind
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last date covered by the series.
    pub fn end(&self) -> NaiveDate {
        self.date_at(self.values.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Option<ForcingValue>] {
        &self.values
    }

    pub fn date_at(&self, index: usize) -> NaiveDate {
        self.start + Days::new(index as u64)
    }

    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        let offset = (date - self.start).num_days();
        if offset < 0 || offset as usize >= self.values.len() {
            None
        } else {
            Some(offset as usize)
        }
    }

    /// Value on `date`; `None` if missing or out of range.
    pub fn get(&self, date: NaiveDate) -> Option<ForcingValue> {
        self.index_of(date).and_then(|i| self.values[i])
    }

    pub fn is_missing(&self, date: NaiveDate) -> bool {
        self.get(date).is_none()
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    /// Copy of the series ending at `end`, truncated or padded with missing days.
    pub fn span_to(&self, end: NaiveDate) -> ForcingResult<Self> {
        let span = (end - self.start).num_days();
        if span < 0 {
            return Err(ForcingError::EmptyRange {
                kind: self.kind,
                start: self.start,
                end,
            });
        }
        let mut values = self.values.clone();
        values.resize(span as usize + 1, None);
        Ok(Self {
            kind: self.kind,
            start: self.start,
            values,
        })
    }
}

fn pair_wind(speed: Option<f64>, direction: Option<f64>) -> Option<ForcingValue> {
    match (speed, direction) {
        (Some(speed), Some(direction)) => Some(ForcingValue::wind(WindSample::new(speed, direction))),
        (Some(speed), None) if speed == 0.0 => Some(ForcingValue::wind(WindSample::calm())),
        _ => None,
    }
}

/// Convenience for tests and callers holding plain daily values.
pub fn scalar_series(
    kind: ForcingKind,
    start: NaiveDate,
    values: &[Option<f64>],
) -> ForcingResult<ForcingSeries> {
    ForcingSeries::new(
        kind,
        start,
        values.iter().map(|v| v.map(ForcingValue::scalar)).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::{QuantityKind, Unit};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn obs(d: u32, kind: QuantityKind, value: Option<f64>) -> Observation {
        Observation::new(day(d).and_hms_opt(12, 0, 0).unwrap(), kind, value)
    }

    #[test]
    fn absent_dates_are_missing() {
        let observations = vec![
            obs(1, QuantityKind::AirTemperature, Some(5.0)),
            obs(3, QuantityKind::AirTemperature, Some(7.0)),
        ];
        let series =
            ForcingSeries::from_observations(ForcingKind::AirTemperature, day(1), day(4), &observations)
                .unwrap();
        assert_eq!(series.len(), 4);
        assert!(series.is_missing(day(2)));
        assert!(series.is_missing(day(4)));
        assert_eq!(series.get(day(3)).and_then(|v| v.as_scalar()), Some(7.0));
        assert_eq!(series.missing_count(), 2);
        assert_eq!(series.end(), day(4));
    }

    #[test]
    fn duplicate_dates_are_rejected() {
        let observations = vec![
            obs(1, QuantityKind::MajorRiverDischarge, Some(500.0)),
            obs(1, QuantityKind::MajorRiverDischarge, Some(510.0)),
        ];
        let err =
            ForcingSeries::from_observations(ForcingKind::MajorRiver, day(1), day(2), &observations)
                .unwrap_err();
        assert!(matches!(err, ForcingError::DuplicateDate { .. }));
    }

    #[test]
    fn wrong_unit_is_rejected() {
        let mut o = obs(1, QuantityKind::RelativeHumidity, Some(80.0));
        o.unit = Unit::DegreesCelsius;
        let err = ForcingSeries::from_observations(ForcingKind::RelativeHumidity, day(1), day(1), &[o])
            .unwrap_err();
        assert!(matches!(err, ForcingError::UnitMismatch { .. }));
    }

    #[test]
    fn wind_needs_both_components() {
        let observations = vec![
            obs(1, QuantityKind::WindSpeed, Some(20.0)),
            obs(1, QuantityKind::WindDirection, Some(27.0)),
            obs(2, QuantityKind::WindSpeed, Some(15.0)),
            obs(3, QuantityKind::WindSpeed, Some(0.0)),
        ];
        let series = ForcingSeries::from_observations(ForcingKind::Wind, day(1), day(3), &observations)
            .unwrap();
        assert_eq!(
            series.get(day(1)).and_then(|v| v.as_wind()),
            Some(WindSample::new(20.0, 27.0))
        );
        assert!(series.is_missing(day(2)));
        assert_eq!(
            series.get(day(3)).and_then(|v| v.as_wind()),
            Some(WindSample::calm())
        );
    }

    #[test]
    fn reported_but_empty_records_are_missing() {
        let observations = vec![obs(1, QuantityKind::CloudFraction, None)];
        let series =
            ForcingSeries::from_observations(ForcingKind::CloudFraction, day(1), day(1), &observations)
                .unwrap();
        assert!(series.is_missing(day(1)));
    }

    #[test]
    fn span_to_pads_and_truncates() {
        let series = scalar_series(ForcingKind::AirTemperature, day(1), &[Some(1.0), Some(2.0)]).unwrap();
        let padded = series.span_to(day(4)).unwrap();
        assert_eq!(padded.len(), 4);
        assert!(padded.is_missing(day(4)));
        let truncated = series.span_to(day(1)).unwrap();
        assert_eq!(truncated.len(), 1);
        assert!(series.span_to(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()).is_err());
    }

    #[test]
    fn mismatched_value_shape_is_rejected() {
        let err = ForcingSeries::new(
            ForcingKind::Wind,
            day(1),
            vec![Some(ForcingValue::scalar(1.0))],
        )
        .unwrap_err();
        assert!(matches!(err, ForcingError::ValueShape { .. }));
    }
}
