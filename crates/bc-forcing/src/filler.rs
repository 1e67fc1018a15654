//! Gap filling of daily forcing series.

use std::fmt;
use std::sync::Arc;

use bc_core::lerp_step;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ForcingResult;
use crate::gaps::{ForcingGap, find_gaps};
use crate::policy::{FillAction, GapPosition, fill_action};
use crate::quantity::ForcingKind;
use crate::series::{ForcingSeries, ForcingValue};
use crate::wind::{StraitComponentInterpolation, WindGapStrategy};

/// Default length above which a filled interior gap is logged at warn level.
pub const DEFAULT_WARN_GAP_DAYS: usize = 11;

/// How a missing day was filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchMethod {
    HoldLastValue,
    Linear,
    Wind,
}

impl fmt::Display for PatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::HoldLastValue => "hold last value",
            Self::Linear => "linear",
            Self::Wind => "wind",
        };
        f.write_str(s)
    }
}

/// Audit record for one filled day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchRecord {
    pub kind: ForcingKind,
    pub date: NaiveDate,
    pub method: PatchMethod,
}

/// Whether the forecast uses fresh data or re-runs an earlier cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutoffNotice {
    #[default]
    Fresh,
    /// Wind data lagged by one day; the cutoff moved one day earlier.
    UpdatedEstimate,
}

/// Why a series could not be filled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// Most recent wind day is missing.
    NoWindData { date: NaiveDate },
    /// Gap has no valid value before it.
    NoPriorValue { kind: ForcingKind, date: NaiveDate },
    /// Gap is longer than the configured maximum.
    GapTooLong {
        kind: ForcingKind,
        start: NaiveDate,
        days: usize,
        max_days: usize,
    },
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoWindData { date } => write!(f, "no wind data for {date}"),
            Self::NoPriorValue { kind, date } => {
                write!(f, "no valid {kind} value before missing day {date}")
            }
            Self::GapTooLong {
                kind,
                start,
                days,
                max_days,
            } => write!(
                f,
                "{kind} gap of {days} days from {start} exceeds maximum of {max_days}"
            ),
        }
    }
}

/// A series with every day through the cutoff present.
#[derive(Debug, Clone, PartialEq)]
pub struct FilledSeries {
    pub kind: ForcingKind,
    pub start: NaiveDate,
    pub values: Vec<ForcingValue>,
    /// Last day of real or filled data.
    pub cutoff: NaiveDate,
    pub notice: CutoffNotice,
    pub patches: Vec<PatchRecord>,
}

impl FilledSeries {
    pub fn date_at(&self, index: usize) -> NaiveDate {
        self.start + Days::new(index as u64)
    }

    /// Dated values in order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, ForcingValue)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(i, v)| (self.date_at(i), *v))
    }

    pub fn get(&self, date: NaiveDate) -> Option<ForcingValue> {
        let offset = (date - self.start).num_days();
        if offset < 0 {
            return None;
        }
        self.values.get(offset as usize).copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FillOutcome {
    Filled(FilledSeries),
    Aborted(AbortReason),
}

/// State carried over from the previous invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillContext {
    /// Most recent day that was missing when the previous invocation aborted.
    pub previous_missing_day: Option<NaiveDate>,
}

/// Repairs missing days according to the policy table.
#[derive(Debug, Clone)]
pub struct GapFiller {
    max_gap_days: Option<usize>,
    warn_gap_days: usize,
    wind_strategy: Arc<dyn WindGapStrategy>,
}

impl Default for GapFiller {
    fn default() -> Self {
        Self {
            max_gap_days: None,
            warn_gap_days: DEFAULT_WARN_GAP_DAYS,
            wind_strategy: Arc::new(StraitComponentInterpolation),
        }
    }
}

impl GapFiller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_gap_days(mut self, max_gap_days: Option<usize>) -> Self {
        self.max_gap_days = max_gap_days;
        self
    }

    pub fn with_warn_gap_days(mut self, warn_gap_days: usize) -> Self {
        self.warn_gap_days = warn_gap_days;
        self
    }

    pub fn with_wind_strategy(mut self, strategy: Arc<dyn WindGapStrategy>) -> Self {
        self.wind_strategy = strategy;
        self
    }

    pub fn wind_strategy(&self) -> &dyn WindGapStrategy {
        self.wind_strategy.as_ref()
    }

    /// Fill `series` so every day up to `through - 1` is present.
    ///
    /// The series is padded or truncated to end on `through - 1`, the most
    /// recent required day. The trailing gap is classified before any
    /// interior gap.
    pub fn fill(
        &self,
        series: &ForcingSeries,
        through: NaiveDate,
        ctx: FillContext,
    ) -> ForcingResult<FillOutcome> {
        let kind = series.kind();
        let most_recent = through - Days::new(1);
        let mut series = series.span_to(most_recent)?;
        let mut cutoff = most_recent;
        let mut notice = CutoffNotice::Fresh;

        let mut gaps = find_gaps(&series);
        let trailing = gaps
            .last()
            .filter(|g| g.last == series.len() - 1)
            .cloned();

        let mut values: Vec<Option<ForcingValue>> = series.values().to_vec();
        let mut patches = Vec::new();

        if let Some(gap) = trailing {
            gaps.pop();
            let position = if gap.len() == 1
                && ctx
                    .previous_missing_day
                    .is_some_and(|d| d + Days::new(1) == most_recent)
            {
                GapPosition::MostRecentAfterLag
            } else {
                GapPosition::MostRecent
            };
            match fill_action(position, kind) {
                FillAction::RecoverLag => {
                    cutoff = most_recent - Days::new(1);
                    notice = CutoffNotice::UpdatedEstimate;
                    info!(
                        "{} data lagging by one day; using cutoff {} as an updated estimate",
                        kind, cutoff
                    );
                    series = series.span_to(cutoff)?;
                    values.truncate(series.len());
                }
                FillAction::HoldLastValue => {
                    if let Some(reason) = self.check_gap(kind, &gap) {
                        return Ok(FillOutcome::Aborted(reason));
                    }
                    let Some(before) = gap.before else {
                        return Ok(FillOutcome::Aborted(AbortReason::NoPriorValue {
                            kind,
                            date: gap.start,
                        }));
                    };
                    for i in gap.first..=gap.last {
                        values[i] = Some(before.value);
                        let date = series.date_at(i);
                        debug!("Patched missing {} data for {} by holding last value", kind, date);
                        patches.push(PatchRecord {
                            kind,
                            date,
                            method: PatchMethod::HoldLastValue,
                        });
                    }
                }
                _ => {
                    warn!("No {} data for {}", kind, most_recent);
                    return Ok(FillOutcome::Aborted(AbortReason::NoWindData {
                        date: most_recent,
                    }));
                }
            }
        }

        for gap in &gaps {
            let position = if gap.before.is_none() {
                GapPosition::Leading
            } else {
                GapPosition::Interior
            };
            if let Some(reason) = self.check_gap(kind, gap) {
                return Ok(FillOutcome::Aborted(reason));
            }
            let (Some(before), Some(after)) = (gap.before, gap.after) else {
                return Ok(FillOutcome::Aborted(AbortReason::NoPriorValue {
                    kind,
                    date: gap.start,
                }));
            };
            let method = match fill_action(position, kind) {
                FillAction::InterpolateWind => PatchMethod::Wind,
                FillAction::InterpolateLinear => PatchMethod::Linear,
                _ => {
                    return Ok(FillOutcome::Aborted(AbortReason::NoPriorValue {
                        kind,
                        date: gap.start,
                    }));
                }
            };
            if gap.len() > self.warn_gap_days {
                warn!(
                    "A {}-day gap in {} data starting {} has been filled by {} interpolation",
                    gap.len(),
                    kind,
                    gap.start,
                    method
                );
            }
            let steps = gap.len() + 1;
            for (step, i) in (gap.first..=gap.last).enumerate() {
                values[i] = self.interpolate(before.value, after.value, step + 1, steps);
                let date = series.date_at(i);
                debug!("Patched missing {} data for {} by {} interpolation", kind, date, method);
                patches.push(PatchRecord { kind, date, method });
            }
        }

        let values: Vec<ForcingValue> = values.into_iter().flatten().collect();
        debug_assert_eq!(values.len(), series.len());
        if !patches.is_empty() {
            info!("Patched {} missing {} days through {}", patches.len(), kind, cutoff);
        }

        Ok(FillOutcome::Filled(FilledSeries {
            kind,
            start: series.start(),
            values,
            cutoff,
            notice,
            patches,
        }))
    }

    fn check_gap(&self, kind: ForcingKind, gap: &ForcingGap) -> Option<AbortReason> {
        let max_days = self.max_gap_days?;
        (gap.len() > max_days).then(|| AbortReason::GapTooLong {
            kind,
            start: gap.start,
            days: gap.len(),
            max_days,
        })
    }

    fn interpolate(
        &self,
        before: ForcingValue,
        after: ForcingValue,
        step: usize,
        steps: usize,
    ) -> Option<ForcingValue> {
        match (before, after) {
            (ForcingValue::Wind { sample: b }, ForcingValue::Wind { sample: a }) => Some(
                ForcingValue::wind(self.wind_strategy.interpolate(b, a, step, steps)),
            ),
            (ForcingValue::Scalar { value: b }, ForcingValue::Scalar { value: a }) => {
                Some(ForcingValue::scalar(lerp_step(b, a, step, steps)))
            }
            _ => None,
        }
    }
}
