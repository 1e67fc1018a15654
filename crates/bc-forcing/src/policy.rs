//! Missing-data policy table.
//!
//! Which repair applies to a gap depends only on where the gap sits
//! relative to the most recent required day and on whether the series is
//! wind. Keeping the lookup separate from the filling keeps it testable
//! without any data.

use std::fmt;

use crate::quantity::ForcingKind;

/// Where a gap sits in the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GapPosition {
    /// Series starts inside the gap; there is no prior valid value.
    Leading,
    /// Gap is bounded by valid values on both sides.
    Interior,
    /// Gap includes the most recent required day.
    MostRecent,
    /// Only the most recent day is missing, and the day before it was the
    /// missing most-recent day of the previous invocation.
    MostRecentAfterLag,
}

/// Repair chosen for a gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillAction {
    /// Refuse to fill; no run for this date.
    Abort,
    /// Repeat the last valid value through the end of the series.
    HoldLastValue,
    /// Linear interpolation between the bounding values.
    InterpolateLinear,
    /// Wind-specific interpolation strategy.
    InterpolateWind,
    /// Drop the missing day and move the cutoff one day earlier.
    RecoverLag,
}

impl fmt::Display for FillAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Abort => "abort",
            Self::HoldLastValue => "hold last value",
            Self::InterpolateLinear => "linear interpolation",
            Self::InterpolateWind => "wind interpolation",
            Self::RecoverLag => "lagging data recovery",
        };
        f.write_str(s)
    }
}

/// Policy lookup keyed by (gap position, forcing kind).
pub fn fill_action(position: GapPosition, kind: ForcingKind) -> FillAction {
    use FillAction::*;
    use GapPosition::*;

    match (position, kind.is_wind()) {
        (MostRecent, true) => Abort,
        (MostRecentAfterLag, true) => RecoverLag,
        (MostRecent | MostRecentAfterLag, false) => HoldLastValue,
        (Interior, true) => InterpolateWind,
        (Interior, false) => InterpolateLinear,
        (Leading, _) => Abort,
    }
}
