//! Forcing data model and gap filling.
//!
//! Raw observations are assembled into daily [`ForcingSeries`], gaps are
//! located and repaired by [`GapFiller`] according to the policy table in
//! [`policy`], and the filled series are written in the simulation's file
//! formats.

pub mod error;
pub mod filler;
pub mod format;
pub mod gaps;
pub mod policy;
pub mod quantity;
pub mod series;
pub mod wind;

pub use error::{ForcingError, ForcingResult};
pub use filler::{
    AbortReason, CutoffNotice, DEFAULT_WARN_GAP_DAYS, FillContext, FillOutcome, FilledSeries,
    GapFiller, PatchMethod, PatchRecord,
};
pub use format::{exponent_notation, write_series, write_series_file};
pub use gaps::{Anchor, ForcingGap, find_gaps};
pub use policy::{FillAction, GapPosition, fill_action};
pub use quantity::{ForcingKind, Observation, QuantityKind, Unit};
pub use series::{ForcingSeries, ForcingValue, scalar_series};
pub use wind::{
    StraitComponentInterpolation, StraitComponents, WindGapStrategy, WindSample,
    from_strait_components, to_strait_components,
};
