//! bc-core: stable foundation for bloomcast.
//!
//! Contains:
//! - units (uom conversions for the wind transform)
//! - numeric (Real, comparison tolerances, interpolation helpers)
//! - ids (ensemble member years and their file suffixes)
//! - timing (member stopwatch and run totals)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod timing;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{BcError, BcResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
