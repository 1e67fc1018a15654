//! Wind vector handling.
//!
//! Raw wind arrives as speed (km/h) and direction (tens of degrees, the
//! direction the wind blows from). The simulation wants cross- and
//! along-strait components in m/s with the oceanographic sign convention.
//! Gaps in wind data are filled in component space so that a wind swinging
//! through north is not averaged through south.

use bc_core::constants::{STRAIT_HEADING_DEG, WIND_DIRECTION_SCALE};
use bc_core::{as_deg, as_kmh, as_mps, as_rad, deg, kmh, lerp_step, mps, rad};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One day of wind as reported: speed in km/h, direction in tens of degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindSample {
    pub speed_kmh: f64,
    pub direction_tens_deg: f64,
}

impl WindSample {
    pub fn new(speed_kmh: f64, direction_tens_deg: f64) -> Self {
        Self {
            speed_kmh,
            direction_tens_deg,
        }
    }

    pub fn calm() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Strait-aligned wind components in m/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StraitComponents {
    pub cross: f64,
    pub along: f64,
}

/// Transform a reported wind sample into strait-aligned components.
///
/// Speed is converted to m/s, direction to degrees, the resulting u/v vector
/// is rotated onto the 305 degree strait axis, and both components are
/// negated so that positive values point the way the wind pushes the water.
pub fn to_strait_components(sample: WindSample) -> StraitComponents {
    let speed = as_mps(kmh(sample.speed_kmh));
    let theta = as_rad(deg(sample.direction_tens_deg * WIND_DIRECTION_SCALE));
    let u_wind = speed * theta.sin();
    let v_wind = speed * theta.cos();

    let heading = as_rad(deg(STRAIT_HEADING_DEG));
    let cross = u_wind * heading.cos() - v_wind * heading.sin();
    let along = u_wind * heading.sin() + v_wind * heading.cos();

    StraitComponents {
        cross: -cross,
        along: -along,
    }
}

/// Inverse of [`to_strait_components`].
///
/// Directions come back in `[0, 36)` tens of degrees; a calm wind reports
/// direction 0.
pub fn from_strait_components(components: StraitComponents) -> WindSample {
    let cross = -components.cross;
    let along = -components.along;

    let heading = as_rad(deg(STRAIT_HEADING_DEG));
    let u_wind = cross * heading.cos() + along * heading.sin();
    let v_wind = -cross * heading.sin() + along * heading.cos();

    let speed_mps = u_wind.hypot(v_wind);
    let mut direction_deg = as_deg(rad(u_wind.atan2(v_wind)));
    if direction_deg < 0.0 {
        direction_deg += 360.0;
    }
    if direction_deg >= 360.0 {
        direction_deg -= 360.0;
    }

    WindSample {
        speed_kmh: as_kmh(mps(speed_mps)),
        direction_tens_deg: direction_deg / WIND_DIRECTION_SCALE,
    }
}

/// Method used to fill interior wind gaps.
///
/// `step` runs from 1 to `steps - 1`, where `steps` is the gap length plus
/// one, so `step / steps` is the fractional position between the two valid
/// neighbours.
pub trait WindGapStrategy: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn interpolate(
        &self,
        before: WindSample,
        after: WindSample,
        step: usize,
        steps: usize,
    ) -> WindSample;
}

/// Linear interpolation of the strait-aligned components.
#[derive(Debug, Default, Clone, Copy)]
pub struct StraitComponentInterpolation;

impl WindGapStrategy for StraitComponentInterpolation {
    fn name(&self) -> &'static str {
        "strait_component_interpolation"
    }

    fn interpolate(
        &self,
        before: WindSample,
        after: WindSample,
        step: usize,
        steps: usize,
    ) -> WindSample {
        let last = to_strait_components(before);
        let next = to_strait_components(after);
        from_strait_components(StraitComponents {
            cross: lerp_step(last.cross, next.cross, step, steps),
            along: lerp_step(last.along, next.along, step, steps),
        })
    }
}
