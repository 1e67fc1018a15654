// bc-core/src/units.rs

use uom::si::f64::{Angle as UomAngle, Velocity as UomVelocity};

// Public canonical unit types (SI, f64)
pub type Angle = UomAngle;
pub type Velocity = UomVelocity;

#[inline]
pub fn kmh(v: f64) -> Velocity {
    use uom::si::velocity::kilometer_per_hour;
    Velocity::new::<kilometer_per_hour>(v)
}

#[inline]
pub fn mps(v: f64) -> Velocity {
    use uom::si::velocity::meter_per_second;
    Velocity::new::<meter_per_second>(v)
}

#[inline]
pub fn deg(v: f64) -> Angle {
    use uom::si::angle::degree;
    Angle::new::<degree>(v)
}

#[inline]
pub fn rad(v: f64) -> Angle {
    use uom::si::angle::radian;
    Angle::new::<radian>(v)
}

#[inline]
pub fn as_mps(v: Velocity) -> f64 {
    use uom::si::velocity::meter_per_second;
    v.get::<meter_per_second>()
}

#[inline]
pub fn as_kmh(v: Velocity) -> f64 {
    use uom::si::velocity::kilometer_per_hour;
    v.get::<kilometer_per_hour>()
}

#[inline]
pub fn as_rad(a: Angle) -> f64 {
    use uom::si::angle::radian;
    a.get::<radian>()
}

#[inline]
pub fn as_deg(a: Angle) -> f64 {
    use uom::si::angle::degree;
    a.get::<degree>()
}

pub mod constants {
    /// Heading of the along-strait axis, degrees clockwise from north.
    pub const STRAIT_HEADING_DEG: f64 = 305.0;

    /// Wind directions are reported in tens of degrees.
    pub const WIND_DIRECTION_SCALE: f64 = 10.0;
}
