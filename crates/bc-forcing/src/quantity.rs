//! Observed quantities and the forcing series they feed.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Quantity reported by a raw observation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityKind {
    WindSpeed,
    WindDirection,
    AirTemperature,
    RelativeHumidity,
    CloudFraction,
    MajorRiverDischarge,
    MinorRiverDischarge,
}

impl QuantityKind {
    /// The only unit accepted for this quantity.
    pub fn unit(self) -> Unit {
        match self {
            Self::WindSpeed => Unit::KilometresPerHour,
            Self::WindDirection => Unit::TensOfDegrees,
            Self::AirTemperature => Unit::DegreesCelsius,
            Self::RelativeHumidity => Unit::Percent,
            Self::CloudFraction => Unit::Tenths,
            Self::MajorRiverDischarge | Self::MinorRiverDischarge => Unit::CubicMetresPerSecond,
        }
    }

    /// Forcing series this quantity contributes to.
    pub fn forcing_kind(self) -> ForcingKind {
        match self {
            Self::WindSpeed | Self::WindDirection => ForcingKind::Wind,
            Self::AirTemperature => ForcingKind::AirTemperature,
            Self::RelativeHumidity => ForcingKind::RelativeHumidity,
            Self::CloudFraction => ForcingKind::CloudFraction,
            Self::MajorRiverDischarge => ForcingKind::MajorRiver,
            Self::MinorRiverDischarge => ForcingKind::MinorRiver,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::WindSpeed => "wind_speed",
            Self::WindDirection => "wind_direction",
            Self::AirTemperature => "air_temperature",
            Self::RelativeHumidity => "relative_humidity",
            Self::CloudFraction => "cloud_fraction",
            Self::MajorRiverDischarge => "major_river_discharge",
            Self::MinorRiverDischarge => "minor_river_discharge",
        }
    }
}

impl fmt::Display for QuantityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Measurement units of raw observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    KilometresPerHour,
    TensOfDegrees,
    DegreesCelsius,
    Percent,
    Tenths,
    CubicMetresPerSecond,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::KilometresPerHour => "km/h",
            Self::TensOfDegrees => "10s of degrees",
            Self::DegreesCelsius => "deg C",
            Self::Percent => "%",
            Self::Tenths => "tenths",
            Self::CubicMetresPerSecond => "m3/s",
        };
        f.write_str(s)
    }
}

/// One raw time-stamped observation record.
///
/// `value` is `None` when the provider reported the record without a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: NaiveDateTime,
    pub kind: QuantityKind,
    pub value: Option<f64>,
    pub unit: Unit,
}

impl Observation {
    pub fn new(timestamp: NaiveDateTime, kind: QuantityKind, value: Option<f64>) -> Self {
        Self {
            timestamp,
            kind,
            value,
            unit: kind.unit(),
        }
    }
}

/// Forcing series fed to the simulation; wind pairs speed and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForcingKind {
    Wind,
    AirTemperature,
    RelativeHumidity,
    CloudFraction,
    MajorRiver,
    MinorRiver,
}

impl ForcingKind {
    pub const ALL: [ForcingKind; 6] = [
        ForcingKind::Wind,
        ForcingKind::AirTemperature,
        ForcingKind::RelativeHumidity,
        ForcingKind::CloudFraction,
        ForcingKind::MajorRiver,
        ForcingKind::MinorRiver,
    ];

    pub fn is_wind(self) -> bool {
        matches!(self, ForcingKind::Wind)
    }

    /// Raw quantities that make up this series.
    pub fn quantities(self) -> &'static [QuantityKind] {
        match self {
            Self::Wind => &[QuantityKind::WindSpeed, QuantityKind::WindDirection],
            Self::AirTemperature => &[QuantityKind::AirTemperature],
            Self::RelativeHumidity => &[QuantityKind::RelativeHumidity],
            Self::CloudFraction => &[QuantityKind::CloudFraction],
            Self::MajorRiver => &[QuantityKind::MajorRiverDischarge],
            Self::MinorRiver => &[QuantityKind::MinorRiverDischarge],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wind => "wind",
            Self::AirTemperature => "air_temperature",
            Self::RelativeHumidity => "relative_humidity",
            Self::CloudFraction => "cloud_fraction",
            Self::MajorRiver => "major_river",
            Self::MinorRiver => "minor_river",
        }
    }
}

impl fmt::Display for ForcingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
