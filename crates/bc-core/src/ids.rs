use core::fmt;

use crate::BcError;

/// Historical forcing year that continues the real data for one ensemble member.
///
/// Members are ordered by year, which is the tie-break used when two members
/// predict the same bloom date.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct MemberYear(i32);

impl MemberYear {
    pub fn new(year: i32) -> Result<Self, BcError> {
        // Suffixes are built from two-digit years of `year - 1` and `year`.
        if !(1001..=9999).contains(&year) {
            return Err(BcError::YearOutOfRange {
                what: "ensemble member year",
                year,
            });
        }
        Ok(Self(year))
    }

    pub fn year(self) -> i32 {
        self.0
    }

    /// File-name suffix of the form `_XXYY`: XX from `year - 1`, YY from `year`.
    ///
    /// 1981 produces `_8081`; 2000 produces `_9900`.
    pub fn suffix(self) -> String {
        format!("_{:02}{:02}", (self.0 - 1).rem_euclid(100), self.0.rem_euclid(100))
    }

    /// Inclusive range of member years, validated.
    pub fn range(start: i32, end: i32) -> Result<Vec<Self>, BcError> {
        if start > end {
            return Err(BcError::InvalidArg {
                what: "start_year must not be after end_year",
            });
        }
        (start..=end).map(Self::new).collect()
    }
}

impl fmt::Debug for MemberYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemberYear({})", self.0)
    }
}

impl fmt::Display for MemberYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
