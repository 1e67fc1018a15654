//! Result data types.

use std::fmt;

use bc_core::MemberYear;
use bc_forcing::CutoffNotice;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One member's bloom date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemberPrediction {
    pub member: MemberYear,
    pub bloom_date: NaiveDate,
    pub biomass: f64,
}

impl fmt::Display for MemberPrediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (forcing {}/{}, {:.4} uM N)",
            self.bloom_date,
            self.member.year() - 1,
            self.member.year(),
            self.biomass
        )
    }
}

/// Ensemble statistics for one forcing cutoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleSummary {
    pub cutoff: NaiveDate,
    pub median: MemberPrediction,
    /// 5th percentile.
    pub early: MemberPrediction,
    /// 95th percentile.
    pub late: MemberPrediction,
    pub earliest: MemberPrediction,
    pub latest: MemberPrediction,
    pub members_succeeded: usize,
    pub members_failed: usize,
}

/// A line of the bloom date evolution log.
///
/// Records written before the extremes were logged have no earliest or
/// latest member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloomDateLogEntry {
    pub cutoff: NaiveDate,
    #[serde(default)]
    pub notice: CutoffNotice,
    pub median: MemberPrediction,
    pub early: MemberPrediction,
    pub late: MemberPrediction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earliest: Option<MemberPrediction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest: Option<MemberPrediction>,
    #[serde(default)]
    pub members_succeeded: usize,
    #[serde(default)]
    pub members_failed: usize,
}

impl BloomDateLogEntry {
    /// Every member prediction carried by the entry.
    pub fn predictions(&self) -> impl Iterator<Item = &MemberPrediction> {
        [Some(&self.median), Some(&self.early), Some(&self.late)]
            .into_iter()
            .chain([self.earliest.as_ref(), self.latest.as_ref()])
            .flatten()
    }

    pub fn new(summary: &EnsembleSummary, notice: CutoffNotice) -> Self {
        Self {
            cutoff: summary.cutoff,
            notice,
            median: summary.median,
            early: summary.early,
            late: summary.late,
            earliest: Some(summary.earliest),
            latest: Some(summary.latest),
            members_succeeded: summary.members_succeeded,
            members_failed: summary.members_failed,
        }
    }
}
