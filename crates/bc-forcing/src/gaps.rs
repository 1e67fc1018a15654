//! Detection of contiguous runs of missing days.

use chrono::NaiveDate;

use crate::series::{ForcingSeries, ForcingValue};

/// Nearest valid neighbour of a gap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub index: usize,
    pub date: NaiveDate,
    pub value: ForcingValue,
}

/// A maximal contiguous run of missing days.
///
/// `first`/`last` are slot indices into the series, inclusive. `before` and
/// `after` are the nearest valid values, `None` at the series boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct ForcingGap {
    pub first: usize,
    pub last: usize,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub before: Option<Anchor>,
    pub after: Option<Anchor>,
}

impl ForcingGap {
    /// Number of missing days in the gap.
    pub fn len(&self) -> usize {
        self.last - self.first + 1
    }
}

/// All gaps in `series`, in date order.
pub fn find_gaps(series: &ForcingSeries) -> Vec<ForcingGap> {
    let values = series.values();
    let mut gaps = Vec::new();
    let mut i = 0;
    while i < values.len() {
        if values[i].is_some() {
            i += 1;
            continue;
        }
        let first = i;
        while i < values.len() && values[i].is_none() {
            i += 1;
        }
        let last = i - 1;

        let before = first.checked_sub(1).and_then(|b| anchor(series, b));
        let after = values.get(i).and_then(|_| anchor(series, i));

        gaps.push(ForcingGap {
            first,
            last,
            start: series.date_at(first),
            end: series.date_at(last),
            before,
            after,
        });
    }
    gaps
}

fn anchor(series: &ForcingSeries, index: usize) -> Option<Anchor> {
    series.values()[index].map(|value| Anchor {
        index,
        date: series.date_at(index),
        value,
    })
}
