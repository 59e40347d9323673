use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::model::Record;

// ---------------------------------------------------------------------------
// DateRange – optional inclusive calendar bounds
// ---------------------------------------------------------------------------

/// An inclusive date range; either bound may be absent (unbounded on that
/// side). An inverted range (start after end) matches nothing — the UI stays
/// responsive and shows an empty chart instead of an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Whether at least one bound is set.
    pub fn is_bounded(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    /// Whether `date` falls within the range (both bounds inclusive).
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

// ---------------------------------------------------------------------------
// FilterSpec – the user's constraints for one chart
// ---------------------------------------------------------------------------

/// The constraints applied before aggregation: categorical selections plus
/// an optional date range.
///
/// An empty key set means "no restriction" (select-all), so a freshly
/// constructed `FilterSpec` passes every record with a parseable date.
#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    /// Selected entity keys; empty = all.
    pub entity_keys: BTreeSet<String>,
    /// Selected process keys; empty = all. Only meaningful for tables that
    /// carry the process dimension.
    pub process_keys: BTreeSet<String>,
    /// Optional inclusive date range.
    pub date_range: DateRange,
}

impl FilterSpec {
    /// Whether a record survives this filter.
    ///
    /// * entity / process: set membership, skipped when the set is empty;
    ///   a record without a process value fails any active process filter.
    /// * date: applied only when at least one bound is set; a record whose
    ///   date failed to parse is excluded from any bounded view but passes
    ///   an unbounded one.
    pub fn matches(&self, rec: &Record) -> bool {
        if !self.entity_keys.is_empty() && !self.entity_keys.contains(&rec.entity) {
            return false;
        }

        if !self.process_keys.is_empty() {
            match &rec.process {
                Some(p) if self.process_keys.contains(p) => {}
                _ => return false,
            }
        }

        if self.date_range.is_bounded() {
            match rec.date {
                Some(d) if self.date_range.contains(d) => {}
                _ => return false,
            }
        }

        true
    }
}
