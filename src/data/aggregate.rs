use std::collections::BTreeMap;

use super::filter::{DateRange, FilterSpec};
use super::model::Table;

// ---------------------------------------------------------------------------
// Grouping dimensions
// ---------------------------------------------------------------------------

/// Which categorical dimensions a chart groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    /// Group by entity key alone (the two water sheets).
    Entity,
    /// Group by the (entity, process) pair (the packing sheet).
    EntityProcess,
}

/// One bar of an aggregated chart: a group label and its mean duration.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMean {
    /// `"<entity>"`, or `"<entity> - <process>"` for two-dimensional groups.
    pub label: String,
    /// Arithmetic mean of the group's durations, rounded to 2 decimals.
    pub mean: f64,
    /// How many records contributed to the mean.
    pub count: usize,
}

// ---------------------------------------------------------------------------
// The filter-and-aggregate transformation
// ---------------------------------------------------------------------------

/// Filter `table`, group the survivors, and average their durations.
///
/// Pure and stateless: the table is never mutated, and identical inputs
/// always produce the identical result. Groups come out in lexicographic
/// key order so repeated calls render stable charts.
///
/// Records are skipped (never an error) when:
/// * they fail `filter.matches` — including records whose date did not
///   parse while a date bound is active;
/// * their duration is missing or was non-numeric in the source;
/// * grouping is by `EntityProcess` and the record has no process value.
///
/// A date bound only applies to tables that carry a date column; for a
/// table without one the range is ignored rather than matching nothing.
/// A group whose every duration was skipped never materialises, and an
/// empty table (or a filter matching nothing) yields an empty result.
pub fn aggregate(table: &Table, group_by: GroupBy, filter: &FilterSpec) -> Vec<GroupMean> {
    let mut filter = filter.clone();
    if !table.has_date {
        filter.date_range = DateRange::default();
    }

    let mut groups: BTreeMap<(String, Option<String>), (f64, usize)> = BTreeMap::new();

    for rec in table.records.iter().filter(|r| filter.matches(r)) {
        let Some(duration) = rec.duration else {
            continue;
        };

        let key = match group_by {
            GroupBy::Entity => (rec.entity.clone(), None),
            GroupBy::EntityProcess => {
                let Some(process) = rec.process.clone() else {
                    continue;
                };
                (rec.entity.clone(), Some(process))
            }
        };

        let slot = groups.entry(key).or_insert((0.0, 0));
        slot.0 += duration;
        slot.1 += 1;
    }

    groups
        .into_iter()
        .map(|((entity, process), (sum, count))| {
            let label = match process {
                Some(p) => format!("{entity} - {p}"),
                None => entity,
            };
            GroupMean {
                label,
                mean: round2(sum / count as f64),
                count,
            }
        })
        .collect()
}

/// Round to 2 decimal places, half away from zero (`f64::round` semantics).
fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::data::filter::DateRange;
    use crate::data::model::Record;

    fn rec(
        entity: &str,
        process: Option<&str>,
        date: Option<&str>,
        duration: Option<f64>,
    ) -> Record {
        Record {
            entity: entity.to_string(),
            process: process.map(str::to_string),
            date: date.map(|d| d.parse().unwrap()),
            duration,
        }
    }

    fn water_table(records: Vec<Record>) -> Table {
        Table::from_records("ADICION_AGUA", false, true, records)
    }

    fn packing_table(records: Vec<Record>) -> Table {
        Table::from_records("TIEMPOS_EMPACAR", true, true, records)
    }

    fn entity_filter(keys: &[&str]) -> FilterSpec {
        FilterSpec {
            entity_keys: keys.iter().map(|k| k.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn groups_and_averages_by_entity() {
        let table = water_table(vec![
            rec("A", None, None, Some(5.0)),
            rec("A", None, None, Some(7.0)),
            rec("B", None, None, Some(10.0)),
        ]);

        let result = aggregate(&table, GroupBy::Entity, &FilterSpec::default());

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].label, "A");
        assert_eq!(result[0].mean, 6.0);
        assert_eq!(result[0].count, 2);
        assert_eq!(result[1].label, "B");
        assert_eq!(result[1].mean, 10.0);
    }

    #[test]
    fn process_filter_yields_composed_labels() {
        let table = packing_table(vec![
            rec("A", Some("X"), None, Some(2.0)),
            rec("A", Some("Y"), None, Some(4.0)),
        ]);
        let filter = FilterSpec {
            process_keys: BTreeSet::from(["X".to_string()]),
            ..Default::default()
        };

        let result = aggregate(&table, GroupBy::EntityProcess, &filter);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].label, "A - X");
        assert_eq!(result[0].mean, 2.0);
    }

    #[test]
    fn date_upper_bound_is_inclusive() {
        let table = water_table(vec![
            rec("A", None, Some("2024-01-31"), Some(4.0)),
            rec("A", None, Some("2024-02-01"), Some(100.0)),
        ]);
        let filter = FilterSpec {
            date_range: DateRange {
                start: Some("2024-01-01".parse().unwrap()),
                end: Some("2024-01-31".parse().unwrap()),
            },
            ..Default::default()
        };

        let result = aggregate(&table, GroupBy::Entity, &filter);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].mean, 4.0);
        assert_eq!(result[0].count, 1);
    }

    #[test]
    fn date_bounds_are_a_noop_for_tables_without_a_date_column() {
        // A sheet loaded without Fecha has all-None dates; an armed range
        // must not empty its chart.
        let table = Table::from_records(
            "SUCCION_AGUA",
            false,
            false,
            vec![rec("A", None, None, Some(5.0)), rec("A", None, None, Some(7.0))],
        );
        let filter = FilterSpec {
            date_range: DateRange {
                start: Some("2024-01-01".parse().unwrap()),
                end: Some("2024-12-31".parse().unwrap()),
            },
            ..Default::default()
        };

        let result = aggregate(&table, GroupBy::Entity, &filter);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].mean, 6.0);
        assert_eq!(result[0].count, 2);
    }

    #[test]
    fn no_matches_is_empty_not_an_error() {
        let table = water_table(vec![rec("A", None, None, Some(5.0))]);
        let result = aggregate(&table, GroupBy::Entity, &entity_filter(&["Z9"]));
        assert!(result.is_empty());
    }

    #[test]
    fn empty_table_aggregates_to_nothing() {
        let table = water_table(Vec::new());
        assert!(aggregate(&table, GroupBy::Entity, &FilterSpec::default()).is_empty());
    }

    #[test]
    fn select_all_equals_no_selection() {
        let table = water_table(vec![
            rec("A", None, None, Some(3.0)),
            rec("B", None, None, Some(9.0)),
            rec("C", None, None, Some(1.5)),
        ]);

        let unrestricted = aggregate(&table, GroupBy::Entity, &FilterSpec::default());
        let explicit_all = aggregate(&table, GroupBy::Entity, &entity_filter(&["A", "B", "C"]));

        assert_eq!(unrestricted, explicit_all);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let table = packing_table(vec![
            rec("A", Some("X"), Some("2024-01-10"), Some(2.0)),
            rec("B", Some("X"), Some("2024-01-12"), Some(3.0)),
            rec("A", Some("Y"), Some("2024-01-14"), Some(4.0)),
        ]);
        let filter = FilterSpec {
            date_range: DateRange {
                start: Some("2024-01-01".parse().unwrap()),
                end: None,
            },
            ..Default::default()
        };

        let first = aggregate(&table, GroupBy::EntityProcess, &filter);
        let second = aggregate(&table, GroupBy::EntityProcess, &filter);
        assert_eq!(first, second);
    }

    #[test]
    fn widening_the_range_never_shrinks_groups() {
        let table = water_table(vec![
            rec("A", None, Some("2024-01-10"), Some(2.0)),
            rec("A", None, Some("2024-02-10"), Some(4.0)),
            rec("B", None, Some("2024-03-10"), Some(6.0)),
        ]);
        let narrow = FilterSpec {
            date_range: DateRange {
                start: Some("2024-01-01".parse().unwrap()),
                end: Some("2024-01-31".parse().unwrap()),
            },
            ..Default::default()
        };
        let wide = FilterSpec {
            date_range: DateRange {
                start: Some("2024-01-01".parse().unwrap()),
                end: None,
            },
            ..Default::default()
        };

        let narrow_result = aggregate(&table, GroupBy::Entity, &narrow);
        let wide_result = aggregate(&table, GroupBy::Entity, &wide);

        for group in &narrow_result {
            let widened = wide_result
                .iter()
                .find(|g| g.label == group.label)
                .expect("widening removed a group");
            assert!(widened.count >= group.count);
        }
    }

    #[test]
    fn mean_is_rounded_half_away_from_zero() {
        // 1/3 → 0.33, and 0.125 ties round up to 0.13.
        let thirds = water_table(vec![
            rec("A", None, None, Some(0.0)),
            rec("A", None, None, Some(0.0)),
            rec("A", None, None, Some(1.0)),
        ]);
        let result = aggregate(&thirds, GroupBy::Entity, &FilterSpec::default());
        assert_eq!(result[0].mean, 0.33);
        assert!((result[0].mean - 1.0 / 3.0).abs() <= 0.005);

        let tie = water_table(vec![
            rec("A", None, None, Some(0.12)),
            rec("A", None, None, Some(0.13)),
        ]);
        let result = aggregate(&tie, GroupBy::Entity, &FilterSpec::default());
        assert_eq!(result[0].mean, 0.13);
    }

    #[test]
    fn missing_durations_are_excluded_from_the_mean() {
        let table = water_table(vec![
            rec("A", None, None, Some(4.0)),
            rec("A", None, None, None),
            rec("A", None, None, Some(6.0)),
        ]);

        let result = aggregate(&table, GroupBy::Entity, &FilterSpec::default());

        assert_eq!(result[0].mean, 5.0);
        assert_eq!(result[0].count, 2);
    }

    #[test]
    fn group_with_only_missing_durations_is_omitted() {
        let table = water_table(vec![
            rec("A", None, None, None),
            rec("B", None, None, Some(2.0)),
        ]);

        let result = aggregate(&table, GroupBy::Entity, &FilterSpec::default());

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].label, "B");
    }

    #[test]
    fn entity_process_grouping_skips_records_without_process() {
        let table = packing_table(vec![
            rec("A", Some("X"), None, Some(2.0)),
            rec("A", None, None, Some(99.0)),
        ]);

        let result = aggregate(&table, GroupBy::EntityProcess, &FilterSpec::default());

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].label, "A - X");
        assert_eq!(result[0].mean, 2.0);
    }
}
