use std::collections::BTreeSet;

use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// Sheet and column names of the source workbook
// ---------------------------------------------------------------------------

pub const SHEET_WATER_ADDITION: &str = "ADICION_AGUA";
pub const SHEET_WATER_SUCTION: &str = "SUCCION_AGUA";
pub const SHEET_PACKING: &str = "TIEMPOS_EMPACAR";

pub const COL_ENTITY: &str = "OnePiece";
pub const COL_PROCESS: &str = "Proceso";
pub const COL_DATE: &str = "Fecha";
pub const COL_DURATION: &str = "Tiempo Unidad [s]";

// ---------------------------------------------------------------------------
// Record – one row of a measurement sheet
// ---------------------------------------------------------------------------

/// A single time measurement (one row of a source sheet).
///
/// `date` and `duration` are `None` when the source cell was empty or
/// unparseable; such rows stay in the table and are skipped per-computation
/// instead of failing the load.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Part code being processed. Never empty: rows without one are
    /// quarantined by the loader.
    pub entity: String,
    /// Processing step, populated only for the packing sheet.
    pub process: Option<String>,
    /// Calendar date of the measurement.
    pub date: Option<NaiveDate>,
    /// Measured seconds per unit.
    pub duration: Option<f64>,
}

// ---------------------------------------------------------------------------
// Table – one fully loaded sheet
// ---------------------------------------------------------------------------

/// An immutable-after-load measurement table with pre-computed key sets.
#[derive(Debug, Clone)]
pub struct Table {
    /// Sheet name this table was loaded from.
    pub name: String,
    /// All rows, in sheet order.
    pub records: Vec<Record>,
    /// Whether the sheet carries the `Proceso` dimension.
    pub has_process: bool,
    /// Whether the sheet carries a `Fecha` column; date bounds are a no-op
    /// for tables without one.
    pub has_date: bool,
    /// Sorted distinct entity keys (feeds the filter checkboxes).
    pub entity_keys: BTreeSet<String>,
    /// Sorted distinct process keys (empty unless `has_process`).
    pub process_keys: BTreeSet<String>,
}

impl Table {
    /// Build a table from loaded rows, indexing the categorical keys.
    pub fn from_records(name: &str, has_process: bool, has_date: bool, records: Vec<Record>) -> Self {
        let mut entity_keys = BTreeSet::new();
        let mut process_keys = BTreeSet::new();

        for rec in &records {
            entity_keys.insert(rec.entity.clone());
            if let Some(p) = &rec.process {
                process_keys.insert(p.clone());
            }
        }

        Table {
            name: name.to_string(),
            records,
            has_process,
            has_date,
            entity_keys,
            process_keys,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest parseable date in the table, if any.
    pub fn date_min(&self) -> Option<NaiveDate> {
        self.records.iter().filter_map(|r| r.date).min()
    }

    /// Latest parseable date in the table, if any.
    pub fn date_max(&self) -> Option<NaiveDate> {
        self.records.iter().filter_map(|r| r.date).max()
    }
}

// ---------------------------------------------------------------------------
// TableStore – the three sheets of one workbook
// ---------------------------------------------------------------------------

/// The three measurement tables, loaded once at startup and read-only for
/// the lifetime of the process. The tables share a row model but are
/// independent collections and are never merged.
#[derive(Debug, Clone)]
pub struct TableStore {
    pub water_addition: Table,
    pub water_suction: Table,
    pub packing: Table,
}

impl TableStore {
    /// Sheet names every workbook must provide, in display order.
    pub fn sheet_names() -> [&'static str; 3] {
        [SHEET_WATER_ADDITION, SHEET_WATER_SUCTION, SHEET_PACKING]
    }

    /// Total row count across all three tables.
    pub fn total_rows(&self) -> usize {
        self.water_addition.len() + self.water_suction.len() + self.packing.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn from_records_indexes_keys() {
        let table = Table::from_records(
            SHEET_PACKING,
            true,
            true,
            vec![
                rec("B2", Some("Sellado"), Some("2024-03-01"), Some(10.0)),
                rec("A1", Some("Llenado"), Some("2024-02-10"), Some(5.0)),
                rec("A1", Some("Sellado"), None, Some(7.5)),
            ],
        );

        assert_eq!(table.len(), 3);
        assert_eq!(
            table.entity_keys.iter().collect::<Vec<_>>(),
            vec!["A1", "B2"]
        );
        assert_eq!(
            table.process_keys.iter().collect::<Vec<_>>(),
            vec!["Llenado", "Sellado"]
        );
    }

    #[test]
    fn date_bounds_skip_unparseable_rows() {
        let table = Table::from_records(
            SHEET_WATER_ADDITION,
            false,
            true,
            vec![
                rec("A1", None, Some("2024-02-10"), Some(5.0)),
                rec("A1", None, None, Some(6.0)),
                rec("B2", None, Some("2024-03-01"), Some(10.0)),
            ],
        );

        assert_eq!(table.date_min(), Some("2024-02-10".parse().unwrap()));
        assert_eq!(table.date_max(), Some("2024-03-01".parse().unwrap()));
    }

    #[test]
    fn empty_table_has_no_date_bounds() {
        let table = Table::from_records(SHEET_WATER_SUCTION, false, false, Vec::new());
        assert!(table.is_empty());
        assert_eq!(table.date_min(), None);
        assert_eq!(table.date_max(), None);
    }
}
