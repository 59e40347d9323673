use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::data::aggregate::{aggregate, GroupBy, GroupMean};
use crate::data::filter::{DateRange, FilterSpec};
use crate::data::model::{Table, TableStore};

// ---------------------------------------------------------------------------
// Chart sections
// ---------------------------------------------------------------------------

/// The three dashboard sections, one per sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionId {
    WaterAddition,
    WaterSuction,
    Packing,
}

impl SectionId {
    pub const ALL: [SectionId; 3] = [
        SectionId::WaterAddition,
        SectionId::WaterSuction,
        SectionId::Packing,
    ];

    pub fn heading(self) -> &'static str {
        match self {
            SectionId::WaterAddition => "Suministro de Agua",
            SectionId::WaterSuction => "Succión de Agua",
            SectionId::Packing => "Tiempos de Procesos de Empaque",
        }
    }

    pub fn chart_title(self) -> &'static str {
        match self {
            SectionId::WaterAddition => "Tiempo Promedio de Suministro de Agua",
            SectionId::WaterSuction => "Tiempo Promedio de Succión de Agua",
            SectionId::Packing => "Tiempo Promedio por Proceso de Empaque",
        }
    }

    pub fn group_by(self) -> GroupBy {
        match self {
            SectionId::Packing => GroupBy::EntityProcess,
            _ => GroupBy::Entity,
        }
    }
}

// ---------------------------------------------------------------------------
// Per-section widget state
// ---------------------------------------------------------------------------

/// One optional date bound as held by the picker widgets: the date keeps its
/// last value even while the bound is switched off.
#[derive(Debug, Clone, Copy)]
pub struct DateBound {
    pub enabled: bool,
    pub date: NaiveDate,
}

impl DateBound {
    fn value(&self) -> Option<NaiveDate> {
        self.enabled.then_some(self.date)
    }
}

/// Widget state and cached chart series for one dashboard section.
pub struct SectionState {
    /// Entity keys currently checked in the filter list.
    pub entity_selection: BTreeSet<String>,
    /// Process keys currently checked (packing section only).
    pub process_selection: BTreeSet<String>,
    pub start: DateBound,
    pub end: DateBound,
    /// Chart-ready output of the last aggregation.
    pub series: Vec<GroupMean>,
}

impl SectionState {
    /// Fresh section state for a newly loaded table: everything selected,
    /// date bounds primed with the table's span and enabled on request.
    pub fn for_table(table: &Table, date_bounded: bool) -> Self {
        let today = chrono::Local::now().date_naive();
        let date_min = table.date_min();

        SectionState {
            entity_selection: table.entity_keys.clone(),
            process_selection: table.process_keys.clone(),
            start: DateBound {
                enabled: date_bounded && date_min.is_some(),
                date: date_min.unwrap_or(today),
            },
            end: DateBound {
                enabled: date_bounded && date_min.is_some(),
                date: table.date_max().unwrap_or(today),
            },
            series: Vec::new(),
        }
    }

    fn empty() -> Self {
        let today = chrono::Local::now().date_naive();
        SectionState {
            entity_selection: BTreeSet::new(),
            process_selection: BTreeSet::new(),
            start: DateBound {
                enabled: false,
                date: today,
            },
            end: DateBound {
                enabled: false,
                date: today,
            },
            series: Vec::new(),
        }
    }

    /// Translate the widget state into a [`FilterSpec`].
    ///
    /// A full selection collapses to the empty "no restriction" set, so the
    /// common untouched-filters case takes the select-all path.
    pub fn filter_spec(&self, table: &Table) -> FilterSpec {
        let normalize = |selection: &BTreeSet<String>, all: &BTreeSet<String>| {
            if selection.len() == all.len() {
                BTreeSet::new()
            } else {
                selection.clone()
            }
        };

        FilterSpec {
            entity_keys: normalize(&self.entity_selection, &table.entity_keys),
            process_keys: if table.has_process {
                normalize(&self.process_selection, &table.process_keys)
            } else {
                BTreeSet::new()
            },
            date_range: DateRange {
                start: self.start.value(),
                end: self.end.value(),
            },
        }
    }

    /// Re-run the aggregation for this section against its table.
    ///
    /// Unchecking every box in a list means "show nothing", which the engine's
    /// empty-set-means-all convention cannot express, so that case short-
    /// circuits to an empty series here.
    pub fn recompute(&mut self, table: &Table, group_by: GroupBy) {
        let nothing_selected = self.entity_selection.is_empty()
            || (table.has_process && self.process_selection.is_empty());

        if nothing_selected {
            self.series.clear();
            return;
        }

        self.series = aggregate(table, group_by, &self.filter_spec(table));
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded tables (None until the user opens a workbook).
    pub store: Option<TableStore>,

    pub water_addition: SectionState,
    pub water_suction: SectionState,
    pub packing: SectionState,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Whether a workbook load is in progress.
    pub loading: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            store: None,
            water_addition: SectionState::empty(),
            water_suction: SectionState::empty(),
            packing: SectionState::empty(),
            status_message: None,
            loading: false,
        }
    }
}

impl AppState {
    /// Ingest a freshly loaded store, reset all filters, compute all charts.
    ///
    /// The packing section starts with its date pickers spanning the table
    /// (the reference layout primes them); the water sections start unbounded.
    pub fn set_store(&mut self, store: TableStore) {
        self.water_addition = SectionState::for_table(&store.water_addition, false);
        self.water_suction = SectionState::for_table(&store.water_suction, false);
        self.packing = SectionState::for_table(&store.packing, true);

        self.store = Some(store);
        self.status_message = None;
        self.loading = false;

        for id in SectionId::ALL {
            self.recompute(id);
        }
    }

    /// Re-run one section's aggregation against the immutable store.
    pub fn recompute(&mut self, id: SectionId) {
        let Some(store) = &self.store else {
            return;
        };

        let (section, table) = match id {
            SectionId::WaterAddition => (&mut self.water_addition, &store.water_addition),
            SectionId::WaterSuction => (&mut self.water_suction, &store.water_suction),
            SectionId::Packing => (&mut self.packing, &store.packing),
        };

        section.recompute(table, id.group_by());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Record;

    fn store() -> TableStore {
        let rec = |entity: &str, process: Option<&str>, date: &str, duration: f64| Record {
            entity: entity.to_string(),
            process: process.map(str::to_string),
            date: Some(date.parse().unwrap()),
            duration: Some(duration),
        };

        TableStore {
            water_addition: Table::from_records(
                "ADICION_AGUA",
                false,
                true,
                vec![
                    rec("A1", None, "2024-01-05", 5.0),
                    rec("B2", None, "2024-01-06", 7.0),
                ],
            ),
            water_suction: Table::from_records(
                "SUCCION_AGUA",
                false,
                true,
                vec![rec("A1", None, "2024-01-05", 3.0)],
            ),
            packing: Table::from_records(
                "TIEMPOS_EMPACAR",
                true,
                true,
                vec![
                    rec("A1", Some("Llenado"), "2024-01-05", 20.0),
                    rec("A1", Some("Sellado"), "2024-02-01", 30.0),
                ],
            ),
        }
    }

    #[test]
    fn set_store_computes_all_sections() {
        let mut state = AppState::default();
        state.set_store(store());

        assert_eq!(state.water_addition.series.len(), 2);
        assert_eq!(state.water_suction.series.len(), 1);
        assert_eq!(state.packing.series.len(), 2);
        assert_eq!(state.packing.series[0].label, "A1 - Llenado");
    }

    #[test]
    fn packing_date_pickers_span_the_table() {
        let mut state = AppState::default();
        state.set_store(store());

        assert!(state.packing.start.enabled);
        assert_eq!(state.packing.start.date, "2024-01-05".parse().unwrap());
        assert_eq!(state.packing.end.date, "2024-02-01".parse().unwrap());
        assert!(!state.water_addition.start.enabled);
    }

    #[test]
    fn full_selection_normalizes_to_no_restriction() {
        let state = {
            let mut s = AppState::default();
            s.set_store(store());
            s
        };
        let table = &state.store.as_ref().unwrap().water_addition;

        let filter = state.water_addition.filter_spec(table);
        assert!(filter.entity_keys.is_empty());
    }

    #[test]
    fn empty_selection_yields_an_empty_series() {
        let mut state = AppState::default();
        state.set_store(store());

        state.water_addition.entity_selection.clear();
        state.recompute(SectionId::WaterAddition);
        assert!(state.water_addition.series.is_empty());
    }
}
