use std::collections::BTreeSet;
use std::path::Path;

use eframe::egui::{self, Color32, RichText, Ui};

use crate::state::{AppState, DateBound, SectionId};

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open workbook…").clicked() {
                open_workbook_dialog(state);
                ui.close_menu();
            }
            if ui.button("Open CSV folder…").clicked() {
                open_csv_dir_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(store) = &state.store {
            ui.label(format!(
                "{} rows loaded across {} sheets",
                store.total_rows(),
                crate::data::model::TableStore::sheet_names().len()
            ));
        }

        if state.loading {
            ui.label("Cargando…");
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Per-section filter row
// ---------------------------------------------------------------------------

/// Render one section's filter widgets and recompute its chart on change.
pub fn filter_row(ui: &mut Ui, state: &mut AppState, id: SectionId) {
    let Some(store) = &state.store else {
        return;
    };

    let (table, section) = match id {
        SectionId::WaterAddition => (&store.water_addition, &mut state.water_addition),
        SectionId::WaterSuction => (&store.water_suction, &mut state.water_suction),
        SectionId::Packing => (&store.packing, &mut state.packing),
    };

    let mut changed = false;

    ui.horizontal_wrapped(|ui: &mut Ui| {
        changed |= key_filter(
            ui,
            format!("{id:?}-entity"),
            crate::data::model::COL_ENTITY,
            &table.entity_keys,
            &mut section.entity_selection,
        );

        if table.has_process {
            changed |= key_filter(
                ui,
                format!("{id:?}-process"),
                crate::data::model::COL_PROCESS,
                &table.process_keys,
                &mut section.process_selection,
            );
        }

        if table.has_date {
            changed |=
                date_bound_picker(ui, format!("{id:?}-start"), "Fecha inicio", &mut section.start);
            changed |= date_bound_picker(ui, format!("{id:?}-end"), "Fecha fin", &mut section.end);
        }
    });

    if changed {
        section.recompute(table, id.group_by());
    }
}

/// Collapsible checkbox list over a categorical dimension, with All/None.
fn key_filter(
    ui: &mut Ui,
    id_salt: String,
    label: &str,
    all_values: &BTreeSet<String>,
    selected: &mut BTreeSet<String>,
) -> bool {
    let mut changed = false;

    let header_text = format!("{label}  ({}/{})", selected.len(), all_values.len());
    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(id_salt)
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    *selected = all_values.clone();
                    changed = true;
                }
                if ui.small_button("None").clicked() {
                    selected.clear();
                    changed = true;
                }
            });

            for val in all_values {
                let mut checked = selected.contains(val);
                if ui.checkbox(&mut checked, val.as_str()).changed() {
                    if checked {
                        selected.insert(val.clone());
                    } else {
                        selected.remove(val);
                    }
                    changed = true;
                }
            }
        });

    changed
}

/// One optional date bound: a checkbox that arms the picker button.
fn date_bound_picker(ui: &mut Ui, id_salt: String, label: &str, bound: &mut DateBound) -> bool {
    let mut changed = false;

    changed |= ui.checkbox(&mut bound.enabled, label).changed();
    if bound.enabled {
        changed |= ui
            .add(egui_extras::DatePickerButton::new(&mut bound.date).id_salt(&id_salt))
            .changed();
    }

    changed
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

fn open_workbook_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open measurement workbook")
        .add_filter("Supported files", &["xlsx", "xlsm", "xls", "json"])
        .add_filter("Excel", &["xlsx", "xlsm", "xls"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        load_into_state(state, &path);
    }
}

fn open_csv_dir_dialog(state: &mut AppState) {
    let dir = rfd::FileDialog::new()
        .set_title("Open folder of sheet CSVs")
        .pick_folder();

    if let Some(path) = dir {
        load_into_state(state, &path);
    }
}

fn load_into_state(state: &mut AppState, path: &Path) {
    state.loading = true;
    match crate::data::loader::load_workbook(path) {
        Ok(store) => {
            log::info!("Loaded workbook from {}", path.display());
            state.set_store(store);
        }
        Err(e) => {
            log::error!("Failed to load workbook: {e}");
            state.status_message = Some(format!("Error: {e}"));
            state.loading = false;
        }
    }
}
