use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{
    Record, Table, TableStore, COL_DATE, COL_DURATION, COL_ENTITY, COL_PROCESS, SHEET_PACKING,
    SHEET_WATER_ADDITION, SHEET_WATER_SUCTION,
};

// ---------------------------------------------------------------------------
// Load errors – fatal at startup, no partial TableStore
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("cannot open workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("sheet '{0}' not found in the source")]
    MissingSheet(String),

    #[error("sheet '{sheet}' is missing required column '{column}'")]
    MissingColumn { sheet: String, column: String },

    #[error("sheet '{sheet}': {source}")]
    Csv {
        sheet: String,
        #[source]
        source: csv::Error,
    },

    #[error("invalid JSON workbook: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JSON workbook root must be an object mapping sheet names to row arrays")]
    JsonShape,
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the three measurement tables from a workbook. Dispatch by source kind.
///
/// Supported sources:
/// * `.xlsx` / `.xlsm` / `.xls` – one worksheet per sheet name (recommended)
/// * `.json` – `{ "<SHEET>": [ { "<column>": value, ... }, ... ], ... }`
/// * a directory – one `<SHEET>.csv` per sheet, header row with column names
///
/// Missing sheets and missing required columns are fatal. Per-row defects are
/// not: rows without an `OnePiece` value are quarantined (counted and logged),
/// and unparseable dates or durations load as `None` so downstream views can
/// skip them.
pub fn load_workbook(path: &Path) -> Result<TableStore, LoadError> {
    let store = if path.is_dir() {
        load_csv_dir(path)?
    } else {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "xlsx" | "xlsm" | "xls" => load_excel(path)?,
            "json" => load_json(path)?,
            other => return Err(LoadError::UnsupportedFormat(other.to_string())),
        }
    };

    for table in [&store.water_addition, &store.water_suction, &store.packing] {
        log::info!(
            "Loaded sheet '{}': {} rows, {} entities",
            table.name,
            table.len(),
            table.entity_keys.len()
        );
    }

    Ok(store)
}

// ---------------------------------------------------------------------------
// Shared row assembly
// ---------------------------------------------------------------------------

/// One row as pulled out of a source, before validation.
#[derive(Debug, Default)]
struct RawRow {
    entity: Option<String>,
    process: Option<String>,
    date: Option<NaiveDate>,
    duration: Option<f64>,
}

/// Resolved positions of the semantic columns within a header row.
struct ColumnMap {
    entity: usize,
    process: Option<usize>,
    date: Option<usize>,
    duration: usize,
}

fn resolve_columns(sheet: &str, headers: &[String], has_process: bool) -> Result<ColumnMap, LoadError> {
    let find = |name: &str| headers.iter().position(|h| h == name);
    let require = |name: &str| {
        find(name).ok_or_else(|| LoadError::MissingColumn {
            sheet: sheet.to_string(),
            column: name.to_string(),
        })
    };

    Ok(ColumnMap {
        entity: require(COL_ENTITY)?,
        duration: require(COL_DURATION)?,
        process: if has_process {
            Some(require(COL_PROCESS)?)
        } else {
            None
        },
        // Fecha is required on the packing sheet, read when present elsewhere.
        date: if has_process {
            Some(require(COL_DATE)?)
        } else {
            find(COL_DATE)
        },
    })
}

/// Turn raw rows into records, quarantining rows without an entity key.
fn collect_records(sheet: &str, rows: impl Iterator<Item = RawRow>) -> Vec<Record> {
    let mut quarantined = 0usize;
    let mut records = Vec::new();

    for raw in rows {
        match raw.entity {
            Some(entity) => records.push(Record {
                entity,
                process: raw.process,
                date: raw.date,
                duration: raw.duration,
            }),
            None => quarantined += 1,
        }
    }

    if quarantined > 0 {
        log::warn!("sheet '{sheet}': quarantined {quarantined} row(s) without a '{COL_ENTITY}' value");
    }

    records
}

/// Dates arrive as ISO dates, ISO datetimes, or the plant's `dd/mm/YYYY`.
fn parse_date_str(s: &str) -> Option<NaiveDate> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(t, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(t, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(t, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(t, "%d/%m/%Y").ok()
}

fn nonempty(s: &str) -> Option<String> {
    let t = s.trim();
    (!t.is_empty()).then(|| t.to_string())
}

/// Durations must be finite and non-negative; anything else loads as `None`.
fn valid_duration(v: f64) -> Option<f64> {
    (v.is_finite() && v >= 0.0).then_some(v)
}

// ---------------------------------------------------------------------------
// Excel loader
// ---------------------------------------------------------------------------

fn load_excel(path: &Path) -> Result<TableStore, LoadError> {
    let mut workbook = open_workbook_auto(path)?;

    Ok(TableStore {
        water_addition: read_excel_sheet(&mut workbook, SHEET_WATER_ADDITION, false)?,
        water_suction: read_excel_sheet(&mut workbook, SHEET_WATER_SUCTION, false)?,
        packing: read_excel_sheet(&mut workbook, SHEET_PACKING, true)?,
    })
}

fn read_excel_sheet(
    workbook: &mut Sheets<BufReader<File>>,
    sheet: &str,
    has_process: bool,
) -> Result<Table, LoadError> {
    let range = workbook
        .worksheet_range(sheet)
        .map_err(|_| LoadError::MissingSheet(sheet.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(|c| c.to_string().trim().to_string()).collect())
        .unwrap_or_default();
    let cols = resolve_columns(sheet, &headers, has_process)?;

    let raw = rows.map(|row| RawRow {
        entity: row.get(cols.entity).and_then(cell_str),
        process: cols.process.and_then(|i| row.get(i)).and_then(cell_str),
        date: cols.date.and_then(|i| row.get(i)).and_then(cell_date),
        duration: row.get(cols.duration).and_then(cell_f64),
    });

    Ok(Table::from_records(
        sheet,
        has_process,
        cols.date.is_some(),
        collect_records(sheet, raw),
    ))
}

// -- Excel cell helpers --

fn cell_str(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) => nonempty(s),
        Data::Int(i) => Some(i.to_string()),
        // Part codes occasionally load as numbers; keep integral ones tidy.
        Data::Float(f) if f.fract() == 0.0 => Some(format!("{}", *f as i64)),
        Data::Float(f) => Some(f.to_string()),
        _ => None,
    }
}

fn cell_f64(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .and_then(valid_duration)
}

fn cell_date(cell: &Data) -> Option<NaiveDate> {
    match cell {
        Data::DateTime(dt) => dt.as_datetime().map(|ndt| ndt.date()),
        Data::DateTimeIso(s) | Data::String(s) => parse_date_str(s),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, one array per sheet):
///
/// ```json
/// {
///   "ADICION_AGUA": [
///     { "OnePiece": "A1", "Fecha": "2024-01-05", "Tiempo Unidad [s]": 12.5 },
///     ...
///   ],
///   "SUCCION_AGUA": [...],
///   "TIEMPOS_EMPACAR": [...]
/// }
/// ```
fn load_json(path: &Path) -> Result<TableStore, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_json_workbook(&text)
}

fn parse_json_workbook(text: &str) -> Result<TableStore, LoadError> {
    let root: JsonValue = serde_json::from_str(text)?;
    let sheets = root.as_object().ok_or(LoadError::JsonShape)?;

    Ok(TableStore {
        water_addition: json_sheet(sheets, SHEET_WATER_ADDITION, false)?,
        water_suction: json_sheet(sheets, SHEET_WATER_SUCTION, false)?,
        packing: json_sheet(sheets, SHEET_PACKING, true)?,
    })
}

fn json_sheet(
    sheets: &serde_json::Map<String, JsonValue>,
    sheet: &str,
    has_process: bool,
) -> Result<Table, LoadError> {
    let rows = sheets
        .get(sheet)
        .and_then(|v| v.as_array())
        .ok_or_else(|| LoadError::MissingSheet(sheet.to_string()))?;

    // Records-oriented JSON carries no header row, so the column check runs
    // against the first object row; an all-empty sheet has no key set to
    // validate (unlike the Excel/CSV paths, which always see headers).
    let first_obj = rows.iter().find_map(|v| v.as_object());
    if let Some(first) = first_obj {
        for column in required_columns(has_process) {
            if !first.contains_key(*column) {
                return Err(LoadError::MissingColumn {
                    sheet: sheet.to_string(),
                    column: column.to_string(),
                });
            }
        }
    }

    let has_date = has_process || first_obj.is_some_and(|o| o.contains_key(COL_DATE));
    let raw = rows.iter().map(|v| json_row(v, has_process));
    Ok(Table::from_records(sheet, has_process, has_date, collect_records(sheet, raw)))
}

fn required_columns(has_process: bool) -> &'static [&'static str] {
    if has_process {
        &[COL_ENTITY, COL_DURATION, COL_PROCESS, COL_DATE]
    } else {
        &[COL_ENTITY, COL_DURATION]
    }
}

fn json_row(value: &JsonValue, has_process: bool) -> RawRow {
    let Some(obj) = value.as_object() else {
        return RawRow::default();
    };

    RawRow {
        entity: obj.get(COL_ENTITY).and_then(json_str),
        process: if has_process {
            obj.get(COL_PROCESS).and_then(json_str)
        } else {
            None
        },
        date: obj
            .get(COL_DATE)
            .and_then(|v| v.as_str())
            .and_then(parse_date_str),
        duration: obj.get(COL_DURATION).and_then(json_f64),
    }
}

fn json_str(v: &JsonValue) -> Option<String> {
    match v {
        JsonValue::String(s) => nonempty(s),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn json_f64(v: &JsonValue) -> Option<f64> {
    match v {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .and_then(valid_duration)
}

// ---------------------------------------------------------------------------
// CSV-directory loader
// ---------------------------------------------------------------------------

/// CSV layout: a directory with one `<SHEET>.csv` per sheet, each with a
/// header row naming the columns. Handy for data exported sheet-by-sheet.
fn load_csv_dir(dir: &Path) -> Result<TableStore, LoadError> {
    Ok(TableStore {
        water_addition: read_csv_sheet(dir, SHEET_WATER_ADDITION, false)?,
        water_suction: read_csv_sheet(dir, SHEET_WATER_SUCTION, false)?,
        packing: read_csv_sheet(dir, SHEET_PACKING, true)?,
    })
}

fn read_csv_sheet(dir: &Path, sheet: &str, has_process: bool) -> Result<Table, LoadError> {
    let path = dir.join(format!("{sheet}.csv"));
    if !path.is_file() {
        return Err(LoadError::MissingSheet(sheet.to_string()));
    }

    let csv_err = |source: csv::Error| LoadError::Csv {
        sheet: sheet.to_string(),
        source,
    };

    let mut reader = csv::Reader::from_path(&path).map_err(csv_err)?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let cols = resolve_columns(sheet, &headers, has_process)?;

    let mut raw = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_err)?;
        raw.push(RawRow {
            entity: record.get(cols.entity).and_then(nonempty),
            process: cols.process.and_then(|i| record.get(i)).and_then(nonempty),
            date: cols
                .date
                .and_then(|i| record.get(i))
                .and_then(parse_date_str),
            duration: record
                .get(cols.duration)
                .and_then(|s| s.trim().parse().ok())
                .and_then(valid_duration),
        });
    }

    Ok(Table::from_records(
        sheet,
        has_process,
        cols.date.is_some(),
        collect_records(sheet, raw.into_iter()),
    ))
}
