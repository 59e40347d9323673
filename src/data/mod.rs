/// Data layer: core types, loading, filtering, and aggregation.
///
/// Architecture:
/// ```text
///  .xlsx / .json / csv dir
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse workbook → TableStore (three sheets)
///   └──────────┘
///        │
///        ▼
///   ┌────────────┐
///   │ TableStore  │  immutable Vec<Record> per sheet + key indices
///   └────────────┘
///        │
///        ▼
///   ┌───────────────────┐
///   │ filter + aggregate │  FilterSpec predicate → grouped means
///   └───────────────────┘
/// ```
pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
