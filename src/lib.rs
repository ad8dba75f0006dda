//! Gridsift — in-memory tabular data engine with a terminal front end.
//!
//! Rows go through a fixed pipeline on every change of view state:
//! filter (global text plus per-column predicates), stable multi-key sort,
//! then pagination. Selection is tracked by row identity and survives
//! filtering, sorting and paging.
//!
//! ## Engine
//!
//! - `data` / `schema` — rows with stable ids, column kinds inferred from data
//! - `filter`, `sort`, `paginate`, `selection` — the pipeline stages
//! - `facet` — distinct values and numeric bounds per column, cached
//! - `table` — view state, intents (`commands`) and the derived view
//!
//! ## Front end
//!
//! - `format` / `export` — CSV, TSV and JSONL in, CSV out
//! - `debounce` — delayed commit of typed filters
//! - `app`, `ui`, `tui` — the interactive table

pub mod app;
pub mod commands;
pub mod data;
pub mod debounce;
pub mod export;
pub mod facet;
pub mod filter;
pub mod format;
pub mod paginate;
pub mod schema;
pub mod selection;
pub mod sort;
pub mod table;
pub mod tui;
pub mod ui;
