//! Upload ingestion: format dispatch, readers, and normalization.
//!
//! Ownership model:
//! - A [`RawTableReader`] turns upload bytes into untyped [`RawTable`]s.
//! - The joiner (workbooks) or the flat mapping (CSV) turns tables into
//!   canonical [`FactRecord`]s through the shared coercion layer.
//! - The resulting [`Dataset`] is installed all-or-nothing; any fatal error
//!   leaves nothing behind.

use std::fs;
use std::path::Path;

use chrono::Utc;
use tracing::info;

use crate::config::EngineConfig;
use crate::data::{Dataset, DatasetDiagnostics, FactRecord, InputKind};
use crate::errors::CockpitError;

/// Flat CSV reader.
pub mod csv_table;
/// Workbook join into canonical records.
pub mod joiner;
/// Header aliases and row-to-record mapping.
pub mod mapping;
/// Reader-neutral row contract.
pub mod row_view;
/// Workbook reader.
pub mod workbook;

pub use csv_table::CsvTableReader;
pub use joiner::{JoinedWorkbook, join_workbook};
pub use row_view::{RawCell, RawRow, RawTable, RawTableReader};
pub use workbook::WorkbookReader;

use mapping::FactParts;

/// Pick a reader from the file extension (`.xlsx`, `.xls`, `.csv`).
pub fn reader_for(name: &str) -> Result<Box<dyn RawTableReader>, CockpitError> {
    let lower = name.trim().to_ascii_lowercase();
    if lower.ends_with(".csv") {
        Ok(Box::new(CsvTableReader))
    } else if lower.ends_with(".xlsx") || lower.ends_with(".xls") {
        Ok(Box::new(WorkbookReader))
    } else {
        Err(CockpitError::UnsupportedFileType {
            name: name.to_string(),
        })
    }
}

/// Parse and normalize one upload into a dataset.
pub fn load_upload(
    name: &str,
    bytes: &[u8],
    config: &EngineConfig,
) -> Result<Dataset, CockpitError> {
    let reader = reader_for(name)?;
    let tables = reader.read_tables(name, bytes)?;
    normalize_tables(name, reader.kind(), &tables, config)
}

/// Read a file from disk and normalize it.
pub fn load_path(path: &Path, config: &EngineConfig) -> Result<Dataset, CockpitError> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());
    reader_for(&name)?;
    let bytes = fs::read(path)?;
    load_upload(&name, &bytes, config)
}

/// Normalize already-read tables into a dataset.
pub fn normalize_tables(
    name: &str,
    kind: InputKind,
    tables: &[RawTable],
    config: &EngineConfig,
) -> Result<Dataset, CockpitError> {
    let dataset = match kind {
        InputKind::Xlsx => {
            let joined = join_workbook(tables, config)?;
            Dataset::new(
                name,
                Utc::now(),
                joined.records,
                FactRecord::FIELD_NAMES.iter().map(|field| field.to_string()).collect(),
                joined.recruiter_interactions,
                joined.diagnostics,
            )
        }
        InputKind::Csv => {
            let Some(table) = tables.first() else {
                return Ok(Dataset::new(
                    name,
                    Utc::now(),
                    Vec::new(),
                    Vec::new(),
                    Vec::new(),
                    DatasetDiagnostics::for_csv(),
                ));
            };
            if table.len() > config.max_pipeline_rows {
                return Err(CockpitError::RowCeilingExceeded {
                    rows: table.len(),
                    ceiling: config.max_pipeline_rows,
                });
            }
            let records = table
                .rows
                .iter()
                .map(|row| FactParts::flat(row).build())
                .collect();
            Dataset::new(
                name,
                Utc::now(),
                records,
                table.columns.clone(),
                Vec::new(),
                DatasetDiagnostics::for_csv(),
            )
        }
    };
    info!(
        "[cockpit:ingest] loaded '{}' ({:?}) with {} records",
        dataset.name,
        kind,
        dataset.len()
    );
    Ok(dataset)
}
