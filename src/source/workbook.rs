use std::io::Cursor;

use calamine::{Data, Range, Reader, open_workbook_auto_from_rs};
use tracing::debug;

use super::row_view::{RawCell, RawRow, RawTable, RawTableReader};
use crate::coerce::{excel_serial_to_datetime, to_text};
use crate::data::InputKind;
use crate::errors::CockpitError;

/// Reads every worksheet of an `.xlsx`/`.xls` buffer into named tables.
///
/// The first row of each sheet is the header; blank header cells drop their
/// column and fully blank data rows are skipped.
#[derive(Clone, Copy, Debug, Default)]
pub struct WorkbookReader;

impl RawTableReader for WorkbookReader {
    fn kind(&self) -> InputKind {
        InputKind::Xlsx
    }

    fn read_tables(&self, name: &str, bytes: &[u8]) -> Result<Vec<RawTable>, CockpitError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
            .map_err(|err| CockpitError::Workbook(format!("{name}: {err}")))?;
        let sheet_names = workbook.sheet_names();
        let mut tables = Vec::with_capacity(sheet_names.len());
        for sheet in sheet_names {
            let range = workbook
                .worksheet_range(&sheet)
                .map_err(|err| CockpitError::Workbook(format!("{name}/{sheet}: {err}")))?;
            let table = range_to_table(&sheet, &range);
            debug!(
                "[cockpit:ingest] sheet '{}' read with {} rows",
                table.name,
                table.len()
            );
            tables.push(table);
        }
        Ok(tables)
    }
}

fn range_to_table(name: &str, range: &Range<Data>) -> RawTable {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return RawTable::new(name, Vec::new());
    };
    let columns: Vec<Option<String>> = header
        .iter()
        .map(|cell| to_text(&raw_cell(cell)))
        .collect();
    let mut table = RawTable::new(name, columns.iter().flatten().cloned().collect());
    for row in rows {
        let raw = RawRow::from_pairs(
            columns
                .iter()
                .zip(row.iter())
                .filter_map(|(column, cell)| column.clone().map(|column| (column, raw_cell(cell)))),
        );
        if !raw.is_blank() {
            table.rows.push(raw);
        }
    }
    table
}

/// Map a calamine cell onto the reader-neutral cell type.
pub fn raw_cell(cell: &Data) -> RawCell {
    match cell {
        Data::Int(value) => RawCell::Number(*value as f64),
        Data::Float(value) => RawCell::Number(*value),
        Data::String(value) => RawCell::Text(value.clone()),
        Data::Bool(value) => RawCell::Bool(*value),
        Data::DateTime(value) => {
            excel_serial_to_datetime(value.as_f64()).map_or(RawCell::Empty, RawCell::DateTime)
        }
        Data::DateTimeIso(value) | Data::DurationIso(value) => RawCell::Text(value.clone()),
        Data::Error(_) | Data::Empty => RawCell::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_cell_maps_scalar_variants() {
        assert_eq!(raw_cell(&Data::Int(3)), RawCell::Number(3.0));
        assert_eq!(raw_cell(&Data::Float(2.5)), RawCell::Number(2.5));
        assert_eq!(raw_cell(&Data::String("x".into())), RawCell::Text("x".into()));
        assert_eq!(raw_cell(&Data::Bool(true)), RawCell::Bool(true));
        assert_eq!(raw_cell(&Data::Empty), RawCell::Empty);
    }

    #[test]
    fn garbage_bytes_are_a_workbook_error() {
        let err = WorkbookReader
            .read_tables("broken.xlsx", b"not a zip archive")
            .unwrap_err();
        assert!(matches!(err, CockpitError::Workbook(_)));
    }
}
