use csv::ReaderBuilder;

use super::row_view::{RawCell, RawRow, RawTable, RawTableReader};
use crate::data::InputKind;
use crate::errors::CockpitError;

/// Reads a headed CSV buffer into a single table of text cells.
///
/// Records must all have the header's field count; the first structural
/// error aborts the read and is reported verbatim.
#[derive(Clone, Copy, Debug, Default)]
pub struct CsvTableReader;

impl RawTableReader for CsvTableReader {
    fn kind(&self) -> InputKind {
        InputKind::Csv
    }

    fn read_tables(&self, name: &str, bytes: &[u8]) -> Result<Vec<RawTable>, CockpitError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(bytes);
        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .map(|header| header.trim_start_matches('\u{feff}').trim().to_string())
            .collect();
        let mut table = RawTable::new(name, columns.clone());
        for record in reader.records() {
            let record = record?;
            let row = RawRow::from_pairs(columns.iter().cloned().zip(record.iter().map(|value| {
                if value.is_empty() {
                    RawCell::Empty
                } else {
                    RawCell::Text(value.to_string())
                }
            })));
            if !row.is_blank() {
                table.rows.push(row);
            }
        }
        Ok(vec![table])
    }
}
