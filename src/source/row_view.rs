use chrono::NaiveDateTime;
use indexmap::IndexMap;

use crate::data::InputKind;
use crate::errors::CockpitError;
use crate::types::{ColumnName, SheetName};

static EMPTY_CELL: RawCell = RawCell::Empty;

/// One untyped cell as delivered by a spreadsheet or CSV reader.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum RawCell {
    /// No value.
    #[default]
    Empty,
    /// Text exactly as read (CSV cells are always text).
    Text(String),
    /// Numeric cell.
    Number(f64),
    /// Boolean cell.
    Bool(bool),
    /// Date/time cell already decoded by the reader.
    DateTime(NaiveDateTime),
}

impl RawCell {
    /// True for `Empty` and for text that is blank after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            RawCell::Empty => true,
            RawCell::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for RawCell {
    fn from(value: &str) -> Self {
        RawCell::Text(value.to_string())
    }
}

impl From<f64> for RawCell {
    fn from(value: f64) -> Self {
        RawCell::Number(value)
    }
}

/// Source-agnostic row contract shared by the workbook and CSV readers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawRow {
    cells: IndexMap<ColumnName, RawCell>,
}

impl RawRow {
    /// Build a row from `(column, cell)` pairs in column order.
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, RawCell)>,
        K: Into<ColumnName>,
    {
        Self {
            cells: pairs
                .into_iter()
                .map(|(column, cell)| (column.into(), cell))
                .collect(),
        }
    }

    /// Set `column` to `cell`, replacing any previous value.
    pub fn insert(&mut self, column: impl Into<ColumnName>, cell: RawCell) {
        self.cells.insert(column.into(), cell);
    }

    /// Cell under `column`, or an empty cell when the column is absent.
    pub fn get(&self, column: &str) -> &RawCell {
        self.cells.get(column).unwrap_or(&EMPTY_CELL)
    }

    /// First non-blank cell among `aliases`, in alias order.
    pub fn first_present(&self, aliases: &[&str]) -> &RawCell {
        aliases
            .iter()
            .map(|alias| self.get(alias))
            .find(|cell| !cell.is_blank())
            .unwrap_or(&EMPTY_CELL)
    }

    /// Columns carrying a non-blank value.
    pub fn populated_columns(&self) -> impl Iterator<Item = &str> {
        self.cells
            .iter()
            .filter(|(_, cell)| !cell.is_blank())
            .map(|(column, _)| column.as_str())
    }

    /// True when every cell is blank.
    pub fn is_blank(&self) -> bool {
        self.cells.values().all(RawCell::is_blank)
    }
}

/// One named table of raw rows (a worksheet, or the single table of a CSV).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawTable {
    /// Sheet name, or the file name for CSV input.
    pub name: SheetName,
    /// Header row in file order.
    pub columns: Vec<ColumnName>,
    /// Data rows; blank rows are dropped by readers.
    pub rows: Vec<RawRow>,
}

impl RawTable {
    /// Create an empty table with the given header.
    pub fn new(name: impl Into<SheetName>, columns: Vec<ColumnName>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sorted union of populated columns over the first `scan_rows` rows.
    pub fn sampled_columns(&self, scan_rows: usize) -> Vec<ColumnName> {
        let mut columns: Vec<ColumnName> = self
            .rows
            .iter()
            .take(scan_rows)
            .flat_map(RawRow::populated_columns)
            .map(str::to_string)
            .collect();
        columns.sort();
        columns.dedup();
        columns
    }
}

/// Reader seam for upload formats.
pub trait RawTableReader: Send + Sync {
    /// Input format produced by this reader.
    fn kind(&self) -> InputKind;
    /// Decode `bytes` into one or more named tables.
    fn read_tables(&self, name: &str, bytes: &[u8]) -> Result<Vec<RawTable>, CockpitError>;
}
