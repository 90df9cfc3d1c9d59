//! STB data tables
//!
//! Spreadsheet-like game data (items, skills, NPCs...). Every row has one
//! cell per column; cell 0 doubles as the row name and is stored apart from
//! the other cells. A separate root column holds the top-left header.

mod reader;
mod writer;

use std::io::{Read, Seek, Write};

use serde::{Deserialize, Serialize};

use super::RoseFile;
use crate::error::{Error, Result};
use crate::io::CodecOptions;

/// "STB1" identifier
pub const STB_IDENTIFIER: &[u8; 4] = b"STB1";

/// Default display width of new columns.
pub const DEFAULT_COLUMN_WIDTH: u16 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataColumn {
    pub name: String,
    /// Display width in the editor
    pub width: u16,
}

impl DataColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            width: DEFAULT_COLUMN_WIDTH,
        }
    }
}

impl Default for DataColumn {
    fn default() -> Self {
        Self::new("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DataFileRows")]
pub struct DataFile {
    pub row_height: u32,
    pub root_column: DataColumn,
    columns: Vec<DataColumn>,
    rows: Vec<Vec<String>>,
}

/// Unchecked serialized form of a [`DataFile`].
#[derive(Deserialize)]
struct DataFileRows {
    row_height: u32,
    root_column: DataColumn,
    columns: Vec<DataColumn>,
    rows: Vec<Vec<String>>,
}

impl TryFrom<DataFileRows> for DataFile {
    type Error = Error;

    fn try_from(table: DataFileRows) -> Result<Self> {
        let expected = table.columns.len();
        if let Some(row) = table.rows.iter().find(|row| row.len() != expected) {
            return Err(Error::ShapeMismatch {
                what: "data table row",
                expected,
                actual: row.len(),
            });
        }
        Ok(Self {
            row_height: table.row_height,
            root_column: table.root_column,
            columns: table.columns,
            rows: table.rows,
        })
    }
}

impl Default for DataFile {
    fn default() -> Self {
        Self {
            row_height: 20,
            root_column: DataColumn::default(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }
}

impl DataFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[DataColumn] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Result<&DataColumn> {
        self.columns.get(index).ok_or(Error::IndexOutOfRange {
            what: "column",
            index,
            len: self.columns.len(),
        })
    }

    /// Index of the first column called `name`.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|column| column.name == name)
            .ok_or_else(|| Error::KeyNotFound(name.to_string()))
    }

    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn row(&self, index: usize) -> Result<&[String]> {
        self.rows
            .get(index)
            .map(Vec::as_slice)
            .ok_or(Error::IndexOutOfRange {
                what: "row",
                index,
                len: self.rows.len(),
            })
    }

    fn check_column(&self, column: usize) -> Result<()> {
        if column < self.columns.len() {
            Ok(())
        } else {
            Err(Error::IndexOutOfRange {
                what: "column",
                index: column,
                len: self.columns.len(),
            })
        }
    }

    pub fn cell(&self, row: usize, column: usize) -> Result<&str> {
        self.check_column(column)?;
        Ok(&self.row(row)?[column])
    }

    pub fn set_cell(&mut self, row: usize, column: usize, value: impl Into<String>) -> Result<()> {
        self.check_column(column)?;
        let len = self.rows.len();
        let cells = self.rows.get_mut(row).ok_or(Error::IndexOutOfRange {
            what: "row",
            index: row,
            len,
        })?;
        cells[column] = value.into();
        Ok(())
    }

    /// Append an empty row and return its index.
    pub fn add_row(&mut self) -> usize {
        self.rows.push(vec![String::new(); self.columns.len()]);
        self.rows.len() - 1
    }

    pub fn remove_row(&mut self, index: usize) -> Result<Vec<String>> {
        if index >= self.rows.len() {
            return Err(Error::IndexOutOfRange {
                what: "row",
                index,
                len: self.rows.len(),
            });
        }
        Ok(self.rows.remove(index))
    }

    /// Append a column, adding an empty cell to every row.
    pub fn add_column(&mut self, name: &str) -> Result<usize> {
        if self.columns.iter().any(|column| column.name == name) {
            return Err(Error::DuplicateKey(name.to_string()));
        }
        self.columns.push(DataColumn::new(name));
        for row in &mut self.rows {
            row.push(String::new());
        }
        Ok(self.columns.len() - 1)
    }

    pub fn remove_column(&mut self, index: usize) -> Result<DataColumn> {
        self.check_column(index)?;
        for row in &mut self.rows {
            row.remove(index);
        }
        Ok(self.columns.remove(index))
    }
}

impl RoseFile for DataFile {
    const FORMAT: &'static str = "STB";

    fn read_from<R: Read + Seek>(reader: &mut R, options: &CodecOptions) -> Result<Self> {
        reader::read_data_file(reader, options)
    }

    fn write_to<W: Write + Seek>(&self, writer: &mut W, options: &CodecOptions) -> Result<()> {
        writer::write_data_file(writer, self, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_table() -> DataFile {
        let mut table = DataFile::new();
        table.root_column.name = "ID".to_string();
        table.add_column("NAME").unwrap();
        table.add_column("TYPE").unwrap();
        table.add_column("PRICE").unwrap();
        for (name, kind, price) in [("Sword", "1", "100"), ("검", "2", "250")] {
            let row = table.add_row();
            table.set_cell(row, 0, name).unwrap();
            table.set_cell(row, 1, kind).unwrap();
            table.set_cell(row, 2, price).unwrap();
        }
        table
    }

    #[test]
    fn test_row_count_includes_header_row() {
        let bytes = sample_table().to_bytes().unwrap();
        assert_eq!(&bytes[..4], b"STB1");
        assert_eq!(u32::from_le_bytes(bytes[8..12].try_into().unwrap()), 3);
        assert_eq!(u32::from_le_bytes(bytes[12..16].try_into().unwrap()), 3);
    }

    #[test]
    fn test_round_trip() {
        let table = sample_table();
        let bytes = table.to_bytes().unwrap();
        let loaded = DataFile::from_bytes(&bytes).unwrap();
        assert_eq!(loaded, table);
        assert_eq!(loaded.cell(1, 0).unwrap(), "검");
        assert_eq!(loaded.cell(0, 2).unwrap(), "100");
        assert_eq!(loaded.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_column_editing() {
        let mut table = sample_table();
        assert_eq!(table.column_index("TYPE").unwrap(), 1);
        assert!(matches!(table.add_column("PRICE"), Err(Error::DuplicateKey(_))));
        assert!(matches!(table.column_index("WEIGHT"), Err(Error::KeyNotFound(_))));

        let removed = table.remove_column(1).unwrap();
        assert_eq!(removed.name, "TYPE");
        assert_eq!(table.row(0).unwrap(), ["Sword", "100"]);

        let index = table.add_column("WEIGHT").unwrap();
        assert_eq!(index, 2);
        assert_eq!(table.cell(1, 2).unwrap(), "");
    }

    #[test]
    fn test_out_of_range_accessors() {
        let mut table = sample_table();
        assert!(matches!(
            table.cell(2, 0),
            Err(Error::IndexOutOfRange { what: "row", index: 2, len: 2 })
        ));
        assert!(matches!(
            table.cell(0, 3),
            Err(Error::IndexOutOfRange { what: "column", index: 3, len: 3 })
        ));
        assert!(table.set_cell(5, 0, "x").is_err());
        assert!(table.remove_row(2).is_err());
        assert!(table.remove_column(3).is_err());

        table.remove_row(0).unwrap();
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn test_deserialize_checks_row_width() {
        let table = sample_table();
        let json = serde_json::to_string(&table).unwrap();
        let parsed: DataFile = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, table);

        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["rows"][1] = serde_json::json!(["Dagger"]);
        let message = serde_json::from_value::<DataFile>(value).unwrap_err().to_string();
        assert!(message.contains("data table row has 1 cells, expected 3"), "{message}");
    }

    #[test]
    fn test_rejects_other_versions() {
        let mut bytes = sample_table().to_bytes().unwrap();
        bytes[3] = b'0';
        assert!(matches!(
            DataFile::from_bytes(&bytes),
            Err(Error::InvalidVersion { format: "STB", version: 0 })
        ));

        bytes[..4].copy_from_slice(b"ZMS0");
        assert!(matches!(
            DataFile::from_bytes(&bytes),
            Err(Error::IdentifierMismatch { .. })
        ));
    }
}
