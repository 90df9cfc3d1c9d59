//! STL string tables
//!
//! Localized strings keyed by a string id. The table type decides how many
//! strings each row carries per language:
//!
//! | Type     | Tag      | Payload per row                                   |
//! |----------|----------|---------------------------------------------------|
//! | Normal   | `NRST01` | text                                              |
//! | Item     | `ITST01` | text, description                                 |
//! | Quest    | `QEST01` | text, description, start message, end message     |
//!
//! Strings are UTF-8 with a 7-bit varint length prefix. Layout: type tag,
//! `i32` row count, `(key, i32 id)` per row, `i32` language count, one `i32`
//! offset per language to a table of per-row `i32` payload offsets.

use std::io::{Read, Seek, SeekFrom, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::RoseFile;
use crate::error::{Error, Result};
use crate::io::{CodecOptions, RoseReadExt, RoseWriteExt, TextEncoding, backpatch_u32, count, dimension, tell_u32};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StringTableType {
    #[default]
    Normal,
    Item,
    Quest,
}

impl StringTableType {
    pub fn identifier(self) -> &'static str {
        match self {
            StringTableType::Normal => "NRST01",
            StringTableType::Item => "ITST01",
            StringTableType::Quest => "QEST01",
        }
    }

    pub fn from_identifier(identifier: &str) -> Result<Self> {
        match identifier {
            "NRST01" => Ok(StringTableType::Normal),
            "ITST01" => Ok(StringTableType::Item),
            "QEST01" => Ok(StringTableType::Quest),
            other => Err(Error::UnknownTableType(other.to_string())),
        }
    }

    pub fn has_description(self) -> bool {
        matches!(self, StringTableType::Item | StringTableType::Quest)
    }

    pub fn has_messages(self) -> bool {
        self == StringTableType::Quest
    }
}

/// The strings of one row in one language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringTableEntry {
    pub text: String,
    pub description: String,
    pub start_message: String,
    pub end_message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringTableRow {
    pub id: i32,
    /// One entry per language, indexed by language.
    entries: Vec<StringTableEntry>,
}

impl StringTableRow {
    pub fn entries(&self) -> &[StringTableEntry] {
        &self.entries
    }

    pub fn entry(&self, language: usize) -> Result<&StringTableEntry> {
        self.entries.get(language).ok_or(Error::IndexOutOfRange {
            what: "language",
            index: language,
            len: self.entries.len(),
        })
    }

    pub fn entry_mut(&mut self, language: usize) -> Result<&mut StringTableEntry> {
        let len = self.entries.len();
        self.entries.get_mut(language).ok_or(Error::IndexOutOfRange {
            what: "language",
            index: language,
            len,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringTableFile {
    pub table_type: StringTableType,
    language_count: usize,
    rows: IndexMap<String, StringTableRow>,
}

impl StringTableFile {
    pub fn new(table_type: StringTableType) -> Self {
        Self {
            table_type,
            ..Self::default()
        }
    }

    pub fn language_count(&self) -> usize {
        self.language_count
    }

    /// Change the number of languages, truncating or default-filling every row.
    pub fn set_language_count(&mut self, language_count: usize) {
        self.language_count = language_count;
        for row in self.rows.values_mut() {
            row.entries.resize_with(language_count, StringTableEntry::default);
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.rows.contains_key(key)
    }

    /// Keys in file order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    pub fn rows(&self) -> impl Iterator<Item = (&str, &StringTableRow)> {
        self.rows.iter().map(|(key, row)| (key.as_str(), row))
    }

    /// Row at position `index` in file order.
    pub fn row(&self, index: usize) -> Result<(&str, &StringTableRow)> {
        self.rows
            .get_index(index)
            .map(|(key, row)| (key.as_str(), row))
            .ok_or(Error::IndexOutOfRange {
                what: "string table row",
                index,
                len: self.rows.len(),
            })
    }

    pub fn row_by_key(&self, key: &str) -> Result<&StringTableRow> {
        self.rows
            .get(key)
            .ok_or_else(|| Error::KeyNotFound(key.to_string()))
    }

    pub fn row_by_key_mut(&mut self, key: &str) -> Result<&mut StringTableRow> {
        self.rows
            .get_mut(key)
            .ok_or_else(|| Error::KeyNotFound(key.to_string()))
    }

    /// Append a row with empty strings in every language.
    pub fn add_row(&mut self, key: &str, id: i32) -> Result<&mut StringTableRow> {
        if self.rows.contains_key(key) {
            return Err(Error::DuplicateKey(key.to_string()));
        }
        let row = StringTableRow {
            id,
            entries: vec![StringTableEntry::default(); self.language_count],
        };
        let (index, _) = self.rows.insert_full(key.to_string(), row);
        Ok(&mut self.rows[index])
    }

    /// Remove a row, keeping the order of the others.
    pub fn remove_row(&mut self, key: &str) -> Result<StringTableRow> {
        self.rows
            .shift_remove(key)
            .ok_or_else(|| Error::KeyNotFound(key.to_string()))
    }

    /// Text of `key` in `language`.
    pub fn text(&self, key: &str, language: usize) -> Result<&str> {
        Ok(&self.row_by_key(key)?.entry(language)?.text)
    }

    pub fn set_text(&mut self, key: &str, language: usize, text: impl Into<String>) -> Result<()> {
        self.row_by_key_mut(key)?.entry_mut(language)?.text = text.into();
        Ok(())
    }

    fn read_entry<R: Read>(&self, reader: &mut R, encoding: TextEncoding) -> Result<StringTableEntry> {
        let mut entry = StringTableEntry {
            text: reader.read_varint_prefixed_string(encoding)?,
            ..StringTableEntry::default()
        };
        if self.table_type.has_description() {
            entry.description = reader.read_varint_prefixed_string(encoding)?;
        }
        if self.table_type.has_messages() {
            entry.start_message = reader.read_varint_prefixed_string(encoding)?;
            entry.end_message = reader.read_varint_prefixed_string(encoding)?;
        }
        Ok(entry)
    }

    fn write_entry<W: Write>(&self, writer: &mut W, entry: &StringTableEntry, encoding: TextEncoding) -> Result<()> {
        writer.write_varint_prefixed_string(&entry.text, encoding)?;
        if self.table_type.has_description() {
            writer.write_varint_prefixed_string(&entry.description, encoding)?;
        }
        if self.table_type.has_messages() {
            writer.write_varint_prefixed_string(&entry.start_message, encoding)?;
            writer.write_varint_prefixed_string(&entry.end_message, encoding)?;
        }
        Ok(())
    }
}

impl RoseFile for StringTableFile {
    const FORMAT: &'static str = "STL";

    fn read_from<R: Read + Seek>(reader: &mut R, options: &CodecOptions) -> Result<Self> {
        let encoding = options.encoding_or(TextEncoding::Utf8);
        let identifier = reader.read_varint_prefixed_string(encoding)?;
        let mut table = Self::new(StringTableType::from_identifier(&identifier)?);

        let row_count = dimension("string table row count", reader.read_i32::<LittleEndian>()?)?;
        let mut keys = Vec::with_capacity(row_count.min(1 << 16));
        for _ in 0..row_count {
            let key = reader.read_varint_prefixed_string(encoding)?;
            let id = reader.read_i32::<LittleEndian>()?;
            keys.push((key, id));
        }

        let language_count = dimension("language count", reader.read_i32::<LittleEndian>()?)?;
        let mut language_offsets = Vec::with_capacity(language_count.min(64));
        for _ in 0..language_count {
            language_offsets.push(reader.read_u32::<LittleEndian>()?);
        }

        let mut languages = Vec::with_capacity(language_offsets.len());
        for table_offset in language_offsets {
            reader.seek(SeekFrom::Start(u64::from(table_offset)))?;
            let mut row_offsets = Vec::with_capacity(row_count.min(1 << 16));
            for _ in 0..row_count {
                row_offsets.push(reader.read_u32::<LittleEndian>()?);
            }

            let mut entries = Vec::with_capacity(row_offsets.len());
            for row_offset in row_offsets {
                reader.seek(SeekFrom::Start(u64::from(row_offset)))?;
                entries.push(table.read_entry(reader, encoding)?);
            }
            languages.push(entries);
        }

        table.language_count = language_count;
        for (row_index, (key, id)) in keys.into_iter().enumerate() {
            let entries = languages
                .iter()
                .map(|language| language[row_index].clone())
                .collect();
            if table.rows.insert(key.clone(), StringTableRow { id, entries }).is_some() {
                return Err(Error::DuplicateKey(key));
            }
        }

        tracing::debug!(
            "Read STL {}: {} rows in {} languages",
            identifier,
            table.rows.len(),
            language_count
        );
        Ok(table)
    }

    fn write_to<W: Write + Seek>(&self, writer: &mut W, options: &CodecOptions) -> Result<()> {
        let encoding = options.encoding_or(TextEncoding::Utf8);
        writer.write_varint_prefixed_string(self.table_type.identifier(), encoding)?;

        writer.write_i32::<LittleEndian>(count("string table rows", self.rows.len())?)?;
        for (key, row) in &self.rows {
            writer.write_varint_prefixed_string(key, encoding)?;
            writer.write_i32::<LittleEndian>(row.id)?;
        }

        writer.write_i32::<LittleEndian>(count("languages", self.language_count)?)?;
        let language_table = writer.stream_position()?;
        for _ in 0..self.language_count {
            writer.write_u32::<LittleEndian>(0)?;
        }

        let mut row_tables = Vec::with_capacity(self.language_count);
        for language in 0..self.language_count {
            let table_offset = tell_u32(writer)?;
            backpatch_u32(writer, language_table + 4 * language as u64, table_offset)?;
            for _ in 0..self.rows.len() {
                writer.write_u32::<LittleEndian>(0)?;
            }
            row_tables.push(u64::from(table_offset));
        }

        for (language, table_offset) in row_tables.into_iter().enumerate() {
            for (row_index, row) in self.rows.values().enumerate() {
                let payload = tell_u32(writer)?;
                backpatch_u32(writer, table_offset + 4 * row_index as u64, payload)?;
                self.write_entry(writer, row.entry(language)?, encoding)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn quest_entry() -> StringTableEntry {
        StringTableEntry {
            text: "Hi".to_string(),
            description: "D".to_string(),
            start_message: "S".to_string(),
            end_message: "E".to_string(),
        }
    }

    fn single_row(table_type: StringTableType) -> StringTableFile {
        let mut table = StringTableFile::new(table_type);
        table.set_language_count(1);
        *table.add_row("K", 7).unwrap().entry_mut(0).unwrap() = quest_entry();
        table
    }

    #[test]
    fn test_normal_table_stores_text_only() {
        let bytes = single_row(StringTableType::Normal).to_bytes().unwrap();
        // tag 7, rows 4, key+id 6, languages 4, language offset 4, row offset 4, text 3
        assert_eq!(bytes.len(), 32);

        let loaded = StringTableFile::from_bytes(&bytes).unwrap();
        let entry = loaded.row_by_key("K").unwrap().entry(0).unwrap();
        assert_eq!(entry.text, "Hi");
        assert_eq!(entry.description, "");
        assert_eq!(entry.start_message, "");
    }

    #[test]
    fn test_quest_table_stores_messages() {
        let table = single_row(StringTableType::Quest);
        let bytes = table.to_bytes().unwrap();
        assert_eq!(bytes.len(), 38);

        let loaded = StringTableFile::from_bytes(&bytes).unwrap();
        assert_eq!(loaded.table_type, StringTableType::Quest);
        assert_eq!(loaded.row_by_key("K").unwrap().entry(0).unwrap(), &quest_entry());
        assert_eq!(loaded, table);
    }

    #[test]
    fn test_item_table_has_description_but_no_messages() {
        let loaded = StringTableFile::from_bytes(&single_row(StringTableType::Item).to_bytes().unwrap()).unwrap();
        let entry = loaded.row_by_key("K").unwrap().entry(0).unwrap();
        assert_eq!(entry.description, "D");
        assert_eq!(entry.end_message, "");
    }

    #[test]
    fn test_multiple_languages_round_trip() {
        let mut table = StringTableFile::new(StringTableType::Item);
        table.set_language_count(2);
        table.add_row("ITEM_001", 1).unwrap();
        table.add_row("ITEM_002", 2).unwrap();
        table.set_text("ITEM_001", 0, "검").unwrap();
        table.set_text("ITEM_001", 1, "Sword").unwrap();
        table.set_text("ITEM_002", 1, "Shield").unwrap();

        let bytes = table.to_bytes().unwrap();
        let loaded = StringTableFile::from_bytes(&bytes).unwrap();
        assert_eq!(loaded, table);
        assert_eq!(loaded.keys().collect::<Vec<_>>(), vec!["ITEM_001", "ITEM_002"]);
        assert_eq!(loaded.text("ITEM_001", 0).unwrap(), "검");
        assert_eq!(loaded.text("ITEM_002", 1).unwrap(), "Shield");
        assert_eq!(loaded.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_accessor_errors() {
        let mut table = single_row(StringTableType::Normal);
        assert!(matches!(table.row_by_key("missing"), Err(Error::KeyNotFound(_))));
        assert!(matches!(table.add_row("K", 1), Err(Error::DuplicateKey(_))));
        assert!(matches!(
            table.text("K", 3),
            Err(Error::IndexOutOfRange {
                what: "language",
                index: 3,
                len: 1
            })
        ));
        assert!(table.row(1).is_err());

        table.remove_row("K").unwrap();
        assert_eq!(table.row_count(), 0);
        assert!(matches!(table.remove_row("K"), Err(Error::KeyNotFound(_))));
    }

    #[test]
    fn test_unknown_table_type() {
        let mut bytes = single_row(StringTableType::Normal).to_bytes().unwrap();
        bytes[1..7].copy_from_slice(b"XXST01");
        assert!(matches!(
            StringTableFile::from_bytes(&bytes),
            Err(Error::UnknownTableType(tag)) if tag == "XXST01"
        ));
    }
}
