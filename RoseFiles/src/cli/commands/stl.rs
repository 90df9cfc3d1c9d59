//! CLI commands for STL string table lookups

use std::path::Path;

use crate::formats::{RoseFile, StringTableFile};

/// Print the text stored under `key` for one language
pub fn get(path: &Path, key: &str, language: usize, all: bool) -> anyhow::Result<()> {
    let table = StringTableFile::load(path)?;
    let row = table.row_by_key(key)?;
    let entry = row.entry(language)?;

    if !all {
        println!("{}", entry.text);
        return Ok(());
    }

    println!("Key:         {key}");
    println!("ID:          {}", row.id);
    println!("Text:        {}", entry.text);
    if table.table_type.has_description() {
        println!("Description: {}", entry.description);
    }
    if table.table_type.has_messages() {
        println!("Start:       {}", entry.start_message);
        println!("End:         {}", entry.end_message);
    }
    Ok(())
}
