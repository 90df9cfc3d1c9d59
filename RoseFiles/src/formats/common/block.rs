//! Block offset tables
//!
//! Layout: `u32` block count, then `count` pairs of `(u32 type, u32 absolute
//! offset)`. Block bodies live anywhere after the table; the offsets are the
//! only link, so header order and body order are independent.

use std::io::{Read, Seek, SeekFrom, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::io::{count, tell_u32};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockEntry {
    pub block_type: u32,
    pub offset: u32,
}

/// Read the block count and every `(type, offset)` pair.
pub fn read_block_table<R: Read>(reader: &mut R) -> Result<Vec<BlockEntry>> {
    let block_count = reader.read_u32::<LittleEndian>()?;
    let mut entries = Vec::with_capacity(block_count.min(64) as usize);
    for _ in 0..block_count {
        let block_type = reader.read_u32::<LittleEndian>()?;
        let offset = reader.read_u32::<LittleEndian>()?;
        entries.push(BlockEntry { block_type, offset });
    }
    Ok(entries)
}

/// Seek to each block in declaration order and hand it to `visit`.
///
/// `visit` returns `false` for block types it does not know; those are
/// skipped.
pub fn visit_blocks<R, F>(reader: &mut R, format: &'static str, mut visit: F) -> Result<()>
where
    R: Read + Seek,
    F: FnMut(&mut R, u32) -> Result<bool>,
{
    let entries = read_block_table(reader)?;
    for entry in entries {
        reader.seek(SeekFrom::Start(u64::from(entry.offset)))?;
        if !visit(reader, entry.block_type)? {
            tracing::debug!(
                "Skipping unknown {} block type {} at {:#x}",
                format,
                entry.block_type,
                entry.offset
            );
        }
    }
    Ok(())
}

/// Reserve a block table, record block offsets, then backpatch.
pub struct BlockTableWriter {
    table_offset: u64,
    declared: usize,
    entries: Vec<BlockEntry>,
}

impl BlockTableWriter {
    /// Write the block count and `block_count` placeholder pairs.
    pub fn begin<W: Write + Seek>(writer: &mut W, block_count: usize) -> Result<Self> {
        let table_offset = writer.stream_position()?;
        writer.write_u32::<LittleEndian>(count("blocks", block_count)?)?;
        for _ in 0..block_count {
            writer.write_u32::<LittleEndian>(0)?;
            writer.write_u32::<LittleEndian>(0)?;
        }
        Ok(Self {
            table_offset,
            declared: block_count,
            entries: Vec::with_capacity(block_count),
        })
    }

    /// Mark the current position as the start of a block of `block_type`.
    pub fn begin_block<W: Seek>(&mut self, writer: &mut W, block_type: u32) -> Result<()> {
        let offset = tell_u32(writer)?;
        self.entries.push(BlockEntry { block_type, offset });
        Ok(())
    }

    /// Overwrite the placeholders with the recorded pairs.
    pub fn finish<W: Write + Seek>(self, writer: &mut W) -> Result<()> {
        debug_assert_eq!(
            self.entries.len(),
            self.declared,
            "every declared block must be written before backpatching"
        );
        let end = writer.stream_position()?;
        writer.seek(SeekFrom::Start(self.table_offset + 4))?;
        for entry in &self.entries {
            writer.write_u32::<LittleEndian>(entry.block_type)?;
            writer.write_u32::<LittleEndian>(entry.offset)?;
        }
        writer.seek(SeekFrom::Start(end))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_backpatched_table() {
        let mut cursor = Cursor::new(Vec::new());
        let mut table = BlockTableWriter::begin(&mut cursor, 2).unwrap();
        table.begin_block(&mut cursor, 7).unwrap();
        cursor.write_u32::<LittleEndian>(0xAAAA).unwrap();
        table.begin_block(&mut cursor, 3).unwrap();
        cursor.write_u16::<LittleEndian>(0xBBBB).unwrap();
        table.finish(&mut cursor).unwrap();
        assert_eq!(cursor.position(), 26);

        cursor.set_position(0);
        let entries = read_block_table(&mut cursor).unwrap();
        assert_eq!(
            entries,
            vec![
                BlockEntry {
                    block_type: 7,
                    offset: 20
                },
                BlockEntry {
                    block_type: 3,
                    offset: 24
                },
            ]
        );
    }

    #[test]
    fn test_visit_skips_unknown_blocks() {
        let mut cursor = Cursor::new(Vec::new());
        let mut table = BlockTableWriter::begin(&mut cursor, 2).unwrap();
        table.begin_block(&mut cursor, 99).unwrap();
        cursor.write_u8(1).unwrap();
        table.begin_block(&mut cursor, 1).unwrap();
        cursor.write_u8(2).unwrap();
        table.finish(&mut cursor).unwrap();

        cursor.set_position(0);
        let mut seen = Vec::new();
        visit_blocks(&mut cursor, "TEST", |reader, block_type| {
            if block_type == 1 {
                seen.push(reader.read_u8()?);
                Ok(true)
            } else {
                Ok(false)
            }
        })
        .unwrap();
        assert_eq!(seen, vec![2]);
    }
}
