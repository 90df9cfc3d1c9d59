//! STB writing

use std::io::{Seek, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use super::{DataFile, STB_IDENTIFIER};
use crate::error::Result;
use crate::io::{CodecOptions, RoseWriteExt, TextEncoding, backpatch_u32, count, tell_u32};

pub(super) fn write_data_file<W: Write + Seek>(
    writer: &mut W,
    table: &DataFile,
    options: &CodecOptions,
) -> Result<()> {
    let encoding = options.encoding_or(TextEncoding::EucKr);
    let start = writer.stream_position()?;

    writer.write_all(STB_IDENTIFIER)?;
    writer.write_u32::<LittleEndian>(0)?;
    writer.write_u32::<LittleEndian>(count("rows", table.rows.len() + 1)?)?;
    writer.write_u32::<LittleEndian>(count("columns", table.columns.len())?)?;
    writer.write_u32::<LittleEndian>(table.row_height)?;

    writer.write_u16::<LittleEndian>(table.root_column.width)?;
    for column in &table.columns {
        writer.write_u16::<LittleEndian>(column.width)?;
    }
    writer.write_u16_prefixed_string(&table.root_column.name, encoding)?;
    for column in &table.columns {
        writer.write_u16_prefixed_string(&column.name, encoding)?;
    }

    for cells in &table.rows {
        let name = cells.first().map_or("", String::as_str);
        writer.write_u16_prefixed_string(name, encoding)?;
    }

    let data_offset = tell_u32(writer)?;
    backpatch_u32(writer, start + 4, data_offset)?;
    for cells in &table.rows {
        for cell in cells.iter().skip(1) {
            writer.write_u16_prefixed_string(cell, encoding)?;
        }
    }
    Ok(())
}
