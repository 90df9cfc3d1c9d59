//! STB reading

use std::io::{Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};

use super::{DataColumn, DataFile, STB_IDENTIFIER};
use crate::error::{Error, Result};
use crate::formats::common::identifier_mismatch;
use crate::io::{CodecOptions, RoseReadExt, TextEncoding};

fn check_identifier(identifier: [u8; 4]) -> Result<()> {
    if &identifier == STB_IDENTIFIER {
        return Ok(());
    }
    if &identifier[..3] == b"STB" {
        let version = identifier[3];
        return Err(Error::InvalidVersion {
            format: "STB",
            version: if version.is_ascii_digit() {
                u32::from(version - b'0')
            } else {
                u32::from(version)
            },
        });
    }
    Err(identifier_mismatch(
        "STB1",
        &String::from_utf8_lossy(&identifier),
    ))
}

pub(super) fn read_data_file<R: Read + Seek>(reader: &mut R, options: &CodecOptions) -> Result<DataFile> {
    let encoding = options.encoding_or(TextEncoding::EucKr);

    let mut identifier = [0u8; 4];
    reader.read_exact(&mut identifier)?;
    check_identifier(identifier)?;

    let data_offset = reader.read_u32::<LittleEndian>()?;
    // The stored row count includes the column header row.
    let row_count = reader.read_u32::<LittleEndian>()?.saturating_sub(1) as usize;
    let column_count = reader.read_u32::<LittleEndian>()? as usize;
    let row_height = reader.read_u32::<LittleEndian>()?;

    let root_width = reader.read_u16::<LittleEndian>()?;
    let mut columns = Vec::with_capacity(column_count.min(1024));
    for _ in 0..column_count {
        columns.push(DataColumn {
            name: String::new(),
            width: reader.read_u16::<LittleEndian>()?,
        });
    }

    let root_column = DataColumn {
        name: reader.read_u16_prefixed_string(encoding)?,
        width: root_width,
    };
    for column in &mut columns {
        column.name = reader.read_u16_prefixed_string(encoding)?;
    }

    let mut rows = Vec::with_capacity(row_count.min(1 << 16));
    for _ in 0..row_count {
        let mut cells = Vec::with_capacity(column_count.min(1024));
        cells.push(reader.read_u16_prefixed_string(encoding)?);
        rows.push(cells);
    }

    reader.seek(SeekFrom::Start(u64::from(data_offset)))?;
    for cells in &mut rows {
        for _ in 1..column_count {
            cells.push(reader.read_u16_prefixed_string(encoding)?);
        }
        cells.truncate(column_count);
    }

    tracing::debug!("Read STB: {} rows x {} columns", rows.len(), columns.len());

    Ok(DataFile {
        row_height,
        root_column,
        columns,
        rows,
    })
}
