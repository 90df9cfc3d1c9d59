//! TIL tile grids
//!
//! `i32` width, `i32` height, then row-major cells.

use std::io::{Read, Seek, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

use super::RoseFile;
use crate::error::Result;
use crate::io::{CodecOptions, count, dimension};
use crate::types::Grid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileCell {
    pub brush_id: u8,
    pub tile_index: u8,
    pub tile_set: u8,
    /// Index into the zone's tile list.
    pub tile_id: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TileFile {
    tiles: Grid<TileCell>,
}

impl TileFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(width: usize, height: usize) -> Self {
        Self {
            tiles: Grid::new(width, height),
        }
    }

    pub fn width(&self) -> usize {
        self.tiles.width()
    }

    pub fn height(&self) -> usize {
        self.tiles.height()
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.tiles.resize(width, height);
    }

    pub fn tile(&self, x: usize, y: usize) -> Result<&TileCell> {
        self.tiles.get(x, y)
    }

    pub fn set_tile(&mut self, x: usize, y: usize, cell: TileCell) -> Result<()> {
        self.tiles.set(x, y, cell)
    }

    pub fn tiles(&self) -> &Grid<TileCell> {
        &self.tiles
    }
}

impl RoseFile for TileFile {
    const FORMAT: &'static str = "TIL";

    fn read_from<R: Read + Seek>(reader: &mut R, _options: &CodecOptions) -> Result<Self> {
        let width = dimension("tile grid width", reader.read_i32::<LittleEndian>()?)?;
        let height = dimension("tile grid height", reader.read_i32::<LittleEndian>()?)?;

        let mut cells = Vec::with_capacity(width.saturating_mul(height).min(1 << 16));
        for _ in 0..width.saturating_mul(height) {
            cells.push(TileCell {
                brush_id: reader.read_u8()?,
                tile_index: reader.read_u8()?,
                tile_set: reader.read_u8()?,
                tile_id: reader.read_i32::<LittleEndian>()?,
            });
        }

        Ok(Self {
            tiles: Grid::from_cells(width, height, cells)?,
        })
    }

    fn write_to<W: Write + Seek>(&self, writer: &mut W, _options: &CodecOptions) -> Result<()> {
        writer.write_i32::<LittleEndian>(count("tile grid columns", self.width())?)?;
        writer.write_i32::<LittleEndian>(count("tile grid rows", self.height())?)?;
        for cell in self.tiles.iter() {
            writer.write_u8(cell.brush_id)?;
            writer.write_u8(cell.tile_index)?;
            writer.write_u8(cell.tile_set)?;
            writer.write_i32::<LittleEndian>(cell.tile_id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_round_trip_row_major() {
        let mut tiles = TileFile::with_size(3, 2);
        tiles
            .set_tile(
                1,
                0,
                TileCell {
                    brush_id: 1,
                    tile_index: 2,
                    tile_set: 3,
                    tile_id: 40,
                },
            )
            .unwrap();

        let bytes = tiles.to_bytes().unwrap();
        assert_eq!(bytes.len(), 8 + 6 * 7);
        // Cell (1, 0) is the second cell stored.
        assert_eq!(&bytes[8 + 7..8 + 10], &[1, 2, 3]);

        let loaded = TileFile::from_bytes(&bytes).unwrap();
        assert_eq!(loaded, tiles);
        assert_eq!(loaded.tile(1, 0).unwrap().tile_id, 40);
    }

    #[test]
    fn test_out_of_range() {
        let tiles = TileFile::with_size(2, 2);
        assert!(tiles.tile(2, 0).is_err());
    }

    #[test]
    fn test_truncated_input() {
        let mut bytes = TileFile::with_size(2, 2).to_bytes().unwrap();
        bytes.truncate(bytes.len() - 1);
        assert!(matches!(
            TileFile::from_bytes(&bytes).unwrap_err(),
            crate::Error::Io(_)
        ));
    }
}
