//! HIM height maps
//!
//! Header `(i32 width, i32 height, i32 grid count, f32 grid size)`, row-major
//! `f32` heights, then the patch bounds used for culling.

use std::io::{Read, Seek, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

use super::RoseFile;
use crate::error::Result;
use crate::io::{CodecOptions, RoseReadExt, RoseWriteExt, TextEncoding, count, dimension};
use crate::types::Grid;

const PATCH_NAME: &str = "quad";

/// Height range of one terrain patch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeightmapPatch {
    pub maximum: f32,
    pub minimum: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightmapFile {
    heights: Grid<f32>,
    pub grid_count: i32,
    pub grid_size: f32,
    pub patch_name: String,
    pub patches: Vec<HeightmapPatch>,
    pub quad_patches: Vec<HeightmapPatch>,
}

impl Default for HeightmapFile {
    fn default() -> Self {
        Self {
            heights: Grid::default(),
            grid_count: 4,
            grid_size: 250.0,
            patch_name: PATCH_NAME.to_string(),
            patches: Vec::new(),
            quad_patches: Vec::new(),
        }
    }
}

impl HeightmapFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(width: usize, height: usize) -> Self {
        Self {
            heights: Grid::new(width, height),
            ..Self::default()
        }
    }

    pub fn width(&self) -> usize {
        self.heights.width()
    }

    pub fn height(&self) -> usize {
        self.heights.height()
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.heights.resize(width, height);
    }

    pub fn height_at(&self, x: usize, y: usize) -> Result<f32> {
        self.heights.get(x, y).copied()
    }

    pub fn set_height_at(&mut self, x: usize, y: usize, value: f32) -> Result<()> {
        self.heights.set(x, y, value)
    }

    pub fn heights(&self) -> &Grid<f32> {
        &self.heights
    }

    /// Lowest and highest sample, or `None` for an empty map.
    pub fn range(&self) -> Option<(f32, f32)> {
        self.heights.iter().fold(None, |range, &h| match range {
            None => Some((h, h)),
            Some((lo, hi)) => Some((lo.min(h), hi.max(h))),
        })
    }
}

fn read_patches<R: Read>(reader: &mut R, what: &'static str) -> Result<Vec<HeightmapPatch>> {
    let patch_count = dimension(what, reader.read_i32::<LittleEndian>()?)?;
    (0..patch_count)
        .map(|_| {
            Ok(HeightmapPatch {
                maximum: reader.read_f32::<LittleEndian>()?,
                minimum: reader.read_f32::<LittleEndian>()?,
            })
        })
        .collect()
}

fn write_patches<W: Write>(writer: &mut W, what: &'static str, patches: &[HeightmapPatch]) -> Result<()> {
    writer.write_i32::<LittleEndian>(count(what, patches.len())?)?;
    for patch in patches {
        writer.write_f32::<LittleEndian>(patch.maximum)?;
        writer.write_f32::<LittleEndian>(patch.minimum)?;
    }
    Ok(())
}

impl RoseFile for HeightmapFile {
    const FORMAT: &'static str = "HIM";

    fn read_from<R: Read + Seek>(reader: &mut R, options: &CodecOptions) -> Result<Self> {
        let encoding = options.encoding_or(TextEncoding::EucKr);
        let width = dimension("height map width", reader.read_i32::<LittleEndian>()?)?;
        let height = dimension("height map height", reader.read_i32::<LittleEndian>()?)?;
        let grid_count = reader.read_i32::<LittleEndian>()?;
        let grid_size = reader.read_f32::<LittleEndian>()?;

        let mut samples = Vec::with_capacity(width.saturating_mul(height).min(1 << 20));
        for _ in 0..width.saturating_mul(height) {
            samples.push(reader.read_f32::<LittleEndian>()?);
        }

        let patch_name = reader.read_u8_prefixed_string(encoding)?;
        let patches = read_patches(reader, "patch count")?;
        let quad_patches = read_patches(reader, "quad patch count")?;

        tracing::debug!("Read HIM: {}x{} samples, {} patches", width, height, patches.len());

        Ok(Self {
            heights: Grid::from_cells(width, height, samples)?,
            grid_count,
            grid_size,
            patch_name,
            patches,
            quad_patches,
        })
    }

    fn write_to<W: Write + Seek>(&self, writer: &mut W, options: &CodecOptions) -> Result<()> {
        let encoding = options.encoding_or(TextEncoding::EucKr);
        writer.write_i32::<LittleEndian>(count("height map columns", self.width())?)?;
        writer.write_i32::<LittleEndian>(count("height map rows", self.height())?)?;
        writer.write_i32::<LittleEndian>(self.grid_count)?;
        writer.write_f32::<LittleEndian>(self.grid_size)?;
        for sample in self.heights.iter() {
            writer.write_f32::<LittleEndian>(*sample)?;
        }

        writer.write_u8_prefixed_string(&self.patch_name, encoding)?;
        write_patches(writer, "patches", &self.patches)?;
        write_patches(writer, "quad patches", &self.quad_patches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_round_trip() {
        let mut map = HeightmapFile::with_size(2, 2);
        map.set_height_at(0, 1, 12.5).unwrap();
        map.set_height_at(1, 1, -3.0).unwrap();
        map.patches = vec![HeightmapPatch {
            maximum: 12.5,
            minimum: -3.0,
        }];

        let bytes = map.to_bytes().unwrap();
        // (0, 1) is the third sample in row-major order.
        assert_eq!(&bytes[16 + 8..16 + 12], &12.5f32.to_le_bytes());

        let loaded = HeightmapFile::from_bytes(&bytes).unwrap();
        assert_eq!(loaded, map);
        assert_eq!(loaded.patch_name, "quad");
        assert_eq!(loaded.range(), Some((-3.0, 12.5)));
    }

    #[test]
    fn test_empty_map_has_no_range() {
        assert_eq!(HeightmapFile::new().range(), None);
    }

    #[test]
    fn test_negative_width_rejected() {
        let mut bytes = HeightmapFile::with_size(1, 1).to_bytes().unwrap();
        bytes[..4].copy_from_slice(&(-1i32).to_le_bytes());
        assert!(matches!(
            HeightmapFile::from_bytes(&bytes).unwrap_err(),
            crate::Error::InvalidDimension { value: -1, .. }
        ));
    }
}
