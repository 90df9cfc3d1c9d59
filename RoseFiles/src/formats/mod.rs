//! File format handlers for ROSE resource formats
//!
//! Every document type implements [`RoseFile`], which provides stream and
//! path based load/save on top of the per-format `read_from` / `write_to`.

pub mod common;

pub mod aip;
pub mod him;
pub mod ifo;
pub mod stb;
pub mod stl;
pub mod til;
pub mod zmo;
pub mod zms;
pub mod zon;
pub mod zsc;

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, Write};
use std::path::Path;

use crate::error::Result;
use crate::io::CodecOptions;

// Re-export main document types
pub use aip::ArtificialIntelligenceFile;
pub use him::HeightmapFile;
pub use ifo::MapDataFile;
pub use stb::DataFile;
pub use stl::StringTableFile;
pub use til::TileFile;
pub use zmo::AnimationFile;
pub use zms::ModelFile;
pub use zon::ZoneFile;
pub use zsc::ModelListFile;

/// A document that can be read from and written to a seekable stream.
pub trait RoseFile: Sized + Default {
    /// Short format name used in logs and errors.
    const FORMAT: &'static str;

    /// Parse a complete document from `reader`.
    fn read_from<R: Read + Seek>(reader: &mut R, options: &CodecOptions) -> Result<Self>;

    /// Serialize the complete document to `writer`.
    fn write_to<W: Write + Seek>(&self, writer: &mut W, options: &CodecOptions) -> Result<()>;

    /// Load a document from disk with default options.
    fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with(path, &CodecOptions::default())
    }

    fn load_with<P: AsRef<Path>>(path: P, options: &CodecOptions) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = BufReader::new(File::open(path)?);
        let document = Self::read_from(&mut reader, options).map_err(|e| e.with_path(path))?;
        tracing::debug!("Loaded {} from {}", Self::FORMAT, path.display());
        Ok(document)
    }

    /// Save a document to disk with default options, replacing the file.
    fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.save_with(path, &CodecOptions::default())
    }

    fn save_with<P: AsRef<Path>>(&self, path: P, options: &CodecOptions) -> Result<()> {
        let path = path.as_ref();
        // Encode fully first so a failed write leaves the old file intact.
        let mut cursor = Cursor::new(Vec::new());
        self.write_to(&mut cursor, options)?;
        std::fs::write(path, cursor.into_inner())?;
        tracing::debug!("Saved {} to {}", Self::FORMAT, path.display());
        Ok(())
    }

    /// Parse a document held in memory.
    fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::read_from(&mut Cursor::new(data), &CodecOptions::default())
    }

    /// Serialize a document into memory.
    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write_to(&mut cursor, &CodecOptions::default())?;
        Ok(cursor.into_inner())
    }

    /// Restore default field values and clear all collections.
    fn reset(&mut self) {
        *self = Self::default();
    }
}
