//! Extension-based dispatch over every supported document type
//!
//! [`FileType`] maps a file extension to a format, and [`RoseDocument`] holds
//! any loaded document so tools can load, save and convert files without
//! knowing their format up front.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::formats::{
    AnimationFile, ArtificialIntelligenceFile, DataFile, HeightmapFile, MapDataFile,
    ModelFile, ModelListFile, RoseFile, StringTableFile, TileFile, ZoneFile,
};
use crate::io::CodecOptions;

/// A resource format, identified by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileType {
    Zms,
    Zmo,
    Zon,
    Til,
    Him,
    Stl,
    Stb,
    Zsc,
    Ifo,
    Aip,
}

impl FileType {
    pub const ALL: [FileType; 10] = [
        FileType::Zms,
        FileType::Zmo,
        FileType::Zon,
        FileType::Til,
        FileType::Him,
        FileType::Stl,
        FileType::Stb,
        FileType::Zsc,
        FileType::Ifo,
        FileType::Aip,
    ];

    /// Determine the format from an extension (case-insensitive, no dot).
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "zms" => Some(FileType::Zms),
            "zmo" => Some(FileType::Zmo),
            "zon" => Some(FileType::Zon),
            "til" => Some(FileType::Til),
            "him" => Some(FileType::Him),
            "stl" => Some(FileType::Stl),
            "stb" => Some(FileType::Stb),
            "zsc" => Some(FileType::Zsc),
            "ifo" => Some(FileType::Ifo),
            "aip" => Some(FileType::Aip),
            _ => None,
        }
    }

    /// Determine the format of a path from its extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| Error::UnknownFileType(path.to_path_buf()))
    }

    pub fn extension(self) -> &'static str {
        match self {
            FileType::Zms => "zms",
            FileType::Zmo => "zmo",
            FileType::Zon => "zon",
            FileType::Til => "til",
            FileType::Him => "him",
            FileType::Stl => "stl",
            FileType::Stb => "stb",
            FileType::Zsc => "zsc",
            FileType::Ifo => "ifo",
            FileType::Aip => "aip",
        }
    }

    /// Human readable description of the format.
    pub fn description(self) -> &'static str {
        match self {
            FileType::Zms => "model geometry",
            FileType::Zmo => "animation",
            FileType::Zon => "zone description",
            FileType::Til => "tile grid",
            FileType::Him => "height map",
            FileType::Stl => "string table",
            FileType::Stb => "data table",
            FileType::Zsc => "model list",
            FileType::Ifo => "map data",
            FileType::Aip => "AI script",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension().to_ascii_uppercase())
    }
}

/// Any supported document.
#[allow(clippy::large_enum_variant)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", content = "document")]
pub enum RoseDocument {
    Model(ModelFile),
    Animation(AnimationFile),
    Zone(ZoneFile),
    Tiles(TileFile),
    Heightmap(HeightmapFile),
    StringTable(StringTableFile),
    DataTable(DataFile),
    ModelList(ModelListFile),
    MapData(MapDataFile),
    Ai(ArtificialIntelligenceFile),
}

impl RoseDocument {
    /// Load a document, choosing the codec from the path's extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with(path, &CodecOptions::default())
    }

    pub fn load_with(path: impl AsRef<Path>, options: &CodecOptions) -> Result<Self> {
        let path = path.as_ref();
        Ok(match FileType::from_path(path)? {
            FileType::Zms => Self::Model(ModelFile::load_with(path, options)?),
            FileType::Zmo => Self::Animation(AnimationFile::load_with(path, options)?),
            FileType::Zon => Self::Zone(ZoneFile::load_with(path, options)?),
            FileType::Til => Self::Tiles(TileFile::load_with(path, options)?),
            FileType::Him => Self::Heightmap(HeightmapFile::load_with(path, options)?),
            FileType::Stl => Self::StringTable(StringTableFile::load_with(path, options)?),
            FileType::Stb => Self::DataTable(DataFile::load_with(path, options)?),
            FileType::Zsc => Self::ModelList(ModelListFile::load_with(path, options)?),
            FileType::Ifo => Self::MapData(MapDataFile::load_with(path, options)?),
            FileType::Aip => Self::Ai(ArtificialIntelligenceFile::load_with(path, options)?),
        })
    }

    /// Parse a document of a known type held in memory.
    pub fn from_bytes(file_type: FileType, data: &[u8]) -> Result<Self> {
        Ok(match file_type {
            FileType::Zms => Self::Model(ModelFile::from_bytes(data)?),
            FileType::Zmo => Self::Animation(AnimationFile::from_bytes(data)?),
            FileType::Zon => Self::Zone(ZoneFile::from_bytes(data)?),
            FileType::Til => Self::Tiles(TileFile::from_bytes(data)?),
            FileType::Him => Self::Heightmap(HeightmapFile::from_bytes(data)?),
            FileType::Stl => Self::StringTable(StringTableFile::from_bytes(data)?),
            FileType::Stb => Self::DataTable(DataFile::from_bytes(data)?),
            FileType::Zsc => Self::ModelList(ModelListFile::from_bytes(data)?),
            FileType::Ifo => Self::MapData(MapDataFile::from_bytes(data)?),
            FileType::Aip => Self::Ai(ArtificialIntelligenceFile::from_bytes(data)?),
        })
    }

    pub fn file_type(&self) -> FileType {
        match self {
            Self::Model(_) => FileType::Zms,
            Self::Animation(_) => FileType::Zmo,
            Self::Zone(_) => FileType::Zon,
            Self::Tiles(_) => FileType::Til,
            Self::Heightmap(_) => FileType::Him,
            Self::StringTable(_) => FileType::Stl,
            Self::DataTable(_) => FileType::Stb,
            Self::ModelList(_) => FileType::Zsc,
            Self::MapData(_) => FileType::Ifo,
            Self::Ai(_) => FileType::Aip,
        }
    }

    /// Save the document to `path`, whatever its extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.save_with(path, &CodecOptions::default())
    }

    pub fn save_with(&self, path: impl AsRef<Path>, options: &CodecOptions) -> Result<()> {
        match self {
            Self::Model(doc) => doc.save_with(path, options),
            Self::Animation(doc) => doc.save_with(path, options),
            Self::Zone(doc) => doc.save_with(path, options),
            Self::Tiles(doc) => doc.save_with(path, options),
            Self::Heightmap(doc) => doc.save_with(path, options),
            Self::StringTable(doc) => doc.save_with(path, options),
            Self::DataTable(doc) => doc.save_with(path, options),
            Self::ModelList(doc) => doc.save_with(path, options),
            Self::MapData(doc) => doc.save_with(path, options),
            Self::Ai(doc) => doc.save_with(path, options),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            Self::Model(doc) => doc.to_bytes(),
            Self::Animation(doc) => doc.to_bytes(),
            Self::Zone(doc) => doc.to_bytes(),
            Self::Tiles(doc) => doc.to_bytes(),
            Self::Heightmap(doc) => doc.to_bytes(),
            Self::StringTable(doc) => doc.to_bytes(),
            Self::DataTable(doc) => doc.to_bytes(),
            Self::ModelList(doc) => doc.to_bytes(),
            Self::MapData(doc) => doc.to_bytes(),
            Self::Ai(doc) => doc.to_bytes(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// One-line description of the document contents.
    pub fn summary(&self) -> String {
        match self {
            Self::Model(m) => format!(
                "{} vertices, {} triangles, {} bones, {} uv sets",
                m.vertices.len(),
                m.indices.len(),
                m.bone_table.len(),
                m.uv_set_count()
            ),
            Self::Animation(a) => format!(
                "{} frames at {} fps, {} channels",
                a.frame_count,
                a.frames_per_second,
                a.channels.len()
            ),
            Self::Zone(z) => format!(
                "{}x{} grid, {} event points, {} textures, {} tiles",
                z.width(),
                z.height(),
                z.event_points.len(),
                z.textures.len(),
                z.tiles.len()
            ),
            Self::Tiles(t) => format!("{}x{} tiles", t.width(), t.height()),
            Self::Heightmap(h) => match h.range() {
                Some((min, max)) => {
                    format!("{}x{} heights, range {min}..{max}", h.width(), h.height())
                }
                None => format!("{}x{} heights", h.width(), h.height()),
            },
            Self::StringTable(s) => format!(
                "{:?} table, {} rows, {} languages",
                s.table_type,
                s.row_count(),
                s.language_count()
            ),
            Self::DataTable(d) => format!("{} rows, {} columns", d.row_count(), d.column_count()),
            Self::ModelList(z) => format!(
                "{} models, {} materials, {} effects, {} objects",
                z.models.len(),
                z.materials.len(),
                z.effects.len(),
                z.objects.len()
            ),
            Self::MapData(i) => format!("{} objects", i.object_count()),
            Self::Ai(a) => format!(
                "{} patterns, {} events",
                a.patterns.len(),
                a.event_count()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[test]
    fn test_from_extension() {
        assert_eq!(FileType::from_extension("ZMS"), Some(FileType::Zms));
        assert_eq!(FileType::from_extension("stb"), Some(FileType::Stb));
        assert_eq!(FileType::from_extension("dds"), None);

        for file_type in FileType::ALL {
            assert_eq!(FileType::from_extension(file_type.extension()), Some(file_type));
        }
    }

    #[test]
    fn test_unknown_extension() {
        let path = PathBuf::from("3DDATA/TERRAIN/readme.txt");
        match FileType::from_path(&path) {
            Err(Error::UnknownFileType(p)) => assert_eq!(p, path),
            other => panic!("expected UnknownFileType, got {other:?}"),
        }
        assert!(FileType::from_path(Path::new("LIST_NPC")).is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let mut table = DataFile::new();
        table.add_column("NAME").unwrap();
        let row = table.add_row();
        table.set_cell(row, 0, "Cart").unwrap();

        let document = RoseDocument::DataTable(table);
        let json = document.to_json().unwrap();
        assert!(json.contains("\"format\": \"DataTable\""));

        let parsed = RoseDocument::from_json(&json).unwrap();
        assert_eq!(parsed, document);
        assert_eq!(parsed.file_type(), FileType::Stb);
        assert_eq!(parsed.to_bytes().unwrap(), document.to_bytes().unwrap());
    }

    #[test]
    fn test_from_bytes_dispatch() {
        let tiles = TileFile::with_size(2, 3);
        let bytes = tiles.to_bytes().unwrap();
        let document = RoseDocument::from_bytes(FileType::Til, &bytes).unwrap();
        assert_eq!(document, RoseDocument::Tiles(tiles));
        assert_eq!(document.summary(), "2x3 tiles");
    }
}
