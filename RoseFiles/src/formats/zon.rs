//! ZON zone descriptions
//!
//! Block-structured: basic grid information, event points, the zone's
//! texture list, tile definitions and economy settings.

use std::io::{Read, Seek, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use glam::{IVec2, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::RoseFile;
use super::common::{BlockTableWriter, visit_blocks};
use crate::error::{Error, Result};
use crate::io::{CodecOptions, RoseReadExt, RoseWriteExt, TextEncoding, count, dimension};
use crate::types::Grid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ZoneBlock {
    BasicInformation = 0,
    EventPoints = 1,
    Textures = 2,
    Tiles = 3,
    Economy = 4,
}

impl ZoneBlock {
    pub const ALL: [ZoneBlock; 5] = [
        ZoneBlock::BasicInformation,
        ZoneBlock::EventPoints,
        ZoneBlock::Textures,
        ZoneBlock::Tiles,
        ZoneBlock::Economy,
    ];

    pub fn from_u32(value: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|block| *block as u32 == value)
    }
}

/// How a tile's texture is rotated or mirrored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum TileRotation {
    Unknown = 0,
    #[default]
    None = 1,
    FlipHorizontal = 2,
    FlipVertical = 3,
    Flip = 4,
    Clockwise90 = 5,
    CounterClockwise90 = 6,
}

impl TryFrom<i32> for TileRotation {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        Ok(match value {
            0 => TileRotation::Unknown,
            1 => TileRotation::None,
            2 => TileRotation::FlipHorizontal,
            3 => TileRotation::FlipVertical,
            4 => TileRotation::Flip,
            5 => TileRotation::Clockwise90,
            6 => TileRotation::CounterClockwise90,
            other => {
                return Err(Error::InvalidTag {
                    family: "tile rotation",
                    value: other as u32,
                });
            }
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ZonePosition {
    pub is_used: bool,
    pub position: Vec2,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneEventPoint {
    pub position: Vec3,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneTile {
    pub layer1: i32,
    pub layer2: i32,
    pub offset1: i32,
    pub offset2: i32,
    pub blending: bool,
    pub rotation: TileRotation,
    pub tile_type: i32,
}

/// Per-zone economy settings used by the shops.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneEconomy {
    pub area_name: String,
    pub is_underground: bool,
    pub button_bgm: String,
    pub button_background: String,
    pub check_count: i32,
    pub standard_population: i32,
    pub standard_growth_rate: i32,
    pub metal_consumption: i32,
    pub stone_consumption: i32,
    pub wood_consumption: i32,
    pub leather_consumption: i32,
    pub cloth_consumption: i32,
    pub alchemy_consumption: i32,
    pub chemical_consumption: i32,
    pub industrial_consumption: i32,
    pub medicine_consumption: i32,
    pub food_consumption: i32,
}

impl ZoneEconomy {
    fn consumption(&self) -> [i32; 10] {
        [
            self.metal_consumption,
            self.stone_consumption,
            self.wood_consumption,
            self.leather_consumption,
            self.cloth_consumption,
            self.alchemy_consumption,
            self.chemical_consumption,
            self.industrial_consumption,
            self.medicine_consumption,
            self.food_consumption,
        ]
    }

    fn set_consumption(&mut self, values: [i32; 10]) {
        [
            self.metal_consumption,
            self.stone_consumption,
            self.wood_consumption,
            self.leather_consumption,
            self.cloth_consumption,
            self.alchemy_consumption,
            self.chemical_consumption,
            self.industrial_consumption,
            self.medicine_consumption,
            self.food_consumption,
        ] = values;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneFile {
    pub zone_type: i32,
    positions: Grid<ZonePosition>,
    pub grid_count: i32,
    pub grid_size: f32,
    pub start_position: IVec2,
    pub event_points: Vec<ZoneEventPoint>,
    pub textures: Vec<String>,
    pub tiles: Vec<ZoneTile>,
    pub economy: ZoneEconomy,
}

impl ZoneFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of map blocks along x.
    pub fn width(&self) -> usize {
        self.positions.width()
    }

    /// Number of map blocks along y.
    pub fn height(&self) -> usize {
        self.positions.height()
    }

    pub fn set_width(&mut self, width: usize) {
        self.positions.resize(width, self.height());
    }

    pub fn set_height(&mut self, height: usize) {
        self.positions.resize(self.width(), height);
    }

    pub fn positions(&self) -> &Grid<ZonePosition> {
        &self.positions
    }

    pub fn position(&self, x: usize, y: usize) -> Result<&ZonePosition> {
        self.positions.get(x, y)
    }

    pub fn set_position(&mut self, x: usize, y: usize, position: ZonePosition) -> Result<()> {
        self.positions.set(x, y, position)
    }

    pub fn tile(&self, index: usize) -> Result<&ZoneTile> {
        self.tiles.get(index).ok_or(Error::IndexOutOfRange {
            what: "tile",
            index,
            len: self.tiles.len(),
        })
    }

    fn read_basic_information<R: Read>(&mut self, reader: &mut R) -> Result<()> {
        self.zone_type = reader.read_i32::<LittleEndian>()?;
        let width = dimension("zone width", reader.read_i32::<LittleEndian>()?)?;
        let height = dimension("zone height", reader.read_i32::<LittleEndian>()?)?;
        self.grid_count = reader.read_i32::<LittleEndian>()?;
        self.grid_size = reader.read_f32::<LittleEndian>()?;
        self.start_position = reader.read_ivec2()?;

        // Stored x-major; grow as cells arrive so a bogus size ends at EOF.
        let cell_count = width.saturating_mul(height);
        let mut columns = Vec::with_capacity(cell_count.min(1 << 16));
        for _ in 0..cell_count {
            let is_used = reader.read_u8()? != 0;
            let position = reader.read_vec2()?;
            columns.push(ZonePosition { is_used, position });
        }

        let cells = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| columns[x * height + y])
            .collect();
        self.positions = Grid::from_cells(width, height, cells)?;
        Ok(())
    }

    fn write_basic_information<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_i32::<LittleEndian>(self.zone_type)?;
        writer.write_i32::<LittleEndian>(count("zone columns", self.width())?)?;
        writer.write_i32::<LittleEndian>(count("zone rows", self.height())?)?;
        writer.write_i32::<LittleEndian>(self.grid_count)?;
        writer.write_f32::<LittleEndian>(self.grid_size)?;
        writer.write_ivec2(self.start_position)?;

        for x in 0..self.width() {
            for y in 0..self.height() {
                let cell = self.positions.get(x, y)?;
                writer.write_u8(u8::from(cell.is_used))?;
                writer.write_vec2(cell.position)?;
            }
        }
        Ok(())
    }

    fn read_tile<R: Read>(reader: &mut R) -> Result<ZoneTile> {
        Ok(ZoneTile {
            layer1: reader.read_i32::<LittleEndian>()?,
            layer2: reader.read_i32::<LittleEndian>()?,
            offset1: reader.read_i32::<LittleEndian>()?,
            offset2: reader.read_i32::<LittleEndian>()?,
            blending: reader.read_i32::<LittleEndian>()? != 0,
            rotation: TileRotation::try_from(reader.read_i32::<LittleEndian>()?)?,
            tile_type: reader.read_i32::<LittleEndian>()?,
        })
    }

    fn write_tile<W: Write>(writer: &mut W, tile: &ZoneTile) -> Result<()> {
        writer.write_i32::<LittleEndian>(tile.layer1)?;
        writer.write_i32::<LittleEndian>(tile.layer2)?;
        writer.write_i32::<LittleEndian>(tile.offset1)?;
        writer.write_i32::<LittleEndian>(tile.offset2)?;
        writer.write_i32::<LittleEndian>(i32::from(tile.blending))?;
        writer.write_i32::<LittleEndian>(tile.rotation as i32)?;
        writer.write_i32::<LittleEndian>(tile.tile_type)?;
        Ok(())
    }

    fn read_economy<R: Read>(reader: &mut R, encoding: TextEncoding) -> Result<ZoneEconomy> {
        let mut economy = ZoneEconomy {
            area_name: reader.read_u8_prefixed_string(encoding)?,
            is_underground: reader.read_i32::<LittleEndian>()? != 0,
            button_bgm: reader.read_u8_prefixed_string(encoding)?,
            button_background: reader.read_u8_prefixed_string(encoding)?,
            check_count: reader.read_i32::<LittleEndian>()?,
            standard_population: reader.read_i32::<LittleEndian>()?,
            standard_growth_rate: reader.read_i32::<LittleEndian>()?,
            ..ZoneEconomy::default()
        };
        let mut consumption = [0i32; 10];
        reader.read_i32_into::<LittleEndian>(&mut consumption)?;
        economy.set_consumption(consumption);
        Ok(economy)
    }

    fn write_economy<W: Write>(&self, writer: &mut W, encoding: TextEncoding) -> Result<()> {
        let economy = &self.economy;
        writer.write_u8_prefixed_string(&economy.area_name, encoding)?;
        writer.write_i32::<LittleEndian>(i32::from(economy.is_underground))?;
        writer.write_u8_prefixed_string(&economy.button_bgm, encoding)?;
        writer.write_u8_prefixed_string(&economy.button_background, encoding)?;
        writer.write_i32::<LittleEndian>(economy.check_count)?;
        writer.write_i32::<LittleEndian>(economy.standard_population)?;
        writer.write_i32::<LittleEndian>(economy.standard_growth_rate)?;
        for value in economy.consumption() {
            writer.write_i32::<LittleEndian>(value)?;
        }
        Ok(())
    }
}

impl RoseFile for ZoneFile {
    const FORMAT: &'static str = "ZON";

    fn read_from<R: Read + Seek>(reader: &mut R, options: &CodecOptions) -> Result<Self> {
        let encoding = options.encoding_or(TextEncoding::EucKr);
        let mut zone = Self::default();

        visit_blocks(reader, Self::FORMAT, |reader, block_type| {
            let Some(block) = ZoneBlock::from_u32(block_type) else {
                return Ok(false);
            };
            match block {
                ZoneBlock::BasicInformation => zone.read_basic_information(reader)?,
                ZoneBlock::EventPoints => {
                    let point_count = dimension("event point count", reader.read_i32::<LittleEndian>()?)?;
                    zone.event_points = (0..point_count)
                        .map(|_| {
                            Ok(ZoneEventPoint {
                                position: reader.read_vec3()?,
                                name: reader.read_u8_prefixed_string(encoding)?,
                            })
                        })
                        .collect::<Result<_>>()?;
                }
                ZoneBlock::Textures => {
                    let texture_count = dimension("texture count", reader.read_i32::<LittleEndian>()?)?;
                    zone.textures = (0..texture_count)
                        .map(|_| reader.read_u8_prefixed_string(encoding))
                        .collect::<Result<_>>()?;
                }
                ZoneBlock::Tiles => {
                    let tile_count = dimension("tile count", reader.read_i32::<LittleEndian>()?)?;
                    zone.tiles = (0..tile_count)
                        .map(|_| Self::read_tile(reader))
                        .collect::<Result<_>>()?;
                }
                ZoneBlock::Economy => zone.economy = Self::read_economy(reader, encoding)?,
            }
            Ok(true)
        })?;

        tracing::debug!(
            "Read ZON: {}x{} blocks, {} textures, {} tiles",
            zone.width(),
            zone.height(),
            zone.textures.len(),
            zone.tiles.len()
        );
        Ok(zone)
    }

    fn write_to<W: Write + Seek>(&self, writer: &mut W, options: &CodecOptions) -> Result<()> {
        let encoding = options.encoding_or(TextEncoding::EucKr);
        let mut table = BlockTableWriter::begin(writer, ZoneBlock::ALL.len())?;

        for block in ZoneBlock::ALL {
            table.begin_block(writer, block as u32)?;
            match block {
                ZoneBlock::BasicInformation => self.write_basic_information(writer)?,
                ZoneBlock::EventPoints => {
                    writer.write_i32::<LittleEndian>(count("event points", self.event_points.len())?)?;
                    for point in &self.event_points {
                        writer.write_vec3(point.position)?;
                        writer.write_u8_prefixed_string(&point.name, encoding)?;
                    }
                }
                ZoneBlock::Textures => {
                    writer.write_i32::<LittleEndian>(count("textures", self.textures.len())?)?;
                    for texture in &self.textures {
                        writer.write_u8_prefixed_string(texture, encoding)?;
                    }
                }
                ZoneBlock::Tiles => {
                    writer.write_i32::<LittleEndian>(count("tiles", self.tiles.len())?)?;
                    for tile in &self.tiles {
                        Self::write_tile(writer, tile)?;
                    }
                }
                ZoneBlock::Economy => self.write_economy(writer, encoding)?,
            }
        }

        table.finish(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::common::read_block_table;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn sample_zone() -> ZoneFile {
        let mut zone = ZoneFile::new();
        zone.zone_type = 10;
        zone.grid_count = 4;
        zone.grid_size = 250.0;
        zone.start_position = IVec2::new(32, 33);
        zone.set_width(2);
        zone.set_height(3);
        zone.set_position(
            1,
            2,
            ZonePosition {
                is_used: true,
                position: Vec2::new(5200.0, 5300.0),
            },
        )
        .unwrap();
        zone.event_points.push(ZoneEventPoint {
            position: Vec3::new(1.0, 2.0, 3.0),
            name: "start".to_string(),
        });
        zone.textures = vec!["3DDATA/TERRAIN/TILES/JUNON/JD/T021_00.DDS".to_string()];
        zone.tiles.push(ZoneTile {
            layer1: 0,
            layer2: 0,
            offset1: 1,
            offset2: 2,
            blending: true,
            rotation: TileRotation::Clockwise90,
            tile_type: 3,
        });
        zone.economy.area_name = "Junon Field".to_string();
        zone.economy.is_underground = true;
        zone.economy.standard_population = 100;
        zone.economy.food_consumption = 55;
        zone
    }

    #[test]
    fn test_round_trip() {
        let zone = sample_zone();
        let bytes = zone.to_bytes().unwrap();
        let loaded = ZoneFile::from_bytes(&bytes).unwrap();
        assert_eq!(loaded, zone);
        assert_eq!(loaded.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_save_writes_real_block_types() {
        let bytes = sample_zone().to_bytes().unwrap();
        let entries = read_block_table(&mut Cursor::new(&bytes)).unwrap();
        let types: Vec<u32> = entries.iter().map(|e| e.block_type).collect();
        assert_eq!(types, vec![0, 1, 2, 3, 4]);
        assert!(entries.windows(2).all(|w| w[0].offset < w[1].offset));
    }

    #[test]
    fn test_block_order_independent() {
        let zone = sample_zone();
        let encoding = TextEncoding::EucKr;

        // Same blocks with the header declaring them in reverse order.
        let mut cursor = Cursor::new(Vec::new());
        let mut table = BlockTableWriter::begin(&mut cursor, 5).unwrap();
        table.begin_block(&mut cursor, ZoneBlock::Economy as u32).unwrap();
        zone.write_economy(&mut cursor, encoding).unwrap();
        table.begin_block(&mut cursor, ZoneBlock::Tiles as u32).unwrap();
        cursor.write_i32::<LittleEndian>(1).unwrap();
        ZoneFile::write_tile(&mut cursor, &zone.tiles[0]).unwrap();
        table.begin_block(&mut cursor, ZoneBlock::Textures as u32).unwrap();
        cursor.write_i32::<LittleEndian>(1).unwrap();
        cursor.write_u8_prefixed_string(&zone.textures[0], encoding).unwrap();
        table.begin_block(&mut cursor, ZoneBlock::EventPoints as u32).unwrap();
        cursor.write_i32::<LittleEndian>(1).unwrap();
        cursor.write_vec3(zone.event_points[0].position).unwrap();
        cursor.write_u8_prefixed_string("start", encoding).unwrap();
        table.begin_block(&mut cursor, ZoneBlock::BasicInformation as u32).unwrap();
        zone.write_basic_information(&mut cursor).unwrap();
        table.finish(&mut cursor).unwrap();

        let loaded = ZoneFile::from_bytes(cursor.get_ref()).unwrap();
        assert_eq!(loaded, zone);
    }

    #[test]
    fn test_resize_preserves_positions() {
        let mut zone = sample_zone();
        zone.set_width(4);
        assert_eq!(zone.width(), 4);
        assert_eq!(zone.height(), 3);
        assert!(zone.position(1, 2).unwrap().is_used);
        assert!(!zone.position(3, 2).unwrap().is_used);

        zone.set_height(2);
        assert!(zone.position(1, 2).is_err());
    }

    #[test]
    fn test_invalid_tile_rotation() {
        assert!(matches!(
            TileRotation::try_from(7),
            Err(Error::InvalidTag {
                family: "tile rotation",
                value: 7
            })
        ));
    }

    #[test]
    fn test_oversized_grid_fails_at_eof() {
        let mut bytes = Vec::new();
        bytes.write_i32::<LittleEndian>(1).unwrap();
        bytes.write_u32::<LittleEndian>(ZoneBlock::BasicInformation as u32).unwrap();
        bytes.write_u32::<LittleEndian>(12).unwrap();
        bytes.write_i32::<LittleEndian>(0).unwrap();
        bytes.write_i32::<LittleEndian>(i32::MAX).unwrap();
        bytes.write_i32::<LittleEndian>(i32::MAX).unwrap();
        bytes.extend_from_slice(&[0u8; 16]);

        assert!(matches!(ZoneFile::from_bytes(&bytes), Err(Error::Io(_))));
    }

    #[test]
    fn test_positions_stored_x_major() {
        let zone = sample_zone();
        let mut cursor = Cursor::new(Vec::new());
        zone.write_basic_information(&mut cursor).unwrap();

        // header 28 bytes, then 9-byte cells; (1, 2) is cell 1 * 3 + 2
        let bytes = cursor.into_inner();
        let used: Vec<u8> = bytes[28..].chunks(9).map(|cell| cell[0]).collect();
        assert_eq!(used, vec![0, 0, 0, 0, 0, 1]);

        let mut loaded = ZoneFile::new();
        loaded
            .read_basic_information(&mut Cursor::new(&bytes))
            .unwrap();
        assert_eq!(loaded.positions(), zone.positions());
    }

    #[test]
    fn test_reset() {
        let mut zone = sample_zone();
        zone.reset();
        assert_eq!(zone, ZoneFile::default());
        assert_eq!(zone.width(), 0);
    }
}
