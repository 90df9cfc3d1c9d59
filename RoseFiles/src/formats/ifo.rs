//! IFO map data
//!
//! Block-structured list of everything placed on one map block: decoration
//! and building objects, NPCs, sounds, effects, monster spawns, warp gates,
//! water and event objects.

use std::io::{Read, Seek, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use glam::{IVec2, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::RoseFile;
use super::common::{BlockTableWriter, visit_blocks};
use crate::error::Result;
use crate::io::{CodecOptions, QuatOrder, RoseReadExt, RoseWriteExt, TextEncoding, count, dimension};
use crate::types::Grid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum MapBlock {
    DeprecatedMapInformation = 0,
    Objects = 1,
    Npcs = 2,
    Buildings = 3,
    Sounds = 4,
    Effects = 5,
    Animations = 6,
    WaterPatches = 7,
    MonsterSpawns = 8,
    WaterPlanes = 9,
    WarpPoints = 10,
    CollisionObjects = 11,
    EventObjects = 12,
}

impl MapBlock {
    pub const ALL: [MapBlock; 13] = [
        MapBlock::DeprecatedMapInformation,
        MapBlock::Objects,
        MapBlock::Npcs,
        MapBlock::Buildings,
        MapBlock::Sounds,
        MapBlock::Effects,
        MapBlock::Animations,
        MapBlock::WaterPatches,
        MapBlock::MonsterSpawns,
        MapBlock::WaterPlanes,
        MapBlock::WarpPoints,
        MapBlock::CollisionObjects,
        MapBlock::EventObjects,
    ];

    pub fn from_u32(value: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|block| *block as u32 == value)
    }
}

/// A record stored in one of the counted object lists.
trait MapRecord: Sized {
    fn read<R: Read>(reader: &mut R, encoding: TextEncoding) -> Result<Self>;
    fn write<W: Write>(&self, writer: &mut W, encoding: TextEncoding) -> Result<()>;
}

fn read_records<T: MapRecord, R: Read>(reader: &mut R, what: &'static str, encoding: TextEncoding) -> Result<Vec<T>> {
    let record_count = dimension(what, reader.read_i32::<LittleEndian>()?)?;
    (0..record_count).map(|_| T::read(reader, encoding)).collect()
}

fn write_records<T: MapRecord, W: Write>(
    writer: &mut W,
    what: &'static str,
    records: &[T],
    encoding: TextEncoding,
) -> Result<()> {
    writer.write_i32::<LittleEndian>(count(what, records.len())?)?;
    for record in records {
        record.write(writer, encoding)?;
    }
    Ok(())
}

/// Header shared by every placed object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapObject {
    pub name: String,
    pub warp_id: i16,
    pub event_id: i16,
    pub object_type: i32,
    pub object_id: i32,
    pub map_position: IVec2,
    pub rotation: Quat,
    pub position: Vec3,
    pub scale: Vec3,
}

impl Default for MapObject {
    fn default() -> Self {
        Self {
            name: String::new(),
            warp_id: 0,
            event_id: 0,
            object_type: 0,
            object_id: 0,
            map_position: IVec2::ZERO,
            rotation: Quat::IDENTITY,
            position: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl MapRecord for MapObject {
    fn read<R: Read>(reader: &mut R, encoding: TextEncoding) -> Result<Self> {
        Ok(Self {
            name: reader.read_u8_prefixed_string(encoding)?,
            warp_id: reader.read_i16::<LittleEndian>()?,
            event_id: reader.read_i16::<LittleEndian>()?,
            object_type: reader.read_i32::<LittleEndian>()?,
            object_id: reader.read_i32::<LittleEndian>()?,
            map_position: reader.read_ivec2()?,
            rotation: reader.read_quat(QuatOrder::Xyzw)?,
            position: reader.read_vec3()?,
            scale: reader.read_vec3()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, encoding: TextEncoding) -> Result<()> {
        writer.write_u8_prefixed_string(&self.name, encoding)?;
        writer.write_i16::<LittleEndian>(self.warp_id)?;
        writer.write_i16::<LittleEndian>(self.event_id)?;
        writer.write_i32::<LittleEndian>(self.object_type)?;
        writer.write_i32::<LittleEndian>(self.object_id)?;
        writer.write_ivec2(self.map_position)?;
        writer.write_quat(self.rotation, QuatOrder::Xyzw)?;
        writer.write_vec3(self.position)?;
        writer.write_vec3(self.scale)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapNpc {
    pub object: MapObject,
    pub ai_pattern: i32,
    pub conversation_file: String,
}

impl MapRecord for MapNpc {
    fn read<R: Read>(reader: &mut R, encoding: TextEncoding) -> Result<Self> {
        Ok(Self {
            object: MapObject::read(reader, encoding)?,
            ai_pattern: reader.read_i32::<LittleEndian>()?,
            conversation_file: reader.read_u8_prefixed_string(encoding)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, encoding: TextEncoding) -> Result<()> {
        self.object.write(writer, encoding)?;
        writer.write_i32::<LittleEndian>(self.ai_pattern)?;
        writer.write_u8_prefixed_string(&self.conversation_file, encoding)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapSound {
    pub object: MapObject,
    pub path: String,
    pub range: i32,
    /// Seconds between plays
    pub interval: i32,
}

impl MapRecord for MapSound {
    fn read<R: Read>(reader: &mut R, encoding: TextEncoding) -> Result<Self> {
        Ok(Self {
            object: MapObject::read(reader, encoding)?,
            path: reader.read_u8_prefixed_string(encoding)?,
            range: reader.read_i32::<LittleEndian>()?,
            interval: reader.read_i32::<LittleEndian>()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, encoding: TextEncoding) -> Result<()> {
        self.object.write(writer, encoding)?;
        writer.write_u8_prefixed_string(&self.path, encoding)?;
        writer.write_i32::<LittleEndian>(self.range)?;
        writer.write_i32::<LittleEndian>(self.interval)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapEffect {
    pub object: MapObject,
    pub path: String,
}

impl MapRecord for MapEffect {
    fn read<R: Read>(reader: &mut R, encoding: TextEncoding) -> Result<Self> {
        Ok(Self {
            object: MapObject::read(reader, encoding)?,
            path: reader.read_u8_prefixed_string(encoding)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, encoding: TextEncoding) -> Result<()> {
        self.object.write(writer, encoding)?;
        writer.write_u8_prefixed_string(&self.path, encoding)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterSpawnPoint {
    pub name: String,
    pub monster: i32,
    pub count: i32,
}

impl MapRecord for MonsterSpawnPoint {
    fn read<R: Read>(reader: &mut R, encoding: TextEncoding) -> Result<Self> {
        Ok(Self {
            name: reader.read_u8_prefixed_string(encoding)?,
            monster: reader.read_i32::<LittleEndian>()?,
            count: reader.read_i32::<LittleEndian>()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, encoding: TextEncoding) -> Result<()> {
        writer.write_u8_prefixed_string(&self.name, encoding)?;
        writer.write_i32::<LittleEndian>(self.monster)?;
        writer.write_i32::<LittleEndian>(self.count)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapMonsterSpawn {
    pub object: MapObject,
    pub spawn_name: String,
    pub normal_spawn_points: Vec<MonsterSpawnPoint>,
    pub tactical_spawn_points: Vec<MonsterSpawnPoint>,
    pub interval: i32,
    pub limit_count: i32,
    pub range: i32,
    pub tactical_points: i32,
}

impl MapRecord for MapMonsterSpawn {
    fn read<R: Read>(reader: &mut R, encoding: TextEncoding) -> Result<Self> {
        Ok(Self {
            object: MapObject::read(reader, encoding)?,
            spawn_name: reader.read_u8_prefixed_string(encoding)?,
            normal_spawn_points: read_records(reader, "normal spawn point count", encoding)?,
            tactical_spawn_points: read_records(reader, "tactical spawn point count", encoding)?,
            interval: reader.read_i32::<LittleEndian>()?,
            limit_count: reader.read_i32::<LittleEndian>()?,
            range: reader.read_i32::<LittleEndian>()?,
            tactical_points: reader.read_i32::<LittleEndian>()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, encoding: TextEncoding) -> Result<()> {
        self.object.write(writer, encoding)?;
        writer.write_u8_prefixed_string(&self.spawn_name, encoding)?;
        write_records(writer, "normal spawn points", &self.normal_spawn_points, encoding)?;
        write_records(writer, "tactical spawn points", &self.tactical_spawn_points, encoding)?;
        writer.write_i32::<LittleEndian>(self.interval)?;
        writer.write_i32::<LittleEndian>(self.limit_count)?;
        writer.write_i32::<LittleEndian>(self.range)?;
        writer.write_i32::<LittleEndian>(self.tactical_points)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapEventObject {
    pub object: MapObject,
    pub function_name: String,
    pub conversation_file: String,
}

impl MapRecord for MapEventObject {
    fn read<R: Read>(reader: &mut R, encoding: TextEncoding) -> Result<Self> {
        Ok(Self {
            object: MapObject::read(reader, encoding)?,
            function_name: reader.read_u8_prefixed_string(encoding)?,
            conversation_file: reader.read_u8_prefixed_string(encoding)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, encoding: TextEncoding) -> Result<()> {
        self.object.write(writer, encoding)?;
        writer.write_u8_prefixed_string(&self.function_name, encoding)?;
        writer.write_u8_prefixed_string(&self.conversation_file, encoding)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WaterPatch {
    pub has_water: bool,
    pub height: f32,
    pub water_type: i32,
    pub water_id: i32,
    pub reserved: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WaterPlane {
    pub start: Vec3,
    pub end: Vec3,
}

/// Header block kept by old map files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapInformation {
    pub map_position: IVec2,
    pub zone_position: IVec2,
    pub world: Mat4,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDataFile {
    pub information: MapInformation,
    pub objects: Vec<MapObject>,
    pub npcs: Vec<MapNpc>,
    pub buildings: Vec<MapObject>,
    pub sounds: Vec<MapSound>,
    pub effects: Vec<MapEffect>,
    pub animations: Vec<MapObject>,
    pub water_patches: Grid<WaterPatch>,
    pub monster_spawns: Vec<MapMonsterSpawn>,
    pub water_size: f32,
    pub water_planes: Vec<WaterPlane>,
    pub warp_points: Vec<MapObject>,
    pub collision_objects: Vec<MapObject>,
    pub event_objects: Vec<MapEventObject>,
}

impl Default for MapDataFile {
    fn default() -> Self {
        Self {
            information: MapInformation::default(),
            objects: Vec::new(),
            npcs: Vec::new(),
            buildings: Vec::new(),
            sounds: Vec::new(),
            effects: Vec::new(),
            animations: Vec::new(),
            water_patches: Grid::default(),
            monster_spawns: Vec::new(),
            water_size: 1.0,
            water_planes: Vec::new(),
            warp_points: Vec::new(),
            collision_objects: Vec::new(),
            event_objects: Vec::new(),
        }
    }
}

impl MapDataFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of placed objects across every list.
    pub fn object_count(&self) -> usize {
        self.objects.len()
            + self.npcs.len()
            + self.buildings.len()
            + self.sounds.len()
            + self.effects.len()
            + self.animations.len()
            + self.monster_spawns.len()
            + self.warp_points.len()
            + self.collision_objects.len()
            + self.event_objects.len()
    }

    fn read_block<R: Read>(&mut self, reader: &mut R, block: MapBlock, encoding: TextEncoding) -> Result<()> {
        match block {
            MapBlock::DeprecatedMapInformation => {
                self.information = MapInformation {
                    map_position: reader.read_ivec2()?,
                    zone_position: reader.read_ivec2()?,
                    world: reader.read_mat4()?,
                    name: reader.read_u8_prefixed_string(encoding)?,
                };
            }
            MapBlock::Objects => self.objects = read_records(reader, "object count", encoding)?,
            MapBlock::Npcs => self.npcs = read_records(reader, "NPC count", encoding)?,
            MapBlock::Buildings => self.buildings = read_records(reader, "building count", encoding)?,
            MapBlock::Sounds => self.sounds = read_records(reader, "sound count", encoding)?,
            MapBlock::Effects => self.effects = read_records(reader, "effect count", encoding)?,
            MapBlock::Animations => self.animations = read_records(reader, "animation count", encoding)?,
            MapBlock::WaterPatches => {
                let width = dimension("water patch width", reader.read_i32::<LittleEndian>()?)?;
                let height = dimension("water patch height", reader.read_i32::<LittleEndian>()?)?;
                let mut cells = Vec::with_capacity(width.saturating_mul(height).min(1 << 12));
                for _ in 0..width.saturating_mul(height) {
                    cells.push(WaterPatch {
                        has_water: reader.read_u8()? != 0,
                        height: reader.read_f32::<LittleEndian>()?,
                        water_type: reader.read_i32::<LittleEndian>()?,
                        water_id: reader.read_i32::<LittleEndian>()?,
                        reserved: reader.read_u32::<LittleEndian>()?,
                    });
                }
                self.water_patches = Grid::from_cells(width, height, cells)?;
            }
            MapBlock::MonsterSpawns => {
                self.monster_spawns = read_records(reader, "monster spawn count", encoding)?;
            }
            MapBlock::WaterPlanes => {
                self.water_size = reader.read_f32::<LittleEndian>()?;
                let plane_count = dimension("water plane count", reader.read_i32::<LittleEndian>()?)?;
                self.water_planes = (0..plane_count)
                    .map(|_| {
                        Ok(WaterPlane {
                            start: reader.read_vec3()?,
                            end: reader.read_vec3()?,
                        })
                    })
                    .collect::<Result<_>>()?;
            }
            MapBlock::WarpPoints => self.warp_points = read_records(reader, "warp point count", encoding)?,
            MapBlock::CollisionObjects => {
                self.collision_objects = read_records(reader, "collision object count", encoding)?;
            }
            MapBlock::EventObjects => {
                self.event_objects = read_records(reader, "event object count", encoding)?;
            }
        }
        Ok(())
    }

    fn write_block<W: Write>(&self, writer: &mut W, block: MapBlock, encoding: TextEncoding) -> Result<()> {
        match block {
            MapBlock::DeprecatedMapInformation => {
                writer.write_ivec2(self.information.map_position)?;
                writer.write_ivec2(self.information.zone_position)?;
                writer.write_mat4(&self.information.world)?;
                writer.write_u8_prefixed_string(&self.information.name, encoding)
            }
            MapBlock::Objects => write_records(writer, "objects", &self.objects, encoding),
            MapBlock::Npcs => write_records(writer, "NPCs", &self.npcs, encoding),
            MapBlock::Buildings => write_records(writer, "buildings", &self.buildings, encoding),
            MapBlock::Sounds => write_records(writer, "sounds", &self.sounds, encoding),
            MapBlock::Effects => write_records(writer, "effects", &self.effects, encoding),
            MapBlock::Animations => write_records(writer, "animations", &self.animations, encoding),
            MapBlock::WaterPatches => {
                writer.write_i32::<LittleEndian>(count("water patch columns", self.water_patches.width())?)?;
                writer.write_i32::<LittleEndian>(count("water patch rows", self.water_patches.height())?)?;
                for patch in self.water_patches.iter() {
                    writer.write_u8(u8::from(patch.has_water))?;
                    writer.write_f32::<LittleEndian>(patch.height)?;
                    writer.write_i32::<LittleEndian>(patch.water_type)?;
                    writer.write_i32::<LittleEndian>(patch.water_id)?;
                    writer.write_u32::<LittleEndian>(patch.reserved)?;
                }
                Ok(())
            }
            MapBlock::MonsterSpawns => write_records(writer, "monster spawns", &self.monster_spawns, encoding),
            MapBlock::WaterPlanes => {
                writer.write_f32::<LittleEndian>(self.water_size)?;
                writer.write_i32::<LittleEndian>(count("water planes", self.water_planes.len())?)?;
                for plane in &self.water_planes {
                    writer.write_vec3(plane.start)?;
                    writer.write_vec3(plane.end)?;
                }
                Ok(())
            }
            MapBlock::WarpPoints => write_records(writer, "warp points", &self.warp_points, encoding),
            MapBlock::CollisionObjects => {
                write_records(writer, "collision objects", &self.collision_objects, encoding)
            }
            MapBlock::EventObjects => write_records(writer, "event objects", &self.event_objects, encoding),
        }
    }
}

impl RoseFile for MapDataFile {
    const FORMAT: &'static str = "IFO";

    fn read_from<R: Read + Seek>(reader: &mut R, options: &CodecOptions) -> Result<Self> {
        let encoding = options.encoding_or(TextEncoding::EucKr);
        let mut map = Self::default();

        visit_blocks(reader, Self::FORMAT, |reader, block_type| {
            match MapBlock::from_u32(block_type) {
                Some(block) => {
                    map.read_block(reader, block, encoding)?;
                    Ok(true)
                }
                None => Ok(false),
            }
        })?;

        tracing::debug!("Read IFO: {} objects", map.object_count());
        Ok(map)
    }

    fn write_to<W: Write + Seek>(&self, writer: &mut W, options: &CodecOptions) -> Result<()> {
        let encoding = options.encoding_or(TextEncoding::EucKr);
        let mut table = BlockTableWriter::begin(writer, MapBlock::ALL.len())?;
        for block in MapBlock::ALL {
            table.begin_block(writer, block as u32)?;
            self.write_block(writer, block, encoding)?;
        }
        table.finish(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn object(name: &str) -> MapObject {
        MapObject {
            name: name.to_string(),
            warp_id: 3,
            object_type: 1,
            object_id: 42,
            map_position: IVec2::new(32, 33),
            rotation: Quat::from_rotation_y(0.25),
            position: Vec3::new(5200.0, 5300.0, 10.0),
            ..MapObject::default()
        }
    }

    fn sample_map() -> MapDataFile {
        let mut map = MapDataFile::new();
        map.information.name = "Canyon City".to_string();
        map.objects.push(object("tree"));
        map.npcs.push(MapNpc {
            object: object("judith"),
            ai_pattern: 7,
            conversation_file: "3DDATA/QUESTS/JUDITH.CON".to_string(),
        });
        map.sounds.push(MapSound {
            object: object("river"),
            path: "SOUND/RIVER.WAV".to_string(),
            range: 500,
            interval: 10,
        });
        map.monster_spawns.push(MapMonsterSpawn {
            object: object("spawn"),
            spawn_name: "jellybeans".to_string(),
            normal_spawn_points: vec![MonsterSpawnPoint {
                name: "jelly bean".to_string(),
                monster: 1,
                count: 5,
            }],
            tactical_spawn_points: Vec::new(),
            interval: 30,
            limit_count: 10,
            range: 800,
            tactical_points: 100,
        });
        map.water_patches = Grid::new(2, 1);
        map.water_patches
            .set(
                1,
                0,
                WaterPatch {
                    has_water: true,
                    height: 9.5,
                    ..WaterPatch::default()
                },
            )
            .unwrap();
        map.water_planes.push(WaterPlane {
            start: Vec3::ZERO,
            end: Vec3::new(100.0, 100.0, 9.5),
        });
        map.event_objects.push(MapEventObject {
            object: object("lever"),
            function_name: "OnOpen".to_string(),
            conversation_file: String::new(),
        });
        map
    }

    #[test]
    fn test_round_trip() {
        let map = sample_map();
        let bytes = map.to_bytes().unwrap();
        let loaded = MapDataFile::from_bytes(&bytes).unwrap();
        assert_eq!(loaded, map);
        assert_eq!(loaded.object_count(), 5);
        assert_eq!(loaded.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_unknown_and_missing_blocks() {
        let map = sample_map();
        let encoding = TextEncoding::EucKr;

        let mut cursor = Cursor::new(Vec::new());
        let mut table = BlockTableWriter::begin(&mut cursor, 2).unwrap();
        table.begin_block(&mut cursor, 99).unwrap();
        cursor.write_u32::<LittleEndian>(0xDEAD_BEEF).unwrap();
        table.begin_block(&mut cursor, MapBlock::Npcs as u32).unwrap();
        map.write_block(&mut cursor, MapBlock::Npcs, encoding).unwrap();
        table.finish(&mut cursor).unwrap();

        let loaded = MapDataFile::from_bytes(cursor.get_ref()).unwrap();
        assert_eq!(loaded.npcs, map.npcs);
        assert!(loaded.objects.is_empty());
        assert_eq!(loaded.water_size, 1.0);
    }

    #[test]
    fn test_object_rotation_is_xyzw() {
        let mut bytes = Vec::new();
        object("o").write(&mut bytes, TextEncoding::EucKr).unwrap();
        // name(2) + warp/event(4) + type/id(8) + map position(8)
        let x = f32::from_le_bytes(bytes[22..26].try_into().unwrap());
        let w = f32::from_le_bytes(bytes[34..38].try_into().unwrap());
        let rotation = Quat::from_rotation_y(0.25);
        assert_eq!(x, rotation.x);
        assert_eq!(w, rotation.w);
    }
}
