//! ZMS model geometry
//!
//! Layout:
//! - NUL-terminated identifier `ZMS0007` or `ZMS0008`
//! - `u32` vertex format flags, bounding box (two `Vec3`)
//! - `u16` bone count + `i16` bone table
//! - `u16` vertex count, then one block per enabled attribute (all positions,
//!   then all normals, ...); attributes are never interleaved per vertex
//! - `u16` triangle count + `3 x u16` indices
//! - `u16` material id count + `i16` ids, `u16` strip count + `u16` indices
//! - version 8 only: `u16` pool type

use std::io::{Read, Seek, Write};

use bitflags::bitflags;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use glam::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use super::RoseFile;
use super::common::identifier_mismatch;
use crate::error::{Error, Result};
use crate::io::{CodecOptions, RoseReadExt, RoseWriteExt, TextEncoding, count};
use crate::types::{BoundingBox, Color4};

const IDENTIFIER_PREFIX: &str = "ZMS";
const SUPPORTED_VERSIONS: [u32; 2] = [7, 8];

bitflags! {
    /// Which per-vertex attribute blocks are stored.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct VertexFormat: u32 {
        const POSITION = 1 << 1;
        const NORMAL = 1 << 2;
        const COLOR = 1 << 3;
        const BONE_WEIGHT = 1 << 4;
        const BONE_INDEX = 1 << 5;
        const TANGENT = 1 << 6;
        const UV1 = 1 << 7;
        const UV2 = 1 << 8;
        const UV3 = 1 << 9;
        const UV4 = 1 << 10;

        const BONES = Self::BONE_WEIGHT.bits() | Self::BONE_INDEX.bits();

        const _ = !0;
    }
}

/// Texture coordinate flags, in set order.
const UV_SETS: [VertexFormat; 4] = [
    VertexFormat::UV1,
    VertexFormat::UV2,
    VertexFormat::UV3,
    VertexFormat::UV4,
];

/// Vertex buffer pool hint (version 8+).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum PoolType {
    #[default]
    Static = 0,
    Dynamic = 1,
    System = 2,
}

impl TryFrom<u16> for PoolType {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self> {
        match value {
            0 => Ok(PoolType::Static),
            1 => Ok(PoolType::Dynamic),
            2 => Ok(PoolType::System),
            other => Err(Error::InvalidTag {
                family: "ZMS pool type",
                value: u32::from(other),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelVertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub color: Color4,
    /// Weights sorted in descending order after loading.
    pub bone_weights: Vec4,
    /// Indices into the model's bone table, paired with `bone_weights`.
    pub bone_indices: [i16; 4],
    pub tangent: Vec3,
    pub uv: [Vec2; 4],
}

impl ModelVertex {
    /// Reorder (weight, bone) pairs by descending weight.
    fn sort_bone_weights(&mut self) {
        let weights = self.bone_weights.to_array();
        let mut pairs: Vec<(f32, i16)> = weights.into_iter().zip(self.bone_indices).collect();
        pairs.sort_by(|a, b| b.0.total_cmp(&a.0));
        for (i, (weight, bone)) in pairs.into_iter().enumerate() {
            self.bone_weights[i] = weight;
            self.bone_indices[i] = bone;
        }
    }
}

/// A ZMS mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    /// 7 or 8; version 8 adds the trailing pool type.
    pub version: u32,
    pub format: VertexFormat,
    pub bounding_box: BoundingBox,
    pub bone_table: Vec<i16>,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<[u16; 3]>,
    pub materials: Vec<i16>,
    pub strips: Vec<u16>,
    pub pool: PoolType,
}

impl Default for ModelFile {
    fn default() -> Self {
        Self {
            version: 8,
            format: VertexFormat::POSITION,
            bounding_box: BoundingBox::default(),
            bone_table: Vec::new(),
            vertices: Vec::new(),
            indices: Vec::new(),
            materials: Vec::new(),
            strips: Vec::new(),
            pool: PoolType::Static,
        }
    }
}

impl ModelFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn identifier(&self) -> String {
        format!("{IDENTIFIER_PREFIX}{:04}", self.version)
    }

    pub fn has_normals(&self) -> bool {
        self.format.contains(VertexFormat::NORMAL)
    }

    pub fn has_colors(&self) -> bool {
        self.format.contains(VertexFormat::COLOR)
    }

    /// Bone weights and indices are only stored as a pair.
    pub fn has_bones(&self) -> bool {
        self.format.contains(VertexFormat::BONES)
    }

    pub fn has_tangents(&self) -> bool {
        self.format.contains(VertexFormat::TANGENT)
    }

    /// Number of texture coordinate sets flagged in the format.
    pub fn uv_set_count(&self) -> usize {
        UV_SETS.iter().filter(|f| self.format.contains(**f)).count()
    }

    /// Vertex, if `index` is in range.
    pub fn vertex(&self, index: usize) -> Result<&ModelVertex> {
        self.vertices.get(index).ok_or(Error::IndexOutOfRange {
            what: "vertex",
            index,
            len: self.vertices.len(),
        })
    }

    /// Recompute the bounding box from vertex positions.
    pub fn update_bounding_box(&mut self) {
        let mut positions = self.vertices.iter().map(|v| v.position);
        let Some(first) = positions.next() else {
            self.bounding_box = BoundingBox::default();
            return;
        };
        let (minimum, maximum) = positions.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        self.bounding_box = BoundingBox { minimum, maximum };
    }
}

fn parse_version(identifier: &str) -> Result<u32> {
    let expected = format!("{IDENTIFIER_PREFIX}0008");
    let digits = identifier
        .strip_prefix(IDENTIFIER_PREFIX)
        .ok_or_else(|| identifier_mismatch(&expected, identifier))?;
    let version: u32 = digits
        .parse()
        .map_err(|_| identifier_mismatch(&expected, identifier))?;
    if !SUPPORTED_VERSIONS.contains(&version) {
        return Err(Error::InvalidVersion {
            format: "ZMS",
            version,
        });
    }
    Ok(version)
}

impl RoseFile for ModelFile {
    const FORMAT: &'static str = "ZMS";

    fn read_from<R: Read + Seek>(reader: &mut R, _options: &CodecOptions) -> Result<Self> {
        let identifier = reader.read_null_terminated_string(TextEncoding::EucKr)?;
        let version = parse_version(&identifier)?;

        let format = VertexFormat::from_bits_retain(reader.read_u32::<LittleEndian>()?);
        let bounding_box = BoundingBox {
            minimum: reader.read_vec3()?,
            maximum: reader.read_vec3()?,
        };

        let bone_count = reader.read_u16::<LittleEndian>()?;
        let mut bone_table = Vec::with_capacity(bone_count as usize);
        for _ in 0..bone_count {
            bone_table.push(reader.read_i16::<LittleEndian>()?);
        }

        let vertex_count = reader.read_u16::<LittleEndian>()? as usize;
        let mut vertices = vec![ModelVertex::default(); vertex_count];

        for vertex in &mut vertices {
            vertex.position = reader.read_vec3()?;
        }
        if format.contains(VertexFormat::NORMAL) {
            for vertex in &mut vertices {
                vertex.normal = reader.read_vec3()?;
            }
        }
        if format.contains(VertexFormat::COLOR) {
            for vertex in &mut vertices {
                vertex.color = reader.read_color4()?;
            }
        }
        if format.contains(VertexFormat::BONES) {
            for vertex in &mut vertices {
                vertex.bone_weights = reader.read_vec4()?;
                for bone in &mut vertex.bone_indices {
                    *bone = reader.read_i16::<LittleEndian>()?;
                }
                vertex.sort_bone_weights();
            }
        }
        if format.contains(VertexFormat::TANGENT) {
            for vertex in &mut vertices {
                vertex.tangent = reader.read_vec3()?;
            }
        }
        for (set, flag) in UV_SETS.iter().enumerate() {
            if format.contains(*flag) {
                for vertex in &mut vertices {
                    vertex.uv[set] = reader.read_vec2()?;
                }
            }
        }

        let index_count = reader.read_u16::<LittleEndian>()?;
        let mut indices = Vec::with_capacity(index_count as usize);
        for _ in 0..index_count {
            indices.push([
                reader.read_u16::<LittleEndian>()?,
                reader.read_u16::<LittleEndian>()?,
                reader.read_u16::<LittleEndian>()?,
            ]);
        }

        let material_count = reader.read_u16::<LittleEndian>()?;
        let mut materials = Vec::with_capacity(material_count as usize);
        for _ in 0..material_count {
            materials.push(reader.read_i16::<LittleEndian>()?);
        }

        let strip_count = reader.read_u16::<LittleEndian>()?;
        let mut strips = Vec::with_capacity(strip_count as usize);
        for _ in 0..strip_count {
            strips.push(reader.read_u16::<LittleEndian>()?);
        }

        let pool = if version >= 8 {
            PoolType::try_from(reader.read_u16::<LittleEndian>()?)?
        } else {
            PoolType::default()
        };

        tracing::debug!(
            "Read {}: {} vertices, {} triangles, {} bones",
            identifier,
            vertices.len(),
            indices.len(),
            bone_table.len()
        );

        Ok(Self {
            version,
            format,
            bounding_box,
            bone_table,
            vertices,
            indices,
            materials,
            strips,
            pool,
        })
    }

    fn write_to<W: Write + Seek>(&self, writer: &mut W, _options: &CodecOptions) -> Result<()> {
        if !SUPPORTED_VERSIONS.contains(&self.version) {
            return Err(Error::InvalidVersion {
                format: "ZMS",
                version: self.version,
            });
        }
        let format = self.format | VertexFormat::POSITION;

        writer.write_null_terminated_string(&self.identifier(), TextEncoding::EucKr)?;
        writer.write_u32::<LittleEndian>(format.bits())?;
        writer.write_vec3(self.bounding_box.minimum)?;
        writer.write_vec3(self.bounding_box.maximum)?;

        writer.write_u16::<LittleEndian>(count("bones", self.bone_table.len())?)?;
        for bone in &self.bone_table {
            writer.write_i16::<LittleEndian>(*bone)?;
        }

        writer.write_u16::<LittleEndian>(count("vertices", self.vertices.len())?)?;
        for vertex in &self.vertices {
            writer.write_vec3(vertex.position)?;
        }
        if format.contains(VertexFormat::NORMAL) {
            for vertex in &self.vertices {
                writer.write_vec3(vertex.normal)?;
            }
        }
        if format.contains(VertexFormat::COLOR) {
            for vertex in &self.vertices {
                writer.write_color4(vertex.color)?;
            }
        }
        if format.contains(VertexFormat::BONES) {
            for vertex in &self.vertices {
                writer.write_vec4(vertex.bone_weights)?;
                for bone in vertex.bone_indices {
                    writer.write_i16::<LittleEndian>(bone)?;
                }
            }
        }
        if format.contains(VertexFormat::TANGENT) {
            for vertex in &self.vertices {
                writer.write_vec3(vertex.tangent)?;
            }
        }
        for (set, flag) in UV_SETS.iter().enumerate() {
            if format.contains(*flag) {
                for vertex in &self.vertices {
                    writer.write_vec2(vertex.uv[set])?;
                }
            }
        }

        writer.write_u16::<LittleEndian>(count("triangles", self.indices.len())?)?;
        for triangle in &self.indices {
            for index in triangle {
                writer.write_u16::<LittleEndian>(*index)?;
            }
        }

        writer.write_u16::<LittleEndian>(count("materials", self.materials.len())?)?;
        for material in &self.materials {
            writer.write_i16::<LittleEndian>(*material)?;
        }

        writer.write_u16::<LittleEndian>(count("strip indices", self.strips.len())?)?;
        for strip in &self.strips {
            writer.write_u16::<LittleEndian>(*strip)?;
        }

        if self.version >= 8 {
            writer.write_u16::<LittleEndian>(self.pool as u16)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn skinned_triangle() -> ModelFile {
        let mut model = ModelFile::new();
        model.format = VertexFormat::POSITION
            | VertexFormat::NORMAL
            | VertexFormat::BONES
            | VertexFormat::UV1;
        model.bone_table = vec![0, 3, 4];
        for i in 0..3u8 {
            let f = f32::from(i);
            model.vertices.push(ModelVertex {
                position: Vec3::new(f, f * 2.0, 0.5),
                normal: Vec3::Z,
                bone_weights: Vec4::new(0.75, 0.25, 0.0, 0.0),
                bone_indices: [1, 2, 0, 0],
                uv: [Vec2::new(f / 2.0, 1.0), Vec2::ZERO, Vec2::ZERO, Vec2::ZERO],
                ..ModelVertex::default()
            });
        }
        model.indices = vec![[0, 1, 2]];
        model.materials = vec![0];
        model.strips = vec![0, 1, 2];
        model.pool = PoolType::Dynamic;
        model.update_bounding_box();
        model
    }

    #[test]
    fn test_round_trip_bytes() {
        let model = skinned_triangle();
        let bytes = model.to_bytes().unwrap();
        assert_eq!(&bytes[..8], b"ZMS0008\0");

        let loaded = ModelFile::from_bytes(&bytes).unwrap();
        assert_eq!(loaded, model);
        assert_eq!(loaded.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_attribute_major_layout() {
        let mut model = ModelFile::new();
        model.format = VertexFormat::POSITION | VertexFormat::NORMAL;
        model.vertices = vec![
            ModelVertex {
                position: Vec3::splat(1.0),
                normal: Vec3::splat(2.0),
                ..ModelVertex::default()
            },
            ModelVertex {
                position: Vec3::splat(3.0),
                normal: Vec3::splat(4.0),
                ..ModelVertex::default()
            },
        ];
        let bytes = model.to_bytes().unwrap();
        // identifier(8) + format(4) + bbox(24) + bones(2) + vertex count(2)
        let vertices = &bytes[40..];
        let floats: Vec<f32> = vertices[..48]
            .chunks(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(floats[..3], [1.0; 3]);
        assert_eq!(floats[3..6], [3.0; 3]);
        assert_eq!(floats[6..9], [2.0; 3]);
        assert_eq!(floats[9..12], [4.0; 3]);
    }

    #[test]
    fn test_bone_weights_sorted_descending() {
        let mut model = skinned_triangle();
        model.vertices[0].bone_weights = Vec4::new(0.1, 0.6, 0.3, 0.0);
        model.vertices[0].bone_indices = [0, 1, 2, 0];

        let loaded = ModelFile::from_bytes(&model.to_bytes().unwrap()).unwrap();
        let vertex = loaded.vertex(0).unwrap();
        assert_eq!(vertex.bone_weights, Vec4::new(0.6, 0.3, 0.1, 0.0));
        assert_eq!(vertex.bone_indices, [1, 2, 0, 0]);
    }

    #[test]
    fn test_version_seven_has_no_pool_type() {
        let mut model = skinned_triangle();
        let v8 = model.to_bytes().unwrap();

        model.version = 7;
        let v7 = model.to_bytes().unwrap();
        assert_eq!(&v7[..8], b"ZMS0007\0");
        assert_eq!(v7.len() + 2, v8.len());

        let loaded = ModelFile::from_bytes(&v7).unwrap();
        assert_eq!(loaded.version, 7);
        assert_eq!(loaded.pool, PoolType::Static);
    }

    #[test]
    fn test_rejects_other_files() {
        let err = ModelFile::from_bytes(b"ZMO0002\0\0\0\0\0").unwrap_err();
        assert!(matches!(err, Error::IdentifierMismatch { .. }));

        let err = ModelFile::from_bytes(b"ZMS0005\0\0\0\0\0").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidVersion {
                format: "ZMS",
                version: 5
            }
        ));
    }

    #[test]
    fn test_invalid_pool_type() {
        let mut bytes = ModelFile::new().to_bytes().unwrap();
        let len = bytes.len();
        bytes[len - 2] = 9;
        let err = ModelFile::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, Error::InvalidTag { value: 9, .. }));
    }
}
