//! ZSC model lists
//!
//! Catalog of scene objects built from meshes, materials and effects. Each
//! object part and effect carries a list of tagged properties: `u8 tag`,
//! `u8 payload size`, payload. Tag 0 ends the list.

use std::io::{Cursor, Read, Seek, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::RoseFile;
use super::common::TaggedRecord;
use crate::error::{Error, Result};
use crate::io::{AlignedReader, AlignedWriter, CodecOptions, QuatOrder, RoseReadExt, RoseWriteExt, TextEncoding, count};
use crate::types::{BoundingBox, BoundingSphere, Color3};

/// Per-part or per-effect property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModelListProperty {
    Position(Vec3),
    Rotation(Quat),
    Scale(Vec3),
    AxisRotation(Quat),
    BoneIndex(i16),
    DummyIndex(i16),
    /// 1-based index of the parent part, 0 for none.
    Parent(i16),
    Collision(i16),
    /// Path of a ZMO played in a loop.
    ConstantAnimation(String),
    VisibleRangeSet(i16),
    UseLightmap(i16),
}

impl TaggedRecord for ModelListProperty {
    const FAMILY: &'static str = "ZSC property";

    fn tag(&self) -> u32 {
        match self {
            ModelListProperty::Position(_) => 1,
            ModelListProperty::Rotation(_) => 2,
            ModelListProperty::Scale(_) => 3,
            ModelListProperty::AxisRotation(_) => 4,
            ModelListProperty::BoneIndex(_) => 5,
            ModelListProperty::DummyIndex(_) => 6,
            ModelListProperty::Parent(_) => 7,
            ModelListProperty::Collision(_) => 29,
            ModelListProperty::ConstantAnimation(_) => 30,
            ModelListProperty::VisibleRangeSet(_) => 31,
            ModelListProperty::UseLightmap(_) => 32,
        }
    }

    fn read_payload<R: Read + Seek>(
        tag: u32,
        reader: &mut AlignedReader<R>,
        encoding: TextEncoding,
    ) -> Result<Self> {
        Ok(match tag {
            1 => ModelListProperty::Position(reader.read_vec3()?),
            2 => ModelListProperty::Rotation(reader.read_quat(QuatOrder::Wxyz)?),
            3 => ModelListProperty::Scale(reader.read_vec3()?),
            4 => ModelListProperty::AxisRotation(reader.read_quat(QuatOrder::Wxyz)?),
            5 => ModelListProperty::BoneIndex(reader.read_i16()?),
            6 => ModelListProperty::DummyIndex(reader.read_i16()?),
            7 => ModelListProperty::Parent(reader.read_i16()?),
            29 => ModelListProperty::Collision(reader.read_i16()?),
            30 => {
                // The string fills the whole payload.
                let mut bytes = Vec::new();
                reader.read_to_end(&mut bytes)?;
                let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
                ModelListProperty::ConstantAnimation(encoding.decode(&bytes[..end]))
            }
            31 => ModelListProperty::VisibleRangeSet(reader.read_i16()?),
            32 => ModelListProperty::UseLightmap(reader.read_i16()?),
            other => return Err(Self::invalid_tag(other)),
        })
    }

    fn write_payload<W: Write>(
        &self,
        writer: &mut AlignedWriter<W>,
        encoding: TextEncoding,
    ) -> Result<()> {
        match self {
            ModelListProperty::Position(value) | ModelListProperty::Scale(value) => {
                writer.write_vec3(*value)
            }
            ModelListProperty::Rotation(value) | ModelListProperty::AxisRotation(value) => {
                writer.write_quat(*value, QuatOrder::Wxyz)
            }
            ModelListProperty::BoneIndex(value)
            | ModelListProperty::DummyIndex(value)
            | ModelListProperty::Parent(value)
            | ModelListProperty::Collision(value)
            | ModelListProperty::VisibleRangeSet(value)
            | ModelListProperty::UseLightmap(value) => writer.write_i16(*value),
            ModelListProperty::ConstantAnimation(path) => writer.write_bytes(&encoding.encode(path)?),
        }
    }
}

fn read_properties<R: Read>(reader: &mut R, encoding: TextEncoding) -> Result<Vec<ModelListProperty>> {
    let mut properties = Vec::new();
    loop {
        let tag = reader.read_u8()?;
        if tag == 0 {
            break;
        }
        let size = reader.read_u8()?;
        let mut payload = vec![0u8; usize::from(size)];
        reader.read_exact(&mut payload)?;

        let mut payload = AlignedReader::new(Cursor::new(payload)).with_alignment(false);
        properties.push(ModelListProperty::read_payload(u32::from(tag), &mut payload, encoding)?);
        if payload.position() < u64::from(size) {
            tracing::warn!(
                "{} {} ignored {} trailing bytes",
                ModelListProperty::FAMILY,
                tag,
                u64::from(size) - payload.position()
            );
        }
    }
    Ok(properties)
}

fn write_properties<W: Write>(
    writer: &mut W,
    properties: &[ModelListProperty],
    encoding: TextEncoding,
) -> Result<()> {
    for property in properties {
        let mut payload = AlignedWriter::new(Vec::new()).with_alignment(false);
        property.write_payload(&mut payload, encoding)?;
        let payload = payload.into_inner();

        writer.write_u8(property.tag() as u8)?;
        writer.write_u8(count("property payload bytes", payload.len())?)?;
        writer.write_all(&payload)?;
    }
    writer.write_u8(0)?;
    Ok(())
}

fn find_property<T>(
    properties: &[ModelListProperty],
    pick: impl Fn(&ModelListProperty) -> Option<T>,
) -> Option<T> {
    properties.iter().find_map(pick)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelListMaterial {
    pub path: String,
    pub is_skin: bool,
    pub alpha_enabled: bool,
    pub two_sided: bool,
    pub alpha_test_enabled: bool,
    pub alpha_reference: i16,
    pub z_test_enabled: bool,
    pub z_write_enabled: bool,
    pub blend_type: i16,
    pub specular_enabled: bool,
    pub alpha: f32,
    pub glow_type: i16,
    pub glow_color: Color3,
}

impl Default for ModelListMaterial {
    fn default() -> Self {
        Self {
            path: String::new(),
            is_skin: false,
            alpha_enabled: false,
            two_sided: false,
            alpha_test_enabled: true,
            alpha_reference: 128,
            z_test_enabled: true,
            z_write_enabled: true,
            blend_type: 0,
            specular_enabled: false,
            alpha: 1.0,
            glow_type: 0,
            glow_color: Color3 {
                r: 1.0,
                g: 1.0,
                b: 1.0,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelListPart {
    pub model: i16,
    pub texture: i16,
    pub properties: Vec<ModelListProperty>,
}

impl ModelListPart {
    pub fn position(&self) -> Vec3 {
        find_property(&self.properties, |p| match p {
            ModelListProperty::Position(v) => Some(*v),
            _ => None,
        })
        .unwrap_or(Vec3::ZERO)
    }

    pub fn rotation(&self) -> Quat {
        find_property(&self.properties, |p| match p {
            ModelListProperty::Rotation(q) => Some(*q),
            _ => None,
        })
        .unwrap_or(Quat::IDENTITY)
    }

    pub fn scale(&self) -> Vec3 {
        find_property(&self.properties, |p| match p {
            ModelListProperty::Scale(v) => Some(*v),
            _ => None,
        })
        .unwrap_or(Vec3::ONE)
    }

    /// Parent part index, if the part is attached to another part.
    pub fn parent(&self) -> Option<usize> {
        find_property(&self.properties, |p| match p {
            ModelListProperty::Parent(index) if *index > 0 => Some(*index as usize - 1),
            _ => None,
        })
    }

    /// Local transform relative to the object (or parent part).
    pub fn transform(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale(), self.rotation(), self.position())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelListEffect {
    pub effect: i16,
    pub effect_type: i16,
    pub properties: Vec<ModelListProperty>,
}

/// One placeable object.
///
/// Objects without parts store neither effects nor a bounding box.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelListObject {
    pub bounding_sphere: BoundingSphere,
    pub parts: Vec<ModelListPart>,
    pub effects: Vec<ModelListEffect>,
    pub bounding_box: BoundingBox,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelListFile {
    pub models: Vec<String>,
    pub materials: Vec<ModelListMaterial>,
    pub effects: Vec<String>,
    pub objects: Vec<ModelListObject>,
}

fn read_flag<R: Read>(reader: &mut R) -> Result<bool> {
    Ok(reader.read_i16::<LittleEndian>()? != 0)
}

fn write_flag<W: Write>(writer: &mut W, value: bool) -> Result<()> {
    writer.write_i16::<LittleEndian>(i16::from(value))?;
    Ok(())
}

impl ModelListFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object(&self, index: usize) -> Result<&ModelListObject> {
        self.objects.get(index).ok_or(Error::IndexOutOfRange {
            what: "object",
            index,
            len: self.objects.len(),
        })
    }

    pub fn model(&self, index: usize) -> Result<&str> {
        self.models
            .get(index)
            .map(String::as_str)
            .ok_or(Error::IndexOutOfRange {
                what: "model",
                index,
                len: self.models.len(),
            })
    }

    pub fn material(&self, index: usize) -> Result<&ModelListMaterial> {
        self.materials.get(index).ok_or(Error::IndexOutOfRange {
            what: "material",
            index,
            len: self.materials.len(),
        })
    }

    fn read_material<R: Read>(reader: &mut R, encoding: TextEncoding) -> Result<ModelListMaterial> {
        Ok(ModelListMaterial {
            path: reader.read_null_terminated_string(encoding)?,
            is_skin: read_flag(reader)?,
            alpha_enabled: read_flag(reader)?,
            two_sided: read_flag(reader)?,
            alpha_test_enabled: read_flag(reader)?,
            alpha_reference: reader.read_i16::<LittleEndian>()?,
            z_test_enabled: read_flag(reader)?,
            z_write_enabled: read_flag(reader)?,
            blend_type: reader.read_i16::<LittleEndian>()?,
            specular_enabled: read_flag(reader)?,
            alpha: reader.read_f32::<LittleEndian>()?,
            glow_type: reader.read_i16::<LittleEndian>()?,
            glow_color: reader.read_color3()?,
        })
    }

    fn write_material<W: Write>(writer: &mut W, material: &ModelListMaterial, encoding: TextEncoding) -> Result<()> {
        writer.write_null_terminated_string(&material.path, encoding)?;
        write_flag(writer, material.is_skin)?;
        write_flag(writer, material.alpha_enabled)?;
        write_flag(writer, material.two_sided)?;
        write_flag(writer, material.alpha_test_enabled)?;
        writer.write_i16::<LittleEndian>(material.alpha_reference)?;
        write_flag(writer, material.z_test_enabled)?;
        write_flag(writer, material.z_write_enabled)?;
        writer.write_i16::<LittleEndian>(material.blend_type)?;
        write_flag(writer, material.specular_enabled)?;
        writer.write_f32::<LittleEndian>(material.alpha)?;
        writer.write_i16::<LittleEndian>(material.glow_type)?;
        writer.write_color3(material.glow_color)
    }

    fn read_object<R: Read>(reader: &mut R, encoding: TextEncoding) -> Result<ModelListObject> {
        let radius = reader.read_i32::<LittleEndian>()?;
        let center = reader.read_ivec2()?;
        let mut object = ModelListObject {
            bounding_sphere: BoundingSphere { center, radius },
            ..ModelListObject::default()
        };

        let part_count = reader.read_u16::<LittleEndian>()?;
        if part_count == 0 {
            return Ok(object);
        }

        for _ in 0..part_count {
            object.parts.push(ModelListPart {
                model: reader.read_i16::<LittleEndian>()?,
                texture: reader.read_i16::<LittleEndian>()?,
                properties: read_properties(reader, encoding)?,
            });
        }

        let effect_count = reader.read_u16::<LittleEndian>()?;
        for _ in 0..effect_count {
            object.effects.push(ModelListEffect {
                effect: reader.read_i16::<LittleEndian>()?,
                effect_type: reader.read_i16::<LittleEndian>()?,
                properties: read_properties(reader, encoding)?,
            });
        }

        object.bounding_box = BoundingBox {
            minimum: reader.read_vec3()?,
            maximum: reader.read_vec3()?,
        };
        Ok(object)
    }

    fn write_object<W: Write>(writer: &mut W, object: &ModelListObject, encoding: TextEncoding) -> Result<()> {
        writer.write_i32::<LittleEndian>(object.bounding_sphere.radius)?;
        writer.write_ivec2(object.bounding_sphere.center)?;
        writer.write_u16::<LittleEndian>(count("object parts", object.parts.len())?)?;
        if object.parts.is_empty() {
            if !object.effects.is_empty() {
                tracing::warn!("Dropping {} effects of an object without parts", object.effects.len());
            }
            return Ok(());
        }

        for part in &object.parts {
            writer.write_i16::<LittleEndian>(part.model)?;
            writer.write_i16::<LittleEndian>(part.texture)?;
            write_properties(writer, &part.properties, encoding)?;
        }

        writer.write_u16::<LittleEndian>(count("object effects", object.effects.len())?)?;
        for effect in &object.effects {
            writer.write_i16::<LittleEndian>(effect.effect)?;
            writer.write_i16::<LittleEndian>(effect.effect_type)?;
            write_properties(writer, &effect.properties, encoding)?;
        }

        writer.write_vec3(object.bounding_box.minimum)?;
        writer.write_vec3(object.bounding_box.maximum)
    }
}

fn read_paths<R: Read>(reader: &mut R, encoding: TextEncoding) -> Result<Vec<String>> {
    let path_count = reader.read_u16::<LittleEndian>()?;
    (0..path_count)
        .map(|_| reader.read_null_terminated_string(encoding))
        .collect()
}

fn write_paths<W: Write>(writer: &mut W, what: &'static str, paths: &[String], encoding: TextEncoding) -> Result<()> {
    writer.write_u16::<LittleEndian>(count(what, paths.len())?)?;
    for path in paths {
        writer.write_null_terminated_string(path, encoding)?;
    }
    Ok(())
}

impl RoseFile for ModelListFile {
    const FORMAT: &'static str = "ZSC";

    fn read_from<R: Read + Seek>(reader: &mut R, options: &CodecOptions) -> Result<Self> {
        let encoding = options.encoding_or(TextEncoding::EucKr);
        let models = read_paths(reader, encoding)?;

        let material_count = reader.read_u16::<LittleEndian>()?;
        let materials = (0..material_count)
            .map(|_| Self::read_material(reader, encoding))
            .collect::<Result<_>>()?;

        let effects = read_paths(reader, encoding)?;

        let object_count = reader.read_u16::<LittleEndian>()?;
        let objects: Vec<ModelListObject> = (0..object_count)
            .map(|_| Self::read_object(reader, encoding))
            .collect::<Result<_>>()?;

        tracing::debug!("Read ZSC: {} models, {} objects", models.len(), objects.len());

        Ok(Self {
            models,
            materials,
            effects,
            objects,
        })
    }

    fn write_to<W: Write + Seek>(&self, writer: &mut W, options: &CodecOptions) -> Result<()> {
        let encoding = options.encoding_or(TextEncoding::EucKr);
        write_paths(writer, "models", &self.models, encoding)?;

        writer.write_u16::<LittleEndian>(count("materials", self.materials.len())?)?;
        for material in &self.materials {
            Self::write_material(writer, material, encoding)?;
        }

        write_paths(writer, "effects", &self.effects, encoding)?;

        writer.write_u16::<LittleEndian>(count("objects", self.objects.len())?)?;
        for object in &self.objects {
            Self::write_object(writer, object, encoding)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec2;
    use pretty_assertions::assert_eq;

    fn sample_list() -> ModelListFile {
        let mut list = ModelListFile::new();
        list.models = vec!["3DDATA/JUNON/TREE01.ZMS".to_string()];
        list.materials = vec![ModelListMaterial {
            path: "3DDATA/JUNON/TREE01.DDS".to_string(),
            two_sided: true,
            ..ModelListMaterial::default()
        }];
        list.effects = vec!["3DDATA/EFFECT/FIRE.EFT".to_string()];
        list.objects = vec![
            ModelListObject {
                bounding_sphere: BoundingSphere {
                    center: IVec2::new(10, -10),
                    radius: 300,
                },
                parts: vec![
                    ModelListPart {
                        model: 0,
                        texture: 0,
                        properties: vec![
                            ModelListProperty::Position(Vec3::new(1.0, 2.0, 3.0)),
                            ModelListProperty::Rotation(Quat::from_rotation_z(1.0)),
                            ModelListProperty::Collision(3),
                        ],
                    },
                    ModelListPart {
                        model: 0,
                        texture: 0,
                        properties: vec![
                            ModelListProperty::Parent(1),
                            ModelListProperty::ConstantAnimation("3DDATA/MOTION/SWAY.ZMO".to_string()),
                        ],
                    },
                ],
                effects: vec![ModelListEffect {
                    effect: 0,
                    effect_type: 1,
                    properties: vec![ModelListProperty::DummyIndex(2)],
                }],
                bounding_box: BoundingBox {
                    minimum: Vec3::splat(-1.0),
                    maximum: Vec3::splat(1.0),
                },
            },
            ModelListObject::default(),
        ];
        list
    }

    #[test]
    fn test_round_trip() {
        let list = sample_list();
        let bytes = list.to_bytes().unwrap();
        let loaded = ModelListFile::from_bytes(&bytes).unwrap();
        assert_eq!(loaded, list);
        assert_eq!(loaded.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_property_envelope() {
        let mut bytes = Vec::new();
        write_properties(
            &mut bytes,
            &[
                ModelListProperty::BoneIndex(4),
                ModelListProperty::ConstantAnimation("A.ZMO".to_string()),
            ],
            TextEncoding::EucKr,
        )
        .unwrap();
        assert_eq!(bytes, [5, 2, 4, 0, 30, 5, b'A', b'.', b'Z', b'M', b'O', 0]);
    }

    #[test]
    fn test_short_property_payload_is_skipped() {
        // BoneIndex declared with 4 bytes of payload; only 2 are meaningful.
        let bytes = [5u8, 4, 7, 0, 0xEE, 0xEE, 0];
        let properties = read_properties(&mut Cursor::new(bytes), TextEncoding::EucKr).unwrap();
        assert_eq!(properties, vec![ModelListProperty::BoneIndex(7)]);
    }

    #[test]
    fn test_unknown_property_tag() {
        let bytes = [12u8, 2, 0, 0, 0];
        let err = read_properties(&mut Cursor::new(bytes), TextEncoding::EucKr).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTag {
                family: "ZSC property",
                value: 12
            }
        ));
    }

    #[test]
    fn test_part_transform() {
        let list = sample_list();
        let object = list.object(0).unwrap();
        assert_eq!(object.parts[0].position(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(object.parts[0].scale(), Vec3::ONE);
        assert_eq!(object.parts[0].parent(), None);
        assert_eq!(object.parts[1].parent(), Some(0));
        let translation = object.parts[0].transform().w_axis.truncate();
        assert_eq!(translation, Vec3::new(1.0, 2.0, 3.0));
        assert!(list.object(2).is_err());
    }
}
