//! ZMO skeletal and morph animation
//!
//! Layout: `ZMO0002\0`, `u32` frames per second, `u32` frame count, `u32`
//! channel count, channel headers `(u32 type, u32 bone/vertex index)`, then
//! frame-major data: for each frame, one value per channel. Files may end
//! with a frame-event trailer (`EZMO` / `3ZMO`, `u16` count, `u16` events,
//! `u32` offset of the trailer tag).

use std::io::{Read, Seek, SeekFrom, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::RoseFile;
use super::common::expect_identifier;
use crate::error::{Error, Result};
use crate::io::{CodecOptions, QuatOrder, RoseReadExt, RoseWriteExt, TextEncoding, count, tell_u32};

const IDENTIFIER: &str = "ZMO0002";

/// Stored channel type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum ChannelType {
    Position = 1 << 1,
    Rotation = 1 << 2,
    Normal = 1 << 3,
    Alpha = 1 << 4,
    Uv1 = 1 << 5,
    Uv2 = 1 << 6,
    Uv3 = 1 << 7,
    Uv4 = 1 << 8,
    TextureAnimation = 1 << 9,
    Scale = 1 << 10,
}

impl TryFrom<u32> for ChannelType {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        Ok(match value {
            0x002 => ChannelType::Position,
            0x004 => ChannelType::Rotation,
            0x008 => ChannelType::Normal,
            0x010 => ChannelType::Alpha,
            0x020 => ChannelType::Uv1,
            0x040 => ChannelType::Uv2,
            0x080 => ChannelType::Uv3,
            0x100 => ChannelType::Uv4,
            0x200 => ChannelType::TextureAnimation,
            0x400 => ChannelType::Scale,
            other => {
                return Err(Error::InvalidTag {
                    family: "ZMO channel",
                    value: other,
                });
            }
        })
    }
}

/// Keyframe values of one channel, one entry per frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChannelFrames {
    Position(Vec<Vec3>),
    Rotation(Vec<Quat>),
    Normal(Vec<Vec3>),
    Alpha(Vec<f32>),
    Uv1(Vec<Vec2>),
    Uv2(Vec<Vec2>),
    Uv3(Vec<Vec2>),
    Uv4(Vec<Vec2>),
    TextureAnimation(Vec<f32>),
    Scale(Vec<f32>),
}

impl ChannelFrames {
    pub fn empty(kind: ChannelType) -> Self {
        match kind {
            ChannelType::Position => ChannelFrames::Position(Vec::new()),
            ChannelType::Rotation => ChannelFrames::Rotation(Vec::new()),
            ChannelType::Normal => ChannelFrames::Normal(Vec::new()),
            ChannelType::Alpha => ChannelFrames::Alpha(Vec::new()),
            ChannelType::Uv1 => ChannelFrames::Uv1(Vec::new()),
            ChannelType::Uv2 => ChannelFrames::Uv2(Vec::new()),
            ChannelType::Uv3 => ChannelFrames::Uv3(Vec::new()),
            ChannelType::Uv4 => ChannelFrames::Uv4(Vec::new()),
            ChannelType::TextureAnimation => ChannelFrames::TextureAnimation(Vec::new()),
            ChannelType::Scale => ChannelFrames::Scale(Vec::new()),
        }
    }

    pub fn kind(&self) -> ChannelType {
        match self {
            ChannelFrames::Position(_) => ChannelType::Position,
            ChannelFrames::Rotation(_) => ChannelType::Rotation,
            ChannelFrames::Normal(_) => ChannelType::Normal,
            ChannelFrames::Alpha(_) => ChannelType::Alpha,
            ChannelFrames::Uv1(_) => ChannelType::Uv1,
            ChannelFrames::Uv2(_) => ChannelType::Uv2,
            ChannelFrames::Uv3(_) => ChannelType::Uv3,
            ChannelFrames::Uv4(_) => ChannelType::Uv4,
            ChannelFrames::TextureAnimation(_) => ChannelType::TextureAnimation,
            ChannelFrames::Scale(_) => ChannelType::Scale,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ChannelFrames::Position(v) | ChannelFrames::Normal(v) => v.len(),
            ChannelFrames::Rotation(v) => v.len(),
            ChannelFrames::Alpha(v) | ChannelFrames::TextureAnimation(v) | ChannelFrames::Scale(v) => {
                v.len()
            }
            ChannelFrames::Uv1(v) | ChannelFrames::Uv2(v) | ChannelFrames::Uv3(v) | ChannelFrames::Uv4(v) => {
                v.len()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_frame<R: Read>(&mut self, reader: &mut R) -> Result<()> {
        match self {
            ChannelFrames::Position(v) | ChannelFrames::Normal(v) => v.push(reader.read_vec3()?),
            ChannelFrames::Rotation(v) => v.push(reader.read_quat(QuatOrder::Wxyz)?),
            ChannelFrames::Alpha(v) | ChannelFrames::TextureAnimation(v) | ChannelFrames::Scale(v) => {
                v.push(reader.read_f32::<LittleEndian>()?);
            }
            ChannelFrames::Uv1(v) | ChannelFrames::Uv2(v) | ChannelFrames::Uv3(v) | ChannelFrames::Uv4(v) => {
                v.push(reader.read_vec2()?);
            }
        }
        Ok(())
    }

    fn write_frame<W: Write>(&self, writer: &mut W, frame: usize) -> Result<()> {
        match self {
            ChannelFrames::Position(v) | ChannelFrames::Normal(v) => writer.write_vec3(v[frame]),
            ChannelFrames::Rotation(v) => writer.write_quat(v[frame], QuatOrder::Wxyz),
            ChannelFrames::Alpha(v) | ChannelFrames::TextureAnimation(v) | ChannelFrames::Scale(v) => {
                Ok(writer.write_f32::<LittleEndian>(v[frame])?)
            }
            ChannelFrames::Uv1(v) | ChannelFrames::Uv2(v) | ChannelFrames::Uv3(v) | ChannelFrames::Uv4(v) => {
                writer.write_vec2(v[frame])
            }
        }
    }
}

/// One animated property of one bone (or morph vertex set).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationChannel {
    /// Bone index for skeletal channels, vertex set index for morph channels.
    pub index: u32,
    pub frames: ChannelFrames,
}

impl AnimationChannel {
    pub fn new(kind: ChannelType, index: u32) -> Self {
        Self {
            index,
            frames: ChannelFrames::empty(kind),
        }
    }

    pub fn kind(&self) -> ChannelType {
        self.frames.kind()
    }
}

/// Which trailer tag introduced the frame events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameEventTag {
    Ezmo,
    ThreeZmo,
}

impl FrameEventTag {
    fn bytes(self) -> &'static [u8; 4] {
        match self {
            FrameEventTag::Ezmo => b"EZMO",
            FrameEventTag::ThreeZmo => b"3ZMO",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameEvents {
    pub tag: FrameEventTag,
    pub events: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationFile {
    pub frames_per_second: u32,
    pub frame_count: u32,
    pub channels: Vec<AnimationChannel>,
    pub frame_events: Option<FrameEvents>,
}

impl Default for AnimationFile {
    fn default() -> Self {
        Self {
            frames_per_second: 30,
            frame_count: 0,
            channels: Vec::new(),
            frame_events: None,
        }
    }
}

impl AnimationFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time in seconds at which `frame` is shown.
    pub fn key_time(&self, frame: u32) -> f32 {
        if self.frames_per_second == 0 {
            0.0
        } else {
            frame as f32 / self.frames_per_second as f32
        }
    }

    pub fn duration(&self) -> f32 {
        self.key_time(self.frame_count)
    }

    pub fn channel(&self, index: usize) -> Result<&AnimationChannel> {
        self.channels.get(index).ok_or(Error::IndexOutOfRange {
            what: "channel",
            index,
            len: self.channels.len(),
        })
    }

    /// Channels animating bone (or vertex set) `index`.
    pub fn channels_for(&self, index: u32) -> impl Iterator<Item = &AnimationChannel> {
        self.channels.iter().filter(move |c| c.index == index)
    }

    /// Number of distinct bones / vertex sets with at least one channel.
    pub fn target_count(&self) -> usize {
        let mut targets: Vec<u32> = self.channels.iter().map(|c| c.index).collect();
        targets.sort_unstable();
        targets.dedup();
        targets.len()
    }

    fn read_frame_events<R: Read + Seek>(reader: &mut R) -> Result<Option<FrameEvents>> {
        let position = reader.stream_position()?;
        let end = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(position))?;
        if end.saturating_sub(position) < 10 {
            return Ok(None);
        }

        let mut tag = [0u8; 4];
        reader.read_exact(&mut tag)?;
        let tag = match &tag {
            b"EZMO" => FrameEventTag::Ezmo,
            b"3ZMO" => FrameEventTag::ThreeZmo,
            _ => {
                tracing::warn!("Ignoring {} unknown trailing bytes in ZMO", end - position);
                return Ok(None);
            }
        };

        let event_count = reader.read_u16::<LittleEndian>()?;
        let mut events = Vec::with_capacity(event_count as usize);
        for _ in 0..event_count {
            events.push(reader.read_u16::<LittleEndian>()?);
        }
        // Trailing offset points back at the tag.
        let tag_offset = reader.read_u32::<LittleEndian>()?;
        if u64::from(tag_offset) != position {
            tracing::warn!(
                "ZMO frame event offset {tag_offset:#x} does not match tag at {position:#x}"
            );
        }
        Ok(Some(FrameEvents { tag, events }))
    }
}

impl RoseFile for AnimationFile {
    const FORMAT: &'static str = "ZMO";

    fn read_from<R: Read + Seek>(reader: &mut R, _options: &CodecOptions) -> Result<Self> {
        let identifier = reader.read_null_terminated_string(TextEncoding::EucKr)?;
        expect_identifier(IDENTIFIER, &identifier)?;

        let frames_per_second = reader.read_u32::<LittleEndian>()?;
        let frame_count = reader.read_u32::<LittleEndian>()?;
        let channel_count = reader.read_u32::<LittleEndian>()?;

        let mut channels = Vec::with_capacity(channel_count.min(1024) as usize);
        for _ in 0..channel_count {
            let kind = ChannelType::try_from(reader.read_u32::<LittleEndian>()?)?;
            let index = reader.read_u32::<LittleEndian>()?;
            channels.push(AnimationChannel::new(kind, index));
        }

        for _ in 0..frame_count {
            for channel in &mut channels {
                channel.frames.read_frame(reader)?;
            }
        }

        let frame_events = Self::read_frame_events(reader)?;

        tracing::debug!(
            "Read ZMO: {} frames @ {} fps, {} channels",
            frame_count,
            frames_per_second,
            channels.len()
        );

        Ok(Self {
            frames_per_second,
            frame_count,
            channels,
            frame_events,
        })
    }

    fn write_to<W: Write + Seek>(&self, writer: &mut W, _options: &CodecOptions) -> Result<()> {
        let frame_count = self.frame_count as usize;
        for channel in &self.channels {
            if channel.frames.len() != frame_count {
                return Err(Error::IndexOutOfRange {
                    what: "animation frame",
                    index: channel.frames.len(),
                    len: frame_count,
                });
            }
        }

        writer.write_null_terminated_string(IDENTIFIER, TextEncoding::EucKr)?;
        writer.write_u32::<LittleEndian>(self.frames_per_second)?;
        writer.write_u32::<LittleEndian>(self.frame_count)?;
        writer.write_u32::<LittleEndian>(count("channels", self.channels.len())?)?;
        for channel in &self.channels {
            writer.write_u32::<LittleEndian>(channel.kind() as u32)?;
            writer.write_u32::<LittleEndian>(channel.index)?;
        }

        for frame in 0..frame_count {
            for channel in &self.channels {
                channel.frames.write_frame(writer, frame)?;
            }
        }

        if let Some(trailer) = &self.frame_events {
            let offset = tell_u32(writer)?;
            writer.write_all(trailer.tag.bytes())?;
            writer.write_u16::<LittleEndian>(count("frame events", trailer.events.len())?)?;
            for event in &trailer.events {
                writer.write_u16::<LittleEndian>(*event)?;
            }
            writer.write_u32::<LittleEndian>(offset)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn two_bone_animation() -> AnimationFile {
        let mut animation = AnimationFile::new();
        animation.frame_count = 1;

        let mut rotation = AnimationChannel::new(ChannelType::Rotation, 0);
        if let ChannelFrames::Rotation(frames) = &mut rotation.frames {
            frames.push(Quat::from_rotation_y(0.5));
        }
        let mut position = AnimationChannel::new(ChannelType::Position, 1);
        if let ChannelFrames::Position(frames) = &mut position.frames {
            frames.push(Vec3::new(0.0, 1.5, -2.0));
        }
        animation.channels = vec![rotation, position];
        animation
    }

    #[test]
    fn test_two_bone_round_trip() {
        let animation = two_bone_animation();
        let loaded = AnimationFile::from_bytes(&animation.to_bytes().unwrap()).unwrap();

        assert_eq!(loaded.target_count(), 2);
        assert_eq!(loaded.channels.len(), 2);
        assert_eq!(loaded.channels_for(0).count(), 1);
        assert_eq!(loaded.channels_for(1).count(), 1);
        assert_eq!(loaded.key_time(0), 0.0);
        assert_eq!(loaded.channel(0).unwrap().frames, animation.channels[0].frames);
        assert_eq!(
            loaded.channel(1).unwrap().frames,
            ChannelFrames::Position(vec![Vec3::new(0.0, 1.5, -2.0)])
        );
        assert_eq!(loaded, animation);
    }

    #[test]
    fn test_frame_major_layout() {
        let mut animation = AnimationFile::new();
        animation.frame_count = 2;
        animation.channels = vec![
            AnimationChannel {
                index: 0,
                frames: ChannelFrames::Alpha(vec![1.0, 2.0]),
            },
            AnimationChannel {
                index: 1,
                frames: ChannelFrames::Scale(vec![3.0, 4.0]),
            },
        ];
        let bytes = animation.to_bytes().unwrap();
        // identifier(8) + fps + frames + channel count + 2 channel headers
        let data = &bytes[8 + 12 + 16..];
        let floats: Vec<f32> = data
            .chunks(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(floats, vec![1.0, 3.0, 2.0, 4.0]);
    }

    #[test]
    fn test_frame_event_trailer() {
        let mut animation = two_bone_animation();
        animation.frame_events = Some(FrameEvents {
            tag: FrameEventTag::ThreeZmo,
            events: vec![0, 12],
        });
        let bytes = animation.to_bytes().unwrap();
        let tail = u32::from_le_bytes(bytes[bytes.len() - 4..].try_into().unwrap()) as usize;
        assert_eq!(&bytes[tail..tail + 4], b"3ZMO");

        let loaded = AnimationFile::from_bytes(&bytes).unwrap();
        assert_eq!(loaded.frame_events, animation.frame_events);
        assert_eq!(loaded.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_stale_frame_event_offset_still_loads() {
        let mut animation = two_bone_animation();
        animation.frame_events = Some(FrameEvents {
            tag: FrameEventTag::Ezmo,
            events: vec![3],
        });
        let mut bytes = animation.to_bytes().unwrap();
        let tail = bytes.len() - 4;
        bytes[tail..].copy_from_slice(&0xdead_u32.to_le_bytes());

        let loaded = AnimationFile::from_bytes(&bytes).unwrap();
        assert_eq!(loaded.frame_events, animation.frame_events);
        // Rewritten with the true offset.
        let rewritten = loaded.to_bytes().unwrap();
        let offset = u32::from_le_bytes(rewritten[tail..].try_into().unwrap()) as usize;
        assert_eq!(&rewritten[offset..offset + 4], b"EZMO");
    }

    #[test]
    fn test_mismatched_frame_count_rejected() {
        let mut animation = two_bone_animation();
        animation.frame_count = 3;
        assert!(matches!(
            animation.to_bytes().unwrap_err(),
            Error::IndexOutOfRange {
                what: "animation frame",
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_channel_type() {
        let mut bytes = two_bone_animation().to_bytes().unwrap();
        // First channel type follows identifier and three u32 header fields.
        bytes[20..24].copy_from_slice(&0x800u32.to_le_bytes());
        let err = AnimationFile::from_bytes(&bytes).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTag {
                family: "ZMO channel",
                value: 0x800
            }
        ));
    }
}
