//! Struct-packing aware reader and writer
//!
//! The game engine serialized some records straight from packed C structs, so
//! a multi-byte field starts at a multiple of its own size. Alignment is
//! measured from the last [`AlignedReader::reset`] (not the absolute stream
//! position), which lets each record be aligned independently.

use std::io::{self, Read, Seek, SeekFrom, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use glam::{Vec2, Vec3, Vec4};

use crate::error::Result;

/// Default boundary used by [`AlignedReader::align`] / [`AlignedWriter::align`].
pub const DEFAULT_ALIGNMENT: u64 = 4;

fn padding(counter: u64, size: u64) -> u64 {
    (size - counter % size) % size
}

/// Reader that counts consumed bytes and skips struct padding.
///
/// Implements [`Read`] itself (counting, never aligning), so string helpers
/// from [`crate::io::RoseReadExt`] also advance the counter.
pub struct AlignedReader<R> {
    inner: R,
    consumed: u64,
    alignment: bool,
}

impl<R: Read + Seek> AlignedReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            consumed: 0,
            alignment: true,
        }
    }

    /// Set whether primitive reads are padded.
    #[must_use]
    pub fn with_alignment(mut self, enabled: bool) -> Self {
        self.alignment = enabled;
        self
    }

    pub fn set_alignment_enabled(&mut self, enabled: bool) {
        self.alignment = enabled;
    }

    pub fn alignment_enabled(&self) -> bool {
        self.alignment
    }

    /// Restart alignment at the current stream position.
    pub fn reset(&mut self) {
        self.consumed = 0;
    }

    /// Bytes consumed since the last reset, padding included.
    pub fn position(&self) -> u64 {
        self.consumed
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Skip forward to the next multiple of `size` since the last reset.
    pub fn align_to(&mut self, size: u64) -> Result<()> {
        if !self.alignment || size <= 1 {
            return Ok(());
        }
        let pad = padding(self.consumed, size);
        if pad > 0 {
            self.inner.seek(SeekFrom::Current(pad as i64))?;
            self.consumed += pad;
        }
        Ok(())
    }

    pub fn align(&mut self) -> Result<()> {
        self.align_to(DEFAULT_ALIGNMENT)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(ReadBytesExt::read_u8(self)?)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(ReadBytesExt::read_i8(self)?)
    }

    /// Single byte, non-zero is true.
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.align_to(2)?;
        Ok(ReadBytesExt::read_u16::<LittleEndian>(self)?)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.align_to(2)?;
        Ok(ReadBytesExt::read_i16::<LittleEndian>(self)?)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.align_to(4)?;
        Ok(ReadBytesExt::read_u32::<LittleEndian>(self)?)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.align_to(4)?;
        Ok(ReadBytesExt::read_i32::<LittleEndian>(self)?)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.align_to(4)?;
        Ok(ReadBytesExt::read_f32::<LittleEndian>(self)?)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.align_to(8)?;
        Ok(ReadBytesExt::read_u64::<LittleEndian>(self)?)
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.align_to(8)?;
        Ok(ReadBytesExt::read_i64::<LittleEndian>(self)?)
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.align_to(8)?;
        Ok(ReadBytesExt::read_f64::<LittleEndian>(self)?)
    }

    /// Raw bytes; counted but never aligned.
    pub fn read_bytes(&mut self, length: usize) -> Result<Vec<u8>> {
        let mut bytes = vec![0u8; length];
        if length > 0 {
            self.read_exact(&mut bytes)?;
        }
        Ok(bytes)
    }

    pub fn read_vec2(&mut self) -> Result<Vec2> {
        Ok(Vec2::new(self.read_f32()?, self.read_f32()?))
    }

    pub fn read_vec3(&mut self) -> Result<Vec3> {
        Ok(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    pub fn read_vec4(&mut self) -> Result<Vec4> {
        Ok(Vec4::new(
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
        ))
    }
}

impl<R: Read> Read for AlignedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.consumed += n as u64;
        Ok(n)
    }
}

/// Writer that counts produced bytes and emits zero padding.
pub struct AlignedWriter<W> {
    inner: W,
    produced: u64,
    alignment: bool,
}

impl<W: Write> AlignedWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            produced: 0,
            alignment: true,
        }
    }

    #[must_use]
    pub fn with_alignment(mut self, enabled: bool) -> Self {
        self.alignment = enabled;
        self
    }

    pub fn set_alignment_enabled(&mut self, enabled: bool) {
        self.alignment = enabled;
    }

    pub fn reset(&mut self) {
        self.produced = 0;
    }

    /// Bytes produced since the last reset, padding included.
    pub fn position(&self) -> u64 {
        self.produced
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn align_to(&mut self, size: u64) -> Result<()> {
        if !self.alignment || size <= 1 {
            return Ok(());
        }
        for _ in 0..padding(self.produced, size) {
            WriteBytesExt::write_u8(self, 0)?;
        }
        Ok(())
    }

    pub fn align(&mut self) -> Result<()> {
        self.align_to(DEFAULT_ALIGNMENT)
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        Ok(WriteBytesExt::write_u8(self, value)?)
    }

    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        Ok(WriteBytesExt::write_i8(self, value)?)
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_u8(u8::from(value))
    }

    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.align_to(2)?;
        Ok(WriteBytesExt::write_u16::<LittleEndian>(self, value)?)
    }

    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.align_to(2)?;
        Ok(WriteBytesExt::write_i16::<LittleEndian>(self, value)?)
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.align_to(4)?;
        Ok(WriteBytesExt::write_u32::<LittleEndian>(self, value)?)
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.align_to(4)?;
        Ok(WriteBytesExt::write_i32::<LittleEndian>(self, value)?)
    }

    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.align_to(4)?;
        Ok(WriteBytesExt::write_f32::<LittleEndian>(self, value)?)
    }

    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.align_to(8)?;
        Ok(WriteBytesExt::write_u64::<LittleEndian>(self, value)?)
    }

    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.align_to(8)?;
        Ok(WriteBytesExt::write_i64::<LittleEndian>(self, value)?)
    }

    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        self.align_to(8)?;
        Ok(WriteBytesExt::write_f64::<LittleEndian>(self, value)?)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_all(bytes)?;
        Ok(())
    }

    pub fn write_vec2(&mut self, value: Vec2) -> Result<()> {
        value.to_array().into_iter().try_for_each(|c| self.write_f32(c))
    }

    pub fn write_vec3(&mut self, value: Vec3) -> Result<()> {
        value.to_array().into_iter().try_for_each(|c| self.write_f32(c))
    }

    pub fn write_vec4(&mut self, value: Vec4) -> Result<()> {
        value.to_array().into_iter().try_for_each(|c| self.write_f32(c))
    }
}

impl<W: Write> Write for AlignedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.produced += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
