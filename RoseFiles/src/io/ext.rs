//! String and composite-value extensions for `Read` / `Write`
//!
//! Every composite value is a run of little-endian 32-bit floats with no
//! padding between components. Strings are stored in a caller-chosen
//! codepage, either NUL-terminated, length-prefixed or fixed-width.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use glam::{IVec2, Mat4, Quat, Vec2, Vec3, Vec4};

use super::text::TextEncoding;
use crate::error::{Error, Result};
use crate::types::{Color3, Color4};

/// Field order of a stored quaternion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuatOrder {
    Wxyz,
    Xyzw,
}

/// Reading helpers shared by every format.
pub trait RoseReadExt: Read {
    /// Read bytes up to (and consuming) a NUL terminator.
    fn read_null_terminated_string(&mut self, encoding: TextEncoding) -> Result<String> {
        let mut bytes = Vec::new();
        loop {
            let byte = self.read_u8()?;
            if byte == 0 {
                break;
            }
            bytes.push(byte);
        }
        Ok(encoding.decode(&bytes))
    }

    /// Read exactly `length` bytes, trimming at the first NUL.
    fn read_fixed_string(&mut self, length: usize, encoding: TextEncoding) -> Result<String> {
        // Bounded by the stream, not the stored length.
        let mut bytes = Vec::with_capacity(length.min(1 << 12));
        Read::take(&mut *self, length as u64).read_to_end(&mut bytes)?;
        if bytes.len() != length {
            return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
        }
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(length);
        Ok(encoding.decode(&bytes[..end]))
    }

    fn read_u8_prefixed_string(&mut self, encoding: TextEncoding) -> Result<String> {
        let length = self.read_u8()? as usize;
        self.read_fixed_string(length, encoding)
    }

    fn read_u16_prefixed_string(&mut self, encoding: TextEncoding) -> Result<String> {
        let length = self.read_u16::<LittleEndian>()? as usize;
        self.read_fixed_string(length, encoding)
    }

    fn read_u32_prefixed_string(&mut self, encoding: TextEncoding) -> Result<String> {
        let length = self.read_u32::<LittleEndian>()? as usize;
        self.read_fixed_string(length, encoding)
    }

    /// Read a string prefixed by a 7-bit variable-length byte count.
    fn read_varint_prefixed_string(&mut self, encoding: TextEncoding) -> Result<String> {
        let mut length = 0usize;
        let mut shift = 0;
        loop {
            let byte = self.read_u8()?;
            length |= ((byte & 0x7F) as usize) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
            if shift > 28 {
                return Err(Error::StringTooLong {
                    length,
                    max: u32::MAX as usize,
                });
            }
        }
        self.read_fixed_string(length, encoding)
    }

    fn read_vec2(&mut self) -> Result<Vec2> {
        let x = self.read_f32::<LittleEndian>()?;
        let y = self.read_f32::<LittleEndian>()?;
        Ok(Vec2::new(x, y))
    }

    fn read_vec3(&mut self) -> Result<Vec3> {
        let x = self.read_f32::<LittleEndian>()?;
        let y = self.read_f32::<LittleEndian>()?;
        let z = self.read_f32::<LittleEndian>()?;
        Ok(Vec3::new(x, y, z))
    }

    fn read_vec4(&mut self) -> Result<Vec4> {
        let x = self.read_f32::<LittleEndian>()?;
        let y = self.read_f32::<LittleEndian>()?;
        let z = self.read_f32::<LittleEndian>()?;
        let w = self.read_f32::<LittleEndian>()?;
        Ok(Vec4::new(x, y, z, w))
    }

    fn read_ivec2(&mut self) -> Result<IVec2> {
        let x = self.read_i32::<LittleEndian>()?;
        let y = self.read_i32::<LittleEndian>()?;
        Ok(IVec2::new(x, y))
    }

    fn read_quat(&mut self, order: QuatOrder) -> Result<Quat> {
        let a = self.read_f32::<LittleEndian>()?;
        let b = self.read_f32::<LittleEndian>()?;
        let c = self.read_f32::<LittleEndian>()?;
        let d = self.read_f32::<LittleEndian>()?;
        Ok(match order {
            QuatOrder::Wxyz => Quat::from_xyzw(b, c, d, a),
            QuatOrder::Xyzw => Quat::from_xyzw(a, b, c, d),
        })
    }

    /// Read 16 floats in column-major order.
    fn read_mat4(&mut self) -> Result<Mat4> {
        let mut cols = [0f32; 16];
        self.read_f32_into::<LittleEndian>(&mut cols)?;
        Ok(Mat4::from_cols_array(&cols))
    }

    fn read_color3(&mut self) -> Result<Color3> {
        let r = self.read_f32::<LittleEndian>()?;
        let g = self.read_f32::<LittleEndian>()?;
        let b = self.read_f32::<LittleEndian>()?;
        Ok(Color3 { r, g, b })
    }

    fn read_color4(&mut self) -> Result<Color4> {
        let r = self.read_f32::<LittleEndian>()?;
        let g = self.read_f32::<LittleEndian>()?;
        let b = self.read_f32::<LittleEndian>()?;
        let a = self.read_f32::<LittleEndian>()?;
        Ok(Color4 { r, g, b, a })
    }
}

impl<R: Read + ?Sized> RoseReadExt for R {}

/// Writing helpers mirroring [`RoseReadExt`].
pub trait RoseWriteExt: Write {
    fn write_null_terminated_string(&mut self, text: &str, encoding: TextEncoding) -> Result<()> {
        let bytes = encoding.encode(text)?;
        self.write_all(&bytes)?;
        self.write_u8(0)?;
        Ok(())
    }

    /// Write `text` into a field of exactly `length` bytes padded with `pad`.
    ///
    /// Text longer than the field is rejected rather than truncated.
    fn write_fixed_string(
        &mut self,
        text: &str,
        length: usize,
        encoding: TextEncoding,
        pad: u8,
    ) -> Result<()> {
        let mut bytes = encoding.encode(text)?;
        if bytes.len() > length {
            return Err(Error::StringTooLong {
                length: bytes.len(),
                max: length,
            });
        }
        bytes.resize(length, pad);
        self.write_all(&bytes)?;
        Ok(())
    }

    fn write_u8_prefixed_string(&mut self, text: &str, encoding: TextEncoding) -> Result<()> {
        let bytes = encoding.encode(text)?;
        let length = u8::try_from(bytes.len()).map_err(|_| Error::StringTooLong {
            length: bytes.len(),
            max: u8::MAX as usize,
        })?;
        self.write_u8(length)?;
        self.write_all(&bytes)?;
        Ok(())
    }

    fn write_u16_prefixed_string(&mut self, text: &str, encoding: TextEncoding) -> Result<()> {
        let bytes = encoding.encode(text)?;
        let length = u16::try_from(bytes.len()).map_err(|_| Error::StringTooLong {
            length: bytes.len(),
            max: u16::MAX as usize,
        })?;
        self.write_u16::<LittleEndian>(length)?;
        self.write_all(&bytes)?;
        Ok(())
    }

    fn write_u32_prefixed_string(&mut self, text: &str, encoding: TextEncoding) -> Result<()> {
        let bytes = encoding.encode(text)?;
        let length = u32::try_from(bytes.len()).map_err(|_| Error::StringTooLong {
            length: bytes.len(),
            max: u32::MAX as usize,
        })?;
        self.write_u32::<LittleEndian>(length)?;
        self.write_all(&bytes)?;
        Ok(())
    }

    fn write_varint_prefixed_string(&mut self, text: &str, encoding: TextEncoding) -> Result<()> {
        let bytes = encoding.encode(text)?;
        let mut length = bytes.len();
        loop {
            let mut byte = (length & 0x7F) as u8;
            length >>= 7;
            if length != 0 {
                byte |= 0x80;
            }
            self.write_u8(byte)?;
            if length == 0 {
                break;
            }
        }
        self.write_all(&bytes)?;
        Ok(())
    }

    fn write_vec2(&mut self, value: Vec2) -> Result<()> {
        for component in value.to_array() {
            self.write_f32::<LittleEndian>(component)?;
        }
        Ok(())
    }

    fn write_vec3(&mut self, value: Vec3) -> Result<()> {
        for component in value.to_array() {
            self.write_f32::<LittleEndian>(component)?;
        }
        Ok(())
    }

    fn write_vec4(&mut self, value: Vec4) -> Result<()> {
        for component in value.to_array() {
            self.write_f32::<LittleEndian>(component)?;
        }
        Ok(())
    }

    fn write_ivec2(&mut self, value: IVec2) -> Result<()> {
        self.write_i32::<LittleEndian>(value.x)?;
        self.write_i32::<LittleEndian>(value.y)?;
        Ok(())
    }

    fn write_quat(&mut self, value: Quat, order: QuatOrder) -> Result<()> {
        let components = match order {
            QuatOrder::Wxyz => [value.w, value.x, value.y, value.z],
            QuatOrder::Xyzw => [value.x, value.y, value.z, value.w],
        };
        for component in components {
            self.write_f32::<LittleEndian>(component)?;
        }
        Ok(())
    }

    fn write_mat4(&mut self, value: &Mat4) -> Result<()> {
        for component in value.to_cols_array() {
            self.write_f32::<LittleEndian>(component)?;
        }
        Ok(())
    }

    fn write_color3(&mut self, value: Color3) -> Result<()> {
        for component in [value.r, value.g, value.b] {
            self.write_f32::<LittleEndian>(component)?;
        }
        Ok(())
    }

    fn write_color4(&mut self, value: Color4) -> Result<()> {
        for component in [value.r, value.g, value.b, value.a] {
            self.write_f32::<LittleEndian>(component)?;
        }
        Ok(())
    }
}

impl<W: Write + ?Sized> RoseWriteExt for W {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_null_terminated_string() {
        let mut cursor = Cursor::new(b"ZMS0008\0rest".to_vec());
        let text = cursor
            .read_null_terminated_string(TextEncoding::EucKr)
            .unwrap();
        assert_eq!(text, "ZMS0008");
        assert_eq!(cursor.position(), 8);
    }

    #[test]
    fn test_fixed_string_padding_and_overflow() {
        let mut out = Vec::new();
        out.write_fixed_string("AB", 4, TextEncoding::EucKr, b' ')
            .unwrap();
        assert_eq!(out, b"AB  ");

        let err = out
            .write_fixed_string("ABCDE", 4, TextEncoding::EucKr, 0)
            .unwrap_err();
        assert!(matches!(err, Error::StringTooLong { length: 5, max: 4 }));
        assert_eq!(out.len(), 4);

        let mut cursor = Cursor::new(b"AB\0\0".to_vec());
        assert_eq!(
            cursor.read_fixed_string(4, TextEncoding::EucKr).unwrap(),
            "AB"
        );
    }

    #[test]
    fn test_varint_prefix_long_string() {
        let text = "x".repeat(300);
        let mut out = Vec::new();
        out.write_varint_prefixed_string(&text, TextEncoding::Utf8)
            .unwrap();
        assert_eq!(&out[..2], &[0xAC, 0x02]);
        assert_eq!(out.len(), 302);

        let mut cursor = Cursor::new(out);
        assert_eq!(
            cursor
                .read_varint_prefixed_string(TextEncoding::Utf8)
                .unwrap(),
            text
        );
    }

    #[test]
    fn test_u8_prefix_overflow() {
        let text = "y".repeat(256);
        let err = Vec::<u8>::new()
            .write_u8_prefixed_string(&text, TextEncoding::EucKr)
            .unwrap_err();
        assert!(matches!(err, Error::StringTooLong { max: 255, .. }));
    }

    #[test]
    fn test_quat_orders() {
        let q = Quat::from_xyzw(0.1, 0.2, 0.3, 0.9);

        let mut wxyz = Vec::new();
        wxyz.write_quat(q, QuatOrder::Wxyz).unwrap();
        assert_eq!(&wxyz[..4], &0.9f32.to_le_bytes());

        let mut xyzw = Vec::new();
        xyzw.write_quat(q, QuatOrder::Xyzw).unwrap();
        assert_eq!(&xyzw[..4], &0.1f32.to_le_bytes());

        assert_eq!(
            Cursor::new(wxyz).read_quat(QuatOrder::Wxyz).unwrap(),
            Cursor::new(xyzw).read_quat(QuatOrder::Xyzw).unwrap()
        );
    }

    #[test]
    fn test_mat4_column_major() {
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let mut out = Vec::new();
        out.write_mat4(&m).unwrap();
        assert_eq!(out.len(), 64);
        // Translation lives in the fourth column: floats 12..15.
        assert_eq!(&out[48..52], &1.0f32.to_le_bytes());
        assert_eq!(Cursor::new(out).read_mat4().unwrap(), m);
    }
}
