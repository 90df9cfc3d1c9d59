//! Tagged polymorphic records
//!
//! A closed set of record shapes is selected by an integer tag read from the
//! stream. Each family implements [`TaggedRecord`] with an explicit `match`
//! from tag to variant; unknown tags fail with [`Error::InvalidTag`].
//!
//! The AI envelope stores `u32 size` (covering size, tag and payload) and a
//! `u32` tag combined with a family mask. The payload is read with alignment
//! measured from the payload start and is padded to 4 bytes at the end.
//!
//! [`Error::InvalidTag`]: crate::Error::InvalidTag

use std::io::{Read, Seek, SeekFrom, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};
use crate::io::{AlignedReader, AlignedWriter, TextEncoding, backpatch_u32};

/// One record family selected by tag.
pub trait TaggedRecord: Sized {
    /// Family name used in errors and logs.
    const FAMILY: &'static str;

    /// The demasked tag of this record.
    fn tag(&self) -> u32;

    /// Read the payload of a record with the given tag.
    fn read_payload<R: Read + Seek>(
        tag: u32,
        reader: &mut AlignedReader<R>,
        encoding: TextEncoding,
    ) -> Result<Self>;

    fn write_payload<W: Write>(
        &self,
        writer: &mut AlignedWriter<W>,
        encoding: TextEncoding,
    ) -> Result<()>;

    fn invalid_tag(value: u32) -> Error {
        Error::InvalidTag {
            family: Self::FAMILY,
            value,
        }
    }
}

/// Move forward to `end` if a record stopped short of its declared size.
///
/// Never seeks backwards; an overrun is only logged.
pub fn skip_to<S: Seek>(stream: &mut S, end: u64, family: &'static str) -> Result<()> {
    let position = stream.stream_position()?;
    if position < end {
        tracing::warn!(
            "{} record ended {} bytes before its envelope, skipping",
            family,
            end - position
        );
        stream.seek(SeekFrom::Start(end))?;
    } else if position > end {
        tracing::warn!(
            "{} record overran its envelope by {} bytes",
            family,
            position - end
        );
    }
    Ok(())
}

/// Read one size-prefixed, mask-tagged record.
pub fn read_enveloped<T, R>(reader: &mut R, mask: u32, encoding: TextEncoding) -> Result<T>
where
    T: TaggedRecord,
    R: Read + Seek,
{
    let start = reader.stream_position()?;
    let size = reader.read_u32::<LittleEndian>()?;
    let tag = reader.read_u32::<LittleEndian>()? ^ mask;

    let record = {
        let mut payload = AlignedReader::new(&mut *reader);
        let record = T::read_payload(tag, &mut payload, encoding)?;
        payload.align()?;
        record
    };

    skip_to(reader, start + u64::from(size), T::FAMILY)?;
    Ok(record)
}

/// Write one record with a backpatched size and an OR-masked tag.
pub fn write_enveloped<T, W>(
    writer: &mut W,
    record: &T,
    mask: u32,
    encoding: TextEncoding,
) -> Result<()>
where
    T: TaggedRecord,
    W: Write + Seek,
{
    let start = writer.stream_position()?;
    writer.write_u32::<LittleEndian>(0)?;
    writer.write_u32::<LittleEndian>(record.tag() | mask)?;
    {
        let mut payload = AlignedWriter::new(&mut *writer);
        record.write_payload(&mut payload, encoding)?;
        payload.align()?;
    }
    let end = writer.stream_position()?;
    backpatch_u32(writer, start, (end - start) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[derive(Debug, PartialEq)]
    enum Probe {
        Byte(u8),
        Word { flag: u8, value: i32 },
    }

    impl TaggedRecord for Probe {
        const FAMILY: &'static str = "probe";

        fn tag(&self) -> u32 {
            match self {
                Probe::Byte(_) => 1,
                Probe::Word { .. } => 2,
            }
        }

        fn read_payload<R: Read + Seek>(
            tag: u32,
            reader: &mut AlignedReader<R>,
            _encoding: TextEncoding,
        ) -> Result<Self> {
            match tag {
                1 => Ok(Probe::Byte(reader.read_u8()?)),
                2 => Ok(Probe::Word {
                    flag: reader.read_u8()?,
                    value: reader.read_i32()?,
                }),
                other => Err(Self::invalid_tag(other)),
            }
        }

        fn write_payload<W: Write>(
            &self,
            writer: &mut AlignedWriter<W>,
            _encoding: TextEncoding,
        ) -> Result<()> {
            match self {
                Probe::Byte(value) => writer.write_u8(*value),
                Probe::Word { flag, value } => {
                    writer.write_u8(*flag)?;
                    writer.write_i32(*value)
                }
            }
        }
    }

    const MASK: u32 = 0x0400_0000;

    #[test]
    fn test_envelope_size_and_mask() {
        let mut cursor = Cursor::new(Vec::new());
        let record = Probe::Word { flag: 1, value: -3 };
        write_enveloped(&mut cursor, &record, MASK, TextEncoding::EucKr).unwrap();

        let bytes = cursor.get_ref().clone();
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[..4], &16u32.to_le_bytes());
        assert_eq!(&bytes[4..8], &0x0400_0002u32.to_le_bytes());

        cursor.set_position(0);
        let read: Probe = read_enveloped(&mut cursor, MASK, TextEncoding::EucKr).unwrap();
        assert_eq!(read, record);
        assert_eq!(cursor.position(), 16);
    }

    #[test]
    fn test_short_record_is_skipped_forward() {
        // Envelope declares 8 bytes of payload but the record reads only one.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&(1u32 | MASK).to_le_bytes());
        bytes.extend_from_slice(&[9, 0, 0, 0, 0xEE, 0xEE, 0xEE, 0xEE]);
        bytes.push(0x42);

        let mut cursor = Cursor::new(bytes);
        let read: Probe = read_enveloped(&mut cursor, MASK, TextEncoding::EucKr).unwrap();
        assert_eq!(read, Probe::Byte(9));
        assert_eq!(cursor.position(), 16);
    }

    #[test]
    fn test_unknown_tag_fails() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&12u32.to_le_bytes());
        bytes.extend_from_slice(&(5u32 | MASK).to_le_bytes());
        bytes.extend_from_slice(&[0, 0, 0, 0]);

        let err = read_enveloped::<Probe, _>(&mut Cursor::new(bytes), MASK, TextEncoding::EucKr)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTag {
                family: "probe",
                value: 5
            }
        ));
    }
}
