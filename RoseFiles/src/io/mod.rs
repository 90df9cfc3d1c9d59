//! Shared binary I/O layer
//!
//! - [`AlignedReader`] / [`AlignedWriter`]: struct-packing aware primitives
//! - [`RoseReadExt`] / [`RoseWriteExt`]: strings, vectors, quaternions, colours
//! - [`TextEncoding`] / [`CodecOptions`]: explicit codepage configuration

mod aligned;
mod ext;
mod text;

pub use aligned::{AlignedReader, AlignedWriter, DEFAULT_ALIGNMENT};
pub use ext::{QuatOrder, RoseReadExt, RoseWriteExt};
pub use text::{CodecOptions, TextEncoding};

use std::io::{Seek, SeekFrom, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::Result;

/// Current stream position as a 32-bit file offset.
pub(crate) fn tell_u32<S: Seek>(stream: &mut S) -> Result<u32> {
    let position = stream.stream_position()?;
    u32::try_from(position).map_err(|_| crate::Error::CountOverflow {
        what: "bytes in file",
        count: position as usize,
    })
}

/// Overwrite a `u32` at `offset`, then return to where the stream was.
pub(crate) fn backpatch_u32<W: Write + Seek>(writer: &mut W, offset: u64, value: u32) -> Result<()> {
    let resume = writer.stream_position()?;
    writer.seek(SeekFrom::Start(offset))?;
    writer.write_u32::<LittleEndian>(value)?;
    writer.seek(SeekFrom::Start(resume))?;
    Ok(())
}

/// Convert a collection length for a count field of type `T`.
pub(crate) fn count<T: TryFrom<usize>>(what: &'static str, len: usize) -> Result<T> {
    T::try_from(len).map_err(|_| crate::Error::CountOverflow { what, count: len })
}

/// Interpret a stored `i32` width, height or count as a length.
pub(crate) fn dimension(what: &'static str, value: i32) -> Result<usize> {
    usize::try_from(value).map_err(|_| crate::Error::InvalidDimension { what, value })
}
