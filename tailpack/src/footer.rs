//! Archive trailer parsing.
//!
//! The trailer is the only fixed-position structure in the container:
//! the literal last bytes of the combined file. Everything else is
//! located relative to it, which is what lets the archive sit behind an
//! arbitrary host binary without an external index.

use std::io::{Read, Seek, SeekFrom};

use tracing::debug;

use crate::ioutils::ReadBe;
use crate::{Error, MAGIC, Result};

/// Fixed-size tail at the very end of an archive-bearing file:
/// `ar_size`, `file_list_size`, version, byte-order marker, magic.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Footer {
    /// Byte length of the data region (all size-prefixed blobs).
    pub(crate) ar_size: u32,
    /// Byte length of the file-table section.
    pub(crate) file_list_size: u32,
    pub(crate) version: u16,
}

impl Footer {
    pub(crate) const TAIL_LEN: usize = 4 + 4 + 2 + 2 + MAGIC.len();
    pub(crate) const ENDIAN_MARKER: u16 = 0x0001;
    pub(crate) const VERSION: u16 = 0;

    /// Parses the trailer of a file of length `file_len`.
    ///
    /// The whole tail is read into a buffer once and decoded forward,
    /// rather than walking backward field by field with relative seeks.
    pub(crate) fn parse<R: Read + Seek>(f: &mut R, file_len: u64) -> Result<Self> {
        if file_len < Self::TAIL_LEN as u64 {
            return Err(Error::MissingMagic);
        }
        f.seek(SeekFrom::Start(file_len - Self::TAIL_LEN as u64))?;
        let mut tail = [0u8; Self::TAIL_LEN];
        f.read_exact(&mut tail)?;

        if tail[12..] != MAGIC[..] {
            return Err(Error::MissingMagic);
        }

        let mut fields = &tail[..12];
        let ar_size = fields.read_u32_be();
        let file_list_size = fields.read_u32_be();
        let version = fields.read_u16_be();
        let byte_order = fields.read_u16_be();

        if byte_order != Self::ENDIAN_MARKER {
            return Err(Error::UnsupportedByteOrder(byte_order));
        }
        if version != Self::VERSION {
            return Err(Error::UnsupportedVersion(version));
        }

        // Both regions must fit in front of the tail.
        let regions = u64::from(ar_size) + u64::from(file_list_size) + Self::TAIL_LEN as u64;
        if regions > file_len {
            return Err(Error::Truncated);
        }

        debug!("trailer: {ar_size} data bytes, {file_list_size} table bytes");

        Ok(Self {
            ar_size,
            file_list_size,
            version,
        })
    }
}
