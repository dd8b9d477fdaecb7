//! Internal utility functions

use byteorder::{BigEndian, ReadBytesExt};
use std::io::Read;

/// Big-endian integer reads with the archive codec's failure behavior:
/// a read that runs off the end of the stream, or hits an I/O error,
/// yields `0` instead of failing. Fields where a stray `0` is impossible
/// (magic, byte-order marker, table terminator) are rejected at their
/// validation points.
pub(crate) trait ReadBe {
    /// Read a big-endian `u16`, or `0` on a failed read.
    fn read_u16_be(&mut self) -> u16;

    /// Read a big-endian `u32`, or `0` on a failed read.
    fn read_u32_be(&mut self) -> u32;
}

impl<R: Read> ReadBe for R {
    fn read_u16_be(&mut self) -> u16 {
        self.read_u16::<BigEndian>().unwrap_or(0)
    }

    fn read_u32_be(&mut self) -> u32 {
        self.read_u32::<BigEndian>().unwrap_or(0)
    }
}
