//! Building the archive container.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use byteorder::{BigEndian, WriteBytesExt};
use tracing::debug;

use crate::footer::Footer;
use crate::table::FileTable;
use crate::{Error, MAGIC, Result};

/// Streams size-prefixed resource blobs to `out`, then emits the sorted
/// file table and the trailer on [`finish`](Self::finish).
///
/// Only the name/offset records are buffered; resource contents pass
/// straight through to the output. The produced container is standalone
/// and stays valid when concatenated onto an arbitrary host file, since
/// readers locate it purely backward from end-of-file.
pub struct ArchiveWriter<W: Write> {
    out: W,
    /// `(name, offset)` records in input order; sorted at finish.
    entries: Vec<(Vec<u8>, u32)>,
    /// Running byte length of the data region.
    ar_size: u32,
}

impl<W: Write> ArchiveWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            entries: Vec::new(),
            ar_size: 0,
        }
    }

    /// Appends one resource, copying exactly `size` bytes from `source`.
    ///
    /// A source that runs dry before `size` bytes aborts the build with
    /// [`Error::SourceTruncated`]; the output is corrupt at that point
    /// and must be discarded.
    pub fn append<R: Read>(&mut self, name: &str, size: u32, source: &mut R) -> Result<()> {
        if name.len() > usize::from(u16::MAX) {
            return Err(Error::LimitExceeded("resource name longer than 65535 bytes"));
        }
        let blob_len = 4 + u64::from(size);
        if u64::from(self.ar_size) + blob_len > u64::from(u32::MAX) {
            return Err(Error::LimitExceeded("data region larger than 4 GiB"));
        }

        self.out.write_u32::<BigEndian>(size)?;
        let copied = io::copy(&mut source.take(u64::from(size)), &mut self.out)?;
        if copied != u64::from(size) {
            return Err(Error::SourceTruncated(name.to_owned()));
        }

        debug!("packed {name}: {size} bytes at offset {}", self.ar_size);

        self.entries.push((name.as_bytes().to_vec(), self.ar_size));
        self.ar_size += blob_len as u32;
        Ok(())
    }

    /// Appends a file from disk, using its path string as the resource
    /// name.
    pub fn append_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        let len = file.metadata()?.len();
        let size = u32::try_from(len)
            .map_err(|_| Error::LimitExceeded("resource larger than 4 GiB"))?;
        self.append(&path.to_string_lossy(), size, &mut file)
    }

    /// Number of resources appended so far.
    pub fn resource_count(&self) -> usize {
        self.entries.len()
    }

    /// Current byte length of the data region.
    pub fn data_size(&self) -> u32 {
        self.ar_size
    }

    /// Sorts the recorded entries, writes the file table and the
    /// trailer, and returns the underlying writer, flushed.
    pub fn finish(mut self) -> Result<W> {
        self.entries.sort_unstable();
        for pair in self.entries.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(Error::DuplicateName(
                    String::from_utf8_lossy(&pair[0].0).into_owned(),
                ));
            }
        }

        let count = u16::try_from(self.entries.len())
            .map_err(|_| Error::LimitExceeded("more than 65535 resources"))?;
        let table_len: u64 = 2
            + self
                .entries
                .iter()
                .map(|(name, _)| 2 + name.len() as u64 + 4)
                .sum::<u64>()
            + 2;
        let file_list_size = u32::try_from(table_len)
            .map_err(|_| Error::LimitExceeded("file table larger than 4 GiB"))?;

        self.out.write_u16::<BigEndian>(count)?;
        for (name, offset) in &self.entries {
            self.out.write_u16::<BigEndian>(name.len() as u16)?;
            self.out.write_all(name)?;
            self.out.write_u32::<BigEndian>(*offset)?;
        }
        self.out.write_u16::<BigEndian>(FileTable::TERMINATOR)?;

        self.out.write_u32::<BigEndian>(self.ar_size)?;
        self.out.write_u32::<BigEndian>(file_list_size)?;
        self.out.write_u16::<BigEndian>(Footer::VERSION)?;
        self.out.write_u16::<BigEndian>(Footer::ENDIAN_MARKER)?;
        self.out.write_all(&MAGIC)?;
        self.out.flush()?;

        debug!(
            "archive finished: {} resources, {} data bytes, {} table bytes",
            count, self.ar_size, file_list_size
        );

        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn emits_exact_container_layout() {
        let mut w = ArchiveWriter::new(Vec::new());
        w.append("b.txt", 3, &mut &b"xyz"[..]).unwrap();
        w.append("a.txt", 0, &mut &b""[..]).unwrap();
        let bytes = w.finish().unwrap();

        #[rustfmt::skip]
        let expected: Vec<u8> = vec![
            // data region: "b.txt" blob then "a.txt" blob, input order
            0x00, 0x00, 0x00, 0x03, b'x', b'y', b'z',
            0x00, 0x00, 0x00, 0x00,
            // file table, sorted by name
            0x00, 0x02,
            0x00, 0x05, b'a', b'.', b't', b'x', b't', 0x00, 0x00, 0x00, 0x07,
            0x00, 0x05, b'b', b'.', b't', b'x', b't', 0x00, 0x00, 0x00, 0x00,
            0xFF, 0xFF,
            // trailer
            0x00, 0x00, 0x00, 0x0B, // ar_size
            0x00, 0x00, 0x00, 0x1A, // file_list_size
            0x00, 0x00,             // version
            0x00, 0x01,             // byte-order marker
            b'E', b'X', b'E', b'A', b'R', b'C', b'H', b'I', b'V', b'E',
        ];
        assert_eq!(bytes, expected);
    }

    #[test]
    fn empty_archive_is_valid() {
        let bytes = ArchiveWriter::new(Vec::new()).finish().unwrap();

        #[rustfmt::skip]
        let expected: Vec<u8> = vec![
            0x00, 0x00,             // zero entries
            0xFF, 0xFF,
            0x00, 0x00, 0x00, 0x00, // ar_size
            0x00, 0x00, 0x00, 0x04, // file_list_size
            0x00, 0x00,
            0x00, 0x01,
            b'E', b'X', b'E', b'A', b'R', b'C', b'H', b'I', b'V', b'E',
        ];
        assert_eq!(bytes, expected);
    }

    #[test]
    fn offsets_accumulate_size_prefixes() {
        let mut w = ArchiveWriter::new(Vec::new());
        w.append("one", 3, &mut &b"111"[..]).unwrap();
        w.append("two", 5, &mut &b"22222"[..]).unwrap();
        w.append("three", 1, &mut &b"3"[..]).unwrap();
        assert_eq!(w.data_size(), (4 + 3) + (4 + 5) + (4 + 1));
        assert_eq!(w.resource_count(), 3);
        w.finish().unwrap();
    }

    #[test]
    fn rejects_short_source() {
        let mut w = ArchiveWriter::new(Vec::new());
        let err = w.append("short", 10, &mut &b"abc"[..]).unwrap_err();
        assert!(matches!(err, Error::SourceTruncated(_)));
    }

    #[test]
    fn rejects_duplicate_names() {
        let mut w = ArchiveWriter::new(Vec::new());
        w.append("same", 1, &mut &b"a"[..]).unwrap();
        w.append("same", 1, &mut &b"b"[..]).unwrap();
        let err = w.finish().unwrap_err();
        assert!(matches!(err, Error::DuplicateName(_)));
    }

    #[test]
    fn long_source_is_cut_at_recorded_size() {
        let mut w = ArchiveWriter::new(Vec::new());
        w.append("cut", 3, &mut &b"abcdef"[..]).unwrap();
        assert_eq!(w.data_size(), 7);
    }
}
