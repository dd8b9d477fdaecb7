//! Bounded stream over one resource inside an open archive.

use std::io::{self, Read, Seek, SeekFrom};

use crate::archive::Archive;

/// Reader over a single resource's bytes.
///
/// Implements [`Read`] and [`Seek`] against the archive's shared file
/// handle, clamped to the resource's span: reads stop at the end of the
/// resource and never run into the next blob's size prefix or the file
/// table, and out-of-range seeks clamp into `[0, size]` instead of
/// erroring. Dropping the reader releases the archive's single reader
/// slot.
#[derive(Debug)]
pub struct ResourceReader<'a, R: Read + Seek> {
    archive: &'a Archive<R>,
    /// Absolute position of the resource's first content byte.
    content_start: u64,
    data_size: u32,
    /// Logical cursor, always in `[0, data_size]`.
    pos: u64,
}

impl<'a, R: Read + Seek> ResourceReader<'a, R> {
    pub(crate) fn new(archive: &'a Archive<R>, content_start: u64, data_size: u32) -> Self {
        Self {
            archive,
            content_start,
            data_size,
            pos: 0,
        }
    }

    /// Total size of the resource in bytes.
    pub fn size(&self) -> u32 {
        self.data_size
    }

    /// Current logical position within the resource.
    pub fn position(&self) -> u64 {
        self.pos
    }
}

impl<R: Read + Seek> Read for ResourceReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = u64::from(self.data_size) - self.pos;
        let want = buf.len().min(remaining as usize);
        if want == 0 {
            return Ok(0);
        }
        let n = self.archive.file.borrow_mut().read(&mut buf[..want])?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl<R: Read + Seek> Seek for ResourceReader<'_, R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let size = i64::from(self.data_size);
        let target = match pos {
            SeekFrom::Start(n) => i64::try_from(n).unwrap_or(i64::MAX),
            SeekFrom::Current(d) => (self.pos as i64).saturating_add(d),
            SeekFrom::End(d) => size.saturating_add(d),
        };
        // Out-of-range targets clamp to the resource bounds.
        let target = target.clamp(0, size) as u64;

        self.archive
            .file
            .borrow_mut()
            .seek(SeekFrom::Start(self.content_start + target))?;
        self.pos = target;
        Ok(target)
    }
}

impl<R: Read + Seek> Drop for ResourceReader<'_, R> {
    fn drop(&mut self) {
        self.archive.reader_open.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Archive;
    use crate::writer::ArchiveWriter;
    use std::io::Cursor;

    fn archive_with(entries: &[(&str, &[u8])]) -> Archive<Cursor<Vec<u8>>> {
        let mut w = ArchiveWriter::new(Vec::new());
        for (name, content) in entries {
            w.append(name, content.len() as u32, &mut &content[..]).unwrap();
        }
        Archive::from_reader(Cursor::new(w.finish().unwrap())).unwrap()
    }

    #[test]
    fn reads_whole_resource() {
        let ar = archive_with(&[("greeting", b"hello world")]);
        let mut stream = ar.open_resource("greeting").unwrap();
        assert_eq!(stream.size(), 11);

        let mut content = String::new();
        stream.read_to_string(&mut content).unwrap();
        assert_eq!(content, "hello world");
        assert_eq!(stream.position(), 11);
    }

    #[test]
    fn read_truncates_at_resource_end() {
        let ar = archive_with(&[("first", b"abc"), ("second", b"defghi")]);
        let mut stream = ar.open_resource("first").unwrap();

        let mut buf = [0u8; 64];
        let n = stream.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"abc");

        // At the boundary every further read reports end-of-stream.
        assert_eq!(stream.read(&mut buf).unwrap(), 0);
        assert_eq!(stream.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn empty_resource_reads_zero_bytes() {
        let ar = archive_with(&[("empty", b"")]);
        let mut stream = ar.open_resource("empty").unwrap();
        assert_eq!(stream.size(), 0);

        let mut buf = [0u8; 8];
        assert_eq!(stream.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn seek_clamps_to_resource_bounds() {
        let ar = archive_with(&[("data", b"hello world")]);
        let mut stream = ar.open_resource("data").unwrap();

        assert_eq!(stream.seek(SeekFrom::Start(100)).unwrap(), 11);
        assert_eq!(stream.seek(SeekFrom::Current(-100)).unwrap(), 0);
        assert_eq!(stream.seek(SeekFrom::End(5)).unwrap(), 11);
        assert_eq!(stream.seek(SeekFrom::End(-100)).unwrap(), 0);
        assert_eq!(stream.seek(SeekFrom::Current(-1)).unwrap(), 0);
    }

    #[test]
    fn seek_then_read_from_each_origin() {
        let ar = archive_with(&[("data", b"hello world")]);
        let mut stream = ar.open_resource("data").unwrap();

        stream.seek(SeekFrom::Start(6)).unwrap();
        let mut rest = String::new();
        stream.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "world");

        stream.seek(SeekFrom::End(-4)).unwrap();
        assert_eq!(stream.position(), 7);
        let mut tail = String::new();
        stream.read_to_string(&mut tail).unwrap();
        assert_eq!(tail, "orld");

        stream.seek(SeekFrom::Start(2)).unwrap();
        stream.seek(SeekFrom::Current(2)).unwrap();
        let mut buf = [0u8; 1];
        stream.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"o");
    }

    #[test]
    fn position_matches_clamped_seek_target() {
        let ar = archive_with(&[("data", b"0123456789")]);
        let mut stream = ar.open_resource("data").unwrap();

        for (from, expected) in [
            (SeekFrom::Start(4), 4),
            (SeekFrom::Current(3), 7),
            (SeekFrom::Current(900), 10),
            (SeekFrom::End(-10), 0),
            (SeekFrom::Start(u64::MAX), 10),
        ] {
            assert_eq!(stream.seek(from).unwrap(), expected);
            assert_eq!(stream.position(), expected);
            assert_eq!(stream.stream_position().unwrap(), expected);
        }
    }

    #[test]
    fn neighboring_resources_stay_isolated() {
        let ar = archive_with(&[("first", b"abc"), ("second", b"defghi")]);

        {
            let mut stream = ar.open_resource("first").unwrap();
            stream.seek(SeekFrom::End(0)).unwrap();
            let mut buf = [0u8; 16];
            assert_eq!(stream.read(&mut buf).unwrap(), 0);
        }

        let mut stream = ar.open_resource("second").unwrap();
        let mut content = Vec::new();
        stream.read_to_end(&mut content).unwrap();
        assert_eq!(content, b"defghi");
    }
}
