//! Opening an embedded archive and resolving resources inside it.

use std::cell::{Cell, RefCell};
use std::env;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use tracing::debug;

use crate::footer::Footer;
use crate::ioutils::ReadBe;
use crate::stream::ResourceReader;
use crate::table::{FileTable, ResourceEntry};
use crate::{Error, Result};

/// An archive embedded at the tail of a host file.
///
/// All resources are served through the one underlying handle the
/// archive owns, so at most one [`ResourceReader`] can be open at a
/// time; a second [`open_resource`](Self::open_resource) fails with
/// [`Error::ResourceAlreadyOpen`] until the first reader is dropped.
/// The handle uses interior mutability and is deliberately not `Sync`:
/// concurrent readers each open their own `Archive`.
#[derive(Debug)]
pub struct Archive<R: Read + Seek> {
    pub(crate) file: RefCell<R>,
    pub(crate) reader_open: Cell<bool>,
    version: u16,
    ar_size: u32,
    /// Absolute position of the first size-prefixed blob.
    data_start: u64,
    table: FileTable,
}

impl Archive<BufReader<File>> {
    /// Opens the archive embedded in the file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("opening archive: {}", path.display());
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Opens the archive embedded in the running executable itself.
    pub fn open_self() -> Result<Self> {
        Self::open(env::current_exe()?)
    }
}

impl<R: Read + Seek> Archive<R> {
    /// Parses the archive at the tail of `file`.
    ///
    /// `file` may hold arbitrary host bytes in front of the archive;
    /// only the region the trailer points at is ever interpreted.
    pub fn from_reader(mut file: R) -> Result<Self> {
        let file_len = file.seek(SeekFrom::End(0))?;
        let footer = Footer::parse(&mut file, file_len)?;

        // Footer::parse guarantees both regions fit in front of the tail.
        let table_start =
            file_len - Footer::TAIL_LEN as u64 - u64::from(footer.file_list_size);
        let data_start = table_start - u64::from(footer.ar_size);

        file.seek(SeekFrom::Start(table_start))?;
        let mut section = vec![0u8; footer.file_list_size as usize];
        file.read_exact(&mut section)?;
        let table = FileTable::parse(&section)?;

        debug!(
            "archive holds {} resources in {} data bytes",
            table.len(),
            footer.ar_size
        );

        Ok(Self {
            file: RefCell::new(file),
            reader_open: Cell::new(false),
            version: footer.version,
            ar_size: footer.ar_size,
            data_start,
            table,
        })
    }

    /// Format version recorded in the trailer.
    pub fn version(&self) -> u16 {
        self.version
    }

    /// Number of embedded resources.
    pub fn resource_count(&self) -> usize {
        self.table.len()
    }

    /// Whether the archive holds no resources.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Whether a resource with this exact name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.table.find_offset(name.as_bytes()).is_some()
    }

    /// Table entries in on-disk (name-sorted) order.
    pub fn entries(&self) -> impl Iterator<Item = &ResourceEntry> {
        self.table.entries()
    }

    /// Opens one resource as a bounded stream.
    ///
    /// Fails with [`Error::ResourceNotFound`] for absent names (leaving
    /// the reader slot untouched) and [`Error::ResourceAlreadyOpen`]
    /// while another [`ResourceReader`] from this archive is alive.
    pub fn open_resource(&self, name: &str) -> Result<ResourceReader<'_, R>> {
        if self.reader_open.get() {
            return Err(Error::ResourceAlreadyOpen);
        }
        let offset = self
            .table
            .find_offset(name.as_bytes())
            .ok_or_else(|| Error::ResourceNotFound(name.to_owned()))?;

        if u64::from(offset) + 4 > u64::from(self.ar_size) {
            return Err(Error::MalformedFileTable("resource offset outside data region"));
        }

        let data_size = {
            let mut file = self.file.borrow_mut();
            file.seek(SeekFrom::Start(self.data_start + u64::from(offset)))?;
            file.read_u32_be()
        };
        if u64::from(offset) + 4 + u64::from(data_size) > u64::from(self.ar_size) {
            return Err(Error::MalformedFileTable("resource blob overruns data region"));
        }

        debug!("opened resource {name}: {data_size} bytes");

        // The handle now sits right after the size prefix: logical 0.
        self.reader_open.set(true);
        Ok(ResourceReader::new(
            self,
            self.data_start + u64::from(offset) + 4,
            data_size,
        ))
    }
}
