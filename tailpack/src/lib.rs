//! Tail-of-executable resource archives.
//!
//! Packs named files into a self-contained container that is appended to
//! the end of an arbitrary host file, typically the executable that will
//! read it back. The container is located purely by scanning backward
//! from end-of-file, so the host bytes in front are never inspected or
//! modified, and no external index file is needed.
//!
//! [`ArchiveWriter`] builds the container, [`Archive`] opens one (from a
//! path, from the running executable, or from any `Read + Seek` source),
//! and [`ResourceReader`] exposes a single resource as a bounded,
//! seekable stream.

pub mod archive;
pub mod error;
mod footer;
mod ioutils;
pub mod stream;
pub mod table;
pub mod writer;

pub use archive::Archive;
pub use error::{Error, Result};
pub use stream::ResourceReader;
pub use table::{FileTable, ResourceEntry};
pub use writer::ArchiveWriter;

/// Trailer magic, the literal last bytes of any archive-bearing file.
pub const MAGIC: [u8; 10] = *b"EXEARCHIVE";
