//! Error types for archive operations

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("archive trailer magic not found - file carries no archive")]
    MissingMagic,

    #[error("unsupported byte-order marker: {0:#06x}")]
    UnsupportedByteOrder(u16),

    #[error("unsupported archive version: {0}")]
    UnsupportedVersion(u16),

    #[error("malformed file table: {0}")]
    MalformedFileTable(&'static str),

    #[error("archive regions extend past the start of the file")]
    Truncated,

    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    #[error("another resource is already open on this archive")]
    ResourceAlreadyOpen,

    #[error("source {0} delivered fewer bytes than its recorded size")]
    SourceTruncated(String),

    #[error("duplicate resource name: {0}")]
    DuplicateName(String),

    #[error("format limit exceeded: {0}")]
    LimitExceeded(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
