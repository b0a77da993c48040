//! Error kinds (spec §7). `CoreError` covers every precondition failure
//! surfaced as `-1` from the command API; `StorageError` covers the
//! persistent map's I/O faults, which are fatal and terminate the process.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The seven error kinds of spec §7, collapsed to the five that actually
/// need distinct payloads. Every variant maps to the wire-level `-1`
/// reply; the message is for logs, not for the protocol.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("not logged in, bad credentials, or insufficient privilege")]
    Auth,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0} already exists")]
    Duplicate(&'static str),
    #[error("invalid state: {0}")]
    State(&'static str),
    #[error("value out of range: {0}")]
    Range(&'static str),
    #[error("bad arguments: {0}")]
    Arg(&'static str),
}

pub type CoreResult<T> = Result<T, CoreError>;

/// I/O-level faults on a [`crate::pmap::PMap`]. Per spec §7 these are
/// fatal: `System::open` propagates one to `main`, and a mid-session
/// flush failure is logged and the process aborts.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to open persistent map at {path}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("failed to read persistent map at {path}: {source}")]
    Decode {
        path: PathBuf,
        source: bincode::Error,
    },
    #[error("failed to flush persistent map at {path}: {source}")]
    Flush { path: PathBuf, source: io::Error },
    #[error("failed to encode record for {path}: {source}")]
    Encode {
        path: PathBuf,
        source: bincode::Error,
    },
}
