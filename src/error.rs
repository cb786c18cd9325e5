use std::io;

use thiserror::Error;

/// Everything that can go wrong while handling a single upload.
///
/// All variants are caught at the handler boundary and turned into a 500
/// response carrying the error's description, so a failed upload never
/// affects other requests or the process itself.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("missing or invalid Content-Length header")]
    MissingLength,
    #[error("malformed multipart header")]
    MalformedHeader,
    #[error("no filename found in multipart headers")]
    NoFilenameFound,
    #[error("unusable filename: {0:?}")]
    InvalidFilename(String),
    #[error("another upload to {0:?} is already in progress")]
    ConcurrentUpload(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
