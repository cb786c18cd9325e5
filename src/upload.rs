//! The POST side of the server: scanning the multipart header block and
//! streaming the payload to disk.
//!
//! This is deliberately not a multipart parser. The body is read line by
//! line with an exact count of the bytes consumed, the filename is taken
//! from the `Content-Disposition` line, and everything after the blank
//! separator line is treated as payload: `Content-Length` minus the header
//! bytes. The trailing boundary delimiter the client appends after the file
//! content is part of that remainder, so those framing bytes end up at the
//! end of the written file. The byte accounting stays independent of the
//! declared boundary string.

use std::{
    collections::HashSet,
    convert::Infallible,
    fs::File,
    io::{self, BufRead, Read, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use headers::HeaderMapExt;
use http::{header::CONTENT_TYPE, Method, Request, Response, StatusCode};
use serde::Serialize;
use tracing::{info, warn};

use crate::{body::Body, config::Config, error::UploadError, page, App};

/// Upper bound on the bytes moved per read/write while persisting a payload.
pub const CHUNK_CAP: usize = 64 * 1024;

const DISPOSITION: &str = "Content-Disposition";
const FILENAME_ATTR: &str = "filename=\"";

/// Filename and payload length recovered from the multipart header block.
#[derive(Debug, PartialEq, Eq)]
pub struct UploadPart {
    pub filename: String,
    /// Body bytes left on the stream once the header block is consumed.
    pub remaining: u64,
}

/// Scans multipart header lines off `reader` until the blank separator line,
/// counting every byte consumed against `declared_length`.
///
/// The blank line's own bytes are included in the count. Fails with
/// [`UploadError::NoFilenameFound`] when the stream ends or the separator is
/// reached without a `Content-Disposition` line naming a file, and with
/// [`UploadError::MalformedHeader`] when the disposition line carries no
/// `filename="..."` attribute or the header block exceeds the declared
/// length.
pub fn scan_part_headers(
    reader: &mut impl BufRead,
    declared_length: u64,
) -> Result<UploadPart, UploadError> {
    let mut consumed: u64 = 0;
    let mut filename = None;
    let mut line = Vec::with_capacity(128);

    loop {
        line.clear();
        let read = reader.read_until(b'\n', &mut line)?;
        if read == 0 {
            // The body ended before the header block did.
            return Err(UploadError::NoFilenameFound);
        }
        consumed += read as u64;

        if line == b"\r\n" || line == b"\n" {
            break;
        }
        if line.starts_with(DISPOSITION.as_bytes()) {
            filename = Some(parse_filename(&line)?);
        }
    }

    let filename = filename.ok_or(UploadError::NoFilenameFound)?;
    let remaining = declared_length
        .checked_sub(consumed)
        .ok_or(UploadError::MalformedHeader)?;

    Ok(UploadPart {
        filename,
        remaining,
    })
}

// Takes the value up to the first closing quote. A filename containing a
// literal `"` is truncated there rather than read greedily to the last
// quote on the line.
fn parse_filename(line: &[u8]) -> Result<String, UploadError> {
    let line = String::from_utf8_lossy(line);

    let start = line
        .find(FILENAME_ATTR)
        .ok_or(UploadError::MalformedHeader)?
        + FILENAME_ATTR.len();
    let end = line[start..].find('"').ok_or(UploadError::MalformedHeader)?;
    if end == 0 {
        return Err(UploadError::MalformedHeader);
    }

    Ok(line[start..start + end].to_string())
}

/// Streams exactly `remaining` bytes from `reader` into `out`, at most
/// [`CHUNK_CAP`] bytes per read, and returns the number of bytes written.
///
/// The stream ending early is an error: the bytes written so far stay where
/// they are (no rollback), and the caller reports the failure.
pub fn write_payload(
    reader: &mut impl Read,
    out: &mut impl Write,
    remaining: u64,
) -> Result<u64, UploadError> {
    let mut buf = vec![0_u8; CHUNK_CAP];
    let mut written: u64 = 0;

    while written < remaining {
        let chunk = (remaining - written).min(CHUNK_CAP as u64) as usize;
        let read = reader.read(&mut buf[..chunk])?;
        if read == 0 {
            return Err(UploadError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("stream ended after {written} of {remaining} payload bytes"),
            )));
        }
        out.write_all(&buf[..read])?;
        written += read as u64;
    }

    Ok(written)
}

/// The request handler: GET serves the upload page, POST persists one file.
#[derive(Clone)]
pub struct UploadApp {
    config: Config,
    /// Paths with an upload currently writing to them. Handlers run on pool
    /// workers, so two clients naming the same file must not interleave
    /// writes; the second one is rejected instead.
    in_flight: Arc<Mutex<HashSet<PathBuf>>>,
}

impl UploadApp {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    fn claim(&self, path: PathBuf) -> Result<TargetClaim, UploadError> {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if !in_flight.insert(path.clone()) {
            return Err(UploadError::ConcurrentUpload(path.display().to_string()));
        }

        Ok(TargetClaim {
            in_flight: Arc::clone(&self.in_flight),
            path,
        })
    }

    /// Resolves the client-supplied filename against the upload directory.
    ///
    /// Only the final path component is kept, so a name like
    /// `../../etc/passwd` cannot escape the configured directory.
    fn target_path(&self, filename: &str) -> Result<PathBuf, UploadError> {
        match Path::new(filename).file_name() {
            Some(name) => Ok(self.config.directory.join(name)),
            None => Err(UploadError::InvalidFilename(filename.to_string())),
        }
    }

    fn save_upload(&self, req: Request<Body>) -> Result<(String, u64), UploadError> {
        let declared_length = req
            .headers()
            .typed_get::<headers::ContentLength>()
            .ok_or(UploadError::MissingLength)?
            .0;

        let (mut stream, _) = req.into_body().into_stream();

        let part = scan_part_headers(&mut stream, declared_length)?;
        let path = self.target_path(&part.filename)?;
        let _claim = self.claim(path.clone())?;

        // Create-or-truncate: a file of the same name is silently replaced.
        let mut file = File::create(&path)?;
        let written = write_payload(&mut stream, &mut file, part.remaining)?;

        Ok((part.filename, written))
    }
}

/// Releases the claimed path once the upload finishes, successfully or not.
struct TargetClaim {
    in_flight: Arc<Mutex<HashSet<PathBuf>>>,
    path: PathBuf,
}

impl Drop for TargetClaim {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.path);
    }
}

impl App for UploadApp {
    type Error = Infallible;

    fn handle(&self, req: Request<Body>) -> Result<Response<Body>, Self::Error> {
        let res = match *req.method() {
            Method::GET => page::upload_page(),
            Method::POST => match self.save_upload(req) {
                Ok((filename, bytes)) => {
                    info!(filename = %filename, bytes, "upload complete");
                    Response::builder()
                        .status(StatusCode::OK)
                        .header(CONTENT_TYPE, "application/json")
                        .body(Body::empty())
                        .unwrap()
                }
                Err(err) => {
                    warn!(error = %err, "upload failed");
                    error_response(&err)
                }
            },
            _ => Response::builder()
                .status(StatusCode::NOT_IMPLEMENTED)
                .body(Body::empty())
                .unwrap(),
        };

        Ok(res)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

fn error_response(err: &UploadError) -> Response<Body> {
    let body = ErrorBody {
        message: format!("Error uploading file: {err}"),
    };

    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap_or_default()))
        .unwrap()
}
