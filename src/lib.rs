//! Share a file with the machine running this server: open the served page
//! in a browser, pick a file, and it is streamed straight to disk.
//!
//! The POST handler never buffers the whole payload. It scans the multipart
//! header lines to learn the filename and how many body bytes remain, then
//! copies the payload to the target file in 64 KiB chunks. See the [`upload`]
//! module for the byte accounting details, including the trailing multipart
//! framing bytes that deliberately end up in the written file.

pub mod body;
pub mod config;
pub mod error;
pub mod net;
mod page;
mod request;
mod response;
pub mod server;
pub mod upload;

use std::{
    error::Error,
    io::{self, BufReader, BufWriter, Write},
    net::TcpStream,
};

pub use body::Body;
pub use config::Config;
pub use error::UploadError;
use http::header::{HeaderValue, CONNECTION};
pub use http::{header, Method, Request, Response, StatusCode, Uri, Version};
use request::ParseError;
pub use server::Server;
pub use upload::UploadApp;

type IncomingRequest = Request<Body>;

/// Maps [`Request`]s to [`Response`]s.
///
/// [`UploadApp`](upload::UploadApp) is the implementation the binary runs;
/// the `Fn` blanket implementation keeps tests and one-off servers short.
pub trait App {
    type Error: Into<Box<dyn Error + Send + Sync>>;

    fn handle(&self, request: IncomingRequest) -> Result<Response<Body>, Self::Error>;
}

impl<F, Err> App for F
where
    F: Fn(IncomingRequest) -> Result<Response<Body>, Err>,
    F: Sync + Send,
    F: Clone,
    Err: Into<Box<dyn Error + Send + Sync>>,
{
    type Error = Err;

    fn handle(&self, request: IncomingRequest) -> Result<Response<Body>, Self::Error> {
        self(request)
    }
}

/// Serves a single request on `stream` and closes the connection. The
/// handler owns the body stream exclusively until the response is written
/// back.
pub(crate) fn serve<A: App>(stream: TcpStream, app: &A) -> io::Result<()> {
    let reader = BufReader::new(stream.try_clone()?);
    let mut writer = BufWriter::new(stream);

    match request::parse_request(reader) {
        Ok(req) => {
            let version = req.version();

            let mut res = app
                .handle(req)
                .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;

            *res.version_mut() = version;
            res.headers_mut()
                .insert(CONNECTION, HeaderValue::from_static("close"));

            response::write_response(res, &mut writer)?;
            writer.flush()
        }
        Err(ParseError::ConnectionClosed) => Ok(()),
        Err(err) => Err(io::Error::new(io::ErrorKind::Other, err)),
    }
}
