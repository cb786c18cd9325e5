use std::io::{self, BufRead};

use headers::HeaderMapExt;
use http::{Method, Request, Version};
use thiserror::Error;

use crate::body::Body;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("connection closed")]
    ConnectionClosed,
    #[error("io error")]
    Io(#[from] io::Error),
    #[error("invalid request")]
    Invalid(#[from] httparse::Error),
    #[error("incomplete request")]
    IncompleteRequest,
    #[error("unsupported http version: {0}")]
    UnsupportedHttpVersion(u8),
    #[error("unsupported Transfer-Encoding")]
    UnsupportedTransferEncoding,
    #[error("invalid header")]
    InvalidHeader(#[from] headers::Error),
    #[error("failed to parse http request")]
    Unknown,
}

/// Reads the request head off the stream and wraps the remaining stream as
/// the body, sized by the `Content-Length` header.
///
/// The body is never buffered here: the upload handler does its own byte
/// accounting against the declared length, so it needs the live stream
/// positioned exactly at the first body byte.
pub(crate) fn parse_request(
    mut stream: impl BufRead + Send + 'static,
) -> Result<Request<Body>, ParseError> {
    let mut buf = Vec::with_capacity(800);

    loop {
        if stream.read_until(b'\n', &mut buf)? == 0 {
            break;
        }

        match buf.as_slice() {
            [.., b'\r', b'\n', b'\r', b'\n'] => break,
            [.., b'\n', b'\n'] => break,
            _ => continue,
        }
    }

    if buf.is_empty() {
        return Err(ParseError::ConnectionClosed);
    }

    let mut headers = [httparse::EMPTY_HEADER; 64];
    let mut req = httparse::Request::new(&mut headers);
    req.parse(&buf)?;

    let method = req
        .method
        .map(|method| method.as_bytes())
        .ok_or(ParseError::IncompleteRequest)?;

    let path = req.path.ok_or(ParseError::IncompleteRequest)?;

    let version = match req.version.ok_or(ParseError::IncompleteRequest)? {
        0 => Version::HTTP_10,
        1 => Version::HTTP_11,
        version => return Err(ParseError::UnsupportedHttpVersion(version)),
    };

    let request = Request::builder()
        .method(Method::from_bytes(method).map_err(|_| ParseError::IncompleteRequest)?)
        .uri(path)
        .version(version);

    let request = headers
        .into_iter()
        .take_while(|header| *header != httparse::EMPTY_HEADER)
        .map(|header| (header.name, header.value))
        .fold(request, |req, (name, value)| req.header(name, value));

    let headers = request.headers_ref().ok_or(ParseError::Unknown)?;

    let body = if headers.typed_try_get::<headers::TransferEncoding>()?.is_some() {
        // The upload accounting needs a declared total length up front.
        return Err(ParseError::UnsupportedTransferEncoding);
    } else if let Ok(Some(len)) = headers.typed_try_get::<headers::ContentLength>() {
        Body::from_reader(stream, len.0)
    } else {
        // Absent and unparseable Content-Length look the same from here: no
        // declared length. The upload handler answers that with its own 500
        // instead of the connection just dropping.
        Body::empty()
    };

    request.body(body).map_err(|_| ParseError::Unknown)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_request_without_body() {
        let req = "GET /lolwut HTTP/1.1\r\nHost: lol.com\r\n\r\n";
        let req = std::io::Cursor::new(req);

        let req = parse_request(req).unwrap();

        assert_eq!(Version::HTTP_11, req.version());
        assert_eq!("/lolwut", req.uri().path());
        assert_eq!(
            Some("lol.com"),
            req.headers()
                .get(http::header::HOST)
                .and_then(|v| v.to_str().ok())
        );
        assert_eq!(Some(0), req.body().len());
    }

    #[test]
    fn parse_request_with_content_length_body() {
        let req = "POST /lol HTTP/1.1\r\nHost: lol.com\r\nContent-Length: 6\r\n\r\nlolwut ignored";
        let req = std::io::Cursor::new(req);

        let req = parse_request(req).unwrap();

        assert_eq!(req.into_body().into_bytes().unwrap(), b"lolwut");
    }

    #[test]
    fn parse_request_with_streaming_body() {
        let req = b"POST /lol HTTP/1.1\r\nHost: lol.com\r\nContent-Length: 2048\r\n\r\n";
        let body = [65_u8; 2048];
        let req = std::io::Cursor::new([req.as_ref(), body.as_ref()].concat());

        let req = parse_request(req).unwrap();

        assert_eq!(Some(2048), req.body().len());
        assert_eq!(req.into_body().into_bytes().unwrap(), body);
    }

    #[test]
    fn unparseable_content_length_means_no_declared_length() {
        let req = "POST /lol HTTP/1.1\r\nHost: lol.com\r\nContent-Length: abc\r\n\r\n";
        let req = std::io::Cursor::new(req);

        let req = parse_request(req).unwrap();

        assert_eq!(Some(0), req.body().len());
    }

    #[test]
    fn rejects_chunked_bodies() {
        let req = "POST /lol HTTP/1.1\r\nHost: lol.com\r\nTransfer-Encoding: chunked\r\n\r\n3\r\nlol\r\n0\r\n\r\n";
        let req = std::io::Cursor::new(req);

        assert!(matches!(
            parse_request(req),
            Err(ParseError::UnsupportedTransferEncoding)
        ));
    }

    #[test]
    fn fails_to_parse_incomplete_request() {
        let req = std::io::Cursor::new("POST /lol");

        assert!(matches!(
            parse_request(req),
            Err(ParseError::IncompleteRequest)
        ));
    }

    #[test]
    fn reports_closed_connections() {
        let req = std::io::Cursor::new("");

        assert!(matches!(parse_request(req), Err(ParseError::ConnectionClosed)));
    }
}
