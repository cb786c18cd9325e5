use std::io::{self, BufRead, Cursor, Read};

/// A request or response body.
///
/// An incoming body with a declared length wraps the connection's buffered
/// reader directly, so a large upload can be consumed without ever holding
/// the whole payload in memory. Outgoing bodies (the upload page, the JSON
/// error document) are small and buffered.
#[derive(Default)]
pub struct Body(Option<BodyInner>);

#[derive(Default)]
enum BodyInner {
    #[default]
    Empty,
    Buffered(Vec<u8>),
    Stream(Box<dyn BufRead + Send>, u64),
}

impl Body {
    pub fn empty() -> Self {
        Body(Some(BodyInner::Empty))
    }

    /// Wraps a live stream carrying `length` body bytes.
    pub fn from_reader(reader: impl BufRead + Send + 'static, length: u64) -> Self {
        Body(Some(BodyInner::Stream(Box::new(reader), length)))
    }

    /// The number of body bytes, known up front for every variant.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> Option<u64> {
        match &self.0 {
            Some(BodyInner::Empty) => Some(0),
            Some(BodyInner::Buffered(bytes)) => Some(bytes.len() as u64),
            Some(BodyInner::Stream(_, length)) => Some(*length),
            None => None,
        }
    }

    /// Consumes the body, yielding the underlying stream and the number of
    /// bytes it still carries. Buffered variants are served from memory.
    pub fn into_stream(mut self) -> (Box<dyn BufRead + Send>, u64) {
        match self.0.take().unwrap() {
            BodyInner::Empty => (Box::new(Cursor::new(Vec::new())), 0),
            BodyInner::Buffered(bytes) => {
                let length = bytes.len() as u64;
                (Box::new(Cursor::new(bytes)), length)
            }
            BodyInner::Stream(reader, length) => (reader, length),
        }
    }

    pub fn into_bytes(mut self) -> io::Result<Vec<u8>> {
        match self.0.take().unwrap() {
            BodyInner::Empty => Ok(Vec::new()),
            BodyInner::Buffered(bytes) => Ok(bytes),
            BodyInner::Stream(stream, length) => {
                let mut buf = Vec::with_capacity(length as usize);
                stream.take(length).read_to_end(&mut buf)?;
                Ok(buf)
            }
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(body: Vec<u8>) -> Self {
        Body(Some(BodyInner::Buffered(body)))
    }
}

impl From<&[u8]> for Body {
    fn from(body: &[u8]) -> Self {
        body.to_vec().into()
    }
}

impl From<&str> for Body {
    fn from(body: &str) -> Self {
        body.as_bytes().to_vec().into()
    }
}

impl From<String> for Body {
    fn from(body: String) -> Self {
        body.into_bytes().into()
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use super::Body;

    #[test]
    fn buffered_body_roundtrips() {
        let body = Body::from(vec![1_u8, 2, 3, 4, 5]);
        assert_eq!(body.len(), Some(5));
        assert_eq!(body.into_bytes().unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn stream_body_reads_only_declared_length() {
        let reader = Cursor::new(vec![1_u8, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
        let body = Body::from_reader(reader, 10);

        assert_eq!(body.len(), Some(10));
        assert_eq!(body.into_bytes().unwrap(), (1..=10).collect::<Vec<u8>>());
    }

    #[test]
    fn into_stream_keeps_position_and_length() {
        let reader = Cursor::new(b"hello world".to_vec());
        let body = Body::from_reader(reader, 11);

        let (mut stream, length) = body.into_stream();
        assert_eq!(length, 11);

        let mut buf = [0_u8; 5];
        stream.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");
    }

    #[test]
    fn empty_body_yields_empty_stream() {
        let (mut stream, length) = Body::empty().into_stream();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).unwrap();

        assert_eq!(length, 0);
        assert!(buf.is_empty());
    }
}
