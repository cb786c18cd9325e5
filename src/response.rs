use std::io::{self, Write};

use crate::body::Body;

pub(crate) fn write_response(res: http::Response<Body>, stream: &mut impl Write) -> io::Result<()> {
    let (parts, body) = res.into_parts();

    stream.write_all(format!("{:?} {}\r\n", parts.version, parts.status).as_bytes())?;

    for (name, val) in parts.headers.iter() {
        stream.write_all(format!("{name}: ").as_bytes())?;
        stream.write_all(val.as_bytes())?;
        stream.write_all(b"\r\n")?;
    }

    let body = body.into_bytes()?;

    if !body.is_empty() {
        stream.write_all(format!("content-length: {}\r\n", body.len()).as_bytes())?;
    }

    stream.write_all(b"\r\n")?;
    stream.write_all(&body)?;

    Ok(())
}
