use std::{fs, io, net::IpAddr, path::PathBuf};

/// Process-wide settings, resolved once at startup and read-only afterwards.
///
/// The upload directory is threaded into the handler by value instead of
/// living in a global, so handlers stay trivially testable.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    /// Every uploaded file is written under this directory.
    pub directory: PathBuf,
}

impl Config {
    /// Makes sure the upload directory exists before the listener starts.
    pub fn ensure_directory(&self) -> io::Result<()> {
        fs::create_dir_all(&self.directory)
    }
}
