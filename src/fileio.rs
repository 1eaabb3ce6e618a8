use crate::error::{HarnessError, Result};
use std::fs::File;
use std::io::{self, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

/// Open an existing file for reading, naming its role on failure
pub fn open_file(role: &'static str, path: &Path) -> Result<File> {
    let file = File::open(path).map_err(|source| HarnessError::FileOpen {
        role,
        path: path.to_path_buf(),
        source,
    })?;
    debug!(role, path = %path.display(), "opened for reading");
    Ok(file)
}

/// Create (or truncate) a file for writing, naming its role on failure
pub fn create_file(role: &'static str, path: &Path) -> Result<File> {
    let file = File::create(path).map_err(|source| HarnessError::FileOpen {
        role,
        path: path.to_path_buf(),
        source,
    })?;
    debug!(role, path = %path.display(), "opened for writing");
    Ok(file)
}

/// Total length of a seekable stream; leaves the cursor at the start
pub fn stream_len<S: Seek>(stream: &mut S) -> io::Result<u64> {
    let len = stream.seek(SeekFrom::End(0))?;
    stream.seek(SeekFrom::Start(0))?;
    Ok(len)
}

/// Read until `buf` is full or the reader is exhausted.
/// Returns the number of bytes placed at the front of `buf`.
pub fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
