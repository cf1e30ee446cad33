//! File I/O for layer files
//!
//! Layer files mix text commands with raw binary payload lines, so lines
//! are read as bytes and never validated as UTF-8 at this level.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use sparktimer_core::LayerFileError;

/// Buffer size for reading large files (256 KB)
const READ_BUFFER_SIZE: usize = 256 * 1024;

/// Layer file reader with streaming support
#[derive(Debug, Clone)]
pub struct LayerFileReader {
    path: PathBuf,
    file_size: u64,
}

impl LayerFileReader {
    /// Create a new layer file reader
    ///
    /// # Errors
    /// Returns error if the file does not exist or is not a regular file
    pub fn new(path: impl AsRef<Path>) -> Result<Self, LayerFileError> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            return Err(LayerFileError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        if !path.is_file() {
            return Err(LayerFileError::NotAFile {
                path: path.display().to_string(),
            });
        }

        let metadata = fs::metadata(&path)?;
        let file_size = metadata.len();

        Ok(Self { path, file_size })
    }

    /// Get file size in bytes
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Get file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a buffered reader positioned at the start of the file
    pub fn open(&self) -> Result<BufReader<File>, LayerFileError> {
        let file = File::open(&self.path)?;
        Ok(BufReader::with_capacity(READ_BUFFER_SIZE, file))
    }

    /// Count lines in the file, used as the progress denominator
    ///
    /// A trailing fragment without a newline counts as a line.
    pub fn count_lines(&self) -> Result<usize, LayerFileError> {
        let mut reader = self.open()?;
        Ok(count_lines_in(&mut reader)?)
    }
}

/// Count lines in a byte stream the same way [`read_line_bytes`] yields them
pub fn count_lines_in<R: Read>(reader: &mut R) -> io::Result<usize> {
    let mut chunk = vec![0u8; READ_BUFFER_SIZE];
    let mut lines = 0usize;
    let mut last = None;

    loop {
        let n = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        lines += chunk[..n].iter().filter(|&&b| b == b'\n').count();
        last = Some(chunk[n - 1]);
    }

    if matches!(last, Some(b) if b != b'\n') {
        lines += 1;
    }

    Ok(lines)
}

/// Read the next line into `buf`, without its `\n` or `\r\n` terminator
///
/// Returns `Ok(false)` at end of stream. `buf` is cleared first.
pub fn read_line_bytes<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<bool> {
    buf.clear();
    if reader.read_until(b'\n', buf)? == 0 {
        return Ok(false);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }

    Ok(true)
}
