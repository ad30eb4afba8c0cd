//! In-memory archive entries

use std::io::{self, Cursor, Seek, SeekFrom, Write};
use std::time::SystemTime;

/// Buffered content committed to an archive under a single name
///
/// The buffer is seekable; its size is the length of the underlying data
/// regardless of the current position.
#[derive(Debug)]
pub struct ArchiveEntry {
    name: String,
    binary: bool,
    created: SystemTime,
    buffer: Cursor<Vec<u8>>,
}

impl ArchiveEntry {
    /// Creates an empty entry stamped with the current time.
    pub fn new(name: impl Into<String>, binary: bool) -> Self {
        Self {
            name: name.into(),
            binary,
            created: SystemTime::now(),
            buffer: Cursor::new(Vec::new()),
        }
    }

    /// Name of the entry inside the archive.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the entry holds binary rather than text content.
    pub fn is_binary(&self) -> bool {
        self.binary
    }

    /// Creation time, used as modification time inside the archive.
    pub fn created(&self) -> SystemTime {
        self.created
    }

    /// Appends data at the current position.
    pub fn write(&mut self, data: impl AsRef<[u8]>) -> io::Result<()> {
        self.buffer.write_all(data.as_ref())
    }

    /// Appends data followed by a newline.
    pub fn write_line(&mut self, data: impl AsRef<[u8]>) -> io::Result<()> {
        self.buffer.write_all(data.as_ref())?;
        self.buffer.write_all(b"\n")
    }

    /// Current size of the content in bytes.
    pub fn size(&self) -> u64 {
        self.buffer.get_ref().len() as u64
    }

    /// Content of the entry.
    pub fn contents(&self) -> &[u8] {
        self.buffer.get_ref()
    }
}

impl Write for ArchiveEntry {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for ArchiveEntry {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.buffer.seek(pos)
    }
}
