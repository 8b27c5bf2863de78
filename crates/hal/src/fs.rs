//! Flash filesystem facade (SPIFFS-like: flat paths, read-only access here).

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FsError {
    #[error("no such file")]
    NotFound,
    #[error("is a directory")]
    IsDirectory,
    #[error("out of file descriptors")]
    NoHandles,
    #[error("flash i/o error")]
    Io,
}

pub trait Filesystem {
    type File;

    /// Opens `path` read-only.
    fn open(&mut self, path: &str) -> Result<Self::File, FsError>;

    /// Reads up to `buf.len()` bytes; `Ok(0)` at end of file.
    fn read(&mut self, file: &mut Self::File, buf: &mut [u8]) -> Result<usize, FsError>;

    /// Moves the read position to `pos` bytes from the start.
    fn seek(&mut self, file: &mut Self::File, pos: u64) -> Result<u64, FsError>;

    /// Size in bytes.
    fn stat(&mut self, file: &Self::File) -> Result<u64, FsError>;

    fn close(&mut self, file: Self::File);

    fn is_directory(&mut self, path: &str) -> bool;
}
