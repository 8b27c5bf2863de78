use std::{
    fs::{self, File},
    io::{self, Read, Seek, SeekFrom},
    path::{Component, Path, PathBuf},
};

use httpd_hal::{Filesystem, FsError};

/// A host directory mounted as the flash filesystem: `/html/index.htm` is
/// `<root>/html/index.htm`.
#[derive(Debug, Clone)]
pub struct DirFs {
    root: PathBuf,
}

#[derive(Debug)]
pub struct DirFile {
    file: File,
}

impl DirFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn host_path(&self, path: &str) -> Result<PathBuf, FsError> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(FsError::NotFound);
        }
        Ok(self.root.join(relative))
    }
}

fn map_io(err: io::Error) -> FsError {
    match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => FsError::NotFound,
        io::ErrorKind::IsADirectory => FsError::IsDirectory,
        io::ErrorKind::OutOfMemory => FsError::NoHandles,
        _ => FsError::Io,
    }
}

impl Filesystem for DirFs {
    type File = DirFile;

    fn open(&mut self, path: &str) -> Result<Self::File, FsError> {
        let host = self.host_path(path)?;
        if host.is_dir() {
            return Err(FsError::IsDirectory);
        }
        let file = File::open(host).map_err(map_io)?;
        Ok(DirFile { file })
    }

    fn read(&mut self, file: &mut Self::File, buf: &mut [u8]) -> Result<usize, FsError> {
        file.file.read(buf).map_err(map_io)
    }

    fn seek(&mut self, file: &mut Self::File, pos: u64) -> Result<u64, FsError> {
        file.file.seek(SeekFrom::Start(pos)).map_err(map_io)
    }

    fn stat(&mut self, file: &Self::File) -> Result<u64, FsError> {
        Ok(file.file.metadata().map_err(map_io)?.len())
    }

    fn close(&mut self, file: Self::File) {
        drop(file);
    }

    fn is_directory(&mut self, path: &str) -> bool {
        self.host_path(path)
            .ok()
            .and_then(|host| fs::metadata(host).ok())
            .is_some_and(|meta| meta.is_dir())
    }
}
