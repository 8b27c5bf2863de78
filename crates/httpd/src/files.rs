//! Static file responses, streamed from flash in word-aligned chunks.

use httpd_hal::{Connection, Filesystem, FsError};
use log::{debug, warn};

use crate::{
    conn::{Begun, Progress, log_net},
    http::{mime, parser::suffix_of, response},
};

pub(crate) struct FileJob<F: Filesystem> {
    file: F::File,
    size: u64,
    sent: u64,
    buf: Vec<u8>,
}

/// First index name under `dir` that opens with a non-zero size.
pub(crate) fn resolve_index<F: Filesystem>(
    fs: &mut F,
    dir: &str,
    names: &[String],
) -> Option<String> {
    let dir = dir.trim_end_matches('/');
    names.iter().find_map(|name| {
        let path = format!("{}/{}", dir, name);
        let file = fs.open(&path).ok()?;
        let size = fs.stat(&file).unwrap_or(0);
        fs.close(file);
        (size > 0).then_some(path)
    })
}

pub(crate) async fn begin<F: Filesystem, C: Connection>(
    fs: &mut F,
    clnt: &mut C,
    path: &str,
    chunk: usize,
) -> Begun<FileJob<F>> {
    let file = match fs.open(path) {
        Ok(file) => file,
        Err(FsError::NoHandles) => {
            warn!("no file handle left for {}", path);
            return Begun::Abort;
        }
        Err(err) => {
            debug!("cannot open {}: {}", path, err);
            return Begun::NotFound;
        }
    };
    let size = match fs.stat(&file) {
        Ok(size) => size,
        Err(err) => {
            debug!("cannot stat {}: {}", path, err);
            fs.close(file);
            return Begun::NotFound;
        }
    };

    let job = FileJob {
        file,
        size,
        sent: 0,
        buf: vec![0; chunk],
    };
    let head = response::content_head(mime::content_type(suffix_of(path).as_deref()), Some(size));
    match clnt.write(&head).await {
        Ok(()) => Begun::Streaming(job),
        Err(err) => {
            log_net(clnt.peer_addr(), err);
            Begun::Done(Some(job))
        }
    }
}

impl<F: Filesystem> FileJob<F> {
    pub(crate) async fn pas<C: Connection>(&mut self, fs: &mut F, clnt: &mut C) -> Progress {
        if self.sent >= self.size {
            return Progress::Done;
        }
        let n = match fs.read(&mut self.file, &mut self.buf) {
            Ok(0) => return Progress::Done,
            Ok(n) => n,
            Err(err) => {
                warn!("flash read failed after {} bytes: {}", self.sent, err);
                return Progress::Done;
            }
        };
        if let Err(err) = clnt.write(&self.buf[..n]).await {
            log_net(clnt.peer_addr(), err);
            return Progress::Done;
        }
        self.sent += n as u64;

        if self.sent < self.size {
            Progress::More
        } else {
            Progress::Done
        }
    }

    pub(crate) fn end(self, fs: &mut F) {
        fs.close(self.file);
    }
}
