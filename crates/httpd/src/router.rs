//! Picks the handler for a parsed request.

use httpd_hal::Filesystem;
use log::debug;

use crate::{
    config::Config,
    files,
    http::{mime, parser::suffix_of, request::Request, uri::content_path},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Route {
    File(String),
    Script(String),
    NotFound,
}

/// Maps the request onto the content root. Directories resolve to their
/// first usable index file, and the suffix of the final path decides
/// between the script bridge and the file server.
pub(crate) fn route<F: Filesystem>(request: &Request, fs: &mut F, config: &Config) -> Route {
    let Some(mut path) = content_path(&config.content_root, &request.uri) else {
        debug!("rejecting {}", request.uri);
        return Route::NotFound;
    };
    if path.ends_with('/') || fs.is_directory(&path) {
        match files::resolve_index(fs, &path, &config.index_files) {
            Some(index) => path = index,
            None => return Route::NotFound,
        }
    }

    if suffix_of(&path).as_deref().is_some_and(mime::is_script) {
        Route::Script(path)
    } else {
        Route::File(path)
    }
}
