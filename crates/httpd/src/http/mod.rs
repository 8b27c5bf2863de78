pub mod header;
pub mod method;
pub mod mime;
pub mod parser;
pub mod query;
pub mod request;
pub mod response;
pub mod uri;

mod version;
pub use version::{HttpVersion, ParseHttpVersionError};
