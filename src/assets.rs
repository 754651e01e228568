//! Static bundle served on the relay port, with single-page-app fallback.

use std::path::Path;

use tower_http::services::{ServeDir, ServeFile};

const ENTRY_DOCUMENT: &str = "index.html";

/// Files under `root`; any path that names no file gets the entry document.
pub fn service(root: &Path) -> ServeDir<ServeFile> {
    ServeDir::new(root).fallback(ServeFile::new(root.join(ENTRY_DOCUMENT)))
}
