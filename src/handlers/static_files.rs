use std::path::Path;
use tower_http::services::{ServeDir, ServeFile};

/// Serves `<dir>/index.html` for the site root.
pub fn index_service(dir: &Path) -> ServeFile {
    ServeFile::new(dir.join("index.html"))
}

/// Serves any other path from `dir`; missing files answer `404 Not Found`.
pub fn static_service(dir: &Path) -> ServeDir {
    ServeDir::new(dir)
}
