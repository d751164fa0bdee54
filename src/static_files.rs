//! Static file serving.
//!
//! [`StaticFiles`] is a [`Handler`] mapping the request path onto a directory.
//! It is normally mounted through
//! [`Registrar::serve_static`](crate::router::Registrar::serve_static).

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::context::Context;
use crate::handler::Handler;

/// Serves files below `base_dir`.
///
/// `strip_slashes` leading path segments are removed from the request path
/// before it is mapped onto the directory:
///
/// | strip | `/foo/bar` maps to |
/// |---|---|
/// | 0 | `base_dir/foo/bar` |
/// | 1 | `base_dir/bar` |
/// | 2 | `base_dir` |
///
/// A path naming a directory serves its `index.html`. Paths escaping the
/// directory (`..`, absolute components) and missing files answer 404.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    base_dir: PathBuf,
    strip_slashes: usize,
}

impl StaticFiles {
    pub fn new<P: Into<PathBuf>>(base: P, strip_slashes: usize) -> Self {
        Self {
            base_dir: base.into(),
            strip_slashes,
        }
    }

    /// Directory files are served from.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn map_path(&self, url_path: &str) -> Option<PathBuf> {
        let mut pb = self.base_dir.clone();
        for comp in Path::new(url_path.trim_start_matches('/')).components() {
            match comp {
                Component::Normal(s) => pb.push(s),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(pb)
    }

    fn content_type(path: &Path) -> &'static str {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase()
            .as_str()
        {
            "html" | "htm" => "text/html; charset=utf-8",
            "css" => "text/css; charset=utf-8",
            "js" | "mjs" => "application/javascript",
            "json" => "application/json",
            "txt" => "text/plain; charset=utf-8",
            "xml" => "application/xml",
            "svg" => "image/svg+xml",
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "ico" => "image/x-icon",
            "wasm" => "application/wasm",
            _ => "application/octet-stream",
        }
    }

    /// Read the file a request path maps to.
    ///
    /// `url_path` is the full request path; the strip level is applied here.
    ///
    /// # Errors
    ///
    /// `NotFound` for escaping paths and missing files, any other I/O error
    /// as returned by the filesystem.
    pub fn load(&self, url_path: &str) -> io::Result<(Vec<u8>, &'static str)> {
        let stripped = strip_leading_segments(url_path, self.strip_slashes);
        let mut path = self
            .map_path(stripped)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "invalid path"))?;
        if path.is_dir() {
            path.push("index.html");
        }
        if !path.is_file() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        }
        let bytes = fs::read(&path)?;
        Ok((bytes, Self::content_type(&path)))
    }
}

impl Handler for StaticFiles {
    fn handle(&self, ctx: &mut Context) -> anyhow::Result<()> {
        match self.load(ctx.path()) {
            Ok((bytes, content_type)) => {
                ctx.data(200, content_type, &bytes);
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %ctx.path(), base_dir = %self.base_dir.display(), "Static file not found");
                ctx.not_found();
                Ok(())
            }
            Err(err) => Err(anyhow::Error::new(err)
                .context(format!("failed to read static file for {}", ctx.path()))),
        }
    }
}

/// Drop `levels` leading `/segment`s: `/foo/bar` → `/bar` → `""`.
fn strip_leading_segments(mut path: &str, levels: usize) -> &str {
    for _ in 0..levels {
        match path.get(1..).and_then(|rest| rest.find('/')) {
            Some(n) => path = &path[n + 1..],
            None => return "",
        }
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_leading_segments() {
        assert_eq!(strip_leading_segments("/foo/bar", 0), "/foo/bar");
        assert_eq!(strip_leading_segments("/foo/bar", 1), "/bar");
        assert_eq!(strip_leading_segments("/foo/bar", 2), "");
        assert_eq!(strip_leading_segments("/foo/bar", 5), "");
    }

    #[test]
    fn test_map_path_prevents_traversal() {
        let sf = StaticFiles::new("public", 0);
        assert!(sf.map_path("../Cargo.toml").is_none());
        assert!(sf.map_path("/css/../../secret").is_none());
        assert_eq!(
            sf.map_path("/css/./app.css"),
            Some(PathBuf::from("public/css/app.css"))
        );
    }

    #[test]
    fn test_content_type() {
        assert_eq!(
            StaticFiles::content_type(Path::new("a/INDEX.HTML")),
            "text/html; charset=utf-8"
        );
        assert_eq!(StaticFiles::content_type(Path::new("app.js")), "application/javascript");
        assert_eq!(
            StaticFiles::content_type(Path::new("blob")),
            "application/octet-stream"
        );
    }
}
