use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use futures::future::{self, BoxFuture};

/// Result of fetching a shader source by locator, HTTP-style status included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceResponse {
    pub status: u16,
    pub body: String,
}

impl SourceResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self { status: 200, body: body.into() }
    }

    pub fn failed(status: u16) -> Self {
        Self { status, body: String::new() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Fetches plain-text shader sources
pub trait SourceLoader {
    fn load<'a>(&'a self, locator: &'a str) -> BoxFuture<'a, SourceResponse>;
}

/// Loads `file://` URIs and plain paths below a root directory
///
/// Locators that would escape the root get 403, missing files 404 and any
/// other I/O failure 500.
#[derive(Debug, Clone)]
pub struct FileLoader {
    root: PathBuf,
}

impl FileLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root at the current working directory
    pub fn current_dir() -> Self {
        Self::new(std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a locator onto a path inside the root, or None if it escapes
    fn resolve(&self, locator: &str) -> Option<PathBuf> {
        let relative = locator.strip_prefix("file://").unwrap_or(locator);
        let relative = relative.trim_start_matches('/');

        let mut path = self.root.clone();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        Some(path)
    }

    fn read(&self, locator: &str) -> SourceResponse {
        let Some(path) = self.resolve(locator) else {
            return SourceResponse::failed(403);
        };

        match std::fs::read_to_string(&path) {
            Ok(body) => SourceResponse::ok(body),
            Err(e) => match e.kind() {
                ErrorKind::NotFound => SourceResponse::failed(404),
                ErrorKind::PermissionDenied => SourceResponse::failed(403),
                _ => SourceResponse::failed(500),
            },
        }
    }
}

impl Default for FileLoader {
    fn default() -> Self {
        Self::current_dir()
    }
}

impl SourceLoader for FileLoader {
    fn load<'a>(&'a self, locator: &'a str) -> BoxFuture<'a, SourceResponse> {
        Box::pin(future::ready(self.read(locator)))
    }
}
