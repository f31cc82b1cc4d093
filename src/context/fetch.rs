// src/context/fetch.rs
//
// Source-content fetching is a collaborator concern; the builder only
// sees this trait. The filesystem fetcher is the local stand-in for a
// revision-pinned remote fetch.

use std::fs;
use std::path::PathBuf;

/// Returns a file's full content, or `None` when it is unavailable.
pub trait FileFetcher {
    fn fetch(&self, path: &str) -> Option<String>;
}

/// Adapts a closure into a [`FileFetcher`].
pub struct FnFetcher<F>(F);

impl<F> FnFetcher<F>
where
    F: Fn(&str) -> Option<String>,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> FileFetcher for FnFetcher<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn fetch(&self, path: &str) -> Option<String> {
        (self.0)(path)
    }
}

/// Reads `root/<path>` from disk.
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileFetcher for FsFetcher {
    fn fetch(&self, path: &str) -> Option<String> {
        fs::read_to_string(self.root.join(path)).ok()
    }
}
