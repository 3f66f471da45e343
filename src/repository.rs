//! # Catalog Content Resolution
//!
//! The engine reads catalog content through the [`ContentResolver`] trait so
//! the transport can be swapped out. Two implementations ship with the crate:
//!
//! - **`GitContentResolver`**: shallow-fetches the catalog repository at the
//!   requested revision into an on-disk cache with the system `git` binary and
//!   reads the file from the checkout. Repeated fetches of the same
//!   repository and revision reuse the cached checkout.
//!
//! - **`MemoryContentResolver`**: serves content from an in-memory map. Used
//!   by tests and for offline runs against a known set of catalog files.

use std::cell::Cell;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::reference::VERSION_STREAM;

/// Host assumed for catalog files registered without one.
pub const DEFAULT_HOST: &str = "github.com";

/// Fetches raw catalog file content.
pub trait ContentResolver {
    /// Return the bytes of `path` in `host/owner/repo` at `revision`, or
    /// [`Error::NotFound`] if no such file exists.
    fn fetch(
        &self,
        host: &str,
        owner: &str,
        repo: &str,
        path: &str,
        revision: &str,
    ) -> Result<Vec<u8>>;
}

/// Resolves content from git repositories cached on disk. The clone URL is
/// built from the host each reference names.
pub struct GitContentResolver {
    cache_root: PathBuf,
    version_stream_revision: String,
}

impl GitContentResolver {
    /// `version_stream_revision` is the pinned revision substituted for the
    /// `versionStream` sentinel.
    pub fn new(cache_root: PathBuf, version_stream_revision: &str) -> Self {
        Self {
            cache_root,
            version_stream_revision: version_stream_revision.to_string(),
        }
    }

    fn resolve_revision<'a>(&'a self, revision: &'a str) -> &'a str {
        if revision == VERSION_STREAM {
            &self.version_stream_revision
        } else {
            revision
        }
    }
}

impl ContentResolver for GitContentResolver {
    fn fetch(
        &self,
        host: &str,
        owner: &str,
        repo: &str,
        path: &str,
        revision: &str,
    ) -> Result<Vec<u8>> {
        let url = format!("https://{}/{}/{}.git", host, owner, repo);
        let revision = self.resolve_revision(revision);
        let checkout = crate::git::url_to_cache_path(&self.cache_root, &url, revision);
        if !checkout.is_dir() {
            crate::git::fetch_shallow(&url, revision, &checkout)?;
        }
        crate::git::read_file(&checkout, path)?.ok_or_else(|| Error::NotFound {
            host: host.to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            path: path.to_string(),
            revision: revision.to_string(),
        })
    }
}

type ContentKey = (String, String, String, String, String);

/// Serves catalog content from memory.
#[derive(Debug, Default)]
pub struct MemoryContentResolver {
    files: HashMap<ContentKey, Vec<u8>>,
    fetches: Cell<usize>,
}

impl MemoryContentResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file on [`DEFAULT_HOST`], builder style.
    pub fn with_file(
        mut self,
        owner: &str,
        repo: &str,
        path: &str,
        revision: &str,
        content: &str,
    ) -> Self {
        self.insert(owner, repo, path, revision, content);
        self
    }

    pub fn insert(&mut self, owner: &str, repo: &str, path: &str, revision: &str, content: &str) {
        self.insert_on_host(DEFAULT_HOST, owner, repo, path, revision, content);
    }

    pub fn insert_on_host(
        &mut self,
        host: &str,
        owner: &str,
        repo: &str,
        path: &str,
        revision: &str,
        content: &str,
    ) {
        self.files.insert(
            (
                host.to_string(),
                owner.to_string(),
                repo.to_string(),
                path.to_string(),
                revision.to_string(),
            ),
            content.as_bytes().to_vec(),
        );
    }

    /// Number of fetch calls served so far, including misses.
    pub fn fetch_count(&self) -> usize {
        self.fetches.get()
    }
}

impl ContentResolver for MemoryContentResolver {
    fn fetch(
        &self,
        host: &str,
        owner: &str,
        repo: &str,
        path: &str,
        revision: &str,
    ) -> Result<Vec<u8>> {
        self.fetches.set(self.fetches.get() + 1);
        let key = (
            host.to_string(),
            owner.to_string(),
            repo.to_string(),
            path.to_string(),
            revision.to_string(),
        );
        self.files.get(&key).cloned().ok_or_else(|| Error::NotFound {
            host: host.to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            path: path.to_string(),
            revision: revision.to_string(),
        })
    }
}

impl<T: ContentResolver + ?Sized> ContentResolver for std::rc::Rc<T> {
    fn fetch(
        &self,
        host: &str,
        owner: &str,
        repo: &str,
        path: &str,
        revision: &str,
    ) -> Result<Vec<u8>> {
        (**self).fetch(host, owner, repo, path, revision)
    }
}
