//! Thin wrappers around the system `git` command used to fetch catalog
//! repositories into the on-disk cache.
//!
//! Using the system binary means SSH keys, credential helpers and personal
//! access tokens configured for the user all apply to catalog fetches.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::debug;

use crate::error::{Error, Result};

/// Fetch a single revision of a repository with depth 1 into `target_dir`.
///
/// Unlike `git clone --branch`, fetching by revision works for commit SHAs as
/// well as branches and tags.
pub fn fetch_shallow(url: &str, revision: &str, target_dir: &Path) -> Result<()> {
    if target_dir.exists() {
        fs::remove_dir_all(target_dir)?;
    }
    fs::create_dir_all(target_dir)?;

    debug!("fetching {}@{} into {}", url, revision, target_dir.display());
    let result = run_git(url, target_dir, &["init", "--quiet"])
        .and_then(|_| run_git(url, target_dir, &["fetch", "--quiet", "--depth=1", url, revision]))
        .and_then(|_| run_git(url, target_dir, &["checkout", "--quiet", "FETCH_HEAD"]));

    if result.is_err() {
        // A half-populated directory would be mistaken for a cache hit.
        let _ = fs::remove_dir_all(target_dir);
    }
    result
}

fn run_git(url: &str, dir: &Path, args: &[&str]) -> Result<()> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| Error::GitCommand {
            command: args.join(" "),
            url: url.to_string(),
            stderr: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = if stderr.contains("Authentication failed")
            || stderr.contains("Permission denied")
            || stderr.contains("could not read Username")
        {
            format!(
                "Authentication failed. For private catalogs make sure an SSH key, \
                credential helper or personal access token is configured.\nError: {}",
                stderr
            )
        } else {
            stderr.to_string()
        };
        return Err(Error::GitCommand {
            command: args.join(" "),
            url: url.to_string(),
            stderr,
        });
    }
    Ok(())
}

/// Read a file from a fetched repository. Returns `None` if it does not exist.
pub fn read_file(repo_dir: &Path, path: &str) -> Result<Option<Vec<u8>>> {
    let full = repo_dir.join(path.trim_start_matches('/'));
    if !full.is_file() {
        return Ok(None);
    }
    Ok(Some(fs::read(full)?))
}

/// Convert URL and revision to a cache directory.
pub fn url_to_cache_path(cache_root: &Path, url: &str, revision: &str) -> PathBuf {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    // Hash the URL for a filesystem-safe directory name
    let mut hasher = DefaultHasher::new();
    url.hash(&mut hasher);
    let url_hash = format!("{:x}", hasher.finish());

    let safe_revision = revision.replace('/', "-");

    cache_root.join(format!("{}-{}", url_hash, safe_revision))
}
