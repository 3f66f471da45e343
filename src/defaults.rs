//! Default values shared across commands.

use std::path::PathBuf;

/// Returns the default cache root for fetched catalog repositories.
///
/// Uses the platform-appropriate cache directory:
/// - Linux: `~/.cache/pipeline-reuse` (XDG Base Directory)
/// - macOS: `~/Library/Caches/pipeline-reuse`
/// - Windows: `{FOLDERID_LocalAppData}\pipeline-reuse`
///
/// Falls back to `.pipeline-reuse-cache` in the current directory if the
/// platform cache directory cannot be determined.
///
/// This can be overridden by the `--cache-root` CLI flag or the
/// `PIPELINE_REUSE_CACHE` environment variable.
pub fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".pipeline-reuse-cache"))
        .join("pipeline-reuse")
}

/// Directory walked when `--dir` is not given.
pub fn default_dir() -> PathBuf {
    PathBuf::from(".")
}
