//! # Reuse References
//!
//! Parsing and rendering of the compact `uses:` step image notation and its
//! long-form resolver parameter representation.
//!
//! A reference looks like `uses:<path>@<revision>` where `<path>` is either
//! the GitHub shorthand `owner/repo/rest...` or a fully qualified
//! `https://host/owner/repo/rest...`. The first five `/` separated segments of
//! the expanded URL (scheme, empty, host, owner, repo) form the clone URL and
//! the remainder is the path inside the repository.
//!
//! ```
//! use pipeline_reuse::reference::GitRef;
//!
//! let r = GitRef::parse("uses:jenkins-x/jx3-pipeline-catalog/tasks/go/release.yaml@v1.2.3", None, None)
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(r.url, "https://github.com/jenkins-x/jx3-pipeline-catalog.git");
//! assert_eq!(r.path_in_repo, "tasks/go/release.yaml");
//! assert_eq!(r.revision, "v1.2.3");
//! ```

use std::path::Path;

use url::Url;

use crate::error::{Error, Result};
use crate::tekton::Param;

/// Prefix marking a step image as a reuse reference.
pub const USES_PREFIX: &str = "uses:";

/// Sentinel revision meaning "use the pinned default of the version stream".
pub const VERSION_STREAM: &str = "versionStream";

const GITHUB_URL: &str = "https://github.com/";
const RAW_GITHUB_HOST: &str = "raw.githubusercontent.com";

/// Returns true if the image is a `uses:` reuse reference.
pub fn is_uses(image: &str) -> bool {
    image.starts_with(USES_PREFIX)
}

/// The resolved form of a `uses:` string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct GitRef {
    /// Clone URL, always suffixed with `.git`.
    pub url: String,
    pub owner: String,
    pub repo: String,
    pub path_in_repo: String,
    pub revision: String,
}

impl GitRef {
    /// Parse a step image into a reference.
    ///
    /// Returns `Ok(None)` when the image is not a reuse reference at all; that
    /// is the normal case for materialized steps and callers must not treat
    /// it as an error. A `uses:` image that cannot be split into
    /// owner/repo/path/revision is an [`Error::Reference`].
    ///
    /// When `step_name` is given, the final path segment `dir/file.yaml` is
    /// replaced with `dir/file/<step_name>.yaml`, addressing a single step of
    /// a multi-step catalog document. A non-empty `revision` replaces the
    /// revision written in the image.
    pub fn parse(
        image: &str,
        step_name: Option<&str>,
        revision: Option<&str>,
    ) -> Result<Option<GitRef>> {
        let Some(rest) = image.trim().strip_prefix(USES_PREFIX) else {
            return Ok(None);
        };
        let invalid = |message: &str| Error::Reference {
            reference: image.to_string(),
            message: message.to_string(),
        };

        let (path, written_revision) = rest
            .rsplit_once('@')
            .ok_or_else(|| invalid("missing '@<revision>' suffix"))?;
        let revision = match revision.filter(|r| !r.is_empty()) {
            Some(r) => r.to_string(),
            None => written_revision.to_string(),
        };
        if revision.is_empty() {
            return Err(invalid("empty revision"));
        }

        let full = if path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", GITHUB_URL, path.trim_start_matches('/'))
        };

        let segments: Vec<&str> = full.split('/').collect();
        if segments.len() < 6 || segments[2..5].iter().any(|s| s.is_empty()) {
            return Err(invalid("expected <owner>/<repo>/<path>"));
        }
        let mut path_in_repo = segments[5..].join("/");
        if path_in_repo.trim_matches('/').is_empty() {
            return Err(invalid("missing path inside the repository"));
        }
        if let Some(step) = step_name.filter(|s| !s.is_empty()) {
            path_in_repo = step_path(&path_in_repo, step);
        }

        Ok(Some(GitRef {
            url: format!("{}.git", segments[..5].join("/")),
            owner: segments[3].to_string(),
            repo: segments[4].to_string(),
            path_in_repo,
            revision,
        }))
    }

    /// Reference to `path_in_repo` in the repository `host/owner/repo`.
    pub fn new(host: &str, owner: &str, repo: &str, path_in_repo: &str, revision: &str) -> Self {
        GitRef {
            url: format!("https://{}/{}/{}.git", host, owner, repo),
            owner: owner.to_string(),
            repo: repo.to_string(),
            path_in_repo: path_in_repo.to_string(),
            revision: revision.to_string(),
        }
    }

    /// Host part of the clone URL, e.g. `github.com`.
    pub fn host(&self) -> &str {
        self.url
            .strip_prefix("https://")
            .and_then(|s| s.split('/').next())
            .unwrap_or_default()
    }

    /// Render the reference back into `uses:` notation. GitHub references use
    /// the shorthand form.
    pub fn to_uses(&self) -> String {
        if self.host() == "github.com" {
            format!(
                "{}{}/{}/{}@{}",
                USES_PREFIX, self.owner, self.repo, self.path_in_repo, self.revision
            )
        } else {
            let base = self.url.strip_suffix(".git").unwrap_or(&self.url);
            format!(
                "{}{}/{}@{}",
                USES_PREFIX, base, self.path_in_repo, self.revision
            )
        }
    }

    /// Basename of `path_in_repo` without its `.yaml` suffix. Used to name
    /// generated sibling Task documents.
    pub fn parent_file_name(&self) -> String {
        file_stem(&self.path_in_repo)
    }

    /// The same reference with a single step addressed by name.
    pub fn for_step(&self, step_name: &str) -> GitRef {
        GitRef {
            path_in_repo: step_path(&self.path_in_repo, step_name),
            ..self.clone()
        }
    }
}

impl std::fmt::Display for GitRef {
    /// `owner/repo/path@revision` for GitHub, otherwise prefixed with the host.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.host() != "github.com" {
            write!(f, "{}/", self.host())?;
        }
        write!(
            f,
            "{}/{}/{}@{}",
            self.owner, self.repo, self.path_in_repo, self.revision
        )
    }
}

/// A reference together with the flag selecting which resolver parameter
/// form the pipeline engine should use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitResolverRef {
    pub git_ref: GitRef,
    /// Public repositories resolve anonymously by URL; private ones by
    /// org/repo against a configured provider.
    pub public: bool,
}

impl GitResolverRef {
    pub fn new(git_ref: GitRef, public: bool) -> Self {
        Self { git_ref, public }
    }

    /// Emit the resolver parameters for this reference.
    pub fn to_params(&self) -> Vec<Param> {
        let r = &self.git_ref;
        if self.public {
            vec![
                Param::string("url", &r.url),
                Param::string("revision", &r.revision),
                Param::string("pathInRepo", &r.path_in_repo),
            ]
        } else {
            vec![
                Param::string("org", &r.owner),
                Param::string("repo", &r.repo),
                Param::string("revision", &r.revision),
                Param::string("pathInRepo", &r.path_in_repo),
            ]
        }
    }
}

/// Convert a legacy raw content URL into a `uses:` image.
///
/// Only the `https://raw.githubusercontent.com/<owner>/<repo>/<sha>/<path>`
/// shape is recognized. The revision becomes [`VERSION_STREAM`] when the
/// owner and repository are the default catalog.
pub fn uses_from_raw_url(raw: &str, default_owner: &str, default_repo: &str) -> Result<String> {
    let url = Url::parse(raw.trim())?;
    let invalid = |message: &str| Error::Reference {
        reference: raw.to_string(),
        message: message.to_string(),
    };
    if url.host_str() != Some(RAW_GITHUB_HOST) {
        return Err(invalid("expected a raw.githubusercontent.com URL"));
    }
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).collect())
        .unwrap_or_default();
    if segments.len() < 4 {
        return Err(invalid("expected /<owner>/<repo>/<sha>/<path>"));
    }
    let (owner, repo, sha) = (segments[0], segments[1], segments[2]);
    let revision = if owner == default_owner && repo == default_repo {
        VERSION_STREAM
    } else {
        sha
    };
    Ok(format!(
        "{}{}/{}/{}@{}",
        USES_PREFIX,
        owner,
        repo,
        segments[3..].join("/"),
        revision
    ))
}

/// Strip a `:tag` and/or `@digest` suffix from a container image.
pub fn strip_image_tag(image: &str) -> &str {
    let image = image.split('@').next().unwrap_or(image);
    let name_start = image.rfind('/').map(|i| i + 1).unwrap_or(0);
    match image[name_start..].rfind(':') {
        Some(i) => &image[..name_start + i],
        None => image,
    }
}

fn file_stem(path: &str) -> String {
    let name = Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path);
    name.strip_suffix(".yaml")
        .or_else(|| name.strip_suffix(".yml"))
        .unwrap_or(name)
        .to_string()
}

fn step_path(path_in_repo: &str, step: &str) -> String {
    let stem = file_stem(path_in_repo);
    match path_in_repo.rsplit_once('/') {
        Some((dir, _)) => format!("{}/{}/{}.yaml", dir, stem, step),
        None => format!("{}/{}.yaml", stem, step),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tekton::ParamValue;
    use proptest::prelude::*;

    fn param_map(params: &[Param]) -> Vec<(String, String)> {
        params
            .iter()
            .map(|p| match &p.value {
                ParamValue::String(s) => (p.name.clone(), s.clone()),
                other => panic!("unexpected value {:?}", other),
            })
            .collect()
    }

    #[test]
    fn test_parse_github_shorthand() {
        let r = GitRef::parse(
            "uses:jenkins-x/jx3-pipeline-catalog/tasks/go/pullrequest.yaml@versionStream",
            None,
            None,
        )
        .unwrap()
        .unwrap();
        assert_eq!(r.url, "https://github.com/jenkins-x/jx3-pipeline-catalog.git");
        assert_eq!(r.owner, "jenkins-x");
        assert_eq!(r.repo, "jx3-pipeline-catalog");
        assert_eq!(r.path_in_repo, "tasks/go/pullrequest.yaml");
        assert_eq!(r.revision, "versionStream");
        assert_eq!(r.host(), "github.com");
    }

    #[test]
    fn test_parse_full_url() {
        let r = GitRef::parse("uses:https://gitlab.example.com/acme/tasks/build/go.yaml@main", None, None)
            .unwrap()
            .unwrap();
        assert_eq!(r.url, "https://gitlab.example.com/acme/tasks.git");
        assert_eq!(r.owner, "acme");
        assert_eq!(r.repo, "tasks");
        assert_eq!(r.path_in_repo, "build/go.yaml");
        assert_eq!(r.to_uses(), "uses:https://gitlab.example.com/acme/tasks/build/go.yaml@main");
        assert_eq!(r.to_string(), "gitlab.example.com/acme/tasks/build/go.yaml@main");
    }

    #[test]
    fn test_new_renders_shorthand_only_for_github() {
        let github = GitRef::new("github.com", "o", "r", "tasks/go/a.yaml", "v1");
        assert_eq!(github.to_uses(), "uses:o/r/tasks/go/a.yaml@v1");
        let gitlab = GitRef::new("gitlab.example.com", "o", "r", "tasks/go/a.yaml", "v1");
        assert_eq!(gitlab.to_uses(), "uses:https://gitlab.example.com/o/r/tasks/go/a.yaml@v1");
    }

    #[test]
    fn test_parse_not_a_reference() {
        assert_eq!(GitRef::parse("golang:1.21", None, None).unwrap(), None);
        assert_eq!(GitRef::parse("", Some("build"), None).unwrap(), None);
    }

    #[test]
    fn test_parse_malformed_reference() {
        assert!(GitRef::parse("uses:owner/repo@main", None, None).is_err());
        assert!(GitRef::parse("uses:owner/repo/file.yaml", None, None).is_err());
        assert!(GitRef::parse("uses:owner/repo/file.yaml@", None, None).is_err());
    }

    #[test]
    fn test_step_name_injection() {
        let r = GitRef::parse("uses:o/r/dir/file.yaml@sha", Some("build"), None)
            .unwrap()
            .unwrap();
        assert_eq!(r.path_in_repo, "dir/file/build.yaml");
        assert_eq!(r.parent_file_name(), "build");
    }

    #[test]
    fn test_step_name_injection_top_level_file() {
        let r = GitRef::parse("uses:o/r/file.yaml@sha", Some("lint"), None)
            .unwrap()
            .unwrap();
        assert_eq!(r.path_in_repo, "file/lint.yaml");
    }

    #[test]
    fn test_revision_override() {
        let r = GitRef::parse("uses:o/r/tasks/a.yaml@versionStream", None, Some("v0.4.1"))
            .unwrap()
            .unwrap();
        assert_eq!(r.revision, "v0.4.1");
        let r = GitRef::parse("uses:o/r/tasks/a.yaml@versionStream", None, Some(""))
            .unwrap()
            .unwrap();
        assert_eq!(r.revision, "versionStream");
    }

    #[test]
    fn test_resolver_params_public_and_private() {
        let r = GitRef::parse("uses:o/r/tasks/a.yaml@abc123", None, None)
            .unwrap()
            .unwrap();
        let public = param_map(&GitResolverRef::new(r.clone(), true).to_params());
        assert_eq!(
            public,
            vec![
                ("url".to_string(), "https://github.com/o/r.git".to_string()),
                ("revision".to_string(), "abc123".to_string()),
                ("pathInRepo".to_string(), "tasks/a.yaml".to_string()),
            ]
        );
        let private = param_map(&GitResolverRef::new(r, false).to_params());
        assert_eq!(private[0], ("org".to_string(), "o".to_string()));
        assert_eq!(private[1], ("repo".to_string(), "r".to_string()));
        assert_eq!(private.len(), 4);
    }

    #[test]
    fn test_parent_file_name() {
        let r = GitRef::parse("uses:o/r/tasks/go/release.yaml@v1", None, None)
            .unwrap()
            .unwrap();
        assert_eq!(r.parent_file_name(), "release");
        assert_eq!(r.for_step("build").path_in_repo, "tasks/go/release/build.yaml");
    }

    #[test]
    fn test_uses_from_raw_url_default_catalog() {
        let uses = uses_from_raw_url(
            "https://raw.githubusercontent.com/jenkins-x/jx3-pipeline-catalog/6d3bc1c/tasks/git-clone/x.yaml",
            "jenkins-x",
            "jx3-pipeline-catalog",
        )
        .unwrap();
        assert_eq!(uses, "uses:jenkins-x/jx3-pipeline-catalog/tasks/git-clone/x.yaml@versionStream");
    }

    #[test]
    fn test_uses_from_raw_url_other_repo_keeps_sha() {
        let uses = uses_from_raw_url(
            "https://raw.githubusercontent.com/acme/steps/6d3bc1c/setup.yaml",
            "jenkins-x",
            "jx3-pipeline-catalog",
        )
        .unwrap();
        assert_eq!(uses, "uses:acme/steps/setup.yaml@6d3bc1c");
    }

    #[test]
    fn test_uses_from_raw_url_rejects_other_hosts() {
        assert!(uses_from_raw_url("https://example.com/a/b/c/d.yaml", "o", "r").is_err());
        assert!(uses_from_raw_url("not a url", "o", "r").is_err());
    }

    #[test]
    fn test_strip_image_tag() {
        assert_eq!(strip_image_tag("golang:1.21"), "golang");
        assert_eq!(strip_image_tag("gcr.io/jenkinsxio/jx-boot:3.2.1"), "gcr.io/jenkinsxio/jx-boot");
        assert_eq!(strip_image_tag("localhost:5000/builder"), "localhost:5000/builder");
        assert_eq!(strip_image_tag("alpine@sha256:abcd"), "alpine");
        assert_eq!(strip_image_tag("alpine"), "alpine");
    }

    proptest! {
        #[test]
        fn prop_shorthand_round_trip(
            owner in "[a-z][a-z0-9-]{0,10}",
            repo in "[a-z][a-z0-9-]{0,10}",
            dirs in proptest::collection::vec("[a-z0-9_-]{1,8}", 0..3),
            file in "[a-z0-9_-]{1,8}",
            rev in "[a-zA-Z0-9._-]{1,12}",
        ) {
            let mut parts = dirs.clone();
            parts.push(format!("{}.yaml", file));
            let path = parts.join("/");
            let image = format!("uses:{}/{}/{}@{}", owner, repo, path, rev);

            let r = GitRef::parse(&image, None, None).unwrap().unwrap();
            prop_assert_eq!(&r.url, &format!("https://github.com/{}/{}.git", owner, repo));
            prop_assert_eq!(&r.path_in_repo, &path);
            prop_assert_eq!(&r.revision, &rev);
            prop_assert_eq!(r.to_uses(), image);

            let params = param_map(&GitResolverRef::new(r, false).to_params());
            prop_assert_eq!(&params[0].1, &owner);
            prop_assert_eq!(&params[1].1, &repo);
            prop_assert_eq!(&params[2].1, &rev);
            prop_assert_eq!(&params[3].1, &path);
        }
    }
}
