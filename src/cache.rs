//! In-process cache of catalog task specs.
//!
//! Owned by the run context and borrowed by the processors that need it, so
//! independent runs never share entries. Entries are never evicted; the cache
//! is bounded by the number of distinct catalog references touched in one
//! directory walk.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::error::Result;
use crate::reference::GitRef;
use crate::tekton::TaskSpec;

/// Cache key: the full location of a catalog document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub host: String,
    pub owner: String,
    pub repo: String,
    pub path: String,
    pub revision: String,
}

impl CacheKey {
    pub fn new(host: &str, owner: &str, repo: &str, path: &str, revision: &str) -> Self {
        Self {
            host: host.to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            path: path.to_string(),
            revision: revision.to_string(),
        }
    }
}

impl From<&GitRef> for CacheKey {
    fn from(r: &GitRef) -> Self {
        Self::new(r.host(), &r.owner, &r.repo, &r.path_in_repo, &r.revision)
    }
}

/// Memoizing map from catalog location to parsed task spec.
#[derive(Debug, Default)]
pub struct CatalogCache {
    entries: HashMap<CacheKey, TaskSpec>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cached spec, or compute and cache it if not present. A failed
    /// computation caches nothing.
    pub fn get_or_fetch<F>(&mut self, key: CacheKey, fetch: F) -> Result<&TaskSpec>
    where
        F: FnOnce() -> Result<TaskSpec>,
    {
        match self.entries.entry(key) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => Ok(entry.insert(fetch()?)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::tekton::Step;

    fn spec_with_step(name: &str) -> TaskSpec {
        TaskSpec {
            steps: vec![Step::named(name)],
            ..TaskSpec::default()
        }
    }

    #[test]
    fn test_cache_key() {
        let key1 = CacheKey::new("github.com", "o", "r", "tasks/a.yaml", "main");
        let key2 = CacheKey::new("github.com", "o", "r", "tasks/a.yaml", "main");
        let key3 = CacheKey::new("github.com", "o", "r", "tasks/a.yaml", "v1");

        assert_eq!(key1, key2);
        assert_ne!(key1, key3);

        let r = GitRef::parse("uses:o/r/tasks/a.yaml@main", None, None)
            .unwrap()
            .unwrap();
        assert_eq!(CacheKey::from(&r), key1);
    }

    #[test]
    fn test_cache_get_or_fetch() {
        let mut cache = CatalogCache::new();
        let key = CacheKey::new("github.com", "o", "r", "tasks/a.yaml", "main");
        let mut calls = 0;

        let spec = cache
            .get_or_fetch(key.clone(), || {
                calls += 1;
                Ok(spec_with_step("build"))
            })
            .unwrap();
        assert_eq!(spec.steps[0].name, "build");

        let spec = cache
            .get_or_fetch(key, || {
                calls += 1;
                Ok(spec_with_step("other"))
            })
            .unwrap();
        assert_eq!(spec.steps[0].name, "build");
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_failed_fetch_is_not_cached() {
        let mut cache = CatalogCache::new();
        let key = CacheKey::new("github.com", "o", "r", "tasks/a.yaml", "main");

        let result = cache.get_or_fetch(key.clone(), || Err(Error::structural("offline")));
        assert!(result.is_err());
        assert!(cache.is_empty());

        let spec = cache.get_or_fetch(key, || Ok(spec_with_step("build"))).unwrap();
        assert_eq!(spec.steps[0].name, "build");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_key_includes_host() {
        let github = GitRef::parse("uses:acme/tasks/build/go.yaml@main", None, None)
            .unwrap()
            .unwrap();
        let gitlab = GitRef::parse(
            "uses:https://gitlab.example.com/acme/tasks/build/go.yaml@main",
            None,
            None,
        )
        .unwrap()
        .unwrap();
        assert_ne!(CacheKey::from(&github), CacheKey::from(&gitlab));
        assert_eq!(CacheKey::from(&gitlab).host, "gitlab.example.com");
    }
}
