//! Groups and path resolution
//!
//! A group owns a URL prefix and knows how to turn the rest of a request path
//! into a storage path, either through an explicit allow-list or by joining
//! it under a root directory.

use crate::http::MaxAge;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// Cache settings attached to a group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheConfig {
    pub max_age: MaxAge,
}

/// How a group maps request paths to storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Only the listed request-relative paths are visible
    Explicit(HashMap<String, String>),
    /// Anything under the directory is visible
    Folder(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub prefix: String,
    pub resolution: Resolution,
    /// Prepended to every storage path of this group when set
    pub root: Option<PathBuf>,
    pub cache: CacheConfig,
}

impl Group {
    pub fn explicit(prefix: impl Into<String>, urls: HashMap<String, String>) -> Self {
        Self {
            prefix: prefix.into(),
            resolution: Resolution::Explicit(urls),
            root: None,
            cache: CacheConfig::default(),
        }
    }

    pub fn folder(prefix: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
            resolution: Resolution::Folder(dir.into()),
            root: None,
            cache: CacheConfig::default(),
        }
    }

    #[must_use]
    pub fn with_root(mut self, root: Option<PathBuf>) -> Self {
        self.root = root;
        self
    }

    #[must_use]
    pub fn with_max_age(mut self, max_age: MaxAge) -> Self {
        self.cache.max_age = max_age;
        self
    }

    /// Request path minus this group's prefix, if the prefix matches
    pub fn remainder<'a>(&self, path: &'a str) -> Option<&'a str> {
        path.strip_prefix(self.prefix.as_str())
    }

    /// Storage path for a request path that already matched this group.
    ///
    /// Returns `None` when the path is not visible through this group: an
    /// unmapped name in explicit mode, or a path escaping the root in folder
    /// mode. Both are pass-through rather than errors.
    pub fn resolve(&self, remainder: &str) -> Option<PathBuf> {
        match &self.resolution {
            Resolution::Explicit(urls) => {
                let target = urls.get(remainder)?;
                Some(self.effective(Path::new(target)))
            }
            Resolution::Folder(dir) => {
                let root = self.effective(dir);
                let candidate = join_normalized(&root, remainder);
                // Component-wise, so `/srv/public-secret` is not under
                // `/srv/public`. Symlinks are not followed.
                if candidate.starts_with(&root) {
                    Some(candidate)
                } else {
                    tracing::warn!(
                        prefix = %self.prefix,
                        remainder,
                        "path traversal attempt blocked"
                    );
                    None
                }
            }
        }
    }

    /// `root` (if any) joined with `path`, normalized
    fn effective(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) => join_normalized(root, &path.to_string_lossy()),
            None => join_normalized(path, ""),
        }
    }
}

/// Lexically join `rel` onto `base` and normalize `.` and `..` segments.
///
/// `rel` is always treated as relative, even with a leading `/`, so it can
/// never replace `base` outright. `..` may climb above `base`; callers check
/// containment themselves.
pub fn join_normalized(base: &Path, rel: &str) -> PathBuf {
    let mut out = PathBuf::new();
    for component in base.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    for segment in rel.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            seg => out.push(seg),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_join_normalized() {
        let base = Path::new("/srv/public");
        assert_eq!(
            join_normalized(base, "assets/app.js"),
            PathBuf::from("/srv/public/assets/app.js")
        );
        assert_eq!(
            join_normalized(base, "/assets/./app.js"),
            PathBuf::from("/srv/public/assets/app.js")
        );
        assert_eq!(
            join_normalized(base, "../secret.txt"),
            PathBuf::from("/srv/secret.txt")
        );
        assert_eq!(
            join_normalized(base, "a/../../../../etc/passwd"),
            PathBuf::from("/etc/passwd")
        );
        assert_eq!(
            join_normalized(Path::new(""), "foo/bar.js"),
            PathBuf::from("foo/bar.js")
        );
    }

    #[test]
    fn test_folder_containment() {
        let group = Group::folder("/static/", "/srv/public");
        assert_eq!(
            group.resolve("assets/app.js"),
            Some(PathBuf::from("/srv/public/assets/app.js"))
        );
        assert_eq!(group.resolve("../secret.txt"), None);
        assert_eq!(group.resolve("assets/../../secret.txt"), None);
        assert_eq!(
            group.resolve("assets/../index.html"),
            Some(PathBuf::from("/srv/public/index.html"))
        );
    }

    #[test]
    fn test_folder_rejects_sibling_with_shared_prefix() {
        for dir in ["/srv/public", "/srv/public/"] {
            let group = Group::folder("/static/", dir);
            assert_eq!(group.resolve("../public-secret/keys.txt"), None, "{dir}");
            assert_eq!(group.resolve("../publicity.txt"), None, "{dir}");
            assert_eq!(
                group.resolve("public-secret/keys.txt"),
                Some(PathBuf::from("/srv/public/public-secret/keys.txt"))
            );
        }
        let group = Group::folder("/static/", "public");
        assert_eq!(group.resolve("../public-secret/keys.txt"), None);
        assert_eq!(group.resolve("a.js"), Some(PathBuf::from("public/a.js")));
    }

    #[test]
    fn test_folder_with_root_override() {
        let group =
            Group::folder("/yui/", "yui/build").with_root(Some(PathBuf::from("/opt/assets")));
        assert_eq!(
            group.resolve("yui/yui-min.js"),
            Some(PathBuf::from("/opt/assets/yui/build/yui/yui-min.js"))
        );
        assert_eq!(group.resolve("../../../etc/passwd"), None);
    }

    #[test]
    fn test_explicit_map() {
        let group = Group::explicit("/app/", urls(&[("one.html", "/root/one.html")]));
        assert_eq!(group.resolve("one.html"), Some(PathBuf::from("/root/one.html")));
        assert_eq!(group.resolve("two.html"), None);
        assert_eq!(group.resolve("one.html/"), None);
    }

    #[test]
    fn test_explicit_map_with_root() {
        let group = Group::explicit("/app/", urls(&[("a.js", "foo/bar.js")]))
            .with_root(Some(PathBuf::from("/root")));
        assert_eq!(group.resolve("a.js"), Some(PathBuf::from("/root/foo/bar.js")));
    }

    #[test]
    fn test_remainder() {
        let group = Group::folder("/yui/", "/srv");
        assert_eq!(group.remainder("/yui/foo.js"), Some("foo.js"));
        assert_eq!(group.remainder("/other/foo.js"), None);
    }
}
