//! Mapping module-relative URL paths onto module directories.

use std::path::{Component, Path, PathBuf};

/// Join a URL-style relative path under `base`.
///
/// Returns `None` when the path would escape `base` (`..`, absolute
/// components, drive prefixes).
pub fn join_under(base: &Path, rel: &str) -> Option<PathBuf> {
    let mut out = base.to_path_buf();
    for comp in Path::new(rel.trim_start_matches('/')).components() {
        match comp {
            Component::Normal(s) => out.push(s),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(out)
}

/// Collapse repeated separators, as request paths may contain `//`.
pub fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut last_slash = false;
    for c in path.chars() {
        if c == '/' {
            if last_slash {
                continue;
            }
            last_slash = true;
        } else {
            last_slash = false;
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_under() {
        let base = Path::new("/srv/static");
        assert_eq!(join_under(base, "/css/site.css").unwrap(), PathBuf::from("/srv/static/css/site.css"));
        assert_eq!(join_under(base, "./a/./b").unwrap(), PathBuf::from("/srv/static/a/b"));
        assert!(join_under(base, "/css/../../etc/passwd").is_none());
    }

    #[test]
    fn test_collapse_slashes() {
        assert_eq!(collapse_slashes("//a///b/"), "/a/b/");
        assert_eq!(collapse_slashes("/plain"), "/plain");
    }
}
