//! Hierarchical dataset paths.
//!
//! Paths are `/`-separated with a leading `/`. Groups are implicit: a
//! group exists while some dataset lives beneath it.

use crate::error::StoreError;

/// Width of the zero-padded checkpoint index in dataset paths.
pub const INDEX_WIDTH: usize = 6;

/// Path of the `index`-th checkpoint of `field`.
///
/// ```
/// use strand_store::checkpoint_path;
///
/// assert_eq!(checkpoint_path("phi", 0), "/phi/000000");
/// assert_eq!(checkpoint_path("c", 42), "/c/000042");
/// ```
pub fn checkpoint_path(field: &str, index: u64) -> String {
    format!("/{field}/{index:0width$}", width = INDEX_WIDTH)
}

/// Normalize a dataset path to `/a/b` form.
///
/// A missing leading `/` and a single trailing `/` are accepted. Empty
/// components, `.`, `..`, and NUL bytes are rejected, as is the root.
pub fn normalize_dataset(path: &str) -> Result<String, StoreError> {
    let normalized = normalize_group(path)?;
    if normalized == "/" {
        return Err(StoreError::InvalidPath {
            path: path.to_string(),
            reason: "the root is a group",
        });
    }
    Ok(normalized)
}

/// Normalize a group path; the root normalizes to `/`.
pub fn normalize_group(path: &str) -> Result<String, StoreError> {
    let invalid = |reason| StoreError::InvalidPath {
        path: path.to_string(),
        reason,
    };
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return Ok("/".to_string());
    }
    let mut out = String::with_capacity(trimmed.len() + 1);
    for component in trimmed.split('/') {
        match component {
            "" => return Err(invalid("empty component")),
            "." | ".." => return Err(invalid("relative component")),
            c if c.contains('\0') => return Err(invalid("NUL byte")),
            c => {
                out.push('/');
                out.push_str(c);
            }
        }
    }
    Ok(out)
}

/// Whether normalized `ancestor` is a strict ancestor group of
/// normalized `path`.
pub fn is_ancestor(ancestor: &str, path: &str) -> bool {
    if ancestor == "/" {
        return path != "/";
    }
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'/'
}

/// The component of normalized `path` directly below normalized
/// `group`, if `path` lies under `group`.
pub fn child_of<'a>(group: &str, path: &'a str) -> Option<&'a str> {
    if !is_ancestor(group, path) {
        return None;
    }
    let skip = if group == "/" { 1 } else { group.len() + 1 };
    path[skip..].split('/').next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes() {
        assert_eq!(normalize_dataset("phi").unwrap(), "/phi");
        assert_eq!(normalize_dataset("/phi/000001/").unwrap(), "/phi/000001");
        assert_eq!(normalize_group("").unwrap(), "/");
        assert_eq!(normalize_group("/").unwrap(), "/");
    }

    #[test]
    fn rejects_bad_paths() {
        for bad in ["/a//b", "/a/../b", "///", "/./x"] {
            assert!(
                matches!(normalize_group(bad), Err(StoreError::InvalidPath { .. })),
                "{bad}"
            );
        }
        assert!(matches!(
            normalize_dataset("/"),
            Err(StoreError::InvalidPath { .. })
        ));
    }

    #[test]
    fn ancestry() {
        assert!(is_ancestor("/", "/phi"));
        assert!(is_ancestor("/phi", "/phi/000000"));
        assert!(!is_ancestor("/phi", "/phi"));
        assert!(!is_ancestor("/ph", "/phi/000000"));
        assert_eq!(child_of("/", "/phi/000000"), Some("phi"));
        assert_eq!(child_of("/phi", "/phi/000000"), Some("000000"));
        assert_eq!(child_of("/c", "/phi/000000"), None);
    }

    #[test]
    fn wide_indices_are_not_truncated() {
        assert_eq!(checkpoint_path("phi", 1_234_567), "/phi/1234567");
    }
}
