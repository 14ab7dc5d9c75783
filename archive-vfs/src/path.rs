//! Canonical archive paths.
//!
//! Archive paths are always forward-slash separated and relative to the
//! archive root, which is spelled as the empty string. Cleaning never
//! escapes the root: a leading `..` saturates instead of walking above it.

/// The separator used in archive paths, on every platform.
pub const SEPARATOR: &str = "/";

/// Joins path segments into one canonical path.
///
/// Leading empty segments are skipped; the first non-empty segment and all
/// remaining segments are joined with a single `/` and cleaned. If every
/// segment is empty, the archive root (`""`) is returned.
pub fn join<I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let segments: Vec<S> = segments.into_iter().collect();
    for (i, segment) in segments.iter().enumerate() {
        if !segment.as_ref().is_empty() {
            let tail = segments[i..]
                .iter()
                .map(|s| s.as_ref())
                .collect::<Vec<_>>()
                .join(SEPARATOR);
            return clean(&tail);
        }
    }
    String::new()
}

/// Collapses `.`, `..`, and redundant separators into canonical form.
///
/// Leading separators are dropped (paths are rooted at the archive root
/// either way), and `..` pops at most to the root.
pub fn clean(path: &str) -> String {
    let mut out: Vec<&str> = Vec::new();

    for component in path.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            name => out.push(name),
        }
    }

    out.join(SEPARATOR)
}

/// Returns the final component of `path`, or `""` for the archive root.
pub fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_skips_leading_empty_segments() {
        assert_eq!(join(["", "a", "b"]), "a/b");
        assert_eq!(join(["", "", "etc", "hosts"]), "etc/hosts");
    }

    #[test]
    fn join_cleans_relative_chunks() {
        assert_eq!(join(["a/", "../b"]), "b");
        assert_eq!(join(["a", "./b", "c/../d"]), "a/b/d");
    }

    #[test]
    fn join_of_nothing_is_root() {
        assert_eq!(join(Vec::<&str>::new()), "");
        assert_eq!(join(["", ""]), "");
    }

    #[test]
    fn join_keeps_inner_empty_segments_harmless() {
        // Empty segments after the first non-empty one collapse in clean().
        assert_eq!(join(["a", "", "b"]), "a/b");
    }

    #[test]
    fn clean_collapses_separators_and_dots() {
        assert_eq!(clean("/cant//hate/./the/path"), "cant/hate/the/path");
        assert_eq!(clean("a/b/../c"), "a/c");
        assert_eq!(clean("."), "");
        assert_eq!(clean("/"), "");
    }

    #[test]
    fn clean_saturates_at_the_root() {
        assert_eq!(clean("../../etc/passwd"), "etc/passwd");
        assert_eq!(clean(".."), "");
    }

    #[test]
    fn base_name_of_paths() {
        assert_eq!(base_name("a/b/c.txt"), "c.txt");
        assert_eq!(base_name("top"), "top");
        assert_eq!(base_name(""), "");
    }
}
