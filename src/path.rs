//! Canonical key paths inside a bucket.
//!
//! A canonical path has no leading or trailing `/`, no `.` or empty
//! segments, and the bucket root is the empty string.

pub const SEPARATOR: char = '/';

/// Collapses `.`, `..` and repeated separators, treating `path` as
/// absolute. `..` at the root stays at the root.
pub fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(SEPARATOR) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    segments.join("/")
}

/// Resolves `input` against the remote working directory `cwd`.
///
/// A leading `/` makes `input` relative to the bucket root. An empty
/// `input` denotes `cwd` itself.
pub fn absolute_path(input: &str, cwd: &str) -> String {
    if input.starts_with(SEPARATOR) || cwd.is_empty() {
        return normalize(input);
    }

    normalize(&format!("{}/{}", cwd, input))
}

/// Key prefix shared by everything stored beneath the directory `path`.
pub fn dir_prefix(path: &str) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!("{}{}", path, SEPARATOR)
    }
}

/// Final segment of a canonical path.
pub fn base_name(path: &str) -> &str {
    match path.rfind(SEPARATOR) {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}
