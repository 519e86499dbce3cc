//! tspec_path: Path normalization and extension handling.
//!
//! Paths are handled as `/`-separated strings so that the in-memory host
//! and the real file system see the same keys. A path starts with a root
//! (`/`, `c:/`, `//server/`, `file:///`, `http://server/`) or is relative.

/// File kinds the compiler loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extension {
    Tsp,
    Js,
    Mjs,
    Json,
}

impl Extension {
    /// Get the string representation of this extension (including the dot).
    pub fn as_str(&self) -> &'static str {
        match self {
            Extension::Tsp => ".tsp",
            Extension::Js => ".js",
            Extension::Mjs => ".mjs",
            Extension::Json => ".json",
        }
    }

    /// Whether files with this extension are library modules providing
    /// decorator implementations.
    pub fn is_js(&self) -> bool {
        matches!(self, Extension::Js | Extension::Mjs)
    }

    pub fn from_path(path: &str) -> Option<Extension> {
        match get_any_extension_from_path(path).as_str() {
            ".tsp" => Some(Extension::Tsp),
            ".js" => Some(Extension::Js),
            ".mjs" => Some(Extension::Mjs),
            ".json" => Some(Extension::Json),
            _ => None,
        }
    }
}

/// Convert backslashes to forward slashes.
pub fn normalize_slashes(path: &str) -> String {
    path.replace('\\', "/")
}

#[inline]
pub fn is_directory_separator(ch: u8) -> bool {
    ch == b'/' || ch == b'\\'
}

/// Length of the root of `path`, negated (`!len`) for URLs.
fn encoded_root_length(path: &str) -> isize {
    let bytes = path.as_bytes();
    let Some(&ch0) = bytes.first() else {
        return 0;
    };

    // POSIX or UNC
    if ch0 == b'/' || ch0 == b'\\' {
        if bytes.get(1) != Some(&ch0) {
            return 1;
        }
        return match bytes[2..].iter().position(|&c| c == ch0) {
            Some(index) => (index + 3) as isize,
            None => bytes.len() as isize,
        };
    }

    // DOS
    if ch0.is_ascii_alphabetic() && bytes.get(1) == Some(&b':') {
        match bytes.get(2) {
            Some(b'/') | Some(b'\\') => return 3,
            None => return 2,
            _ => {}
        }
    }

    // URL
    if let Some(scheme_end) = path.find("://") {
        let authority_start = scheme_end + 3;
        let Some(offset) = path[authority_start..].find('/') else {
            return !(bytes.len() as isize);
        };
        let authority_end = authority_start + offset;
        let scheme = &path[..scheme_end];
        let authority = &path[authority_start..authority_end];
        let local = scheme == "file" && (authority.is_empty() || authority == "localhost");
        if local && bytes.get(authority_end + 1).is_some_and(|c| c.is_ascii_alphabetic()) {
            if let Some(volume_end) = file_url_volume_separator_end(bytes, authority_end + 2) {
                if bytes.get(volume_end) == Some(&b'/') {
                    return !((volume_end + 1) as isize);
                }
                if volume_end == bytes.len() {
                    return !(volume_end as isize);
                }
            }
        }
        return !((authority_end + 1) as isize);
    }

    0
}

/// End of `:` or `%3a` after a drive letter in a `file:` URL.
fn file_url_volume_separator_end(bytes: &[u8], start: usize) -> Option<usize> {
    match bytes.get(start)? {
        b':' => Some(start + 1),
        b'%' if bytes.get(start + 1) == Some(&b'3') => match bytes.get(start + 2)? {
            b'a' | b'A' => Some(start + 3),
            _ => None,
        },
        _ => None,
    }
}

/// Length of the root portion of a path, 0 for relative paths.
pub fn get_root_length(path: &str) -> usize {
    let length = encoded_root_length(path);
    if length < 0 {
        (!length) as usize
    } else {
        length as usize
    }
}

pub fn is_url(path: &str) -> bool {
    encoded_root_length(path) < 0
}

pub fn is_path_absolute(path: &str) -> bool {
    encoded_root_length(path) != 0
}

pub fn has_trailing_directory_separator(path: &str) -> bool {
    path.as_bytes().last().is_some_and(|c| is_directory_separator(*c))
}

/// Ensure a path ends with a directory separator.
pub fn ensure_trailing_directory_separator(path: &str) -> String {
    if has_trailing_directory_separator(path) {
        path.to_string()
    } else {
        format!("{}/", path)
    }
}

pub fn remove_trailing_directory_separator(path: &str) -> &str {
    if has_trailing_directory_separator(path) {
        &path[..path.len() - 1]
    } else {
        path
    }
}

/// The directory containing `path`, without a trailing separator unless it
/// is a root.
pub fn get_directory_path(path: &str) -> String {
    let path = normalize_slashes(path);
    let root_length = get_root_length(&path);
    if root_length == path.len() {
        return path;
    }
    let trimmed = remove_trailing_directory_separator(&path);
    let end = match trimmed.rfind('/') {
        Some(index) => index.max(root_length),
        None => root_length,
    };
    trimmed[..end].to_string()
}

/// The last component of `path`, empty for a root.
pub fn get_base_file_name(path: &str) -> String {
    let path = normalize_slashes(path);
    let root_length = get_root_length(&path);
    if root_length == path.len() {
        return String::new();
    }
    let trimmed = remove_trailing_directory_separator(&path);
    let start = match trimmed.rfind('/') {
        Some(index) => (index + 1).max(get_root_length(trimmed)),
        None => get_root_length(trimmed),
    };
    trimmed[start..].to_string()
}

/// The lowercased extension of the base file name, including the dot.
pub fn get_any_extension_from_path(path: &str) -> String {
    let base = get_base_file_name(path);
    match base.rfind('.') {
        Some(index) => base[index..].to_lowercase(),
        None => String::new(),
    }
}

/// Join path segments. An absolute segment replaces everything before it.
pub fn join_paths(path: &str, paths: &[&str]) -> String {
    let mut result = normalize_slashes(path);
    for relative in paths {
        if relative.is_empty() {
            continue;
        }
        let relative = normalize_slashes(relative);
        if result.is_empty() || get_root_length(&relative) != 0 {
            result = relative;
        } else {
            result = ensure_trailing_directory_separator(&result) + &relative;
        }
    }
    result
}

/// Split a path into its root followed by each component. The root is the
/// empty string for relative paths.
pub fn get_path_components(path: &str) -> Vec<String> {
    let path = normalize_slashes(path);
    let root_length = get_root_length(&path);
    let mut components = vec![path[..root_length].to_string()];
    let rest = &path[root_length..];
    let mut parts: Vec<&str> = rest.split('/').collect();
    if parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }
    components.extend(parts.into_iter().map(str::to_string));
    components
}

/// Resolve `.` and `..` components. `..` never climbs above a root.
pub fn reduce_path_components(components: &[String]) -> Vec<String> {
    let Some(root) = components.first() else {
        return Vec::new();
    };
    let mut reduced = vec![root.clone()];
    for component in &components[1..] {
        if component.is_empty() || component == "." {
            continue;
        }
        if component == ".." {
            if reduced.len() > 1 {
                if reduced.last().is_some_and(|c| c != "..") {
                    reduced.pop();
                    continue;
                }
            } else if !reduced[0].is_empty() {
                continue;
            }
        }
        reduced.push(component.clone());
    }
    reduced
}

fn get_path_from_path_components(components: &[String]) -> String {
    let Some(root) = components.first() else {
        return String::new();
    };
    let root = if root.is_empty() {
        String::new()
    } else {
        ensure_trailing_directory_separator(root)
    };
    root + &components[1..].join("/")
}

/// Normalize separators and resolve `.` and `..` segments, keeping a
/// trailing separator if the input had one.
pub fn normalize_path(path: &str) -> String {
    let path = normalize_slashes(path);
    let normalized = get_path_from_path_components(&reduce_path_components(&get_path_components(&path)));
    if !normalized.is_empty() && has_trailing_directory_separator(&path) {
        ensure_trailing_directory_separator(&normalized)
    } else {
        normalized
    }
}

/// Join the segments and normalize the result.
pub fn resolve_path(path: &str, paths: &[&str]) -> String {
    if paths.is_empty() {
        normalize_path(path)
    } else {
        normalize_path(&join_paths(path, paths))
    }
}

/// Relative path from directory `from` to `to`. Both must share a root.
pub fn get_relative_path(from: &str, to: &str) -> String {
    let from = reduce_path_components(&get_path_components(&normalize_path(from)));
    let to = reduce_path_components(&get_path_components(&normalize_path(to)));
    if from.first() != to.first() {
        return get_path_from_path_components(&to);
    }
    let common = from
        .iter()
        .zip(to.iter())
        .skip(1)
        .take_while(|(a, b)| a == b)
        .count()
        + 1;
    let mut parts: Vec<&str> = std::iter::repeat("..").take(from.len() - common).collect();
    parts.extend(to[common..].iter().map(String::as_str));
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_from_path() {
        assert_eq!(Extension::from_path("main.tsp"), Some(Extension::Tsp));
        assert_eq!(Extension::from_path("lib/decorators.MJS"), Some(Extension::Mjs));
        assert_eq!(Extension::from_path("tspconfig.json"), Some(Extension::Json));
        assert_eq!(Extension::from_path("foo.ts"), None);
        assert!(Extension::Js.is_js());
        assert!(!Extension::Tsp.is_js());
    }

    #[test]
    fn test_normalize_slashes() {
        assert_eq!(normalize_slashes("a\\b"), "a/b");
        assert_eq!(normalize_slashes("\\\\server\\path"), "//server/path");
    }

    #[test]
    fn test_root_length() {
        assert_eq!(get_root_length("a"), 0);
        assert_eq!(get_root_length("/path"), 1);
        assert_eq!(get_root_length("c:"), 2);
        assert_eq!(get_root_length("c:d"), 0);
        assert_eq!(get_root_length("c:/"), 3);
        assert_eq!(get_root_length("//server"), 8);
        assert_eq!(get_root_length("//server/share"), 9);
        assert_eq!(get_root_length("file:///path"), 8);
        assert_eq!(get_root_length("file:///c:/path"), 11);
        assert_eq!(get_root_length("file:///c%3a/path"), 13);
        assert_eq!(get_root_length("file://localhost/c:"), 19);
        assert_eq!(get_root_length("http://server/path"), 14);
    }

    #[test]
    fn test_is_url() {
        assert!(!is_url("/"));
        assert!(!is_url("c:/"));
        assert!(!is_url("//server/share"));
        assert!(is_url("file:///path"));
        assert!(is_url("http://server"));
    }

    #[test]
    fn test_get_directory_path() {
        assert_eq!(get_directory_path(""), "");
        assert_eq!(get_directory_path("a/b"), "a");
        assert_eq!(get_directory_path("/"), "/");
        assert_eq!(get_directory_path("/a"), "/");
        assert_eq!(get_directory_path("/a/b/"), "/a");
        assert_eq!(get_directory_path("c:/path"), "c:/");
        assert_eq!(get_directory_path("\\\\server\\share"), "//server/");
        assert_eq!(get_directory_path("file:///c:/path/"), "file:///c:/");
    }

    #[test]
    fn test_get_base_file_name() {
        assert_eq!(get_base_file_name(""), "");
        assert_eq!(get_base_file_name("a/"), "a");
        assert_eq!(get_base_file_name("/"), "");
        assert_eq!(get_base_file_name("/a/b"), "b");
        assert_eq!(get_base_file_name("c:d"), "c:d");
        assert_eq!(get_base_file_name("//server"), "");
        assert_eq!(get_base_file_name("http://server/a/"), "a");
    }

    #[test]
    fn test_get_any_extension() {
        assert_eq!(get_any_extension_from_path(""), "");
        assert_eq!(get_any_extension_from_path(".ext"), ".ext");
        assert_eq!(get_any_extension_from_path("a.EXT/"), ".ext");
    }

    #[test]
    fn test_path_components() {
        assert_eq!(get_path_components(""), vec![""]);
        assert_eq!(get_path_components("./a"), vec!["", ".", "a"]);
        assert_eq!(get_path_components("/a/"), vec!["/", "a"]);
        assert_eq!(get_path_components("c:"), vec!["c:"]);
        assert_eq!(get_path_components("//server/share"), vec!["//server/", "share"]);
    }

    #[test]
    fn test_reduce_path_components() {
        let reduce = |parts: &[&str]| {
            let owned: Vec<String> = parts.iter().map(|p| p.to_string()).collect();
            reduce_path_components(&owned)
        };
        assert!(reduce(&[]).is_empty());
        assert_eq!(reduce(&["", "."]), vec![""]);
        assert_eq!(reduce(&["", "..", ".", ".."]), vec!["", "..", ".."]);
        assert_eq!(reduce(&["", "a", ".."]), vec![""]);
        assert_eq!(reduce(&["/", ".."]), vec!["/"]);
    }

    #[test]
    fn test_join_paths() {
        assert_eq!(join_paths("/", &["/node_modules/@types"]), "/node_modules/@types");
        assert_eq!(join_paths("/a/..", &[""]), "/a/..");
        assert_eq!(join_paths("/a/..", &["b/"]), "/a/../b/");
        assert_eq!(join_paths("/a/..", &["/b"]), "/b");
    }

    #[test]
    fn test_resolve_path() {
        assert_eq!(resolve_path("", &[]), "");
        assert_eq!(resolve_path("./", &[]), "");
        assert_eq!(resolve_path("..", &[]), "..");
        assert_eq!(resolve_path("../", &[]), "../");
        assert_eq!(resolve_path("/../", &[]), "/");
        assert_eq!(resolve_path("/a/./b/", &[]), "/a/b/");
        assert_eq!(resolve_path("/a/../b", &[]), "/b");
        assert_eq!(resolve_path("/a/..", &["b/"]), "/b/");
        assert_eq!(resolve_path("/a/.", &["."]), "/a");
        assert_eq!(resolve_path("a", &["b", "/c"]), "/c");
        assert_eq!(resolve_path("a", &["b", "../c"]), "a/c");
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(get_relative_path("/a/b", "/a/c/d.tsp"), "../c/d.tsp");
        assert_eq!(get_relative_path("/a", "/a/b.tsp"), "b.tsp");
    }
}
