//! The compiler's view of the outside world.
//!
//! Every file read, directory listing and library module lookup goes
//! through a [`CompilerHost`]. [`NodeHost`] is backed by the real file
//! system; [`VirtualFsHost`] keeps everything in memory for tests and
//! embedding.

use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, trace, warn};
use tspec_checker::ModuleRecord;
use tspec_path::{ensure_trailing_directory_separator, join_paths, normalize_path, resolve_path};

/// A failed host operation.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("File {0} not found.")]
    NotFound(String),
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} is not valid UTF-8")]
    InvalidUtf8(String),
    #[error("no library module is registered for {0}")]
    ModuleUnavailable(String),
}

impl HostError {
    fn from_io(path: &str, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            HostError::NotFound(path.to_string())
        } else {
            HostError::Io {
                path: path.to_string(),
                source,
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, HostError::NotFound(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub is_file: bool,
    pub is_directory: bool,
}

impl FileStat {
    const FILE: FileStat = FileStat {
        is_file: true,
        is_directory: false,
    };
    const DIRECTORY: FileStat = FileStat {
        is_file: false,
        is_directory: true,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Warning,
    Error,
}

/// File system and module access used by [`crate::compile`].
pub trait CompilerHost {
    fn read_file(&self, path: &str) -> Result<String, HostError>;

    /// Names of the direct children of a directory, sorted.
    fn read_dir(&self, path: &str) -> Result<Vec<String>, HostError>;

    fn stat(&self, path: &str) -> Result<FileStat, HostError>;

    fn write_file(&self, path: &str, content: &str) -> Result<(), HostError>;

    fn mkdirp(&self, path: &str) -> Result<(), HostError>;

    fn rm(&self, path: &str, recursive: bool) -> Result<(), HostError>;

    /// Canonical form of `path`, used to load each file once.
    fn realpath(&self, path: &str) -> Result<String, HostError>;

    /// Directories searched for bare library imports (`import "lib"`).
    fn get_lib_dirs(&self) -> Vec<String>;

    fn get_execution_root(&self) -> String;

    /// Decorator implementations provided by a JS-like module
    /// (`import "./lib.js"`).
    fn get_js_import(&self, path: &str) -> Result<ModuleRecord, HostError>;

    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Trace => trace!(target: "tspec::host", "{}", message),
            LogLevel::Warning => warn!(target: "tspec::host", "{}", message),
            LogLevel::Error => error!(target: "tspec::host", "{}", message),
        }
    }
}

// ============================================================================
// NodeHost
// ============================================================================

/// Host backed by `std::fs`. Library modules cannot be loaded from disk, so
/// their implementations are registered up front under the path of the
/// module file.
pub struct NodeHost {
    execution_root: String,
    lib_dirs: Vec<String>,
    modules: FxHashMap<String, ModuleRecord>,
}

impl NodeHost {
    /// A host rooted at the current working directory, searching `lib/`
    /// under it for libraries.
    pub fn new() -> Self {
        let root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let root = normalize_path(&root.to_string_lossy());
        let lib_dirs = vec![join_paths(&root, &["lib"])];
        Self {
            execution_root: root,
            lib_dirs,
            modules: FxHashMap::default(),
        }
    }

    pub fn with_lib_dir(mut self, dir: impl AsRef<str>) -> Self {
        self.lib_dirs.push(normalize_path(dir.as_ref()));
        self
    }

    pub fn with_module(mut self, module: ModuleRecord) -> Self {
        let key = self.realpath(&module.path).unwrap_or_else(|_| normalize_path(&module.path));
        self.modules.insert(key, module);
        self
    }
}

impl Default for NodeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl CompilerHost for NodeHost {
    fn read_file(&self, path: &str) -> Result<String, HostError> {
        let bytes = std::fs::read(path).map_err(|e| HostError::from_io(path, e))?;
        String::from_utf8(bytes).map_err(|_| HostError::InvalidUtf8(path.to_string()))
    }

    fn read_dir(&self, path: &str) -> Result<Vec<String>, HostError> {
        let entries = std::fs::read_dir(path).map_err(|e| HostError::from_io(path, e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| HostError::from_io(path, e))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    fn stat(&self, path: &str) -> Result<FileStat, HostError> {
        let metadata = std::fs::metadata(path).map_err(|e| HostError::from_io(path, e))?;
        Ok(FileStat {
            is_file: metadata.is_file(),
            is_directory: metadata.is_dir(),
        })
    }

    fn write_file(&self, path: &str, content: &str) -> Result<(), HostError> {
        std::fs::write(path, content).map_err(|e| HostError::from_io(path, e))
    }

    fn mkdirp(&self, path: &str) -> Result<(), HostError> {
        std::fs::create_dir_all(path).map_err(|e| HostError::from_io(path, e))
    }

    fn rm(&self, path: &str, recursive: bool) -> Result<(), HostError> {
        let result = match std::fs::metadata(path) {
            Ok(metadata) if metadata.is_dir() && recursive => std::fs::remove_dir_all(path),
            Ok(metadata) if metadata.is_dir() => std::fs::remove_dir(path),
            Ok(_) => std::fs::remove_file(path),
            Err(e) => Err(e),
        };
        result.map_err(|e| HostError::from_io(path, e))
    }

    fn realpath(&self, path: &str) -> Result<String, HostError> {
        let canonical = std::fs::canonicalize(path).map_err(|e| HostError::from_io(path, e))?;
        Ok(normalize_path(&canonical.to_string_lossy()))
    }

    fn get_lib_dirs(&self) -> Vec<String> {
        self.lib_dirs.clone()
    }

    fn get_execution_root(&self) -> String {
        self.execution_root.clone()
    }

    fn get_js_import(&self, path: &str) -> Result<ModuleRecord, HostError> {
        let key = self.realpath(path)?;
        self.modules
            .get(&key)
            .cloned()
            .ok_or_else(|| HostError::ModuleUnavailable(path.to_string()))
    }
}

// ============================================================================
// VirtualFsHost
// ============================================================================

/// In-memory host. Paths are normalized, so `a\b`, `a/./b` and `a/b` name
/// the same file.
pub struct VirtualFsHost {
    files: RefCell<BTreeMap<String, String>>,
    modules: FxHashMap<String, ModuleRecord>,
    lib_dirs: Vec<String>,
}

impl VirtualFsHost {
    pub fn new() -> Self {
        Self {
            files: RefCell::new(BTreeMap::new()),
            modules: FxHashMap::default(),
            lib_dirs: vec!["/lib".to_string()],
        }
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.add_file(path, content);
        self
    }

    /// Register decorator implementations for the module file at
    /// `module.path`.
    pub fn with_module(mut self, module: ModuleRecord) -> Self {
        let key = key(&module.path);
        self.files.borrow_mut().entry(key.clone()).or_default();
        self.modules.insert(key, module);
        self
    }

    pub fn with_lib_dir(mut self, dir: &str) -> Self {
        self.lib_dirs.push(key(dir));
        self
    }

    pub fn add_file(&self, path: &str, content: &str) {
        self.files.borrow_mut().insert(key(path), content.to_string());
    }

    /// Contents of a file, including ones written during compilation.
    pub fn file(&self, path: &str) -> Option<String> {
        self.files.borrow().get(&key(path)).cloned()
    }

    fn is_directory(&self, path: &str) -> bool {
        let prefix = ensure_trailing_directory_separator(path);
        self.files.borrow().keys().any(|p| p.starts_with(&prefix))
    }
}

impl Default for VirtualFsHost {
    fn default() -> Self {
        Self::new()
    }
}

fn key(path: &str) -> String {
    resolve_path("/", &[path])
}

impl CompilerHost for VirtualFsHost {
    fn read_file(&self, path: &str) -> Result<String, HostError> {
        self.files
            .borrow()
            .get(&key(path))
            .cloned()
            .ok_or_else(|| HostError::NotFound(path.to_string()))
    }

    fn read_dir(&self, path: &str) -> Result<Vec<String>, HostError> {
        let dir = key(path);
        if !self.is_directory(&dir) {
            return Err(HostError::NotFound(path.to_string()));
        }
        let prefix = ensure_trailing_directory_separator(&dir);
        let mut names: Vec<String> = self
            .files
            .borrow()
            .keys()
            .filter_map(|p| p.strip_prefix(&prefix))
            .map(|rest| rest.split('/').next().unwrap_or(rest).to_string())
            .filter(|name| !name.is_empty())
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    fn stat(&self, path: &str) -> Result<FileStat, HostError> {
        let path = key(path);
        if self.files.borrow().contains_key(&path) {
            Ok(FileStat::FILE)
        } else if self.is_directory(&path) {
            Ok(FileStat::DIRECTORY)
        } else {
            Err(HostError::NotFound(path))
        }
    }

    fn write_file(&self, path: &str, content: &str) -> Result<(), HostError> {
        self.add_file(path, content);
        Ok(())
    }

    fn mkdirp(&self, _path: &str) -> Result<(), HostError> {
        Ok(())
    }

    fn rm(&self, path: &str, recursive: bool) -> Result<(), HostError> {
        let path = key(path);
        let mut files = self.files.borrow_mut();
        if files.remove(&path).is_some() {
            return Ok(());
        }
        let prefix = ensure_trailing_directory_separator(&path);
        if !recursive || !files.keys().any(|p| p.starts_with(&prefix)) {
            return Err(HostError::NotFound(path));
        }
        files.retain(|p, _| !p.starts_with(&prefix));
        Ok(())
    }

    fn realpath(&self, path: &str) -> Result<String, HostError> {
        Ok(key(path))
    }

    fn get_lib_dirs(&self) -> Vec<String> {
        self.lib_dirs.clone()
    }

    fn get_execution_root(&self) -> String {
        "/".to_string()
    }

    fn get_js_import(&self, path: &str) -> Result<ModuleRecord, HostError> {
        self.modules
            .get(&key(path))
            .cloned()
            .ok_or_else(|| HostError::ModuleUnavailable(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_read_missing_file() {
        let host = VirtualFsHost::new();
        let err = host.read_file("/main.tsp").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "File /main.tsp not found.");
    }

    #[test]
    fn test_virtual_paths_are_normalized() {
        let host = VirtualFsHost::new().with_file("/src\\a.tsp", "model A {}");
        assert_eq!(host.read_file("/src/./a.tsp").unwrap(), "model A {}");
        assert_eq!(host.realpath("/src/x/../a.tsp").unwrap(), "/src/a.tsp");
        assert_eq!(host.read_file("src/a.tsp").unwrap(), "model A {}");
    }

    #[test]
    fn test_virtual_stat_and_read_dir() {
        let host = VirtualFsHost::new()
            .with_file("/proj/main.tsp", "")
            .with_file("/proj/lib/a.tsp", "")
            .with_file("/proj/lib/b.tsp", "");
        assert_eq!(host.stat("/proj/main.tsp").unwrap(), FileStat::FILE);
        assert_eq!(host.stat("/proj/lib").unwrap(), FileStat::DIRECTORY);
        assert!(host.stat("/proj/missing").is_err());
        assert_eq!(host.read_dir("/proj").unwrap(), vec!["lib", "main.tsp"]);
        assert_eq!(host.read_dir("/proj/lib/").unwrap(), vec!["a.tsp", "b.tsp"]);
    }

    #[test]
    fn test_virtual_write_and_rm() {
        let host = VirtualFsHost::new();
        host.mkdirp("/out").unwrap();
        host.write_file("/out/a/x.json", "{}").unwrap();
        host.write_file("/out/b.json", "[]").unwrap();
        assert_eq!(host.file("/out/a/x.json").as_deref(), Some("{}"));

        assert!(host.rm("/out/a", false).is_err());
        host.rm("/out/a", true).unwrap();
        assert!(host.file("/out/a/x.json").is_none());
        host.rm("/out/b.json", false).unwrap();
        assert!(host.stat("/out").is_err());
    }

    #[test]
    fn test_virtual_js_modules() {
        let host = VirtualFsHost::new().with_module(ModuleRecord::new("/lib/decorators.js"));
        assert_eq!(host.stat("/lib/decorators.js").unwrap(), FileStat::FILE);
        assert_eq!(host.get_js_import("/lib/./decorators.js").unwrap().path, "/lib/decorators.js");
        assert!(matches!(
            host.get_js_import("/lib/other.js"),
            Err(HostError::ModuleUnavailable(_))
        ));
    }

    #[test]
    fn test_node_host_round_trip() {
        let dir = std::env::temp_dir().join(format!("tspec-host-{}", std::process::id()));
        let dir = dir.to_string_lossy().into_owned();
        let host = NodeHost::new();
        let nested = join_paths(&dir, &["nested"]);
        host.mkdirp(&nested).unwrap();
        let file = join_paths(&nested, &["main.tsp"]);
        host.write_file(&file, "model A {}").unwrap();

        assert_eq!(host.read_file(&file).unwrap(), "model A {}");
        assert!(host.stat(&nested).unwrap().is_directory);
        assert_eq!(host.read_dir(&nested).unwrap(), vec!["main.tsp"]);
        assert!(host.read_file(&join_paths(&nested, &["missing.tsp"])).unwrap_err().is_not_found());

        host.rm(&dir, true).unwrap();
        assert!(host.stat(&dir).is_err());
    }
}
