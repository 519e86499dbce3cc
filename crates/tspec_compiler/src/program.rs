//! Program loading and the compile pipeline.
//!
//! Starting from the entry file, sources are read through the host and
//! parsed breadth first, following `import` statements. Each file is loaded
//! once. The standard library is always file 0. Once everything is loaded
//! the files are bound and checked together.

use crate::host::{CompilerHost, HostError, LogLevel};
use crate::options::CompilerOptions;
use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use std::collections::VecDeque;
use std::time::Instant;
use tracing::{debug, info};
use tspec_ast::node::SourceFile;
use tspec_ast::types::SourceFileId;
use tspec_binder::Binder;
use tspec_checker::stdlib::{STD_LIBRARY_PATH, STD_LIBRARY_SOURCE};
use tspec_checker::{Checker, ModuleRecord, TypeGraph, TypeId};
use tspec_core::arena::CompilerArena;
use tspec_core::intern::StringInterner;
use tspec_core::text::{LineAndColumn, LineMap};
use tspec_diagnostics::{messages, Diagnostic, DiagnosticCollection, DiagnosticMessage, DiagnosticTarget};
use tspec_parser::Parser;
use tspec_path::{get_directory_path, is_path_absolute, join_paths, resolve_path, Extension};

/// The result of a compilation: the checked type graph, the sources it was
/// built from and every diagnostic reported along the way.
pub struct Program {
    entry: String,
    options: CompilerOptions,
    sources: IndexMap<String, String>,
    graph: TypeGraph,
    diagnostics: DiagnosticCollection,
}

impl Program {
    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diagnostics.diagnostics()
    }

    pub fn has_error(&self) -> bool {
        self.diagnostics.has_errors()
    }

    pub fn graph(&self) -> &TypeGraph {
        &self.graph
    }

    pub fn global_namespace(&self) -> TypeId {
        self.graph.global_namespace()
    }

    pub fn get_std_type(&self, name: &str) -> Option<TypeId> {
        self.graph.get_std_type(name)
    }

    pub fn is_type_assignable_to(&self, source: TypeId, target: TypeId) -> bool {
        self.graph.is_type_assignable_to(source, target)
    }

    /// Paths of the loaded source files in load order, standard library
    /// first.
    pub fn source_files(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    pub fn source_text(&self, path: &str) -> Option<&str> {
        self.sources.get(path).map(String::as_str)
    }

    /// 1-based line and column of an offset in a loaded file.
    pub fn position_of(&self, path: &str, pos: u32) -> Option<LineAndColumn> {
        let text = self.source_text(path)?;
        if pos as usize > text.len() {
            return None;
        }
        Some(LineMap::new(text).position_of(pos))
    }
}

/// Compile the program rooted at `entry`. A directory entry means its
/// `main.tsp`. A program is always returned; failures are diagnostics.
pub fn compile(host: &dyn CompilerHost, entry: &str, options: &CompilerOptions) -> Program {
    let start = Instant::now();
    info!(target: "tspec::compiler", entry, "compile started");

    let arena = CompilerArena::new();
    let interner = StringInterner::new();
    let mut loader = Loader::new(host, &arena, &interner);
    loader.load_source(STD_LIBRARY_PATH, STD_LIBRARY_SOURCE);

    let entry_path = resolve_entry(host, entry);
    match &entry_path {
        Some(path) => loader.load_all(path),
        None => loader.report(None, &messages::ENTRY_NOT_FOUND, &[entry]),
    }

    let Loader {
        files,
        sources,
        modules,
        diagnostics: mut all,
        ..
    } = loader;

    let mut binder = Binder::new(&interner);
    for file in files {
        binder.bind_source_file(file);
    }
    binder.finish();

    let mut checker = Checker::new(binder);
    for module in &modules {
        checker.register_module(module);
    }
    checker.check_program();
    let (graph, checked) = checker.finish();
    all.extend(checked);

    if options.warn_as_error {
        all.escalate_warnings();
    }

    info!(
        target: "tspec::compiler",
        entry,
        files = sources.len(),
        diagnostics = all.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "compile finished"
    );

    Program {
        entry: entry_path.unwrap_or_else(|| entry.to_string()),
        options: options.clone(),
        sources,
        graph,
        diagnostics: all,
    }
}

/// The file to start from, or `None` when the entry does not exist.
fn resolve_entry(host: &dyn CompilerHost, entry: &str) -> Option<String> {
    let stat = host.stat(entry).ok()?;
    let path = if stat.is_directory {
        join_paths(entry, &["main.tsp"])
    } else {
        entry.to_string()
    };
    if !host.stat(&path).is_ok_and(|s| s.is_file) {
        return None;
    }
    Some(host.realpath(&path).unwrap_or(path))
}

/// What an import statement refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ResolvedImport {
    Source(String),
    Module(String),
}

fn is_relative_import(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
        || is_path_absolute(specifier)
}

/// Resolve `specifier` as written in the file at `importing`.
fn resolve_import(host: &dyn CompilerHost, importing: &str, specifier: &str) -> Option<ResolvedImport> {
    if !is_relative_import(specifier) {
        return host.get_lib_dirs().iter().find_map(|dir| {
            let main = join_paths(dir, &[specifier, "main.tsp"]);
            host.stat(&main).is_ok_and(|s| s.is_file).then_some(ResolvedImport::Source(main))
        });
    }

    let path = resolve_path(&get_directory_path(importing), &[specifier]);
    match Extension::from_path(&path) {
        Some(Extension::Tsp) => return Some(ResolvedImport::Source(path)),
        Some(ext) if ext.is_js() => return Some(ResolvedImport::Module(path)),
        _ => {}
    }
    if host.stat(&path).is_ok_and(|s| s.is_directory) {
        return Some(ResolvedImport::Source(join_paths(&path, &["main.tsp"])));
    }
    None
}

struct Loader<'a, 'h> {
    host: &'h dyn CompilerHost,
    arena: &'a CompilerArena,
    interner: &'a StringInterner,
    files: Vec<&'a SourceFile<'a>>,
    sources: IndexMap<String, String>,
    modules: Vec<ModuleRecord>,
    loaded_modules: FxHashSet<String>,
    diagnostics: DiagnosticCollection,
}

impl<'a, 'h> Loader<'a, 'h> {
    fn new(host: &'h dyn CompilerHost, arena: &'a CompilerArena, interner: &'a StringInterner) -> Self {
        Self {
            host,
            arena,
            interner,
            files: Vec::new(),
            sources: IndexMap::new(),
            modules: Vec::new(),
            loaded_modules: FxHashSet::default(),
            diagnostics: DiagnosticCollection::new(),
        }
    }

    fn report(&mut self, target: Option<DiagnosticTarget>, message: &DiagnosticMessage, args: &[&str]) {
        let diagnostic = match target {
            Some(target) => Diagnostic::with_target(target, message, args),
            None => Diagnostic::new(message, args),
        };
        self.diagnostics.add(diagnostic);
    }

    fn load_source(&mut self, path: &str, text: &str) -> &'a SourceFile<'a> {
        let id = SourceFileId(self.files.len() as u32);
        let mut parser = Parser::new(self.arena.bump(), self.interner, id, path, text);
        let file = parser.parse_source_file();
        self.diagnostics.extend(parser.take_diagnostics());
        self.files.push(file);
        self.sources.insert(path.to_string(), text.to_string());
        file
    }

    /// Load the entry and everything it imports.
    fn load_all(&mut self, entry: &str) {
        let mut pending: VecDeque<(String, Option<DiagnosticTarget>)> = VecDeque::new();
        pending.push_back((entry.to_string(), None));

        while let Some((path, origin)) = pending.pop_front() {
            let path = self.host.realpath(&path).unwrap_or(path);
            if self.sources.contains_key(&path) {
                continue;
            }
            let text = match self.host.read_file(&path) {
                Ok(text) => text,
                Err(error) => {
                    self.report_read_error(origin, &path, error);
                    continue;
                }
            };
            debug!(target: "tspec::compiler", path = path.as_str(), "loaded file");
            let file = self.load_source(&path, &text);

            for import in file.imports() {
                let specifier = import.path.value;
                let target = DiagnosticTarget::new(path.as_str(), import.data.range);
                match resolve_import(self.host, &path, specifier) {
                    Some(ResolvedImport::Source(resolved)) => {
                        debug!(target: "tspec::compiler", specifier, resolved = resolved.as_str(), "resolved import");
                        pending.push_back((resolved, Some(target)));
                    }
                    Some(ResolvedImport::Module(resolved)) => self.load_module(&resolved, specifier, target),
                    None => self.report(Some(target), &messages::IMPORT_NOT_FOUND, &[specifier]),
                }
            }
        }
    }

    fn load_module(&mut self, path: &str, specifier: &str, target: DiagnosticTarget) {
        let path = self.host.realpath(path).unwrap_or_else(|_| path.to_string());
        if !self.loaded_modules.insert(path.clone()) {
            return;
        }
        if self.host.stat(&path).is_err() {
            self.report(Some(target), &messages::FILE_NOT_FOUND, &[path.as_str()]);
            return;
        }
        self.host.log(LogLevel::Trace, &format!("loading library module {}", path));
        match self.host.get_js_import(&path) {
            Ok(module) => {
                debug!(
                    target: "tspec::compiler",
                    path = path.as_str(),
                    decorators = module.decorators.len(),
                    "loaded library module"
                );
                self.modules.push(module);
            }
            Err(error) => {
                let reason = error.to_string();
                self.report(Some(target), &messages::MODULE_IMPORT_FAILED, &[specifier, reason.as_str()]);
            }
        }
    }

    fn report_read_error(&mut self, origin: Option<DiagnosticTarget>, path: &str, error: HostError) {
        if error.is_not_found() {
            self.report(origin, &messages::FILE_NOT_FOUND, &[path]);
        } else {
            let reason = error.to_string();
            self.report(origin, &messages::INTERNAL_ERROR, &[reason.as_str()]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::VirtualFsHost;

    #[test]
    fn test_relative_import_detection() {
        assert!(is_relative_import("./a.tsp"));
        assert!(is_relative_import("../a"));
        assert!(is_relative_import("/abs/a.tsp"));
        assert!(!is_relative_import("my-lib"));
        assert!(!is_relative_import("@scope/lib"));
    }

    #[test]
    fn test_resolve_import_kinds() {
        let host = VirtualFsHost::new()
            .with_file("/proj/main.tsp", "")
            .with_file("/proj/models/main.tsp", "")
            .with_file("/lib/http/main.tsp", "");
        let resolve = |s: &str| resolve_import(&host, "/proj/main.tsp", s);

        assert_eq!(resolve("./a.tsp"), Some(ResolvedImport::Source("/proj/a.tsp".into())));
        assert_eq!(resolve("../x/b.mjs"), Some(ResolvedImport::Module("/x/b.mjs".into())));
        assert_eq!(resolve("./models"), Some(ResolvedImport::Source("/proj/models/main.tsp".into())));
        assert_eq!(resolve("http"), Some(ResolvedImport::Source("/lib/http/main.tsp".into())));
        assert_eq!(resolve("./missing"), None);
        assert_eq!(resolve("rest"), None);
    }

    #[test]
    fn test_resolve_entry() {
        let host = VirtualFsHost::new().with_file("/proj/main.tsp", "");
        assert_eq!(resolve_entry(&host, "/proj").as_deref(), Some("/proj/main.tsp"));
        assert_eq!(resolve_entry(&host, "/proj/./main.tsp").as_deref(), Some("/proj/main.tsp"));
        assert_eq!(resolve_entry(&host, "/other.tsp"), None);
    }
}
