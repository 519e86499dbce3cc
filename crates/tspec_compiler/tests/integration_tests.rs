//! Compiler integration tests.
//!
//! End-to-end tests for the pipeline: load through a host -> parse -> bind
//! -> check. Sources live in a `VirtualFsHost`.

use tspec_checker::stdlib::STD_LIBRARY_PATH;
use tspec_checker::{ModuleRecord, StateValue};
use tspec_compiler::{compile, CompilerOptions, Program, VirtualFsHost};
use tspec_diagnostics::Severity;

fn compile_files(files: &[(&str, &str)]) -> Program {
    compile_with(files, &CompilerOptions::default())
}

fn compile_with(files: &[(&str, &str)], options: &CompilerOptions) -> Program {
    let host = files
        .iter()
        .fold(VirtualFsHost::new(), |host, (path, content)| host.with_file(path, content));
    compile(&host, "/main.tsp", options)
}

fn codes(program: &Program) -> Vec<&'static str> {
    program.diagnostics().iter().map(|d| d.code).collect()
}

fn messages(program: &Program) -> Vec<String> {
    program.diagnostics().iter().map(|d| d.message.clone()).collect()
}

// ============================================================================
// Basic compilation
// ============================================================================

#[test]
fn test_compile_single_file() {
    let program = compile_files(&[("/main.tsp", "model Pet { name: string; age?: int32 }")]);
    assert!(program.diagnostics().is_empty(), "{:?}", messages(&program));
    assert!(!program.has_error());
    assert_eq!(program.entry(), "/main.tsp");
    assert_eq!(program.source_files().collect::<Vec<_>>(), vec![STD_LIBRARY_PATH, "/main.tsp"]);
    assert!(program.graph().find("Pet.name").is_some());
}

#[test]
fn test_std_queries_on_program() {
    let program = compile_files(&[("/main.tsp", "")]);
    let int32 = program.get_std_type("int32").unwrap();
    let numeric = program.get_std_type("numeric").unwrap();
    assert!(program.is_type_assignable_to(int32, numeric));
    assert!(!program.is_type_assignable_to(numeric, int32));
    assert!(program.get_std_type("nope").is_none());
}

#[test]
fn test_entry_not_found() {
    let program = compile_files(&[("/other.tsp", "model A {}")]);
    assert_eq!(codes(&program), vec!["entry-not-found"]);
    assert!(program.has_error());
    assert!(program.diagnostics()[0].target.is_none());
    assert_eq!(program.source_files().count(), 1);
    assert!(program.get_std_type("string").is_some());
}

#[test]
fn test_directory_entry_uses_main() {
    let host = VirtualFsHost::new().with_file("/proj/main.tsp", "model A {}");
    let program = compile(&host, "/proj", &CompilerOptions::default());
    assert!(program.diagnostics().is_empty());
    assert_eq!(program.entry(), "/proj/main.tsp");
}

#[test]
fn test_source_text_is_kept() {
    let program = compile_files(&[("/main.tsp", "model A {}")]);
    assert_eq!(program.source_text("/main.tsp"), Some("model A {}"));
    assert!(program.source_text(STD_LIBRARY_PATH).is_some());
}

// ============================================================================
// Diagnostics
// ============================================================================

#[test]
fn test_checker_diagnostics_carry_file() {
    let source = "model M { a: Missing }";
    let program = compile_files(&[("/main.tsp", source)]);
    assert_eq!(codes(&program), vec!["invalid-ref"]);
    let target = program.diagnostics()[0].target.as_ref().unwrap();
    assert_eq!(target.file, "/main.tsp");
    assert_eq!(&source[target.pos as usize..target.end as usize], "Missing");
}

#[test]
fn test_diagnostic_line_and_column() {
    let program = compile_files(&[("/main.tsp", "model A {}\nmodel M {\n  a: Missing;\n}")]);
    let target = program.diagnostics()[0].target.as_ref().unwrap();
    let position = program.position_of(&target.file, target.pos).unwrap();
    assert_eq!(position.to_string(), "3:6");
    assert!(program.position_of("/main.tsp", 10_000).is_none());
    assert!(program.position_of("/other.tsp", 0).is_none());
}

#[test]
fn test_parse_errors_are_reported() {
    let program = compile_files(&[("/main.tsp", "model {")]);
    assert!(program.has_error());
    assert_eq!(program.diagnostics()[0].target.as_ref().unwrap().file, "/main.tsp");
}

#[test]
fn test_warn_as_error() {
    let files = [("/main.tsp", "extern dec custom(target: unknown); @custom model M {}")];
    let program = compile_files(&files);
    assert_eq!(codes(&program), vec!["missing-implementation"]);
    assert_eq!(program.diagnostics()[0].severity, Severity::Warning);
    assert!(!program.has_error());

    let options = CompilerOptions {
        warn_as_error: true,
        ..Default::default()
    };
    let program = compile_with(&files, &options);
    assert_eq!(program.diagnostics()[0].severity, Severity::Error);
    assert!(program.has_error());
}

#[test]
fn test_diagnostics_serialize() {
    let program = compile_files(&[("/main.tsp", "model M { a: Missing }")]);
    let json = serde_json::to_value(program.diagnostics()).unwrap();
    assert_eq!(json[0]["code"], "invalid-ref");
    assert_eq!(json[0]["severity"], "error");
    assert_eq!(json[0]["target"]["file"], "/main.tsp");
}

// ============================================================================
// Imports
// ============================================================================

#[test]
fn test_relative_imports_load_each_file_once() {
    let program = compile_files(&[
        ("/main.tsp", "import \"./a.tsp\";\nimport \"./models/b.tsp\";\nmodel M { a: A; b: B }"),
        ("/a.tsp", "model A { x: string }"),
        ("/models/b.tsp", "import \"../a.tsp\";\nmodel B { a: A }"),
    ]);
    assert!(program.diagnostics().is_empty(), "{:?}", messages(&program));
    assert_eq!(
        program.source_files().collect::<Vec<_>>(),
        vec![STD_LIBRARY_PATH, "/main.tsp", "/a.tsp", "/models/b.tsp"]
    );
}

#[test]
fn test_circular_imports() {
    let program = compile_files(&[
        ("/main.tsp", "import \"./a.tsp\";\nmodel M { a: A }"),
        ("/a.tsp", "import \"./main.tsp\";\nmodel A { m?: M }"),
    ]);
    assert!(program.diagnostics().is_empty(), "{:?}", messages(&program));
    assert_eq!(program.source_files().count(), 3);
}

#[test]
fn test_directory_import() {
    let program = compile_files(&[
        ("/main.tsp", "import \"./models\";\nmodel M { a: A }"),
        ("/models/main.tsp", "model A {}"),
    ]);
    assert!(program.diagnostics().is_empty(), "{:?}", messages(&program));
}

#[test]
fn test_library_import() {
    let program = compile_files(&[
        ("/main.tsp", "import \"pets\";\nusing Pets;\nmodel M { p: Pet }"),
        ("/lib/pets/main.tsp", "namespace Pets { model Pet { name: string } }"),
    ]);
    assert!(program.diagnostics().is_empty(), "{:?}", messages(&program));
    assert!(program.source_files().any(|f| f == "/lib/pets/main.tsp"));
}

#[test]
fn test_missing_file_import() {
    let program = compile_files(&[("/main.tsp", "import \"./nope.tsp\";")]);
    assert_eq!(codes(&program), vec!["file-not-found"]);
    assert_eq!(messages(&program), vec!["File /nope.tsp not found.".to_string()]);
    assert_eq!(program.diagnostics()[0].target.as_ref().unwrap().file, "/main.tsp");
}

#[test]
fn test_unresolved_import() {
    let program = compile_files(&[("/main.tsp", "import \"nope\";\nimport \"./folder\";")]);
    assert_eq!(codes(&program), vec!["import-not-found", "import-not-found"]);
    assert_eq!(messages(&program)[0], "Couldn't resolve import \"nope\"");
}

#[test]
fn test_js_module_supplies_decorators() {
    let module = ModuleRecord::new("/lib.js")
        .in_namespace("Marks")
        .with_decorator("mark", |ctx, target, args| {
            let label = ctx.string_arg(args, 0).unwrap_or_default();
            ctx.state().set("mark", target, StateValue::String(label));
        });
    let host = VirtualFsHost::new()
        .with_file(
            "/main.tsp",
            "import \"./lib.js\";\nimport \"./lib.js\";\nnamespace Marks { extern dec mark(target: Model, label: valueof string); }\n@Marks.mark(\"yes\") model M {}",
        )
        .with_module(module);
    let program = compile(&host, "/main.tsp", &CompilerOptions::default());
    assert!(program.diagnostics().is_empty(), "{:?}", messages(&program));
    let m = program.graph().find("M").unwrap();
    assert_eq!(
        program.graph().state().get("mark", m),
        Some(&StateValue::String("yes".to_string()))
    );
}

#[test]
fn test_js_module_failures() {
    let program = compile_files(&[
        ("/main.tsp", "import \"./missing.js\";\nimport \"./plain.mjs\";"),
        ("/plain.mjs", "export const x = 1;"),
    ]);
    assert_eq!(codes(&program), vec!["file-not-found", "internal-error"]);
    assert!(messages(&program)[1].starts_with("Failed to load module \"./plain.mjs\""));
}
