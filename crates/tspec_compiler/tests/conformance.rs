//! Sample suite harness.
//!
//! Compiles every `main.tsp` found under a directory of sample projects
//! and checks that the compiler gets through each of them without
//! panicking. Set `TSPEC_SAMPLES_PATH` to run it:
//!   TSPEC_SAMPLES_PATH=/path/to/samples cargo test -p tspec_compiler
//!
//! Without this variable, the suite is skipped. The built-in samples below
//! always run.

use std::path::{Path, PathBuf};
use tspec_compiler::{compile, CompilerOptions, NodeHost, VirtualFsHost};

fn get_samples_path() -> Option<PathBuf> {
    std::env::var("TSPEC_SAMPLES_PATH").ok().map(PathBuf::from)
}

/// Collect sample entry points (`main.tsp`) recursively.
fn collect_entries(dir: &Path, entries: &mut Vec<PathBuf>, max_entries: usize) {
    if entries.len() >= max_entries {
        return;
    }
    let Ok(read) = std::fs::read_dir(dir) else {
        return;
    };
    let mut paths: Vec<PathBuf> = read.flatten().map(|e| e.path()).collect();
    paths.sort();
    for path in paths {
        if entries.len() >= max_entries {
            break;
        }
        if path.is_dir() {
            collect_entries(&path, entries, max_entries);
        } else if path.file_name().is_some_and(|n| n == "main.tsp") {
            entries.push(path);
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    }
}

#[test]
fn test_sample_suite() {
    let Some(samples) = get_samples_path() else {
        eprintln!("Skipping sample suite: TSPEC_SAMPLES_PATH not set.");
        return;
    };
    if !samples.exists() {
        eprintln!("Skipping sample suite: {:?} does not exist.", samples);
        return;
    }
    let max_entries = std::env::var("TSPEC_SAMPLES_MAX")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(500);

    let mut entries = Vec::new();
    collect_entries(&samples, &mut entries, max_entries);
    println!("Compiling {} samples...", entries.len());

    let host = NodeHost::new();
    let options = CompilerOptions::default();
    let mut clean = 0;
    let mut panics = Vec::new();
    for entry in &entries {
        let path = entry.to_string_lossy().into_owned();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| compile(&host, &path, &options)));
        match result {
            Ok(program) if !program.has_error() => clean += 1,
            Ok(_) => {}
            Err(payload) => panics.push((path, panic_message(payload))),
        }
    }

    println!("Clean: {}/{}", clean, entries.len());
    for (path, message) in panics.iter().take(10) {
        println!("  {}: {}", path, &message[..message.len().min(100)]);
    }
    assert!(panics.is_empty(), "{} samples panicked", panics.len());
}

// ============================================================================
// Built-in samples (always run)
// ============================================================================

fn assert_compiles_cleanly(samples: &[&str]) {
    for sample in samples {
        let host = VirtualFsHost::new().with_file("/main.tsp", sample);
        let program = compile(&host, "/main.tsp", &CompilerOptions::default());
        let messages: Vec<String> = program.diagnostics().iter().map(ToString::to_string).collect();
        assert!(messages.is_empty(), "sample:\n{}\ndiagnostics: {:?}", sample, messages);
    }
}

#[test]
fn test_sample_pet_store() {
    assert_compiles_cleanly(&[r#"
        namespace PetStore {
          enum Kind { dog, cat }

          @doc("A pet in the store")
          model Pet {
            id: int64;
            name: string;
            kind: Kind = Kind.dog;
            tags?: string[];
          }

          model Page<T> {
            items: T[];
            next?: string;
          }

          @tag("pets")
          interface Pets {
            list(): Page<Pet>;
            read(id: int64): Pet;
            create(pet: Pet): Pet;
          }
        }
    "#]);
}

#[test]
fn test_sample_heritage() {
    assert_compiles_cleanly(&[
        "model Base { id: string } model Derived extends Base { extra?: int32 }",
        "model Base { id: string } model Copy is Base { more: boolean }",
        "model A { a: string } model B { b: string } model C { ...A; ...B }",
        "model A { a: string } model B { b: string } alias AB = A & B; model M { ab: AB }",
        "scalar uuid extends string; model M { id: uuid }",
    ]);
}

#[test]
fn test_sample_values() {
    assert_compiles_cleanly(&[
        "model M { count: int8 = 12; ratio: float32 = 0.5; name: string = \"x\" }",
        "const limit = 10; const greeting: string = \"hello\";",
        "model M { flags: string[] = #[\"a\", \"b\"] }",
        "model Point { x: int32; y: int32 } const origin: Point = #{ x: 0, y: 0 };",
    ]);
}
