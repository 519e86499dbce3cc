//! Benchmark harness for the tspec compiler.
//!
//! Uses criterion for reliable benchmarking.
//! Run with: cargo bench -p tspec_compiler

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tspec_compiler::{compile, CompilerOptions, VirtualFsHost};

/// Small source for micro-benchmarks.
const SMALL_SOURCE: &str = r#"
model Pet {
  name: string;
  age?: int32;
}
"#;

/// A realistic service definition.
const MEDIUM_SOURCE: &str = r#"
namespace PetStore {
  enum Kind { dog, cat, bird }

  scalar petId extends string;

  @doc("A pet")
  model Pet {
    id: petId;
    name: string;
    kind: Kind = Kind.dog;
    age?: int8 = 1;
    tags?: string[];
  }

  model Page<T> {
    items: T[];
    next?: string;
  }

  model Error {
    code: int32;
    message: string;
  }

  model Dog is Pet {
    breed: string;
  }

  model Owner {
    name: string;
    pets: Record<Pet>;
    ...Error;
  }

  @tag("pets")
  interface Pets {
    list(): Page<Pet>;
    read(id: petId): Pet | Error;
    create(pet: Pet): Pet;
  }

  interface Dogs extends Pets {
    bark(id: petId): void;
  }
}
"#;

/// Generate a source with many models and template instantiations.
fn generate_large_source(num_models: usize) -> String {
    let mut source = String::from("model Box<T> { value: T; count: int32 = 0; }\n");
    for i in 0..num_models {
        source.push_str(&format!(
            "model Model{i} {{
  id: string;
  value{i}: int64 = {i};
  boxed: Box<Model{i}>;
}}
"
        ));
        if i > 0 {
            source.push_str(&format!("model Derived{i} extends Model{prev} {{ extra: boolean; }}\n", prev = i - 1));
        }
    }
    source
}

fn compile_source(source: &str) -> usize {
    let host = VirtualFsHost::new().with_file("/main.tsp", source);
    let program = compile(&host, "/main.tsp", &CompilerOptions::default());
    program.diagnostics().len()
}

// ============================================================================
// Full Pipeline Benchmarks
// ============================================================================

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");

    group.bench_function("small", |b| {
        b.iter(|| black_box(compile_source(black_box(SMALL_SOURCE))));
    });

    group.bench_function("medium", |b| {
        b.iter(|| black_box(compile_source(black_box(MEDIUM_SOURCE))));
    });

    group.bench_function("multiple_files", |b| {
        let mut host = VirtualFsHost::new();
        let mut main = String::new();
        for i in 0..10 {
            main.push_str(&format!("import \"./file_{}.tsp\";\n", i));
            host = host.with_file(
                &format!("/file_{}.tsp", i),
                &MEDIUM_SOURCE.replace("PetStore", &format!("PetStore{}", i)),
            );
        }
        let host = host.with_file("/main.tsp", &main);
        b.iter(|| black_box(compile(&host, "/main.tsp", &CompilerOptions::default())));
    });

    group.finish();
}

// ============================================================================
// Scaling Benchmarks
// ============================================================================

fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("scaling");

    for size in [10, 50, 100, 200] {
        let source = generate_large_source(size);
        group.bench_with_input(BenchmarkId::new("models", size), &source, |b, source| {
            b.iter(|| black_box(compile_source(black_box(source))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compile, bench_scaling);
criterion_main!(benches);
