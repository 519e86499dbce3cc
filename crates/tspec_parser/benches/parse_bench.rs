use bumpalo::Bump;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tspec_ast::types::SourceFileId;
use tspec_core::intern::StringInterner;
use tspec_parser::Parser;

// A medium-size tspec source with various constructs
const TSPEC_SOURCE: &str = r#"
import "./common.tsp";

using Shared;

@doc("Pet store service")
namespace PetStore {
    @doc("A pet")
    model Pet {
        id: int64;
        name: string;
        tag?: string = "none";
        kind: "dog" | "cat" | "fish";
        owner: Owner;
        ...Timestamps;
    }

    model Owner {
        name: string;
        pets: Pet[];
        meta: Record<string>;
    }

    model Page<T> {
        items: T[];
        next?: url;
    }

    scalar petId extends int64;

    enum Status {
        Available,
        Pending: "pending",
        Sold: "sold",
    }

    union Result<T> {
        ok: T,
        error: Error,
    }

    alias PetPage = Page<Pet>;

    const defaultLimit: int32 = 50;

    @tag("pets")
    interface Pets {
        list(limit?: int32 = defaultLimit): PetPage;
        get(id: petId): Pet | Error;
        create(@doc("body") pet: Pet): Result<Pet>;
        delete(id: petId): void;
    }

    op ping(): "pong";
    op pingAgain is ping;

    model Error {
        code: int32;
        message: string;
        details: #{ retry: true }[] | null;
    }

    model Timestamps {
        createdAt: utcDateTime;
        updatedAt: utcDateTime;
    }

    alias Greeting = "Hello ${string} from ${"PetStore"}";
}

@@doc(PetStore.Pet.name, "The pet name");
"#;

fn bench_parse_tspec(c: &mut Criterion) {
    c.bench_function("parse_tspec_medium", |b| {
        b.iter(|| {
            let arena = Bump::new();
            let interner = StringInterner::new();
            let mut parser = Parser::new(&arena, &interner, SourceFileId(0), "bench.tsp", black_box(TSPEC_SOURCE));
            let source_file = parser.parse_source_file();
            black_box(source_file.statements.len());
        });
    });
}

criterion_group!(benches, bench_parse_tspec);
criterion_main!(benches);
