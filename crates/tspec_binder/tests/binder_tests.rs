//! Binder integration tests.
//!
//! Tests the parse -> bind pipeline: symbol creation, namespace merging,
//! `using` visibility and ambiguity.

use bumpalo::Bump;
use tspec_ast::types::SourceFileId;
use tspec_binder::{Binder, ResolutionResult, Scope, SymbolFlags, GLOBAL_NAMESPACE};
use tspec_core::intern::StringInterner;
use tspec_parser::Parser;

/// Helper: parse and bind each source as its own file, then run `f`.
fn bind<T>(sources: &[&str], f: impl FnOnce(&Binder<'_>, &StringInterner, Vec<&'static str>) -> T) -> T {
    let arena = Bump::new();
    let interner = StringInterner::new();
    let mut binder = Binder::new(&interner);
    for (i, source) in sources.iter().enumerate() {
        let mut parser = Parser::new(&arena, &interner, SourceFileId(i as u32), &format!("file{}.tsp", i), source);
        let file = parser.parse_source_file();
        assert!(parser.take_diagnostics().is_empty(), "parse errors in {}", source);
        binder.bind_source_file(file);
    }
    binder.finish();
    let codes = binder.take_diagnostics().diagnostics().iter().map(|d| d.code).collect();
    f(&binder, &interner, codes)
}

fn global(file: u32) -> Scope {
    Scope::new(SourceFileId(file), GLOBAL_NAMESPACE)
}

fn resolve_path(binder: &Binder<'_>, interner: &StringInterner, scope: Scope, path: &str) -> ResolutionResult {
    let mut parts = path.split('.');
    let first = interner.intern(parts.next().unwrap_or_default());
    let mut result = binder.resolve(scope, first);
    for part in parts {
        let Some(current) = result.symbol() else {
            return result;
        };
        result = match binder.lookup_export(current, interner.intern(part)) {
            Some(found) => ResolutionResult::Resolved(found),
            None => ResolutionResult::Unresolved,
        };
    }
    result
}

// ============================================================================
// Symbol Creation
// ============================================================================

#[test]
fn test_bind_empty_file() {
    bind(&[""], |binder, _, codes| {
        assert_eq!(binder.symbols().len(), 1);
        assert!(codes.is_empty());
    });
}

#[test]
fn test_bind_declarations() {
    bind(
        &["model M {} scalar S; enum E {} union U {} op o(): void; alias A = M; const c = 1; extern dec d(target: unknown);"],
        |binder, interner, codes| {
            assert!(codes.is_empty());
            let expected = [
                ("M", SymbolFlags::MODEL),
                ("S", SymbolFlags::SCALAR),
                ("E", SymbolFlags::ENUM),
                ("U", SymbolFlags::UNION),
                ("o", SymbolFlags::OPERATION),
                ("A", SymbolFlags::ALIAS),
                ("c", SymbolFlags::CONST),
            ];
            for (name, flags) in expected {
                let sym = binder.resolve(global(0), interner.intern(name)).symbol().unwrap();
                assert!(binder.symbol(sym).flags.contains(flags), "{}", name);
            }
            let dec = binder.resolve(global(0), binder.decorator_key("d")).symbol().unwrap();
            assert!(binder.symbol(dec).flags.contains(SymbolFlags::DECORATOR));
            assert_eq!(binder.resolve(global(0), interner.intern("d")), ResolutionResult::Unresolved);
        },
    );
}

#[test]
fn test_template_parameters_are_locals() {
    bind(&["model Foo<T, U = T> { a: T } model Bar<T> {}"], |binder, interner, _| {
        let foo = binder.resolve(global(0), interner.intern("Foo")).symbol().unwrap();
        let bar = binder.resolve(global(0), interner.intern("Bar")).symbol().unwrap();
        assert_eq!(binder.symbol(foo).locals.len(), 2);
        let t = interner.intern("T");
        let foo_t = binder.resolve(global(0).with_symbol(foo), t).symbol().unwrap();
        let bar_t = binder.resolve(global(0).with_symbol(bar), t).symbol().unwrap();
        assert_ne!(foo_t, bar_t);
        assert_eq!(binder.resolve(global(0), t), ResolutionResult::Unresolved);
    });
}

#[test]
fn test_interface_operations_are_members() {
    bind(&["interface I<T> { get(): T; list<U>(): U[]; }"], |binder, interner, _| {
        let iface = binder.resolve(global(0), interner.intern("I")).symbol().unwrap();
        let members = &binder.symbol(iface).members;
        assert_eq!(members.len(), 2);
        let list = members.get(&interner.intern("list")).unwrap();
        // Both the operation's and the interface's parameters are visible.
        let scope = global(0).with_symbol(list);
        assert!(binder.resolve(scope, interner.intern("U")).symbol().is_some());
        assert!(binder.resolve(scope, interner.intern("T")).symbol().is_some());
    });
}

// ============================================================================
// Namespaces
// ============================================================================

#[test]
fn test_namespaces_merge_across_files() {
    bind(&["namespace A.B { model M {} }", "namespace A.B; model N {}"], |binder, interner, codes| {
        assert!(codes.is_empty());
        let m = resolve_path(binder, interner, global(0), "A.B.M").symbol().unwrap();
        let n = resolve_path(binder, interner, global(1), "A.B.N").symbol().unwrap();
        assert_eq!(binder.symbol(m).parent, binder.symbol(n).parent);
        assert_eq!(binder.full_name(n), "A.B.N");
        let b = binder.symbol(m).parent.unwrap();
        assert_eq!(binder.symbol(b).declarations.len(), 2);
    });
}

#[test]
fn test_lookup_walks_enclosing_namespaces() {
    bind(&["model Outer {} namespace A { model Inner {} namespace B { model Leaf {} } }"], |binder, interner, _| {
        let leaf = resolve_path(binder, interner, global(0), "A.B.Leaf").symbol().unwrap();
        let scope = global(0).with_symbol(leaf);
        assert!(binder.resolve(scope, interner.intern("Inner")).symbol().is_some());
        assert!(binder.resolve(scope, interner.intern("Outer")).symbol().is_some());
    });
}

#[test]
fn test_implicit_std_namespace() {
    bind(
        &["namespace TypeSpec { scalar string; namespace Reflection { model Model {} } }", "model M {}"],
        |binder, interner, _| {
            assert!(binder.std_namespace().is_some());
            assert!(binder.resolve(global(1), interner.intern("string")).symbol().is_some());
            assert!(binder.resolve(global(1), interner.intern("Model")).symbol().is_some());
        },
    );
}

#[test]
fn test_duplicate_symbol() {
    bind(&["model A {} model A {} scalar A;"], |_, _, codes| {
        assert_eq!(codes, vec!["duplicate-symbol"; 3]);
    });
}

#[test]
fn test_namespace_and_model_collide() {
    bind(&["namespace A {} model A {}"], |_, _, codes| {
        assert_eq!(codes, vec!["duplicate-symbol"; 2]);
    });
}

// ============================================================================
// Using
// ============================================================================

#[test]
fn test_using_makes_names_visible_in_file_only() {
    bind(
        &["namespace Lib { model Pet {} }", "using Lib; model A {}", "model B {}"],
        |binder, interner, codes| {
            assert!(codes.is_empty());
            let pet = interner.intern("Pet");
            assert!(binder.resolve(global(1), pet).symbol().is_some());
            assert_eq!(binder.resolve(global(2), pet), ResolutionResult::Unresolved);
        },
    );
}

#[test]
fn test_using_ambiguity() {
    bind(
        &["namespace N1 { model Shared {} } namespace N2 { model Shared {} } using N1; using N2;"],
        |binder, interner, codes| {
            assert!(codes.is_empty());
            match binder.resolve(global(0), interner.intern("Shared")) {
                ResolutionResult::Ambiguous(candidates) => {
                    let names: Vec<_> = candidates.iter().map(|c| binder.full_name(*c)).collect();
                    assert_eq!(names, vec!["N1.Shared", "N2.Shared"]);
                }
                other => panic!("expected ambiguity, got {:?}", other),
            }
        },
    );
}

#[test]
fn test_own_declaration_wins_over_using() {
    bind(&["namespace N1 { model Shared {} } model Shared {} using N1;"], |binder, interner, _| {
        let shared = binder.resolve(global(0), interner.intern("Shared")).symbol().unwrap();
        assert_eq!(binder.full_name(shared), "Shared");
    });
}

#[test]
fn test_using_errors() {
    bind(&["model M {} using Missing; using M;"], |_, _, codes| {
        assert_eq!(codes, vec!["invalid-ref", "using-invalid-ref"]);
    });
}

#[test]
fn test_augments_collected_in_order() {
    bind(&["model A { x: string } @@doc(A, \"one\"); @@doc(A.x, \"two\");"], |binder, _, _| {
        let targets: Vec<_> = binder.augments().iter().map(|(_, a)| a.target.name.to_text()).collect();
        assert_eq!(targets, vec!["A", "A.x"]);
    });
}
