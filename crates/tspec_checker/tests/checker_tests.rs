//! Checker integration tests.
//!
//! Runs the full parse -> bind -> check pipeline over the standard library
//! and the given sources, and inspects the resulting graph and diagnostics.

use bumpalo::Bump;
use tspec_ast::types::SourceFileId;
use tspec_binder::Binder;
use tspec_checker::stdlib;
use tspec_checker::utils::{is_template_declaration, is_template_instance};
use tspec_checker::{Checker, ModuleRecord, StateValue, TypeGraph, TypeId, TypeKind, ValueKind};
use tspec_core::intern::StringInterner;
use tspec_diagnostics::{Diagnostic, Severity};
use tspec_parser::Parser;

/// Helper: check `source` with extra decorator modules registered.
fn check_with(source: &str, modules: &[ModuleRecord]) -> (TypeGraph, Vec<Diagnostic>) {
    let arena = Bump::new();
    let interner = StringInterner::new();
    let mut binder = Binder::new(&interner);
    let mut diagnostics = Vec::new();
    let files = [(stdlib::STD_LIBRARY_PATH, stdlib::STD_LIBRARY_SOURCE), ("main.tsp", source)];
    for (index, (name, text)) in files.into_iter().enumerate() {
        let mut parser = Parser::new(&arena, &interner, SourceFileId(index as u32), name, text);
        let file = parser.parse_source_file();
        diagnostics.extend(parser.take_diagnostics().into_diagnostics());
        binder.bind_source_file(file);
    }
    binder.finish();
    let mut checker = Checker::new(binder);
    for module in modules {
        checker.register_module(module);
    }
    checker.check_program();
    let (graph, checked) = checker.finish();
    diagnostics.extend(checked.into_diagnostics());
    (graph, diagnostics)
}

fn check(source: &str) -> (TypeGraph, Vec<Diagnostic>) {
    check_with(source, &[])
}

fn codes(diagnostics: &[Diagnostic]) -> Vec<&'static str> {
    diagnostics.iter().map(|d| d.code).collect()
}

fn messages(diagnostics: &[Diagnostic]) -> Vec<String> {
    diagnostics.iter().map(|d| d.message.clone()).collect()
}

fn assert_clean(source: &str) -> TypeGraph {
    let (graph, diagnostics) = check(source);
    assert!(diagnostics.is_empty(), "source: {}\ndiagnostics: {:?}", source, messages(&diagnostics));
    graph
}

fn find(graph: &TypeGraph, path: &str) -> TypeId {
    graph.find(path).unwrap_or_else(|| panic!("{} not found", path))
}

fn property_type(graph: &TypeGraph, path: &str) -> TypeId {
    graph.table().property(find(graph, path)).unwrap().type_id
}

// ============================================================================
// Standard library
// ============================================================================

#[test]
fn test_std_types_registered() {
    let graph = assert_clean("");
    for name in ["string", "int32", "boolean", "numeric", "Array", "Record"] {
        assert!(graph.get_std_type(name).is_some(), "{}", name);
    }
    let int8 = graph.get_std_type("int8").unwrap();
    let integer = graph.get_std_type("integer").unwrap();
    assert!(graph.is_type_assignable_to(int8, integer));
    assert!(!graph.is_type_assignable_to(integer, int8));
}

// ============================================================================
// Heritage
// ============================================================================

#[test]
fn test_derived_models_in_check_order() {
    let graph = assert_clean(
        "model Pet {}
         model TPet<T> extends Pet { t: T }
         model Cat extends TPet<string> {}
         model Dog extends Pet {}",
    );
    let table = graph.table();
    let pet = find(&graph, "Pet");
    let derived = &table.model(pet).unwrap().derived_models;
    assert_eq!(derived.len(), 3);
    assert_eq!(derived[0], find(&graph, "TPet"));
    assert!(is_template_declaration(table, derived[0]));
    assert!(is_template_instance(table, derived[1]));
    assert_eq!(derived[2], find(&graph, "Dog"));

    let cat = find(&graph, "Cat");
    assert_eq!(table.model(cat).unwrap().base_model, Some(derived[1]));
    assert_eq!(graph.type_name(derived[1]), "TPet<string>");
}

#[test]
fn test_is_copies_base_and_properties() {
    let graph = assert_clean(
        "model A { a: string }
         model B extends A { b: int32 }
         model C is B {}",
    );
    let table = graph.table();
    let (a, b, c) = (find(&graph, "A"), find(&graph, "B"), find(&graph, "C"));
    let c_model = table.model(c).unwrap();
    assert_eq!(c_model.base_model, Some(a));
    assert_eq!(c_model.source_model, Some(b));
    assert_eq!(table.model(a).unwrap().derived_models, vec![b, c]);
    let copied = c_model.properties["b"];
    assert_eq!(table.property(copied).unwrap().source_property, Some(find(&graph, "B.b")));
    assert_eq!(table.property(copied).unwrap().model, Some(c));
}

#[test]
fn test_self_referencing_is_reported_once() {
    let (_, diagnostics) = check("model A<T> is A<T> {}");
    assert_eq!(codes(&diagnostics), vec!["circular-base-type"]);
}

#[test]
fn test_circular_extends() {
    let (_, diagnostics) = check("model A extends B {} model B extends A {}");
    assert_eq!(codes(&diagnostics), vec!["circular-base-type"]);
    assert_eq!(diagnostics[0].message, "Type 'A' recursively references itself as a base type.");
}

#[test]
fn test_circular_extends_through_alias() {
    for source in [
        "model A extends B {} alias B = A;",
        "alias B = A; model A extends B {}",
        "alias B = A; model A is B {}",
    ] {
        let (_, diagnostics) = check(source);
        assert_eq!(codes(&diagnostics), vec!["circular-base-type"], "source: {}", source);
        assert_eq!(diagnostics[0].message, "Type 'A' recursively references itself as a base type.");
    }
}

#[test]
fn test_circular_scalar_through_alias() {
    let (_, diagnostics) = check("alias S = s; scalar s extends S;");
    assert_eq!(codes(&diagnostics), vec!["circular-base-type"]);
}

#[test]
fn test_property_override_mismatches() {
    let (_, diagnostics) = check(
        "model Base { a: string; b: int32 }
         model Child extends Base { a: int32; b?: int32 }",
    );
    assert_eq!(
        messages(&diagnostics),
        vec![
            "Model has an inherited property named a of type int32 which cannot override type string".to_string(),
            "Model has a required inherited property named b which cannot be overridden as optional".to_string(),
        ]
    );
}

#[test]
fn test_compatible_override_is_accepted() {
    assert_clean("model Base { a: numeric } model Child extends Base { a: int32 }");
}

#[test]
fn test_duplicate_property() {
    let (_, diagnostics) = check("model M { a: string; a: int32 }");
    assert_eq!(codes(&diagnostics), vec!["duplicate-property"]);
}

#[test]
fn test_extends_non_model() {
    let (_, diagnostics) = check("scalar S; model M extends S {} model N is S {}");
    assert_eq!(
        messages(&diagnostics),
        vec!["Models must extend other models.".to_string(), "Model `is` must specify another model.".to_string()]
    );
}

#[test]
fn test_spread_copies_properties() {
    let graph = assert_clean("model A { a: string } model B { ...A; b: int32 }");
    let table = graph.table();
    let b = table.model(find(&graph, "B")).unwrap();
    assert_eq!(b.properties.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(table.property(b.properties["a"]).unwrap().source_property, Some(find(&graph, "A.a")));
}

#[test]
fn test_spread_copy_is_decorated_independently() {
    let graph = assert_clean(
        r#"model Base { @doc("original") p: string }
           model S { ...Base }
           @@doc(S.p, "copy");"#,
    );
    assert_eq!(stdlib::get_doc(&graph, find(&graph, "Base.p")), Some("original"));
    assert_eq!(stdlib::get_doc(&graph, find(&graph, "S.p")), Some("copy"));

    let graph = assert_clean(r#"model Base { p: string } model S { ...Base } @@doc(S.p, "copy");"#);
    assert_eq!(stdlib::get_doc(&graph, find(&graph, "Base.p")), None);
}

#[test]
fn test_spread_errors() {
    let (_, diagnostics) = check("model C { ...C } scalar S; model D { ...S }");
    assert_eq!(
        messages(&diagnostics),
        vec![
            "Cannot spread type within its own declaration.".to_string(),
            "Cannot spread properties of non-model type.".to_string(),
        ]
    );
}

#[test]
fn test_intersection_duplicate_property() {
    let (_, diagnostics) = check("alias X = { a: string } & { a: int32 };");
    assert_eq!(codes(&diagnostics), vec!["intersect-duplicate-property"]);

    let (_, diagnostics) = check("alias X = { a: string } & { a?: string };");
    assert_eq!(codes(&diagnostics), vec!["intersect-duplicate-property"]);
}

#[test]
fn test_intersection_merges_compatible_properties() {
    let graph = assert_clean("model A { a: string; b: int32 } model B { a: string } alias X = A & B; model M { x: X }");
    let table = graph.table();
    let merged = table.model(property_type(&graph, "M.x")).unwrap();
    assert_eq!(merged.properties.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(table.property(merged.properties["a"]).unwrap().source_property, Some(find(&graph, "A.a")));
}

#[test]
fn test_array_and_record_indexers() {
    let graph = assert_clean("model M { list: string[]; map: Record<int32> }");
    let table = graph.table();
    let string = graph.get_std_type("string").unwrap();
    let int32 = graph.get_std_type("int32").unwrap();
    assert_eq!(table.array_element(property_type(&graph, "M.list")), Some(string));
    assert_eq!(table.record_element(property_type(&graph, "M.map")), Some(int32));
}

#[test]
fn test_scalar_heritage() {
    let graph = assert_clean("scalar myString extends string;");
    let table = graph.table();
    let my_string = find(&graph, "myString");
    let string = graph.get_std_type("string").unwrap();
    assert_eq!(table.scalar(my_string).unwrap().base_scalar, Some(string));
    assert!(table.scalar(string).unwrap().derived_scalars.contains(&my_string));

    let (_, diagnostics) = check("model M {} scalar S extends M;");
    assert_eq!(codes(&diagnostics), vec!["extend-scalar"]);
}

#[test]
fn test_enum_members_and_spread() {
    let graph = assert_clean(r#"enum E { a: "x", b: 2 } enum F { ...E, c }"#);
    let table = graph.table();
    let f = table.enum_type(find(&graph, "F")).unwrap();
    assert_eq!(f.members.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    let a = table.enum_member(f.members["a"]).unwrap();
    assert_eq!(a.source_member, Some(find(&graph, "E.a")));
    assert!(matches!(&a.value, Some(tspec_checker::EnumMemberValue::String(s)) if s == "x"));
}

#[test]
fn test_enum_duplicate_reported_once() {
    let (_, diagnostics) = check("enum A { A, A }");
    assert_eq!(codes(&diagnostics), vec!["enum-member-duplicate"]);
}

#[test]
fn test_union_duplicate_variant() {
    let (_, diagnostics) = check("union U { a: string, a: int32 }");
    assert_eq!(messages(&diagnostics), vec!["Union already has a variant named a".to_string()]);
}

#[test]
fn test_interface_extends_and_duplicates() {
    let graph = assert_clean("interface A { x(): void; } interface B extends A { y(): string; }");
    let table = graph.table();
    let b = find(&graph, "B");
    let ops = &table.interface(b).unwrap().operations;
    assert_eq!(ops.keys().collect::<Vec<_>>(), vec!["x", "y"]);
    assert_eq!(table.operation(ops["x"]).unwrap().interface, Some(b));

    let (_, diagnostics) = check("interface A { x(): void; x(): void; }");
    assert_eq!(codes(&diagnostics), vec!["interface-duplicate"]);
}

#[test]
fn test_operation_signature_reuse() {
    let graph = assert_clean("op a(x: string): int32; op b is a;");
    let table = graph.table();
    let b = table.operation(find(&graph, "b")).unwrap();
    assert_eq!(b.source_operation, Some(find(&graph, "a")));
    assert_eq!(b.return_type, graph.get_std_type("int32").unwrap());
    assert!(table.model(b.parameters).unwrap().properties.contains_key("x"));

    let (_, diagnostics) = check("op c is c;");
    assert_eq!(codes(&diagnostics), vec!["circular-op-signature"]);
}

// ============================================================================
// References and templates
// ============================================================================

#[test]
fn test_unknown_identifier() {
    let (_, diagnostics) = check("model M { a: Missing }");
    assert_eq!(messages(&diagnostics), vec!["Unknown identifier Missing".to_string()]);
}

#[test]
fn test_ambiguous_using() {
    let (_, diagnostics) = check(
        "namespace A { model X {} }
         namespace B { model X {} }
         using A;
         using B;
         model M { x: X }",
    );
    assert_eq!(codes(&diagnostics), vec!["ambiguous-symbol"]);
}

#[test]
fn test_template_instances_are_cached() {
    let graph = assert_clean("model Foo<T> { t: T } model M { a: Foo<string>; b: Foo<string>; c: Foo<int32> }");
    let a = property_type(&graph, "M.a");
    assert_eq!(a, property_type(&graph, "M.b"));
    assert_ne!(a, property_type(&graph, "M.c"));
    let t = graph.table().find_property(a, "t").unwrap();
    assert_eq!(graph.table().property(t).unwrap().type_id, graph.get_std_type("string").unwrap());
}

#[test]
fn test_template_argument_errors() {
    let (_, diagnostics) = check("model Foo<T> {} model M { a: Foo; b: Foo<string, int32> } model N {} alias X = N<string>;");
    assert_eq!(
        messages(&diagnostics),
        vec![
            "Template argument 'T' is required and not specified.".to_string(),
            "Too many template arguments.".to_string(),
            "Can't pass template arguments to non-templated type".to_string(),
        ]
    );
}

#[test]
fn test_template_defaults_and_named_arguments() {
    let graph = assert_clean("model Foo<A, B = A> { a: A; b: B } model M { x: Foo<string>; y: Foo<B = int32, A = string> }");
    let string = graph.get_std_type("string").unwrap();
    let int32 = graph.get_std_type("int32").unwrap();
    let table = graph.table();
    let x = property_type(&graph, "M.x");
    let y = property_type(&graph, "M.y");
    let b_of = |model: TypeId| table.property(table.find_property(model, "b").unwrap()).unwrap().type_id;
    assert_eq!(b_of(x), string);
    assert_eq!(b_of(y), int32);
}

#[test]
fn test_template_constraint() {
    let (_, diagnostics) = check("model Foo<T extends string> {} alias X = Foo<int32>;");
    assert_eq!(
        messages(&diagnostics),
        vec!["Argument of type 'int32' is not assignable to parameter of type 'string'".to_string()]
    );
    assert_clean("model Foo<T extends string> {} scalar myString extends string; alias X = Foo<myString>;");
}

#[test]
fn test_value_template_arguments() {
    assert_clean(r#"model Foo<V extends valueof string> {} alias X = Foo<"abc">;"#);
    assert_clean(r#"model Foo<T extends string | valueof string> {} alias X = Foo<"a">; alias Y = Foo<string>;"#);
    let (_, diagnostics) = check("model Foo<V extends valueof string> {} alias X = Foo<string>;");
    assert_eq!(codes(&diagnostics), vec!["expect-value"]);
}

#[test]
fn test_circular_alias_and_const() {
    let (_, diagnostics) = check("alias A = B; alias B = A;");
    assert_eq!(codes(&diagnostics), vec!["circular-alias-type"]);
    let (_, diagnostics) = check("const a = b; const b = a;");
    assert_eq!(codes(&diagnostics), vec!["circular-const"]);
}

#[test]
fn test_member_references() {
    let graph = assert_clean("model A { a: string } enum E { x } op o(p: int32): string; alias P = A.a; alias R = o::returnType; model M { e: E.x }");
    let e = property_type(&graph, "M.e");
    assert_eq!(e, find(&graph, "E.x"));
}

// ============================================================================
// Values and defaults
// ============================================================================

#[test]
fn test_ambiguous_scalar_default() {
    let (_, diagnostics) = check("scalar myBoolean extends boolean; model M { a: boolean | myBoolean = true }");
    assert_eq!(
        messages(&diagnostics),
        vec!["Value true type is ambiguous between boolean, myBoolean. To resolve be explicit when instantiating this value(e.g. 'boolean(true)').".to_string()]
    );
}

#[test]
fn test_ambiguous_scalar_const() {
    let (_, diagnostics) = check("scalar myBoolean extends boolean; const a: boolean | myBoolean = true;");
    assert_eq!(codes(&diagnostics), vec!["ambiguous-scalar-type"]);
    assert!(diagnostics[0].message.starts_with("Value true type is ambiguous between boolean, myBoolean."));
}

#[test]
fn test_default_out_of_range() {
    let (_, diagnostics) = check("scalar S extends int8; model M { a: S = 9999 }");
    assert_eq!(messages(&diagnostics), vec!["Type '9999' is not assignable to type 'S'".to_string()]);
}

#[test]
fn test_default_value_recorded() {
    let graph = assert_clean("model M { a: int32 = 42; b: string = \"x\" }");
    let table = graph.table();
    let a = table.property(find(&graph, "M.a")).unwrap();
    let value = graph.value(a.default_value.unwrap());
    assert!(matches!(&value.kind, ValueKind::Numeric(n) if n.to_string() == "42"));
    assert_eq!(value.scalar, graph.get_std_type("int32"));
}

#[test]
fn test_object_value_defaults() {
    assert_clean("model P { a: string; b?: int32 } model M { p: P = #{ a: \"x\" } }");
    let (_, diagnostics) = check("model P { a: string } model M { p: P = #{ b: 1 } }");
    assert_eq!(codes(&diagnostics), vec!["missing-property"]);
}

#[test]
fn test_scalar_constructors() {
    assert_clean("const a = int8(12); model M { x: int8 = int8(100) }");
    let (_, diagnostics) = check("const a = int8(300);");
    assert_eq!(messages(&diagnostics), vec!["Type '300' is not assignable to type 'int8'".to_string()]);
    let (_, diagnostics) = check("const a = int8(\"a\");");
    assert_eq!(
        messages(&diagnostics),
        vec!["Expected a single argument of type NumericValue but got StringValue.".to_string()]
    );
    let (_, diagnostics) = check("model M {} const a = M(1);");
    assert_eq!(codes(&diagnostics), vec!["non-callable"]);
}

#[test]
fn test_const_type_annotation() {
    assert_clean("const a: string = \"x\";");
    let (_, diagnostics) = check("const a: int32 = \"x\";");
    assert_eq!(messages(&diagnostics), vec!["Type '\"x\"' is not assignable to type 'int32'".to_string()]);
}

#[test]
fn test_string_template_value() {
    let graph = assert_clean(r#"model M { p: string = "Start ${123} end" }"#);
    let prop = graph.table().property(find(&graph, "M.p")).unwrap();
    let value = graph.value(prop.default_value.unwrap());
    assert!(matches!(&value.kind, ValueKind::String(s) if s == "Start 123 end"));
}

#[test]
fn test_string_template_type() {
    let graph = assert_clean(r#"model M { p: "a${string}b" }"#);
    let p = property_type(&graph, "M.p");
    match &graph.get(p).kind {
        TypeKind::StringTemplate(template) => {
            assert_eq!(template.spans.len(), 3);
            let interpolated: Vec<bool> = template.spans.iter().map(|s| s.is_interpolated).collect();
            assert_eq!(interpolated, vec![false, true, false]);
            assert_eq!(template.spans[1].type_id, graph.get_std_type("string").unwrap());
            assert!(template.string_value.is_none());
        }
        other => panic!("expected string template, got {:?}", other),
    }
}

#[test]
fn test_mixed_string_template() {
    let (_, diagnostics) = check(r#"const a = "x"; alias B = "${a} ${string}";"#);
    assert_eq!(codes(&diagnostics), vec!["mixed-string-template"]);
}

// ============================================================================
// Decorators
// ============================================================================

#[test]
fn test_std_decorators() {
    let graph = assert_clean(r#"@doc("hi") model Widget { @minValue(1) count: int32 }"#);
    let widget = find(&graph, "Widget");
    assert_eq!(graph.get(widget).decorators.len(), 1);
    assert_eq!(stdlib::get_doc(&graph, widget), Some("hi"));
    let count = find(&graph, "Widget.count");
    assert_eq!(stdlib::get_min_value(&graph, count).map(|n| n.to_string()), Some("1".to_string()));
}

#[test]
fn test_decorator_wrong_target() {
    let (_, diagnostics) = check(r#"@tag("x") model M {}"#);
    assert_eq!(codes(&diagnostics), vec!["decorator-wrong-target"]);
    assert!(diagnostics[0].message.starts_with("Cannot apply @tag decorator to M"));
}

#[test]
fn test_decorator_argument_errors() {
    let (_, diagnostics) = check("@doc() model A {} @doc(123) model B {} @nope model C {}");
    assert_eq!(
        messages(&diagnostics),
        vec![
            "Expected 1 arguments, but got 0.".to_string(),
            "Argument of type '123' is not assignable to parameter of type 'string'".to_string(),
            "Unknown decorator @nope".to_string(),
        ]
    );
}

#[test]
fn test_all_tags_walks_namespaces_and_interface() {
    let graph = assert_clean(
        r#"@tag("ns") namespace Svc {
             @tag("iface") interface I { @tag("op") @tag("ns") read(): void; }
           }"#,
    );
    let read = find(&graph, "Svc.I.read");
    assert_eq!(stdlib::get_tags(&graph, read), ["op".to_string(), "ns".to_string()]);
    assert_eq!(
        stdlib::get_all_tags(&graph, read),
        Some(vec!["ns".to_string(), "iface".to_string(), "op".to_string()])
    );
}

#[test]
fn test_augment_applies_to_one_instance() {
    let graph = assert_clean(
        r#"model Foo<T> { t: T }
           model A { a: Foo<string> }
           model B { b: Foo<int32> }
           @@doc(Foo<string>, "only string");
           @@doc(A.a, "the a");"#,
    );
    assert_eq!(stdlib::get_doc(&graph, property_type(&graph, "A.a")), Some("only string"));
    assert_eq!(stdlib::get_doc(&graph, property_type(&graph, "B.b")), None);
    assert_eq!(stdlib::get_doc(&graph, find(&graph, "A.a")), Some("the a"));
}

#[test]
fn test_decorators_skip_template_declarations() {
    let graph = assert_clean(r#"@doc("generic") model Foo<T> {} model M { f: Foo<string> }"#);
    assert_eq!(stdlib::get_doc(&graph, find(&graph, "Foo")), None);
    assert_eq!(stdlib::get_doc(&graph, property_type(&graph, "M.f")), Some("generic"));
}

#[test]
fn test_is_inherits_decorators() {
    let graph = assert_clean(r#"@doc("base") model A {} model B is A {}"#);
    assert_eq!(stdlib::get_doc(&graph, find(&graph, "B")), Some("base"));
}

#[test]
fn test_extern_without_implementation_warns() {
    let (_, diagnostics) = check("extern dec custom(target: unknown); @custom model M {}");
    assert_eq!(codes(&diagnostics), vec!["missing-implementation"]);
    assert_eq!(diagnostics[0].severity, Severity::Warning);
}

#[test]
fn test_registered_module_decorator() {
    let module = ModuleRecord::new("lib/marks.js")
        .in_namespace("Marks")
        .with_decorator("mark", |ctx, target, args| {
            let label = ctx.string_arg(args, 0).unwrap_or_default();
            ctx.state().set("mark", target, StateValue::String(label));
        });
    let (graph, diagnostics) = check_with(
        r#"namespace Marks { extern dec mark(target: Model, label: valueof string); }
           @Marks.mark("yes") model M {}"#,
        &[module],
    );
    assert!(diagnostics.is_empty(), "{:?}", messages(&diagnostics));
    let m = find(&graph, "M");
    assert_eq!(graph.state().get("mark", m), Some(&StateValue::String("yes".to_string())));
}
