//! Parser integration tests.
//!
//! Verifies that the parser builds the expected syntax trees from tspec source.

use bumpalo::Bump;
use tspec_ast::node::*;
use tspec_ast::types::SourceFileId;
use tspec_core::intern::StringInterner;
use tspec_parser::Parser;

/// Helper: parse source text, run `f` over the tree and the diagnostic codes.
fn parse<T>(source: &str, f: impl FnOnce(&SourceFile<'_>, Vec<&'static str>) -> T) -> T {
    let arena = Bump::new();
    let interner = StringInterner::new();
    let mut parser = Parser::new(&arena, &interner, SourceFileId(0), "test.tsp", source);
    let file = parser.parse_source_file();
    let codes = parser.take_diagnostics().diagnostics().iter().map(|d| d.code).collect();
    f(file, codes)
}

/// Helper: assert that parsing produces the expected number of top-level statements.
fn assert_statement_count(source: &str, expected: usize) {
    parse(source, |file, codes| {
        assert_eq!(file.statements.len(), expected, "source: {}", source);
        assert!(codes.is_empty(), "source: {} diagnostics: {:?}", source, codes);
    });
}

fn first_alias_value<'a>(file: &SourceFile<'a>) -> Expression<'a> {
    match file.statements[0] {
        Statement::Alias(alias) => alias.value,
        other => panic!("expected alias, got {:?}", other.kind()),
    }
}

// ============================================================================
// Declarations
// ============================================================================

#[test]
fn test_parse_empty_file() {
    assert_statement_count("", 0);
}

#[test]
fn test_parse_model_declaration() {
    parse("model Pet { name: string; age?: int32 = 1; ...Base }", |file, codes| {
        assert!(codes.is_empty());
        let Statement::Model(model) = file.statements[0] else {
            panic!("expected model");
        };
        assert_eq!(model.id.text_name, "Pet");
        assert_eq!(model.properties.len(), 3);
        let ModelMember::Property(age) = model.properties[1] else {
            panic!("expected property");
        };
        assert!(age.optional);
        assert!(age.default.is_some());
        assert!(matches!(model.properties[2], ModelMember::Spread(_)));
    });
}

#[test]
fn test_parse_model_heritage() {
    parse("model A<T> extends B<T> {} model C is D[];", |file, codes| {
        assert!(codes.is_empty());
        let Statement::Model(a) = file.statements[0] else { panic!() };
        assert_eq!(a.template_parameters.len(), 1);
        assert!(matches!(a.extends, Some(Expression::Reference(r)) if r.arguments.len() == 1));
        let Statement::Model(c) = file.statements[1] else { panic!() };
        assert!(matches!(c.is, Some(Expression::Array(_))));
        assert!(c.properties.is_empty());
    });
}

#[test]
fn test_parse_keyword_property_names() {
    parse("model A { model: string, \"quoted name\": int32 }", |file, codes| {
        assert!(codes.is_empty());
        let Statement::Model(model) = file.statements[0] else { panic!() };
        let names: Vec<_> = model
            .properties
            .iter()
            .map(|p| match p {
                ModelMember::Property(p) => p.id.text_name,
                ModelMember::Spread(_) => "",
            })
            .collect();
        assert_eq!(names, vec!["model", "quoted name"]);
    });
}

#[test]
fn test_parse_scalar_enum_union() {
    assert_statement_count(
        r#"
        scalar S extends int8;
        enum E { A, B: "b", ...Other }
        union U { a: string, int32, "lit" }
        "#,
        3,
    );
}

#[test]
fn test_parse_union_variants() {
    parse("union U { a: string, int32 }", |file, _| {
        let Statement::Union(union) = file.statements[0] else { panic!() };
        assert_eq!(union.variants[0].id.map(|id| id.text_name), Some("a"));
        assert!(union.variants[1].id.is_none());
    });
}

#[test]
fn test_parse_interface_and_operations() {
    parse(
        "interface I extends A, B { list(): string[]; op get(id: string): Pet; other is get; } op top is get;",
        |file, codes| {
            assert!(codes.is_empty(), "{:?}", codes);
            let Statement::Interface(iface) = file.statements[0] else { panic!() };
            assert_eq!(iface.extends.len(), 2);
            assert_eq!(iface.operations.len(), 3);
            assert!(matches!(iface.operations[2].signature, OperationSignature::Reference(_)));
            let OperationSignature::Declaration { parameters, .. } = iface.operations[1].signature else {
                panic!()
            };
            assert_eq!(parameters.properties.len(), 1);
        },
    );
}

#[test]
fn test_parse_decorators() {
    parse("@doc(\"pet\") @tag(\"a\") model Pet { @minValue(1) n: int32 }", |file, codes| {
        assert!(codes.is_empty());
        let Statement::Model(model) = file.statements[0] else { panic!() };
        assert_eq!(model.decorators.len(), 2);
        assert_eq!(model.decorators[0].target.to_text(), "doc");
        assert_eq!(model.decorators[0].arguments.len(), 1);
        let ModelMember::Property(n) = model.properties[0] else { panic!() };
        assert_eq!(n.decorators.len(), 1);
    });
}

#[test]
fn test_parse_decorator_declaration() {
    parse(
        "extern dec tag(target: Namespace | Interface, value: valueof string, ...rest: valueof string[]);",
        |file, codes| {
            assert!(codes.is_empty(), "{:?}", codes);
            let Statement::DecoratorDeclaration(dec) = file.statements[0] else { panic!() };
            assert_eq!(dec.id.text_name, "tag");
            assert_eq!(dec.target.id.text_name, "target");
            assert_eq!(dec.parameters.len(), 2);
            assert!(dec.parameters[1].rest);
        },
    );
}

#[test]
fn test_parse_augment_decorator() {
    parse("@@doc(Spread.one, \"override\");", |file, codes| {
        assert!(codes.is_empty());
        let Statement::AugmentDecorator(aug) = file.statements[0] else { panic!() };
        assert_eq!(aug.decorator.to_text(), "doc");
        assert_eq!(aug.target.name.to_text(), "Spread.one");
        assert_eq!(aug.arguments.len(), 1);
    });
}

#[test]
fn test_parse_namespaces() {
    parse("namespace A.B { model M {} namespace C {} }", |file, _| {
        let Statement::Namespace(ns) = file.statements[0] else { panic!() };
        assert_eq!(ns.path.len(), 2);
        assert_eq!(ns.statements.len(), 2);
        assert!(!ns.blockless);
    });
}

#[test]
fn test_parse_blockless_namespace_owns_rest_of_file() {
    parse("import \"./a.tsp\"; namespace Lib; model A {} model B {}", |file, codes| {
        assert!(codes.is_empty());
        assert_eq!(file.statements.len(), 2);
        let Statement::Namespace(ns) = file.statements[1] else { panic!() };
        assert!(ns.blockless);
        assert_eq!(ns.statements.len(), 2);
    });
}

#[test]
fn test_blockless_namespace_after_declaration() {
    parse("model A {} namespace Lib;", |_, codes| {
        assert_eq!(codes, vec!["blockless-namespace-first"]);
    });
}

#[test]
fn test_parse_using_alias_const() {
    assert_statement_count("using A.B; alias X<T> = T | string; const c: int8 = 12;", 3);
}

// ============================================================================
// Expressions
// ============================================================================

#[test]
fn test_union_and_intersection_precedence() {
    parse("alias X = A & B | C;", |file, _| {
        let Expression::Union(union) = first_alias_value(file) else { panic!() };
        assert_eq!(union.options.len(), 2);
        assert!(matches!(union.options[0], Expression::Intersection(_)));
    });
}

#[test]
fn test_leading_union_bar() {
    parse("alias X = | \"a\" | \"b\";", |file, codes| {
        assert!(codes.is_empty());
        let Expression::Union(union) = first_alias_value(file) else { panic!() };
        assert_eq!(union.options.len(), 2);
    });
}

#[test]
fn test_parenthesized_valueof() {
    parse("alias X = (valueof string) | string;", |file, codes| {
        assert!(codes.is_empty());
        let Expression::Union(union) = first_alias_value(file) else { panic!() };
        assert!(matches!(union.options[0], Expression::ValueOf(_)));
    });
}

#[test]
fn test_string_template_spans() {
    parse(r#"alias X = "Start ${123} middle ${Foo} end";"#, |file, codes| {
        assert!(codes.is_empty(), "{:?}", codes);
        let Expression::StringTemplate(template) = first_alias_value(file) else { panic!() };
        assert_eq!(template.head, "Start ");
        assert_eq!(template.spans.len(), 2);
        assert_eq!(template.spans[0].literal, " middle ");
        assert_eq!(template.spans[1].literal, " end");
        assert!(matches!(template.spans[0].expression, Expression::NumericLiteral(_)));
    });
}

#[test]
fn test_value_literals_and_calls() {
    parse("const v = #{ a: 1, b: #[true, null], ...Base }; const n = int8(12);", |file, codes| {
        assert!(codes.is_empty(), "{:?}", codes);
        let Statement::Const(v) = file.statements[0] else { panic!() };
        let Expression::ObjectLiteral(object) = v.value else { panic!() };
        assert_eq!(object.properties.len(), 3);
        let Statement::Const(n) = file.statements[1] else { panic!() };
        assert!(matches!(n.value, Expression::Call(call) if call.arguments.len() == 1));
    });
}

#[test]
fn test_named_template_arguments() {
    parse("alias X = Foo<T = string, int32>;", |file, _| {
        let Expression::Reference(reference) = first_alias_value(file) else { panic!() };
        assert_eq!(reference.arguments[0].name.map(|n| n.text_name), Some("T"));
        assert!(reference.arguments[1].name.is_none());
    });
}

#[test]
fn test_tuple_and_model_expression() {
    parse("alias X = [string, { a: int32 }][];", |file, _| {
        let Expression::Array(array) = first_alias_value(file) else { panic!() };
        assert!(matches!(array.element, Expression::Tuple(t) if t.values.len() == 2));
    });
}

// ============================================================================
// Error recovery
// ============================================================================

#[test]
fn test_recovery_skips_to_next_statement() {
    parse("model A { x: string } ~~~ garbage model B {}", |file, codes| {
        assert!(!codes.is_empty());
        let models = file.statements.iter().filter(|s| matches!(s, Statement::Model(_))).count();
        assert_eq!(models, 2);
    });
}

#[test]
fn test_missing_identifier() {
    parse("model { }", |_, codes| {
        assert_eq!(codes, vec!["token-expected"]);
    });
}
