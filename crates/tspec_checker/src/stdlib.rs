//! Implementations of the decorators declared in the standard library, and
//! accessors for the state they record.

use crate::decorators::ModuleRecord;
use crate::numeric::Numeric;
use crate::state::StateValue;
use crate::types::{TypeGraph, TypeId, TypeKind};

pub const DOC_KEY: &str = "doc";
pub const SUMMARY_KEY: &str = "summary";
pub const TAGS_KEY: &str = "tags";
pub const MIN_VALUE_KEY: &str = "minValue";
pub const MAX_VALUE_KEY: &str = "maxValue";

/// Source of the standard library declarations, loaded before user files.
pub const STD_LIBRARY_SOURCE: &str = include_str!("../lib/std.tsp");

/// Virtual path the standard library is loaded from.
pub const STD_LIBRARY_PATH: &str = "tspec:std/main.tsp";

pub fn std_module() -> ModuleRecord {
    ModuleRecord::new("tspec:std")
        .in_namespace(tspec_binder::STD_NAMESPACE)
        .with_decorator("doc", |ctx, target, args| {
            if let Some(text) = ctx.string_arg(args, 0) {
                ctx.state().set(DOC_KEY, target, StateValue::String(text));
            }
        })
        .with_decorator("summary", |ctx, target, args| {
            if let Some(text) = ctx.string_arg(args, 0) {
                ctx.state().set(SUMMARY_KEY, target, StateValue::String(text));
            }
        })
        .with_decorator("tag", |ctx, target, args| {
            if let Some(tag) = ctx.string_arg(args, 0) {
                ctx.state().push(TAGS_KEY, target, tag);
            }
        })
        .with_decorator("minValue", |ctx, target, args| {
            if let Some(value) = ctx.numeric_arg(args, 0) {
                ctx.state().set(MIN_VALUE_KEY, target, StateValue::Numeric(value));
            }
        })
        .with_decorator("maxValue", |ctx, target, args| {
            if let Some(value) = ctx.numeric_arg(args, 0) {
                ctx.state().set(MAX_VALUE_KEY, target, StateValue::Numeric(value));
            }
        })
}

pub fn get_doc(graph: &TypeGraph, target: TypeId) -> Option<&str> {
    graph.state().get(DOC_KEY, target)?.as_str()
}

pub fn get_summary(graph: &TypeGraph, target: TypeId) -> Option<&str> {
    graph.state().get(SUMMARY_KEY, target)?.as_str()
}

/// Tags applied directly to `target`.
pub fn get_tags(graph: &TypeGraph, target: TypeId) -> &[String] {
    graph
        .state()
        .get(TAGS_KEY, target)
        .and_then(|v| v.as_list())
        .unwrap_or(&[])
}

pub fn get_min_value(graph: &TypeGraph, target: TypeId) -> Option<&Numeric> {
    graph.state().get(MIN_VALUE_KEY, target)?.as_numeric()
}

pub fn get_max_value(graph: &TypeGraph, target: TypeId) -> Option<&Numeric> {
    graph.state().get(MAX_VALUE_KEY, target)?.as_numeric()
}

/// Tags of `target` together with those of its enclosing namespaces
/// (outermost first) and, for an operation, its interface. Duplicates are
/// dropped. `None` when nothing is tagged.
pub fn get_all_tags(graph: &TypeGraph, target: TypeId) -> Option<Vec<String>> {
    let ty = graph.get(target);
    let (interface, namespace) = match &ty.kind {
        TypeKind::Operation(op) => match op.interface {
            Some(interface) => (Some(interface), graph.get(interface).namespace()),
            None => (None, op.namespace),
        },
        _ => (None, ty.namespace()),
    };

    let mut chain = Vec::new();
    let mut current = namespace;
    while let Some(ns) = current {
        chain.push(ns);
        current = graph.get(ns).namespace();
    }
    chain.reverse();
    chain.extend(interface);
    chain.push(target);

    let mut tags: Vec<String> = Vec::new();
    for id in chain {
        for tag in get_tags(graph, id) {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
    }
    (!tags.is_empty()).then_some(tags)
}
