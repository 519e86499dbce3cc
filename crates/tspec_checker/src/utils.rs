//! Queries over a checked type graph.

use crate::types::{TypeId, TypeKind, TypeTable};

pub fn is_template_declaration(table: &TypeTable, id: TypeId) -> bool {
    table.get(id).template_declaration
}

/// A type created from a template with every parameter bound to a
/// concrete argument.
pub fn is_template_instance(table: &TypeTable, id: TypeId) -> bool {
    let ty = table.get(id);
    !ty.template_declaration && ty.template_mapper.as_ref().is_some_and(|m| !m.partial)
}

pub fn is_array_model_type(table: &TypeTable, id: TypeId) -> bool {
    table.array_element(id).is_some()
}

pub fn is_record_model_type(table: &TypeTable, id: TypeId) -> bool {
    table.record_element(id).is_some()
}

/// Whether `id` is declared in `namespace`, or in one of its nested
/// namespaces when `recursive` is set. Members are placed by their parent.
pub fn is_declared_in_namespace(table: &TypeTable, id: TypeId, namespace: TypeId, recursive: bool) -> bool {
    let mut current = declaring_namespace(table, id);
    while let Some(ns) = current {
        if ns == namespace {
            return true;
        }
        if !recursive {
            return false;
        }
        current = table.get(ns).namespace();
    }
    false
}

fn declaring_namespace(table: &TypeTable, id: TypeId) -> Option<TypeId> {
    let ty = table.get(id);
    match &ty.kind {
        TypeKind::ModelProperty(p) => p.model.and_then(|m| declaring_namespace(table, m)),
        TypeKind::EnumMember(m) => declaring_namespace(table, m.enum_type),
        TypeKind::UnionVariant(v) => v.union.and_then(|u| declaring_namespace(table, u)),
        TypeKind::Operation(op) => match op.interface {
            Some(interface) => declaring_namespace(table, interface),
            None => op.namespace,
        },
        _ => ty.namespace(),
    }
}
