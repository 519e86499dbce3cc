//! Human-readable names of types and values, as used in diagnostics.

use crate::types::{Entity, TypeId, TypeKind, TypeTable, ValueId, ValueKind};

const MAX_NAME_DEPTH: u32 = 8;

pub fn type_name(table: &TypeTable, id: TypeId) -> String {
    type_name_at(table, id, 0)
}

pub fn value_name(table: &TypeTable, id: ValueId) -> String {
    value_name_at(table, id, 0)
}

pub fn entity_name(table: &TypeTable, entity: Entity) -> String {
    match entity {
        Entity::Type(id) | Entity::Indeterminate(id) => type_name(table, id),
        Entity::Value(id) => value_name(table, id),
    }
}

/// `A.B.` for a type declared in namespace `A.B`. The standard library
/// namespaces are omitted.
fn namespace_prefix(table: &TypeTable, namespace: Option<TypeId>) -> String {
    let mut parts = Vec::new();
    let mut current = namespace;
    while let Some(ns_id) = current {
        let Some(ns) = table.namespace(ns_id) else {
            break;
        };
        if ns.name.is_empty() {
            break;
        }
        parts.push(ns.name.as_str());
        current = ns.namespace;
    }
    parts.reverse();
    if parts.first() == Some(&"TypeSpec") {
        return String::new();
    }
    parts.iter().map(|p| format!("{}.", p)).collect()
}

pub fn namespace_full_name(table: &TypeTable, id: TypeId) -> String {
    let mut parts = Vec::new();
    let mut current = Some(id);
    while let Some(ns_id) = current {
        let Some(ns) = table.namespace(ns_id) else {
            break;
        };
        if ns.name.is_empty() {
            break;
        }
        parts.push(ns.name.as_str());
        current = ns.namespace;
    }
    parts.reverse();
    parts.join(".")
}

fn template_suffix(table: &TypeTable, id: TypeId, depth: u32) -> String {
    let ty = table.get(id);
    if ty.template_declaration {
        return String::new();
    }
    match &ty.template_mapper {
        Some(mapper) if !mapper.args.is_empty() => {
            let args: Vec<String> = mapper.args.iter().map(|a| entity_name_at(table, *a, depth + 1)).collect();
            format!("<{}>", args.join(", "))
        }
        _ => String::new(),
    }
}

fn entity_name_at(table: &TypeTable, entity: Entity, depth: u32) -> String {
    match entity {
        Entity::Type(id) | Entity::Indeterminate(id) => type_name_at(table, id, depth),
        Entity::Value(id) => value_name_at(table, id, depth),
    }
}

fn type_name_at(table: &TypeTable, id: TypeId, depth: u32) -> String {
    if depth > MAX_NAME_DEPTH {
        return "...".to_string();
    }
    let ty = table.get(id);
    match &ty.kind {
        TypeKind::Intrinsic(name) => name.as_str().to_string(),
        TypeKind::String(s) => format!("\"{}\"", s),
        TypeKind::Number(n) => n.to_string(),
        TypeKind::Boolean(b) => b.to_string(),
        TypeKind::StringTemplate(t) => match &t.string_value {
            Some(value) => format!("\"{}\"", value),
            None => "string template".to_string(),
        },
        TypeKind::Namespace(_) => namespace_full_name(table, id),
        TypeKind::Model(m) => {
            if let Some(element) = table.array_element(id).filter(|_| m.name.is_empty() || m.name == "Array") {
                return format!("{}[]", type_name_at(table, element, depth + 1));
            }
            if m.name.is_empty() {
                let props: Vec<String> = m
                    .properties
                    .values()
                    .map(|p| type_name_at(table, *p, depth + 1))
                    .collect();
                return format!("{{ {} }}", props.join(", "));
            }
            format!(
                "{}{}{}",
                namespace_prefix(table, m.namespace),
                m.name,
                template_suffix(table, id, depth)
            )
        }
        TypeKind::ModelProperty(p) => {
            let owner = match p.model {
                Some(model) if table.model(model).is_some_and(|m| !m.name.is_empty()) => {
                    format!("{}.", type_name_at(table, model, depth + 1))
                }
                _ => String::new(),
            };
            let optional = if p.optional && owner.is_empty() { "?" } else { "" };
            if owner.is_empty() {
                format!("{}{}: {}", p.name, optional, type_name_at(table, p.type_id, depth + 1))
            } else {
                format!("{}{}", owner, p.name)
            }
        }
        TypeKind::Scalar(s) => format!(
            "{}{}{}",
            namespace_prefix(table, s.namespace),
            s.name,
            template_suffix(table, id, depth)
        ),
        TypeKind::Enum(e) => format!("{}{}", namespace_prefix(table, e.namespace), e.name),
        TypeKind::EnumMember(m) => format!("{}.{}", type_name_at(table, m.enum_type, depth + 1), m.name),
        TypeKind::Union(u) => match &u.name {
            Some(name) => format!(
                "{}{}{}",
                namespace_prefix(table, u.namespace),
                name,
                template_suffix(table, id, depth)
            ),
            None => {
                let variants: Vec<String> = u
                    .variants
                    .iter()
                    .map(|v| type_name_at(table, *v, depth + 1))
                    .collect();
                variants.join(" | ")
            }
        },
        TypeKind::UnionVariant(v) => match (&v.name, v.union) {
            (Some(name), Some(union)) if table.union(union).is_some_and(|u| u.name.is_some()) => {
                format!("{}.{}", type_name_at(table, union, depth + 1), name)
            }
            _ => type_name_at(table, v.type_id, depth + 1),
        },
        TypeKind::Interface(i) => format!(
            "{}{}{}",
            namespace_prefix(table, i.namespace),
            i.name,
            template_suffix(table, id, depth)
        ),
        TypeKind::Operation(o) => match o.interface {
            Some(interface) => format!("{}.{}", type_name_at(table, interface, depth + 1), o.name),
            None => format!(
                "{}{}{}",
                namespace_prefix(table, o.namespace),
                o.name,
                template_suffix(table, id, depth)
            ),
        },
        TypeKind::Tuple(t) => {
            let values: Vec<String> = t.values.iter().map(|v| type_name_at(table, *v, depth + 1)).collect();
            format!("[{}]", values.join(", "))
        }
        TypeKind::TemplateParameter(t) => t.name.clone(),
        TypeKind::Decorator(d) => format!("@{}", d.name),
    }
}

fn value_name_at(table: &TypeTable, id: ValueId, depth: u32) -> String {
    if depth > MAX_NAME_DEPTH {
        return "...".to_string();
    }
    match &table.value(id).kind {
        ValueKind::String(s) => format!("\"{}\"", s),
        ValueKind::Numeric(n) => n.to_string(),
        ValueKind::Boolean(b) => b.to_string(),
        ValueKind::Null => "null".to_string(),
        ValueKind::EnumMember(member) => type_name_at(table, *member, depth + 1),
        ValueKind::Array(items) => {
            let items: Vec<String> = items.iter().map(|v| value_name_at(table, *v, depth + 1)).collect();
            format!("#[{}]", items.join(", "))
        }
        ValueKind::Object(props) => {
            let props: Vec<String> = props
                .iter()
                .map(|(name, v)| format!("{}: {}", name, value_name_at(table, *v, depth + 1)))
                .collect();
            format!("#{{{}}}", props.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::Numeric;
    use crate::types::{NamespaceType, ScalarType, UnionType, UnionVariantType};

    #[test]
    fn test_literal_names() {
        let mut table = TypeTable::new();
        let s = table.string_literal("foo");
        let n = table.number_literal(Numeric::parse("9999").unwrap());
        assert_eq!(type_name(&table, s), "\"foo\"");
        assert_eq!(type_name(&table, n), "9999");
        assert_eq!(type_name(&table, table.true_type), "true");
        assert_eq!(type_name(&table, table.void_type), "void");
    }

    #[test]
    fn test_union_expression_name() {
        let mut table = TypeTable::new();
        let foo = table.string_literal("foo");
        let bar = table.string_literal("bar");
        let union = table.add_type(TypeKind::Union(UnionType {
            expression: true,
            ..UnionType::default()
        }));
        let mut variants = Vec::new();
        for ty in [foo, bar] {
            variants.push(table.add_type(TypeKind::UnionVariant(UnionVariantType {
                name: None,
                union: Some(union),
                type_id: ty,
            })));
        }
        if let TypeKind::Union(u) = &mut table.get_mut(union).kind {
            u.variants = variants;
        }
        assert_eq!(type_name(&table, union), "\"foo\" | \"bar\"");
    }

    #[test]
    fn test_namespace_prefix() {
        let mut table = TypeTable::new();
        let ns = table.add_type(TypeKind::Namespace(NamespaceType {
            name: "My".into(),
            namespace: Some(table.global_namespace),
            ..NamespaceType::default()
        }));
        let std = table.add_type(TypeKind::Namespace(NamespaceType {
            name: "TypeSpec".into(),
            namespace: Some(table.global_namespace),
            ..NamespaceType::default()
        }));
        let mine = table.add_type(TypeKind::Scalar(ScalarType {
            name: "S".into(),
            namespace: Some(ns),
            ..ScalarType::default()
        }));
        let string = table.add_type(TypeKind::Scalar(ScalarType {
            name: "string".into(),
            namespace: Some(std),
            ..ScalarType::default()
        }));
        assert_eq!(type_name(&table, mine), "My.S");
        assert_eq!(type_name(&table, string), "string");
        assert_eq!(namespace_full_name(&table, ns), "My");
    }

    #[test]
    fn test_value_names() {
        let mut table = TypeTable::new();
        let ty = table.unknown_type;
        let a = table.add_value(ValueKind::String("a".into()), ty, None);
        let one = table.add_value(ValueKind::Numeric(Numeric::parse("1").unwrap()), ty, None);
        let array = table.add_value(ValueKind::Array(vec![a, one]), ty, None);
        assert_eq!(value_name(&table, a), "\"a\"");
        assert_eq!(value_name(&table, array), "#[\"a\", 1]");
    }
}
