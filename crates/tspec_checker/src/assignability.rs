//! Type and value assignability.
//!
//! `Relation` memoizes type-to-type results. A pair is recorded as
//! assignable before its structure is compared, so recursive models
//! (`model Node { next: Node }`) terminate and are assumed compatible on the
//! back edge.

use crate::names::{type_name, value_name};
use crate::types::{IntrinsicName, ScalarBacking, TypeId, TypeKind, TypeTable, ValueId, ValueKind};
use rustc_hash::FxHashMap;

/// Why a value does not fit a type. Names are rendered for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    Unassignable { source: String, target: String },
    MissingProperty { property: String, source: String, target: String },
    UnexpectedProperty { property: String, target: String },
}

#[derive(Debug, Default)]
pub struct Relation {
    cache: FxHashMap<(TypeId, TypeId), bool>,
}

impl Relation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget cached results. Called when types they depend on change.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn is_type_assignable(&mut self, table: &TypeTable, source: TypeId, target: TypeId) -> bool {
        if source == target {
            return true;
        }
        if let Some(&result) = self.cache.get(&(source, target)) {
            return result;
        }
        self.cache.insert((source, target), true);
        let result = self.is_type_assignable_worker(table, source, target);
        self.cache.insert((source, target), result);
        result
    }

    fn is_type_assignable_worker(&mut self, table: &TypeTable, source: TypeId, target: TypeId) -> bool {
        let source_kind = &table.get(source).kind;
        let target_kind = &table.get(target).kind;

        match target_kind {
            TypeKind::Intrinsic(IntrinsicName::Unknown | IntrinsicName::ErrorType) => return true,
            _ => {}
        }
        match source_kind {
            TypeKind::Intrinsic(IntrinsicName::Never | IntrinsicName::ErrorType) => return true,
            _ => {}
        }

        // Unwrap variants and template parameters to what they stand for.
        if let TypeKind::UnionVariant(v) = source_kind {
            return self.is_type_assignable(table, v.type_id, target);
        }
        if let TypeKind::UnionVariant(v) = target_kind {
            return self.is_type_assignable(table, source, v.type_id);
        }
        if let TypeKind::TemplateParameter(param) = source_kind {
            let constraint = param.constraint.and_then(|c| c.type_id);
            return match constraint {
                Some(constraint) => self.is_type_assignable(table, constraint, target),
                None => matches!(target_kind, TypeKind::Intrinsic(IntrinsicName::Unknown)),
            };
        }
        if let TypeKind::TemplateParameter(param) = target_kind {
            return match param.constraint.and_then(|c| c.type_id) {
                Some(constraint) => self.is_type_assignable(table, source, constraint),
                None => true,
            };
        }

        if let TypeKind::Union(union) = source_kind {
            return union.variants.iter().all(|v| self.is_type_assignable(table, *v, target));
        }
        if let TypeKind::Union(union) = target_kind {
            return union.variants.iter().any(|v| self.is_type_assignable(table, source, *v));
        }

        if let Some(kind) = table.reflection_kind(target) {
            if kind.matches(source_kind) {
                return true;
            }
        }

        match (source_kind, target_kind) {
            (TypeKind::String(s), _) => literal_fits(table, LiteralRef::String(s), target),
            (TypeKind::Number(n), _) => literal_fits(table, LiteralRef::Number(n), target),
            (TypeKind::Boolean(b), _) => literal_fits(table, LiteralRef::Boolean(*b), target),
            (TypeKind::StringTemplate(t), _) => match &t.string_value {
                Some(value) => literal_fits(table, LiteralRef::String(value), target),
                None => table.scalar_backing(target) == Some(ScalarBacking::String),
            },
            (TypeKind::Scalar(_), TypeKind::Scalar(_)) => self.extends_scalar(table, source, target),
            (TypeKind::EnumMember(member), TypeKind::Enum(_)) => member.enum_type == target,
            (TypeKind::Tuple(tuple), TypeKind::Tuple(other)) => {
                tuple.values.len() == other.values.len()
                    && tuple
                        .values
                        .iter()
                        .zip(other.values.iter())
                        .all(|(s, t)| self.is_type_assignable(table, *s, *t))
            }
            (TypeKind::Tuple(tuple), TypeKind::Model(_)) => match table.array_element(target) {
                Some(element) => tuple.values.iter().all(|v| self.is_type_assignable(table, *v, element)),
                None => false,
            },
            (TypeKind::Model(_), TypeKind::Model(_)) => self.is_model_assignable(table, source, target),
            (TypeKind::Intrinsic(s), TypeKind::Intrinsic(t)) => s == t,
            _ => false,
        }
    }

    fn extends_scalar(&mut self, table: &TypeTable, source: TypeId, target: TypeId) -> bool {
        let mut current = Some(source);
        let mut steps = 0;
        while let Some(id) = current {
            if id == target {
                return true;
            }
            current = table.scalar(id).and_then(|s| s.base_scalar);
            steps += 1;
            if steps > table.len() {
                break;
            }
        }
        false
    }

    fn is_model_assignable(&mut self, table: &TypeTable, source: TypeId, target: TypeId) -> bool {
        // Nominal: target appears in the base chain.
        let mut current = table.model(source).and_then(|m| m.base_model);
        let mut steps = 0;
        while let Some(id) = current {
            if id == target {
                return true;
            }
            current = table.model(id).and_then(|m| m.base_model);
            steps += 1;
            if steps > table.len() {
                break;
            }
        }

        if let Some(target_element) = table.array_element(target) {
            return match table.array_element(source) {
                Some(source_element) => self.is_type_assignable(table, source_element, target_element),
                None => false,
            };
        }
        if table.array_element(source).is_some() {
            return false;
        }

        if let Some(target_value) = table.record_element(target) {
            if let Some(source_value) = table.record_element(source) {
                return self.is_type_assignable(table, source_value, target_value);
            }
            return table
                .inherited_properties(source)
                .iter()
                .filter_map(|p| table.property(*p).map(|p| p.type_id))
                .all(|t| self.is_type_assignable(table, t, target_value));
        }

        // Structural: every target property is present and compatible.
        for target_prop in table.inherited_properties(target) {
            let Some(target_prop) = table.property(target_prop) else {
                continue;
            };
            match table.find_property(source, &target_prop.name).and_then(|p| table.property(p)) {
                Some(source_prop) => {
                    if source_prop.optional && !target_prop.optional {
                        return false;
                    }
                    if !self.is_type_assignable(table, source_prop.type_id, target_prop.type_id) {
                        return false;
                    }
                }
                None if target_prop.optional => {}
                None => return false,
            }
        }
        true
    }

    // ========================================================================
    // Values
    // ========================================================================

    /// Check a value against a type, reporting the innermost failing pair.
    pub fn check_value(&mut self, table: &TypeTable, value: ValueId, target: TypeId) -> Result<(), Mismatch> {
        let unassignable = || Mismatch::Unassignable {
            source: value_name(table, value),
            target: type_name(table, target),
        };
        let v = table.value(value);
        if table.is_error(v.type_id) {
            return Ok(());
        }

        match &table.get(target).kind {
            TypeKind::Intrinsic(IntrinsicName::Unknown | IntrinsicName::ErrorType) => return Ok(()),
            TypeKind::Intrinsic(IntrinsicName::Null) => {
                return match v.kind {
                    ValueKind::Null => Ok(()),
                    _ => Err(unassignable()),
                };
            }
            TypeKind::Union(union) => {
                for variant in &union.variants {
                    if self.check_value(table, value, *variant).is_ok() {
                        return Ok(());
                    }
                }
                return Err(unassignable());
            }
            TypeKind::UnionVariant(variant) => return self.check_value(table, value, variant.type_id),
            TypeKind::TemplateParameter(param) => {
                let constraint = param.constraint.and_then(|c| c.value_type.or(c.type_id));
                return match constraint {
                    Some(constraint) => self.check_value(table, value, constraint),
                    None => Ok(()),
                };
            }
            _ => {}
        }

        if let Some(scalar) = v.scalar {
            if table.scalar(target).is_some() && self.is_type_assignable(table, scalar, target) {
                return Ok(());
            }
        }

        match &v.kind {
            ValueKind::String(s) => fits_or(literal_fits(table, LiteralRef::String(s), target), unassignable),
            ValueKind::Numeric(n) => fits_or(literal_fits(table, LiteralRef::Number(n), target), unassignable),
            ValueKind::Boolean(b) => fits_or(literal_fits(table, LiteralRef::Boolean(*b), target), unassignable),
            ValueKind::Null => Err(unassignable()),
            ValueKind::EnumMember(member) => {
                let fits = *member == target || table.enum_member(*member).is_some_and(|m| m.enum_type == target);
                fits_or(fits, unassignable)
            }
            ValueKind::Array(items) => {
                if let Some(element) = table.array_element(target) {
                    for item in items {
                        self.check_value(table, *item, element)?;
                    }
                    return Ok(());
                }
                if let TypeKind::Tuple(tuple) = &table.get(target).kind {
                    if tuple.values.len() != items.len() {
                        return Err(unassignable());
                    }
                    for (item, ty) in items.iter().zip(tuple.values.iter()) {
                        self.check_value(table, *item, *ty)?;
                    }
                    return Ok(());
                }
                Err(unassignable())
            }
            ValueKind::Object(props) => {
                if table.model(target).is_none() || table.array_element(target).is_some() {
                    return Err(unassignable());
                }
                let record = table.record_element(target);
                for prop_id in table.inherited_properties(target) {
                    let Some(prop) = table.property(prop_id) else {
                        continue;
                    };
                    match props.get(&prop.name) {
                        Some(item) => self.check_value(table, *item, prop.type_id)?,
                        None if prop.optional => {}
                        None => {
                            return Err(Mismatch::MissingProperty {
                                property: prop.name.clone(),
                                source: value_name(table, value),
                                target: type_name(table, target),
                            })
                        }
                    }
                }
                for (name, item) in props {
                    if table.find_property(target, name).is_some() {
                        continue;
                    }
                    match record {
                        Some(element) => self.check_value(table, *item, element)?,
                        None => {
                            return Err(Mismatch::UnexpectedProperty {
                                property: name.clone(),
                                target: type_name(table, target),
                            })
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

fn fits_or(fits: bool, mismatch: impl FnOnce() -> Mismatch) -> Result<(), Mismatch> {
    if fits {
        Ok(())
    } else {
        Err(mismatch())
    }
}

#[derive(Debug, Clone, Copy)]
enum LiteralRef<'v> {
    String(&'v str),
    Number(&'v crate::numeric::Numeric),
    Boolean(bool),
}

/// Whether a literal fits a literal type or scalar.
fn literal_fits(table: &TypeTable, literal: LiteralRef<'_>, target: TypeId) -> bool {
    match (&table.get(target).kind, literal) {
        (TypeKind::String(t), LiteralRef::String(s)) => t == s,
        (TypeKind::StringTemplate(t), LiteralRef::String(s)) => t.string_value.as_deref() == Some(s),
        (TypeKind::Number(t), LiteralRef::Number(n)) => t == n,
        (TypeKind::Boolean(t), LiteralRef::Boolean(b)) => *t == b,
        (TypeKind::Scalar(_), _) => matches!(
            (table.scalar_backing(target), literal),
            (Some(ScalarBacking::String), LiteralRef::String(_))
                | (Some(ScalarBacking::Boolean), LiteralRef::Boolean(_))
        ) || matches!(
            (table.scalar_backing(target), literal),
            (Some(ScalarBacking::Numeric(kind)), LiteralRef::Number(n)) if kind.contains(n)
        ),
        _ => false,
    }
}
