//! Common type of several branches

use crate::assign::{can_coerce, is_assignable};
use crate::error::TypeErrorKind;
use crate::types::*;

use super::Inferer;

/// Result type of arithmetic between two numeric primitives: the wider one
/// when one coerces into the other, else the narrowest integer both fit in.
pub(super) fn numeric_join(a: Primitive, b: Primitive) -> Option<Primitive> {
    if !a.is_numeric() || !b.is_numeric() {
        return None;
    }
    if can_coerce(a, b) {
        return Some(b);
    }
    if can_coerce(b, a) {
        return Some(a);
    }
    let candidates: &[Primitive] = if a.is_integer() && b.is_integer() {
        &[Primitive::I16, Primitive::I32, Primitive::I64]
    } else {
        &[Primitive::F64]
    };
    candidates
        .iter()
        .copied()
        .find(|c| can_coerce(a, *c) && can_coerce(b, *c))
        .or(Some(Primitive::F64))
}

impl Inferer<'_> {
    /// Common type of branch types. Recursion placeholders are skipped (and
    /// propagated when nothing else is left), `never` contributes nothing,
    /// `null` makes the result nullable, errors propagate.
    pub(crate) fn common_type(&mut self, types: Vec<Type>) -> Type {
        let (placeholders, concrete): (Vec<Type>, Vec<Type>) =
            types.into_iter().partition(|t| t.is_placeholder());
        if concrete.is_empty() {
            return placeholders.into_iter().next().unwrap_or_else(Type::never);
        }
        if let Some(err) = concrete.iter().find(|t| t.is_error()) {
            return err.clone();
        }

        let mut nullable = false;
        let mut candidates = Vec::with_capacity(concrete.len());
        for ty in &concrete {
            match ty.kind() {
                TypeKind::Primitive(Primitive::Never) => {}
                TypeKind::Primitive(Primitive::Null) => nullable = true,
                TypeKind::Nullable(base) => {
                    nullable = true;
                    candidates.push(base.clone());
                }
                _ => candidates.push(ty.clone()),
            }
        }
        if candidates.is_empty() {
            return if nullable { Type::null() } else { Type::never() };
        }

        match self.common_of(&candidates) {
            Some(common) if nullable => Type::nullable(common),
            Some(common) => common,
            None => {
                tracing::debug!(count = concrete.len(), "no common type");
                Type::error(TypeErrorKind::NoCommonType(
                    concrete.iter().map(|t| t.to_string()).collect(),
                ))
            }
        }
    }

    fn common_of(&mut self, candidates: &[Type]) -> Option<Type> {
        let first = candidates.first()?;
        if candidates.iter().all(|t| t == first) {
            return Some(first.clone());
        }

        // a candidate every other one is assignable to
        for candidate in candidates {
            let all = candidates
                .iter()
                .all(|other| is_assignable(self, other, candidate).success);
            if all {
                return Some(candidate.clone());
            }
        }

        let resolved: Vec<Type> = candidates.iter().map(|t| self.resolve_deep(t)).collect();

        if let Some(prims) = resolved.iter().map(|t| t.as_primitive()).collect::<Option<Vec<_>>>() {
            let (head, rest) = prims.split_first()?;
            return rest
                .iter()
                .try_fold(*head, |acc, p| numeric_join(acc, *p))
                .map(Type::primitive);
        }

        if let Some(structs) = resolved.iter().map(|t| t.as_struct()).collect::<Option<Vec<_>>>() {
            return self.narrow_structs(&structs);
        }

        let ctors: Option<Vec<&VariantConstructorType>> = resolved
            .iter()
            .map(|t| match t.kind() {
                TypeKind::VariantConstructor(c) => Some(c),
                _ => None,
            })
            .collect();
        if let Some(ctors) = ctors {
            return self.merge_constructors(&ctors);
        }
        None
    }

    /// Struct with the fields every struct shares, each at the common type
    /// of its occurrences.
    fn narrow_structs(&mut self, structs: &[&StructType]) -> Option<Type> {
        let (head, rest) = structs.split_first()?;
        let mut fields = Vec::new();
        for field in &head.fields {
            let mut types = vec![field.ty.clone()];
            let shared = rest.iter().all(|other| match other.field(&field.name) {
                Some(found) => {
                    types.push(found.ty.clone());
                    true
                }
                None => false,
            });
            if !shared {
                continue;
            }
            let Some(common) = self.common_of(&types) else {
                continue;
            };
            fields.push(StructField {
                name: field.name.clone(),
                ty: common,
                node: field.node,
            });
        }
        if fields.is_empty() {
            return None;
        }
        Some(Type::structure(fields, true))
    }

    /// Constructors of one generic variant join into a reference to the
    /// variant. Each generic slot takes the common type of the constructors
    /// that fix it; `never` slots are left to the others.
    fn merge_constructors(&mut self, ctors: &[&VariantConstructorType]) -> Option<Type> {
        let (head, rest) = ctors.split_first()?;
        let decl = head.variant_decl?;
        if rest.iter().any(|c| c.variant_decl != Some(decl)) {
            return None;
        }
        let arity = ctors.iter().map(|c| c.generic_args.len()).max().unwrap_or(0);
        let mut args = Vec::with_capacity(arity);
        for slot in 0..arity {
            let fixed: Vec<Type> = ctors
                .iter()
                .filter_map(|c| c.generic_args.get(slot))
                .filter(|t| !t.is_never())
                .cloned()
                .collect();
            if fixed.is_empty() {
                args.push(Type::never());
            } else {
                args.push(self.common_of(&fixed)?);
            }
        }
        Some(Type::reference(decl, head.variant_name.clone(), args))
    }
}
