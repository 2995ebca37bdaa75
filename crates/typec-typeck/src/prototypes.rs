//! Built-in method tables of arrays and coroutines

use typec_ast::FnKind;

use crate::subst::{substitute_generics, GenericBindings};
use crate::types::*;

/// Name of the generic parameter prototype members are written against
pub const ELEMENT_PARAM: &str = "T";

fn t() -> Type {
    Type::generic(ELEMENT_PARAM, None)
}

fn method(params: &[(&str, Type)], return_type: Type) -> Type {
    let params = params
        .iter()
        .map(|(name, ty)| FunctionParam {
            name: name.to_string(),
            ty: ty.clone(),
            is_mut: false,
        })
        .collect();
    Type::function(params, return_type, vec![], FnKind::Fn)
}

fn member(name: &str, ty: Type) -> PrototypeMember {
    PrototypeMember {
        name: name.to_string(),
        ty,
    }
}

fn array_prototype() -> Type {
    let u64_ty = Type::primitive(Primitive::U64);
    Type::prototype(
        PrototypeTarget::Array,
        vec![
            member("length", u64_ty.clone()),
            member("push", method(&[("value", t())], u64_ty.clone())),
            member("pop", method(&[], Type::nullable(t()))),
            member(
                "slice",
                method(&[("start", u64_ty.clone()), ("end", u64_ty.clone())], Type::array(t())),
            ),
            member("indexOf", method(&[("value", t())], Type::primitive(Primitive::I64))),
            member("contains", method(&[("value", t())], Type::bool())),
            member("reverse", method(&[], Type::array(t()))),
            member("clone", method(&[], Type::array(t()))),
            member("resize", method(&[("size", u64_ty)], Type::void())),
        ],
    )
}

fn coroutine_prototype() -> Type {
    Type::prototype(
        PrototypeTarget::Coroutine,
        vec![
            member("alive", Type::bool()),
            member("state", Type::primitive(Primitive::U8)),
            member("reset", method(&[], Type::void())),
            member("finish", method(&[], Type::void())),
        ],
    )
}

/// Prototype tables, built once per context
#[derive(Debug, Clone, Default)]
pub struct Prototypes {
    array: Option<Type>,
    coroutine: Option<Type>,
}

impl Prototypes {
    pub fn get(&mut self, target: PrototypeTarget) -> Type {
        let slot = match target {
            PrototypeTarget::Array => &mut self.array,
            PrototypeTarget::Coroutine => &mut self.coroutine,
        };
        slot.get_or_insert_with(|| {
            tracing::trace!(%target, "building prototype");
            match target {
                PrototypeTarget::Array => array_prototype(),
                PrototypeTarget::Coroutine => coroutine_prototype(),
            }
        })
        .clone()
    }

    /// Look up `name` on the prototype of `target`, with the element (or
    /// yield) type substituted for `T`.
    pub fn member(&mut self, target: PrototypeTarget, name: &str, element: &Type) -> Option<Type> {
        let proto = self.get(target);
        let TypeKind::Prototype(proto) = proto.kind() else {
            return None;
        };
        let found = proto.member(name)?;
        let mut bindings = GenericBindings::new();
        bindings.insert(ELEMENT_PARAM.to_string(), element.clone());
        Some(substitute_generics(&found.ty, &bindings))
    }

    /// Member names, for completion
    pub fn member_names(&mut self, target: PrototypeTarget) -> Vec<String> {
        match self.get(target).kind() {
            TypeKind::Prototype(proto) => proto.members.iter().map(|m| m.name.clone()).collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_members_are_substituted() {
        let mut protos = Prototypes::default();
        let u32_ty = Type::primitive(Primitive::U32);

        let pop = protos.member(PrototypeTarget::Array, "pop", &u32_ty).unwrap();
        assert_eq!(pop.to_string(), "fn() -> u32?");

        let length = protos.member(PrototypeTarget::Array, "length", &u32_ty).unwrap();
        assert_eq!(length.to_string(), "u64");

        assert!(protos.member(PrototypeTarget::Array, "missing", &u32_ty).is_none());
    }

    #[test]
    fn test_prototype_is_built_once() {
        let mut protos = Prototypes::default();
        let first = protos.get(PrototypeTarget::Coroutine);
        let second = protos.get(PrototypeTarget::Coroutine);
        assert!(first.ptr_eq(&second));
        assert!(protos.member_names(PrototypeTarget::Coroutine).contains(&"alive".to_string()));
    }
}
