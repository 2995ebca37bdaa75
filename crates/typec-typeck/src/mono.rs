//! Monomorphization registry
//!
//! Records every concrete instantiation of a generic class, class method or
//! function that inference resolves. Keys are canonical strings built from
//! the declaration name and the string form of the type arguments, e.g.
//! `Array<u32>`, `Array<u32>::map<string>`, `sort<u32>`. The registry only
//! records; emitting specialized code is up to whoever reads it.

use indexmap::IndexMap;
use typec_ast::NodeId;

use crate::subst::contains_generics;
use crate::types::Type;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInstantiation {
    pub key: String,
    pub decl: NodeId,
    pub name: String,
    pub args: Vec<Type>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInstantiation {
    pub key: String,
    pub class_key: String,
    pub method: NodeId,
    pub name: String,
    pub args: Vec<Type>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionInstantiation {
    pub key: String,
    pub decl: NodeId,
    pub name: String,
    pub args: Vec<Type>,
}

#[derive(Debug, Clone, Default)]
pub struct MonomorphizationRegistry {
    classes: IndexMap<String, ClassInstantiation>,
    methods: IndexMap<String, IndexMap<String, MethodInstantiation>>,
    functions: IndexMap<String, FunctionInstantiation>,
}

/// `name<arg, ...>`, or the bare name when there are no arguments
pub fn instantiation_key(name: &str, args: &[Type]) -> String {
    if args.is_empty() {
        return name.to_string();
    }
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    format!("{}<{}>", name, args.join(", "))
}

fn is_concrete(args: &[Type]) -> bool {
    args.iter().all(|a| !contains_generics(a))
}

impl MonomorphizationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `decl` instantiated with `args`. Non-generic declarations
    /// and arguments that still mention generic parameters are not stored.
    pub fn register_class_instantiation(
        &mut self,
        decl: NodeId,
        name: &str,
        args: &[Type],
    ) -> String {
        let key = instantiation_key(name, args);
        if args.is_empty() || !is_concrete(args) || self.classes.contains_key(&key) {
            return key;
        }
        tracing::debug!(%key, "class instantiation");
        self.classes.insert(
            key.clone(),
            ClassInstantiation {
                key: key.clone(),
                decl,
                name: name.to_string(),
                args: args.to_vec(),
            },
        );
        key
    }

    pub fn register_method_instantiation(
        &mut self,
        class_key: &str,
        method: NodeId,
        name: &str,
        args: &[Type],
    ) -> String {
        let key = format!("{}::{}", class_key, instantiation_key(name, args));
        if args.is_empty() || !is_concrete(args) {
            return key;
        }
        let methods = self.methods.entry(class_key.to_string()).or_default();
        if !methods.contains_key(&key) {
            tracing::debug!(%key, "method instantiation");
            methods.insert(
                key.clone(),
                MethodInstantiation {
                    key: key.clone(),
                    class_key: class_key.to_string(),
                    method,
                    name: name.to_string(),
                    args: args.to_vec(),
                },
            );
        }
        key
    }

    pub fn register_function_instantiation(
        &mut self,
        decl: NodeId,
        name: &str,
        args: &[Type],
    ) -> String {
        let key = instantiation_key(name, args);
        if args.is_empty() || !is_concrete(args) || self.functions.contains_key(&key) {
            return key;
        }
        tracing::debug!(%key, "function instantiation");
        self.functions.insert(
            key.clone(),
            FunctionInstantiation {
                key: key.clone(),
                decl,
                name: name.to_string(),
                args: args.to_vec(),
            },
        );
        key
    }

    pub fn all_class_instantiations(&self) -> impl Iterator<Item = &ClassInstantiation> {
        self.classes.values()
    }

    pub fn method_instantiations(
        &self,
        class_key: &str,
    ) -> impl Iterator<Item = &MethodInstantiation> {
        self.methods
            .get(class_key)
            .into_iter()
            .flat_map(|methods| methods.values())
    }

    pub fn all_function_instantiations(&self) -> impl Iterator<Item = &FunctionInstantiation> {
        self.functions.values()
    }

    pub fn class_instantiation(&self, key: &str) -> Option<&ClassInstantiation> {
        self.classes.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.methods.is_empty() && self.functions.is_empty()
    }

    pub fn clear(&mut self) {
        self.classes.clear();
        self.methods.clear();
        self.functions.clear();
    }
}

/// Identifier-safe form of an instantiation key.
///
/// `<`, `,` and `::` separate segments with `$`; `>` and whitespace vanish;
/// any other character outside `[A-Za-z0-9_$]` becomes `_`. Applying it to
/// its own output changes nothing.
pub fn mangle_name(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars().peekable();
    while let Some(c) = chars.next() {
        let piece = match c {
            c if c.is_ascii_alphanumeric() || c == '_' => Some(c),
            '$' | '<' | ',' => Some('$'),
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                Some('$')
            }
            '>' => None,
            c if c.is_whitespace() => None,
            _ => Some('_'),
        };
        match piece {
            Some('$') if out.ends_with('$') => {}
            Some(p) => out.push(p),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Primitive;
    use pretty_assertions::assert_eq;
    use typec_ast::{NodeKind, Program, Span};

    fn decls() -> (NodeId, NodeId) {
        let mut program = Program::new();
        let a = program.alloc(NodeKind::NullLiteral, Span::default());
        let b = program.alloc(NodeKind::NullLiteral, Span::default());
        (a, b)
    }

    #[test]
    fn test_generic_function_argument_is_concrete() {
        let (apply, _) = decls();
        let mut registry = MonomorphizationRegistry::new();
        let t = Type::generic("T", None);
        let callback = Type::function(
            vec![crate::types::FunctionParam {
                name: "xs".into(),
                ty: Type::array(t.clone()),
                is_mut: false,
            }],
            t,
            vec![crate::types::GenericType { name: "T".into(), constraint: None }],
            typec_ast::FnKind::Fn,
        );
        registry.register_function_instantiation(apply, "apply", &[callback]);
        assert_eq!(registry.all_function_instantiations().count(), 1);
    }

    #[test]
    fn test_registering_twice_is_a_no_op() {
        let (array, _) = decls();
        let mut registry = MonomorphizationRegistry::new();
        let u32_ty = Type::primitive(Primitive::U32);

        let first = registry.register_class_instantiation(array, "Array", &[u32_ty.clone()]);
        let second = registry.register_class_instantiation(array, "Array", &[u32_ty]);
        assert_eq!(first, "Array<u32>");
        assert_eq!(first, second);
        assert_eq!(registry.all_class_instantiations().count(), 1);
    }

    #[test]
    fn test_method_keys_nest_under_class() {
        let (array, map) = decls();
        let mut registry = MonomorphizationRegistry::new();
        let u32_ = [Type::primitive(Primitive::U32)];
        let class_key = registry.register_class_instantiation(array, "Array", &u32_);
        let key = registry.register_method_instantiation(&class_key, map, "map", &[Type::string()]);
        assert_eq!(key, "Array<u32>::map<string>");

        let keys: Vec<&str> = registry
            .method_instantiations(&class_key)
            .map(|m| m.key.as_str())
            .collect();
        assert_eq!(keys, vec!["Array<u32>::map<string>"]);
        assert_eq!(registry.method_instantiations("Other").count(), 0);
    }

    #[test]
    fn test_non_generic_and_open_instantiations_are_not_stored() {
        let (sort, _) = decls();
        let mut registry = MonomorphizationRegistry::new();
        assert_eq!(registry.register_function_instantiation(sort, "main", &[]), "main");
        let open =
            registry.register_function_instantiation(sort, "sort", &[Type::generic("T", None)]);
        assert_eq!(open, "sort<T>");
        assert!(registry.is_empty());

        registry.register_function_instantiation(sort, "sort", &[Type::primitive(Primitive::U32)]);
        let keys: Vec<&str> = registry
            .all_function_instantiations()
            .map(|f| f.key.as_str())
            .collect();
        assert_eq!(keys, vec!["sort<u32>"]);
    }

    #[test]
    fn test_mangle_name() {
        assert_eq!(mangle_name("Array<u32>::map<string>"), "Array$u32$map$string");
        assert_eq!(mangle_name("Map<u8, string>"), "Map$u8$string");
        assert_eq!(mangle_name("sort<u32[]>"), "sort$u32__");
        assert_eq!(mangle_name("plain"), "plain");
    }

    #[test]
    fn test_mangle_name_is_idempotent() {
        for key in ["Array<u32>::map<string>", "Box<Option<i32>?>", "f<(u8, bool)>"] {
            let once = mangle_name(key);
            assert_eq!(mangle_name(&once), once);
        }
    }
}
