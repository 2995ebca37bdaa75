//! Compilation context
//!
//! A [`TypeContext`] owns everything inference memoizes for one compilation
//! unit: node types, resolved references, built-in prototypes and the
//! monomorphization registry. Contexts are independent of each other; the
//! syntax tree is passed to every query so the host can edit it between
//! queries and invalidate what changed.

use std::collections::HashMap;

use typec_ast::{NodeId, Program};

use crate::assign::{self, Assignability, CastSafety};
use crate::cache::TypeCache;
use crate::config::InferenceConfig;
use crate::infer::Inferer;
use crate::mono::MonomorphizationRegistry;
use crate::prototypes::Prototypes;
use crate::types::{PrototypeTarget, ReferenceType, Type};

/// `(declaration, rendered arguments)`
pub(crate) type ReferenceKey = (NodeId, String);

pub(crate) fn reference_key(reference: &ReferenceType) -> ReferenceKey {
    let args: Vec<String> = reference.args.iter().map(|a| a.to_string()).collect();
    (reference.decl, args.join(", "))
}

#[derive(Debug, Default)]
pub(crate) struct ReferenceCache {
    pub(crate) resolved: HashMap<ReferenceKey, Type>,
    pub(crate) computations: usize,
}

#[derive(Default)]
pub struct TypeContext {
    pub(crate) cache: TypeCache,
    pub(crate) references: ReferenceCache,
    pub(crate) prototypes: Prototypes,
    pub(crate) registry: MonomorphizationRegistry,
    pub(crate) config: InferenceConfig,
}

impl TypeContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: InferenceConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    pub fn registry(&self) -> &MonomorphizationRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut MonomorphizationRegistry {
        &mut self.registry
    }

    /// How many reference resolutions were actually computed
    pub fn resolution_count(&self) -> usize {
        self.references.computations
    }

    /// Number of nodes with a finished type
    pub fn cached_types(&self) -> usize {
        self.cache.len()
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Type of any node. Total: failures come back as error types.
    pub fn get_type(&mut self, program: &Program, node: NodeId) -> Type {
        Inferer::new(program, self).get_type(node)
    }

    pub fn get_expression_type(&mut self, program: &Program, expr: NodeId) -> Type {
        self.get_type(program, expr)
    }

    /// Resolve a reference type to its underlying form. Other types are
    /// returned unchanged.
    pub fn resolve_reference(&mut self, program: &Program, ty: &Type) -> Type {
        Inferer::new(program, self).resolve_deep(ty)
    }

    /// Syntax nodes naming the members of a type: struct fields, class
    /// attributes and methods, interface methods, variant constructors and
    /// enum cases.
    pub fn get_identifiable_fields(&mut self, program: &Program, ty: &Type) -> Vec<NodeId> {
        Inferer::new(program, self).identifiable_fields(ty)
    }

    pub fn is_assignable(
        &mut self,
        program: &Program,
        actual: &Type,
        expected: &Type,
    ) -> Assignability {
        assign::is_assignable(&mut Inferer::new(program, self), actual, expected)
    }

    pub fn can_cast_types(
        &mut self,
        program: &Program,
        source: &Type,
        target: &Type,
    ) -> CastSafety {
        assign::can_cast(&mut Inferer::new(program, self), source, target)
    }

    /// Member names of a built-in prototype, for completion
    pub fn prototype_members(&mut self, target: PrototypeTarget) -> Vec<String> {
        self.prototypes.member_names(target)
    }

    // -------------------------------------------------------------------------
    // Invalidation
    // -------------------------------------------------------------------------

    /// Forget the types of `node` and everything below it, and every
    /// resolved reference. The registry is a log and is kept.
    pub fn invalidate(&mut self, program: &Program, node: NodeId) {
        let mut removed = 0usize;
        for id in program.descendants(node) {
            if self.cache.remove(id) {
                removed += 1;
            }
        }
        self.references.resolved.clear();
        tracing::debug!(?node, removed, "invalidated subtree");
    }

    /// Drop every cached result, the registry included.
    pub fn clear(&mut self) {
        self.cache.clear();
        self.references = ReferenceCache::default();
        self.prototypes = Prototypes::default();
        self.registry.clear();
        tracing::debug!("cleared type context");
    }
}
