//! # Type-C Type Checker
//!
//! Lazy, demand-driven type inference over a name-resolved [`typec_ast::Program`].
//! Every query goes through a [`TypeContext`], which memoizes node types,
//! resolved references and the generic instantiations inference discovers.
//!
//! ```ignore
//! let mut ctx = TypeContext::new();
//! let ty = ctx.get_type(&program, node);
//! let ok = ctx.is_assignable(&program, &ty, &expected).success;
//! ```

mod assign;
mod cache;
mod config;
mod context;
mod diagnostics;
mod error;
mod factory;
mod infer;
mod mono;
mod prototypes;
mod subst;
mod types;

// Re-export public API
pub use assign::{
    can_cast, can_coerce, is_assignable, Assignability, CastSafety, NoReferences,
    ReferenceResolver,
};
pub use config::InferenceConfig;
pub use context::TypeContext;
pub use diagnostics::collect_diagnostics;
pub use error::{TypeError, TypeErrorKind};
pub use factory::{default_int_kind, parse_float_literal, parse_int_literal, IntLiteralValue};
pub use infer::infer_generics_from_arguments;
pub use mono::{
    instantiation_key, mangle_name, ClassInstantiation, FunctionInstantiation, MethodInstantiation,
    MonomorphizationRegistry,
};
pub use prototypes::ELEMENT_PARAM;
pub use subst::{
    contains_generics, instantiate_function, simplify as simplify_type, substitute_function,
    substitute_generics, GenericBindings,
};
pub use types::*;
