//! Inference settings

use crate::types::Primitive;

/// Knobs of one [`TypeContext`](crate::TypeContext).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceConfig {
    /// Kind of an unsuffixed integer literal without a numeric context
    pub default_int: Primitive,
    /// Kind of an unsuffixed float literal without a numeric context
    pub default_float: Primitive,
    /// Longest chain of references followed before giving up
    pub max_reference_depth: usize,
    /// Whether inference records generic instantiations
    pub register_instantiations: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            default_int: Primitive::I32,
            default_float: Primitive::F64,
            max_reference_depth: 64,
            register_instantiations: true,
        }
    }
}

impl InferenceConfig {
    pub fn with_default_int(mut self, prim: Primitive) -> Self {
        if prim.is_integer() {
            self.default_int = prim;
        }
        self
    }

    pub fn with_default_float(mut self, prim: Primitive) -> Self {
        if prim.is_float() {
            self.default_float = prim;
        }
        self
    }

    pub fn with_max_reference_depth(mut self, depth: usize) -> Self {
        self.max_reference_depth = depth.max(1);
        self
    }

    pub fn with_instantiation_tracking(mut self, enabled: bool) -> Self {
        self.register_instantiations = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setters_reject_wrong_kinds() {
        let config = InferenceConfig::default()
            .with_default_int(Primitive::F32)
            .with_default_float(Primitive::U8);
        assert_eq!(config, InferenceConfig::default());

        let config = InferenceConfig::default().with_default_int(Primitive::U32);
        assert_eq!(config.default_int, Primitive::U32);
    }
}
