use std::collections::HashMap;
use std::sync::OnceLock;

use super::AbstractType;
use crate::error::SchemaError;

/// Maps external type names to value types.
///
/// Both adapters resolve every type name they read through a registry, so a
/// name that was never registered surfaces as [`SchemaError::UnknownType`]
/// instead of a silent fallback.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<String, AbstractType>,
}

impl TypeRegistry {
    /// Creates a registry with no bindings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry binding every built-in type under its canonical class
    /// name and its short name.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for ty in AbstractType::ALL {
            registry.register(ty.class_name(), ty);
            registry.register(ty.short_name(), ty);
        }
        registry
    }

    /// The process-wide registry of built-in types.
    pub fn global() -> &'static TypeRegistry {
        static GLOBAL: OnceLock<TypeRegistry> = OnceLock::new();
        GLOBAL.get_or_init(TypeRegistry::with_builtin)
    }

    /// Binds `name` to `ty`, returning the type it previously resolved to.
    pub fn register(&mut self, name: impl Into<String>, ty: AbstractType) -> Option<AbstractType> {
        self.types.insert(name.into(), ty)
    }

    /// Resolves a type name. Surrounding whitespace is ignored.
    pub fn resolve(&self, name: &str) -> Result<AbstractType, SchemaError> {
        let name = name.trim();
        self.types
            .get(name)
            .copied()
            .ok_or_else(|| SchemaError::UnknownType(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name.trim())
    }

    /// Number of registered names (aliases included).
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
