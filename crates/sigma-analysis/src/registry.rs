//! Type registry: built-in type names and user class definitions.

use rustc_hash::FxHashMap;
use sigma_common::span::Span;

use crate::ty::Ty;

/// The signature of a declared method.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSig {
    pub params: Vec<Ty>,
    pub ret: Ty,
}

/// A registered user class: its fields and methods by name.
#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub span: Span,
    pub fields: FxHashMap<String, Ty>,
    pub methods: FxHashMap<String, MethodSig>,
}

impl ClassInfo {
    pub fn new(span: Span) -> Self {
        Self {
            span,
            fields: FxHashMap::default(),
            methods: FxHashMap::default(),
        }
    }
}

/// Registry of resolvable type names.
///
/// Seeded with the six built-ins; user classes are registered by name
/// during the analyzer's declaration pass so that forward references
/// between classes resolve. Resolution of an unknown name yields
/// [`Ty::Error`].
#[derive(Debug, Default)]
pub struct TypeRegistry {
    classes: FxHashMap<String, ClassInfo>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class by name with an empty member table. Used by the
    /// declaration pass so the name resolves before members are known.
    pub fn declare_class(&mut self, name: &str, span: Span) {
        self.classes
            .entry(name.to_string())
            .or_insert_with(|| ClassInfo::new(span));
    }

    /// Fill in a declared class's member table.
    pub fn define_class(&mut self, name: &str, info: ClassInfo) {
        self.classes.insert(name.to_string(), info);
    }

    /// Look up a registered class.
    pub fn class(&self, name: &str) -> Option<&ClassInfo> {
        self.classes.get(name)
    }

    /// Whether `name` is a registered class.
    pub fn is_class(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Resolve a source type name to a type.
    ///
    /// Built-in names map to their primitives, registered classes to
    /// [`Ty::Class`], and anything else to [`Ty::Error`].
    pub fn resolve(&self, name: &str) -> Ty {
        match name {
            "int" => Ty::Int,
            "double" => Ty::Double,
            "float" => Ty::Float,
            "boolean" => Ty::Boolean,
            "String" => Ty::Str,
            "void" => Ty::Void,
            _ if self.is_class(name) => Ty::Class(name.to_string()),
            _ => Ty::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_builtins() {
        let reg = TypeRegistry::new();
        assert_eq!(reg.resolve("int"), Ty::Int);
        assert_eq!(reg.resolve("double"), Ty::Double);
        assert_eq!(reg.resolve("float"), Ty::Float);
        assert_eq!(reg.resolve("boolean"), Ty::Boolean);
        assert_eq!(reg.resolve("String"), Ty::Str);
        assert_eq!(reg.resolve("void"), Ty::Void);
    }

    #[test]
    fn unknown_name_resolves_to_error() {
        let reg = TypeRegistry::new();
        assert_eq!(reg.resolve("Mystery"), Ty::Error);
    }

    #[test]
    fn declared_class_resolves_nominally() {
        let mut reg = TypeRegistry::new();
        reg.declare_class("Point", Span::point(0));
        assert_eq!(reg.resolve("Point"), Ty::Class("Point".into()));
        assert!(reg.is_class("Point"));
    }

    #[test]
    fn define_class_fills_members() {
        let mut reg = TypeRegistry::new();
        reg.declare_class("Point", Span::point(0));
        let mut info = ClassInfo::new(Span::point(0));
        info.fields.insert("x".into(), Ty::Int);
        info.methods.insert(
            "norm".into(),
            MethodSig {
                params: vec![],
                ret: Ty::Double,
            },
        );
        reg.define_class("Point", info);

        let stored = reg.class("Point").unwrap();
        assert_eq!(stored.fields["x"], Ty::Int);
        assert_eq!(stored.methods["norm"].ret, Ty::Double);
    }
}
