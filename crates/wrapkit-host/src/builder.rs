//! Type builder used by hosts to describe their classes
//!
//! ```ignore
//! let mut registry = TypeRegistry::new();
//! let point = registry.register(
//!     TypeBuilder::class("Point")
//!         .field(FieldDecl::new("x", builtin::INT))
//!         .field(FieldDecl::new("y", builtin::INT))
//!         .constructor(ConstructorDecl::assigning(vec![builtin::INT, builtin::INT])),
//! )?;
//! ```

use crate::types::{ConstructorDecl, FieldDecl, MethodDecl, TypeId, TypeKind};

/// Pending definition of a host type, consumed by
/// [`TypeRegistry::register`](crate::TypeRegistry::register)
#[derive(Debug, Clone)]
pub struct TypeBuilder {
    pub(crate) name: String,
    pub(crate) kind: TypeKind,
    pub(crate) parent: Option<TypeId>,
    pub(crate) interfaces: Vec<TypeId>,
    pub(crate) fields: Vec<FieldDecl>,
    pub(crate) constructors: Vec<ConstructorDecl>,
    pub(crate) methods: Vec<MethodDecl>,
}

impl TypeBuilder {
    fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            parent: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Start a class definition (parent defaults to `Object`)
    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Class)
    }

    /// Start an interface definition
    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Interface)
    }

    /// Start an enumeration definition with constants in ordinal order
    pub fn enumeration<I, S>(name: impl Into<String>, constants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let constants = constants.into_iter().map(Into::into).collect();
        Self::new(name, TypeKind::Enum(constants))
    }

    /// Set the superclass
    pub fn extends(mut self, parent: TypeId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Add an implemented interface
    pub fn implements(mut self, interface: TypeId) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Append a field
    pub fn field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    /// Append a constructor
    pub fn constructor(mut self, constructor: ConstructorDecl) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// Append a method
    pub fn method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    /// Name of the type being built
    pub fn name(&self) -> &str {
        &self.name
    }
}
