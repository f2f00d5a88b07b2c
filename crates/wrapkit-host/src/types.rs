//! Type descriptors for the host object model
//!
//! A [`HostType`] is the runtime description of one host class: its ordered
//! instance fields, constructors, methods and, for enumerations, its
//! constants. Descriptors are created through [`TypeBuilder`](crate::TypeBuilder)
//! and owned by a [`TypeRegistry`](crate::TypeRegistry); everything else
//! refers to them by [`TypeId`].
//!
//! Member order is significant. Fields, constructors and methods keep the
//! order in which the host declared them, and that order is the only
//! positional information the reflection layer relies on.

use std::fmt;
use std::sync::Arc;

use crate::error::HostResult;
use crate::value::{HostObject, Value};

/// Identifier of a registered host type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    /// Position of the type inside its registry
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Built-in types present in every registry, in registration order
pub mod builtin {
    use super::TypeId;

    /// Return type of methods without a result
    pub const VOID: TypeId = TypeId(0);
    /// `boolean`
    pub const BOOL: TypeId = TypeId(1);
    /// Signed 8-bit integer
    pub const BYTE: TypeId = TypeId(2);
    /// Signed 16-bit integer
    pub const SHORT: TypeId = TypeId(3);
    /// Signed 32-bit integer
    pub const INT: TypeId = TypeId(4);
    /// Signed 64-bit integer
    pub const LONG: TypeId = TypeId(5);
    /// 32-bit float
    pub const FLOAT: TypeId = TypeId(6);
    /// 64-bit float
    pub const DOUBLE: TypeId = TypeId(7);
    /// Root of every reference type
    pub const OBJECT: TypeId = TypeId(8);
    /// Immutable string
    pub const STRING: TypeId = TypeId(9);
    /// Ordered list of values
    pub const LIST: TypeId = TypeId(10);

    /// Number of built-in types
    pub(crate) const COUNT: u32 = 11;

    /// Primitive kind of a built-in primitive type
    pub fn primitive_kind(id: TypeId) -> Option<super::PrimitiveKind> {
        use super::PrimitiveKind;
        match id {
            BOOL => Some(PrimitiveKind::Bool),
            BYTE => Some(PrimitiveKind::Byte),
            SHORT => Some(PrimitiveKind::Short),
            INT => Some(PrimitiveKind::Int),
            LONG => Some(PrimitiveKind::Long),
            FLOAT => Some(PrimitiveKind::Float),
            DOUBLE => Some(PrimitiveKind::Double),
            _ => None,
        }
    }
}

/// Member visibility as declared by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Accessible everywhere
    Public,
    /// Accessible to subtypes
    Protected,
    /// Accessible within the declaring package
    Package,
    /// Accessible only to the declaring type
    Private,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Package => "package",
            Visibility::Private => "private",
        };
        f.write_str(s)
    }
}

/// Primitive value kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// `boolean`
    Bool,
    /// `i8`
    Byte,
    /// `i16`
    Short,
    /// `i32`
    Int,
    /// `i64`
    Long,
    /// `f32`
    Float,
    /// `f64`
    Double,
}

impl PrimitiveKind {
    /// Zero value stored in a freshly allocated slot
    pub fn zero(self) -> Value {
        match self {
            PrimitiveKind::Bool => Value::Bool(false),
            PrimitiveKind::Byte => Value::Byte(0),
            PrimitiveKind::Short => Value::Short(0),
            PrimitiveKind::Int => Value::Int(0),
            PrimitiveKind::Long => Value::Long(0),
            PrimitiveKind::Float => Value::Float(0.0),
            PrimitiveKind::Double => Value::Double(0.0),
        }
    }
}

/// Type kind enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    /// Primitive value type
    Primitive(PrimitiveKind),
    /// `void`, only valid as a return type
    Void,
    /// Concrete or abstract class
    Class,
    /// Interface, only reachable through `implements`
    Interface,
    /// Enumeration with its constants in ordinal order
    Enum(Vec<String>),
}

/// Declared field of a host type
#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub(crate) name: String,
    pub(crate) declared_type: TypeId,
    pub(crate) visibility: Visibility,
    pub(crate) is_static: bool,
    pub(crate) is_final: bool,
    /// Value of a static field
    pub(crate) constant: Option<Value>,
    /// Object slot of an instance field, assigned at registration
    pub(crate) slot: Option<usize>,
}

impl FieldDecl {
    /// Private instance field
    pub fn new(name: impl Into<String>, declared_type: TypeId) -> Self {
        Self {
            name: name.into(),
            declared_type,
            visibility: Visibility::Private,
            is_static: false,
            is_final: false,
            constant: None,
            slot: None,
        }
    }

    /// Set visibility
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Mark as public
    pub fn public(self) -> Self {
        self.visibility(Visibility::Public)
    }

    /// Mark as final
    pub fn as_final(mut self) -> Self {
        self.is_final = true;
        self
    }

    /// Turn into a static field holding `value`
    pub fn as_static(mut self, value: Value) -> Self {
        self.is_static = true;
        self.constant = Some(value);
        self
    }

    /// Host-side name; unstable across releases
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type
    pub fn declared_type(&self) -> TypeId {
        self.declared_type
    }

    /// Declared visibility
    pub fn visibility_of(&self) -> Visibility {
        self.visibility
    }

    /// Whether this is a static field
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Whether this field is final
    pub fn is_final(&self) -> bool {
        self.is_final
    }

    /// Value of a static field
    pub fn constant(&self) -> Option<&Value> {
        self.constant.as_ref()
    }

    /// Slot on instances (instance fields only)
    pub fn slot(&self) -> Option<usize> {
        self.slot
    }
}

/// Host implementation of a constructor
pub(crate) type ConstructorFn = Arc<dyn Fn(&HostType, &[Value]) -> HostResult<HostObject> + Send + Sync>;

/// Host implementation of a method; the receiver is `None` for static methods
pub(crate) type MethodFn = Arc<dyn Fn(Option<&HostObject>, &[Value]) -> HostResult<Value> + Send + Sync>;

/// How a constructor builds its instance
#[derive(Clone)]
pub(crate) enum ConstructorBody {
    /// Argument `i` is stored into the type's own instance field `fields[i]`;
    /// every other slot keeps its zero value
    Assign(Vec<usize>),
    /// Host-supplied constructor
    Custom(ConstructorFn),
}

impl fmt::Debug for ConstructorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstructorBody::Assign(fields) => f.debug_tuple("Assign").field(fields).finish(),
            ConstructorBody::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Declared constructor of a host type
#[derive(Debug, Clone)]
pub struct ConstructorDecl {
    pub(crate) visibility: Visibility,
    pub(crate) params: Vec<TypeId>,
    pub(crate) body: ConstructorBody,
}

impl ConstructorDecl {
    /// Public constructor assigning its arguments to the type's own instance
    /// fields in declaration order
    pub fn assigning(params: Vec<TypeId>) -> Self {
        let fields = (0..params.len()).collect();
        Self {
            visibility: Visibility::Public,
            params,
            body: ConstructorBody::Assign(fields),
        }
    }

    /// Public constructor assigning argument `i` to own instance field `fields[i]`
    pub fn assigning_to(params: Vec<TypeId>, fields: Vec<usize>) -> Self {
        Self {
            visibility: Visibility::Public,
            params,
            body: ConstructorBody::Assign(fields),
        }
    }

    /// Public constructor backed by host code
    pub fn custom<F>(params: Vec<TypeId>, body: F) -> Self
    where
        F: Fn(&HostType, &[Value]) -> HostResult<HostObject> + Send + Sync + 'static,
    {
        Self {
            visibility: Visibility::Public,
            params,
            body: ConstructorBody::Custom(Arc::new(body)),
        }
    }

    /// Set visibility
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Declared visibility
    pub fn visibility_of(&self) -> Visibility {
        self.visibility
    }

    /// Declared parameter types
    pub fn params(&self) -> &[TypeId] {
        &self.params
    }
}

/// Declared method of a host type
#[derive(Clone)]
pub struct MethodDecl {
    pub(crate) name: String,
    pub(crate) visibility: Visibility,
    pub(crate) is_static: bool,
    pub(crate) params: Vec<TypeId>,
    pub(crate) return_type: TypeId,
    pub(crate) body: MethodFn,
}

impl MethodDecl {
    /// Public instance method
    pub fn new<F>(name: impl Into<String>, params: Vec<TypeId>, return_type: TypeId, body: F) -> Self
    where
        F: Fn(Option<&HostObject>, &[Value]) -> HostResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            visibility: Visibility::Public,
            is_static: false,
            params,
            return_type,
            body: Arc::new(body),
        }
    }

    /// Set visibility
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Mark as static
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Host-side name; unstable across releases
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared visibility
    pub fn visibility_of(&self) -> Visibility {
        self.visibility
    }

    /// Whether this is a static method
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Declared parameter types
    pub fn params(&self) -> &[TypeId] {
        &self.params
    }

    /// Declared return type
    pub fn return_type(&self) -> TypeId {
        self.return_type
    }
}

impl fmt::Debug for MethodDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDecl")
            .field("name", &self.name)
            .field("visibility", &self.visibility)
            .field("is_static", &self.is_static)
            .field("params", &self.params)
            .field("return_type", &self.return_type)
            .finish_non_exhaustive()
    }
}

/// Runtime descriptor of one host type
#[derive(Debug, Clone)]
pub struct HostType {
    pub(crate) id: TypeId,
    pub(crate) name: String,
    pub(crate) kind: TypeKind,
    pub(crate) parent: Option<TypeId>,
    pub(crate) interfaces: Vec<TypeId>,
    pub(crate) fields: Vec<FieldDecl>,
    pub(crate) constructors: Vec<ConstructorDecl>,
    pub(crate) methods: Vec<MethodDecl>,
    /// Declared type of every instance slot, inherited slots first
    pub(crate) slot_types: Vec<TypeId>,
}

impl HostType {
    /// Type id
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Registered name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type kind
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// Direct supertype
    pub fn parent(&self) -> Option<TypeId> {
        self.parent
    }

    /// Directly implemented interfaces
    pub fn interfaces(&self) -> &[TypeId] {
        &self.interfaces
    }

    /// Declared fields (own fields only), in declaration order
    pub fn fields(&self) -> &[FieldDecl] {
        &self.fields
    }

    /// Declared constructors, in declaration order
    pub fn constructors(&self) -> &[ConstructorDecl] {
        &self.constructors
    }

    /// Declared methods (own methods only), in declaration order
    pub fn methods(&self) -> &[MethodDecl] {
        &self.methods
    }

    /// Number of instance slots, inherited ones included
    pub fn slot_count(&self) -> usize {
        self.slot_types.len()
    }

    /// Declared type of every instance slot
    pub fn slot_types(&self) -> &[TypeId] {
        &self.slot_types
    }

    /// Primitive kind, if this is a primitive type
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self.kind {
            TypeKind::Primitive(kind) => Some(kind),
            _ => None,
        }
    }

    /// Whether values of this type are primitives
    pub fn is_primitive(&self) -> bool {
        self.primitive_kind().is_some()
    }

    /// Enumeration constants, empty for non-enum types
    pub fn enum_constants(&self) -> &[String] {
        match &self.kind {
            TypeKind::Enum(constants) => constants,
            _ => &[],
        }
    }

    /// Whether this is an enumeration
    pub fn is_enum(&self) -> bool {
        matches!(self.kind, TypeKind::Enum(_))
    }

    /// Instance with every slot at its zero value
    pub fn blank_instance(&self) -> HostObject {
        let slots = self
            .slot_types
            .iter()
            .map(|&ty| builtin::primitive_kind(ty).map_or(Value::Null, PrimitiveKind::zero))
            .collect();
        HostObject::new(self.id, slots)
    }
}
