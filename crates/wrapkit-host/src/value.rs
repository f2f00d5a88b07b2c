//! Dynamic values and host object instances

use std::fmt;
use std::sync::Arc;

use crate::error::{HostError, HostResult};
use crate::types::{builtin, TypeId};

/// Reference to one constant of a host enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumConstant {
    /// Enumeration type
    pub type_id: TypeId,
    /// Position in the enumeration's constant table
    pub ordinal: usize,
}

impl EnumConstant {
    /// Create a constant reference
    pub const fn new(type_id: TypeId, ordinal: usize) -> Self {
        Self { type_id, ordinal }
    }
}

/// A value held by a host object slot or passed to a host member
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent reference
    #[default]
    Null,
    /// `boolean`
    Bool(bool),
    /// `i8`
    Byte(i8),
    /// `i16`
    Short(i16),
    /// `i32`
    Int(i32),
    /// `i64`
    Long(i64),
    /// `f32`
    Float(f32),
    /// `f64`
    Double(f64),
    /// Immutable string
    Str(Arc<str>),
    /// Enumeration constant
    Enum(EnumConstant),
    /// Ordered list
    List(Arc<[Value]>),
    /// Host object
    Object(Arc<HostObject>),
}

impl Value {
    /// Wrap a string
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::Str(Arc::from(s.as_ref()))
    }

    /// Wrap a list
    pub fn list(values: impl IntoIterator<Item = Value>) -> Self {
        Value::List(values.into_iter().collect())
    }

    /// Wrap an object
    pub fn object(obj: HostObject) -> Self {
        Value::Object(Arc::new(obj))
    }

    /// Whether this is the null reference
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Runtime type, `None` for null
    pub fn runtime_type(&self) -> Option<TypeId> {
        let ty = match self {
            Value::Null => return None,
            Value::Bool(_) => builtin::BOOL,
            Value::Byte(_) => builtin::BYTE,
            Value::Short(_) => builtin::SHORT,
            Value::Int(_) => builtin::INT,
            Value::Long(_) => builtin::LONG,
            Value::Float(_) => builtin::FLOAT,
            Value::Double(_) => builtin::DOUBLE,
            Value::Str(_) => builtin::STRING,
            Value::List(_) => builtin::LIST,
            Value::Enum(constant) => constant.type_id,
            Value::Object(obj) => obj.type_id(),
        };
        Some(ty)
    }

    /// Short name of the value's shape, used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Byte(_) => "byte",
            Value::Short(_) => "short",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Str(_) => "string",
            Value::Enum(_) => "enum",
            Value::List(_) => "list",
            Value::Object(_) => "object",
        }
    }

    /// Borrow the object, if this is one
    pub fn as_object(&self) -> Option<&Arc<HostObject>> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Enumeration constant, if this is one
    pub fn as_enum(&self) -> Option<EnumConstant> {
        match self {
            Value::Enum(constant) => Some(*constant),
            _ => None,
        }
    }

    /// Byte payload
    pub fn as_byte(&self) -> Option<i8> {
        match self {
            Value::Byte(b) => Some(*b),
            _ => None,
        }
    }

    /// String payload
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Byte(v) => write!(f, "{}b", v),
            Value::Short(v) => write!(f, "{}s", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}L", v),
            Value::Float(v) => write!(f, "{}f", v),
            Value::Double(v) => write!(f, "{}d", v),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Enum(c) => write!(f, "{}[{}]", c.type_id, c.ordinal),
            Value::List(items) => write!(f, "[{} items]", items.len()),
            Value::Object(obj) => write!(f, "{}@{} slots", obj.type_id(), obj.slots().len()),
        }
    }
}

/// An instance of a host class
///
/// Slots follow the declaring type's layout: inherited instance fields
/// first, then the type's own instance fields, each in declaration order.
/// Slot writes do not check declared types; that is the job of whoever
/// holds the type information.
#[derive(Debug, Clone, PartialEq)]
pub struct HostObject {
    type_id: TypeId,
    slots: Vec<Value>,
}

impl HostObject {
    /// Create an object from its slot values
    pub fn new(type_id: TypeId, slots: Vec<Value>) -> Self {
        Self { type_id, slots }
    }

    /// Runtime type of this object
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// All slots in layout order
    pub fn slots(&self) -> &[Value] {
        &self.slots
    }

    /// Read a slot
    pub fn slot(&self, slot: usize) -> HostResult<&Value> {
        self.slots.get(slot).ok_or(HostError::SlotOutOfBounds {
            slot,
            len: self.slots.len(),
        })
    }

    /// Overwrite a slot, returning the previous value
    pub fn set_slot(&mut self, slot: usize, value: Value) -> HostResult<Value> {
        let len = self.slots.len();
        let target = self
            .slots
            .get_mut(slot)
            .ok_or(HostError::SlotOutOfBounds { slot, len })?;
        Ok(std::mem::replace(target, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_types() {
        assert_eq!(Value::Null.runtime_type(), None);
        assert_eq!(Value::Byte(3).runtime_type(), Some(builtin::BYTE));
        assert_eq!(Value::string("x").runtime_type(), Some(builtin::STRING));
        assert_eq!(Value::list([Value::Int(1)]).runtime_type(), Some(builtin::LIST));

        let obj = HostObject::new(TypeId(42), vec![]);
        assert_eq!(Value::object(obj).runtime_type(), Some(TypeId(42)));
    }

    #[test]
    fn test_slot_access() {
        let mut obj = HostObject::new(TypeId(20), vec![Value::Int(1), Value::Null]);

        assert_eq!(obj.slot(0), Ok(&Value::Int(1)));
        let old = obj.set_slot(1, Value::string("hi")).unwrap();
        assert!(old.is_null());
        assert_eq!(obj.slot(1).unwrap().as_str(), Some("hi"));

        assert_eq!(
            obj.set_slot(2, Value::Null),
            Err(HostError::SlotOutOfBounds { slot: 2, len: 2 })
        );
    }

    #[test]
    fn test_value_equality_is_structural() {
        let a = Value::object(HostObject::new(TypeId(20), vec![Value::Byte(1)]));
        let b = Value::object(HostObject::new(TypeId(20), vec![Value::Byte(1)]));
        let c = Value::object(HostObject::new(TypeId(20), vec![Value::Byte(2)]));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
