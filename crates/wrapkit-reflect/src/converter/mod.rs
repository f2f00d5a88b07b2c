//! Equivalence converters
//!
//! An [`EquivalentConverter`] maps a stable, version-independent value to
//! its host representation and back. For every value in a converter's
//! domain `to_stable(to_opaque(v)) == v`. Converters compose: structured
//! converters hold nested converters for their sub-values instead of
//! extending each other.
//!
//! The building blocks here cover host primitives ([`PrimitiveConverter`]),
//! nullable payloads ([`OptionalConverter`]), lists ([`ListConverter`]) and
//! wrappers that simply own a host object ([`HandleConverter`]). Enumerations
//! live in [`enums`].

pub mod enums;

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use wrapkit_host::{builtin, HostObject, TypeId, Value};

use crate::error::{ReflectError, ReflectResult};

/// Bidirectional mapping between a stable value and its host representation
pub trait EquivalentConverter: Send + Sync {
    /// Stable, user-facing type
    type Stable;

    /// Build the host representation of `stable`
    fn to_opaque(&self, stable: &Self::Stable) -> ReflectResult<Value>;

    /// Build the stable value for a host representation
    fn to_stable(&self, opaque: &Value) -> ReflectResult<Self::Stable>;

    /// Name of the stable type, for diagnostics
    fn stable_type_name(&self) -> &'static str {
        std::any::type_name::<Self::Stable>()
    }
}

impl<C: EquivalentConverter + ?Sized> EquivalentConverter for &C {
    type Stable = C::Stable;

    fn to_opaque(&self, stable: &Self::Stable) -> ReflectResult<Value> {
        (**self).to_opaque(stable)
    }

    fn to_stable(&self, opaque: &Value) -> ReflectResult<Self::Stable> {
        (**self).to_stable(opaque)
    }
}

impl<C: EquivalentConverter + ?Sized> EquivalentConverter for Arc<C> {
    type Stable = C::Stable;

    fn to_opaque(&self, stable: &Self::Stable) -> ReflectResult<Value> {
        (**self).to_opaque(stable)
    }

    fn to_stable(&self, opaque: &Value) -> ReflectResult<Self::Stable> {
        (**self).to_stable(opaque)
    }
}

fn unexpected(expected: impl Into<String>, got: &Value) -> ReflectError {
    ReflectError::UnexpectedValue {
        expected: expected.into(),
        got: got.kind_name().to_string(),
    }
}

/// Rust types stored directly in host slots
pub trait HostPrimitive: Sized + Send + Sync + 'static {
    /// Host type of the value
    const TYPE: TypeId;

    /// Host representation
    fn to_value(&self) -> Value;

    /// Extract from a host value of the matching shape
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! host_primitive {
    ($($ty:ty => $variant:ident, $host:ident);+ $(;)?) => {
        $(
            impl HostPrimitive for $ty {
                const TYPE: TypeId = builtin::$host;

                fn to_value(&self) -> Value {
                    Value::$variant(*self)
                }

                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => Some(*v),
                        _ => None,
                    }
                }
            }
        )+
    };
}

host_primitive! {
    bool => Bool, BOOL;
    i8 => Byte, BYTE;
    i16 => Short, SHORT;
    i32 => Int, INT;
    i64 => Long, LONG;
    f32 => Float, FLOAT;
    f64 => Double, DOUBLE;
}

impl HostPrimitive for String {
    const TYPE: TypeId = builtin::STRING;

    fn to_value(&self) -> Value {
        Value::string(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

/// Identity converter for host primitives and strings
pub struct PrimitiveConverter<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> PrimitiveConverter<T> {
    /// Create the converter
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for PrimitiveConverter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for PrimitiveConverter<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for PrimitiveConverter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrimitiveConverter<{}>", std::any::type_name::<T>())
    }
}

impl<T: HostPrimitive> EquivalentConverter for PrimitiveConverter<T> {
    type Stable = T;

    fn to_opaque(&self, stable: &T) -> ReflectResult<Value> {
        Ok(stable.to_value())
    }

    fn to_stable(&self, opaque: &Value) -> ReflectResult<T> {
        T::from_value(opaque).ok_or_else(|| unexpected(std::any::type_name::<T>(), opaque))
    }
}

/// Maps `None` to host null and delegates everything else
///
/// Null stays null in both directions; it never becomes a default value.
#[derive(Debug, Clone, Default)]
pub struct OptionalConverter<C> {
    inner: C,
}

impl<C> OptionalConverter<C> {
    /// Wrap a converter
    pub const fn new(inner: C) -> Self {
        Self { inner }
    }
}

impl<C: EquivalentConverter> EquivalentConverter for OptionalConverter<C> {
    type Stable = Option<C::Stable>;

    fn to_opaque(&self, stable: &Self::Stable) -> ReflectResult<Value> {
        match stable {
            Some(value) => self.inner.to_opaque(value),
            None => Ok(Value::Null),
        }
    }

    fn to_stable(&self, opaque: &Value) -> ReflectResult<Self::Stable> {
        match opaque {
            Value::Null => Ok(None),
            value => self.inner.to_stable(value).map(Some),
        }
    }
}

/// Converts host lists element by element
#[derive(Debug, Clone, Default)]
pub struct ListConverter<C> {
    element: C,
}

impl<C> ListConverter<C> {
    /// Converter for lists of `element`
    pub const fn new(element: C) -> Self {
        Self { element }
    }
}

impl<C: EquivalentConverter> EquivalentConverter for ListConverter<C> {
    type Stable = Vec<C::Stable>;

    fn to_opaque(&self, stable: &Self::Stable) -> ReflectResult<Value> {
        let items = stable
            .iter()
            .map(|item| self.element.to_opaque(item))
            .collect::<ReflectResult<Vec<_>>>()?;
        Ok(Value::list(items))
    }

    fn to_stable(&self, opaque: &Value) -> ReflectResult<Self::Stable> {
        match opaque {
            Value::List(items) => items.iter().map(|item| self.element.to_stable(item)).collect(),
            other => Err(unexpected("list", other)),
        }
    }
}

/// A wrapper whose stable form is just an owned host object
pub trait HostHandle: Sized {
    /// Wrap a host object
    fn from_handle(handle: Arc<HostObject>) -> ReflectResult<Self>;

    /// Wrapped host object
    fn handle(&self) -> &Arc<HostObject>;
}

/// Converter for [`HostHandle`] wrappers
pub struct HandleConverter<W> {
    _marker: PhantomData<fn() -> W>,
}

impl<W> HandleConverter<W> {
    /// Create the converter
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<W> Default for HandleConverter<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W> Clone for HandleConverter<W> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<W> fmt::Debug for HandleConverter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HandleConverter<{}>", std::any::type_name::<W>())
    }
}

impl<W: HostHandle> EquivalentConverter for HandleConverter<W> {
    type Stable = W;

    fn to_opaque(&self, stable: &W) -> ReflectResult<Value> {
        Ok(Value::Object(Arc::clone(stable.handle())))
    }

    fn to_stable(&self, opaque: &Value) -> ReflectResult<W> {
        match opaque {
            Value::Object(obj) => W::from_handle(Arc::clone(obj)),
            other => Err(unexpected(std::any::type_name::<W>(), other)),
        }
    }
}
