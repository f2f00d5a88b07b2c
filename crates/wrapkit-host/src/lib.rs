//! Wrapkit host object model
//!
//! Hosts describe their internal classes to wrapkit through a
//! [`TypeRegistry`]: every type declares its fields, constructors and methods
//! in order, and instances are dynamically-typed [`HostObject`]s whose slots
//! follow that declaration order. Nothing here is stable across host
//! releases except the *shape* of each type; the `wrapkit-reflect` crate
//! locates members by that shape.
//!
//! # Example
//!
//! ```ignore
//! use wrapkit_host::{builtin, ConstructorDecl, FieldDecl, TypeBuilder, TypeRegistry, Value};
//!
//! let mut registry = TypeRegistry::new();
//! let point = registry.register(
//!     TypeBuilder::class("Point")
//!         .field(FieldDecl::new("x", builtin::INT))
//!         .field(FieldDecl::new("y", builtin::INT))
//!         .constructor(ConstructorDecl::assigning(vec![builtin::INT, builtin::INT])),
//! )?;
//! let obj = registry.construct(point, 0, &[Value::Int(1), Value::Int(2)])?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod builder;
mod error;
mod registry;
mod types;
mod value;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use builder::TypeBuilder;
pub use error::{HostError, HostResult};
pub use registry::TypeRegistry;
pub use types::{
    builtin, ConstructorDecl, FieldDecl, HostType, MethodDecl, PrimitiveKind, TypeId, TypeKind,
    Visibility,
};
pub use value::{EnumConstant, HostObject, Value};
