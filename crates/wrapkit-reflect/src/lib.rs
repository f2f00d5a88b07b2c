//! Structural reflection over host types
//!
//! Host internals are renamed and reshuffled between releases, so wrappers
//! cannot refer to members by name. This crate locates them by shape
//! instead:
//!
//! - [`MemberContract`] + [`MemberMatcher`] find the one constructor, method
//!   or field with a given visibility, arity and parameter/return types.
//! - [`LazyMember`] caches a resolved member for the life of the process.
//! - [`StructureModifier`] reads and writes instance fields by their
//!   position among fields of the same declared type.
//! - [`EquivalentConverter`] maps stable user-facing values to host objects
//!   and back, composing smaller converters for sub-values.
//!
//! # Example
//!
//! ```ignore
//! use wrapkit_reflect::{MemberContract, MemberMatcher, StructureModifier};
//!
//! let ctor = MemberMatcher::new(&registry, icon_type)?.constructor(
//!     &MemberContract::builder()
//!         .require_public()
//!         .return_type_exact(icon_type)
//!         .parameter_count(5)
//!         .build(),
//! )?;
//! let icon = ctor.new_instance(&registry, &args)?;
//!
//! let bytes = StructureModifier::for_type(&registry, icon_type)?.with_type(builtin::BYTE);
//! let x = bytes.read(&icon, 0)?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod config;
mod contract;
pub mod converter;
mod error;
mod lazy;
mod matcher;
mod structure;

pub use config::{LayoutPolicy, ReflectConfig};
pub use contract::{ContractBuilder, MemberContract, NameRule, TypeRule};
pub use converter::enums::{EnumConverter, OrdinalEnum};
pub use converter::{
    EquivalentConverter, HandleConverter, HostHandle, HostPrimitive, ListConverter,
    OptionalConverter, PrimitiveConverter,
};
pub use error::{MemberKind, ReflectError, ReflectResult};
pub use lazy::{LazyMember, ResolutionState};
pub use matcher::{MemberMatcher, MemberRef, ResolvedConstructor, ResolvedField, ResolvedMethod};
pub use structure::{
    ConvertedView, FieldSlot, FieldView, LayoutExpectation, StructureCache, StructureModifier,
};
