//! Stable wrappers for host values
//!
//! Each wrapper pairs a plain Rust value with an
//! [`EquivalentConverter`](wrapkit_reflect::EquivalentConverter) that builds
//! the host representation and reads it back, whatever the running host
//! release calls its types and fields.
//!
//! ```ignore
//! use wrapkit_reflect::{EquivalentConverter, ReflectConfig};
//! use wrapkit_wrappers::{MapIcon, MapIconType};
//!
//! let converter = MapIcon::converter(registry, &ReflectConfig::default())?;
//! let host_icon = converter.to_opaque(&MapIcon::new(MapIconType::Player, 10, -20, 90.0, None))?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod chat;
mod map_icon;

pub use chat::{ChatComponent, ChatFactory, COMPONENT_NAMES, LITERAL_NAMES};
pub use map_icon::{
    MapIcon, MapIconConverter, MapIconType, ICON_NAMES, ICON_TYPE_NAMES, ROTATION_STEP,
};
