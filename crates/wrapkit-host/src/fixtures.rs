//! Mock host model for tests and benches
//!
//! Registers a small slice of a game server's internal model: a map
//! decoration record, its icon type enumeration and a text component
//! hierarchy. [`Release`] varies the parts that change between host
//! releases (type names, field names, enumeration length) while keeping the
//! structural shape the wrappers rely on.

use crate::error::HostResult;
use crate::registry::TypeRegistry;
use crate::types::{builtin, ConstructorDecl, FieldDecl, MethodDecl, Visibility};
use crate::value::{HostObject, Value};
use crate::{HostError, TypeBuilder, TypeId};

/// Icon type constants in host ordinal order
pub const ICON_TYPES: [&str; 27] = [
    "PLAYER",
    "FRAME",
    "RED_MARKER",
    "BLUE_MARKER",
    "TARGET_X",
    "TARGET_POINT",
    "PLAYER_OFF_MAP",
    "PLAYER_OFF_LIMITS",
    "MANSION",
    "MONUMENT",
    "BANNER_WHITE",
    "BANNER_ORANGE",
    "BANNER_MAGENTA",
    "BANNER_LIGHT_BLUE",
    "BANNER_YELLOW",
    "BANNER_LIME",
    "BANNER_PINK",
    "BANNER_GRAY",
    "BANNER_LIGHT_GRAY",
    "BANNER_CYAN",
    "BANNER_PURPLE",
    "BANNER_BLUE",
    "BANNER_BROWN",
    "BANNER_GREEN",
    "BANNER_RED",
    "BANNER_BLACK",
    "RED_X",
];

/// Release-specific shape of the mock host
#[derive(Debug, Clone)]
pub struct Release {
    /// Icon type constants
    pub icon_types: Vec<String>,
    /// Use single-letter field names
    pub obfuscated: bool,
    /// Use the older type names (`MapIcon`, `IChatBaseComponent`, ...)
    pub legacy_names: bool,
}

impl Default for Release {
    fn default() -> Self {
        Self {
            icon_types: ICON_TYPES.iter().map(|s| s.to_string()).collect(),
            obfuscated: false,
            legacy_names: false,
        }
    }
}

impl Release {
    /// Older release with legacy type names and obfuscated fields
    pub fn legacy() -> Self {
        Self {
            obfuscated: true,
            legacy_names: true,
            ..Self::default()
        }
    }

    /// Release whose icon enumeration only has the first `count` constants
    pub fn with_icon_types(count: usize) -> Self {
        Self {
            icon_types: ICON_TYPES.iter().take(count).map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    fn names(&self) -> [&'static str; 4] {
        if self.legacy_names {
            ["IChatBaseComponent", "ChatComponentText", "MapIcon$Type", "MapIcon"]
        } else {
            ["Component", "LiteralComponent", "MapDecoration$Type", "MapDecoration"]
        }
    }

    fn field_name(&self, readable: &'static str, obfuscated: &'static str) -> &'static str {
        if self.obfuscated {
            obfuscated
        } else {
            readable
        }
    }
}

/// Mock host registry for the current release
pub fn map_host() -> HostResult<TypeRegistry> {
    map_host_for(&Release::default())
}

/// Mock host registry for a given release
pub fn map_host_for(release: &Release) -> HostResult<TypeRegistry> {
    let [component_name, literal_name, icon_type_name, icon_name] = release.names();
    let mut registry = TypeRegistry::new();

    let component = registry.register(TypeBuilder::interface(component_name))?;

    registry.register(
        TypeBuilder::class(literal_name)
            .implements(component)
            .field(FieldDecl::new(release.field_name("text", "a"), builtin::STRING).as_final())
            .field(FieldDecl::new(release.field_name("siblings", "b"), builtin::LIST))
            .constructor(ConstructorDecl::assigning_to(vec![builtin::STRING], vec![0]))
            .method(MethodDecl::new(
                release.field_name("getText", "c"),
                vec![],
                builtin::STRING,
                |this, _| {
                    let this = this.ok_or_else(|| HostError::Receiver("missing receiver".into()))?;
                    this.slot(0).cloned()
                },
            )),
    )?;

    let icon_type = registry.register(TypeBuilder::enumeration(
        icon_type_name,
        release.icon_types.iter().cloned(),
    ))?;

    registry.register(
        TypeBuilder::class(icon_name)
            .field(FieldDecl::new(release.field_name("type", "a"), icon_type).as_final())
            .field(FieldDecl::new(release.field_name("x", "b"), builtin::BYTE).as_final())
            .field(FieldDecl::new(release.field_name("y", "c"), builtin::BYTE).as_final())
            .field(FieldDecl::new(release.field_name("rot", "d"), builtin::BYTE).as_final())
            .field(FieldDecl::new(release.field_name("name", "e"), component).as_final())
            .constructor(ConstructorDecl::assigning(vec![
                icon_type,
                builtin::BYTE,
                builtin::BYTE,
                builtin::BYTE,
                component,
            ]))
            .constructor(ConstructorDecl::assigning(vec![
                icon_type,
                builtin::BYTE,
                builtin::BYTE,
                builtin::BYTE,
            ]))
            .constructor(ConstructorDecl::assigning(vec![]).visibility(Visibility::Private))
            .method(MethodDecl::new(
                release.field_name("renderOnFrame", "a"),
                vec![],
                builtin::BOOL,
                |this, _| {
                    let this = this.ok_or_else(|| HostError::Receiver("missing receiver".into()))?;
                    Ok(Value::Bool(this.slot(0)?.as_enum().is_some_and(|c| c.ordinal == 0)))
                },
            )),
    )?;

    Ok(registry)
}

/// Allocate a literal text component directly, bypassing any wrapper
pub fn literal_component(registry: &TypeRegistry, text: &str) -> HostResult<Value> {
    let literal = literal_type(registry)?;
    let obj: HostObject = registry.construct(literal, 0, &[Value::string(text)])?;
    Ok(Value::object(obj))
}

fn literal_type(registry: &TypeRegistry) -> HostResult<TypeId> {
    registry
        .find_first(&["LiteralComponent", "ChatComponentText"])
        .ok_or_else(|| HostError::Rejected("no literal component type registered".into()))
}
