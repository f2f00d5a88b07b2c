//! Map icon wrapper
//!
//! A map icon (a "decoration" in newer releases) is a small immutable host
//! record: icon type, x and y offsets, a rotation quantized to sixteenths of
//! a turn and an optional display name. [`MapIconConverter`] builds host
//! icons through the public five-parameter constructor and reads them back by
//! field position, so it keeps working when the host renames the type or its
//! fields.

use std::sync::Arc;

use tracing::trace;
use wrapkit_host::{builtin, TypeId, TypeRegistry, Value};
use wrapkit_reflect::{
    EnumConverter, EquivalentConverter, HandleConverter, LayoutExpectation, LazyMember,
    MemberContract, MemberMatcher, OptionalConverter, ReflectConfig, ReflectError, ReflectResult,
    ResolvedConstructor, StructureCache,
};

use crate::chat::{ChatComponent, COMPONENT_NAMES};

/// Degrees per rotation step
pub const ROTATION_STEP: f64 = 22.5;

/// Host names of the icon record, newest first
pub const ICON_NAMES: &[&str] = &["MapDecoration", "MapIcon"];

/// Host names of the icon type enumeration, newest first
pub const ICON_TYPE_NAMES: &[&str] = &["MapDecoration$Type", "MapIcon$Type"];

wrapkit_reflect::ordinal_enum! {
    /// Icon shown on a map, in host ordinal order
    pub enum MapIconType {
        /// Player on the map
        Player,
        /// Item frame holding the map
        Frame,
        /// Red marker
        RedMarker,
        /// Blue marker
        BlueMarker,
        /// Target cross
        TargetX,
        /// Target point
        TargetPoint,
        /// Player beyond the map edge
        PlayerOffMap,
        /// Player far beyond the map edge
        PlayerOffLimits,
        /// Woodland mansion
        Mansion,
        /// Ocean monument
        Monument,
        /// White banner
        BannerWhite,
        /// Orange banner
        BannerOrange,
        /// Magenta banner
        BannerMagenta,
        /// Light blue banner
        BannerLightBlue,
        /// Yellow banner
        BannerYellow,
        /// Lime banner
        BannerLime,
        /// Pink banner
        BannerPink,
        /// Gray banner
        BannerGray,
        /// Light gray banner
        BannerLightGray,
        /// Cyan banner
        BannerCyan,
        /// Purple banner
        BannerPurple,
        /// Blue banner
        BannerBlue,
        /// Brown banner
        BannerBrown,
        /// Green banner
        BannerGreen,
        /// Red banner
        BannerRed,
        /// Black banner
        BannerBlack,
        /// Red cross
        RedX,
    }
}

/// Stable map icon value
///
/// Rotation is kept in whole steps of [`ROTATION_STEP`] degrees, exactly as
/// the host stores it, so two icons compare equal when the host would render
/// them the same.
#[derive(Debug, Clone, PartialEq)]
pub struct MapIcon {
    icon_type: MapIconType,
    x: i8,
    y: i8,
    rotation: i8,
    name: Option<ChatComponent>,
}

impl Default for MapIcon {
    fn default() -> Self {
        Self {
            icon_type: MapIconType::Player,
            x: 0,
            y: 0,
            rotation: 0,
            name: None,
        }
    }
}

impl MapIcon {
    /// Icon with `rotation` given in degrees
    pub fn new(
        icon_type: MapIconType,
        x: i8,
        y: i8,
        rotation: f64,
        name: Option<ChatComponent>,
    ) -> Self {
        let mut icon = Self {
            icon_type,
            x,
            y,
            rotation: 0,
            name,
        };
        icon.set_rotation(rotation);
        icon
    }

    /// Converter for the running host
    pub fn converter(
        registry: Arc<TypeRegistry>,
        config: &ReflectConfig,
    ) -> ReflectResult<MapIconConverter> {
        MapIconConverter::new(registry, config)
    }

    /// Icon type
    pub fn icon_type(&self) -> MapIconType {
        self.icon_type
    }

    /// Set the icon type
    pub fn set_icon_type(&mut self, icon_type: MapIconType) {
        self.icon_type = icon_type;
    }

    /// Horizontal offset
    pub fn x(&self) -> i8 {
        self.x
    }

    /// Set the horizontal offset
    pub fn set_x(&mut self, x: i8) {
        self.x = x;
    }

    /// Vertical offset
    pub fn y(&self) -> i8 {
        self.y
    }

    /// Set the vertical offset
    pub fn set_y(&mut self, y: i8) {
        self.y = y;
    }

    /// Rotation in degrees, a multiple of [`ROTATION_STEP`]
    pub fn rotation(&self) -> f64 {
        f64::from(self.rotation) * ROTATION_STEP
    }

    /// Rotation in host steps
    pub fn rotation_steps(&self) -> i8 {
        self.rotation
    }

    /// Set the rotation in degrees
    ///
    /// The angle is divided by [`ROTATION_STEP`] and truncated toward zero;
    /// step counts outside the byte range wrap around.
    pub fn set_rotation(&mut self, degrees: f64) {
        self.rotation = (degrees / ROTATION_STEP) as i32 as i8;
    }

    /// Display name
    pub fn name(&self) -> Option<&ChatComponent> {
        self.name.as_ref()
    }

    /// Set or clear the display name
    pub fn set_name(&mut self, name: Option<ChatComponent>) {
        self.name = name;
    }
}

/// Converts [`MapIcon`] to and from host icon records
#[derive(Debug)]
pub struct MapIconConverter {
    registry: Arc<TypeRegistry>,
    icon: TypeId,
    component: TypeId,
    icon_types: EnumConverter<MapIconType>,
    names: OptionalConverter<HandleConverter<ChatComponent>>,
    contract: MemberContract,
    constructor: LazyMember<ResolvedConstructor>,
    structures: StructureCache,
}

impl MapIconConverter {
    /// Resolve the icon types of the running host and check their layout
    /// under the configured policy
    pub fn new(registry: Arc<TypeRegistry>, config: &ReflectConfig) -> ReflectResult<Self> {
        let icon = config.resolve_type(&registry, "MapIcon", ICON_NAMES)?;
        let icon_type = config.resolve_type(&registry, "MapIcon$Type", ICON_TYPE_NAMES)?;
        let component = config.resolve_type(&registry, "IChatBaseComponent", COMPONENT_NAMES)?;

        let icon_types = EnumConverter::new(&registry, icon_type)?;
        icon_types.check_alignment(config.layout_policy)?;

        let structures = StructureCache::new(Arc::clone(&registry));
        structures.get(icon)?.check_layout(
            &[
                LayoutExpectation::exactly(1, icon_type),
                LayoutExpectation::exactly(3, builtin::BYTE),
                LayoutExpectation::exactly(1, component),
            ],
            config.layout_policy,
        )?;

        Ok(Self {
            registry,
            icon,
            component,
            icon_types,
            names: OptionalConverter::new(HandleConverter::new()),
            contract: MemberContract::builder()
                .require_public()
                .return_type_exact(icon)
                .parameter_count(5)
                .build(),
            constructor: LazyMember::new(),
            structures,
        })
    }

    /// Host icon record type
    pub fn icon_type(&self) -> TypeId {
        self.icon
    }

    fn constructor(&self) -> ReflectResult<&ResolvedConstructor> {
        self.constructor
            .get_or_resolve(|| MemberMatcher::new(&self.registry, self.icon)?.constructor(&self.contract))
    }
}

impl EquivalentConverter for MapIconConverter {
    type Stable = MapIcon;

    fn to_opaque(&self, icon: &MapIcon) -> ReflectResult<Value> {
        let args = [
            self.icon_types.to_opaque(&icon.icon_type)?,
            Value::Byte(icon.x),
            Value::Byte(icon.y),
            Value::Byte(icon.rotation),
            self.names.to_opaque(&icon.name)?,
        ];
        let obj = self.constructor()?.new_instance(&self.registry, &args)?;
        trace!(icon_type = ?icon.icon_type, "built host map icon");
        Ok(Value::object(obj))
    }

    fn to_stable(&self, opaque: &Value) -> ReflectResult<MapIcon> {
        let obj = opaque.as_object().ok_or_else(|| ReflectError::UnexpectedValue {
            expected: self.registry.type_name(self.icon).to_string(),
            got: opaque.kind_name().to_string(),
        })?;
        if !self.registry.is_subtype_of(obj.type_id(), self.icon) {
            return Err(ReflectError::TypeMismatch {
                expected: self.registry.type_name(self.icon).to_string(),
                got: self.registry.type_name(obj.type_id()).to_string(),
            });
        }

        let modifier = self.structures.for_object(obj)?;
        let bytes = modifier.with_type(builtin::BYTE);
        let icon_type = modifier
            .with_type_converted(self.icon_types.opaque_type(), &self.icon_types)
            .read(obj, 0)?;
        let name = modifier
            .with_type_converted(self.component, &self.names)
            .read(obj, 0)?;

        let byte_at = |index: usize| -> ReflectResult<i8> {
            let value = bytes.read(obj, index)?;
            value.as_byte().ok_or_else(|| ReflectError::UnexpectedValue {
                expected: "byte".to_string(),
                got: value.kind_name().to_string(),
            })
        };

        Ok(MapIcon {
            icon_type,
            x: byte_at(0)?,
            y: byte_at(1)?,
            rotation: byte_at(2)?,
            name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wrapkit_reflect::OrdinalEnum;

    #[test]
    fn test_rotation_quantization() {
        let mut icon = MapIcon::default();
        for (degrees, expected) in [(0.0, 0.0), (22.5, 22.5), (100.0, 90.0), (200.0, 180.0), (-30.0, -22.5)] {
            icon.set_rotation(degrees);
            assert_eq!(icon.rotation(), expected, "{degrees}");
        }
    }

    #[test]
    fn test_rotation_wraps_like_a_byte() {
        let mut icon = MapIcon::default();
        icon.set_rotation(128.0 * ROTATION_STEP);
        assert_eq!(icon.rotation_steps(), -128);
        icon.set_rotation(f64::NAN);
        assert_eq!(icon.rotation_steps(), 0);
    }

    #[test]
    fn test_default_icon() {
        let icon = MapIcon::default();
        assert_eq!(icon.icon_type(), MapIconType::Player);
        assert_eq!((icon.x(), icon.y(), icon.rotation()), (0, 0, 0.0));
        assert!(icon.name().is_none());
    }

    #[test]
    fn test_icon_types_follow_host_order() {
        assert_eq!(MapIconType::VARIANTS.len(), 27);
        assert_eq!(MapIconType::Player.ordinal(), 0);
        assert_eq!(MapIconType::Mansion.ordinal(), 8);
        assert_eq!(MapIconType::RedX.ordinal(), 26);
    }
}
