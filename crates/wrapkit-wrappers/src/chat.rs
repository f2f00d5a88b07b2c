//! Chat component wrapper
//!
//! Only literal text components are built here; any other component the
//! host hands out is carried around as an opaque handle.

use std::sync::Arc;

use wrapkit_host::{builtin, HostObject, TypeId, TypeRegistry, Value};
use wrapkit_reflect::{
    HostHandle, LazyMember, MemberContract, MemberMatcher, ReflectConfig, ReflectError,
    ReflectResult, ResolvedConstructor, StructureCache,
};

/// Host names of the component interface, newest first
pub const COMPONENT_NAMES: &[&str] = &["Component", "IChatBaseComponent"];

/// Host names of the literal text component, newest first
pub const LITERAL_NAMES: &[&str] = &["LiteralComponent", "ChatComponentText"];

/// A host chat component
#[derive(Debug, Clone, PartialEq)]
pub struct ChatComponent {
    handle: Arc<HostObject>,
}

impl ChatComponent {
    /// Underlying host object
    pub fn handle(&self) -> &Arc<HostObject> {
        &self.handle
    }
}

impl HostHandle for ChatComponent {
    fn from_handle(handle: Arc<HostObject>) -> ReflectResult<Self> {
        Ok(Self { handle })
    }

    fn handle(&self) -> &Arc<HostObject> {
        &self.handle
    }
}

/// Builds and inspects literal chat components
#[derive(Debug)]
pub struct ChatFactory {
    registry: Arc<TypeRegistry>,
    literal: TypeId,
    constructor: LazyMember<ResolvedConstructor>,
    structures: StructureCache,
}

impl ChatFactory {
    /// Resolve the component types of the running host
    pub fn new(registry: Arc<TypeRegistry>, config: &ReflectConfig) -> ReflectResult<Self> {
        let component = config.resolve_type(&registry, "IChatBaseComponent", COMPONENT_NAMES)?;
        let literal = config.resolve_type(&registry, "ChatComponentText", LITERAL_NAMES)?;
        if !registry.is_subtype_of(literal, component) {
            return Err(ReflectError::TypeMismatch {
                expected: registry.type_name(component).to_string(),
                got: registry.type_name(literal).to_string(),
            });
        }

        Ok(Self {
            structures: StructureCache::new(Arc::clone(&registry)),
            registry,
            literal,
            constructor: LazyMember::new(),
        })
    }

    /// Literal component holding `text`
    pub fn from_text(&self, text: &str) -> ReflectResult<ChatComponent> {
        let ctor = self.constructor.get_or_resolve(|| {
            MemberMatcher::new(&self.registry, self.literal)?.constructor(
                &MemberContract::builder()
                    .require_public()
                    .parameters_exact(&[builtin::STRING])
                    .build(),
            )
        })?;
        let obj = ctor.new_instance(&self.registry, &[Value::string(text)])?;
        ChatComponent::from_handle(Arc::new(obj))
    }

    /// Text of a literal component, `None` for components without text
    pub fn plain_text(&self, component: &ChatComponent) -> ReflectResult<Option<String>> {
        let strings = self
            .structures
            .for_object(component.handle())?
            .with_type(builtin::STRING);
        if strings.is_empty() {
            return Ok(None);
        }
        Ok(strings
            .read(component.handle(), 0)?
            .as_str()
            .map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wrapkit_host::fixtures::{self, Release};

    #[test]
    fn test_text_round_trip() {
        for release in [Release::default(), Release::legacy()] {
            let registry = Arc::new(fixtures::map_host_for(&release).unwrap());
            let factory = ChatFactory::new(registry, &ReflectConfig::default()).unwrap();

            let hello = factory.from_text("Hello").unwrap();
            assert_eq!(factory.plain_text(&hello).unwrap().as_deref(), Some("Hello"));
        }
    }

    #[test]
    fn test_component_without_text() {
        let registry = Arc::new(fixtures::map_host().unwrap());
        let factory = ChatFactory::new(Arc::clone(&registry), &ReflectConfig::default()).unwrap();
        let empty = HostObject::new(builtin::OBJECT, vec![]);

        let component = ChatComponent::from_handle(Arc::new(empty)).unwrap();
        assert_eq!(factory.plain_text(&component).unwrap(), None);
    }

    #[test]
    fn test_missing_host_types() {
        let registry = Arc::new(TypeRegistry::new());
        assert!(matches!(
            ChatFactory::new(registry, &ReflectConfig::default()),
            Err(ReflectError::TypeNotFound { .. })
        ));
    }
}
