//! Positional field access against the mock host model

use std::sync::Arc;

use wrapkit_host::fixtures::{self, Release};
use wrapkit_host::{builtin, EnumConstant, TypeId, TypeRegistry, Value};
use wrapkit_reflect::{
    EnumConverter, LayoutExpectation, LayoutPolicy, ReflectConfig, ReflectError, StructureCache,
};

wrapkit_reflect::ordinal_enum! {
    enum Marker {
        Player,
        Frame,
        RedMarker,
    }
}

fn icon_layout(registry: &TypeRegistry) -> (TypeId, TypeId, TypeId) {
    let config = ReflectConfig::default();
    let icon = config
        .resolve_type(registry, "MapIcon", &["MapIcon", "MapDecoration"])
        .unwrap();
    let icon_type = config
        .resolve_type(registry, "MapIcon$Type", &["MapIcon$Type", "MapDecoration$Type"])
        .unwrap();
    let component = config
        .resolve_type(registry, "IChatBaseComponent", &["IChatBaseComponent", "Component"])
        .unwrap();
    (icon, icon_type, component)
}

fn sample_icon(registry: &TypeRegistry, icon: TypeId, icon_type: TypeId) -> wrapkit_host::HostObject {
    registry
        .construct(
            icon,
            1,
            &[
                Value::Enum(EnumConstant::new(icon_type, 2)),
                Value::Byte(10),
                Value::Byte(-20),
                Value::Byte(4),
            ],
        )
        .unwrap()
}

#[test]
fn test_byte_fields_by_position_across_releases() {
    for release in [Release::default(), Release::legacy()] {
        let registry = Arc::new(fixtures::map_host_for(&release).unwrap());
        let (icon, icon_type, component) = icon_layout(&registry);
        let cache = StructureCache::new(Arc::clone(&registry));
        let obj = sample_icon(&registry, icon, icon_type);

        let modifier = cache.for_object(&obj).unwrap();
        let bytes = modifier.with_type(builtin::BYTE);
        assert_eq!(
            bytes.values(&obj).unwrap(),
            vec![Value::Byte(10), Value::Byte(-20), Value::Byte(4)]
        );
        assert_eq!(modifier.with_type(component).read(&obj, 0).unwrap(), Value::Null);

        let markers = modifier.with_type_converted(
            icon_type,
            EnumConverter::<Marker>::new(&registry, icon_type).unwrap(),
        );
        assert_eq!(markers.read(&obj, 0).unwrap(), Marker::RedMarker);
    }
}

#[test]
fn test_write_through_view() {
    let registry = Arc::new(fixtures::map_host().unwrap());
    let (icon, icon_type, component) = icon_layout(&registry);
    let cache = StructureCache::new(Arc::clone(&registry));
    let mut obj = sample_icon(&registry, icon, icon_type);
    let modifier = cache.get(icon).unwrap();

    let text = fixtures::literal_component(&registry, "Spawn").unwrap();
    modifier.with_type(component).write(&mut obj, 0, text.clone()).unwrap();
    assert_eq!(modifier.with_type(component).read(&obj, 0).unwrap(), text);

    assert!(matches!(
        modifier.with_type(component).write(&mut obj, 0, Value::string("Spawn")),
        Err(ReflectError::TypeMismatch { .. })
    ));
    assert!(matches!(
        modifier.with_type(builtin::BYTE).write(&mut obj, 3, Value::Byte(0)),
        Err(ReflectError::IndexOutOfRange { index: 3, len: 3, .. })
    ));
}

#[test]
fn test_layout_expectations_for_icon() {
    let registry = Arc::new(fixtures::map_host().unwrap());
    let (icon, icon_type, component) = icon_layout(&registry);
    let modifier = StructureCache::new(Arc::clone(&registry)).get(icon).unwrap();

    let expected = [
        LayoutExpectation::exactly(1, icon_type),
        LayoutExpectation::exactly(3, builtin::BYTE),
        LayoutExpectation::exactly(1, component),
    ];
    assert!(modifier.check_layout(&expected, LayoutPolicy::Strict).is_ok());

    let four_bytes = [LayoutExpectation::exactly(4, builtin::BYTE)];
    let err = modifier
        .check_layout(&four_bytes, LayoutPolicy::Strict)
        .unwrap_err();
    assert!(err.to_string().contains("expected 4 byte fields, found 3"), "{err}");
}

#[test]
fn test_enum_converter_alignment_with_diverged_release() {
    let registry = fixtures::map_host_for(&Release::with_icon_types(2)).unwrap();
    let (_, icon_type, _) = icon_layout(&registry);
    let converter = EnumConverter::<Marker>::new(&registry, icon_type).unwrap();

    assert!(matches!(
        converter.check_alignment(LayoutPolicy::Strict),
        Err(ReflectError::LayoutMismatch { expected: 3, found: 2, .. })
    ));
}
