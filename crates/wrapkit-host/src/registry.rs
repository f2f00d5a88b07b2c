//! Registry of host types
//!
//! The registry owns every [`HostType`] and answers the structural questions
//! the reflection layer asks: subtyping, assignability of values to declared
//! types, and dispatch of constructors and methods by index.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::builder::TypeBuilder;
use crate::error::{HostError, HostResult};
use crate::types::{builtin, ConstructorBody, HostType, PrimitiveKind, TypeId, TypeKind};
use crate::value::{EnumConstant, HostObject, Value};

/// Registry of all host types known to a process
#[derive(Debug)]
pub struct TypeRegistry {
    types: Vec<HostType>,
    by_name: FxHashMap<String, TypeId>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Create a registry holding only the built-in types
    pub fn new() -> Self {
        let mut registry = Self {
            types: Vec::new(),
            by_name: FxHashMap::default(),
        };

        let builtins = [
            ("void", TypeKind::Void),
            ("boolean", TypeKind::Primitive(PrimitiveKind::Bool)),
            ("byte", TypeKind::Primitive(PrimitiveKind::Byte)),
            ("short", TypeKind::Primitive(PrimitiveKind::Short)),
            ("int", TypeKind::Primitive(PrimitiveKind::Int)),
            ("long", TypeKind::Primitive(PrimitiveKind::Long)),
            ("float", TypeKind::Primitive(PrimitiveKind::Float)),
            ("double", TypeKind::Primitive(PrimitiveKind::Double)),
            ("Object", TypeKind::Class),
            ("String", TypeKind::Class),
            ("List", TypeKind::Class),
        ];
        for (name, kind) in builtins {
            let id = TypeId(registry.types.len() as u32);
            let parent = match kind {
                TypeKind::Class if id != builtin::OBJECT => Some(builtin::OBJECT),
                _ => None,
            };
            registry.by_name.insert(name.to_string(), id);
            registry.types.push(HostType {
                id,
                name: name.to_string(),
                kind,
                parent,
                interfaces: Vec::new(),
                fields: Vec::new(),
                constructors: Vec::new(),
                methods: Vec::new(),
                slot_types: Vec::new(),
            });
        }
        debug_assert_eq!(registry.types.len() as u32, builtin::COUNT);

        registry
    }

    /// Register a type and return its id
    ///
    /// Every type referenced by the definition must already be registered,
    /// so supertypes are registered before their subtypes.
    pub fn register(&mut self, builder: TypeBuilder) -> HostResult<TypeId> {
        let TypeBuilder {
            name,
            kind,
            parent,
            interfaces,
            mut fields,
            constructors,
            methods,
        } = builder;

        if self.by_name.contains_key(&name) {
            return Err(HostError::DuplicateType(name));
        }
        let invalid = |reason: String| HostError::InvalidDefinition {
            name: name.clone(),
            reason,
        };

        let parent = match (&kind, parent) {
            (TypeKind::Interface, Some(_)) => {
                return Err(invalid("interfaces cannot extend a class".into()))
            }
            (TypeKind::Interface, None) => None,
            (TypeKind::Enum(_), Some(_)) => {
                return Err(invalid("enumerations cannot extend a class".into()))
            }
            (TypeKind::Enum(_), None) => Some(builtin::OBJECT),
            (TypeKind::Class, parent) => {
                let parent = parent.unwrap_or(builtin::OBJECT);
                let parent_type = self.type_of(parent)?;
                if !matches!(parent_type.kind, TypeKind::Class) || parent == builtin::STRING {
                    return Err(invalid(format!("cannot extend {}", parent_type.name)));
                }
                Some(parent)
            }
            _ => return Err(invalid("only classes, interfaces and enums can be registered".into())),
        };

        for &iface in &interfaces {
            if !matches!(self.type_of(iface)?.kind, TypeKind::Interface) {
                return Err(invalid(format!("{} is not an interface", self.type_name(iface))));
            }
        }

        if !matches!(kind, TypeKind::Class) && !constructors.is_empty() {
            return Err(invalid("only classes declare constructors".into()));
        }

        // Inherited slots come first so a subtype instance can be read
        // through its supertype's layout
        let mut slot_types = match parent {
            Some(parent) => self.type_of(parent)?.slot_types.clone(),
            None => Vec::new(),
        };
        let mut own_slots = Vec::new();
        for field in &mut fields {
            self.check_value_type(field.declared_type, &invalid)?;
            if field.is_static {
                continue;
            }
            if !matches!(kind, TypeKind::Class) {
                return Err(invalid(format!("instance field {} outside a class", field.name)));
            }
            field.slot = Some(slot_types.len());
            own_slots.push(field.declared_type);
            slot_types.push(field.declared_type);
        }

        for (index, ctor) in constructors.iter().enumerate() {
            for &param in &ctor.params {
                self.check_value_type(param, &invalid)?;
            }
            if let ConstructorBody::Assign(targets) = &ctor.body {
                if targets.len() != ctor.params.len() {
                    return Err(invalid(format!(
                        "constructor #{} assigns {} fields from {} parameters",
                        index,
                        targets.len(),
                        ctor.params.len()
                    )));
                }
                for (&param, &target) in ctor.params.iter().zip(targets) {
                    let field_type = own_slots.get(target).copied().ok_or_else(|| {
                        invalid(format!("constructor #{} assigns missing field {}", index, target))
                    })?;
                    if !self.is_assignable(param, field_type) {
                        return Err(invalid(format!(
                            "constructor #{} assigns {} to a {} field",
                            index,
                            self.type_name(param),
                            self.type_name(field_type)
                        )));
                    }
                }
            }
        }

        for method in &methods {
            for &param in &method.params {
                self.check_value_type(param, &invalid)?;
            }
            self.type_of(method.return_type)?;
        }

        let id = TypeId(self.types.len() as u32);
        debug!(
            type_name = %name,
            type_id = %id,
            fields = fields.len(),
            constructors = constructors.len(),
            methods = methods.len(),
            "registered host type"
        );
        self.by_name.insert(name.clone(), id);
        self.types.push(HostType {
            id,
            name,
            kind,
            parent,
            interfaces,
            fields,
            constructors,
            methods,
            slot_types,
        });
        Ok(id)
    }

    fn check_value_type(
        &self,
        ty: TypeId,
        invalid: &impl Fn(String) -> HostError,
    ) -> HostResult<()> {
        if matches!(self.type_of(ty)?.kind, TypeKind::Void) {
            return Err(invalid("void is not a value type".into()));
        }
        Ok(())
    }

    /// Look up a type
    pub fn get(&self, id: TypeId) -> Option<&HostType> {
        self.types.get(id.index())
    }

    /// Look up a type, failing on unknown ids
    pub fn type_of(&self, id: TypeId) -> HostResult<&HostType> {
        self.get(id).ok_or(HostError::UnknownType(id))
    }

    /// Name of a type, or a placeholder for unknown ids
    pub fn type_name(&self, id: TypeId) -> &str {
        self.get(id).map_or("<unknown>", |t| t.name.as_str())
    }

    /// Look up a type by its registered name
    pub fn by_name(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    /// First registered type among several release-specific names
    pub fn find_first<S: AsRef<str>>(&self, names: &[S]) -> Option<TypeId> {
        names.iter().find_map(|name| self.by_name(name.as_ref()))
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Always false: built-ins are always present
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Class chain from `id` up to the root, starting with `id` itself
    pub fn hierarchy(&self, id: TypeId) -> Vec<&HostType> {
        let mut hierarchy = Vec::new();
        let mut current = Some(id);

        while let Some(id) = current {
            if let Some(ty) = self.get(id) {
                hierarchy.push(ty);
                current = ty.parent;
            } else {
                break;
            }
        }

        hierarchy
    }

    /// Whether `sub` is `sup` or inherits from it through classes or interfaces
    pub fn is_subtype_of(&self, sub: TypeId, sup: TypeId) -> bool {
        if sub == sup {
            return true;
        }

        let mut pending = vec![sub];
        while let Some(id) = pending.pop() {
            let Some(ty) = self.get(id) else {
                continue;
            };
            for next in ty.parent.iter().chain(&ty.interfaces) {
                if *next == sup {
                    return true;
                }
                pending.push(*next);
            }
        }

        false
    }

    /// Whether a value of type `from` can be stored where `to` is declared
    ///
    /// Primitives only match themselves; every reference type is assignable
    /// to `Object`.
    pub fn is_assignable(&self, from: TypeId, to: TypeId) -> bool {
        if from == to {
            return true;
        }
        let (Some(from_type), Some(to_type)) = (self.get(from), self.get(to)) else {
            return false;
        };
        if is_value_kind(&from_type.kind) || is_value_kind(&to_type.kind) {
            return false;
        }
        to == builtin::OBJECT || self.is_subtype_of(from, to)
    }

    /// Whether `value` can be stored where `declared` is declared
    ///
    /// Enumeration constants must exist in their type.
    pub fn accepts(&self, declared: TypeId, value: &Value) -> bool {
        if let Value::Enum(constant) = value {
            let defined = self
                .get(constant.type_id)
                .is_some_and(|t| constant.ordinal < t.enum_constants().len());
            if !defined {
                return false;
            }
        }
        match value.runtime_type() {
            Some(ty) => self.is_assignable(ty, declared),
            None => self
                .get(declared)
                .is_some_and(|t| !is_value_kind(&t.kind)),
        }
    }

    /// Name of a value's runtime type
    pub fn value_type_name(&self, value: &Value) -> String {
        match value.runtime_type() {
            Some(ty) => self.type_name(ty).to_string(),
            None => "null".to_string(),
        }
    }

    /// Constant of an enumeration by ordinal
    pub fn enum_constant(&self, type_id: TypeId, ordinal: usize) -> Option<Value> {
        let ty = self.get(type_id)?;
        (ordinal < ty.enum_constants().len())
            .then(|| Value::Enum(EnumConstant::new(type_id, ordinal)))
    }

    /// Run constructor `index` of `type_id`
    pub fn construct(&self, type_id: TypeId, index: usize, args: &[Value]) -> HostResult<HostObject> {
        let ty = self.type_of(type_id)?;
        let ctor = ty.constructors.get(index).ok_or_else(|| HostError::UnknownMember {
            kind: "constructor",
            type_name: ty.name.clone(),
            index,
        })?;
        self.check_args(&ctor.params, args)?;

        match &ctor.body {
            ConstructorBody::Assign(targets) => {
                let mut obj = ty.blank_instance();
                let own_slots: Vec<usize> = ty.fields.iter().filter_map(|f| f.slot).collect();
                for (arg, &target) in args.iter().zip(targets) {
                    let slot = own_slots.get(target).copied().ok_or(HostError::SlotOutOfBounds {
                        slot: target,
                        len: own_slots.len(),
                    })?;
                    obj.set_slot(slot, arg.clone())?;
                }
                Ok(obj)
            }
            ConstructorBody::Custom(body) => {
                let obj = body(ty, args)?;
                if obj.type_id() != type_id || obj.slots().len() != ty.slot_count() {
                    return Err(HostError::Rejected(format!(
                        "constructor of {} produced a malformed instance",
                        ty.name
                    )));
                }
                Ok(obj)
            }
        }
    }

    /// Run method `index` declared on `type_id`
    pub fn invoke(
        &self,
        type_id: TypeId,
        index: usize,
        receiver: Option<&HostObject>,
        args: &[Value],
    ) -> HostResult<Value> {
        let ty = self.type_of(type_id)?;
        let method = ty.methods.get(index).ok_or_else(|| HostError::UnknownMember {
            kind: "method",
            type_name: ty.name.clone(),
            index,
        })?;

        match (method.is_static, receiver) {
            (true, Some(_)) => {
                return Err(HostError::Receiver(format!(
                    "{}.{} is static",
                    ty.name, method.name
                )))
            }
            (false, None) => {
                return Err(HostError::Receiver(format!(
                    "{}.{} needs a receiver",
                    ty.name, method.name
                )))
            }
            (false, Some(obj)) if !self.is_subtype_of(obj.type_id(), type_id) => {
                return Err(HostError::Receiver(format!(
                    "{} is not a {}",
                    self.type_name(obj.type_id()),
                    ty.name
                )))
            }
            _ => {}
        }
        self.check_args(&method.params, args)?;

        (method.body)(receiver, args)
    }

    fn check_args(&self, params: &[TypeId], args: &[Value]) -> HostResult<()> {
        if params.len() != args.len() {
            return Err(HostError::Arity {
                expected: params.len(),
                got: args.len(),
            });
        }
        for (index, (&param, arg)) in params.iter().zip(args).enumerate() {
            if !self.accepts(param, arg) {
                return Err(HostError::ArgumentType {
                    index,
                    expected: self.type_name(param).to_string(),
                    got: self.value_type_name(arg),
                });
            }
        }
        Ok(())
    }
}

fn is_value_kind(kind: &TypeKind) -> bool {
    matches!(kind, TypeKind::Primitive(_) | TypeKind::Void)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConstructorDecl, FieldDecl, MethodDecl};

    fn shapes() -> (TypeRegistry, TypeId, TypeId, TypeId) {
        let mut registry = TypeRegistry::new();
        let named = registry.register(TypeBuilder::interface("Named")).unwrap();
        let shape = registry
            .register(
                TypeBuilder::class("Shape")
                    .field(FieldDecl::new("id", builtin::INT))
                    .constructor(ConstructorDecl::assigning(vec![builtin::INT])),
            )
            .unwrap();
        let circle = registry
            .register(
                TypeBuilder::class("Circle")
                    .extends(shape)
                    .implements(named)
                    .field(FieldDecl::new("radius", builtin::DOUBLE))
                    .field(FieldDecl::new("label", builtin::STRING))
                    .constructor(ConstructorDecl::assigning(vec![builtin::DOUBLE, builtin::STRING])),
            )
            .unwrap();
        (registry, named, shape, circle)
    }

    #[test]
    fn test_builtins_registered() {
        let registry = TypeRegistry::new();
        assert_eq!(registry.len(), builtin::COUNT as usize);
        assert_eq!(registry.by_name("byte"), Some(builtin::BYTE));
        assert_eq!(registry.type_name(builtin::STRING), "String");
        assert_eq!(registry.get(builtin::STRING).unwrap().parent(), Some(builtin::OBJECT));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = TypeRegistry::new();
        registry.register(TypeBuilder::class("A")).unwrap();
        assert_eq!(
            registry.register(TypeBuilder::class("A")),
            Err(HostError::DuplicateType("A".to_string()))
        );
    }

    #[test]
    fn test_slot_layout_inherits_parent_first() {
        let (registry, _, shape, circle) = shapes();
        let circle_type = registry.get(circle).unwrap();

        assert_eq!(
            circle_type.slot_types(),
            &[builtin::INT, builtin::DOUBLE, builtin::STRING]
        );
        assert_eq!(circle_type.fields()[0].slot(), Some(1));
        assert_eq!(registry.get(shape).unwrap().slot_count(), 1);
    }

    #[test]
    fn test_assignability() {
        let (registry, named, shape, circle) = shapes();

        assert!(registry.is_assignable(circle, shape));
        assert!(registry.is_assignable(circle, named));
        assert!(registry.is_assignable(circle, builtin::OBJECT));
        assert!(!registry.is_assignable(shape, circle));
        assert!(!registry.is_assignable(builtin::BYTE, builtin::INT));
        assert!(!registry.is_assignable(builtin::INT, builtin::OBJECT));

        assert!(registry.accepts(named, &Value::Null));
        assert!(!registry.accepts(builtin::BYTE, &Value::Null));
    }

    #[test]
    fn test_hierarchy() {
        let (registry, _, _, circle) = shapes();
        let names: Vec<&str> = registry.hierarchy(circle).iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["Circle", "Shape", "Object"]);
    }

    #[test]
    fn test_construct_assigning() {
        let (registry, _, _, circle) = shapes();
        let obj = registry
            .construct(circle, 0, &[Value::Double(2.5), Value::string("c")])
            .unwrap();

        assert_eq!(obj.slots(), &[Value::Int(0), Value::Double(2.5), Value::string("c")]);
    }

    #[test]
    fn test_construct_checks_arguments() {
        let (registry, _, _, circle) = shapes();

        assert_eq!(
            registry.construct(circle, 0, &[Value::Double(2.5)]),
            Err(HostError::Arity { expected: 2, got: 1 })
        );
        assert!(matches!(
            registry.construct(circle, 0, &[Value::Int(2), Value::Null]),
            Err(HostError::ArgumentType { index: 0, .. })
        ));
        assert!(matches!(
            registry.construct(circle, 3, &[]),
            Err(HostError::UnknownMember { kind: "constructor", .. })
        ));
    }

    #[test]
    fn test_assigning_constructor_type_checked_at_registration() {
        let mut registry = TypeRegistry::new();
        let result = registry.register(
            TypeBuilder::class("Bad")
                .field(FieldDecl::new("x", builtin::BYTE))
                .constructor(ConstructorDecl::assigning(vec![builtin::INT])),
        );
        assert!(matches!(result, Err(HostError::InvalidDefinition { .. })));
    }

    #[test]
    fn test_invoke_method() {
        let mut registry = TypeRegistry::new();
        let counter = registry
            .register(
                TypeBuilder::class("Counter")
                    .field(FieldDecl::new("count", builtin::INT))
                    .method(MethodDecl::new("get", vec![], builtin::INT, |this, _| {
                        let this = this.ok_or_else(|| HostError::Receiver("missing".into()))?;
                        this.slot(0).cloned()
                    }))
                    .method(
                        MethodDecl::new("zero", vec![], builtin::INT, |_, _| Ok(Value::Int(0)))
                            .as_static(),
                    ),
            )
            .unwrap();

        let obj = HostObject::new(counter, vec![Value::Int(7)]);
        assert_eq!(registry.invoke(counter, 0, Some(&obj), &[]), Ok(Value::Int(7)));
        assert_eq!(registry.invoke(counter, 1, None, &[]), Ok(Value::Int(0)));
        assert!(matches!(
            registry.invoke(counter, 0, None, &[]),
            Err(HostError::Receiver(_))
        ));
        assert!(matches!(
            registry.invoke(counter, 1, Some(&obj), &[]),
            Err(HostError::Receiver(_))
        ));
    }

    #[test]
    fn test_enum_constants() {
        let mut registry = TypeRegistry::new();
        let color = registry
            .register(TypeBuilder::enumeration("Color", ["RED", "GREEN"]))
            .unwrap();

        assert_eq!(
            registry.enum_constant(color, 1),
            Some(Value::Enum(EnumConstant::new(color, 1)))
        );
        assert_eq!(registry.enum_constant(color, 2), None);
        assert!(registry.is_assignable(color, builtin::OBJECT));
    }

    #[test]
    fn test_accepts_only_defined_enum_constants() {
        let mut registry = TypeRegistry::new();
        let color = registry
            .register(TypeBuilder::enumeration("Color", ["RED", "GREEN"]))
            .unwrap();

        assert!(registry.accepts(color, &Value::Enum(EnumConstant::new(color, 1))));
        assert!(!registry.accepts(color, &Value::Enum(EnumConstant::new(color, 2))));
        assert!(!registry.accepts(builtin::OBJECT, &Value::Enum(EnumConstant::new(color, 5))));
    }

    #[test]
    fn test_custom_constructor() {
        let mut registry = TypeRegistry::new();
        let port = registry
            .register(
                TypeBuilder::class("Port")
                    .field(FieldDecl::new("number", builtin::INT))
                    .constructor(ConstructorDecl::custom(vec![builtin::INT], |ty, args| {
                        match args[0] {
                            Value::Int(n) if n > 0 => Ok(HostObject::new(ty.id(), vec![Value::Int(n)])),
                            _ => Err(HostError::Rejected("port must be positive".into())),
                        }
                    })),
            )
            .unwrap();

        let obj = registry.construct(port, 0, &[Value::Int(25565)]).unwrap();
        assert_eq!(obj.slots(), &[Value::Int(25565)]);
        assert_eq!(
            registry.construct(port, 0, &[Value::Int(0)]),
            Err(HostError::Rejected("port must be positive".into()))
        );
    }

    #[test]
    fn test_custom_constructor_malformed_instance() {
        let mut registry = TypeRegistry::new();
        let pair = registry
            .register(
                TypeBuilder::class("Pair")
                    .field(FieldDecl::new("left", builtin::INT))
                    .field(FieldDecl::new("right", builtin::INT))
                    .constructor(ConstructorDecl::custom(vec![], |ty, _| {
                        Ok(HostObject::new(ty.id(), vec![Value::Int(1)]))
                    }))
                    .constructor(ConstructorDecl::custom(vec![], |_, _| {
                        Ok(HostObject::new(builtin::OBJECT, vec![Value::Int(1), Value::Int(2)]))
                    })),
            )
            .unwrap();

        for index in 0..2 {
            assert!(matches!(
                registry.construct(pair, index, &[]),
                Err(HostError::Rejected(_))
            ));
        }
    }

    #[test]
    fn test_find_first_alias() {
        let (registry, _, _, circle) = shapes();
        assert_eq!(registry.find_first(&["Ellipse", "Circle"]), Some(circle));
        assert_eq!(registry.find_first(&["Ellipse"]), None);
    }
}
