//! Structural member matching
//!
//! [`MemberMatcher`] enumerates the declared members of one host type and
//! filters them through a [`MemberContract`]. A lookup succeeds only when
//! exactly one member matches; zero matches and several matches are both
//! errors, since either means the contract no longer describes the running
//! host. The matcher keeps no state between lookups. Callers that convert
//! on a hot path cache the result in a [`LazyMember`](crate::LazyMember).

use std::sync::Arc;

use tracing::debug;
use wrapkit_host::{HostError, HostObject, HostType, TypeId, TypeRegistry, Value};

use crate::contract::MemberContract;
use crate::error::{MemberKind, ReflectError, ReflectResult};

/// Position of a member inside its declaring type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberRef {
    /// Declaring type
    pub declaring: TypeId,
    /// Index among the declaring type's members of the same kind
    pub index: usize,
}

/// A constructor located by contract
///
/// Two resolutions are equal when they point at the same constructor.
#[derive(Debug, Clone)]
pub struct ResolvedConstructor {
    member: MemberRef,
    type_name: Arc<str>,
    params: Vec<TypeId>,
    origin: Arc<str>,
}

impl PartialEq for ResolvedConstructor {
    fn eq(&self, other: &Self) -> bool {
        self.member == other.member
    }
}

impl Eq for ResolvedConstructor {}

impl ResolvedConstructor {
    /// Location of the constructor
    pub fn member(&self) -> MemberRef {
        self.member
    }

    /// Type the constructor builds
    pub fn declaring_type(&self) -> TypeId {
        self.member.declaring
    }

    /// Declared parameter types
    pub fn parameter_types(&self) -> &[TypeId] {
        &self.params
    }

    /// Contract that located this constructor
    pub fn contract(&self) -> &str {
        &self.origin
    }

    /// Allocate a new instance
    ///
    /// Any host failure is reported as [`ReflectError::Invocation`] naming
    /// the constructor, its type and the contract that selected it.
    pub fn new_instance(&self, registry: &TypeRegistry, args: &[Value]) -> ReflectResult<HostObject> {
        registry
            .construct(self.member.declaring, self.member.index, args)
            .map_err(|source| ReflectError::Invocation {
                member: format!("constructor #{} matched by {}", self.member.index, self.origin),
                type_name: self.type_name.to_string(),
                source,
            })
    }
}

/// A method located by contract
#[derive(Debug, Clone)]
pub struct ResolvedMethod {
    member: MemberRef,
    type_name: Arc<str>,
    name: Arc<str>,
    is_static: bool,
    params: Vec<TypeId>,
    return_type: TypeId,
    origin: Arc<str>,
}

impl PartialEq for ResolvedMethod {
    fn eq(&self, other: &Self) -> bool {
        self.member == other.member
    }
}

impl Eq for ResolvedMethod {}

impl ResolvedMethod {
    /// Location of the method
    pub fn member(&self) -> MemberRef {
        self.member
    }

    /// Host-side name, for diagnostics only
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the method is static
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Declared parameter types
    pub fn parameter_types(&self) -> &[TypeId] {
        &self.params
    }

    /// Declared return type
    pub fn return_type(&self) -> TypeId {
        self.return_type
    }

    /// Contract that located this method
    pub fn contract(&self) -> &str {
        &self.origin
    }

    /// Call the method; `receiver` must be `None` for static methods
    pub fn invoke(
        &self,
        registry: &TypeRegistry,
        receiver: Option<&HostObject>,
        args: &[Value],
    ) -> ReflectResult<Value> {
        registry
            .invoke(self.member.declaring, self.member.index, receiver, args)
            .map_err(|source| ReflectError::Invocation {
                member: format!("method {} matched by {}", self.name, self.origin),
                type_name: self.type_name.to_string(),
                source,
            })
    }
}

/// A field located by contract
#[derive(Debug, Clone)]
pub struct ResolvedField {
    member: MemberRef,
    type_name: Arc<str>,
    declared_type: TypeId,
    slot: Option<usize>,
    constant: Option<Value>,
}

impl PartialEq for ResolvedField {
    fn eq(&self, other: &Self) -> bool {
        self.member == other.member
    }
}

impl ResolvedField {
    /// Location of the field
    pub fn member(&self) -> MemberRef {
        self.member
    }

    /// Declared field type
    pub fn declared_type(&self) -> TypeId {
        self.declared_type
    }

    /// Whether the field is static
    pub fn is_static(&self) -> bool {
        self.slot.is_none()
    }

    /// Read the field; `target` is ignored for static fields
    pub fn read(&self, registry: &TypeRegistry, target: &HostObject) -> ReflectResult<Value> {
        let Some(slot) = self.slot else {
            return Ok(self.constant.clone().unwrap_or_default());
        };
        self.check_target(registry, target)?;
        Ok(target.slot(slot)?.clone())
    }

    /// Value of a static field
    pub fn read_static(&self) -> ReflectResult<Value> {
        match (&self.constant, self.slot) {
            (Some(value), None) => Ok(value.clone()),
            _ => Err(ReflectError::TypeMismatch {
                expected: "static field".to_string(),
                got: format!("instance field of {}", self.type_name),
            }),
        }
    }

    /// Overwrite an instance field
    pub fn write(&self, registry: &TypeRegistry, target: &mut HostObject, value: Value) -> ReflectResult<()> {
        let Some(slot) = self.slot else {
            return Err(ReflectError::Invocation {
                member: format!("static field #{}", self.member.index),
                type_name: self.type_name.to_string(),
                source: HostError::Rejected("static fields are read-only".into()),
            });
        };
        self.check_target(registry, target)?;
        if !registry.accepts(self.declared_type, &value) {
            return Err(ReflectError::TypeMismatch {
                expected: registry.type_name(self.declared_type).to_string(),
                got: registry.value_type_name(&value),
            });
        }
        target.set_slot(slot, value)?;
        Ok(())
    }

    fn check_target(&self, registry: &TypeRegistry, target: &HostObject) -> ReflectResult<()> {
        if registry.is_subtype_of(target.type_id(), self.member.declaring) {
            Ok(())
        } else {
            Err(ReflectError::TypeMismatch {
                expected: self.type_name.to_string(),
                got: registry.type_name(target.type_id()).to_string(),
            })
        }
    }
}

/// Matches contracts against the members of one host type
#[derive(Debug, Clone, Copy)]
pub struct MemberMatcher<'r> {
    registry: &'r TypeRegistry,
    target: &'r HostType,
    inherited: bool,
}

impl<'r> MemberMatcher<'r> {
    /// Matcher over the members declared by `target`
    pub fn new(registry: &'r TypeRegistry, target: TypeId) -> ReflectResult<Self> {
        Ok(Self {
            registry,
            target: registry.type_of(target)?,
            inherited: false,
        })
    }

    /// Also consider methods and fields declared by supertypes
    ///
    /// Candidates are listed most-derived type first. Constructors are never
    /// inherited.
    pub fn with_inherited(mut self) -> Self {
        self.inherited = true;
        self
    }

    /// Type being searched
    pub fn target_type(&self) -> TypeId {
        self.target.id()
    }

    fn declaring_types(&self) -> Vec<&'r HostType> {
        if self.inherited {
            self.registry.hierarchy(self.target.id())
        } else {
            vec![self.target]
        }
    }

    /// Every constructor satisfying the contract, in declaration order
    pub fn constructors_matching(&self, contract: &MemberContract) -> Vec<ResolvedConstructor> {
        let ty = self.target;
        let mut found = Vec::new();
        let mut origin: Option<Arc<str>> = None;

        for (index, ctor) in ty.constructors().iter().enumerate() {
            if !contract.matches_constructor(self.registry, ty, ctor) {
                continue;
            }
            let origin = origin
                .get_or_insert_with(|| contract.describe(self.registry).into())
                .clone();
            found.push(ResolvedConstructor {
                member: MemberRef {
                    declaring: ty.id(),
                    index,
                },
                type_name: ty.name().into(),
                params: ctor.params().to_vec(),
                origin,
            });
        }

        found
    }

    /// Every method satisfying the contract
    pub fn methods_matching(&self, contract: &MemberContract) -> Vec<ResolvedMethod> {
        let mut found = Vec::new();
        let mut origin: Option<Arc<str>> = None;

        for ty in self.declaring_types() {
            for (index, method) in ty.methods().iter().enumerate() {
                if !contract.matches_method(self.registry, method) {
                    continue;
                }
                let origin = origin
                    .get_or_insert_with(|| contract.describe(self.registry).into())
                    .clone();
                found.push(ResolvedMethod {
                    member: MemberRef {
                        declaring: ty.id(),
                        index,
                    },
                    type_name: ty.name().into(),
                    name: method.name().into(),
                    is_static: method.is_static(),
                    params: method.params().to_vec(),
                    return_type: method.return_type(),
                    origin,
                });
            }
        }

        found
    }

    /// Every field satisfying the contract
    pub fn fields_matching(&self, contract: &MemberContract) -> Vec<ResolvedField> {
        let mut found = Vec::new();

        for ty in self.declaring_types() {
            for (index, field) in ty.fields().iter().enumerate() {
                if !contract.matches_field(self.registry, field) {
                    continue;
                }
                found.push(ResolvedField {
                    member: MemberRef {
                        declaring: ty.id(),
                        index,
                    },
                    type_name: ty.name().into(),
                    declared_type: field.declared_type(),
                    slot: field.slot(),
                    constant: field.constant().cloned(),
                });
            }
        }

        found
    }

    /// The single constructor satisfying the contract
    pub fn constructor(&self, contract: &MemberContract) -> ReflectResult<ResolvedConstructor> {
        let found = self.constructors_matching(contract);
        self.unique(MemberKind::Constructor, contract, found)
    }

    /// The single method satisfying the contract
    pub fn method(&self, contract: &MemberContract) -> ReflectResult<ResolvedMethod> {
        let found = self.methods_matching(contract);
        self.unique(MemberKind::Method, contract, found)
    }

    /// The single field satisfying the contract
    pub fn field(&self, contract: &MemberContract) -> ReflectResult<ResolvedField> {
        let found = self.fields_matching(contract);
        self.unique(MemberKind::Field, contract, found)
    }

    fn unique<T>(&self, kind: MemberKind, contract: &MemberContract, mut found: Vec<T>) -> ReflectResult<T> {
        match found.len() {
            1 => {
                debug!(
                    %kind,
                    type_name = self.target.name(),
                    contract = %contract.describe(self.registry),
                    "resolved member"
                );
                Ok(found.remove(0))
            }
            0 => Err(ReflectError::NoMatchingMember {
                kind,
                type_name: self.target.name().to_string(),
                contract: contract.describe(self.registry),
            }),
            candidates => Err(ReflectError::AmbiguousContract {
                kind,
                type_name: self.target.name().to_string(),
                contract: contract.describe(self.registry),
                candidates,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wrapkit_host::{builtin, ConstructorDecl, FieldDecl, MethodDecl, TypeBuilder, Visibility};

    fn vector_type() -> (TypeRegistry, TypeId) {
        let mut registry = TypeRegistry::new();
        let vector = registry
            .register(
                TypeBuilder::class("Vec3")
                    .field(FieldDecl::new("x", builtin::DOUBLE))
                    .field(FieldDecl::new("y", builtin::DOUBLE))
                    .field(FieldDecl::new("z", builtin::DOUBLE))
                    .field(FieldDecl::new("ZERO", builtin::INT).as_static(Value::Int(0)))
                    .constructor(ConstructorDecl::assigning(vec![
                        builtin::DOUBLE,
                        builtin::DOUBLE,
                        builtin::DOUBLE,
                    ]))
                    .constructor(ConstructorDecl::assigning(vec![]).visibility(Visibility::Private))
                    .method(MethodDecl::new("length", vec![], builtin::DOUBLE, |_, _| {
                        Ok(Value::Double(0.0))
                    })),
            )
            .unwrap();
        (registry, vector)
    }

    #[test]
    fn test_unique_constructor() {
        let (registry, vector) = vector_type();
        let matcher = MemberMatcher::new(&registry, vector).unwrap();

        let ctor = matcher
            .constructor(&MemberContract::builder().require_public().build())
            .unwrap();
        assert_eq!(ctor.member(), MemberRef { declaring: vector, index: 0 });
        assert_eq!(ctor.parameter_types().len(), 3);
    }

    #[test]
    fn test_unknown_target() {
        let (_, foreign) = vector_type();
        let registry = TypeRegistry::new();
        let missing = MemberMatcher::new(&registry, foreign);
        assert!(matches!(missing, Err(ReflectError::Host(HostError::UnknownType(_)))));
    }

    #[test]
    fn test_field_read_write() {
        let (registry, vector) = vector_type();
        let matcher = MemberMatcher::new(&registry, vector).unwrap();
        let doubles = MemberContract::builder().field_type_exact(builtin::DOUBLE).build();

        assert!(matches!(
            matcher.field(&doubles),
            Err(ReflectError::AmbiguousContract { candidates: 3, .. })
        ));

        let fields = matcher.fields_matching(&doubles);
        let mut obj = registry
            .construct(vector, 0, &[Value::Double(1.0), Value::Double(2.0), Value::Double(3.0)])
            .unwrap();
        assert_eq!(fields[2].read(&registry, &obj).unwrap(), Value::Double(3.0));

        fields[0].write(&registry, &mut obj, Value::Double(9.0)).unwrap();
        assert_eq!(obj.slots()[0], Value::Double(9.0));

        assert!(matches!(
            fields[0].write(&registry, &mut obj, Value::Int(1)),
            Err(ReflectError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_static_field() {
        let (registry, vector) = vector_type();
        let field = MemberMatcher::new(&registry, vector)
            .unwrap()
            .field(&MemberContract::builder().require_static().build())
            .unwrap();

        assert!(field.is_static());
        assert_eq!(field.read_static().unwrap(), Value::Int(0));

        let mut obj = registry.get(vector).unwrap().blank_instance();
        assert!(matches!(
            field.write(&registry, &mut obj, Value::Int(1)),
            Err(ReflectError::Invocation { .. })
        ));
    }

    #[test]
    fn test_method_invoke() {
        let (registry, vector) = vector_type();
        let method = MemberMatcher::new(&registry, vector)
            .unwrap()
            .method(&MemberContract::builder().return_type_exact(builtin::DOUBLE).build())
            .unwrap();

        let obj = registry.get(vector).unwrap().blank_instance();
        assert_eq!(method.invoke(&registry, Some(&obj), &[]).unwrap(), Value::Double(0.0));
        assert!(matches!(
            method.invoke(&registry, None, &[]),
            Err(ReflectError::Invocation { .. })
        ));
    }
}
