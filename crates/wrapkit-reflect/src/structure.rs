//! Positional field access
//!
//! A [`StructureModifier`] lists the instance fields of one host type in
//! declaration order, supertype fields first. Narrowing it by declared type
//! yields a [`FieldView`] whose indices count only the fields of that type,
//! so "the third byte field" stays addressable across releases that rename
//! every field. Names are never consulted.
//!
//! Modifiers are built per type, not per instance, and cached in a
//! [`StructureCache`].

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, trace, warn};
use wrapkit_host::{HostObject, TypeId, TypeRegistry, Value};

use crate::config::LayoutPolicy;
use crate::converter::EquivalentConverter;
use crate::error::{ReflectError, ReflectResult};

/// One instance field of a type, in layout order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSlot {
    /// Position among all instance fields of the type
    pub position: usize,
    /// Storage slot inside the instance
    pub slot: usize,
    /// Declared field type
    pub declared_type: TypeId,
    /// Type declaring the field
    pub declaring_type: TypeId,
    /// Host-side name, for diagnostics only
    pub name: Arc<str>,
}

/// A declared expectation about a type's layout
///
/// "This type has exactly `count` instance fields declared as `field_type`."
/// Wrappers that index fields by position state these up front so a host
/// release that reshuffles the layout is noticed before values are read
/// from the wrong field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutExpectation {
    /// Declared field type
    pub field_type: TypeId,
    /// Expected number of fields
    pub count: usize,
}

impl LayoutExpectation {
    /// Exactly `count` fields of `field_type`
    pub const fn exactly(count: usize, field_type: TypeId) -> Self {
        Self { field_type, count }
    }
}

/// Instance field layout of one host type
#[derive(Clone)]
pub struct StructureModifier {
    registry: Arc<TypeRegistry>,
    target: TypeId,
    type_name: Arc<str>,
    fields: Arc<[FieldSlot]>,
}

impl fmt::Debug for StructureModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructureModifier")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields.len())
            .finish()
    }
}

impl StructureModifier {
    /// Build the layout of `target`
    pub fn for_type(registry: &Arc<TypeRegistry>, target: TypeId) -> ReflectResult<Self> {
        let ty = registry.type_of(target)?;

        let mut fields = Vec::new();
        for declaring in registry.hierarchy(target).into_iter().rev() {
            for field in declaring.fields() {
                let Some(slot) = field.slot() else {
                    continue;
                };
                fields.push(FieldSlot {
                    position: fields.len(),
                    slot,
                    declared_type: field.declared_type(),
                    declaring_type: declaring.id(),
                    name: field.name().into(),
                });
            }
        }

        debug!(type_name = ty.name(), fields = fields.len(), "built structure index");

        Ok(Self {
            registry: Arc::clone(registry),
            target,
            type_name: ty.name().into(),
            fields: fields.into(),
        })
    }

    /// Type whose layout this is
    pub fn target_type(&self) -> TypeId {
        self.target
    }

    /// Name of the target type
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Every instance field, in layout order
    pub fn fields(&self) -> &[FieldSlot] {
        &self.fields
    }

    /// Unfiltered view over every instance field
    pub fn all(&self) -> FieldView {
        self.view("any", |_| true)
    }

    /// View over the fields declared exactly as `field_type`
    pub fn with_type(&self, field_type: TypeId) -> FieldView {
        let filter = self.registry.type_name(field_type).to_string();
        self.view(filter, |f| f.declared_type == field_type)
    }

    /// View over the fields able to hold a `value_type`
    ///
    /// Includes fields declared as a supertype of `value_type`.
    pub fn with_assignable_type(&self, value_type: TypeId) -> FieldView {
        let filter = format!(">: {}", self.registry.type_name(value_type));
        let registry = Arc::clone(&self.registry);
        self.view(filter, move |f| registry.is_assignable(value_type, f.declared_type))
    }

    /// View over the fields declared as `field_type`, read and written
    /// through `converter`
    pub fn with_type_converted<C: EquivalentConverter>(
        &self,
        field_type: TypeId,
        converter: C,
    ) -> ConvertedView<C> {
        ConvertedView {
            view: self.with_type(field_type),
            converter,
        }
    }

    /// Verify declared layout expectations
    ///
    /// Under [`LayoutPolicy::Warn`] every mismatch is logged and the call
    /// succeeds; under [`LayoutPolicy::Strict`] the first mismatch fails.
    pub fn check_layout(
        &self,
        expectations: &[LayoutExpectation],
        policy: LayoutPolicy,
    ) -> ReflectResult<()> {
        if policy == LayoutPolicy::Off {
            return Ok(());
        }

        for expectation in expectations {
            let found = self
                .fields
                .iter()
                .filter(|f| f.declared_type == expectation.field_type)
                .count();
            if found == expectation.count {
                continue;
            }

            let field_type = self.registry.type_name(expectation.field_type).to_string();
            if policy == LayoutPolicy::Strict {
                return Err(ReflectError::LayoutMismatch {
                    type_name: self.type_name.to_string(),
                    field_type,
                    expected: expectation.count,
                    found,
                });
            }
            warn!(
                type_name = %self.type_name,
                field_type = %field_type,
                expected = expectation.count,
                found,
                "field layout changed; positional access may read the wrong field"
            );
        }

        Ok(())
    }

    fn view(&self, filter: impl Into<String>, keep: impl Fn(&FieldSlot) -> bool) -> FieldView {
        FieldView {
            registry: Arc::clone(&self.registry),
            target: self.target,
            type_name: Arc::clone(&self.type_name),
            filter: filter.into(),
            fields: self.fields.iter().filter(|f| keep(*f)).cloned().collect(),
        }
    }
}

/// Positional, type-filtered view of a type's instance fields
#[derive(Clone)]
pub struct FieldView {
    registry: Arc<TypeRegistry>,
    target: TypeId,
    type_name: Arc<str>,
    filter: String,
    fields: Vec<FieldSlot>,
}

impl fmt::Debug for FieldView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldView")
            .field("type_name", &self.type_name)
            .field("filter", &self.filter)
            .field("fields", &self.fields)
            .finish()
    }
}

impl FieldView {
    /// Number of fields in the view
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the view selects no field
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields in the view, in layout order
    pub fn fields(&self) -> &[FieldSlot] {
        &self.fields
    }

    /// Value of field `index`
    pub fn read(&self, obj: &HostObject, index: usize) -> ReflectResult<Value> {
        let field = self.locate(obj, index)?;
        Ok(obj.slot(field.slot)?.clone())
    }

    /// Overwrite field `index`
    pub fn write(&self, obj: &mut HostObject, index: usize, value: Value) -> ReflectResult<()> {
        let field = self.locate(obj, index)?;
        if !self.registry.accepts(field.declared_type, &value) {
            return Err(ReflectError::TypeMismatch {
                expected: self.registry.type_name(field.declared_type).to_string(),
                got: self.registry.value_type_name(&value),
            });
        }
        trace!(type_name = %self.type_name, field = %field.name, "writing field");
        obj.set_slot(field.slot, value)?;
        Ok(())
    }

    /// Values of every field in the view
    pub fn values(&self, obj: &HostObject) -> ReflectResult<Vec<Value>> {
        (0..self.fields.len()).map(|i| self.read(obj, i)).collect()
    }

    /// Replace field `index` with `f` applied to its current value
    pub fn modify<F>(&self, obj: &mut HostObject, index: usize, f: F) -> ReflectResult<()>
    where
        F: FnOnce(&Value) -> Value,
    {
        let current = self.read(obj, index)?;
        self.write(obj, index, f(&current))
    }

    fn locate(&self, obj: &HostObject, index: usize) -> ReflectResult<&FieldSlot> {
        if !self.registry.is_subtype_of(obj.type_id(), self.target) {
            return Err(ReflectError::TypeMismatch {
                expected: self.type_name.to_string(),
                got: self.registry.type_name(obj.type_id()).to_string(),
            });
        }
        self.fields.get(index).ok_or_else(|| ReflectError::IndexOutOfRange {
            index,
            len: self.fields.len(),
            field_type: self.filter.clone(),
            type_name: self.type_name.to_string(),
        })
    }
}

/// A [`FieldView`] read and written through a converter
#[derive(Debug, Clone)]
pub struct ConvertedView<C> {
    view: FieldView,
    converter: C,
}

impl<C: EquivalentConverter> ConvertedView<C> {
    /// Number of fields in the view
    pub fn len(&self) -> usize {
        self.view.len()
    }

    /// Whether the view selects no field
    pub fn is_empty(&self) -> bool {
        self.view.is_empty()
    }

    /// Stable value of field `index`
    pub fn read(&self, obj: &HostObject, index: usize) -> ReflectResult<C::Stable> {
        let raw = self.view.read(obj, index)?;
        self.converter.to_stable(&raw)
    }

    /// Overwrite field `index` with the host form of `value`
    pub fn write(&self, obj: &mut HostObject, index: usize, value: &C::Stable) -> ReflectResult<()> {
        let raw = self.converter.to_opaque(value)?;
        self.view.write(obj, index, raw)
    }
}

/// Concurrent cache of [`StructureModifier`]s by type
pub struct StructureCache {
    registry: Arc<TypeRegistry>,
    modifiers: DashMap<TypeId, StructureModifier>,
}

impl fmt::Debug for StructureCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructureCache")
            .field("cached", &self.modifiers.len())
            .finish()
    }
}

impl StructureCache {
    /// Empty cache over `registry`
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            modifiers: DashMap::new(),
        }
    }

    /// Registry the cached layouts describe
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Layout of `target`, built on first request
    pub fn get(&self, target: TypeId) -> ReflectResult<StructureModifier> {
        if let Some(modifier) = self.modifiers.get(&target) {
            return Ok(modifier.clone());
        }

        let built = StructureModifier::for_type(&self.registry, target)?;
        Ok(self.modifiers.entry(target).or_insert(built).clone())
    }

    /// Layout of the runtime type of `obj`
    pub fn for_object(&self, obj: &HostObject) -> ReflectResult<StructureModifier> {
        self.get(obj.type_id())
    }

    /// Number of cached layouts
    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    /// Whether nothing is cached yet
    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }
}
