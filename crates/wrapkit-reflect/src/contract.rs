//! Member contracts
//!
//! A [`MemberContract`] describes the structural shape of a constructor,
//! method or field: visibility, parameter count, per-position parameter
//! types, the return (or declared field) type and, only when the host keeps
//! it stable, a name predicate. Contracts are immutable once built and can be
//! shared freely between threads.
//!
//! ```ignore
//! let contract = MemberContract::builder()
//!     .require_public()
//!     .parameter_count(5)
//!     .return_type_exact(icon_type)
//!     .build();
//! ```

use std::fmt;

use regex::Regex;
use wrapkit_host::{ConstructorDecl, FieldDecl, HostType, MethodDecl, TypeId, TypeRegistry, Visibility};

/// Constraint on one declared type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TypeRule {
    /// Any type
    #[default]
    Any,
    /// Exactly this type
    Exact(TypeId),
    /// This type or one of its subtypes
    SubtypeOf(TypeId),
    /// This type or one of its supertypes (the declaration can hold it)
    SupertypeOf(TypeId),
}

impl TypeRule {
    /// Check a declared type against the rule
    pub fn matches(&self, registry: &TypeRegistry, declared: TypeId) -> bool {
        match *self {
            TypeRule::Any => true,
            TypeRule::Exact(ty) => declared == ty,
            TypeRule::SubtypeOf(ty) => registry.is_assignable(declared, ty),
            TypeRule::SupertypeOf(ty) => registry.is_assignable(ty, declared),
        }
    }

    fn render(&self, name: impl Fn(TypeId) -> String) -> String {
        match *self {
            TypeRule::Any => "*".to_string(),
            TypeRule::Exact(ty) => name(ty),
            TypeRule::SubtypeOf(ty) => format!("<: {}", name(ty)),
            TypeRule::SupertypeOf(ty) => format!(">: {}", name(ty)),
        }
    }
}

/// Predicate on a member name
#[derive(Debug, Clone)]
pub enum NameRule {
    /// Exact name
    Exact(String),
    /// Whole-name regular expression
    Pattern(Regex),
}

impl NameRule {
    /// Check a name against the rule
    pub fn matches(&self, name: &str) -> bool {
        match self {
            NameRule::Exact(expected) => expected == name,
            NameRule::Pattern(re) => re
                .find(name)
                .is_some_and(|m| m.start() == 0 && m.end() == name.len()),
        }
    }
}

impl fmt::Display for NameRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameRule::Exact(name) => write!(f, "name = {}", name),
            NameRule::Pattern(re) => write!(f, "name ~ /{}/", re.as_str()),
        }
    }
}

/// Structural description of a constructor, method or field
///
/// For constructors the return type is the declaring type. For fields the
/// "return type" is the declared field type and parameter constraints must
/// be left empty.
#[derive(Debug, Clone, Default)]
pub struct MemberContract {
    visibility: Option<Visibility>,
    is_static: Option<bool>,
    param_count: Option<usize>,
    params: Vec<(usize, TypeRule)>,
    value_type: TypeRule,
    name: Option<NameRule>,
}

impl MemberContract {
    /// Start building a contract
    pub fn builder() -> ContractBuilder {
        ContractBuilder::default()
    }

    /// Whether a constructor of `declaring` satisfies the contract
    pub fn matches_constructor(
        &self,
        registry: &TypeRegistry,
        declaring: &HostType,
        ctor: &ConstructorDecl,
    ) -> bool {
        self.visibility_matches(ctor.visibility_of())
            && self.name_matches(declaring.name())
            && self.params_match(registry, ctor.params())
            && self.value_type.matches(registry, declaring.id())
    }

    /// Whether a method satisfies the contract
    pub fn matches_method(&self, registry: &TypeRegistry, method: &MethodDecl) -> bool {
        self.visibility_matches(method.visibility_of())
            && self.is_static.map_or(true, |s| s == method.is_static())
            && self.name_matches(method.name())
            && self.params_match(registry, method.params())
            && self.value_type.matches(registry, method.return_type())
    }

    /// Whether a field satisfies the contract
    pub fn matches_field(&self, registry: &TypeRegistry, field: &FieldDecl) -> bool {
        self.visibility_matches(field.visibility_of())
            && self.is_static.map_or(true, |s| s == field.is_static())
            && self.param_count.map_or(true, |n| n == 0)
            && self.params.is_empty()
            && self.name_matches(field.name())
            && self.value_type.matches(registry, field.declared_type())
    }

    fn visibility_matches(&self, visibility: Visibility) -> bool {
        self.visibility.map_or(true, |v| v == visibility)
    }

    fn name_matches(&self, name: &str) -> bool {
        self.name.as_ref().map_or(true, |rule| rule.matches(name))
    }

    fn params_match(&self, registry: &TypeRegistry, declared: &[TypeId]) -> bool {
        if self.param_count.is_some_and(|n| n != declared.len()) {
            return false;
        }
        self.params.iter().all(|(index, rule)| {
            declared
                .get(*index)
                .is_some_and(|&ty| rule.matches(registry, ty))
        })
    }

    /// Render with host type names, for diagnostics
    pub fn describe(&self, registry: &TypeRegistry) -> String {
        self.render(|ty| registry.type_name(ty).to_string())
    }

    fn render(&self, name: impl Fn(TypeId) -> String) -> String {
        let mut parts = Vec::new();
        if let Some(visibility) = self.visibility {
            parts.push(visibility.to_string());
        }
        match self.is_static {
            Some(true) => parts.push("static".to_string()),
            Some(false) => parts.push("instance".to_string()),
            None => {}
        }
        if let Some(count) = self.param_count {
            parts.push(format!("params = {}", count));
        }
        for (index, rule) in &self.params {
            parts.push(format!("param[{}] {}", index, rule.render(&name)));
        }
        if self.value_type != TypeRule::Any {
            parts.push(format!("type {}", self.value_type.render(&name)));
        }
        if let Some(rule) = &self.name {
            parts.push(rule.to_string());
        }
        format!("{{{}}}", parts.join(", "))
    }
}

impl fmt::Display for MemberContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(|ty| ty.to_string()))
    }
}

/// Builder for [`MemberContract`]
#[derive(Debug, Clone, Default)]
pub struct ContractBuilder {
    contract: MemberContract,
}

impl ContractBuilder {
    /// Require an exact visibility
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.contract.visibility = Some(visibility);
        self
    }

    /// Require public visibility
    pub fn require_public(self) -> Self {
        self.visibility(Visibility::Public)
    }

    /// Require a static member
    pub fn require_static(mut self) -> Self {
        self.contract.is_static = Some(true);
        self
    }

    /// Require an instance member
    pub fn require_instance(mut self) -> Self {
        self.contract.is_static = Some(false);
        self
    }

    /// Require an exact parameter count
    pub fn parameter_count(mut self, count: usize) -> Self {
        self.contract.param_count = Some(count);
        self
    }

    /// Constrain the parameter at `index`
    pub fn parameter(mut self, index: usize, rule: TypeRule) -> Self {
        self.contract.params.retain(|(i, _)| *i != index);
        self.contract.params.push((index, rule));
        self.contract.params.sort_by_key(|(i, _)| *i);
        self
    }

    /// Parameter `index` is declared exactly as `ty`
    pub fn parameter_exact(self, index: usize, ty: TypeId) -> Self {
        self.parameter(index, TypeRule::Exact(ty))
    }

    /// Parameter `index` accepts a `ty` (declared as `ty` or a supertype)
    pub fn parameter_accepts(self, index: usize, ty: TypeId) -> Self {
        self.parameter(index, TypeRule::SupertypeOf(ty))
    }

    /// Exact parameter list
    pub fn parameters_exact(mut self, types: &[TypeId]) -> Self {
        self = self.parameter_count(types.len());
        for (index, &ty) in types.iter().enumerate() {
            self = self.parameter_exact(index, ty);
        }
        self
    }

    /// Constrain the return type (declaring type for constructors)
    pub fn return_type(mut self, rule: TypeRule) -> Self {
        self.contract.value_type = rule;
        self
    }

    /// Return type is exactly `ty`
    pub fn return_type_exact(self, ty: TypeId) -> Self {
        self.return_type(TypeRule::Exact(ty))
    }

    /// Return type is `ty` or a subtype
    pub fn return_type_assignable(self, ty: TypeId) -> Self {
        self.return_type(TypeRule::SubtypeOf(ty))
    }

    /// Declared field type is exactly `ty`
    pub fn field_type_exact(self, ty: TypeId) -> Self {
        self.return_type(TypeRule::Exact(ty))
    }

    /// Declared field type can hold a `ty`
    pub fn field_type_accepts(self, ty: TypeId) -> Self {
        self.return_type(TypeRule::SupertypeOf(ty))
    }

    /// Require an exact name
    pub fn name_exact(mut self, name: impl Into<String>) -> Self {
        self.contract.name = Some(NameRule::Exact(name.into()));
        self
    }

    /// Require the whole name to match a regular expression
    pub fn name_regex(mut self, pattern: Regex) -> Self {
        self.contract.name = Some(NameRule::Pattern(pattern));
        self
    }

    /// Finish the contract
    pub fn build(self) -> MemberContract {
        self.contract
    }
}
