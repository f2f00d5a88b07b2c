//! Ordinal enumeration converter
//!
//! A stable enumeration and the host's own enumeration are assumed to list
//! their constants in the same order; the wrapper author keeps them aligned.
//! Conversion is by ordinal in both directions. A host release that adds or
//! drops constants shows up as [`ReflectError::OrdinalOutOfRange`] (or, when
//! checked up front, as a layout mismatch).

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::warn;
use wrapkit_host::{EnumConstant, TypeId, TypeRegistry, Value};

use super::EquivalentConverter;
use crate::config::LayoutPolicy;
use crate::error::{ReflectError, ReflectResult};

/// Stable enumeration addressed by ordinal
pub trait OrdinalEnum: Copy + Send + Sync + 'static {
    /// Every variant in ordinal order
    const VARIANTS: &'static [Self];

    /// Position of this variant
    fn ordinal(self) -> usize;

    /// Variant at `ordinal`
    fn from_ordinal(ordinal: usize) -> Option<Self> {
        Self::VARIANTS.get(ordinal).copied()
    }
}

/// Declare a fieldless enum and implement [`OrdinalEnum`] for it
///
/// ```ignore
/// ordinal_enum! {
///     /// Attribute modifier operation
///     pub enum Operation {
///         AddNumber,
///         AddPercentage,
///         MultiplyPercentage,
///     }
/// }
/// ```
#[macro_export]
macro_rules! ordinal_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $crate::OrdinalEnum for $name {
            const VARIANTS: &'static [Self] = &[$(Self::$variant),+];

            fn ordinal(self) -> usize {
                self as usize
            }
        }
    };
}

/// Converts a stable [`OrdinalEnum`] to the host enumeration constant at
/// the same ordinal
pub struct EnumConverter<E> {
    opaque_type: TypeId,
    type_name: Arc<str>,
    constants: usize,
    _marker: PhantomData<fn() -> E>,
}

impl<E> Clone for EnumConverter<E> {
    fn clone(&self) -> Self {
        Self {
            opaque_type: self.opaque_type,
            type_name: Arc::clone(&self.type_name),
            constants: self.constants,
            _marker: PhantomData,
        }
    }
}

impl<E> fmt::Debug for EnumConverter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumConverter")
            .field("stable", &std::any::type_name::<E>())
            .field("opaque", &self.type_name)
            .field("constants", &self.constants)
            .finish()
    }
}

impl<E: OrdinalEnum> EnumConverter<E> {
    /// Converter to the host enumeration `opaque_type`
    pub fn new(registry: &TypeRegistry, opaque_type: TypeId) -> ReflectResult<Self> {
        let ty = registry.type_of(opaque_type)?;
        if !ty.is_enum() {
            return Err(ReflectError::NotAnEnum {
                type_name: ty.name().to_string(),
            });
        }
        Ok(Self {
            opaque_type,
            type_name: ty.name().into(),
            constants: ty.enum_constants().len(),
            _marker: PhantomData,
        })
    }

    /// Host enumeration type
    pub fn opaque_type(&self) -> TypeId {
        self.opaque_type
    }

    /// Number of host constants
    pub fn opaque_len(&self) -> usize {
        self.constants
    }

    /// Compare the lengths of both enumerations under `policy`
    pub fn check_alignment(&self, policy: LayoutPolicy) -> ReflectResult<()> {
        let stable = E::VARIANTS.len();
        if policy == LayoutPolicy::Off || stable == self.constants {
            return Ok(());
        }

        if policy == LayoutPolicy::Strict {
            return Err(ReflectError::LayoutMismatch {
                type_name: self.type_name.to_string(),
                field_type: "enum constant".to_string(),
                expected: stable,
                found: self.constants,
            });
        }

        warn!(
            stable = std::any::type_name::<E>(),
            opaque = %self.type_name,
            stable_len = stable,
            opaque_len = self.constants,
            "enumerations diverged; affected ordinals will fail to convert"
        );
        Ok(())
    }
}

impl<E: OrdinalEnum> EquivalentConverter for EnumConverter<E> {
    type Stable = E;

    fn to_opaque(&self, stable: &E) -> ReflectResult<Value> {
        let ordinal = stable.ordinal();
        if ordinal >= self.constants {
            return Err(ReflectError::OrdinalOutOfRange {
                ordinal,
                len: self.constants,
                type_name: self.type_name.to_string(),
            });
        }
        Ok(Value::Enum(EnumConstant::new(self.opaque_type, ordinal)))
    }

    fn to_stable(&self, opaque: &Value) -> ReflectResult<E> {
        let constant = match opaque {
            Value::Enum(constant) if constant.type_id == self.opaque_type => *constant,
            other => {
                return Err(ReflectError::UnexpectedValue {
                    expected: format!("constant of {}", self.type_name),
                    got: other.kind_name().to_string(),
                })
            }
        };
        if constant.ordinal >= self.constants {
            return Err(ReflectError::OrdinalOutOfRange {
                ordinal: constant.ordinal,
                len: self.constants,
                type_name: self.type_name.to_string(),
            });
        }
        E::from_ordinal(constant.ordinal).ok_or_else(|| ReflectError::OrdinalOutOfRange {
            ordinal: constant.ordinal,
            len: E::VARIANTS.len(),
            type_name: std::any::type_name::<E>().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wrapkit_host::TypeBuilder;

    crate::ordinal_enum! {
        enum Suit {
            Clubs,
            Diamonds,
            Hearts,
            Spades,
        }
    }

    fn host_with_suits(constants: &[&str]) -> (TypeRegistry, TypeId) {
        let mut registry = TypeRegistry::new();
        let suit = registry
            .register(TypeBuilder::enumeration("CardSuit", constants.iter().copied()))
            .unwrap();
        (registry, suit)
    }

    #[test]
    fn test_ordinals() {
        assert_eq!(Suit::Hearts.ordinal(), 2);
        assert_eq!(Suit::from_ordinal(3), Some(Suit::Spades));
        assert_eq!(Suit::from_ordinal(4), None);
    }

    #[test]
    fn test_every_ordinal_round_trips() {
        let (registry, suit) = host_with_suits(&["CLUBS", "DIAMONDS", "HEARTS", "SPADES"]);
        let converter = EnumConverter::<Suit>::new(&registry, suit).unwrap();

        for &variant in Suit::VARIANTS {
            let opaque = converter.to_opaque(&variant).unwrap();
            assert_eq!(opaque, Value::Enum(EnumConstant::new(suit, variant.ordinal())));
            assert_eq!(converter.to_stable(&opaque).unwrap(), variant);
        }
        assert!(converter.check_alignment(LayoutPolicy::Strict).is_ok());
    }

    #[test]
    fn test_shorter_host_enum_fails() {
        let (registry, suit) = host_with_suits(&["CLUBS", "DIAMONDS", "HEARTS"]);
        let converter = EnumConverter::<Suit>::new(&registry, suit).unwrap();

        assert!(converter.to_opaque(&Suit::Hearts).is_ok());
        assert!(matches!(
            converter.to_opaque(&Suit::Spades),
            Err(ReflectError::OrdinalOutOfRange { ordinal: 3, len: 3, .. })
        ));
        assert!(matches!(
            converter.check_alignment(LayoutPolicy::Strict),
            Err(ReflectError::LayoutMismatch { expected: 4, found: 3, .. })
        ));
        assert!(converter.check_alignment(LayoutPolicy::Warn).is_ok());
    }

    #[test]
    fn test_undefined_host_constant_fails_back() {
        let (registry, suit) = host_with_suits(&["CLUBS", "DIAMONDS", "HEARTS"]);
        let converter = EnumConverter::<Suit>::new(&registry, suit).unwrap();

        let undefined = Value::Enum(EnumConstant::new(suit, 3));
        match converter.to_stable(&undefined) {
            Err(ReflectError::OrdinalOutOfRange { ordinal, len, type_name }) => {
                assert_eq!((ordinal, len), (3, 3));
                assert_eq!(type_name, "CardSuit");
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_longer_host_enum_fails_back() {
        let (registry, suit) = host_with_suits(&["CLUBS", "DIAMONDS", "HEARTS", "SPADES", "STARS"]);
        let converter = EnumConverter::<Suit>::new(&registry, suit).unwrap();

        let stars = Value::Enum(EnumConstant::new(suit, 4));
        assert!(matches!(
            converter.to_stable(&stars),
            Err(ReflectError::OrdinalOutOfRange { ordinal: 4, len: 4, .. })
        ));
    }

    #[test]
    fn test_rejects_foreign_values() {
        let (mut registry, suit) = host_with_suits(&["CLUBS"]);
        let other = registry
            .register(TypeBuilder::enumeration("Rank", ["ACE"]))
            .unwrap();
        let converter = EnumConverter::<Suit>::new(&registry, suit).unwrap();

        assert!(converter.to_stable(&Value::Enum(EnumConstant::new(other, 0))).is_err());
        assert!(converter.to_stable(&Value::Int(0)).is_err());
    }

    #[test]
    fn test_requires_enum_type() {
        let mut registry = TypeRegistry::new();
        let class = registry.register(TypeBuilder::class("Card")).unwrap();
        assert!(matches!(
            EnumConverter::<Suit>::new(&registry, class),
            Err(ReflectError::NotAnEnum { .. })
        ));
    }
}
