//! Error types raised by the host object model

use crate::types::TypeId;

/// Result type for host operations
pub type HostResult<T> = Result<T, HostError>;

/// Errors raised while registering types or invoking host members
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HostError {
    /// A type with the same name is already registered
    #[error("Duplicate type name: {0}")]
    DuplicateType(String),

    /// No type is registered under this id
    #[error("Unknown type: {0}")]
    UnknownType(TypeId),

    /// A type definition is malformed
    #[error("Invalid definition for {name}: {reason}")]
    InvalidDefinition {
        /// Name of the offending type
        name: String,
        /// What is wrong with it
        reason: String,
    },

    /// Wrong number of arguments passed to a constructor or method
    #[error("Arity mismatch: expected {expected} arguments, got {got}")]
    Arity {
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        got: usize,
    },

    /// An argument is not assignable to the declared parameter type
    #[error("Argument {index}: {got} is not assignable to {expected}")]
    ArgumentType {
        /// Parameter position
        index: usize,
        /// Declared parameter type name
        expected: String,
        /// Runtime type name of the argument
        got: String,
    },

    /// No constructor or method at this index
    #[error("No {kind} #{index} on {type_name}")]
    UnknownMember {
        /// "constructor" or "method"
        kind: &'static str,
        /// Declaring type name
        type_name: String,
        /// Member index
        index: usize,
    },

    /// Receiver missing, superfluous, or of the wrong type
    #[error("Receiver mismatch: {0}")]
    Receiver(String),

    /// Slot index past the end of an object's layout
    #[error("Slot {slot} out of bounds ({len} slots)")]
    SlotOutOfBounds {
        /// Requested slot
        slot: usize,
        /// Number of slots on the object
        len: usize,
    },

    /// The host's own validation rejected the call
    #[error("Host rejected call: {0}")]
    Rejected(String),
}
