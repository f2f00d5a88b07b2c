//! Error types for structural reflection and conversion

use std::fmt;
use std::path::PathBuf;

use wrapkit_host::HostError;

/// Result type for reflection and conversion
pub type ReflectResult<T> = Result<T, ReflectError>;

/// Kind of member a contract is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// Constructor
    Constructor,
    /// Method
    Method,
    /// Field
    Field,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MemberKind::Constructor => "constructor",
            MemberKind::Method => "method",
            MemberKind::Field => "field",
        })
    }
}

/// Reflection and conversion failures
///
/// Every variant except [`ReflectError::Invocation`] describes a static
/// incompatibility between a wrapper and the running host release; none of
/// them is worth retrying.
#[derive(Debug, thiserror::Error)]
pub enum ReflectError {
    /// No member satisfies the contract
    #[error("No {kind} of {type_name} matches {contract}")]
    NoMatchingMember {
        /// Member kind searched
        kind: MemberKind,
        /// Target type
        type_name: String,
        /// Rendered contract
        contract: String,
    },

    /// More than one member satisfies the contract
    #[error("Ambiguous contract {contract}: {candidates} {kind}s of {type_name} match")]
    AmbiguousContract {
        /// Member kind searched
        kind: MemberKind,
        /// Target type
        type_name: String,
        /// Rendered contract
        contract: String,
        /// Number of matching members
        candidates: usize,
    },

    /// A resolved member failed when invoked
    #[error("Failed to invoke {member} of {type_name}")]
    Invocation {
        /// Member description, including the contract that located it
        member: String,
        /// Declaring type
        type_name: String,
        /// Host-side cause
        #[source]
        source: HostError,
    },

    /// Positional access past the end of a type-filtered view
    #[error("Index {index} out of range for {field_type} fields of {type_name} ({len} available)")]
    IndexOutOfRange {
        /// Requested position
        index: usize,
        /// Length of the filtered view
        len: usize,
        /// Filter type
        field_type: String,
        /// Target type
        type_name: String,
    },

    /// A value or instance does not fit the declared type
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Declared type
        expected: String,
        /// Actual type
        got: String,
    },

    /// A stable or opaque enumeration has no constant at this ordinal
    #[error("Ordinal {ordinal} out of range for {type_name} ({len} constants)")]
    OrdinalOutOfRange {
        /// Requested ordinal
        ordinal: usize,
        /// Constants available
        len: usize,
        /// Enumeration lacking the constant
        type_name: String,
    },

    /// A converter received a value of the wrong shape
    #[error("Unexpected value: expected {expected}, got {got}")]
    UnexpectedValue {
        /// Shape the converter handles
        expected: String,
        /// Shape it received
        got: String,
    },

    /// The host type is not an enumeration
    #[error("{type_name} is not an enumeration")]
    NotAnEnum {
        /// Offending type
        type_name: String,
    },

    /// None of the candidate names is registered by the host
    #[error("No host type for {stable} under any of {candidates:?}")]
    TypeNotFound {
        /// Stable name of the type
        stable: String,
        /// Host names tried, in order
        candidates: Vec<String>,
    },

    /// A declared layout expectation does not hold
    #[error("Layout of {type_name} changed: expected {expected} {field_type} fields, found {found}")]
    LayoutMismatch {
        /// Inspected type
        type_name: String,
        /// Field type counted
        field_type: String,
        /// Declared count
        expected: usize,
        /// Actual count
        found: usize,
    },

    /// Host-level failure outside a member invocation
    #[error(transparent)]
    Host(#[from] HostError),

    /// Malformed configuration
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration file could not be read
    #[error("Failed to read configuration {}", path.display())]
    ConfigIo {
        /// File path
        path: PathBuf,
        /// I/O cause
        #[source]
        source: std::io::Error,
    },
}
