use std::fmt;
use thiserror::Error;

/// Unified error type for all Photon operations.
///
/// Each variant corresponds to one class of contract violation. Variants carry
/// a preformatted message naming the types, columns or values involved.
///
/// # Thread Safety
///
/// `Error` is `Send + Sync + Clone`, so it can cross thread boundaries and be
/// stored by observers that want to report failures later.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The operation is not valid for the current state of the target.
    ///
    /// Raised when:
    /// - A field is accessed through a record that is not attached to the record set
    /// - A null nullable value is converted into a non-nullable target type
    /// - The capacity of a record set is set below its current row count
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// A narrowing numeric conversion produced a value outside the target range.
    #[error("arithmetic overflow: {0}")]
    Overflow(String),

    /// The source value cannot be represented as the target type.
    ///
    /// Covers incompatible primitive kinds (for example a date to an integer)
    /// and failed string parses.
    #[error("invalid cast: {0}")]
    InvalidCast(String),

    /// Invalid argument passed to a Photon API.
    ///
    /// Duplicate column names, columns already owned by a record set, records
    /// already attached elsewhere and out-of-range ordinals all land here.
    #[error("Invalid argument: {0}")]
    InvalidArgumentError(String),

    /// Lookup of an unknown key, typically a column name.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// The record set was structurally modified while a cursor was walking it.
    #[error("collection was modified; enumeration operation may not execute")]
    ConcurrentModification,

    /// Internal error indicating a bug or unexpected state.
    ///
    /// This should never surface during normal operation. A poisoned lock in
    /// the conversion cache is the most likely cause.
    #[error("An internal operation failed: {0}")]
    Internal(String),
}

impl Error {
    /// Create an invalid cast error between two named types.
    ///
    /// # Examples
    ///
    /// ```
    /// use photon_result::Error;
    ///
    /// let err = Error::invalid_cast("time::OffsetDateTime", "i16");
    /// assert!(matches!(err, Error::InvalidCast(msg) if msg.contains("i16")));
    /// ```
    #[inline]
    pub fn invalid_cast(source: &str, target: &str) -> Self {
        Error::InvalidCast(format!("cannot convert {source} to {target}"))
    }

    /// Create an invalid cast error for a string that failed to parse.
    #[inline]
    pub fn parse_failed(input: &str, target: &str) -> Self {
        Error::InvalidCast(format!("'{input}' is not a valid {target}"))
    }

    /// Create an overflow error for a value that does not fit its target type.
    #[inline]
    pub fn overflow<V: fmt::Display>(value: V, target: &str) -> Self {
        Error::Overflow(format!("value {value} is out of range for {target}"))
    }

    /// Create the error raised when a null value is unwrapped into a
    /// non-nullable target.
    #[inline]
    pub fn null_to_non_nullable(source: &str, target: &str) -> Self {
        Error::InvalidOperation(format!(
            "null {source} cannot be converted to non-nullable {target}"
        ))
    }

    /// Create the error raised when a record is used outside its record set.
    #[inline]
    pub fn detached_record() -> Self {
        Error::InvalidOperation("the record is not attached to this record set".to_string())
    }

    /// Create a key-not-found error for a column name.
    #[inline]
    pub fn column_not_found(name: &str) -> Self {
        Error::KeyNotFound(format!("column '{name}' does not exist"))
    }

    /// Create an internal error from any displayable failure.
    #[inline]
    pub fn internal<E: fmt::Display>(err: E) -> Self {
        Error::Internal(err.to_string())
    }
}
