//! Parcel codec errors.

use crate::common::ErrorSeverity;
use crate::status::StatusCode;

/// Failure while reading from or writing to a parcel.
///
/// A failed read leaves the read cursor where it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParcelError {
    /// Not enough bytes left to satisfy a read.
    #[error("parcel underflow at offset {offset}: needed {needed} bytes, {available} available")]
    Underflow {
        /// Read cursor when the read was attempted.
        offset: usize,
        /// Bytes the read required (including alignment padding).
        needed: usize,
        /// Bytes left after the cursor.
        available: usize,
    },

    /// A write would grow the parcel beyond its size limit.
    #[error("parcel capacity exceeded: {requested} bytes requested, limit is {limit}")]
    CapacityExceeded {
        /// Total size the parcel would have reached.
        requested: usize,
        /// Configured maximum parcel size.
        limit: usize,
    },

    /// A length prefix was negative (and not the null marker) or otherwise unusable.
    #[error("invalid length prefix {0}")]
    InvalidLength(i32),

    /// A collection count exceeded the configured element limit.
    #[error("collection of {count} elements exceeds limit of {limit}")]
    CollectionTooLarge {
        /// Count read from the parcel.
        count: usize,
        /// Configured upper bound.
        limit: usize,
    },

    /// A string field was not valid UTF-8.
    #[error("string field is not valid UTF-8")]
    InvalidUtf8,

    /// A string16 field was not valid UTF-16.
    #[error("string16 field is not valid UTF-16")]
    InvalidUtf16,

    /// A required value was encoded as null.
    #[error("required {0} is null")]
    UnexpectedNull(&'static str),

    /// A remote object slot did not reference an object carried by the parcel.
    #[error("remote object slot {slot} out of range ({len} objects attached)")]
    ObjectSlot {
        /// Slot read from the parcel.
        slot: i32,
        /// Number of objects attached to the parcel.
        len: usize,
    },

    /// A file descriptor slot did not reference a descriptor carried by the parcel.
    #[error("file descriptor slot {slot} out of range ({len} descriptors attached)")]
    DescriptorSlot {
        /// Slot read from the parcel.
        slot: i32,
        /// Number of descriptors attached to the parcel.
        len: usize,
    },

    /// Duplicating a file descriptor failed.
    #[error("failed to duplicate file descriptor: {0}")]
    DescriptorDup(String),

    /// An enum field carried a value with no matching variant.
    #[error("invalid value {value} for {field}")]
    InvalidEnum {
        /// Name of the field being decoded.
        field: &'static str,
        /// Raw value read from the parcel.
        value: u32,
    },
}

impl ParcelError {
    /// Create an underflow error.
    pub fn underflow(offset: usize, needed: usize, available: usize) -> Self {
        ParcelError::Underflow {
            offset,
            needed,
            available,
        }
    }

    /// Create an invalid-enum error.
    pub fn invalid_enum(field: &'static str, value: u32) -> Self {
        ParcelError::InvalidEnum { field, value }
    }

    /// Whether this error was raised while writing rather than reading.
    pub fn is_write_error(&self) -> bool {
        matches!(
            self,
            ParcelError::CapacityExceeded { .. } | ParcelError::DescriptorDup(_)
        )
    }

    /// Transport status reported for this error.
    ///
    /// A failed write means the request or reply could not be built and is a
    /// transport failure; a failed read is a malformed argument.
    pub fn status(&self) -> StatusCode {
        if self.is_write_error() {
            StatusCode::TransactionFailed
        } else {
            StatusCode::InvalidValue
        }
    }

    /// Severity used for logging.
    pub fn severity(&self) -> ErrorSeverity {
        if self.is_write_error() {
            ErrorSeverity::Error
        } else {
            ErrorSeverity::Warning
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_underflow_message() {
        let err = ParcelError::underflow(8, 4, 0);
        assert_eq!(
            err.to_string(),
            "parcel underflow at offset 8: needed 4 bytes, 0 available"
        );
    }

    #[test]
    fn test_write_errors_are_classified() {
        let err = ParcelError::CapacityExceeded {
            requested: 2048,
            limit: 1024,
        };
        assert!(err.is_write_error());
        assert_eq!(err.severity(), ErrorSeverity::Error);
        assert!(!ParcelError::InvalidUtf8.is_write_error());
    }

    #[test]
    fn test_write_errors_map_to_transaction_failed() {
        let capacity = ParcelError::CapacityExceeded {
            requested: 2048,
            limit: 1024,
        };
        assert_eq!(capacity.status(), StatusCode::TransactionFailed);
        assert_eq!(
            ParcelError::DescriptorDup("EBADF".to_owned()).status(),
            StatusCode::TransactionFailed
        );
    }

    #[test]
    fn test_read_errors_map_to_invalid_value() {
        assert_eq!(ParcelError::InvalidUtf16.status(), StatusCode::InvalidValue);
        assert_eq!(
            ParcelError::UnexpectedNull("want").status(),
            StatusCode::InvalidValue
        );
    }
}
