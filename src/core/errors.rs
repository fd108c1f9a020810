/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Port operation result
pub type PortResult<T> = Result<T, PortError>;

/// Unified port error type with serialization support
#[derive(Error, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum PortError {
    #[error("Allocation failed")]
    #[diagnostic(
        code(port::out_of_memory),
        help("System may be low on memory. Consider freeing resources.")
    )]
    OutOfMemory,

    #[error("Port has no remaining clients")]
    #[diagnostic(
        code(port::not_available),
        help("The last handle to this port has closed. No further packets can be queued.")
    )]
    NotAvailable,

    #[error("Target does not expose a waitable signal tracker")]
    #[diagnostic(
        code(port::not_supported),
        help("Only waitable objects can be bound to a port.")
    )]
    NotSupported,

    #[error("No binding matches the given target and key")]
    #[diagnostic(
        code(port::bad_handle),
        help("The (target, key) pair was never bound or has already been unbound.")
    )]
    BadHandle,

    #[error("Destination buffer too small: {required} bytes required")]
    #[diagnostic(
        code(port::buffer_too_small),
        help("Retry with a buffer of at least the required size. The packet is still intact.")
    )]
    BufferTooSmall { required: usize },

    #[error("User memory copy failed")]
    #[diagnostic(
        code(port::copy_fault),
        help("The user address range is invalid or unmapped. Check buffer pointers.")
    )]
    CopyFault,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = PortError::BufferTooSmall { required: 100 };
        assert_eq!(
            err.to_string(),
            "Destination buffer too small: 100 bytes required"
        );
    }

    #[test]
    fn test_tagged_serialization() {
        // The adjacently tagged form is for self-describing formats on
        // the external surface; binary codecs only ever serialize it.
        let err = PortError::BufferTooSmall { required: 42 };
        let bytes = bincode::serialize(&err).unwrap();

        let tag = b"buffer_too_small";
        assert!(bytes.windows(tag.len()).any(|w| w == tag));
    }
}
