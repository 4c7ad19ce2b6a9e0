//! Bridge Error Types
//!
//! Only environment-integrity failures are errors. A primitive that fails
//! reports an ordinary status integer and never becomes a `BridgeError`.

use thiserror::Error;

/// Fatal failures raised while marshalling buffers across the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// The runtime does not know the handle (freed or never allocated)
    #[error("unknown buffer handle {0}")]
    UnknownHandle(u64),

    /// The handle is neither direct nor backed by an accessible array
    #[error("buffer has no accessible backing array: {0}")]
    NoBackingArray(String),

    /// The backing array could not be pinned
    #[error("failed to pin backing array: {0}")]
    PinFailed(String),

    /// Offset or remaining-length metadata could not be read
    #[error("failed to read buffer metadata: {0}")]
    Metadata(String),

    /// The reported view window does not fit inside the backing array
    #[error("view window [{offset}, {offset}+{len}) exceeds backing array of {array_len} bytes")]
    WindowOutOfBounds {
        offset: usize,
        len: usize,
        array_len: usize,
    },

    /// Caller passed the wrong number of buffers or scalars for a primitive
    #[error("{primitive}: expected {expected} arguments, got {got}")]
    InvalidArgCount {
        primitive: &'static str,
        expected: usize,
        got: usize,
    },

    /// A named argument does not match any parameter of the primitive
    #[error("{primitive}: no parameter named '{name}'")]
    UnknownParameter {
        primitive: &'static str,
        name: String,
    },

    /// Native memory for a buffer or a pinned copy could not be allocated
    #[error("failed to allocate {0} bytes")]
    AllocationFailed(usize),

    /// The primitive glue panicked; buffers were still released
    #[error("primitive panicked: {0}")]
    Panic(String),
}

impl BridgeError {
    /// True for failures of the managed runtime itself, as opposed to
    /// caller mistakes such as a wrong argument count.
    pub fn is_environment(&self) -> bool {
        !matches!(
            self,
            BridgeError::InvalidArgCount { .. } | BridgeError::UnknownParameter { .. }
        )
    }
}

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BridgeError::WindowOutOfBounds {
            offset: 8,
            len: 32,
            array_len: 16,
        };
        let msg = err.to_string();
        assert!(msg.contains("8"));
        assert!(msg.contains("32"));
        assert!(msg.contains("16"));
    }

    #[test]
    fn test_environment_classification() {
        assert!(BridgeError::UnknownHandle(7).is_environment());
        assert!(BridgeError::PinFailed("gone".into()).is_environment());
        assert!(!BridgeError::InvalidArgCount {
            primitive: "randombytes_buf",
            expected: 1,
            got: 2,
        }
        .is_environment());
    }
}
