//! Error types for the bridge crate

use std::any::type_name;

/// Bridge-specific error types
///
/// Script-side failures pass through unchanged; native failures are
/// translated into a form the script side can display.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Error raised inside the script runtime (missing global, type
    /// mismatch, `error()` call). The message carries the script-side
    /// traceback captured by the runtime's protected call handler.
    #[error("{0}")]
    Script(#[from] mlua::Error),

    /// Recognized native failure, translated with its type name and message.
    #[error("exception {category}: {message}")]
    Native { category: String, message: String },

    /// Native fault that carried no usable error value.
    #[error("native exception (unrecognized)")]
    Unrecognized,

    /// Write larger than a fixed-size buffer under
    /// [`OverflowPolicy::Reject`](crate::buffer::OverflowPolicy).
    #[error("buffer write of {len} bytes exceeds capacity {capacity}")]
    BufferOverflow { capacity: usize, len: usize },
}

impl BridgeError {
    /// Translate a structured native error for the script side.
    ///
    /// The error's type name stands in for the category; the message is its
    /// `Display` output.
    pub fn native<E: std::error::Error>(err: E) -> Self {
        Self::Native {
            category: type_name::<E>().to_string(),
            message: err.to_string(),
        }
    }
}

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_errors_carry_category_and_message() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "socket closed");
        let err = BridgeError::native(io);

        let formatted = err.to_string();
        assert!(formatted.starts_with("exception std::io::"));
        assert!(formatted.ends_with(": socket closed"));
    }

    #[test]
    fn unrecognized_errors_are_opaque() {
        assert_eq!(
            BridgeError::Unrecognized.to_string(),
            "native exception (unrecognized)"
        );
    }
}
