use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during encoding or decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// NaN values are forbidden.
    #[error("NaN values are forbidden")]
    NaNForbidden,

    /// Indefinite-length items are forbidden.
    #[error("indefinite-length items are forbidden")]
    IndefiniteLengthForbidden,

    /// Invalid UTF-8 string.
    #[error("invalid UTF-8 string")]
    InvalidUtf8,

    /// Unexpected end of input.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// Invalid CBOR structure.
    #[error("invalid CBOR structure: {message}")]
    InvalidStructure {
        /// Description of the structural error.
        message: String,
    },

    /// Unsupported CBOR type.
    #[error("unsupported CBOR type: {type_name}")]
    UnsupportedType {
        /// Name of the unsupported type.
        type_name: String,
    },

    /// A length header claims more than the decoder allows.
    #[error("size limit exceeded: claimed {claimed}, max allowed {max_allowed}")]
    SizeLimitExceeded {
        /// The length found in the input.
        claimed: u64,
        /// The configured limit.
        max_allowed: u64,
    },
}

impl CodecError {
    /// Create an invalid structure error.
    pub fn invalid_structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure {
            message: message.into(),
        }
    }

    /// Create an unsupported type error.
    pub fn unsupported_type(type_name: impl Into<String>) -> Self {
        Self::UnsupportedType {
            type_name: type_name.into(),
        }
    }
}
