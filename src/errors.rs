//! Error types for schema construction and pack/unpack operations.

use thiserror::Error;

/// Errors raised once, when a [crate::schema::Schema] is built from its
/// field list. These indicate a mistake in the schema itself, never bad data.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A literal format specifier is not part of the supported lexicon.
    #[error("unsupported format specifier '{0}'")]
    UnsupportedSpecifier(String),
    /// Field name is empty.
    #[error("field name must not be empty")]
    EmptyFieldName,
    /// Two fields in the same schema share a name.
    #[error("duplicate field name '{0}'")]
    DuplicateFieldName(String),
    /// The declared type of a switch field is not the union of its case types.
    #[error("switch '{name}': declared type {declared:?} does not cover case types {cases:?}")]
    SwitchTypeMismatch {
        name: String,
        declared: crate::value::TypeTag,
        cases: Vec<crate::value::TypeTag>,
    },
    /// Two switch cases normalize to the same key.
    #[error("switch '{name}': duplicate case key '{key}'")]
    DuplicateSwitchCase { name: String, key: String },
    /// A conditional field's when-false value or inner field does not fit
    /// the declared type.
    #[error("cond '{name}': {reason}")]
    CondTypeMismatch { name: String, reason: String },
    /// A repeat field has neither a count nor a stop condition.
    #[error("repeat '{name}' needs a count or a stop condition")]
    UnboundedRepeat { name: String },
    /// A no-value variant declares a value type, or a value-carrying variant
    /// declares the no-value type.
    #[error("field '{name}': {reason}")]
    InvalidFieldType { name: String, reason: String },
}

/// Errors raised while packing or unpacking one structure instance.
/// The operation aborts immediately; a stream may hold partially written
/// bytes after a failed pack, which callers must treat as invalid.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A deferred format expression produced an unsupported specifier.
    #[error("unsupported format specifier '{0}'")]
    UnsupportedSpecifier(String),
    /// A value does not fit the representable range of its format.
    #[error("value out of range for '{fmt}': {value}")]
    ValueOutOfRange { fmt: String, value: String },
    /// The stream ended before the requested bytes could be read.
    #[error("unexpected end of stream: needed {needed} bytes, got {got}")]
    UnexpectedEndOfStream { needed: usize, got: usize },
    /// A context lookup failed everywhere in the frame chain
    /// (forward or undeclared reference).
    #[error("unknown context name '{0}'")]
    UnknownContextName(String),
    /// A switch discriminant matched no case and no default arm was given.
    #[error("unmatched switch case '{key}'")]
    UnmatchedSwitchCase { key: String },
    /// A field received a value outside its declared type on pack.
    #[error("value type mismatch for '{name}': expected {expected:?}, got {got}")]
    ValueTypeMismatch {
        name: String,
        expected: crate::value::TypeTag,
        got: String,
    },
    /// Padding bytes failed verification, or padding length went negative.
    #[error("bad padding: {0}")]
    BadPadding(String),
    /// The stream position is before the structure's start, so a
    /// structure-relative offset cannot be computed.
    #[error("position {pos} is before the structure start {start}")]
    PositionBeforeStart { pos: u64, start: u64 },
    /// Underlying stream failure.
    #[error("stream error: {0}")]
    Io(#[from] std::io::Error),
    /// A failure wrapped with the field path being processed.
    #[error("{source}; while processing '{path}'")]
    At {
        path: String,
        #[source]
        source: Box<CodecError>,
    },
}

impl CodecError {
    /// Wraps this error with the name of the field being processed.
    pub(crate) fn at(self, path: &str) -> CodecError {
        CodecError::At {
            path: path.to_string(),
            source: Box::new(self),
        }
    }
}
