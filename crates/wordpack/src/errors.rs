//! Error types for schema compilation, packed encoding and decoding.

use thiserror::Error;

/// Structural problems in an author-supplied [crate::field::FieldSchema].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// An array suffix is not `[]` or `[N]` with `N >= 1`.
    #[error("field `{field}`: malformed array dimension in `{ty}`")]
    InvalidDimension { field: String, ty: String },
    /// A tuple-typed field has no component list.
    #[error("field `{0}` is a tuple but declares no components")]
    MissingComponents(String),
    /// A non-tuple field carries a component list.
    #[error("field `{0}` declares components but is not a tuple")]
    UnexpectedComponents(String),
}

/// A base type string that none of the emission strategies understand.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("field `{field}`: unsupported type `{ty}`")]
pub struct UnsupportedTypeError {
    pub field: String,
    pub ty: String,
}

/// Errors produced while compiling a schema (expansion, struct extraction).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    UnsupportedType(#[from] UnsupportedTypeError),
}

/// Errors produced when packing a [crate::value::Value] against a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// The schema itself failed to resolve.
    #[error(transparent)]
    Schema(#[from] CompileError),
    /// The value variant does not match the schema node.
    #[error("field `{field}`: expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
    /// An integer does not fit the declared bit width.
    #[error("field `{field}`: value does not fit in {bits} bits")]
    ValueOutOfRange { field: String, bits: u16 },
    /// A fixed-size array, tuple or byte string has the wrong number of items.
    #[error("field `{field}`: expected {expected} items, got {actual}")]
    LengthMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },
    /// A dynamic length does not fit the 32-bit header.
    #[error("field `{field}`: length {len} exceeds the 32-bit header")]
    TooLong { field: String, len: usize },
}

/// Errors produced when replaying decoder operations over a packed blob.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    /// A read touches bytes beyond the end of the input.
    #[error("read of {len} bytes at offset {offset} is out of bounds")]
    OutOfBounds { offset: usize, len: usize },
    /// A count header promises more data than the input holds.
    #[error("field `{field}`: count {count} exceeds the remaining input")]
    LengthOverflow { field: String, count: usize },
    /// A `string` payload is not valid UTF-8.
    #[error("field `{field}`: payload is not valid UTF-8")]
    InvalidUtf8 { field: String },
    /// Input is longer than what the schema consumes.
    #[error("decoded {consumed} bytes but input holds {len}")]
    TrailingBytes { consumed: usize, len: usize },
}
