//! # wordpack
//!
//! A compiler for packed, word-aligned struct codecs.
//!
//! Describe a root field (primitives, fixed and dynamic byte strings, text,
//! tuples, and arrays of any of these nested to any depth), compile it once,
//! then encode [value::Value] trees into a dense bitstream and decode them
//! back. Compilation yields struct declarations for every tuple plus a list of
//! decoder operations that read each field with one 256-bit load, a shift and
//! a mask.
//!
//! ## Example
//!
//! ```
//! use wordpack::field::FieldSchema;
//! use wordpack::schema::Schema;
//! use wordpack::value::Value;
//!
//! let root = FieldSchema::tuple(
//!     "root",
//!     vec![
//!         FieldSchema::new("a", "bool"),
//!         FieldSchema::new("b", "bool"),
//!         FieldSchema::new("c", "uint16"),
//!     ],
//! );
//! let schema = Schema::compile(&root).unwrap();
//!
//! let value = Value::Tuple(vec![Value::Bool(true), Value::Bool(false), Value::uint(100)]);
//! let bytes = schema.encode(&value).unwrap();
//! assert_eq!(bytes, vec![0x01, 0x00, 0x00, 0x64]);
//! assert_eq!(schema.parse(&bytes).unwrap(), value);
//! ```

pub mod bits;
pub mod compiled;
pub mod emit;
pub mod encode;
pub mod errors;
pub mod expand;
pub mod field;
pub mod layout;
pub mod options;
#[cfg(feature = "serde")]
pub mod serde;
pub mod schema;
pub mod structs;
pub mod types;
pub mod value;
