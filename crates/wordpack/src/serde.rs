//! JSON-deserializable schema description.
//!
//! These types describe a root field the same way an ABI-style JSON schema
//! does and convert into the core [crate::field::FieldSchema] and
//! [crate::options::CompileOptions].
//!
//! ```json
//! {
//!   "name": "order",
//!   "type": "tuple",
//!   "components": [
//!     { "name": "id", "type": "uint64" },
//!     { "name": "items", "type": "tuple[]", "components": [
//!       { "name": "sku", "type": "bytes8" },
//!       { "name": "qty", "type": "uint16" }
//!     ] }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

/// A single named field.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct FieldSchemaDef {
    pub name: String,
    /// Type string such as `uint16`, `bytes`, `tuple[2][]`.
    #[serde(rename = "type")]
    pub ty: String,
    /// Required for tuple-based types, absent otherwise.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<FieldSchemaDef>,
}

#[derive(Debug, Deserialize, Serialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StructDedupDef {
    #[default]
    ByName,
    ByStructure,
}

#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
pub struct CompileOptionsDef {
    #[serde(default)]
    pub struct_dedup: StructDedupDef,
}
