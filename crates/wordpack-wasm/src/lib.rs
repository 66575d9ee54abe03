//! WASM bindings for the `wordpack` schema compiler.
//!
//! This crate exposes a compact API to JavaScript for compiling an ABI-style
//! JSON schema once, then packing values into the wire form and decoding
//! payloads back, many times.
//!
//! ```text
//! // Pseudo TypeScript example
//! //
//! // const schemaJson = JSON.stringify({
//! //   name: "order",
//! //   type: "tuple",
//! //   components: [
//! //     { name: "id", type: "uint64" },
//! //     { name: "tags", type: "string[]" }
//! //   ]
//! // });
//! //
//! // const schema = new WasmSchema(schemaJson);
//! // const bytes = schema.encode([7, ["a", "b"]]);
//! // const value = schema.parse(bytes);   // [7, ["a", "b"]]
//! // const ops = schema.operations();     // decoder program for a renderer
//! ```
//!
//! See [convert] for the JSON value convention. Errors cross the boundary as
//! `JsValue` strings.

pub mod convert;

use serde::Serialize;
use serde_wasm_bindgen::Serializer;
use wasm_bindgen::prelude::*;
use wordpack::{
    field::FieldSchema,
    options::CompileOptions,
    schema::Schema,
    serde::{CompileOptionsDef, FieldSchemaDef},
};

use crate::convert::error_to_js;

/// Compiled schema usable from JavaScript.
#[wasm_bindgen]
pub struct WasmSchema {
    schema: Schema,
}

#[wasm_bindgen]
impl WasmSchema {
    /// Compiles a schema from its JSON definition (`{ name, type, components }`).
    #[wasm_bindgen(constructor)]
    pub fn new(schema_json: &str) -> Result<WasmSchema, JsValue> {
        Self::with_options(schema_json, "{}")
    }

    /// Compiles a schema with options such as `{ "struct_dedup": "by_structure" }`.
    #[wasm_bindgen(js_name = withOptions)]
    pub fn with_options(schema_json: &str, options_json: &str) -> Result<WasmSchema, JsValue> {
        let def: FieldSchemaDef = serde_json::from_str(schema_json).map_err(error_to_js)?;
        let options: CompileOptionsDef = serde_json::from_str(options_json).map_err(error_to_js)?;

        let root: FieldSchema = def.into();
        let schema = Schema::compile_with(&root, &CompileOptions::from(options)).map_err(error_to_js)?;
        Ok(WasmSchema { schema })
    }

    /// Struct declarations, inner tuples first.
    pub fn structs(&self) -> Result<JsValue, JsValue> {
        self.schema
            .structs()
            .serialize(&Serializer::json_compatible())
            .map_err(error_to_js)
    }

    /// The full decoder program.
    pub fn operations(&self) -> Result<JsValue, JsValue> {
        self.schema
            .program()
            .serialize(&Serializer::json_compatible())
            .map_err(error_to_js)
    }

    /// Packs a JS value shaped like the schema.
    pub fn encode(&self, value: JsValue) -> Result<Vec<u8>, JsValue> {
        let json: serde_json::Value = serde_wasm_bindgen::from_value(value).map_err(error_to_js)?;
        let value = convert::json_to_value(self.schema.name(), self.schema.node(), &json).map_err(error_to_js)?;
        self.schema.encode(&value).map_err(error_to_js)
    }

    /// Decodes a payload that holds exactly one encoded value.
    pub fn parse(&self, data: &[u8]) -> Result<JsValue, JsValue> {
        let value = self.schema.parse(data).map_err(error_to_js)?;
        convert::value_to_json(&value)
            .serialize(&Serializer::json_compatible())
            .map_err(error_to_js)
    }
}
