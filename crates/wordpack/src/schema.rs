//! Schema: a compiled root field ready to encode values and decode packed bytes.

use tracing::debug;

use crate::{
    compiled::{Decoded, DecoderProgram, Operation, RootShape},
    emit::emit,
    encode::encode_node,
    errors::{CompileError, EncodeError, ReadError},
    expand::{ExpandedKind, expand_node},
    field::{FieldSchema, Node},
    layout::annotate,
    options::CompileOptions,
    structs::{StructDeclaration, extract_structs},
    value::Value,
};

/// A compiled schema. Use [Schema::compile] to build one from a root
/// [FieldSchema], then [Schema::encode] and [Schema::parse] to move between
/// [Value]s and packed bytes.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    node: Node,
    structs: Vec<StructDeclaration>,
    program: DecoderProgram,
}

impl Schema {
    /// Compiles `root` with default options.
    pub fn compile(root: &FieldSchema) -> Result<Self, CompileError> {
        Self::compile_with(root, &CompileOptions::default())
    }

    /// Compiles `root`. Fails if any type string, dimension or component list is invalid.
    pub fn compile_with(root: &FieldSchema, options: &CompileOptions) -> Result<Self, CompileError> {
        let node = root.resolve()?;
        let structs = extract_structs(root, options.struct_dedup)?;
        let program = build_program(&root.name, &node);

        debug!(
            root = %root.name,
            structs = structs.len(),
            ops = program.body.op_count(),
            "compiled schema"
        );

        Ok(Self {
            name: root.name.clone(),
            node,
            structs,
            program,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Struct declarations, inner tuples first and the root last.
    pub fn structs(&self) -> &[StructDeclaration] {
        &self.structs
    }

    /// Top-level decoder operations.
    pub fn operations(&self) -> &[Operation] {
        &self.program.body.ops
    }

    pub fn program(&self) -> &DecoderProgram {
        &self.program
    }

    /// Packs `value` into its wire form.
    pub fn encode(&self, value: &Value) -> Result<Vec<u8>, EncodeError> {
        encode_node(&self.name, &self.node, value)
    }

    /// Decodes one value from the front of `data`, reporting how much was consumed.
    pub fn decode(&self, data: &[u8]) -> Result<Decoded, ReadError> {
        self.program.execute(data)
    }

    /// Decodes `data`, which must hold exactly one encoded value.
    pub fn parse(&self, data: &[u8]) -> Result<Value, ReadError> {
        let decoded = self.decode(data)?;
        if decoded.consumed != data.len() {
            return Err(ReadError::TrailingBytes {
                consumed: decoded.consumed,
                len: data.len(),
            });
        }

        Ok(decoded.value)
    }
}

/// Compiles `root` into its struct declarations and decoder program.
pub fn compile(root: &FieldSchema) -> Result<(Vec<StructDeclaration>, DecoderProgram), CompileError> {
    let schema = Schema::compile(root)?;
    Ok((schema.structs, schema.program))
}

fn build_program(name: &str, node: &Node) -> DecoderProgram {
    let mut root = expand_node(name.to_string(), node);

    match root.kind {
        ExpandedKind::Tuple => {
            annotate(&mut root.components);
            emit(&root.components, name, false)
        }
        ExpandedKind::DynamicArray if root.iterations == 0 => {
            annotate(&mut root.components);
            emit(&root.components, name, true)
        }
        _ => {
            let mut fields = vec![root];
            annotate(&mut fields);
            let mut program = emit(&fields, name, false);
            program.root = RootShape::Single;
            program
        }
    }
}
