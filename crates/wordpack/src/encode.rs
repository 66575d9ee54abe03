//! Packed encoder: the canonical wire form decoder operations consume.
//!
//! Fixed leaves are written back to back at their exact width with no padding:
//! primitives big-endian, byte strings raw. Dynamic byte strings, text and
//! dynamic array dimensions carry a 4-byte big-endian length or count header.
//! Every supported width is a whole number of bytes, so the bitstream is byte
//! aligned at every field boundary.

use crate::{
    errors::EncodeError,
    field::{FieldSchema, Node},
    types::{Dimension, LeafType, Primitive},
    value::Value,
};

/// Encodes `value` against `schema`.
pub fn encode(schema: &FieldSchema, value: &Value) -> Result<Vec<u8>, EncodeError> {
    let node = schema.resolve()?;
    encode_node(&schema.name, &node, value)
}

/// Encodes `value` against an already resolved node.
pub fn encode_node(name: &str, node: &Node, value: &Value) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    write_node(name, node, value, &mut out)?;
    Ok(out)
}

fn write_node(path: &str, node: &Node, value: &Value, out: &mut Vec<u8>) -> Result<(), EncodeError> {
    match node {
        Node::Leaf(leaf) => write_leaf(path, leaf, value, out),
        Node::Tuple(components) => {
            let Value::Tuple(values) = value else {
                return Err(mismatch(path, "tuple", value));
            };
            if values.len() != components.len() {
                return Err(EncodeError::LengthMismatch {
                    field: path.to_string(),
                    expected: components.len(),
                    actual: values.len(),
                });
            }

            for (component, value) in components.iter().zip(values) {
                let path = format!("{}.{}", path, component.name);
                write_node(&path, &component.node, value, out)?;
            }

            Ok(())
        }
        Node::Array { .. } => {
            let Value::Array(values) = value else {
                return Err(mismatch(path, "array", value));
            };
            let Some((outer, inner)) = node.split_outer() else {
                return Err(mismatch(path, "array", value));
            };

            match outer {
                Dimension::Fixed(n) if values.len() != n => {
                    return Err(EncodeError::LengthMismatch {
                        field: path.to_string(),
                        expected: n,
                        actual: values.len(),
                    });
                }
                Dimension::Fixed(_) => {}
                Dimension::Dynamic => write_header(path, values.len(), out)?,
            }

            for (i, value) in values.iter().enumerate() {
                write_node(&format!("{}[{}]", path, i), &inner, value, out)?;
            }

            Ok(())
        }
    }
}

fn write_leaf(path: &str, leaf: &LeafType, value: &Value, out: &mut Vec<u8>) -> Result<(), EncodeError> {
    match (leaf, value) {
        (LeafType::Primitive(Primitive::Bool), Value::Bool(b)) => out.push(u8::from(*b)),
        (LeafType::Primitive(Primitive::Address), Value::Address(addr)) => out.extend_from_slice(addr),
        (LeafType::Primitive(p), Value::Uint(word)) if !p.is_signed() && has_integer_repr(p) => {
            let bits = p.bit_size();
            if !word.fits_unsigned(bits) {
                return Err(EncodeError::ValueOutOfRange {
                    field: path.to_string(),
                    bits,
                });
            }
            out.extend_from_slice(&word.as_bytes()[32 - usize::from(bits / 8)..]);
        }
        (LeafType::Primitive(p), Value::Int(word)) if p.is_signed() => {
            let bits = p.bit_size();
            if !word.fits_signed(bits) {
                return Err(EncodeError::ValueOutOfRange {
                    field: path.to_string(),
                    bits,
                });
            }
            out.extend_from_slice(&word.as_bytes()[32 - usize::from(bits / 8)..]);
        }
        (LeafType::FixedBytes(n), Value::FixedBytes(bytes)) => {
            if bytes.len() != usize::from(*n) {
                return Err(EncodeError::LengthMismatch {
                    field: path.to_string(),
                    expected: usize::from(*n),
                    actual: bytes.len(),
                });
            }
            out.extend_from_slice(bytes);
        }
        (LeafType::Bytes, Value::Bytes(bytes)) => {
            write_header(path, bytes.len(), out)?;
            out.extend_from_slice(bytes);
        }
        (LeafType::String, Value::String(text)) => {
            write_header(path, text.len(), out)?;
            out.extend_from_slice(text.as_bytes());
        }
        (leaf, value) => return Err(mismatch(path, expected_kind(leaf), value)),
    }

    Ok(())
}

fn has_integer_repr(p: &Primitive) -> bool {
    matches!(p, Primitive::Uint(_) | Primitive::Fixed { .. })
}

fn write_header(path: &str, len: usize, out: &mut Vec<u8>) -> Result<(), EncodeError> {
    let len32 = u32::try_from(len).map_err(|_| EncodeError::TooLong {
        field: path.to_string(),
        len,
    })?;
    out.extend_from_slice(&len32.to_be_bytes());
    Ok(())
}

fn expected_kind(leaf: &LeafType) -> &'static str {
    match leaf {
        LeafType::Primitive(Primitive::Bool) => "bool",
        LeafType::Primitive(Primitive::Address) => "address",
        LeafType::Primitive(p) if p.is_signed() => "int",
        LeafType::Primitive(_) => "uint",
        LeafType::FixedBytes(_) => "fixed bytes",
        LeafType::Bytes => "bytes",
        LeafType::String => "string",
    }
}

fn mismatch(path: &str, expected: &'static str, found: &Value) -> EncodeError {
    EncodeError::TypeMismatch {
        field: path.to_string(),
        expected,
        found: found.kind(),
    }
}
