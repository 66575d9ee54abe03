//! Decoder emission: turns annotated fields into a [DecoderProgram].
//!
//! Each scope keeps a [LayoutCursor]. Fixed leaves become word reads at a
//! static offset; before any dynamic or nested field the pending fixed run is
//! flushed into that operation's `skip`, and the nested scope starts from a
//! fresh cursor.

use std::slice;

use tracing::trace;

use crate::{
    bits,
    compiled::{
        Block, DecoderProgram, ElementKind, ElementRead, LengthPrefixedRead, NestedRead,
        NestedShape, Operation, Payload, RootShape, WordRead,
    },
    expand::{ExpandedField, ExpandedKind},
    layout::LayoutCursor,
    types::{LeafType, WORD_BITS},
};

/// Emits the decoder for a root scope.
///
/// With `root_is_dynamic_array`, `fields` is the element scope of a top-level
/// dynamic array and the whole scope is wrapped in a counted loop; the
/// program then decodes to that single array.
pub fn emit(fields: &[ExpandedField], root_name: &str, root_is_dynamic_array: bool) -> DecoderProgram {
    let (root, body) = if root_is_dynamic_array {
        let nested = NestedRead {
            name: root_name.to_string(),
            slot: 0,
            skip: 0,
            shape: NestedShape::DynamicArray,
            body: emit_scope(fields),
        };
        let body = Block {
            ops: vec![Operation::Nested(nested)],
            tail: 0,
        };
        (RootShape::Single, body)
    } else {
        (RootShape::Tuple, emit_scope(fields))
    };

    trace!(root = root_name, ops = body.op_count(), "emitted");

    DecoderProgram {
        root_name: root_name.to_string(),
        root,
        body,
    }
}

/// Emits one scope with a fresh cursor.
pub fn emit_scope(fields: &[ExpandedField]) -> Block {
    let mut cursor = LayoutCursor::default();

    let ops = fields
        .iter()
        .enumerate()
        .map(|(slot, field)| emit_field(field, slot, &mut cursor))
        .collect();

    Block {
        ops,
        tail: cursor.flush(),
    }
}

fn emit_field(field: &ExpandedField, slot: usize, cursor: &mut LayoutCursor) -> Operation {
    match field.kind {
        ExpandedKind::Leaf(LeafType::Primitive(ty)) => Operation::Primitive {
            ty,
            read: primitive_read(field, slot, cursor),
        },
        ExpandedKind::Leaf(LeafType::FixedBytes(_)) => Operation::FixedBytes {
            read: bytes_read(field, slot, cursor),
        },
        ExpandedKind::Leaf(LeafType::Bytes) => {
            length_prefixed(&field.name, Payload::Bytes).placed(slot, flush(field, cursor))
        }
        ExpandedKind::Leaf(LeafType::String) => {
            length_prefixed(&field.name, Payload::Text).placed(slot, flush(field, cursor))
        }
        ExpandedKind::Tuple => {
            let skip = flush(field, cursor);
            nested(&field.name, NestedShape::Tuple, emit_scope(&field.components)).placed(slot, skip)
        }
        ExpandedKind::FixedArray(n) => {
            let skip = flush(field, cursor);
            let body = emit_scope(&field.components);
            nested(&field.name, NestedShape::FixedArray(n), body).placed(slot, skip)
        }
        ExpandedKind::DynamicArray => {
            let skip = flush(field, cursor);
            dynamic_array(field).placed(slot, skip)
        }
    }
}

fn primitive_read(field: &ExpandedField, slot: usize, cursor: &mut LayoutCursor) -> WordRead {
    let bits = field.bit_size;
    // layout annotates every fixed primitive
    let position = field.shift.map_or(0, |shift| bits::position(shift, bits));

    if position != cursor.bit_offset_in_word {
        cursor.reload();
        trace!(field = %field.name, byte_offset = cursor.byte_offset, "reload");
    }
    debug_assert_eq!(position, cursor.bit_offset_in_word);

    let read = WordRead {
        name: field.name.clone(),
        slot,
        offset: cursor.byte_offset,
        shift: WORD_BITS - cursor.bit_offset_in_word - bits,
        bits,
    };
    cursor.advance(bits);
    read
}

/// Fixed byte strings are placed by size alone; the annotated shift does not
/// account for a word crossing.
fn bytes_read(field: &ExpandedField, slot: usize, cursor: &mut LayoutCursor) -> WordRead {
    let bits = field.bit_size;
    if !cursor.fits(bits) {
        cursor.reload();
        trace!(field = %field.name, byte_offset = cursor.byte_offset, "reload");
    }

    let read = WordRead {
        name: field.name.clone(),
        slot,
        offset: cursor.byte_offset,
        shift: cursor.bit_offset_in_word,
        bits,
    };
    cursor.advance(bits);
    read
}

/// Counted levels for a collapsed run of dynamic dimensions, outermost first.
fn dynamic_array(field: &ExpandedField) -> Operation {
    let levels = field.iterations;
    let name = |depth: usize| format!("{}{}", field.name, "[]".repeat(depth));

    let mut op = match field.components.first() {
        Some(element) => match element_read(element) {
            Some(read) => length_prefixed(&name(levels), Payload::Elements(read)),
            None => nested(
                &name(levels),
                NestedShape::DynamicArray,
                emit_scope(slice::from_ref(element)),
            ),
        },
        None => nested(&name(levels), NestedShape::DynamicArray, Block::default()),
    };

    for depth in (0..levels).rev() {
        let body = Block {
            ops: vec![op],
            tail: 0,
        };
        op = nested(&name(depth), NestedShape::DynamicArray, body);
    }

    op
}

/// Fixed-width leaf elements are read straight out of the payload.
fn element_read(element: &ExpandedField) -> Option<ElementRead> {
    let bits = element.bit_size;
    let (leaf, shift) = match element.kind {
        ExpandedKind::Leaf(LeafType::Primitive(ty)) => (ElementKind::Primitive(ty), WORD_BITS - bits),
        ExpandedKind::Leaf(LeafType::FixedBytes(n)) => (ElementKind::FixedBytes(n), 0),
        _ => return None,
    };

    Some(ElementRead {
        leaf,
        stride: usize::from(bits / 8),
        shift,
        bits,
    })
}

fn flush(field: &ExpandedField, cursor: &mut LayoutCursor) -> usize {
    let skip = cursor.flush();
    trace!(field = %field.name, skip, "flush");
    skip
}

fn length_prefixed(name: &str, payload: Payload) -> Operation {
    Operation::LengthPrefixed(LengthPrefixedRead {
        name: name.to_string(),
        slot: 0,
        skip: 0,
        payload,
    })
}

fn nested(name: &str, shape: NestedShape, body: Block) -> Operation {
    Operation::Nested(NestedRead {
        name: name.to_string(),
        slot: 0,
        skip: 0,
        shape,
        body,
    })
}

#[cfg(test)]
mod tests {
    use crate::{
        encode::encode,
        expand::expand,
        field::FieldSchema,
        layout::annotate,
        types::Primitive,
        value::Value,
    };

    use super::*;

    fn scope(fields: Vec<FieldSchema>) -> Block {
        let mut root = expand(&FieldSchema::tuple("root", fields)).unwrap();
        annotate(&mut root.components);
        emit_scope(&root.components)
    }

    /// Encodes `value` and runs the emitted program over it.
    fn decode(fields: Vec<FieldSchema>, value: &Value) -> Value {
        let schema = FieldSchema::tuple("root", fields);
        let data = encode(&schema, value).unwrap();
        let mut root = expand(&schema).unwrap();
        annotate(&mut root.components);
        let decoded = emit(&root.components, "root", false).execute(&data).unwrap();
        assert_eq!(decoded.consumed, data.len());
        decoded.value
    }

    fn word_read(op: &Operation) -> &WordRead {
        match op {
            Operation::Primitive { read, .. } | Operation::FixedBytes { read } => read,
            other => panic!("not a word read: {:?}", other),
        }
    }

    #[test]
    fn test_packed_primitives() {
        let block = scope(vec![
            FieldSchema::new("a", "bool"),
            FieldSchema::new("b", "bool"),
            FieldSchema::new("c", "uint16"),
        ]);
        let shifts: Vec<_> = block.ops.iter().map(|op| word_read(op).shift).collect();
        assert_eq!(shifts, vec![248, 240, 224]);
        assert!(block.ops.iter().all(|op| word_read(op).offset == 0));
        assert_eq!(block.tail, 4);
    }

    #[test]
    fn test_second_word_offset() {
        let block = scope((0..9).map(|i| FieldSchema::new(format!("f{}", i), "uint32")).collect());
        assert_eq!(word_read(&block.ops[7]).offset, 0);
        assert_eq!(word_read(&block.ops[7]).shift, 0);
        assert_eq!(word_read(&block.ops[8]).offset, 32);
        assert_eq!(word_read(&block.ops[8]).shift, 224);
        assert_eq!(block.tail, 36);
    }

    #[test]
    fn test_dynamic_field_flushes_run() {
        let block = scope(vec![
            FieldSchema::new("a", "uint64"),
            FieldSchema::new("b", "bytes"),
            FieldSchema::new("c", "uint8"),
        ]);
        match &block.ops[1] {
            Operation::LengthPrefixed(read) => {
                assert_eq!(read.skip, 8);
                assert_eq!(read.slot, 1);
                assert_eq!(read.payload, Payload::Bytes);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(word_read(&block.ops[2]).offset, 0);
        assert_eq!(word_read(&block.ops[2]).shift, 248);
        assert_eq!(block.tail, 1);
    }

    #[test]
    fn test_bytes_crossing_reloads() {
        let mut fields: Vec<_> = (0..31).map(|i| FieldSchema::new(format!("p{}", i), "uint8")).collect();
        fields.push(FieldSchema::new("tag", "bytes4"));
        fields.push(FieldSchema::new("after", "uint8"));
        let block = scope(fields);

        let tag = word_read(&block.ops[31]);
        assert_eq!(tag.offset, 31);
        assert_eq!(tag.shift, 0);

        let after = word_read(&block.ops[32]);
        assert_eq!(after.offset, 35);
        assert_eq!(after.shift, 248);
        assert_eq!(block.tail, 36);

        let fields: Vec<_> = (0..31)
            .map(|i| FieldSchema::new(format!("p{}", i), "uint8"))
            .chain([FieldSchema::new("tag", "bytes4"), FieldSchema::new("after", "uint8")])
            .collect();
        let mut values: Vec<_> = (0..31u128).map(Value::uint).collect();
        values.push(Value::FixedBytes(vec![0xde, 0xad, 0xbe, 0xef]));
        values.push(Value::uint(0x5a));
        let value = Value::Tuple(values);
        assert_eq!(decode(fields, &value), value);
    }

    #[test]
    fn test_leading_fixed_bytes() {
        let block = scope(vec![FieldSchema::new("tag", "bytes4"), FieldSchema::new("n", "uint16")]);
        let tag = word_read(&block.ops[0]);
        assert_eq!((tag.offset, tag.shift), (0, 0));
        assert_eq!(word_read(&block.ops[1]).shift, 256 - 32 - 16);

        let value = Value::Tuple(vec![Value::FixedBytes(vec![1, 2, 3, 4]), Value::uint(0x0506)]);
        let fields = vec![FieldSchema::new("tag", "bytes4"), FieldSchema::new("n", "uint16")];
        assert_eq!(decode(fields, &value), value);
    }

    #[test]
    fn test_dynamic_fixed_bytes_elements() {
        let block = scope(vec![FieldSchema::new("v", "bytes2[]")]);
        match &block.ops[0] {
            Operation::LengthPrefixed(read) => assert_eq!(
                read.payload,
                Payload::Elements(ElementRead {
                    leaf: ElementKind::FixedBytes(2),
                    stride: 2,
                    shift: 0,
                    bits: 16,
                })
            ),
            other => panic!("unexpected {:?}", other),
        }

        let value = Value::Tuple(vec![Value::Array(vec![
            Value::FixedBytes(vec![0xaa, 0xbb]),
            Value::FixedBytes(vec![0, 0]),
        ])]);
        assert_eq!(decode(vec![FieldSchema::new("v", "bytes2[]")], &value), value);
    }

    #[test]
    fn test_nested_tuple_scope() {
        let block = scope(vec![
            FieldSchema::new("a", "uint8"),
            FieldSchema::tuple("inner", vec![FieldSchema::new("x", "uint32")]),
            FieldSchema::new("z", "address"),
        ]);
        match &block.ops[1] {
            Operation::Nested(read) => {
                assert_eq!(read.skip, 1);
                assert_eq!(read.shape, NestedShape::Tuple);
                assert_eq!(read.body.tail, 4);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(word_read(&block.ops[2]).shift, 96);
        assert_eq!(block.tail, 20);
    }

    #[test]
    fn test_dynamic_leaf_array_reads_elements() {
        let block = scope(vec![FieldSchema::new("v", "uint16[]")]);
        match &block.ops[0] {
            Operation::LengthPrefixed(read) => assert_eq!(
                read.payload,
                Payload::Elements(ElementRead {
                    leaf: ElementKind::Primitive(Primitive::Uint(16)),
                    stride: 2,
                    shift: 240,
                    bits: 16,
                })
            ),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_collapsed_levels() {
        let block = scope(vec![FieldSchema::new("m", "uint8[][][]")]);
        let Operation::Nested(outer) = &block.ops[0] else {
            panic!("expected nested");
        };
        assert_eq!(outer.name, "m");
        assert_eq!(outer.shape, NestedShape::DynamicArray);
        let Operation::Nested(middle) = &outer.body.ops[0] else {
            panic!("expected nested");
        };
        assert_eq!(middle.name, "m[]");
        assert!(matches!(&middle.body.ops[0], Operation::LengthPrefixed(r) if r.name == "m[][]"));
        assert_eq!(block.op_count(), 3);
    }

    #[test]
    fn test_dynamic_root() {
        let mut root = expand(&FieldSchema::new("values", "uint32[3][]")).unwrap();
        annotate(&mut root.components);
        let program = emit(&root.components, "values", true);
        assert_eq!(program.root, RootShape::Single);
        let Operation::Nested(outer) = &program.body.ops[0] else {
            panic!("expected nested");
        };
        assert_eq!(outer.shape, NestedShape::DynamicArray);
        assert!(matches!(
            &outer.body.ops[0],
            Operation::Nested(inner) if inner.shape == NestedShape::FixedArray(3) && inner.body.tail == 12
        ));
    }
}
