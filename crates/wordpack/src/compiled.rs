//! Decoder operations produced by [crate::emit] and a reference interpreter for them.
//!
//! The runtime model is one byte cursor into the packed input. Every static
//! offset is relative to the cursor at the time the operation runs; operations
//! that cross a dynamic boundary first move the cursor by their `skip`, and each
//! [Block] moves it by its `tail` once its operations have run.

use tracing::trace;

use crate::{
    bits::{extract_left, extract_right, load_word, sign_extend},
    errors::ReadError,
    types::{LENGTH_HEADER_BYTES, LENGTH_HEADER_SHIFT, Primitive, WORD_BITS},
    value::{Value, Word},
};

/// How the values produced by the top-level block form the decoded root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum RootShape {
    /// The root is a tuple of the top-level values.
    Tuple,
    /// The root is the single top-level value.
    Single,
}

/// A compiled decoder: the full operation tree for one schema.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DecoderProgram {
    pub root_name: String,
    pub root: RootShape,
    pub body: Block,
}

/// Operations of one scope, followed by a cursor advance over its final fixed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Block {
    pub ops: Vec<Operation>,
    pub tail: usize,
}

impl Block {
    /// Number of operations in this block and all nested blocks.
    pub fn op_count(&self) -> usize {
        self.ops
            .iter()
            .map(|op| match op {
                Operation::Nested(nested) => 1 + nested.body.op_count(),
                _ => 1,
            })
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(tag = "op"))]
pub enum Operation {
    /// Right-aligned scalar: shift the loaded word right, keep the low bits.
    Primitive { ty: Primitive, read: WordRead },
    /// Left-aligned byte string: shift the loaded word left, keep the high bits.
    FixedBytes { read: WordRead },
    /// Header, then a payload copied or read element by element.
    LengthPrefixed(LengthPrefixedRead),
    /// A nested scope: tuple, unrolled fixed array, or counted loop.
    Nested(NestedRead),
}

impl Operation {
    /// Sets the output slot and the cursor advance of a cursor-moving operation.
    pub(crate) fn placed(mut self, slot: usize, skip: usize) -> Self {
        match &mut self {
            Operation::LengthPrefixed(read) => {
                read.slot = slot;
                read.skip = skip;
            }
            Operation::Nested(read) => {
                read.slot = slot;
                read.skip = skip;
            }
            Operation::Primitive { read, .. } | Operation::FixedBytes { read } => read.slot = slot,
        }
        self
    }
}

/// One load-shift-mask-store.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct WordRead {
    pub name: String,
    /// Output slot in the enclosing aggregate.
    pub slot: usize,
    /// Byte offset of the loaded word from the cursor.
    pub offset: usize,
    /// Right shift for a primitive; for a byte string, the left shift that
    /// brings it to the top of the word.
    pub shift: u16,
    pub bits: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LengthPrefixedRead {
    pub name: String,
    pub slot: usize,
    /// Bytes of the preceding fixed run to step over before the header.
    pub skip: usize,
    pub payload: Payload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Payload {
    /// Raw bytes, copied one word at a time.
    Bytes,
    /// UTF-8 text, copied one word at a time.
    Text,
    /// Fixed-width elements, one word read per element.
    Elements(ElementRead),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ElementKind {
    Primitive(Primitive),
    FixedBytes(u8),
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ElementRead {
    pub leaf: ElementKind,
    /// Bytes between consecutive elements.
    pub stride: usize,
    /// Same convention as [WordRead::shift].
    pub shift: u16,
    pub bits: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum NestedShape {
    /// Run the body once; its values form a tuple.
    Tuple,
    /// Run the body once; its values are the array's elements.
    FixedArray(usize),
    /// Read a count header, then run the body once per element.
    DynamicArray,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NestedRead {
    pub name: String,
    pub slot: usize,
    pub skip: usize,
    pub shape: NestedShape,
    pub body: Block,
}

/// Result of running a [DecoderProgram] over an input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub value: Value,
    /// Bytes consumed from the start of the input.
    pub consumed: usize,
}

impl DecoderProgram {
    /// Replays the operations over `data`.
    ///
    /// Bytes past the end of the decoded value are left untouched; compare
    /// [Decoded::consumed] with the input length to reject trailing data.
    pub fn execute(&self, data: &[u8]) -> Result<Decoded, ReadError> {
        let mut machine = Machine { data, cursor: 0 };
        let mut values = machine.run(&self.body)?;

        let value = match self.root {
            RootShape::Single if values.len() == 1 => values.remove(0),
            _ => Value::Tuple(values),
        };

        Ok(Decoded {
            value,
            consumed: machine.cursor,
        })
    }
}

struct Machine<'a> {
    data: &'a [u8],
    cursor: usize,
}

impl Machine<'_> {
    fn run(&mut self, block: &Block) -> Result<Vec<Value>, ReadError> {
        let mut values = Vec::with_capacity(block.ops.len());
        for op in &block.ops {
            values.push(self.step(op)?);
        }

        self.advance(block.tail)?;
        Ok(values)
    }

    fn step(&mut self, op: &Operation) -> Result<Value, ReadError> {
        match op {
            Operation::Primitive { ty, read } => {
                let field = self.read_right(read.offset, read.shift, read.bits)?;
                Ok(primitive_value(*ty, &field))
            }
            Operation::FixedBytes { read } => {
                let field = self.read_left(read.offset, read.shift, read.bits)?;
                Ok(Value::FixedBytes(field.0[..usize::from(read.bits / 8)].to_vec()))
            }
            Operation::LengthPrefixed(read) => {
                self.advance(read.skip)?;
                let count = self.header()?;
                trace!(field = %read.name, count, cursor = self.cursor, "length-prefixed");
                self.payload(&read.name, &read.payload, count)
            }
            Operation::Nested(read) => {
                self.advance(read.skip)?;
                match read.shape {
                    NestedShape::Tuple => Ok(Value::Tuple(self.run(&read.body)?)),
                    NestedShape::FixedArray(_) => Ok(Value::Array(self.run(&read.body)?)),
                    NestedShape::DynamicArray => {
                        let count = self.header()?;
                        // every element occupies at least one byte
                        if count > self.remaining() {
                            return Err(ReadError::LengthOverflow {
                                field: read.name.clone(),
                                count,
                            });
                        }
                        trace!(field = %read.name, count, cursor = self.cursor, "counted loop");

                        let mut elements = Vec::with_capacity(count);
                        for _ in 0..count {
                            elements.extend(self.run(&read.body)?);
                        }
                        Ok(Value::Array(elements))
                    }
                }
            }
        }
    }

    fn payload(&mut self, name: &str, payload: &Payload, count: usize) -> Result<Value, ReadError> {
        let size = match payload {
            Payload::Bytes | Payload::Text => Some(count),
            Payload::Elements(element) => count.checked_mul(element.stride),
        };
        let size = match size {
            Some(size) if size <= self.remaining() => size,
            _ => {
                return Err(ReadError::LengthOverflow {
                    field: name.to_string(),
                    count,
                });
            }
        };

        let value = match payload {
            Payload::Bytes => Value::Bytes(self.copy(size)),
            Payload::Text => Value::String(String::from_utf8(self.copy(size)).map_err(|_| {
                ReadError::InvalidUtf8 {
                    field: name.to_string(),
                }
            })?),
            Payload::Elements(element) => {
                let mut values = Vec::with_capacity(count);
                for i in 0..count {
                    let offset = i * element.stride;
                    values.push(match element.leaf {
                        ElementKind::Primitive(ty) => {
                            primitive_value(ty, &self.read_right(offset, element.shift, element.bits)?)
                        }
                        ElementKind::FixedBytes(n) => {
                            let field = self.read_left(offset, element.shift, element.bits)?;
                            Value::FixedBytes(field.0[..usize::from(n)].to_vec())
                        }
                    });
                }
                Value::Array(values)
            }
        };

        self.advance(size)?;
        Ok(value)
    }

    /// Copies `len` bytes at the cursor one word at a time.
    fn copy(&self, len: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(len);
        while out.len() < len {
            let word = load_word(self.data, self.cursor + out.len());
            let n = (len - out.len()).min(32);
            out.extend_from_slice(&word.0[..n]);
        }
        out
    }

    fn header(&mut self) -> Result<usize, ReadError> {
        let field = self.read_right(0, LENGTH_HEADER_SHIFT, (LENGTH_HEADER_BYTES * 8) as u16)?;
        let mut buf = [0u8; LENGTH_HEADER_BYTES];
        buf.copy_from_slice(&field.0[32 - LENGTH_HEADER_BYTES..]);
        self.advance(LENGTH_HEADER_BYTES)?;
        Ok(u32::from_be_bytes(buf) as usize)
    }

    /// Reads a field sitting `shift` bits above the low end of the word.
    fn read_right(&self, offset: usize, shift: u16, bits: u16) -> Result<Word, ReadError> {
        let word = self.load(offset, WORD_BITS.saturating_sub(shift).saturating_sub(bits), bits)?;
        Ok(extract_right(&word, shift, bits))
    }

    /// Reads a field starting `shift` bits below the top of the word.
    fn read_left(&self, offset: usize, shift: u16, bits: u16) -> Result<Word, ReadError> {
        let word = self.load(offset, shift, bits)?;
        Ok(extract_left(&word, shift, bits))
    }

    /// Loads the word at `offset` once the field's own bytes are known to be in bounds.
    fn load(&self, offset: usize, position: u16, bits: u16) -> Result<Word, ReadError> {
        let word_start = self.cursor + offset;
        let start = word_start + usize::from(position / 8);
        let len = usize::from(bits / 8);
        if start + len > self.data.len() {
            return Err(ReadError::OutOfBounds { offset: start, len });
        }

        Ok(load_word(self.data, word_start))
    }

    fn advance(&mut self, n: usize) -> Result<(), ReadError> {
        if n > self.remaining() {
            return Err(ReadError::OutOfBounds {
                offset: self.cursor,
                len: n,
            });
        }

        self.cursor += n;
        Ok(())
    }

    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.cursor)
    }
}

fn primitive_value(ty: Primitive, field: &Word) -> Value {
    match ty {
        Primitive::Bool => Value::Bool(*field != Word::ZERO),
        Primitive::Address => {
            let mut address = [0u8; 20];
            address.copy_from_slice(&field.0[12..]);
            Value::Address(address)
        }
        ty if ty.is_signed() => Value::Int(sign_extend(field, ty.bit_size())),
        _ => Value::Uint(*field),
    }
}
