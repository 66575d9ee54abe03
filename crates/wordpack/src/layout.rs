//! Layout pass: assigns each fixed leaf its shift inside a 256-bit word.
//!
//! Primitives are right-aligned (`shift = WORD_BITS - prev - bits`), fixed byte
//! strings left-aligned (`shift = -prev`). The running width `prev` restarts at
//! zero in every nested scope, after every nested scope, and at every dynamic
//! field.

use tracing::trace;

use crate::{
    expand::{ExpandedField, ExpandedKind},
    types::{LeafType, WORD_BITS},
};

/// Annotates one scope of fields in place and recurses into nested scopes.
pub fn annotate(fields: &mut [ExpandedField]) {
    let mut prev_size_sum: u16 = 0;

    for field in fields.iter_mut() {
        match field.kind {
            ExpandedKind::Leaf(leaf) if leaf.is_dynamic() => {
                prev_size_sum = 0;
                field.is_dynamic = true;
                field.shift = None;
            }
            ExpandedKind::Leaf(LeafType::FixedBytes(_)) => {
                // Crossing is caught at emission time by size comparison.
                field.shift = Some(-i32::from(prev_size_sum));
                prev_size_sum = prev_size_sum.saturating_add(field.bit_size);
            }
            ExpandedKind::Leaf(_) => {
                if prev_size_sum.saturating_add(field.bit_size) > WORD_BITS {
                    prev_size_sum = 0;
                }
                field.shift = Some(i32::from(WORD_BITS - prev_size_sum - field.bit_size));
                prev_size_sum += field.bit_size;
            }
            ExpandedKind::Tuple | ExpandedKind::FixedArray(_) | ExpandedKind::DynamicArray => {
                annotate(&mut field.components);
                prev_size_sum = 0;
            }
        }

        trace!(field = %field.name, shift = ?field.shift, prev_size_sum, "layout");
    }
}

/// Per-scope compile-time cursor used by the decoder emitter.
///
/// `byte_offset` is where the currently loaded word starts, relative to the
/// runtime cursor at scope entry (or at the last flush).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutCursor {
    pub byte_offset: usize,
    pub bit_offset_in_word: u16,
    pub pending_fixed_bits: usize,
}

impl LayoutCursor {
    /// Moves the word window to the first unassigned byte.
    pub fn reload(&mut self) {
        self.byte_offset += usize::from(self.bit_offset_in_word / 8);
        self.bit_offset_in_word = 0;
    }

    /// Whether `bits` more bits fit in the current word.
    pub fn fits(&self, bits: u16) -> bool {
        self.bit_offset_in_word + bits <= WORD_BITS
    }

    pub fn advance(&mut self, bits: u16) {
        self.bit_offset_in_word += bits;
        self.pending_fixed_bits += usize::from(bits);
    }

    /// Ends the current fixed run, returning the bytes it occupied.
    pub fn flush(&mut self) -> usize {
        let bytes = self.pending_fixed_bits / 8;
        *self = LayoutCursor::default();
        bytes
    }
}

#[cfg(test)]
mod tests {
    use crate::{expand::expand, field::FieldSchema};

    use super::*;

    fn annotated(fields: Vec<FieldSchema>) -> Vec<ExpandedField> {
        let mut root = expand(&FieldSchema::tuple("root", fields)).unwrap();
        annotate(&mut root.components);
        root.components
    }

    #[test]
    fn test_right_aligned_shifts() {
        let fields = annotated(vec![
            FieldSchema::new("a", "bool"),
            FieldSchema::new("b", "bool"),
            FieldSchema::new("c", "uint16"),
        ]);
        let shifts: Vec<_> = fields.iter().map(|f| f.shift).collect();
        assert_eq!(shifts, vec![Some(248), Some(240), Some(224)]);
    }

    #[test]
    fn test_word_boundary_reset() {
        let fields = annotated((0..9).map(|i| FieldSchema::new(format!("f{}", i), "uint32")).collect());
        for (i, field) in fields.iter().take(8).enumerate() {
            assert_eq!(field.shift, Some(224 - 32 * i as i32));
        }
        assert_eq!(fields[7].shift, Some(0));
        assert_eq!(fields[8].shift, Some(224));
    }

    #[test]
    fn test_left_aligned_bytes() {
        let fields = annotated(vec![
            FieldSchema::new("a", "uint8"),
            FieldSchema::new("b", "bytes4"),
            FieldSchema::new("c", "uint8"),
        ]);
        assert_eq!(fields[1].shift, Some(-8));
        assert_eq!(fields[2].shift, Some(256 - 40 - 8));
    }

    #[test]
    fn test_dynamic_resets() {
        let fields = annotated(vec![
            FieldSchema::new("a", "uint64"),
            FieldSchema::new("b", "bytes"),
            FieldSchema::new("c", "uint64"),
        ]);
        assert_eq!(fields[1].shift, None);
        assert!(fields[1].is_dynamic);
        assert_eq!(fields[2].shift, Some(192));
    }

    #[test]
    fn test_nested_scope_restarts() {
        let fields = annotated(vec![
            FieldSchema::new("a", "uint128"),
            FieldSchema::tuple(
                "inner",
                vec![FieldSchema::new("x", "uint32"), FieldSchema::new("y", "bool")],
            ),
            FieldSchema::new("z", "address"),
        ]);
        assert_eq!(fields[1].components[0].shift, Some(224));
        assert_eq!(fields[1].components[1].shift, Some(216));
        assert_eq!(fields[2].shift, Some(96));
    }

    #[test]
    fn test_cursor_flush() {
        let mut cursor = LayoutCursor::default();
        cursor.advance(200);
        assert!(!cursor.fits(64));
        cursor.reload();
        assert_eq!(cursor.byte_offset, 25);
        cursor.advance(64);
        assert_eq!(cursor.flush(), 33);
        assert_eq!(cursor, LayoutCursor::default());
    }
}
