//! Values packed by [crate::encode] and rebuilt by the decoder operations.

use std::fmt;

/// A 256-bit big-endian word, the unit every load operates on.
///
/// Signed integers are stored two's-complement and sign-extended to the full
/// width, so a decoded `int8` of `-1` compares equal to `Word::from_i128(-1)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Word(pub [u8; 32]);

impl Word {
    pub const ZERO: Word = Word([0; 32]);

    pub fn from_be_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() > 32 {
            return None;
        }

        let mut out = [0u8; 32];
        out[32 - bytes.len()..].copy_from_slice(bytes);
        Some(Word(out))
    }

    pub fn from_i128(value: i128) -> Self {
        let fill = if value < 0 { 0xff } else { 0 };
        let mut out = [fill; 32];
        out[16..].copy_from_slice(&value.to_be_bytes());
        Word(out)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns the value if it fits in 64 unsigned bits.
    pub fn to_u64(&self) -> Option<u64> {
        if self.0[..24].iter().any(|b| *b != 0) {
            return None;
        }

        let mut buf = [0u8; 8];
        buf.copy_from_slice(&self.0[24..]);
        Some(u64::from_be_bytes(buf))
    }

    /// Returns the value if it fits in 64 signed bits, reading the word as two's complement.
    pub fn to_i64(&self) -> Option<i64> {
        let negative = self.0[24] & 0x80 != 0;
        let fill = if negative { 0xff } else { 0 };
        if self.0[..24].iter().any(|b| *b != fill) {
            return None;
        }

        let mut buf = [0u8; 8];
        buf.copy_from_slice(&self.0[24..]);
        Some(i64::from_be_bytes(buf))
    }

    /// True if the word is representable in `bits` unsigned bits.
    pub fn fits_unsigned(&self, bits: u16) -> bool {
        *self == crate::bits::mask_low(self, bits)
    }

    /// True if the word is the sign extension of its low `bits` bits.
    pub fn fits_signed(&self, bits: u16) -> bool {
        *self == crate::bits::sign_extend(&crate::bits::mask_low(self, bits), bits)
    }
}

impl From<u64> for Word {
    fn from(value: u64) -> Self {
        Word::from(u128::from(value))
    }
}

impl From<u128> for Word {
    fn from(value: u128) -> Self {
        let mut out = [0u8; 32];
        out[16..].copy_from_slice(&value.to_be_bytes());
        Word(out)
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        let start = self.0.iter().position(|b| *b != 0).unwrap_or(31);
        for b in &self.0[start..] {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

/// A value tree whose shape follows a schema: one variant per leaf kind, nested
/// arrays and tuples as nested lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// `uint<N>` and `ufixed<M>x<N>` (raw scaled integer).
    Uint(Word),
    /// `int<N>` and `fixed<M>x<N>` (raw scaled integer), sign-extended.
    Int(Word),
    Bool(bool),
    Address([u8; 20]),
    FixedBytes(Vec<u8>),
    Bytes(Vec<u8>),
    String(String),
    Array(Vec<Value>),
    Tuple(Vec<Value>),
}

impl Value {
    pub fn uint(value: u128) -> Self {
        Value::Uint(Word::from(value))
    }

    pub fn int(value: i128) -> Self {
        Value::Int(Word::from_i128(value))
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Uint(_) => "uint",
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::Address(_) => "address",
            Value::FixedBytes(_) => "fixed bytes",
            Value::Bytes(_) => "bytes",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Tuple(_) => "tuple",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_from_u64() {
        let w = Word::from(0x0102u64);
        assert_eq!(w.0[30], 0x01);
        assert_eq!(w.0[31], 0x02);
        assert_eq!(w.to_u64(), Some(0x0102));
    }

    #[test]
    fn test_word_from_negative() {
        let w = Word::from_i128(-2);
        assert!(w.0[..31].iter().all(|b| *b == 0xff));
        assert_eq!(w.0[31], 0xfe);
        assert_eq!(w.to_i64(), Some(-2));
        assert_eq!(w.to_u64(), None);
    }

    #[test]
    fn test_fits() {
        assert!(Word::from(255u64).fits_unsigned(8));
        assert!(!Word::from(256u64).fits_unsigned(8));
        assert!(Word::from_i128(-128).fits_signed(8));
        assert!(!Word::from_i128(-129).fits_signed(8));
        assert!(Word::from_i128(127).fits_signed(8));
        assert!(!Word::from_i128(128).fits_signed(8));
    }

    #[test]
    fn test_from_be_slice() {
        let w = Word::from_be_slice(&[0xaa, 0xbb]).unwrap();
        assert_eq!(w, Word::from(0xaabbu64));
        assert!(Word::from_be_slice(&[0u8; 33]).is_none());
    }

    #[test]
    fn test_debug_hex() {
        assert_eq!(format!("{:?}", Word::from(0x1fu64)), "0x1f");
        assert_eq!(format!("{:?}", Word::ZERO), "0x00");
    }
}
