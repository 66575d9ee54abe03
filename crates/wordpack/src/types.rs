//! Type tags: the parsed form of a schema field's type string.
//!
//! A type string is a base type followed by zero or more array suffixes written
//! innermost-first, so `uint16[2][]` is a dynamic array of `uint16[2]`.

use crate::errors::{CompileError, SchemaError, UnsupportedTypeError};

/// Width of the machine word every load operates on.
pub const WORD_BITS: u16 = 256;

/// Size of a length or count header on the wire.
pub const LENGTH_HEADER_BYTES: usize = 4;

/// Right shift that moves a header from the top of a loaded word to its low bits.
pub const LENGTH_HEADER_SHIFT: u16 = WORD_BITS - (LENGTH_HEADER_BYTES as u16) * 8;

/// Fixed-width scalar kinds. All of them are right-aligned inside a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Primitive {
    Uint(u16),
    Int(u16),
    Bool,
    Address,
    /// Fixed-point number carried as its raw scaled integer.
    Fixed { signed: bool, bits: u16, decimals: u8 },
}

impl Primitive {
    pub fn bit_size(&self) -> u16 {
        match self {
            Primitive::Uint(bits) | Primitive::Int(bits) => *bits,
            Primitive::Bool => 8,
            Primitive::Address => 160,
            Primitive::Fixed { bits, .. } => *bits,
        }
    }

    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            Primitive::Int(_) | Primitive::Fixed { signed: true, .. }
        )
    }
}

/// A schema leaf: anything that is not an array or a tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum LeafType {
    Primitive(Primitive),
    /// `bytes<N>`, left-aligned inside a word.
    FixedBytes(u8),
    /// Dynamic `bytes`.
    Bytes,
    /// Dynamic UTF-8 `string`.
    String,
}

impl LeafType {
    pub fn is_dynamic(&self) -> bool {
        matches!(self, LeafType::Bytes | LeafType::String)
    }

    /// Width in bits, 0 for dynamic leaves.
    pub fn bit_size(&self) -> u16 {
        match self {
            LeafType::Primitive(p) => p.bit_size(),
            LeafType::FixedBytes(n) => u16::from(*n) * 8,
            LeafType::Bytes | LeafType::String => 0,
        }
    }
}

/// Base of a type tag, before array suffixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseType {
    Leaf(LeafType),
    Tuple,
}

/// One array suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Dimension {
    Fixed(usize),
    Dynamic,
}

/// A parsed type string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeTag {
    pub base: BaseType,
    /// Array dimensions, innermost first (the order they are written in).
    pub dims: Vec<Dimension>,
}

impl TypeTag {
    /// Parses `ty`, attributing failures to `field`.
    pub fn parse(field: &str, ty: &str) -> Result<Self, CompileError> {
        let ty = ty.trim();
        let split = ty.find('[').unwrap_or(ty.len());
        let (base, suffix) = ty.split_at(split);

        let base = parse_base(base).ok_or_else(|| UnsupportedTypeError {
            field: field.to_string(),
            ty: ty.to_string(),
        })?;
        let dims = parse_dims(suffix).ok_or_else(|| SchemaError::InvalidDimension {
            field: field.to_string(),
            ty: ty.to_string(),
        })?;

        Ok(TypeTag { base, dims })
    }

    pub fn is_tuple(&self) -> bool {
        self.base == BaseType::Tuple
    }
}

/// Returns the array suffix of a raw type string (`"[2][]"` for `"tuple[2][]"`).
pub fn dims_suffix(ty: &str) -> &str {
    let ty = ty.trim();
    &ty[ty.find('[').unwrap_or(ty.len())..]
}

fn parse_base(base: &str) -> Option<BaseType> {
    let leaf = match base {
        "tuple" => return Some(BaseType::Tuple),
        "bool" => LeafType::Primitive(Primitive::Bool),
        "address" => LeafType::Primitive(Primitive::Address),
        "bytes" => LeafType::Bytes,
        "string" => LeafType::String,
        "uint" => LeafType::Primitive(Primitive::Uint(256)),
        "int" => LeafType::Primitive(Primitive::Int(256)),
        "fixed" | "ufixed" => LeafType::Primitive(Primitive::Fixed {
            signed: base == "fixed",
            bits: 128,
            decimals: 18,
        }),
        _ => {
            if let Some(n) = base.strip_prefix("bytes") {
                let n: u8 = parse_number(n)?;
                if !(1..=32).contains(&n) {
                    return None;
                }
                LeafType::FixedBytes(n)
            } else if let Some(bits) = base.strip_prefix("uint") {
                LeafType::Primitive(Primitive::Uint(parse_width(bits)?))
            } else if let Some(bits) = base.strip_prefix("int") {
                LeafType::Primitive(Primitive::Int(parse_width(bits)?))
            } else if let Some(rest) = base.strip_prefix("ufixed") {
                parse_fixed(rest, false)?
            } else if let Some(rest) = base.strip_prefix("fixed") {
                parse_fixed(rest, true)?
            } else {
                return None;
            }
        }
    };

    Some(BaseType::Leaf(leaf))
}

fn parse_fixed(rest: &str, signed: bool) -> Option<LeafType> {
    let (bits, decimals) = rest.split_once('x')?;
    let bits = parse_width(bits)?;
    let decimals: u8 = parse_number(decimals)?;
    if decimals > 80 {
        return None;
    }

    Some(LeafType::Primitive(Primitive::Fixed {
        signed,
        bits,
        decimals,
    }))
}

fn parse_width(bits: &str) -> Option<u16> {
    let bits: u16 = parse_number(bits)?;
    if bits == 0 || bits > WORD_BITS || bits % 8 != 0 {
        return None;
    }

    Some(bits)
}

/// Plain decimal without sign or leading zeros.
fn parse_number<T: std::str::FromStr>(s: &str) -> Option<T> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) || (s.len() > 1 && s.starts_with('0'))
    {
        return None;
    }

    s.parse().ok()
}

fn parse_dims(mut suffix: &str) -> Option<Vec<Dimension>> {
    let mut dims = Vec::new();

    while !suffix.is_empty() {
        let inner = suffix.strip_prefix('[')?;
        let close = inner.find(']')?;
        let size = &inner[..close];

        if size.is_empty() {
            dims.push(Dimension::Dynamic);
        } else {
            let n: usize = parse_number(size)?;
            if n == 0 {
                return None;
            }
            dims.push(Dimension::Fixed(n));
        }

        suffix = &inner[close + 1..];
    }

    Some(dims)
}
