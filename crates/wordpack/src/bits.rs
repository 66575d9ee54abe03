//! Word-level load, shift and mask utilities.
//!
//! Bits are numbered from the least significant end of a big-endian [Word]:
//! bit 0 is the low bit of byte 31.

use crate::{types::WORD_BITS, value::Word};

/// Loads the 32 bytes starting at `offset`. Bytes past the end of `data` read as zero.
pub fn load_word(data: &[u8], offset: usize) -> Word {
    let mut out = [0u8; 32];
    if offset < data.len() {
        let end = (offset + 32).min(data.len());
        out[..end - offset].copy_from_slice(&data[offset..end]);
    }

    Word(out)
}

/// Logical right shift.
pub fn shr(word: &Word, n: usize) -> Word {
    if n >= 256 {
        return Word::ZERO;
    }

    let bytes = n / 8;
    let bits = n % 8;
    let src = &word.0;
    let mut out = [0u8; 32];

    for i in bytes..32 {
        let j = i - bytes;
        let mut b = src[j] >> bits;
        if bits > 0 && j > 0 {
            b |= src[j - 1] << (8 - bits);
        }
        out[i] = b;
    }

    Word(out)
}

/// Logical left shift.
pub fn shl(word: &Word, n: usize) -> Word {
    if n >= 256 {
        return Word::ZERO;
    }

    let bytes = n / 8;
    let bits = n % 8;
    let src = &word.0;
    let mut out = [0u8; 32];

    for i in 0..32 - bytes {
        let j = i + bytes;
        let mut b = src[j] << bits;
        if bits > 0 && j + 1 < 32 {
            b |= src[j + 1] >> (8 - bits);
        }
        out[i] = b;
    }

    Word(out)
}

/// Keeps the low `bits` bits.
pub fn mask_low(word: &Word, bits: u16) -> Word {
    let bits = usize::from(bits.min(256));
    let mut out = word.0;
    let full = bits / 8;
    let partial = bits % 8;

    for (i, b) in out.iter_mut().enumerate() {
        let from_end = 31 - i;
        if from_end < full {
            continue;
        } else if from_end == full && partial > 0 {
            *b &= (1u8 << partial) - 1;
        } else {
            *b = 0;
        }
    }

    Word(out)
}

/// Keeps the high `bits` bits.
pub fn mask_high(word: &Word, bits: u16) -> Word {
    let bits = usize::from(bits.min(256));
    let mut out = word.0;
    let full = bits / 8;
    let partial = bits % 8;

    for (i, b) in out.iter_mut().enumerate() {
        if i < full {
            continue;
        } else if i == full && partial > 0 {
            *b &= !(0xffu8 >> partial);
        } else {
            *b = 0;
        }
    }

    Word(out)
}

/// Sign-extends the low `bits` bits of `word` to the full 256 bits.
pub fn sign_extend(word: &Word, bits: u16) -> Word {
    if bits == 0 || bits >= 256 {
        return *word;
    }

    let top = usize::from(bits - 1);
    let negative = word.0[31 - top / 8] >> (top % 8) & 1 == 1;
    if !negative {
        return mask_low(word, bits);
    }

    let low = mask_low(word, bits);
    let high = shl(&Word([0xff; 32]), usize::from(bits));
    let mut out = [0u8; 32];
    for (i, b) in out.iter_mut().enumerate() {
        *b = low.0[i] | high.0[i];
    }

    Word(out)
}

/// Extracts a right-aligned field: shift it down by `shift`, keep `bits` low bits.
pub fn extract_right(word: &Word, shift: u16, bits: u16) -> Word {
    mask_low(&shr(word, usize::from(shift)), bits)
}

/// Extracts a left-aligned field starting `offset` bits below the top of the
/// word: shift it up to the top, keep `bits` high bits.
pub fn extract_left(word: &Word, offset: u16, bits: u16) -> Word {
    mask_high(&shl(word, usize::from(offset)), bits)
}

/// Bit position, counted from the top of the word, of a right-aligned field
/// with this layout shift.
pub fn position(shift: i32, bits: u16) -> u16 {
    let position = i32::from(WORD_BITS) - shift - i32::from(bits);
    position.clamp(0, i32::from(WORD_BITS)) as u16
}
