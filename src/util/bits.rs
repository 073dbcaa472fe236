//! Bit packing and reordering helpers.
//!
//! The framer and frame decoder work with "unpacked" bits: one 0/1 value per
//! byte. The multiblock assembler packs those bits MSB-first into real bytes
//! only at the point where a segment is handed off to a TPDU consumer.

/// Reorder a 64-bit unpacked segment: `out[8*i + j] = seg[i*8 + 7 - j]`.
///
/// This undoes the byte-reversal the transmitter applies per 8-bit group
/// before a segment is packed (PAS 0001-2 6.2, multiblock assembly).
pub fn reorder_segment(seg: &[u8; 64]) -> [u8; 64] {
    let mut out = [0u8; 64];
    for i in 0..8 {
        for j in 0..8 {
            out[8 * i + j] = seg[i * 8 + 7 - j];
        }
    }
    out
}

/// Pack unpacked bits (values 0/1) into bytes, MSB-first within each byte.
///
/// Trailing bits that don't fill a whole byte are zero-padded on the right,
/// matching a C byte-stream wire format.
pub fn pack_bits_msb(bits: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bits.len().div_ceil(8));
    for chunk in bits.chunks(8) {
        let mut byte = 0u8;
        for (i, &bit) in chunk.iter().enumerate() {
            if bit != 0 {
                byte |= 1 << (7 - i);
            }
        }
        out.push(byte);
    }
    out
}

/// Unpack bytes into individual bits (MSB-first), one 0/1 value per output byte.
pub fn unpack_bits_msb(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        for i in (0..8).rev() {
            out.push((byte >> i) & 1);
        }
    }
    out
}
