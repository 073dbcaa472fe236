//! Constant tables and frame geometry for the TETRAPOL UHF downlink physical channel.
//!
//! Values are transcribed from PAS 0001-2 sections 6.1-6.2, following the
//! generation notes embedded as comments in the reference decoder.

/// Differentially-encoded frame synchronization sequence (PAS 0001-2 6.1.5.1 / 6.2.5.1).
pub const SYNC_PATTERN: [u8; 7] = [1, 0, 1, 0, 0, 1, 1];

/// Bytes preceding the 152-bit data payload in each raw frame.
pub const FRAME_HDR_LEN: usize = 8;
/// Payload length of a single physical frame, in unpacked bits.
pub const FRAME_DATA_LEN: usize = 152;
/// Total raw frame length (header + payload), in unpacked bits.
pub const FRAME_LEN: usize = FRAME_HDR_LEN + FRAME_DATA_LEN;

/// Maximum tolerated bit errors when comparing two consecutive sync sequences.
pub const MAX_FRAME_SYNC_ERR: u32 = 1;

/// Modulus applied to the running frame counter (PAS 0001-2 6.1.1).
pub const FRAME_NO_MOD: i32 = 200;
/// Sentinel meaning "frame number not yet known".
pub const FRAME_NO_UNKNOWN: i32 = -1;
/// Sentinel SCR value requesting blind scrambling-constant detection.
pub const SCR_DETECT: i32 = -1;
/// Default confidence threshold (percent) required before an SCR is locked.
pub const DEFAULT_SCR_CONFIDENCE: u32 = 50;

/// `data[0]` discriminant for an audio (voice) data-frame.
pub const FRAME_TYPE_AUDIO: u8 = 0;
/// `data[0]` discriminant for a data data-frame.
pub const FRAME_TYPE_DATA: u8 = 1;

/// Frame-number modulus selecting the random/paging channel instead of the
/// segmented-traffic state machine.
pub const RCH_MODULUS: i32 = 25;
/// Remainder identifying an RCH/PCH frame within [`RCH_MODULUS`].
pub const RCH_REMAINDER: i32 = 14;

/// Decoded data-frame payload length (channel-coded 152 bits halve to 76).
pub const DATA_FRAME_LEN: usize = 76;
/// Portion of the decoded data-frame covered by the CRC-5 check.
pub const CRC_INPUT_LEN: usize = 69;
/// Width of the CRC-5 appended to the data-frame payload.
pub const CRC5_LEN: usize = 5;

/// Number of candidate scrambling constants scanned during blind detection.
pub const SCR_CANDIDATES: usize = 128;

/// Width of one multiblock segment after bit-reordering, in packed bytes.
pub const SEGMENT_LEN: usize = 8;
/// Maximum number of segments the assembler can hold before a TPDU hand-off
/// (mirrors the reference's `buf[8*8*9]`, i.e. headroom for 9 segments).
pub const MAX_SEGMENTS: usize = 9;

/// Scrambling sequence, generated the same way the reference implementation
/// documents it: an LFSR seeded with seven 1s, `s_k = s_{k-1} ^ s_{k-7}`.
pub const SCRAMB_TABLE: [u8; 127] = generate_scramb_table();

const fn generate_scramb_table() -> [u8; 127] {
    let mut s = [0u8; 127];
    let mut i = 0;
    while i < 7 {
        s[i] = 1;
        i += 1;
    }
    let mut k = 7;
    while k < 127 {
        s[k] = s[k - 1] ^ s[k - 7];
        k += 1;
    }
    s
}

/// Bit indices that receive a differential-precoding factor of 2 instead of 1
/// (PAS 0001-2 6.1.4.2 / 6.2.4.2).
const PRECOD_DOUBLE_INDICES: [usize; 47] = [
    7, 10, 13, 16, 19, 22, 25, 28, 31, 34, 37, 40, 43, 46, 49, 52, 55, 58, 61, 64, 67, 70, 73, 76,
    83, 86, 89, 92, 95, 98, 101, 104, 107, 110, 113, 116, 119, 122, 125, 128, 131, 134, 137, 140,
    143, 146, 149,
];

/// Differential precoding step table: `1` or `2` positions back, per output bit.
pub const DIFF_PRECOD_UHF: [u8; FRAME_DATA_LEN] = generate_diff_precod();

const fn generate_diff_precod() -> [u8; FRAME_DATA_LEN] {
    let mut table = [1u8; FRAME_DATA_LEN];
    let mut i = 0;
    while i < PRECOD_DOUBLE_INDICES.len() {
        table[PRECOD_DOUBLE_INDICES[i]] = 2;
        i += 1;
    }
    table
}

/// Deinterleaving permutation for data frames (PAS 0001-2 6.2.4.1).
///
/// `deinterleaved[j] = interleaved[INTERLEAVE_DATA_UHF[j]]`.
#[rustfmt::skip]
pub const INTERLEAVE_DATA_UHF: [usize; FRAME_DATA_LEN] = [
    1, 77, 38, 114, 20, 96, 59, 135,
    3, 79, 41, 117, 23, 99, 62, 138,
    5, 81, 44, 120, 26, 102, 65, 141,
    8, 84, 47, 123, 29, 105, 68, 144,
    11, 87, 50, 126, 32, 108, 71, 147,
    14, 90, 53, 129, 35, 111, 74, 150,
    17, 93, 56, 132, 37, 112, 76, 148,
    2, 88, 40, 115, 19, 97, 58, 133,
    4, 75, 43, 118, 22, 100, 61, 136,
    7, 85, 46, 121, 25, 103, 64, 139,
    10, 82, 49, 124, 28, 106, 67, 142,
    13, 91, 52, 127, 31, 109, 73, 145,
    16, 94, 55, 130, 34, 113, 70, 151,
    0, 80, 39, 116, 21, 95, 57, 134,
    6, 78, 42, 119, 24, 98, 60, 137,
    9, 83, 45, 122, 27, 101, 63, 140,
    12, 86, 48, 125, 30, 104, 66, 143,
    15, 89, 51, 128, 33, 107, 69, 146,
    18, 92, 54, 131, 36, 110, 72, 149,
];
