//! Core data types shared by the framer, frame decoder and multiblock assembler.

use crate::tables::{DATA_FRAME_LEN, FRAME_DATA_LEN, FRAME_TYPE_AUDIO, FRAME_TYPE_DATA};

/// A single raw physical frame payload, already differentially decoded by the
/// framer but not yet descrambled, deinterleaved or channel-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Running frame counter, or [`crate::tables::FRAME_NO_UNKNOWN`].
    pub frame_no: i32,
    /// 152 unpacked bits (one bit per byte, values 0/1).
    pub data: [u8; FRAME_DATA_LEN],
}

impl Frame {
    pub fn new(frame_no: i32) -> Self {
        Self {
            frame_no,
            data: [0u8; FRAME_DATA_LEN],
        }
    }
}

/// A fully channel-decoded data-frame: 76 unpacked payload bits plus a
/// per-bit error flag from the dual-redundant channel decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFrame {
    pub frame_no: i32,
    pub data: [u8; DATA_FRAME_LEN],
    pub err: [u8; DATA_FRAME_LEN],
}

impl DataFrame {
    pub fn new(frame_no: i32) -> Self {
        Self {
            frame_no,
            data: [0u8; DATA_FRAME_LEN],
            err: [0u8; DATA_FRAME_LEN],
        }
    }

    /// `fn` segmentation counter carried in bits 1 and 2: `2*data[2] + data[1]`.
    pub fn fn_counter(&self) -> u8 {
        2 * self.data[2] + self.data[1]
    }

    /// Total channel-decode error count across all 76 decoded bits.
    pub fn error_count(&self) -> u32 {
        self.err.iter().map(|&e| e as u32).sum()
    }

    /// Anti-stealing bits carried at payload offsets 67/68.
    pub fn anti_stealing_bits(&self) -> (u8, u8) {
        (self.data[67], self.data[68])
    }

    pub fn logical_type(&self) -> Option<LogicalFrameType> {
        LogicalFrameType::from_discriminant(self.data[0])
    }
}

/// Discriminant carried in `data[0]` of a decoded data-frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalFrameType {
    Audio,
    Data,
}

impl LogicalFrameType {
    pub fn from_discriminant(value: u8) -> Option<Self> {
        match value {
            FRAME_TYPE_AUDIO => Some(Self::Audio),
            FRAME_TYPE_DATA => Some(Self::Data),
            _ => None,
        }
    }
}
