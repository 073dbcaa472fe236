//! Error types for the TETRAPOL physical-channel decoder.

use thiserror::Error;

/// Errors that can occur while decoding the TETRAPOL downlink physical channel.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TetrapolError {
    /// Cumulative frame-sync error exceeded the re-acquisition threshold.
    #[error("frame synchronization lost after {total_err} cumulative sync errors")]
    SyncLost { total_err: u32 },

    /// Channel decode produced more mismatched bit pairs than tolerated.
    #[error("channel decode error count {count} exceeds tolerance {max}")]
    ChannelDecodeErrors { count: u32, max: u32 },

    /// CRC-5 check over the decoded data-frame payload failed.
    #[error("CRC-5 mismatch on data-frame payload")]
    CrcMismatch,

    /// Frame discriminant byte did not select a data-frame.
    #[error("frame is not a data-frame (discriminant {0})")]
    NotADataFrame(u8),

    /// No scrambling constant out of 128 candidates produced a valid frame.
    #[error("no scrambling constant produced a valid frame")]
    ScrNotFound,

    /// More than one scrambling constant produced a valid frame in the same scan.
    #[error("ambiguous scrambling constant: candidates {candidates:?} all validated")]
    ScrAmbiguous { candidates: Vec<u8> },

    /// Transverse XOR parity check across assembled segments failed.
    #[error("multiblock XOR verification failed across {segments} segments")]
    XorVerifyFailed { segments: usize },

    /// Caller-supplied configuration was out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, TetrapolError>;
