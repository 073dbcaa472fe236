//! Per-frame descrambling, differential precoding inversion, deinterleaving,
//! convolutional channel decoding, CRC-5 validation and blind SCR detection.
//!
//! Mirrors `process_frame`/`frame_decode_data`/`channel_decoder`/`mk_crc5`
//! from the reference decoder, resolving the "last passing SCR wins" bug
//! (see module-level open question notes) by scanning every candidate and
//! requiring a unique winner.

use crate::error::{Result, TetrapolError};
use crate::tables::{
    CRC5_LEN, CRC_INPUT_LEN, DATA_FRAME_LEN, DIFF_PRECOD_UHF, FRAME_DATA_LEN, FRAME_TYPE_DATA,
    INTERLEAVE_DATA_UHF, SCRAMB_TABLE, SCR_CANDIDATES, SCR_DETECT,
};
use crate::types::{DataFrame, Frame};
use crate::util::logging::debug as log_debug;

/// Which scrambling constant(s) the decoder should try.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrMode {
    /// Scan all [`SCR_CANDIDATES`] constants each frame until one locks in.
    Detect,
    /// Only try this fixed constant; bypasses the scan and statistics entirely.
    Fixed(u8),
}

/// Aggregate counters for observability, independent of the typed error path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    pub frames_attempted: u64,
    pub frames_decoded: u64,
    pub scr_ties: u64,
    pub scr_not_found: u64,
    pub scr_locked_events: u64,
}

/// Per-frame descrambling, channel decoding and blind SCR detection.
#[derive(Debug)]
pub struct FrameDecoder {
    scr_mode: ScrMode,
    scr_confidence: u32,
    scr_stat: [u32; SCR_CANDIDATES],
    locked_scr: Option<u8>,
    /// Tolerance for disagreements between the channel decoder's two
    /// redundant solutions; the reference is de facto zero-tolerant.
    pub max_channel_errors: u32,
    stats: DecodeStats,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            scr_mode: ScrMode::Detect,
            scr_confidence: crate::tables::DEFAULT_SCR_CONFIDENCE,
            scr_stat: [0; SCR_CANDIDATES],
            locked_scr: None,
            max_channel_errors: 0,
            stats: DecodeStats::default(),
        }
    }

    /// Set the SCR, mirroring `tetrapol_phys_ch_set_scr`: `DETECT` (-1)
    /// re-enables blind scanning, any other value forces that constant.
    /// Resets `scr_stat` and any lock, matching the reference.
    pub fn set_scr(&mut self, scr: i32) {
        self.scr_stat = [0; SCR_CANDIDATES];
        self.locked_scr = None;
        self.scr_mode = if scr == SCR_DETECT {
            ScrMode::Detect
        } else {
            ScrMode::Fixed(scr as u8)
        };
    }

    /// Currently effective SCR: the locked value if blind detection has
    /// locked, the forced value in fixed mode, or `DETECT` otherwise.
    pub fn get_scr(&self) -> i32 {
        match (self.scr_mode, self.locked_scr) {
            (ScrMode::Fixed(v), _) => v as i32,
            (ScrMode::Detect, Some(locked)) => locked as i32,
            (ScrMode::Detect, None) => SCR_DETECT,
        }
    }

    pub fn set_scr_confidence(&mut self, confidence: u32) {
        self.scr_confidence = confidence;
    }

    pub fn get_scr_confidence(&self) -> u32 {
        self.scr_confidence
    }

    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    fn candidates(&self) -> Vec<u8> {
        match (self.scr_mode, self.locked_scr) {
            (ScrMode::Fixed(v), _) => vec![v],
            (ScrMode::Detect, Some(locked)) => vec![locked],
            (ScrMode::Detect, None) => (0..SCR_CANDIDATES as u32).map(|v| v as u8).collect(),
        }
    }

    /// Attempt one candidate SCR end to end; returns the decoded data-frame
    /// on success, or the specific failure reason.
    fn try_candidate(&self, frame: &Frame, scr: u8) -> Result<DataFrame> {
        let mut data = frame.data;
        descramble(&mut data, scr);
        diff_decode(&mut data);
        let data = deinterleave(&data);

        let mut df = DataFrame::new(frame.frame_no);
        let errs_low = channel_decode(&mut df.data[..26], &mut df.err[..26], &data[..52], 26);
        let errs_high =
            channel_decode(&mut df.data[26..], &mut df.err[26..], &data[52..], 50);
        let total_errs = errs_low + errs_high;

        if total_errs > self.max_channel_errors {
            return Err(TetrapolError::ChannelDecodeErrors {
                count: total_errs,
                max: self.max_channel_errors,
            });
        }

        if df.data[0] != FRAME_TYPE_DATA {
            return Err(TetrapolError::NotADataFrame(df.data[0]));
        }

        if !check_crc5(&df.data) {
            return Err(TetrapolError::CrcMismatch);
        }

        Ok(df)
    }

    /// Run the full per-frame pipeline, trying every currently-relevant SCR
    /// candidate and resolving to a unique winner.
    pub fn decode(&mut self, frame: &Frame) -> Result<DataFrame> {
        self.stats.frames_attempted += 1;
        let candidates = self.candidates();
        let scanning = candidates.len() > 1;

        let mut passing: Vec<(u8, DataFrame)> = Vec::new();
        for scr in candidates {
            if let Ok(df) = self.try_candidate(frame, scr) {
                passing.push((scr, df));
            }
        }

        match passing.len() {
            0 => {
                self.stats.scr_not_found += 1;
                Err(TetrapolError::ScrNotFound)
            }
            1 => {
                let (scr, df) = passing.into_iter().next().unwrap();
                if scanning {
                    self.scr_stat[scr as usize] += 1;
                    log_debug::log_scr_detection(scr, self.scr_stat[scr as usize]);
                    if self.locked_scr.is_none()
                        && self.scr_stat[scr as usize] >= self.scr_confidence
                    {
                        self.locked_scr = Some(scr);
                        self.stats.scr_locked_events += 1;
                    }
                }
                self.stats.frames_decoded += 1;
                Ok(df)
            }
            _ => {
                self.stats.scr_ties += 1;
                let candidates: Vec<u8> = passing.iter().map(|(scr, _)| *scr).collect();
                if scanning {
                    for &scr in &candidates {
                        self.scr_stat[scr as usize] += 1;
                    }
                }
                Err(TetrapolError::ScrAmbiguous { candidates })
            }
        }
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// XOR each bit with the scrambling sequence rotated by `scr`; involutive.
pub fn descramble(data: &mut [u8; FRAME_DATA_LEN], scr: u8) {
    if scr == 0 {
        return;
    }
    for (k, bit) in data.iter_mut().enumerate() {
        *bit ^= SCRAMB_TABLE[(k + scr as usize) % SCRAMB_TABLE.len()];
    }
}

/// Invert the differential precoding applied at the transmitter.
pub fn diff_decode(data: &mut [u8; FRAME_DATA_LEN]) {
    for j in (1..FRAME_DATA_LEN).rev() {
        data[j] ^= data[j - DIFF_PRECOD_UHF[j] as usize];
    }
}

/// Deinterleave a 152-bit frame according to the data-frame permutation.
pub fn deinterleave(data: &[u8; FRAME_DATA_LEN]) -> [u8; FRAME_DATA_LEN] {
    let mut out = [0u8; FRAME_DATA_LEN];
    for j in 0..FRAME_DATA_LEN {
        out[j] = data[INTERLEAVE_DATA_UHF[j]];
    }
    out
}

/// Rate-1/2 convolutional channel decode producing `res_len` logical bits
/// and their disagreement flags from `2*res_len` coded input bits.
///
/// `res`/`err` must have length `res_len`; `input` must have length
/// `2*res_len`, cyclically indexed as in the reference.
pub fn channel_decode(res: &mut [u8], err: &mut [u8], input: &[u8], res_len: usize) -> u32 {
    let n2 = 2 * res_len;
    let get = |offset: usize| input[offset % n2];

    let mut errs = 0u32;
    for i in 0..res_len {
        let r = get(2 * i + 2) ^ get(2 * i + 3);
        let alt = get(2 * i + 5) ^ get(2 * i + 6) ^ get(2 * i + 7);
        let e = alt ^ r;
        res[i] = r;
        err[i] = e;
        errs += e as u32;
    }
    errs
}

/// CRC-5, polynomial x^5 + x^2 + 1, 5-cell shift register.
pub fn crc5(input: &[u8]) -> [u8; CRC5_LEN] {
    let mut reg = [0u8; CRC5_LEN];
    for &bit in input {
        let inv = bit ^ reg[0];
        reg[0] = reg[1];
        reg[1] = reg[2];
        reg[2] = reg[3] ^ inv;
        reg[3] = reg[4];
        reg[4] = inv;
    }
    reg
}

fn check_crc5(data: &[u8; DATA_FRAME_LEN]) -> bool {
    let expected = crc5(&data[..CRC_INPUT_LEN]);
    data[CRC_INPUT_LEN..CRC_INPUT_LEN + CRC5_LEN] == expected
}
