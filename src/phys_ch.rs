//! Top-level physical-channel pipeline: wires the [`Framer`], [`FrameDecoder`]
//! and [`Assembler`] together behind the small entry-point surface a driver
//! needs (`recv`/`process`/SCR controls), mirroring `tetrapol_phys_ch_*`.

use crate::error::TetrapolError;
use crate::framer::{Framer, FramerEvent};
use crate::frame_decode::FrameDecoder;
use crate::multiblock::{Assembler, AssemblerEvent, RchConsumer, SegmentationReset, TpduConsumer};
use crate::tables::FRAME_NO_UNKNOWN;
use crate::util::logging::{log_frame_hex, ThrottleManager};

/// Outcome of draining as many frames as the input buffer currently allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessResult {
    /// No more complete frames are available; feed more bytes and call again.
    NeedMoreData,
    /// Frame synchronization was lost mid-stream; the assembler was reset.
    SyncLost,
}

/// Owns the full receive pipeline for one TETRAPOL downlink physical channel.
pub struct PhysCh {
    framer: Framer,
    decoder: FrameDecoder,
    assembler: Assembler,
    throttle: ThrottleManager,
}

impl PhysCh {
    pub fn new() -> Self {
        Self {
            framer: Framer::new(),
            decoder: FrameDecoder::new(),
            assembler: Assembler::new(),
            throttle: ThrottleManager::new(),
        }
    }

    pub fn has_frame_sync(&self) -> bool {
        self.framer.has_frame_sync()
    }

    /// Reset the framer, decoder lock state and assembler to their initial state.
    pub fn reset(&mut self) {
        self.framer.reset();
        self.assembler.reset();
    }

    pub fn set_scr(&mut self, scr: i32) {
        self.decoder.set_scr(scr);
    }

    pub fn get_scr(&self) -> i32 {
        self.decoder.get_scr()
    }

    pub fn set_scr_confidence(&mut self, confidence: u32) {
        self.decoder.set_scr_confidence(confidence);
    }

    pub fn get_scr_confidence(&self) -> u32 {
        self.decoder.get_scr_confidence()
    }

    /// Tolerated channel-decode disagreements per frame (reference behavior is zero).
    pub fn set_max_channel_errors(&mut self, max: u32) {
        self.decoder.max_channel_errors = max;
    }

    /// Accept as many bits as fit in the framer's buffer; returns the count accepted.
    pub fn recv(&mut self, bits: &[u8]) -> usize {
        self.framer.recv(bits)
    }

    /// Drain as many complete frames as the buffer currently holds, decoding
    /// and assembling each one, until no more full frames remain or
    /// synchronization is lost.
    pub fn process(
        &mut self,
        tpdu: &mut dyn TpduConsumer,
        rch: &mut dyn RchConsumer,
        seg: &mut dyn SegmentationReset,
    ) -> ProcessResult {
        loop {
            let had_sync = self.framer.has_frame_sync();

            match self.framer.process() {
                (FramerEvent::NeedMoreData, _) => return ProcessResult::NeedMoreData,
                (FramerEvent::SyncLost, _) => {
                    if self.throttle.allow("sync_lost", 1000, 5) {
                        let err = TetrapolError::SyncLost {
                            total_err: self.framer.total_sync_err(),
                        };
                        log::warn!("{err}");
                    }
                    self.assembler.reset();
                    seg.segmentation_reset();
                    return ProcessResult::SyncLost;
                }
                (FramerEvent::Frame, Some(frame)) => {
                    if !had_sync && self.framer.has_frame_sync() {
                        log::info!("frame synchronization acquired");
                        self.assembler.reset();
                        seg.segmentation_reset();
                    }

                    match self.decoder.decode(&frame) {
                        Ok(data_frame) => {
                            log_frame_hex("decoded data-frame", &data_frame.data);
                            let event = self.assembler.process(&data_frame, tpdu, rch, seg);
                            if let Some(frame_no) = self.assembler.take_backprop_frame_no() {
                                self.framer.advance_frame_no(frame_no);
                            } else if data_frame.frame_no != FRAME_NO_UNKNOWN {
                                self.framer.advance_frame_no(data_frame.frame_no);
                            }
                            if let AssemblerEvent::ParityError { segments } = event {
                                if self.throttle.allow("parity_error", 1000, 5) {
                                    let err = TetrapolError::XorVerifyFailed { segments };
                                    log::warn!("{err}");
                                }
                            }
                        }
                        Err(err) => {
                            if self.throttle.allow("decode_error", 1000, 5) {
                                log::debug!("frame decode failed: {err}");
                            }
                            self.assembler.reset();
                            seg.segmentation_reset();
                        }
                    }
                }
                (FramerEvent::Frame, None) => unreachable!("Frame event always carries a frame"),
            }
        }
    }
}

impl Default for PhysCh {
    fn default() -> Self {
        Self::new()
    }
}
