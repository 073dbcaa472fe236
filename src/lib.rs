//! # tetrapol-rs - TETRAPOL downlink physical-channel decoder
//!
//! A software-receiver core for the TETRAPOL air-interface downlink
//! physical channel (PAS 0001-2 sections 6.1-6.3): frame synchronization,
//! descrambling with blind scrambling-constant detection, differential
//! precoding inversion, deinterleaving, rate-1/2 convolutional channel
//! decoding, CRC-5 validation, and multi-block assembly.
//!
//! ## Usage
//!
//! ```no_run
//! use tetrapol_rs::phys_ch::{PhysCh, ProcessResult};
//! use tetrapol_rs::multiblock::{RchConsumer, SegmentationReset, TpduConsumer};
//! use tetrapol_rs::types::DataFrame;
//!
//! struct Driver;
//! impl TpduConsumer for Driver {
//!     fn on_tpdu(&mut self, _data: &[u8], _frame_no: i32) {}
//! }
//! impl RchConsumer for Driver {
//!     fn on_rch(&mut self, _frame: &DataFrame) {}
//! }
//! impl SegmentationReset for Driver {
//!     fn segmentation_reset(&mut self) {}
//! }
//!
//! let mut phys_ch = PhysCh::new();
//! let mut driver = Driver;
//! phys_ch.recv(&[0, 1, 0, 1, 0, 0, 1, 1]);
//! match phys_ch.process(&mut driver, &mut driver, &mut driver) {
//!     ProcessResult::NeedMoreData => {}
//!     ProcessResult::SyncLost => {}
//! }
//! ```

pub mod config;
pub mod error;
pub mod frame_decode;
pub mod framer;
pub mod logging;
pub mod multiblock;
pub mod phys_ch;
pub mod tables;
pub mod types;
pub mod util;

pub use crate::config::DecoderConfig;
pub use crate::error::{Result, TetrapolError};
pub use crate::logging::{init_logger, log_info};
pub use crate::phys_ch::{PhysCh, ProcessResult};
