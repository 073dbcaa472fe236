//! Utility modules: streaming buffer, bit packing, hex encoding and
//! rate-limited logging helpers shared across the decoder pipeline.

pub mod bits;
pub mod hex;
pub mod iobuffer;
pub mod logging;

pub use bits::{pack_bits_msb, reorder_segment, unpack_bits_msb};
pub use hex::{decode_hex, encode_hex, format_hex_compact, hex_to_bytes, pretty_hex};
pub use iobuffer::{IoBuffer, IoBufferError};
pub use logging::{LogThrottle, ThrottleManager};
