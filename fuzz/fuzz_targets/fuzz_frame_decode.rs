#![no_main]

use libfuzzer_sys::fuzz_target;

use tetrapol_rs::frame_decode::FrameDecoder;
use tetrapol_rs::tables::FRAME_DATA_LEN;
use tetrapol_rs::types::Frame;

fuzz_target!(|data: &[u8]| {
    if data.len() < FRAME_DATA_LEN {
        return;
    }
    let mut frame = Frame::new(0);
    for (bit, byte) in frame.data.iter_mut().zip(data) {
        *bit = byte & 1;
    }

    let mut decoder = FrameDecoder::new();
    let _ = decoder.decode(&frame);
});
