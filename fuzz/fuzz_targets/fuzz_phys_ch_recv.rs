#![no_main]

use libfuzzer_sys::fuzz_target;

use tetrapol_rs::multiblock::{RchConsumer, SegmentationReset, TpduConsumer};
use tetrapol_rs::types::DataFrame;
use tetrapol_rs::{PhysCh, ProcessResult};

struct NullDriver;
impl TpduConsumer for NullDriver {
    fn on_tpdu(&mut self, _data: &[u8], _frame_no: i32) {}
}
impl RchConsumer for NullDriver {
    fn on_rch(&mut self, _frame: &DataFrame) {}
}
impl SegmentationReset for NullDriver {
    fn segmentation_reset(&mut self) {}
}

fuzz_target!(|data: &[u8]| {
    // The pipeline only accepts unpacked bits (byte value 0 or 1); fold
    // arbitrary fuzzer bytes down to that domain rather than rejecting them,
    // so the whole input contributes to sync search and channel decoding.
    let bits: Vec<u8> = data.iter().map(|b| b & 1).collect();

    let mut phys_ch = PhysCh::new();
    let mut driver = NullDriver;

    let mut offset = 0;
    while offset < bits.len() {
        offset += phys_ch.recv(&bits[offset..]);
        while phys_ch.process(&mut driver, &mut driver, &mut driver) != ProcessResult::NeedMoreData
        {
        }
    }
});
