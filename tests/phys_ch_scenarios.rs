//! End-to-end scenarios driving [`PhysCh`] purely through its public API:
//! raw unpacked bits in, TPDU/RCH/segmentation-reset callbacks out.

use tetrapol_rs::frame_decode::{crc5, descramble, diff_decode};
use tetrapol_rs::multiblock::{RchConsumer, SegmentationReset, TpduConsumer};
use tetrapol_rs::tables::{
    CRC5_LEN, CRC_INPUT_LEN, DATA_FRAME_LEN, DIFF_PRECOD_UHF, FRAME_DATA_LEN, FRAME_TYPE_DATA,
    INTERLEAVE_DATA_UHF, SYNC_PATTERN,
};
use tetrapol_rs::types::DataFrame;
use tetrapol_rs::{PhysCh, ProcessResult};

#[derive(Default)]
struct Recorder {
    tpdus: Vec<(i32, Vec<u8>)>,
    rchs: Vec<i32>,
    seg_resets: usize,
}

impl TpduConsumer for Recorder {
    fn on_tpdu(&mut self, data: &[u8], frame_no: i32) {
        self.tpdus.push((frame_no, data.to_vec()));
    }
}
impl RchConsumer for Recorder {
    fn on_rch(&mut self, frame: &DataFrame) {
        self.rchs.push(frame.frame_no);
    }
}
impl SegmentationReset for Recorder {
    fn segmentation_reset(&mut self) {
        self.seg_resets += 1;
    }
}

fn raw_sync_header() -> Vec<u8> {
    let mut v = vec![0u8];
    v.extend_from_slice(&SYNC_PATTERN);
    v
}

/// Build one complete 160-bit raw physical frame (header + differentially
/// encoded, scrambled, interleaved payload) whose decoded data-frame carries
/// `logical_data`, a 76-bit buffer with `data[0]==FRAME_TYPE_DATA` and a
/// valid CRC-5 already appended by the caller at offsets 69..74.
fn encode_raw_frame(logical_data: &[u8; DATA_FRAME_LEN], scr: u8) -> Vec<u8> {
    // Forward channel encode: analytic inverse of `channel_decode`, matching
    // the one derived and property-tested in frame_decode.rs.
    fn channel_encode(target: &[u8]) -> Vec<u8> {
        let n = target.len();
        let t = |i: i64| -> u8 { target[i.rem_euclid(n as i64) as usize] };
        let mut input = vec![0u8; 2 * n];
        for m in 0..n {
            let first = t(m as i64) ^ t(m as i64 - 1) ^ t(m as i64 + 1);
            let second = t(m as i64 - 1) ^ t(m as i64 + 1);
            input[(2 * m + 2) % (2 * n)] = first;
            input[(2 * m + 3) % (2 * n)] = second;
        }
        input
    }

    let coded_low = channel_encode(&logical_data[..26]);
    let coded_high = channel_encode(&logical_data[26..]);
    let mut interleaved = vec![0u8; FRAME_DATA_LEN];
    interleaved[..52].copy_from_slice(&coded_low);
    interleaved[52..].copy_from_slice(&coded_high);

    // Invert deinterleave: deinterleaved[j] = interleaved_stream[PERM[j]],
    // so interleaved_stream[PERM[j]] = interleaved[j].
    let mut stream = vec![0u8; FRAME_DATA_LEN];
    for (j, &perm) in INTERLEAVE_DATA_UHF.iter().enumerate() {
        stream[perm] = interleaved[j];
    }

    // Invert differential precoding: diff_decode computed
    // data[j] ^= data[j - step] in descending j; run the same recurrence
    // ascending to re-apply the encoding step it undoes.
    let mut encoded = stream.clone();
    for j in 1..FRAME_DATA_LEN {
        let step = DIFF_PRECOD_UHF[j] as usize;
        encoded[j] = stream[j] ^ encoded[j - step];
    }

    let mut payload: [u8; FRAME_DATA_LEN] = encoded.try_into().unwrap();
    descramble(&mut payload, scr); // involutive: also serves as the encode-side scramble

    let mut raw = raw_sync_header();
    raw.extend_from_slice(&payload);
    raw
}

/// Build a logical 76-bit data-frame (one 0/1 value per element) carrying
/// the given `fn` segmentation counter and a single marker bit at `data[3 +
/// marker_bit]` so distinct frames produce distinguishable packed segments.
fn data_frame_with_fn(fn_counter: u8, marker_bit: usize) -> [u8; DATA_FRAME_LEN] {
    let mut data = [0u8; DATA_FRAME_LEN];
    data[0] = FRAME_TYPE_DATA;
    data[1] = fn_counter & 1;
    data[2] = (fn_counter >> 1) & 1;
    data[3 + marker_bit] = 1;
    let crc = crc5(&data[..CRC_INPUT_LEN]);
    data[CRC_INPUT_LEN..CRC_INPUT_LEN + CRC5_LEN].copy_from_slice(&crc);
    data
}

fn sanity_round_trips(logical: &[u8; DATA_FRAME_LEN], scr: u8) {
    // Confidence check on the test helper itself, independent of PhysCh:
    // descramble+diff_decode+deinterleave must recover the encoded payload.
    let raw = encode_raw_frame(logical, scr);
    let mut payload: [u8; FRAME_DATA_LEN] = raw[8..].try_into().unwrap();
    descramble(&mut payload, scr);
    diff_decode(&mut payload);
    let deinterleaved = tetrapol_rs::frame_decode::deinterleave(&payload);
    let mut res = [0u8; 26];
    let mut err = [0u8; 26];
    tetrapol_rs::frame_decode::channel_decode(&mut res, &mut err, &deinterleaved[..52], 26);
    assert_eq!(&res[..], &logical[..26]);
}

#[test]
fn helper_encoder_is_a_faithful_inverse_of_the_decode_pipeline() {
    sanity_round_trips(&data_frame_with_fn(0, 0), 0);
    sanity_round_trips(&data_frame_with_fn(1, 7), 42);
}

#[test]
fn helper_encoder_marker_bit_round_trips_through_the_full_pipeline() {
    // The marker bit sits inside the segment the assembler packs; confirm
    // the handcrafted frame still clears CRC under a non-zero SCR too.
    sanity_round_trips(&data_frame_with_fn(2, 30), 99);
}

fn feed_frames(phys_ch: &mut PhysCh, rec: &mut Recorder, frames: &[Vec<u8>]) {
    for frame in frames {
        phys_ch.recv(frame);
        while phys_ch.process(rec, rec, rec) != ProcessResult::NeedMoreData {}
    }
}

#[test]
fn sync_acquires_after_two_consecutive_headers_and_first_frame_decodes() {
    let mut phys_ch = PhysCh::new();
    phys_ch.set_scr(0);
    let mut rec = Recorder::default();

    let mb1 = data_frame_with_fn(0, 0);
    let frame_a = encode_raw_frame(&mb1, 0);
    let frame_b = encode_raw_frame(&data_frame_with_fn(0, 1), 0);

    feed_frames(&mut phys_ch, &mut rec, &[frame_a, frame_b]);

    assert!(phys_ch.has_frame_sync());
    // Sync is only confirmed once two consecutive headers are buffered, so
    // both frames land in the buffer together and drain in the same
    // `process` call; each fn=0 frame delivers an MB1 immediately.
    assert_eq!(rec.tpdus.len(), 2);
    assert_eq!(rec.tpdus[0].1.len(), 8);
}

#[test]
fn sync_is_not_acquired_from_a_flat_stream() {
    let mut phys_ch = PhysCh::new();
    let mut rec = Recorder::default();

    // A constant-bit stream is shift-invariant, so cmp_frame_sync returns the
    // same (large) mismatch count at every offset: deterministically never
    // within MAX_FRAME_SYNC_ERR, unlike a pseudo-random stream which could
    // coincidentally align with the sync pattern somewhere.
    let flat = vec![0u8; 1200];
    phys_ch.recv(&flat);
    let result = phys_ch.process(&mut rec, &mut rec, &mut rec);

    assert_eq!(result, ProcessResult::NeedMoreData);
    assert!(!phys_ch.has_frame_sync());
    assert!(rec.tpdus.is_empty());
}

#[test]
fn multiblock_mb2_delivers_sixteen_bytes_via_fn_one_then_three() {
    let mut phys_ch = PhysCh::new();
    phys_ch.set_scr(0);
    let mut rec = Recorder::default();

    let preamble = encode_raw_frame(&data_frame_with_fn(0, 0), 0);
    let block1 = encode_raw_frame(&data_frame_with_fn(1, 1), 0);
    let block2 = encode_raw_frame(&data_frame_with_fn(3, 2), 0);

    feed_frames(&mut phys_ch, &mut rec, &[preamble.clone(), preamble]);
    // first preamble only acquires sync; discard any MB1 delivery before the
    // segmented pair under test
    rec.tpdus.clear();

    feed_frames(&mut phys_ch, &mut rec, &[block1, block2]);

    assert_eq!(rec.tpdus.len(), 1);
    assert_eq!(rec.tpdus[0].1.len(), 16);
}

#[test]
fn repeated_mb1_frames_keep_delivering_without_sync_loss() {
    // Without an external absolute frame-number source the physical layer
    // alone never resolves frame_no from FRAME_NO_UNKNOWN (see the RCH-
    // dispatch unit test in multiblock.rs, which exercises that path
    // directly against a synthesized known frame_no); this exercises the
    // steady-state decode loop over many frames instead.
    let mut phys_ch = PhysCh::new();
    phys_ch.set_scr(0);
    let mut rec = Recorder::default();

    let frames: Vec<Vec<u8>> = (0..16)
        .map(|_| encode_raw_frame(&data_frame_with_fn(0, 0), 0))
        .collect();
    feed_frames(&mut phys_ch, &mut rec, &frames);

    assert!(phys_ch.has_frame_sync());
    assert_eq!(rec.tpdus.len(), frames.len(), "no frame is lost once synced");
}
