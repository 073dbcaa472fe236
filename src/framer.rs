//! Frame synchronization and extraction from a raw unpacked-bit stream.
//!
//! Mirrors `find_frame_sync`/`get_frame`/`tetrapol_recv2` from the reference
//! decoder: sync is searched for on the raw (still scrambled, still
//! differentially-encoded) stream because before differential decoding only
//! signal polarity matters, which keeps the comparison a simple bit count.

use crate::tables::{FRAME_HDR_LEN, FRAME_LEN, FRAME_NO_UNKNOWN, MAX_FRAME_SYNC_ERR, SYNC_PATTERN};
use crate::types::Frame;
use crate::util::IoBuffer;

/// Outcome of a single extraction attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramerEvent {
    /// A frame was extracted and differentially decoded.
    Frame,
    /// Not enough buffered data to extract another frame right now.
    NeedMoreData,
    /// Cumulative sync error exceeded tolerance; synchronization was dropped.
    SyncLost,
}

/// Accumulates raw unpacked bits and extracts [`Frame`]s once synchronized.
#[derive(Debug)]
pub struct Framer {
    buf: IoBuffer,
    has_frame_sync: bool,
    last_sync_err: u32,
    total_sync_err: u32,
    frame_no: i32,
}

impl Framer {
    /// Buffer capacity mirrors the reference's `data[10*FRAME_LEN]`: headroom
    /// for 10 frames so `recv` rarely has to reject input while searching for sync.
    pub const BUFFER_CAPACITY: usize = 10 * FRAME_LEN;

    pub fn new() -> Self {
        let mut buf = IoBuffer::with_capacity(Self::BUFFER_CAPACITY);
        buf.set_capacity_limit(Some(Self::BUFFER_CAPACITY));
        Self {
            buf,
            has_frame_sync: false,
            last_sync_err: 0,
            total_sync_err: 0,
            frame_no: FRAME_NO_UNKNOWN,
        }
    }

    /// Cumulative sync-error penalty since the last clean header match.
    pub fn total_sync_err(&self) -> u32 {
        self.total_sync_err
    }

    pub fn has_frame_sync(&self) -> bool {
        self.has_frame_sync
    }

    pub fn reset(&mut self) {
        self.has_frame_sync = false;
        self.last_sync_err = 0;
        self.total_sync_err = 0;
        self.frame_no = FRAME_NO_UNKNOWN;
        self.buf.clear();
    }

    /// Accept as many bits as fit into the remaining buffer capacity.
    ///
    /// Returns the number of bits actually accepted, which may be fewer than
    /// `bits.len()`; unlike [`IoBuffer::write`], this never errors on a
    /// partial accept.
    pub fn recv(&mut self, bits: &[u8]) -> usize {
        let space = self.buf.available_capacity();
        let n = bits.len().min(space);
        if n > 0 {
            self.buf
                .write(&bits[..n])
                .expect("n was bounded by available_capacity");
        }
        n
    }

    /// Compare the 7-bit differentially-encoded sync pattern at `data[1..8]`.
    fn cmp_frame_sync(data: &[u8]) -> u32 {
        SYNC_PATTERN
            .iter()
            .zip(&data[1..1 + SYNC_PATTERN.len()])
            .filter(|(expected, actual)| *expected != *actual)
            .count() as u32
    }

    /// Search for two consecutive frame sync sequences, discarding bits before a match.
    fn find_frame_sync(&mut self) -> bool {
        let mut offs = 0usize;
        let mut sync_err = MAX_FRAME_SYNC_ERR + 1;
        while offs + FRAME_LEN + FRAME_HDR_LEN < self.buf.len() {
            let window = self.buf.peek_range(offs, FRAME_LEN + FRAME_HDR_LEN);
            sync_err = Self::cmp_frame_sync(&window) + Self::cmp_frame_sync(&window[FRAME_LEN..]);
            if sync_err <= MAX_FRAME_SYNC_ERR {
                break;
            }
            offs += 1;
        }

        self.buf.consume(offs);

        if sync_err <= MAX_FRAME_SYNC_ERR {
            self.last_sync_err = 0;
            self.total_sync_err = 0;
            true
        } else {
            false
        }
    }

    fn differential_dec(data: &mut [u8], mut last_bit: u8) {
        for bit in data.iter_mut() {
            last_bit = *bit ^ last_bit;
            *bit = last_bit;
        }
    }

    /// Try to extract a single frame from the front of the buffer.
    fn get_frame(&mut self) -> Result<Option<Frame>, ()> {
        if self.buf.len() < FRAME_LEN {
            return Ok(None);
        }

        let header = self.buf.peek_range(0, FRAME_HDR_LEN);
        let sync_err = Self::cmp_frame_sync(&header);
        if sync_err + self.last_sync_err > MAX_FRAME_SYNC_ERR {
            self.total_sync_err = 1 + 2 * self.total_sync_err;
            if self.total_sync_err >= FRAME_LEN as u32 {
                return Err(());
            }
        } else {
            self.total_sync_err = 0;
        }
        self.last_sync_err = sync_err;

        let raw = self.buf.peek_range(FRAME_HDR_LEN, FRAME_LEN - FRAME_HDR_LEN);
        let mut frame = Frame::new(self.frame_no);
        frame.data.copy_from_slice(&raw);
        Self::differential_dec(&mut frame.data, 0);

        self.buf.consume(FRAME_LEN);

        Ok(Some(frame))
    }

    /// Drive the sync/extraction state machine one step; call repeatedly
    /// until it reports [`FramerEvent::NeedMoreData`].
    pub fn process(&mut self) -> (FramerEvent, Option<Frame>) {
        if !self.has_frame_sync {
            self.has_frame_sync = self.find_frame_sync();
            if !self.has_frame_sync {
                return (FramerEvent::NeedMoreData, None);
            }
            self.frame_no = FRAME_NO_UNKNOWN;
        }

        match self.get_frame() {
            Ok(Some(frame)) => (FramerEvent::Frame, Some(frame)),
            Ok(None) => (FramerEvent::NeedMoreData, None),
            Err(()) => {
                self.has_frame_sync = false;
                (FramerEvent::SyncLost, None)
            }
        }
    }

    /// Propagate the frame number learned downstream back into the framer,
    /// as the reference does via `phys_ch->frame_no = (frame.frame_no + 1) % 200`.
    pub fn advance_frame_no(&mut self, decoded_frame_no: i32) {
        if decoded_frame_no != FRAME_NO_UNKNOWN {
            self.frame_no = (decoded_frame_no + 1) % crate::tables::FRAME_NO_MOD;
        }
    }
}

impl Default for Framer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sync_block() -> Vec<u8> {
        // header bit 0 is arbitrary (ignored by cmp_frame_sync), bits 1..8 the
        // differential sync pattern, followed by 152 payload bits.
        let mut v = vec![0u8];
        v.extend_from_slice(&SYNC_PATTERN);
        v.extend(std::iter::repeat(0u8).take(152));
        v
    }

    #[test]
    fn recv_accepts_up_to_capacity() {
        let mut framer = Framer::new();
        let huge = vec![0u8; Framer::BUFFER_CAPACITY + 50];
        let accepted = framer.recv(&huge);
        assert_eq!(accepted, Framer::BUFFER_CAPACITY);
    }

    #[test]
    fn acquires_sync_on_two_consecutive_patterns() {
        let mut framer = Framer::new();
        let mut stream = sync_block();
        stream.extend(sync_block());
        framer.recv(&stream);

        let (event, frame) = framer.process();
        assert_eq!(event, FramerEvent::Frame);
        assert!(frame.is_some());
        assert!(framer.has_frame_sync());
    }

    #[test]
    fn need_more_data_when_buffer_too_short() {
        let mut framer = Framer::new();
        framer.recv(&[1, 0, 1, 0]);
        let (event, frame) = framer.process();
        assert_eq!(event, FramerEvent::NeedMoreData);
        assert!(frame.is_none());
    }
}
