//! Reassembles callback-sized sample chunks into blocking fixed-size reads.
//!
//! Audio callbacks deliver whatever the hardware period happens to be; the
//! capture core wants `read(buf)` calls that fill a whole frame buffer.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use clip_capture_core::ReadError;

/// Encode interleaved 16-bit samples as little-endian PCM bytes.
pub fn encode_i16_le(samples: &[i16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}

pub struct ChunkReader {
    rx: Receiver<Vec<u8>>,
    pending: Vec<u8>,
    offset: usize,
    timeout: Duration,
}

impl ChunkReader {
    pub fn new(rx: Receiver<Vec<u8>>, timeout: Duration) -> Self {
        Self {
            rx,
            pending: Vec::new(),
            offset: 0,
            timeout,
        }
    }

    /// Fill `buf` from queued chunks, waiting up to the timeout in total.
    ///
    /// Returns a short count if the timeout expires after some data arrived,
    /// `InvalidOperation` if nothing arrived, and `Disconnected` once the
    /// sending side is gone and the queue is drained.
    pub fn fill(&mut self, buf: &mut [u8]) -> Result<usize, ReadError> {
        let deadline = Instant::now() + self.timeout;
        let mut filled = 0;

        while filled < buf.len() {
            if self.offset < self.pending.len() {
                let n = (self.pending.len() - self.offset).min(buf.len() - filled);
                buf[filled..filled + n].copy_from_slice(&self.pending[self.offset..self.offset + n]);
                self.offset += n;
                filled += n;
                continue;
            }

            let wait = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(wait) {
                Ok(chunk) => {
                    self.pending = chunk;
                    self.offset = 0;
                }
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    if filled > 0 {
                        break;
                    }
                    return Err(ReadError::Disconnected("input stream closed".into()));
                }
            }
        }

        if filled == 0 {
            return Err(ReadError::InvalidOperation);
        }
        Ok(filled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn samples_are_little_endian() {
        assert_eq!(encode_i16_le(&[1, -1, 0x1234]), vec![0x01, 0x00, 0xff, 0xff, 0x34, 0x12]);
    }

    #[test]
    fn joins_small_chunks_into_one_read() {
        let (tx, rx) = mpsc::sync_channel(8);
        let mut reader = ChunkReader::new(rx, Duration::from_millis(200));
        tx.send(vec![1, 2, 3]).unwrap();
        tx.send(vec![4, 5]).unwrap();
        tx.send(vec![6, 7, 8, 9]).unwrap();

        let mut buf = [0u8; 6];
        assert_eq!(reader.fill(&mut buf), Ok(6));
        assert_eq!(buf, [1, 2, 3, 4, 5, 6]);

        // Remainder of the split chunk comes first next time.
        let mut buf = [0u8; 3];
        assert_eq!(reader.fill(&mut buf), Ok(3));
        assert_eq!(buf, [7, 8, 9]);
    }

    #[test]
    fn short_read_on_timeout() {
        let (tx, rx) = mpsc::sync_channel(8);
        let mut reader = ChunkReader::new(rx, Duration::from_millis(20));
        tx.send(vec![1, 2]).unwrap();

        let mut buf = [0u8; 8];
        assert_eq!(reader.fill(&mut buf), Ok(2));
        assert_eq!(reader.fill(&mut buf), Err(ReadError::InvalidOperation));
        drop(tx);
    }

    #[test]
    fn disconnected_after_drain() {
        let (tx, rx) = mpsc::sync_channel(8);
        let mut reader = ChunkReader::new(rx, Duration::from_millis(20));
        tx.send(vec![9; 4]).unwrap();
        drop(tx);

        let mut buf = [0u8; 8];
        assert_eq!(reader.fill(&mut buf), Ok(4));
        assert!(matches!(reader.fill(&mut buf), Err(ReadError::Disconnected(_))));
    }
}
