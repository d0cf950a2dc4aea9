//! Gzip Inflator for Huobi, the one venue that sends compressed frames.
//! Output is bounded; a frame that would inflate past the buffer cap is
//! dropped rather than grown without limit.

use std::io::Read;

use flate2::read::GzDecoder;

/// Matches the original 8 KiB working-buffer contract: frames inflating to
/// more than this many bytes are dropped instead of accepted.
pub const MAX_INFLATED_BYTES: usize = 8192;

pub enum InflateOutcome {
    Inflated(Vec<u8>),
    Overflow,
    Error(std::io::Error),
}

pub fn inflate(compressed: &[u8]) -> InflateOutcome {
    let mut decoder = GzDecoder::new(compressed);
    let mut buf = Vec::with_capacity(compressed.len() * 4);
    let mut chunk = [0u8; 1024];
    loop {
        match decoder.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                if buf.len() + n > MAX_INFLATED_BYTES {
                    return InflateOutcome::Overflow;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            Err(err) => return InflateOutcome::Error(err),
        }
    }
    InflateOutcome::Inflated(buf)
}
