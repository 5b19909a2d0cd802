//! Content-defined chunking over the rolling buzhash (§4.6).

use super::buzhash::{RollingHash, WINDOW_SIZE};
use crate::error::ChunkError;

/// The closed configuration set for the chunker: `{min_size, avg_size, max_size}` (§6).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkerParams {
    pub min_size: u64,
    pub avg_size: u64,
    pub max_size: u64,
}

impl ChunkerParams {
    /// Build a validated parameter set.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkError::SizeOutOfRange`] unless `min_size <= avg_size <= max_size`.
    pub fn new(min_size: u64, avg_size: u64, max_size: u64) -> Result<Self, ChunkError> {
        if min_size > avg_size || avg_size > max_size {
            return Err(ChunkError::SizeOutOfRange(avg_size as usize));
        }
        Ok(Self { min_size, avg_size, max_size })
    }
}

/// casync/desync's default parameters (16 KiB / 64 KiB / 256 KiB), used by the
/// fixture tests and available as a sane starting point for callers.
impl Default for ChunkerParams {
    fn default() -> Self {
        Self {
            min_size: 16 * 1024,
            avg_size: 64 * 1024,
            max_size: 256 * 1024,
        }
    }
}

/// The discriminator: a closed form approximating `avg_size / ln 2`, chosen
/// so that the expected chunk size under a uniform hash equals `avg_size`
/// (§4.6, §9 open question -- the exact reference constant is unverified
/// here; see DESIGN.md).
#[must_use]
pub(crate) fn discriminator(avg_size: u64) -> u64 {
    let d = (avg_size as f64 / std::f64::consts::LN_2).round() as u64;
    d.max(1)
}

/// Slice `input` into content-defined chunks, returning `(offset, size)` pairs
/// in order (§4.6). Identity computation is left to the chunk codec.
#[must_use]
pub fn chunk_stream(input: &[u8], params: &ChunkerParams) -> Vec<(u64, u64)> {
    let len = input.len() as u64;
    if len == 0 {
        return Vec::new();
    }
    if len < params.min_size {
        return vec![(0, len)];
    }

    let disc = discriminator(params.avg_size);
    let mut out = Vec::new();
    let mut chunk_start = 0u64;

    while chunk_start < len {
        let remaining = len - chunk_start;
        let scan_limit = params.max_size.min(remaining);
        if remaining <= params.min_size || scan_limit <= params.min_size {
            out.push((chunk_start, remaining));
            break;
        }

        let mut consumed = params.min_size;
        let mut rh = RollingHash::from_window(window_ending_at(input, chunk_start + consumed));
        loop {
            if rh.value() % disc == disc - 1 {
                break;
            }
            if consumed >= scan_limit {
                break;
            }
            let in_byte = input[(chunk_start + consumed) as usize];
            rh.roll(in_byte);
            consumed += 1;
        }

        out.push((chunk_start, consumed));
        chunk_start += consumed;
    }

    out
}

/// The 48-byte window ending (exclusively) at absolute offset `end`, zero-padded
/// at the front if fewer than [`WINDOW_SIZE`] bytes of history exist (only
/// possible with a `min_size` configured smaller than the window).
fn window_ending_at(input: &[u8], end: u64) -> [u8; WINDOW_SIZE] {
    let end = end as usize;
    let start = end.saturating_sub(WINDOW_SIZE);
    let mut window = [0u8; WINDOW_SIZE];
    let available = end - start;
    window[WINDOW_SIZE - available..].copy_from_slice(&input[start..end]);
    window
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunk_stream(&[], &ChunkerParams::default()).is_empty());
    }

    #[test]
    fn input_smaller_than_min_size_yields_one_chunk() {
        let params = ChunkerParams::new(1024, 2048, 4096).unwrap();
        let input = vec![7u8; 100];
        let chunks = chunk_stream(&input, &params);
        assert_eq!(chunks, vec![(0, 100)]);
    }

    #[test]
    fn chunks_cover_the_whole_input_contiguously() {
        let params = ChunkerParams::new(256, 1024, 4096).unwrap();
        let mut input = Vec::with_capacity(64 * 1024);
        let mut x: u32 = 0x1234_5678;
        for _ in 0..64 * 1024 {
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            input.push((x & 0xff) as u8);
        }
        let chunks = chunk_stream(&input, &params);
        let mut cursor = 0u64;
        for (offset, size) in &chunks {
            assert_eq!(*offset, cursor);
            assert!(*size > 0);
            cursor += size;
        }
        assert_eq!(cursor, input.len() as u64);
    }

    #[test]
    fn non_final_chunks_obey_size_bounds() {
        let params = ChunkerParams::new(256, 1024, 4096).unwrap();
        let mut input = Vec::with_capacity(128 * 1024);
        let mut x: u32 = 0xdead_beef;
        for _ in 0..128 * 1024 {
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            input.push((x & 0xff) as u8);
        }
        let chunks = chunk_stream(&input, &params);
        for (i, (_, size)) in chunks.iter().enumerate() {
            if i + 1 < chunks.len() {
                assert!(*size >= params.min_size && *size <= params.max_size);
            }
        }
    }

    #[test]
    fn chunking_is_deterministic() {
        let params = ChunkerParams::default();
        let input: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        assert_eq!(chunk_stream(&input, &params), chunk_stream(&input, &params));
    }
}
