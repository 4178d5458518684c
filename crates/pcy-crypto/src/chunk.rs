//! Capacity-aware chunk splitting and in-order joining
//!
//! RSA can only encrypt `capacity` bytes per call, so the payload is cut
//! into fixed-size pieces:
//! ```text
//! [capacity][capacity]...[remainder <= capacity]
//! ```
//! An empty payload still yields one (empty) chunk so that every envelope
//! carries at least one ciphertext segment.

use std::num::NonZeroUsize;

/// Split `data` into ordered chunks of at most `capacity` bytes.
pub fn split(data: &[u8], capacity: NonZeroUsize) -> Vec<&[u8]> {
    if data.is_empty() {
        return vec![data];
    }
    data.chunks(capacity.get()).collect()
}

/// Concatenate decrypted chunks in order.
///
/// The output is allocated once at its final size, so no reallocation
/// leaves stray copies of the plaintext behind.
pub fn join<C: AsRef<[u8]>>(chunks: &[C]) -> Vec<u8> {
    let total = chunks.iter().map(|c| c.as_ref().len()).sum();
    let mut out = Vec::with_capacity(total);
    for chunk in chunks {
        out.extend_from_slice(chunk.as_ref());
    }
    out
}

/// Number of chunks `split` produces for a payload of `len` bytes.
pub fn chunk_count(len: usize, capacity: NonZeroUsize) -> usize {
    len.div_ceil(capacity.get()).max(1)
}
