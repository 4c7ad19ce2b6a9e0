//! System randomness

use rand::rngs::OsRng;
use rand::{Rng, RngCore};

/// `randombytes_random`: a uniformly random 32-bit value
pub fn random() -> u32 {
    OsRng.next_u32()
}

/// `randombytes_uniform`: a uniform value in `0..upper_bound`.
///
/// Returns `0` when `upper_bound < 2`.
pub fn uniform(upper_bound: u32) -> u32 {
    if upper_bound < 2 {
        return 0;
    }
    OsRng.gen_range(0..upper_bound)
}

/// `randombytes_buf`: fill `buf` with random bytes
pub fn buf(buf: &mut [u8]) {
    OsRng.fill_bytes(buf);
}
