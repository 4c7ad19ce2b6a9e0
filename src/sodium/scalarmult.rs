//! X25519 scalar multiplication

use subtle::ConstantTimeEq;
use x25519_dalek::{x25519, X25519_BASEPOINT_BYTES};

/// Name reported by `crypto_scalarmult_primitive`
pub const PRIMITIVE: &str = "curve25519";

pub const CURVE25519_BYTES: usize = 32;
pub const CURVE25519_SCALARBYTES: usize = 32;

pub const BYTES: usize = CURVE25519_BYTES;
pub const SCALARBYTES: usize = CURVE25519_SCALARBYTES;

/// `crypto_scalarmult_curve25519`: `q = n * p`.
///
/// Returns `-1` when the result is the all-zero point (a low-order `p`).
/// `q` is written either way.
pub fn curve25519(
    q: &mut [u8; CURVE25519_BYTES],
    n: &[u8; CURVE25519_SCALARBYTES],
    p: &[u8; CURVE25519_BYTES],
) -> i32 {
    *q = x25519(*n, *p);
    if bool::from(q[..].ct_eq(&[0u8; CURVE25519_BYTES][..])) {
        return -1;
    }
    0
}

/// `crypto_scalarmult_curve25519_base`: `q = n * G`
pub fn curve25519_base(q: &mut [u8; CURVE25519_BYTES], n: &[u8; CURVE25519_SCALARBYTES]) -> i32 {
    *q = x25519(*n, X25519_BASEPOINT_BYTES);
    0
}
