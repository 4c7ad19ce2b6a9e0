//! Argon2 password hashing
//!
//! `memlimit` is in bytes, as in libsodium; Argon2 takes KiB. Parallelism is
//! fixed at 1.

use argon2::{Algorithm, Argon2, Params, Version};

/// Name reported by `crypto_pwhash_primitive`
pub const PRIMITIVE: &str = "argon2i";

pub const ALG_ARGON2I13: i32 = 1;
pub const ALG_ARGON2ID13: i32 = 2;
pub const ALG_DEFAULT: i32 = ALG_ARGON2ID13;

pub const BYTES_MIN: usize = 16;
pub const SALTBYTES: usize = 16;
pub const STRBYTES: usize = 128;

pub const OPSLIMIT_MIN: u64 = 1;
pub const MEMLIMIT_MIN: usize = 8192;

pub const OPSLIMIT_INTERACTIVE: u64 = 2;
pub const MEMLIMIT_INTERACTIVE: usize = 67_108_864;
pub const OPSLIMIT_MODERATE: u64 = 3;
pub const MEMLIMIT_MODERATE: usize = 268_435_456;
pub const OPSLIMIT_SENSITIVE: u64 = 4;
pub const MEMLIMIT_SENSITIVE: usize = 1_073_741_824;

/// Argon2i needs at least three passes
const ARGON2I_OPSLIMIT_MIN: u64 = 3;

/// `crypto_pwhash`: derive `out.len()` bytes from `passwd` and `salt`
pub fn pwhash(
    out: &mut [u8],
    passwd: &[u8],
    salt: &[u8; SALTBYTES],
    opslimit: u64,
    memlimit: usize,
    alg: i32,
) -> i32 {
    let algorithm = match alg {
        ALG_ARGON2ID13 => Algorithm::Argon2id,
        ALG_ARGON2I13 if opslimit >= ARGON2I_OPSLIMIT_MIN => Algorithm::Argon2i,
        _ => return -1,
    };
    if out.len() < BYTES_MIN || opslimit < OPSLIMIT_MIN || memlimit < MEMLIMIT_MIN {
        return -1;
    }

    let (Ok(t_cost), Ok(m_cost)) = (u32::try_from(opslimit), u32::try_from(memlimit / 1024)) else {
        return -1;
    };
    let params = match Params::new(m_cost, t_cost, 1, Some(out.len())) {
        Ok(p) => p,
        Err(_) => return -1,
    };

    match Argon2::new(algorithm, Version::V0x13, params).hash_password_into(passwd, salt, out) {
        Ok(()) => 0,
        Err(_) => -1,
    }
}
