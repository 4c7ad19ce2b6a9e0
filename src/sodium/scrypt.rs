//! scrypt password hashing (`crypto_pwhash_scryptsalsa208sha256`)
//!
//! libsodium's limits are an operation count and a byte budget; they are
//! turned into scrypt's `N`, `r` and `p` the way libsodium picks them.

use scrypt::Params;

pub const BYTES_MIN: usize = 16;
pub const SALTBYTES: usize = 32;
pub const STRBYTES: usize = 102;

pub const OPSLIMIT_MIN: u64 = 32_768;
pub const MEMLIMIT_MIN: usize = 16_777_216;

pub const OPSLIMIT_INTERACTIVE: u64 = 524_288;
pub const MEMLIMIT_INTERACTIVE: usize = 16_777_216;
pub const OPSLIMIT_SENSITIVE: u64 = 33_554_432;
pub const MEMLIMIT_SENSITIVE: usize = 1_073_741_824;

const R: u32 = 8;
const MAX_RP: u64 = 0x3fff_ffff;

/// Key length recorded in [`Params`]; only PHC strings read it
const PARAMS_LEN: usize = 32;

/// scrypt cost parameters `(log2 N, r, p)` for the given limits
pub fn pick_params(opslimit: u64, memlimit: usize) -> (u8, u32, u32) {
    let opslimit = opslimit.max(OPSLIMIT_MIN);
    let r = u64::from(R);

    let smallest_log_n = |max_n: u64| -> u8 {
        (1u8..63)
            .find(|&log_n| (1u64 << log_n) > max_n / 2)
            .unwrap_or(63)
    };

    if opslimit < memlimit as u64 / 32 {
        let log_n = smallest_log_n(opslimit / (r * 4));
        (log_n, R, 1)
    } else {
        let log_n = smallest_log_n(memlimit as u64 / (r * 128));
        let max_rp = ((opslimit / 4) >> log_n).min(MAX_RP);
        (log_n, R, (max_rp / r) as u32)
    }
}

/// scrypt with explicit cost parameters
pub fn scrypt_ll(out: &mut [u8], passwd: &[u8], salt: &[u8], log_n: u8, r: u32, p: u32) -> i32 {
    let Ok(params) = Params::new(log_n, r, p, PARAMS_LEN) else {
        return -1;
    };
    match scrypt::scrypt(passwd, salt, &params, out) {
        Ok(()) => 0,
        Err(_) => -1,
    }
}

/// `crypto_pwhash_scryptsalsa208sha256`: derive `out.len()` bytes
pub fn pwhash(
    out: &mut [u8],
    passwd: &[u8],
    salt: &[u8; SALTBYTES],
    opslimit: u64,
    memlimit: usize,
) -> i32 {
    if out.len() < BYTES_MIN {
        return -1;
    }
    let (log_n, r, p) = pick_params(opslimit, memlimit);
    scrypt_ll(out, passwd, salt, log_n, r, p)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALT: [u8; SALTBYTES] = [0x5A; SALTBYTES];

    #[test]
    fn test_rfc7914_vector() {
        let mut out = [0u8; 64];
        assert_eq!(scrypt_ll(&mut out, b"", b"", 4, 1, 1), 0);
        assert_eq!(
            hex::encode(out),
            "77d6576238657b203b19ca42c18a0497f16b4844e3074ae8dfdffa3fede21442\
             fcd0069ded0948f8326a753a0fc81f17e8d3e0fb2e0d3628cf35e20c38d18906"
        );
    }

    #[test]
    fn test_pick_params() {
        assert_eq!(pick_params(OPSLIMIT_MIN, MEMLIMIT_MIN), (10, 8, 1));
        assert_eq!(pick_params(OPSLIMIT_INTERACTIVE, MEMLIMIT_INTERACTIVE), (14, 8, 1));
        assert_eq!(pick_params(OPSLIMIT_SENSITIVE, MEMLIMIT_SENSITIVE), (20, 8, 1));
        // Raised to the minimum
        assert_eq!(pick_params(1, MEMLIMIT_MIN), pick_params(OPSLIMIT_MIN, MEMLIMIT_MIN));
    }

    #[test]
    fn test_pwhash_matches_picked_params() {
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        assert_eq!(pwhash(&mut a, b"hunter2", &SALT, OPSLIMIT_MIN, MEMLIMIT_MIN), 0);

        let (log_n, r, p) = pick_params(OPSLIMIT_MIN, MEMLIMIT_MIN);
        let params = Params::new(log_n, r, p, PARAMS_LEN).unwrap();
        scrypt::scrypt(b"hunter2", &SALT, &params, &mut b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_short_output_rejected() {
        let mut out = [0u8; BYTES_MIN - 1];
        assert_eq!(pwhash(&mut out, b"pw", &SALT, OPSLIMIT_MIN, MEMLIMIT_MIN), -1);
        assert_eq!(out, [0u8; BYTES_MIN - 1]);
    }
}
