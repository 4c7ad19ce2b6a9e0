//! Sodium-Style Primitives
//!
//! Pure-Rust implementations of the libsodium functions the bridge exposes,
//! with libsodium's calling conventions: fixed-size arguments, `0` for
//! success, `-1` for failure, and libsodium's constant names and values.
//!
//! | Module | Functions |
//! |--------|-----------|
//! | [`hsalsa20`] | `crypto_core_hsalsa20` |
//! | [`scalarmult`] | `crypto_scalarmult_curve25519`, `_base` |
//! | [`aead`] | `crypto_aead_{chacha20,xchacha20,xsalsa20}poly1305_*_{en,de}crypt_detached` |
//! | [`crypto_box`] | `crypto_box_keypair`, `_seed_keypair`, `_seal`, `_seal_open` |
//! | [`randombytes`] | `randombytes_random`, `_uniform`, `_buf` |
//! | [`pwhash`] | `crypto_pwhash` (Argon2) |
//! | [`scrypt`] | `crypto_pwhash_scryptsalsa208sha256` |

pub mod aead;
pub mod crypto_box;
pub mod hsalsa20;
pub mod pwhash;
pub mod randombytes;
pub mod scalarmult;
pub mod scrypt;

use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::OnceCell;
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{debug, error};

static INIT_RESULT: OnceCell<bool> = OnceCell::new();
static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize the primitive library.
///
/// Returns `0` on the first successful call, `1` when already initialized
/// and `-1` if the system random source is unusable. Safe to call from any
/// number of threads; the check runs once.
pub fn init() -> i32 {
    let mut first = false;
    let healthy = *INIT_RESULT.get_or_init(|| {
        first = true;
        match check_entropy() {
            Ok(()) => {
                INITIALIZED.store(true, Ordering::Release);
                debug!("sodium primitives initialized");
                true
            }
            Err(err) => {
                error!(%err, "system random source unavailable");
                false
            }
        }
    });

    match (healthy, first) {
        (false, _) => -1,
        (true, true) => 0,
        (true, false) => 1,
    }
}

/// True once [`init`] has succeeded
pub fn is_initialized() -> bool {
    INITIALIZED.load(Ordering::Acquire)
}

fn check_entropy() -> Result<(), rand::Error> {
    let mut sample = [0u8; 16];
    OsRng.try_fill_bytes(&mut sample)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_idempotent() {
        let first = init();
        assert!(first == 0 || first == 1);
        assert_eq!(init(), 1);
        assert!(is_initialized());
    }
}
