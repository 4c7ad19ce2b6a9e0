//! Nullary getters: size constants and primitive names

use std::ffi::{c_char, CString};

use once_cell::sync::Lazy;

use crate::sodium::{aead, crypto_box, hsalsa20, pwhash, scalarmult, scrypt};

macro_rules! constants {
    ($($export:ident: $ty:ty => $name:literal = $value:expr;)*) => {
        /// Every exported constant by libsodium name
        pub const CONSTANTS: &[(&str, i64)] = &[$(($name, $value as i64)),*];

        $(
            #[doc = concat!("`", $name, "()`")]
            #[no_mangle]
            pub extern "C" fn $export() -> $ty {
                $value as $ty
            }
        )*
    };
}

macro_rules! primitive_names {
    ($($export:ident => $value:expr;)*) => {
        $(
            /// Static NUL-terminated primitive name
            #[no_mangle]
            pub extern "C" fn $export() -> *const c_char {
                static NAME: Lazy<CString> =
                    Lazy::new(|| CString::new($value).unwrap_or_default());
                NAME.as_ptr()
            }
        )*
    };
}

constants! {
    sodium_bridge_crypto_core_hsalsa20_outputbytes: usize =>
        "crypto_core_hsalsa20_outputbytes" = hsalsa20::OUTPUTBYTES;
    sodium_bridge_crypto_core_hsalsa20_inputbytes: usize =>
        "crypto_core_hsalsa20_inputbytes" = hsalsa20::INPUTBYTES;
    sodium_bridge_crypto_core_hsalsa20_keybytes: usize =>
        "crypto_core_hsalsa20_keybytes" = hsalsa20::KEYBYTES;
    sodium_bridge_crypto_core_hsalsa20_constbytes: usize =>
        "crypto_core_hsalsa20_constbytes" = hsalsa20::CONSTBYTES;

    sodium_bridge_crypto_scalarmult_bytes: usize =>
        "crypto_scalarmult_bytes" = scalarmult::BYTES;
    sodium_bridge_crypto_scalarmult_scalarbytes: usize =>
        "crypto_scalarmult_scalarbytes" = scalarmult::SCALARBYTES;
    sodium_bridge_crypto_scalarmult_curve25519_bytes: usize =>
        "crypto_scalarmult_curve25519_bytes" = scalarmult::CURVE25519_BYTES;
    sodium_bridge_crypto_scalarmult_curve25519_scalarbytes: usize =>
        "crypto_scalarmult_curve25519_scalarbytes" = scalarmult::CURVE25519_SCALARBYTES;

    sodium_bridge_crypto_aead_chacha20poly1305_keybytes: usize =>
        "crypto_aead_chacha20poly1305_keybytes" = aead::CHACHA20POLY1305_KEYBYTES;
    sodium_bridge_crypto_aead_chacha20poly1305_nsecbytes: usize =>
        "crypto_aead_chacha20poly1305_nsecbytes" = aead::CHACHA20POLY1305_NSECBYTES;
    sodium_bridge_crypto_aead_chacha20poly1305_npubbytes: usize =>
        "crypto_aead_chacha20poly1305_npubbytes" = aead::CHACHA20POLY1305_NPUBBYTES;
    sodium_bridge_crypto_aead_chacha20poly1305_abytes: usize =>
        "crypto_aead_chacha20poly1305_abytes" = aead::CHACHA20POLY1305_ABYTES;

    sodium_bridge_crypto_aead_chacha20poly1305_ietf_keybytes: usize =>
        "crypto_aead_chacha20poly1305_ietf_keybytes" = aead::CHACHA20POLY1305_IETF_KEYBYTES;
    sodium_bridge_crypto_aead_chacha20poly1305_ietf_nsecbytes: usize =>
        "crypto_aead_chacha20poly1305_ietf_nsecbytes" = aead::CHACHA20POLY1305_IETF_NSECBYTES;
    sodium_bridge_crypto_aead_chacha20poly1305_ietf_npubbytes: usize =>
        "crypto_aead_chacha20poly1305_ietf_npubbytes" = aead::CHACHA20POLY1305_IETF_NPUBBYTES;
    sodium_bridge_crypto_aead_chacha20poly1305_ietf_abytes: usize =>
        "crypto_aead_chacha20poly1305_ietf_abytes" = aead::CHACHA20POLY1305_IETF_ABYTES;

    sodium_bridge_crypto_aead_xchacha20poly1305_ietf_keybytes: usize =>
        "crypto_aead_xchacha20poly1305_ietf_keybytes" = aead::XCHACHA20POLY1305_IETF_KEYBYTES;
    sodium_bridge_crypto_aead_xchacha20poly1305_ietf_nsecbytes: usize =>
        "crypto_aead_xchacha20poly1305_ietf_nsecbytes" = aead::XCHACHA20POLY1305_IETF_NSECBYTES;
    sodium_bridge_crypto_aead_xchacha20poly1305_ietf_npubbytes: usize =>
        "crypto_aead_xchacha20poly1305_ietf_npubbytes" = aead::XCHACHA20POLY1305_IETF_NPUBBYTES;
    sodium_bridge_crypto_aead_xchacha20poly1305_ietf_abytes: usize =>
        "crypto_aead_xchacha20poly1305_ietf_abytes" = aead::XCHACHA20POLY1305_IETF_ABYTES;

    sodium_bridge_crypto_aead_xsalsa20poly1305_keybytes: usize =>
        "crypto_aead_xsalsa20poly1305_keybytes" = aead::XSALSA20POLY1305_KEYBYTES;
    sodium_bridge_crypto_aead_xsalsa20poly1305_nsecbytes: usize =>
        "crypto_aead_xsalsa20poly1305_nsecbytes" = aead::XSALSA20POLY1305_NSECBYTES;
    sodium_bridge_crypto_aead_xsalsa20poly1305_npubbytes: usize =>
        "crypto_aead_xsalsa20poly1305_npubbytes" = aead::XSALSA20POLY1305_NPUBBYTES;
    sodium_bridge_crypto_aead_xsalsa20poly1305_abytes: usize =>
        "crypto_aead_xsalsa20poly1305_abytes" = aead::XSALSA20POLY1305_ABYTES;

    sodium_bridge_crypto_box_seedbytes: usize =>
        "crypto_box_seedbytes" = crypto_box::SEEDBYTES;
    sodium_bridge_crypto_box_publickeybytes: usize =>
        "crypto_box_publickeybytes" = crypto_box::PUBLICKEYBYTES;
    sodium_bridge_crypto_box_secretkeybytes: usize =>
        "crypto_box_secretkeybytes" = crypto_box::SECRETKEYBYTES;
    sodium_bridge_crypto_box_noncebytes: usize =>
        "crypto_box_noncebytes" = crypto_box::NONCEBYTES;
    sodium_bridge_crypto_box_macbytes: usize =>
        "crypto_box_macbytes" = crypto_box::MACBYTES;
    sodium_bridge_crypto_box_beforenmbytes: usize =>
        "crypto_box_beforenmbytes" = crypto_box::BEFORENMBYTES;
    sodium_bridge_crypto_box_sealbytes: usize =>
        "crypto_box_sealbytes" = crypto_box::SEALBYTES;

    sodium_bridge_crypto_pwhash_alg_argon2i13: i32 =>
        "crypto_pwhash_alg_argon2i13" = pwhash::ALG_ARGON2I13;
    sodium_bridge_crypto_pwhash_alg_argon2id13: i32 =>
        "crypto_pwhash_alg_argon2id13" = pwhash::ALG_ARGON2ID13;
    sodium_bridge_crypto_pwhash_alg_default: i32 =>
        "crypto_pwhash_alg_default" = pwhash::ALG_DEFAULT;
    sodium_bridge_crypto_pwhash_bytes_min: usize =>
        "crypto_pwhash_bytes_min" = pwhash::BYTES_MIN;
    sodium_bridge_crypto_pwhash_saltbytes: usize =>
        "crypto_pwhash_saltbytes" = pwhash::SALTBYTES;
    sodium_bridge_crypto_pwhash_strbytes: usize =>
        "crypto_pwhash_strbytes" = pwhash::STRBYTES;
    sodium_bridge_crypto_pwhash_opslimit_min: u64 =>
        "crypto_pwhash_opslimit_min" = pwhash::OPSLIMIT_MIN;
    sodium_bridge_crypto_pwhash_memlimit_min: usize =>
        "crypto_pwhash_memlimit_min" = pwhash::MEMLIMIT_MIN;
    sodium_bridge_crypto_pwhash_opslimit_interactive: u64 =>
        "crypto_pwhash_opslimit_interactive" = pwhash::OPSLIMIT_INTERACTIVE;
    sodium_bridge_crypto_pwhash_memlimit_interactive: usize =>
        "crypto_pwhash_memlimit_interactive" = pwhash::MEMLIMIT_INTERACTIVE;
    sodium_bridge_crypto_pwhash_opslimit_moderate: u64 =>
        "crypto_pwhash_opslimit_moderate" = pwhash::OPSLIMIT_MODERATE;
    sodium_bridge_crypto_pwhash_memlimit_moderate: usize =>
        "crypto_pwhash_memlimit_moderate" = pwhash::MEMLIMIT_MODERATE;
    sodium_bridge_crypto_pwhash_opslimit_sensitive: u64 =>
        "crypto_pwhash_opslimit_sensitive" = pwhash::OPSLIMIT_SENSITIVE;
    sodium_bridge_crypto_pwhash_memlimit_sensitive: usize =>
        "crypto_pwhash_memlimit_sensitive" = pwhash::MEMLIMIT_SENSITIVE;

    sodium_bridge_crypto_pwhash_scryptsalsa208sha256_bytes_min: usize =>
        "crypto_pwhash_scryptsalsa208sha256_bytes_min" = scrypt::BYTES_MIN;
    sodium_bridge_crypto_pwhash_scryptsalsa208sha256_saltbytes: usize =>
        "crypto_pwhash_scryptsalsa208sha256_saltbytes" = scrypt::SALTBYTES;
    sodium_bridge_crypto_pwhash_scryptsalsa208sha256_strbytes: usize =>
        "crypto_pwhash_scryptsalsa208sha256_strbytes" = scrypt::STRBYTES;
    sodium_bridge_crypto_pwhash_scryptsalsa208sha256_opslimit_min: u64 =>
        "crypto_pwhash_scryptsalsa208sha256_opslimit_min" = scrypt::OPSLIMIT_MIN;
    sodium_bridge_crypto_pwhash_scryptsalsa208sha256_memlimit_min: usize =>
        "crypto_pwhash_scryptsalsa208sha256_memlimit_min" = scrypt::MEMLIMIT_MIN;
    sodium_bridge_crypto_pwhash_scryptsalsa208sha256_opslimit_interactive: u64 =>
        "crypto_pwhash_scryptsalsa208sha256_opslimit_interactive" = scrypt::OPSLIMIT_INTERACTIVE;
    sodium_bridge_crypto_pwhash_scryptsalsa208sha256_memlimit_interactive: usize =>
        "crypto_pwhash_scryptsalsa208sha256_memlimit_interactive" = scrypt::MEMLIMIT_INTERACTIVE;
    sodium_bridge_crypto_pwhash_scryptsalsa208sha256_opslimit_sensitive: u64 =>
        "crypto_pwhash_scryptsalsa208sha256_opslimit_sensitive" = scrypt::OPSLIMIT_SENSITIVE;
    sodium_bridge_crypto_pwhash_scryptsalsa208sha256_memlimit_sensitive: usize =>
        "crypto_pwhash_scryptsalsa208sha256_memlimit_sensitive" = scrypt::MEMLIMIT_SENSITIVE;
}

primitive_names! {
    sodium_bridge_crypto_box_primitive => crypto_box::PRIMITIVE;
    sodium_bridge_crypto_scalarmult_primitive => scalarmult::PRIMITIVE;
    sodium_bridge_crypto_pwhash_primitive => pwhash::PRIMITIVE;
}

/// Value of a size constant by its libsodium name
pub fn constant(name: &str) -> Option<i64> {
    CONSTANTS
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, value)| *value)
}
