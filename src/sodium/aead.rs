//! Detached-mode AEADs
//!
//! | Construction | Nonce | Associated data |
//! |--------------|-------|-----------------|
//! | ChaCha20-Poly1305 (original) | 8 | yes |
//! | ChaCha20-Poly1305 (IETF) | 12 | yes |
//! | XChaCha20-Poly1305 (IETF) | 24 | yes |
//! | XSalsa20-Poly1305 | 24 | must be empty |
//!
//! Every construction works in place: `buf` holds the plaintext on the way in
//! and the ciphertext on the way out (and the reverse for decryption). A
//! failed decryption zeroes `buf` so unauthenticated plaintext never escapes.

use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::ChaCha20Legacy;
use chacha20poly1305::aead::{AeadInPlace, KeyInit, Nonce, Tag};
use chacha20poly1305::{ChaCha20Poly1305, XChaCha20Poly1305};
use crypto_secretbox::XSalsa20Poly1305;
use poly1305::Poly1305;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, Zeroizing};

pub const CHACHA20POLY1305_KEYBYTES: usize = 32;
pub const CHACHA20POLY1305_NSECBYTES: usize = 0;
pub const CHACHA20POLY1305_NPUBBYTES: usize = 8;
pub const CHACHA20POLY1305_ABYTES: usize = 16;

pub const CHACHA20POLY1305_IETF_KEYBYTES: usize = 32;
pub const CHACHA20POLY1305_IETF_NSECBYTES: usize = 0;
pub const CHACHA20POLY1305_IETF_NPUBBYTES: usize = 12;
pub const CHACHA20POLY1305_IETF_ABYTES: usize = 16;

pub const XCHACHA20POLY1305_IETF_KEYBYTES: usize = 32;
pub const XCHACHA20POLY1305_IETF_NSECBYTES: usize = 0;
pub const XCHACHA20POLY1305_IETF_NPUBBYTES: usize = 24;
pub const XCHACHA20POLY1305_IETF_ABYTES: usize = 16;

pub const XSALSA20POLY1305_KEYBYTES: usize = 32;
pub const XSALSA20POLY1305_NSECBYTES: usize = 0;
pub const XSALSA20POLY1305_NPUBBYTES: usize = 24;
pub const XSALSA20POLY1305_ABYTES: usize = 16;

/// Tag length shared by every construction
pub const ABYTES: usize = 16;

/// Shared key length
pub const KEYBYTES: usize = 32;

fn seal<C: AeadInPlace + KeyInit>(
    buf: &mut [u8],
    mac: &mut [u8; ABYTES],
    ad: &[u8],
    nonce: &[u8],
    key: &[u8; KEYBYTES],
) -> i32 {
    let Ok(cipher) = C::new_from_slice(key) else {
        return -1;
    };
    match cipher.encrypt_in_place_detached(Nonce::<C>::from_slice(nonce), ad, buf) {
        Ok(tag) => {
            mac.copy_from_slice(tag.as_slice());
            0
        }
        Err(_) => -1,
    }
}

fn open<C: AeadInPlace + KeyInit>(
    buf: &mut [u8],
    mac: &[u8; ABYTES],
    ad: &[u8],
    nonce: &[u8],
    key: &[u8; KEYBYTES],
) -> i32 {
    let Ok(cipher) = C::new_from_slice(key) else {
        return -1;
    };
    match cipher.decrypt_in_place_detached(
        Nonce::<C>::from_slice(nonce),
        ad,
        buf,
        Tag::<C>::from_slice(mac),
    ) {
        Ok(()) => 0,
        Err(_) => {
            buf.zeroize();
            -1
        }
    }
}

/// `crypto_aead_chacha20poly1305_ietf_encrypt_detached`, in place
pub fn chacha20poly1305_ietf_encrypt_detached(
    buf: &mut [u8],
    mac: &mut [u8; ABYTES],
    ad: &[u8],
    npub: &[u8; CHACHA20POLY1305_IETF_NPUBBYTES],
    key: &[u8; KEYBYTES],
) -> i32 {
    seal::<ChaCha20Poly1305>(buf, mac, ad, npub, key)
}

/// `crypto_aead_chacha20poly1305_ietf_decrypt_detached`, in place
pub fn chacha20poly1305_ietf_decrypt_detached(
    buf: &mut [u8],
    mac: &[u8; ABYTES],
    ad: &[u8],
    npub: &[u8; CHACHA20POLY1305_IETF_NPUBBYTES],
    key: &[u8; KEYBYTES],
) -> i32 {
    open::<ChaCha20Poly1305>(buf, mac, ad, npub, key)
}

/// `crypto_aead_xchacha20poly1305_ietf_encrypt_detached`, in place
pub fn xchacha20poly1305_ietf_encrypt_detached(
    buf: &mut [u8],
    mac: &mut [u8; ABYTES],
    ad: &[u8],
    npub: &[u8; XCHACHA20POLY1305_IETF_NPUBBYTES],
    key: &[u8; KEYBYTES],
) -> i32 {
    seal::<XChaCha20Poly1305>(buf, mac, ad, npub, key)
}

/// `crypto_aead_xchacha20poly1305_ietf_decrypt_detached`, in place
pub fn xchacha20poly1305_ietf_decrypt_detached(
    buf: &mut [u8],
    mac: &[u8; ABYTES],
    ad: &[u8],
    npub: &[u8; XCHACHA20POLY1305_IETF_NPUBBYTES],
    key: &[u8; KEYBYTES],
) -> i32 {
    open::<XChaCha20Poly1305>(buf, mac, ad, npub, key)
}

/// ChaCha20 keystream position of the first ciphertext byte; block 0 keys
/// Poly1305
const LEGACY_BLOCK: usize = 64;

/// Poly1305 tag over `ad || le64(adlen) || c || le64(clen)` with the
/// one-time key taken from keystream block 0
fn legacy_tag(cipher: &mut ChaCha20Legacy, ad: &[u8], c: &[u8]) -> [u8; ABYTES] {
    let mut block0 = Zeroizing::new([0u8; LEGACY_BLOCK]);
    cipher.apply_keystream(&mut block0[..]);
    let mac = Poly1305::new(poly1305::Key::from_slice(&block0[..32]));

    let mut input = Vec::with_capacity(ad.len() + c.len() + 16);
    input.extend_from_slice(ad);
    input.extend_from_slice(&(ad.len() as u64).to_le_bytes());
    input.extend_from_slice(c);
    input.extend_from_slice(&(c.len() as u64).to_le_bytes());

    let mut tag = [0u8; ABYTES];
    tag.copy_from_slice(mac.compute_unpadded(&input).as_slice());
    tag
}

fn legacy_cipher(
    npub: &[u8; CHACHA20POLY1305_NPUBBYTES],
    key: &[u8; KEYBYTES],
) -> Option<ChaCha20Legacy> {
    ChaCha20Legacy::new_from_slices(key, npub).ok()
}

/// `crypto_aead_chacha20poly1305_encrypt_detached` (original construction,
/// 64-bit nonce), in place
pub fn chacha20poly1305_encrypt_detached(
    buf: &mut [u8],
    mac: &mut [u8; ABYTES],
    ad: &[u8],
    npub: &[u8; CHACHA20POLY1305_NPUBBYTES],
    key: &[u8; KEYBYTES],
) -> i32 {
    let (Some(mut cipher), Some(mut auth)) = (legacy_cipher(npub, key), legacy_cipher(npub, key))
    else {
        return -1;
    };
    let mut block0 = Zeroizing::new([0u8; LEGACY_BLOCK]);
    cipher.apply_keystream(&mut block0[..]);
    if cipher.try_apply_keystream(buf).is_err() {
        return -1;
    }
    *mac = legacy_tag(&mut auth, ad, buf);
    0
}

/// `crypto_aead_chacha20poly1305_decrypt_detached` (original construction,
/// 64-bit nonce), in place
pub fn chacha20poly1305_decrypt_detached(
    buf: &mut [u8],
    mac: &[u8; ABYTES],
    ad: &[u8],
    npub: &[u8; CHACHA20POLY1305_NPUBBYTES],
    key: &[u8; KEYBYTES],
) -> i32 {
    let Some(mut cipher) = legacy_cipher(npub, key) else {
        return -1;
    };
    let expected = legacy_tag(&mut cipher, ad, buf);
    if !bool::from(expected[..].ct_eq(&mac[..])) {
        buf.zeroize();
        return -1;
    }
    if cipher.try_apply_keystream(buf).is_err() {
        buf.zeroize();
        return -1;
    }
    0
}

/// `crypto_aead_xsalsa20poly1305_encrypt_detached`, in place. XSalsa20-Poly1305
/// authenticates no associated data: a non-empty `ad` returns `-1`.
pub fn xsalsa20poly1305_encrypt_detached(
    buf: &mut [u8],
    mac: &mut [u8; ABYTES],
    ad: &[u8],
    npub: &[u8; XSALSA20POLY1305_NPUBBYTES],
    key: &[u8; KEYBYTES],
) -> i32 {
    if !ad.is_empty() {
        return -1;
    }
    seal::<XSalsa20Poly1305>(buf, mac, &[], npub, key)
}

/// `crypto_aead_xsalsa20poly1305_decrypt_detached`, in place. A non-empty
/// `ad` fails like a bad tag.
pub fn xsalsa20poly1305_decrypt_detached(
    buf: &mut [u8],
    mac: &[u8; ABYTES],
    ad: &[u8],
    npub: &[u8; XSALSA20POLY1305_NPUBBYTES],
    key: &[u8; KEYBYTES],
) -> i32 {
    if !ad.is_empty() {
        buf.zeroize();
        return -1;
    }
    open::<XSalsa20Poly1305>(buf, mac, &[], npub, key)
}

/// `crypto_secretbox_detached`, shared with `crypto_box_seal`
pub(crate) fn secretbox_detached(
    buf: &mut [u8],
    mac: &mut [u8; ABYTES],
    nonce: &[u8; XSALSA20POLY1305_NPUBBYTES],
    key: &[u8; KEYBYTES],
) -> i32 {
    seal::<XSalsa20Poly1305>(buf, mac, &[], nonce, key)
}

/// `crypto_secretbox_open_detached`, shared with `crypto_box_seal_open`
pub(crate) fn secretbox_open_detached(
    buf: &mut [u8],
    mac: &[u8; ABYTES],
    nonce: &[u8; XSALSA20POLY1305_NPUBBYTES],
    key: &[u8; KEYBYTES],
) -> i32 {
    open::<XSalsa20Poly1305>(buf, mac, &[], nonce, key)
}
