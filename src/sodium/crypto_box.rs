//! Curve25519-XSalsa20-Poly1305 public-key boxes
//!
//! Only key generation and anonymous sealed boxes are exposed. A sealed box
//! is `epk || mac || ciphertext`: an ephemeral public key, then a secretbox
//! under the key shared between the ephemeral secret and the recipient,
//! with nonce `Blake2b-192(epk || pk)`.

use blake2::digest::consts::U24;
use blake2::{Blake2b, Digest};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha512;
use zeroize::{Zeroize, Zeroizing};

use super::{aead, hsalsa20, scalarmult};

/// Name reported by `crypto_box_primitive`
pub const PRIMITIVE: &str = "curve25519xsalsa20poly1305";

pub const SEEDBYTES: usize = 32;
pub const PUBLICKEYBYTES: usize = 32;
pub const SECRETKEYBYTES: usize = 32;
pub const NONCEBYTES: usize = 24;
pub const MACBYTES: usize = 16;
pub const BEFORENMBYTES: usize = 32;
pub const SEALBYTES: usize = PUBLICKEYBYTES + MACBYTES;

type Blake2b192 = Blake2b<U24>;

/// `crypto_box_keypair`: fresh secret key from the system random source
pub fn keypair(pk: &mut [u8; PUBLICKEYBYTES], sk: &mut [u8; SECRETKEYBYTES]) -> i32 {
    OsRng.fill_bytes(sk);
    scalarmult::curve25519_base(pk, sk)
}

/// `crypto_box_seed_keypair`: the secret key is the first half of
/// `SHA-512(seed)`
pub fn seed_keypair(
    pk: &mut [u8; PUBLICKEYBYTES],
    sk: &mut [u8; SECRETKEYBYTES],
    seed: &[u8; SEEDBYTES],
) -> i32 {
    let mut hash = Sha512::digest(seed);
    sk.copy_from_slice(&hash[..SECRETKEYBYTES]);
    hash.as_mut_slice().zeroize();
    scalarmult::curve25519_base(pk, sk)
}

/// `crypto_box_beforenm`: HSalsa20 of the X25519 shared secret.
/// `-1` for a low-order public key.
pub fn beforenm(
    k: &mut [u8; BEFORENMBYTES],
    pk: &[u8; PUBLICKEYBYTES],
    sk: &[u8; SECRETKEYBYTES],
) -> i32 {
    let mut shared = Zeroizing::new([0u8; scalarmult::BYTES]);
    if scalarmult::curve25519(&mut shared, sk, pk) != 0 {
        return -1;
    }
    hsalsa20::hsalsa20(k, &[0u8; hsalsa20::INPUTBYTES], &shared, None)
}

fn seal_nonce(epk: &[u8; PUBLICKEYBYTES], pk: &[u8; PUBLICKEYBYTES]) -> [u8; NONCEBYTES] {
    let mut hasher = Blake2b192::new();
    hasher.update(epk);
    hasher.update(pk);
    let mut nonce = [0u8; NONCEBYTES];
    nonce.copy_from_slice(&hasher.finalize());
    nonce
}

/// `crypto_box_seal`: encrypt `m` for `pk` into `c[..m.len() + SEALBYTES]`.
/// `-1` when `c` is too short.
pub fn seal(c: &mut [u8], m: &[u8], pk: &[u8; PUBLICKEYBYTES]) -> i32 {
    let Some(clen) = m.len().checked_add(SEALBYTES) else {
        return -1;
    };
    if c.len() < clen {
        return -1;
    }

    let mut epk = [0u8; PUBLICKEYBYTES];
    let mut esk = Zeroizing::new([0u8; SECRETKEYBYTES]);
    keypair(&mut epk, &mut esk);

    let mut key = Zeroizing::new([0u8; BEFORENMBYTES]);
    if beforenm(&mut key, pk, &esk) != 0 {
        return -1;
    }
    let nonce = seal_nonce(&epk, pk);

    let (header, body) = c[..clen].split_at_mut(SEALBYTES);
    body.copy_from_slice(m);
    let mut mac = [0u8; MACBYTES];
    let status = aead::secretbox_detached(body, &mut mac, &nonce, &key);
    if status != 0 {
        body.zeroize();
        return status;
    }
    header[..PUBLICKEYBYTES].copy_from_slice(&epk);
    header[PUBLICKEYBYTES..].copy_from_slice(&mac);
    0
}

/// `crypto_box_seal_open`: decrypt `c` into `m[..c.len() - SEALBYTES]`.
/// `-1` when `c` is shorter than [`SEALBYTES`], `m` is too short, or the
/// box does not authenticate (then the plaintext window is zeroed).
pub fn seal_open(
    m: &mut [u8],
    c: &[u8],
    pk: &[u8; PUBLICKEYBYTES],
    sk: &[u8; SECRETKEYBYTES],
) -> i32 {
    let Some(mlen) = c.len().checked_sub(SEALBYTES) else {
        return -1;
    };
    if m.len() < mlen {
        return -1;
    }

    let mut epk = [0u8; PUBLICKEYBYTES];
    epk.copy_from_slice(&c[..PUBLICKEYBYTES]);
    let mut mac = [0u8; MACBYTES];
    mac.copy_from_slice(&c[PUBLICKEYBYTES..SEALBYTES]);

    let mut key = Zeroizing::new([0u8; BEFORENMBYTES]);
    if beforenm(&mut key, &epk, sk) != 0 {
        return -1;
    }
    let nonce = seal_nonce(&epk, pk);

    let body = &mut m[..mlen];
    body.copy_from_slice(&c[SEALBYTES..]);
    aead::secretbox_open_detached(body, &mac, &nonce, &key)
}
