//! Frame-to-facade glue
//!
//! Each function reads its arguments out of a [`Frame`] in signature order,
//! checks sizes, and calls the matching [`crate::sodium`] function. Any
//! argument that is absent or too short makes the call return `-1` before
//! the primitive runs.
//!
//! Fixed-size inputs (keys, nonces, tags) are copied onto the stack, so they
//! may alias anything. Variable-length inputs are borrowed in place unless
//! they share bytes with the output window, in which case they are copied.

use std::borrow::Cow;

use zeroize::{Zeroize, Zeroizing};

use crate::adapter::{Arg, Frame};
use crate::sodium::{aead, crypto_box, hsalsa20, pwhash, randombytes, scalarmult, scrypt};
use crate::status::{FAILURE, SUCCESS};

type SealFn<const NPUB: usize> =
    fn(&mut [u8], &mut [u8; aead::ABYTES], &[u8], &[u8; NPUB], &[u8; aead::KEYBYTES]) -> i32;

type OpenFn<const NPUB: usize> =
    fn(&mut [u8], &[u8; aead::ABYTES], &[u8], &[u8; NPUB], &[u8; aead::KEYBYTES]) -> i32;

/// Borrow `src`, or copy it when it overlaps `dst`.
///
/// # Safety
///
/// `src` must not be written while the borrow is alive, except through
/// `dst` when the two overlap (then the copy is returned).
unsafe fn read_around<'c>(src: &Arg<'c>, dst: &Arg<'_>) -> Cow<'c, [u8]> {
    let bytes = src.as_slice();
    if src.overlaps(dst) {
        Cow::Owned(bytes.to_vec())
    } else {
        Cow::Borrowed(bytes)
    }
}

fn wipe(bytes: Cow<'_, [u8]>) {
    if let Cow::Owned(mut copy) = bytes {
        copy.zeroize();
    }
}

pub(super) fn core_hsalsa20(frame: &Frame<'_>, _scalars: &[i64]) -> i32 {
    let (out, input, k, c) = (frame.arg(0), frame.arg(1), frame.arg(2), frame.arg(3));
    if out.len() < hsalsa20::OUTPUTBYTES {
        return FAILURE;
    }
    let (Some(input), Some(key)) = (
        input.read_array::<{ hsalsa20::INPUTBYTES }>(),
        k.read_array::<{ hsalsa20::KEYBYTES }>(),
    ) else {
        return FAILURE;
    };
    let key = Zeroizing::new(key);

    let constant = if c.is_absent() {
        None
    } else {
        match c.read_array::<{ hsalsa20::CONSTBYTES }>() {
            Some(constant) => Some(constant),
            None => return FAILURE,
        }
    };

    let mut derived = Zeroizing::new([0u8; hsalsa20::OUTPUTBYTES]);
    let status = hsalsa20::hsalsa20(&mut derived, &input, &key, constant.as_ref());
    if status == SUCCESS {
        out.write_prefix(&derived[..]);
    }
    status
}

pub(super) fn scalarmult_curve25519(frame: &Frame<'_>, _scalars: &[i64]) -> i32 {
    let (q, n, p) = (frame.arg(0), frame.arg(1), frame.arg(2));
    if q.len() < scalarmult::BYTES {
        return FAILURE;
    }
    let (Some(n), Some(p)) = (
        n.read_array::<{ scalarmult::SCALARBYTES }>(),
        p.read_array::<{ scalarmult::BYTES }>(),
    ) else {
        return FAILURE;
    };
    let n = Zeroizing::new(n);

    let mut shared = Zeroizing::new([0u8; scalarmult::BYTES]);
    let status = scalarmult::curve25519(&mut shared, &n, &p);
    q.write_prefix(&shared[..]);
    status
}

pub(super) fn scalarmult_curve25519_base(frame: &Frame<'_>, _scalars: &[i64]) -> i32 {
    let (q, n) = (frame.arg(0), frame.arg(1));
    if q.len() < scalarmult::BYTES {
        return FAILURE;
    }
    let Some(n) = n.read_array::<{ scalarmult::SCALARBYTES }>() else {
        return FAILURE;
    };
    let n = Zeroizing::new(n);

    let mut public = [0u8; scalarmult::BYTES];
    let status = scalarmult::curve25519_base(&mut public, &n);
    q.write_prefix(&public);
    status
}

fn aead_encrypt<const NPUB: usize>(frame: &Frame<'_>, seal: SealFn<NPUB>) -> i32 {
    let (c, mac, m, ad, npub, k) = (
        frame.arg(0),
        frame.arg(1),
        frame.arg(2),
        frame.arg(3),
        frame.arg(4),
        frame.arg(5),
    );
    let mlen = m.len();
    if c.len() < mlen || mac.len() < aead::ABYTES {
        return FAILURE;
    }
    let (Some(nonce), Some(key)) = (
        npub.read_array::<NPUB>(),
        k.read_array::<{ aead::KEYBYTES }>(),
    ) else {
        return FAILURE;
    };
    let key = Zeroizing::new(key);

    let dst = c.prefix(mlen);
    // Safety: ad is copied if the ciphertext window covers it
    let ad = unsafe { read_around(&ad, &dst) };
    if !dst.copy_from(&m, mlen) {
        return FAILURE;
    }

    let mut tag = [0u8; aead::ABYTES];
    // Safety: nothing else touches the ciphertext window during the call
    let status = seal(unsafe { dst.as_mut_slice() }, &mut tag, &ad, &nonce, &key);
    drop(ad);

    if status == SUCCESS {
        mac.write_prefix(&tag);
    }
    status
}

fn aead_decrypt<const NPUB: usize>(frame: &Frame<'_>, open: OpenFn<NPUB>) -> i32 {
    let (m, c, mac, ad, npub, k) = (
        frame.arg(0),
        frame.arg(1),
        frame.arg(2),
        frame.arg(3),
        frame.arg(4),
        frame.arg(5),
    );
    let clen = c.len();
    if m.len() < clen {
        return FAILURE;
    }
    let (Some(tag), Some(nonce), Some(key)) = (
        mac.read_array::<{ aead::ABYTES }>(),
        npub.read_array::<NPUB>(),
        k.read_array::<{ aead::KEYBYTES }>(),
    ) else {
        return FAILURE;
    };
    let key = Zeroizing::new(key);

    let dst = m.prefix(clen);
    // Safety: ad is copied if the plaintext window covers it
    let ad = unsafe { read_around(&ad, &dst) };
    if !dst.copy_from(&c, clen) {
        return FAILURE;
    }

    // Safety: nothing else touches the plaintext window during the call
    open(unsafe { dst.as_mut_slice() }, &tag, &ad, &nonce, &key)
}

pub(super) fn chacha20poly1305_encrypt(frame: &Frame<'_>, _scalars: &[i64]) -> i32 {
    aead_encrypt::<{ aead::CHACHA20POLY1305_NPUBBYTES }>(
        frame,
        aead::chacha20poly1305_encrypt_detached,
    )
}

pub(super) fn chacha20poly1305_decrypt(frame: &Frame<'_>, _scalars: &[i64]) -> i32 {
    aead_decrypt::<{ aead::CHACHA20POLY1305_NPUBBYTES }>(
        frame,
        aead::chacha20poly1305_decrypt_detached,
    )
}

pub(super) fn chacha20poly1305_ietf_encrypt(frame: &Frame<'_>, _scalars: &[i64]) -> i32 {
    aead_encrypt::<{ aead::CHACHA20POLY1305_IETF_NPUBBYTES }>(
        frame,
        aead::chacha20poly1305_ietf_encrypt_detached,
    )
}

pub(super) fn chacha20poly1305_ietf_decrypt(frame: &Frame<'_>, _scalars: &[i64]) -> i32 {
    aead_decrypt::<{ aead::CHACHA20POLY1305_IETF_NPUBBYTES }>(
        frame,
        aead::chacha20poly1305_ietf_decrypt_detached,
    )
}

pub(super) fn xchacha20poly1305_ietf_encrypt(frame: &Frame<'_>, _scalars: &[i64]) -> i32 {
    aead_encrypt::<{ aead::XCHACHA20POLY1305_IETF_NPUBBYTES }>(
        frame,
        aead::xchacha20poly1305_ietf_encrypt_detached,
    )
}

pub(super) fn xchacha20poly1305_ietf_decrypt(frame: &Frame<'_>, _scalars: &[i64]) -> i32 {
    aead_decrypt::<{ aead::XCHACHA20POLY1305_IETF_NPUBBYTES }>(
        frame,
        aead::xchacha20poly1305_ietf_decrypt_detached,
    )
}

pub(super) fn xsalsa20poly1305_encrypt(frame: &Frame<'_>, _scalars: &[i64]) -> i32 {
    aead_encrypt::<{ aead::XSALSA20POLY1305_NPUBBYTES }>(
        frame,
        aead::xsalsa20poly1305_encrypt_detached,
    )
}

pub(super) fn xsalsa20poly1305_decrypt(frame: &Frame<'_>, _scalars: &[i64]) -> i32 {
    aead_decrypt::<{ aead::XSALSA20POLY1305_NPUBBYTES }>(
        frame,
        aead::xsalsa20poly1305_decrypt_detached,
    )
}

fn write_keypair<F>(pk: &Arg<'_>, sk: &Arg<'_>, generate: F) -> i32
where
    F: FnOnce(&mut [u8; crypto_box::PUBLICKEYBYTES], &mut [u8; crypto_box::SECRETKEYBYTES]) -> i32,
{
    if pk.len() < crypto_box::PUBLICKEYBYTES || sk.len() < crypto_box::SECRETKEYBYTES {
        return FAILURE;
    }
    let mut public = [0u8; crypto_box::PUBLICKEYBYTES];
    let mut secret = Zeroizing::new([0u8; crypto_box::SECRETKEYBYTES]);
    let status = generate(&mut public, &mut *secret);
    if status == SUCCESS {
        pk.write_prefix(&public);
        sk.write_prefix(&secret[..]);
    }
    status
}

pub(super) fn box_keypair(frame: &Frame<'_>, _scalars: &[i64]) -> i32 {
    let (pk, sk) = (frame.arg(0), frame.arg(1));
    write_keypair(&pk, &sk, crypto_box::keypair)
}

pub(super) fn box_seed_keypair(frame: &Frame<'_>, _scalars: &[i64]) -> i32 {
    let (pk, sk, seed) = (frame.arg(0), frame.arg(1), frame.arg(2));
    let Some(seed) = seed.read_array::<{ crypto_box::SEEDBYTES }>() else {
        return FAILURE;
    };
    let seed = Zeroizing::new(seed);
    write_keypair(&pk, &sk, |pk, sk| crypto_box::seed_keypair(pk, sk, &seed))
}

pub(super) fn box_seal(frame: &Frame<'_>, _scalars: &[i64]) -> i32 {
    let (c, m, pk) = (frame.arg(0), frame.arg(1), frame.arg(2));
    let Some(pk) = pk.read_array::<{ crypto_box::PUBLICKEYBYTES }>() else {
        return FAILURE;
    };
    if m.is_absent() || c.is_absent() {
        return FAILURE;
    }

    // Safety: m is copied if the sealed output covers it
    let m = unsafe { read_around(&m, &c) };
    // Safety: nothing else touches the output window during the call
    let status = crypto_box::seal(unsafe { c.as_mut_slice() }, &m, &pk);
    wipe(m);
    status
}

pub(super) fn box_seal_open(frame: &Frame<'_>, _scalars: &[i64]) -> i32 {
    let (m, c, pk, sk) = (frame.arg(0), frame.arg(1), frame.arg(2), frame.arg(3));
    let (Some(pk), Some(sk)) = (
        pk.read_array::<{ crypto_box::PUBLICKEYBYTES }>(),
        sk.read_array::<{ crypto_box::SECRETKEYBYTES }>(),
    ) else {
        return FAILURE;
    };
    let sk = Zeroizing::new(sk);
    if m.is_absent() || c.is_absent() {
        return FAILURE;
    }

    // Safety: c is copied if the plaintext window covers it
    let c = unsafe { read_around(&c, &m) };
    // Safety: nothing else touches the plaintext window during the call
    crypto_box::seal_open(unsafe { m.as_mut_slice() }, &c, &pk, &sk)
}

pub(super) fn randombytes_buf(frame: &Frame<'_>, _scalars: &[i64]) -> i32 {
    // Safety: the only argument, written only here
    randombytes::buf(unsafe { frame.arg(0).as_mut_slice() });
    SUCCESS
}

pub(super) fn crypto_pwhash(frame: &Frame<'_>, scalars: &[i64]) -> i32 {
    let (out, passwd, salt) = (frame.arg(0), frame.arg(1), frame.arg(2));
    let (Some(&ops), Some(&mem)) = (scalars.first(), scalars.get(1)) else {
        return FAILURE;
    };
    let (Ok(opslimit), Ok(memlimit)) = (u64::try_from(ops), usize::try_from(mem)) else {
        return FAILURE;
    };
    let Some(salt) = salt.read_array::<{ pwhash::SALTBYTES }>() else {
        return FAILURE;
    };

    // Safety: passwd is copied if the output window covers it
    let passwd = unsafe { read_around(&passwd, &out) };
    // Safety: nothing else touches the output window during the call
    let status = pwhash::pwhash(
        unsafe { out.as_mut_slice() },
        &passwd,
        &salt,
        opslimit,
        memlimit,
        pwhash::ALG_DEFAULT,
    );
    wipe(passwd);
    status
}

pub(super) fn pwhash_scryptsalsa208sha256(frame: &Frame<'_>, scalars: &[i64]) -> i32 {
    let (out, passwd, salt) = (frame.arg(0), frame.arg(1), frame.arg(2));
    let (Some(&ops), Some(&mem)) = (scalars.first(), scalars.get(1)) else {
        return FAILURE;
    };
    let (Ok(opslimit), Ok(memlimit)) = (u64::try_from(ops), usize::try_from(mem)) else {
        return FAILURE;
    };
    let Some(salt) = salt.read_array::<{ scrypt::SALTBYTES }>() else {
        return FAILURE;
    };

    // Safety: passwd is copied if the output window covers it
    let passwd = unsafe { read_around(&passwd, &out) };
    // Safety: nothing else touches the output window during the call
    let status = scrypt::pwhash(unsafe { out.as_mut_slice() }, &passwd, &salt, opslimit, memlimit);
    wipe(passwd);
    status
}
