//! Integration tests for the primitive catalog
//!
//! Known-answer vectors pushed through the full resolve/call/release path,
//! with direct buffers, pinned windows and mixes of both.

use sodium_bridge::sodium::{aead, crypto_box, pwhash, scrypt};
use sodium_bridge::status::{ABSENT_REQUIRED, FAILURE, SUCCESS};
use sodium_bridge::{AbsentPolicy, Handle, Invoker, ManagedHeap, PrimitiveId};

// RFC 7748 section 6.1
const ALICE_SK: &str = "77076d0a7318a57d3c16c17251b26645df4c2f87ebc0992ab177fba51db92c2a";
const ALICE_PK: &str = "8520f0098930a754748b7ddcb43ef75a0dbf3a0d26381af4eba4a98eaa9b4e6a";
const BOB_SK: &str = "5dab087e624a8a4b79e17f8b83800ee66f3bb1292618b6fd1c2f8b27ff88e0eb";
const BOB_PK: &str = "de9edb7d7b7dc1b4d35b61c2ece435373f8343c85b78674dadfc7e146f882b4f";
const SHARED: &str = "4a5d9d5ba4ce2de1728e3bf480350f25e07e21c947d19e3376f09b3c1e161742";

// crypto_box_beforenm of the keys above
const BEFORENM: &str = "1b27556473e985d462cd51197a9a46c76009549eac6474f206c4ee0844f68389";

/// Helper to put bytes in a pinned window at `offset` inside padding
fn pinned(heap: &ManagedHeap, bytes: &[u8], offset: usize) -> (Handle, Handle) {
    let mut backing = vec![0xCC; offset + bytes.len() + 5];
    backing[offset..offset + bytes.len()].copy_from_slice(bytes);
    let array = heap.new_array(&backing);
    let buffer = heap.wrap(array, offset, bytes.len()).unwrap();
    (array, buffer)
}

/// Helper to call a primitive and unwrap the environment result
fn call(heap: &ManagedHeap, id: PrimitiveId, handles: &[Option<&Handle>]) -> i32 {
    Invoker::new(heap)
        .call(id, handles, &[])
        .unwrap_or_else(|err| panic!("{} failed: {}", id, err))
}

fn unhex(s: &str) -> Vec<u8> {
    hex::decode(s).unwrap()
}

// === HSalsa20 ===

#[test]
fn test_hsalsa20_direct_buffers() {
    let heap = ManagedHeap::new();
    let out = heap.allocate_direct(32);
    let input = heap.direct_from(&[0u8; 16]);
    let key = heap.direct_from(&unhex(SHARED));

    let status = call(
        &heap,
        PrimitiveId::CoreHsalsa20,
        &[Some(&out), Some(&input), Some(&key), None],
    );
    assert_eq!(status, SUCCESS);
    assert_eq!(hex::encode(heap.read(out).unwrap()), BEFORENM);
}

#[test]
fn test_hsalsa20_pinned_with_sigma() {
    let heap = ManagedHeap::new();
    let (out_array, out) = pinned(&heap, &[0u8; 32], 8);
    let (_, input) = pinned(&heap, &[0u8; 16], 3);
    let (_, key) = pinned(&heap, &unhex(SHARED), 1);
    let sigma = heap.direct_from(b"expand 32-byte k");

    let status = call(
        &heap,
        PrimitiveId::CoreHsalsa20,
        &[Some(&out), Some(&input), Some(&key), Some(&sigma)],
    );
    assert_eq!(status, SUCCESS);

    let backing = heap.read(out_array).unwrap();
    assert_eq!(&backing[..8], &[0xCC; 8]);
    assert_eq!(hex::encode(&backing[8..40]), BEFORENM);
    assert_eq!(&backing[40..], &[0xCC; 5]);
    assert_eq!(heap.stats().pins_outstanding, 0);
}

#[test]
fn test_hsalsa20_custom_constant_rejected() {
    let heap = ManagedHeap::new();
    let out = heap.allocate_direct(32);
    let input = heap.allocate_direct(16);
    let key = heap.allocate_direct(32);
    let constant = heap.direct_from(&[7u8; 16]);

    let status = call(
        &heap,
        PrimitiveId::CoreHsalsa20,
        &[Some(&out), Some(&input), Some(&key), Some(&constant)],
    );
    assert_eq!(status, FAILURE);
    assert_eq!(heap.read(out).unwrap(), vec![0u8; 32]);
}

// === X25519 ===

#[test]
fn test_scalarmult_base_vectors() {
    let heap = ManagedHeap::new();
    for (sk, pk) in [(ALICE_SK, ALICE_PK), (BOB_SK, BOB_PK)] {
        let q = heap.allocate_direct(32);
        let (_, n) = pinned(&heap, &unhex(sk), 4);
        let status = call(&heap, PrimitiveId::ScalarmultCurve25519Base, &[Some(&q), Some(&n)]);
        assert_eq!(status, SUCCESS);
        assert_eq!(hex::encode(heap.read(q).unwrap()), pk);
    }
}

#[test]
fn test_scalarmult_shared_secret_both_ways() {
    let heap = ManagedHeap::new();

    let (q_array, q) = pinned(&heap, &[0u8; 32], 8);
    let alice_sk = heap.direct_from(&unhex(ALICE_SK));
    let (_, bob_pk) = pinned(&heap, &unhex(BOB_PK), 0);
    let status = call(
        &heap,
        PrimitiveId::ScalarmultCurve25519,
        &[Some(&q), Some(&alice_sk), Some(&bob_pk)],
    );
    assert_eq!(status, SUCCESS);
    assert_eq!(hex::encode(&heap.read(q_array).unwrap()[8..40]), SHARED);

    let q2 = heap.allocate_direct(32);
    let (_, bob_sk) = pinned(&heap, &unhex(BOB_SK), 2);
    let alice_pk = heap.direct_from(&unhex(ALICE_PK));
    let status = call(
        &heap,
        PrimitiveId::ScalarmultCurve25519,
        &[Some(&q2), Some(&bob_sk), Some(&alice_pk)],
    );
    assert_eq!(status, SUCCESS);
    assert_eq!(hex::encode(heap.read(q2).unwrap()), SHARED);
}

#[test]
fn test_scalarmult_low_order_point() {
    let heap = ManagedHeap::new();
    let q = heap.allocate_direct(32);
    let n = heap.direct_from(&unhex(ALICE_SK));
    let p = heap.allocate_direct(32);

    let status = call(&heap, PrimitiveId::ScalarmultCurve25519, &[Some(&q), Some(&n), Some(&p)]);
    assert_eq!(status, FAILURE);
}

#[test]
fn test_scalarmult_short_output() {
    let heap = ManagedHeap::new();
    let (array, q) = pinned(&heap, &[0u8; 31], 0);
    let n = heap.direct_from(&unhex(ALICE_SK));

    let status = call(&heap, PrimitiveId::ScalarmultCurve25519Base, &[Some(&q), Some(&n)]);
    assert_eq!(status, FAILURE);
    assert_eq!(&heap.read(array).unwrap()[..31], &[0u8; 31]);
}

// === AEAD ===

fn aead_round_trip(encrypt: PrimitiveId, decrypt: PrimitiveId, npub_len: usize) {
    let heap = ManagedHeap::new();
    let message = b"the quick brown fox jumps over the lazy dog";
    let key = heap.direct_from(&[0x42; aead::KEYBYTES]);
    let (_, npub) = pinned(&heap, &vec![0x24; npub_len], 3);
    let ad = heap.direct_from(b"header");

    let (_, m) = pinned(&heap, message, 8);
    let c = heap.allocate_direct(message.len());
    let mac = heap.allocate_direct(aead::ABYTES);

    let status = call(
        &heap,
        encrypt,
        &[Some(&c), Some(&mac), Some(&m), Some(&ad), Some(&npub), Some(&key)],
    );
    assert_eq!(status, SUCCESS);
    assert_ne!(heap.read(c).unwrap(), message.to_vec());

    let (plain_array, plain) = pinned(&heap, &vec![0u8; message.len()], 8);
    let status = call(
        &heap,
        decrypt,
        &[Some(&plain), Some(&c), Some(&mac), Some(&ad), Some(&npub), Some(&key)],
    );
    assert_eq!(status, SUCCESS);
    assert_eq!(heap.read(plain).unwrap(), message.to_vec());
    assert_eq!(&heap.read(plain_array).unwrap()[..8], &[0xCC; 8]);

    // Tampered tag: failure and a zeroed destination
    let mut tag = heap.read(mac).unwrap();
    tag[0] ^= 0x80;
    heap.write(mac, &tag).unwrap();
    let status = call(
        &heap,
        decrypt,
        &[Some(&plain), Some(&c), Some(&mac), Some(&ad), Some(&npub), Some(&key)],
    );
    assert_eq!(status, FAILURE);
    assert_eq!(heap.read(plain).unwrap(), vec![0u8; message.len()]);
    assert_eq!(heap.stats().pins_outstanding, 0);
}

#[test]
fn test_chacha20poly1305_ietf_round_trip() {
    aead_round_trip(
        PrimitiveId::ChaCha20Poly1305IetfEncryptDetached,
        PrimitiveId::ChaCha20Poly1305IetfDecryptDetached,
        aead::CHACHA20POLY1305_IETF_NPUBBYTES,
    );
}

#[test]
fn test_xchacha20poly1305_ietf_round_trip() {
    aead_round_trip(
        PrimitiveId::XChaCha20Poly1305IetfEncryptDetached,
        PrimitiveId::XChaCha20Poly1305IetfDecryptDetached,
        aead::XCHACHA20POLY1305_IETF_NPUBBYTES,
    );
}

#[test]
fn test_chacha20poly1305_original_round_trip() {
    aead_round_trip(
        PrimitiveId::ChaCha20Poly1305EncryptDetached,
        PrimitiveId::ChaCha20Poly1305DecryptDetached,
        aead::CHACHA20POLY1305_NPUBBYTES,
    );
}

#[test]
fn test_xsalsa20poly1305_without_associated_data() {
    let heap = ManagedHeap::new();
    let message = b"no header for this one";
    let key = heap.direct_from(&[7; aead::XSALSA20POLY1305_KEYBYTES]);
    let (_, npub) = pinned(&heap, &[9; aead::XSALSA20POLY1305_NPUBBYTES], 4);
    let m = heap.direct_from(message);
    let c = heap.allocate_direct(message.len());
    let mac = heap.allocate_direct(aead::XSALSA20POLY1305_ABYTES);

    let status = call(
        &heap,
        PrimitiveId::XSalsa20Poly1305EncryptDetached,
        &[Some(&c), Some(&mac), Some(&m), None, Some(&npub), Some(&key)],
    );
    assert_eq!(status, SUCCESS);

    let (_, plain) = pinned(&heap, &vec![0u8; message.len()], 2);
    let status = call(
        &heap,
        PrimitiveId::XSalsa20Poly1305DecryptDetached,
        &[Some(&plain), Some(&c), Some(&mac), None, Some(&npub), Some(&key)],
    );
    assert_eq!(status, SUCCESS);
    assert_eq!(heap.read(plain).unwrap(), message.to_vec());

    // Associated data is not supported by this construction
    let ad = heap.direct_from(b"header");
    let status = call(
        &heap,
        PrimitiveId::XSalsa20Poly1305EncryptDetached,
        &[Some(&c), Some(&mac), Some(&m), Some(&ad), Some(&npub), Some(&key)],
    );
    assert_eq!(status, FAILURE);
}

#[test]
fn test_aead_in_place_same_handle() {
    let heap = ManagedHeap::new();
    let message = b"in-place message";
    let key = heap.direct_from(&[1; aead::KEYBYTES]);
    let npub = heap.direct_from(&[2; aead::XCHACHA20POLY1305_IETF_NPUBBYTES]);
    let mac = heap.allocate_direct(aead::ABYTES);
    let (array, buf) = pinned(&heap, message, 8);

    let status = call(
        &heap,
        PrimitiveId::XChaCha20Poly1305IetfEncryptDetached,
        &[Some(&buf), Some(&mac), Some(&buf), None, Some(&npub), Some(&key)],
    );
    assert_eq!(status, SUCCESS);
    let ciphertext = heap.read(buf).unwrap();
    assert_ne!(ciphertext, message.to_vec());

    let status = call(
        &heap,
        PrimitiveId::XChaCha20Poly1305IetfDecryptDetached,
        &[Some(&buf), Some(&buf), Some(&mac), None, Some(&npub), Some(&key)],
    );
    assert_eq!(status, SUCCESS);
    assert_eq!(heap.read(buf).unwrap(), message.to_vec());
    assert_eq!(&heap.read(array).unwrap()[..8], &[0xCC; 8]);
}

#[test]
fn test_aead_missing_nonce() {
    let heap = ManagedHeap::new();
    let key = heap.direct_from(&[1; aead::KEYBYTES]);
    let mac = heap.allocate_direct(aead::ABYTES);
    let m = heap.direct_from(b"msg");
    let c = heap.allocate_direct(3);

    let status = call(
        &heap,
        PrimitiveId::ChaCha20Poly1305IetfEncryptDetached,
        &[Some(&c), Some(&mac), Some(&m), None, None, Some(&key)],
    );
    assert_eq!(status, FAILURE);
}

// === crypto_box ===

#[test]
fn test_box_seed_keypair_matches_facade() {
    let heap = ManagedHeap::new();
    let seed = [0x33; crypto_box::SEEDBYTES];
    let pk = heap.allocate_direct(crypto_box::PUBLICKEYBYTES);
    let (sk_array, sk) = pinned(&heap, &[0u8; crypto_box::SECRETKEYBYTES], 8);
    let (_, seed_handle) = pinned(&heap, &seed, 1);

    let status = call(
        &heap,
        PrimitiveId::BoxSeedKeypair,
        &[Some(&pk), Some(&sk), Some(&seed_handle)],
    );
    assert_eq!(status, SUCCESS);

    let (mut expected_pk, mut expected_sk) = ([0u8; 32], [0u8; 32]);
    assert_eq!(crypto_box::seed_keypair(&mut expected_pk, &mut expected_sk, &seed), 0);
    assert_eq!(heap.read(pk).unwrap(), expected_pk.to_vec());
    assert_eq!(heap.read(sk).unwrap(), expected_sk.to_vec());
    assert_eq!(&heap.read(sk_array).unwrap()[..8], &[0xCC; 8]);
}

#[test]
fn test_box_seal_pinned_round_trip() {
    let heap = ManagedHeap::new();
    let message = b"anonymous sender";
    let pk = heap.allocate_direct(crypto_box::PUBLICKEYBYTES);
    let sk = heap.allocate_direct(crypto_box::SECRETKEYBYTES);
    assert_eq!(call(&heap, PrimitiveId::BoxKeypair, &[Some(&pk), Some(&sk)]), SUCCESS);

    let (_, m) = pinned(&heap, message, 6);
    let (c_array, c) = pinned(&heap, &vec![0u8; message.len() + crypto_box::SEALBYTES], 8);
    assert_eq!(call(&heap, PrimitiveId::BoxSeal, &[Some(&c), Some(&m), Some(&pk)]), SUCCESS);
    assert_eq!(&heap.read(c_array).unwrap()[..8], &[0xCC; 8]);

    let opened = heap.allocate_direct(message.len());
    let status = call(
        &heap,
        PrimitiveId::BoxSealOpen,
        &[Some(&opened), Some(&c), Some(&pk), Some(&sk)],
    );
    assert_eq!(status, SUCCESS);
    assert_eq!(heap.read(opened).unwrap(), message.to_vec());

    // Tampered ciphertext body
    let mut sealed = heap.read(c).unwrap();
    sealed[crypto_box::SEALBYTES] ^= 1;
    heap.write(c, &sealed).unwrap();
    let status = call(
        &heap,
        PrimitiveId::BoxSealOpen,
        &[Some(&opened), Some(&c), Some(&pk), Some(&sk)],
    );
    assert_eq!(status, FAILURE);
    assert_eq!(heap.read(opened).unwrap(), vec![0u8; message.len()]);
    assert_eq!(heap.stats().pins_outstanding, 0);
}

#[test]
fn test_box_seal_short_output() {
    let heap = ManagedHeap::new();
    let pk = heap.direct_from(&unhex(ALICE_PK));
    let m = heap.direct_from(b"four");
    let c = heap.allocate_direct(4 + crypto_box::SEALBYTES - 1);
    assert_eq!(call(&heap, PrimitiveId::BoxSeal, &[Some(&c), Some(&m), Some(&pk)]), FAILURE);
    assert_eq!(heap.read(c).unwrap(), vec![0u8; 4 + crypto_box::SEALBYTES - 1]);
}

// === randombytes / pwhash ===

#[test]
fn test_randombytes_fills_only_window() {
    let heap = ManagedHeap::new();
    let array = heap.new_array(&[0u8; 64]);
    let buf = heap.wrap(array, 16, 32).unwrap();

    let status = call(&heap, PrimitiveId::RandombytesBuf, &[Some(&buf)]);
    assert_eq!(status, SUCCESS);

    let bytes = heap.read(array).unwrap();
    assert_eq!(&bytes[..16], &[0u8; 16]);
    assert_eq!(&bytes[48..], &[0u8; 16]);
    assert_ne!(&bytes[16..48], &[0u8; 32]);
}

#[test]
fn test_pwhash_matches_facade() {
    let heap = ManagedHeap::new();
    let salt = *b"fedcba9876543210";
    let out = heap.allocate_direct(32);
    let (_, passwd) = pinned(&heap, b"correct horse", 2);
    let salt_handle = heap.direct_from(&salt);

    let status = Invoker::new(&heap)
        .call(
            PrimitiveId::Pwhash,
            &[Some(&out), Some(&passwd), Some(&salt_handle)],
            &[1, pwhash::MEMLIMIT_MIN as i64],
        )
        .unwrap();
    assert_eq!(status, SUCCESS);

    let mut expected = [0u8; 32];
    let status = pwhash::pwhash(
        &mut expected,
        b"correct horse",
        &salt,
        1,
        pwhash::MEMLIMIT_MIN,
        pwhash::ALG_DEFAULT,
    );
    assert_eq!(status, 0);
    assert_eq!(heap.read(out).unwrap(), expected.to_vec());
}

#[test]
fn test_scrypt_matches_facade() {
    let heap = ManagedHeap::new();
    let salt = [0x11; scrypt::SALTBYTES];
    let out = heap.allocate_direct(24);
    let (_, passwd) = pinned(&heap, b"tr0ub4dor", 3);
    let salt_handle = heap.direct_from(&salt);

    let status = Invoker::new(&heap)
        .call(
            PrimitiveId::PwhashScryptsalsa208sha256,
            &[Some(&out), Some(&passwd), Some(&salt_handle)],
            &[scrypt::OPSLIMIT_MIN as i64, scrypt::MEMLIMIT_MIN as i64],
        )
        .unwrap();
    assert_eq!(status, SUCCESS);

    let mut expected = [0u8; 24];
    let status = scrypt::pwhash(
        &mut expected,
        b"tr0ub4dor",
        &salt,
        scrypt::OPSLIMIT_MIN,
        scrypt::MEMLIMIT_MIN,
    );
    assert_eq!(status, 0);
    assert_eq!(heap.read(out).unwrap(), expected.to_vec());

    // Argon2's 16-byte salt is too short here
    let short_salt = heap.direct_from(&[0x11; 16]);
    let status = Invoker::new(&heap)
        .call(
            PrimitiveId::PwhashScryptsalsa208sha256,
            &[Some(&out), Some(&passwd), Some(&short_salt)],
            &[scrypt::OPSLIMIT_MIN as i64, scrypt::MEMLIMIT_MIN as i64],
        )
        .unwrap();
    assert_eq!(status, FAILURE);
}

// === absent buffers ===

#[test]
fn test_absent_required_policies() {
    let heap = ManagedHeap::new();
    let q = heap.allocate_direct(32);

    let delegated = Invoker::new(&heap)
        .call(PrimitiveId::ScalarmultCurve25519Base, &[Some(&q), None], &[])
        .unwrap();
    assert_eq!(delegated, FAILURE);

    let rejected = Invoker::new(&heap)
        .with_absent_policy(AbsentPolicy::Reject)
        .call(PrimitiveId::ScalarmultCurve25519Base, &[Some(&q), None], &[])
        .unwrap();
    assert_eq!(rejected, ABSENT_REQUIRED);
}
