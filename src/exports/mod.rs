//! C ABI
//!
//! `extern "C"` entry points, all prefixed `sodium_bridge_`. Buffers are
//! handles into the global [`ManagedHeap`]; handle `0` means "absent".
//!
//! Every function that can fail or allocate runs inside [`abi_boundary`]:
//! environment errors and panics never cross into the caller. Primitive
//! calls then return [`ENVIRONMENT_FAILURE`], allocators return the null
//! handle, and both leave a message for `sodium_bridge_last_error`.

mod constants;

use std::any::Any;
use std::cell::RefCell;
use std::ffi::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::error;

use crate::adapter::Invoker;
use crate::bindings::PrimitiveId;
use crate::config;
use crate::error::{BridgeError, BridgeResult};
use crate::heap::{Handle, ManagedHeap, NULL_HANDLE};
use crate::sodium::{self, randombytes};
use crate::status::{ENVIRONMENT_FAILURE, FAILURE, SUCCESS};

pub use constants::*;

thread_local! {
    static LAST_ERROR: RefCell<Option<String>> = const { RefCell::new(None) };
}

fn set_last_error(err: &BridgeError) {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(err.to_string()));
}

/// Message of the last fatal error on this thread
pub fn last_error() -> Option<String> {
    LAST_ERROR.with(|slot| slot.borrow().clone())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run `f`, mapping errors and panics to `on_error`
fn abi_boundary<T, F>(on_error: T, f: F) -> T
where
    F: FnOnce() -> BridgeResult<T>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => value,
        Ok(Err(err)) => {
            error!(%err, "call failed at the ABI boundary");
            set_last_error(&err);
            on_error
        }
        Err(payload) => {
            let err = BridgeError::Panic(panic_message(payload.as_ref()));
            error!(%err, "panic caught at the ABI boundary");
            set_last_error(&err);
            on_error
        }
    }
}

fn call(id: PrimitiveId, handles: &[Handle], scalars: &[i64]) -> i32 {
    abi_boundary(ENVIRONMENT_FAILURE, || {
        let heap = ManagedHeap::global();
        let handles: Vec<Option<&Handle>> = handles
            .iter()
            .map(|handle| (*handle != NULL_HANDLE).then_some(handle))
            .collect();
        Invoker::configured(heap, config::global()).call(id, &handles, scalars)
    })
}

// =============================================================================
// Initialization
// =============================================================================

/// Bridge initialization: configuration, logging, primitive library.
/// `0` on success, `-1` on failure.
#[no_mangle]
pub extern "C" fn sodium_bridge_init() -> i32 {
    abi_boundary(ENVIRONMENT_FAILURE, || Ok(crate::init()))
}

/// `sodium_init()`: `0` first time, `1` if already done, `-1` on failure
#[no_mangle]
pub extern "C" fn sodium_bridge_sodium_init() -> i32 {
    abi_boundary(ENVIRONMENT_FAILURE, || Ok(sodium::init()))
}

// =============================================================================
// Primitives
// =============================================================================

#[no_mangle]
pub extern "C" fn sodium_bridge_crypto_core_hsalsa20(
    out: Handle,
    input: Handle,
    k: Handle,
    c: Handle,
) -> i32 {
    call(PrimitiveId::CoreHsalsa20, &[out, input, k, c], &[])
}

#[no_mangle]
pub extern "C" fn sodium_bridge_crypto_scalarmult_curve25519(
    q: Handle,
    n: Handle,
    p: Handle,
) -> i32 {
    call(PrimitiveId::ScalarmultCurve25519, &[q, n, p], &[])
}

#[no_mangle]
pub extern "C" fn sodium_bridge_crypto_scalarmult_curve25519_base(q: Handle, n: Handle) -> i32 {
    call(PrimitiveId::ScalarmultCurve25519Base, &[q, n], &[])
}

/// Original ChaCha20-Poly1305 construction, 8-byte nonce
#[no_mangle]
pub extern "C" fn sodium_bridge_crypto_aead_chacha20poly1305_encrypt_detached(
    c: Handle,
    mac: Handle,
    m: Handle,
    ad: Handle,
    npub: Handle,
    k: Handle,
) -> i32 {
    call(
        PrimitiveId::ChaCha20Poly1305EncryptDetached,
        &[c, mac, m, ad, npub, k],
        &[],
    )
}

#[no_mangle]
pub extern "C" fn sodium_bridge_crypto_aead_chacha20poly1305_decrypt_detached(
    m: Handle,
    c: Handle,
    mac: Handle,
    ad: Handle,
    npub: Handle,
    k: Handle,
) -> i32 {
    call(
        PrimitiveId::ChaCha20Poly1305DecryptDetached,
        &[m, c, mac, ad, npub, k],
        &[],
    )
}

#[no_mangle]
pub extern "C" fn sodium_bridge_crypto_aead_chacha20poly1305_ietf_encrypt_detached(
    c: Handle,
    mac: Handle,
    m: Handle,
    ad: Handle,
    npub: Handle,
    k: Handle,
) -> i32 {
    call(
        PrimitiveId::ChaCha20Poly1305IetfEncryptDetached,
        &[c, mac, m, ad, npub, k],
        &[],
    )
}

#[no_mangle]
pub extern "C" fn sodium_bridge_crypto_aead_chacha20poly1305_ietf_decrypt_detached(
    m: Handle,
    c: Handle,
    mac: Handle,
    ad: Handle,
    npub: Handle,
    k: Handle,
) -> i32 {
    call(
        PrimitiveId::ChaCha20Poly1305IetfDecryptDetached,
        &[m, c, mac, ad, npub, k],
        &[],
    )
}

#[no_mangle]
pub extern "C" fn sodium_bridge_crypto_aead_xchacha20poly1305_ietf_encrypt_detached(
    c: Handle,
    mac: Handle,
    m: Handle,
    ad: Handle,
    npub: Handle,
    k: Handle,
) -> i32 {
    call(
        PrimitiveId::XChaCha20Poly1305IetfEncryptDetached,
        &[c, mac, m, ad, npub, k],
        &[],
    )
}

#[no_mangle]
pub extern "C" fn sodium_bridge_crypto_aead_xchacha20poly1305_ietf_decrypt_detached(
    m: Handle,
    c: Handle,
    mac: Handle,
    ad: Handle,
    npub: Handle,
    k: Handle,
) -> i32 {
    call(
        PrimitiveId::XChaCha20Poly1305IetfDecryptDetached,
        &[m, c, mac, ad, npub, k],
        &[],
    )
}

/// XSalsa20-Poly1305; `ad` must be absent or empty
#[no_mangle]
pub extern "C" fn sodium_bridge_crypto_aead_xsalsa20poly1305_encrypt_detached(
    c: Handle,
    mac: Handle,
    m: Handle,
    ad: Handle,
    npub: Handle,
    k: Handle,
) -> i32 {
    call(
        PrimitiveId::XSalsa20Poly1305EncryptDetached,
        &[c, mac, m, ad, npub, k],
        &[],
    )
}

#[no_mangle]
pub extern "C" fn sodium_bridge_crypto_aead_xsalsa20poly1305_decrypt_detached(
    m: Handle,
    c: Handle,
    mac: Handle,
    ad: Handle,
    npub: Handle,
    k: Handle,
) -> i32 {
    call(
        PrimitiveId::XSalsa20Poly1305DecryptDetached,
        &[m, c, mac, ad, npub, k],
        &[],
    )
}

#[no_mangle]
pub extern "C" fn sodium_bridge_crypto_box_keypair(pk: Handle, sk: Handle) -> i32 {
    call(PrimitiveId::BoxKeypair, &[pk, sk], &[])
}

#[no_mangle]
pub extern "C" fn sodium_bridge_crypto_box_seed_keypair(
    pk: Handle,
    sk: Handle,
    seed: Handle,
) -> i32 {
    call(PrimitiveId::BoxSeedKeypair, &[pk, sk, seed], &[])
}

/// Sealed box of all of `m`; `c` needs `crypto_box_sealbytes` extra bytes
#[no_mangle]
pub extern "C" fn sodium_bridge_crypto_box_seal(c: Handle, m: Handle, pk: Handle) -> i32 {
    call(PrimitiveId::BoxSeal, &[c, m, pk], &[])
}

#[no_mangle]
pub extern "C" fn sodium_bridge_crypto_box_seal_open(
    m: Handle,
    c: Handle,
    pk: Handle,
    sk: Handle,
) -> i32 {
    call(PrimitiveId::BoxSealOpen, &[m, c, pk, sk], &[])
}

#[no_mangle]
pub extern "C" fn sodium_bridge_randombytes_buf(buf: Handle) -> i32 {
    call(PrimitiveId::RandombytesBuf, &[buf], &[])
}

/// `randombytes_random()`; `0` if the entropy source panics
#[no_mangle]
pub extern "C" fn sodium_bridge_randombytes_random() -> u32 {
    abi_boundary(0, || Ok(randombytes::random()))
}

/// `randombytes_uniform()`; `0` if the entropy source panics
#[no_mangle]
pub extern "C" fn sodium_bridge_randombytes_uniform(upper_bound: u32) -> u32 {
    abi_boundary(0, || Ok(randombytes::uniform(upper_bound)))
}

/// `crypto_pwhash` with the default algorithm; output length is the
/// length of `out`
#[no_mangle]
pub extern "C" fn sodium_bridge_crypto_pwhash(
    out: Handle,
    passwd: Handle,
    salt: Handle,
    opslimit: u64,
    memlimit: usize,
) -> i32 {
    let (Ok(opslimit), Ok(memlimit)) = (i64::try_from(opslimit), i64::try_from(memlimit)) else {
        return FAILURE;
    };
    call(PrimitiveId::Pwhash, &[out, passwd, salt], &[opslimit, memlimit])
}

/// `crypto_pwhash_scryptsalsa208sha256`; output length is the length of
/// `out`
#[no_mangle]
pub extern "C" fn sodium_bridge_crypto_pwhash_scryptsalsa208sha256(
    out: Handle,
    passwd: Handle,
    salt: Handle,
    opslimit: u64,
    memlimit: usize,
) -> i32 {
    let (Ok(opslimit), Ok(memlimit)) = (i64::try_from(opslimit), i64::try_from(memlimit)) else {
        return FAILURE;
    };
    call(
        PrimitiveId::PwhashScryptsalsa208sha256,
        &[out, passwd, salt],
        &[opslimit, memlimit],
    )
}

// =============================================================================
// Heap management
// =============================================================================

/// New managed array holding a copy of `len` bytes at `bytes`, or `len`
/// zeros when `bytes` is null. `0` when the allocation fails.
///
/// # Safety
///
/// A non-null `bytes` must be valid for reads of `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn sodium_bridge_array_new(bytes: *const u8, len: usize) -> Handle {
    abi_boundary(NULL_HANDLE, || {
        let heap = ManagedHeap::global();
        if bytes.is_null() {
            return heap.try_allocate_array(len);
        }
        heap.try_new_array(std::slice::from_raw_parts(bytes, len))
    })
}

/// New zero-filled direct buffer; `0` when the allocation fails
#[no_mangle]
pub extern "C" fn sodium_bridge_buffer_allocate_direct(capacity: usize) -> Handle {
    abi_boundary(NULL_HANDLE, || {
        ManagedHeap::global().try_allocate_direct(capacity)
    })
}

/// New buffer viewing `array[offset..offset + len]`; `0` on error
#[no_mangle]
pub extern "C" fn sodium_bridge_buffer_wrap(array: Handle, offset: usize, len: usize) -> Handle {
    abi_boundary(NULL_HANDLE, || ManagedHeap::global().wrap(array, offset, len))
}

/// Copy what `handle` covers into `dst`, up to `capacity` bytes.
///
/// Returns the full length of the contents (which may exceed `capacity`),
/// or `-1` for an unknown handle.
///
/// # Safety
///
/// A non-null `dst` must be valid for writes of `capacity` bytes.
#[no_mangle]
pub unsafe extern "C" fn sodium_bridge_buffer_read(
    handle: Handle,
    dst: *mut u8,
    capacity: usize,
) -> i64 {
    abi_boundary(-1, || {
        let bytes = ManagedHeap::global().read(handle)?;
        if !dst.is_null() {
            let n = bytes.len().min(capacity);
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), dst, n);
        }
        Ok(i64::try_from(bytes.len()).unwrap_or(i64::MAX))
    })
}

/// Overwrite the start of what `handle` covers with `len` bytes from `src`.
/// `0` on success.
///
/// # Safety
///
/// `src` must be valid for reads of `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn sodium_bridge_buffer_write(
    handle: Handle,
    src: *const u8,
    len: usize,
) -> i32 {
    if src.is_null() && len > 0 {
        return FAILURE;
    }
    abi_boundary(ENVIRONMENT_FAILURE, || {
        let bytes = if len == 0 {
            &[][..]
        } else {
            std::slice::from_raw_parts(src, len)
        };
        ManagedHeap::global().write(handle, bytes)?;
        Ok(SUCCESS)
    })
}

/// Free a heap object. `0` when freed, `-1` for unknown objects and for
/// objects a call is still using.
#[no_mangle]
pub extern "C" fn sodium_bridge_free(handle: Handle) -> i32 {
    abi_boundary(FAILURE, || {
        Ok(if ManagedHeap::global().free(handle) {
            SUCCESS
        } else {
            FAILURE
        })
    })
}

/// Copy the last fatal error message of this thread into `dst` as a
/// NUL-terminated string, truncated to `capacity`.
///
/// Returns the message length without the terminator, `0` if there is none.
///
/// # Safety
///
/// A non-null `dst` must be valid for writes of `capacity` bytes.
#[no_mangle]
pub unsafe extern "C" fn sodium_bridge_last_error(dst: *mut c_char, capacity: usize) -> usize {
    let copied = catch_unwind(AssertUnwindSafe(|| {
        let message = last_error()?;
        if !dst.is_null() && capacity > 0 {
            let n = message.len().min(capacity - 1);
            std::ptr::copy_nonoverlapping(message.as_ptr(), dst.cast::<u8>(), n);
            *dst.add(n) = 0;
        }
        Some(message.len())
    }));
    copied.ok().flatten().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_maps_errors() {
        let status = abi_boundary(ENVIRONMENT_FAILURE, || Err(BridgeError::UnknownHandle(77)));
        assert_eq!(status, ENVIRONMENT_FAILURE);
        assert!(last_error().unwrap().contains("77"));
    }

    #[test]
    fn test_boundary_catches_panics() {
        let status: i32 = abi_boundary(ENVIRONMENT_FAILURE, || panic!("glue bug"));
        assert_eq!(status, ENVIRONMENT_FAILURE);
        assert!(last_error().unwrap().contains("glue bug"));
    }

    #[test]
    fn test_boundary_passes_values() {
        assert_eq!(abi_boundary(ENVIRONMENT_FAILURE, || Ok(-1)), -1);
        assert_eq!(abi_boundary(NULL_HANDLE, || Ok(5u64)), 5);
    }

    #[test]
    fn test_allocation_failure_is_reported() {
        assert_eq!(sodium_bridge_buffer_allocate_direct(usize::MAX), NULL_HANDLE);
        assert!(last_error().unwrap().contains("allocate"));

        let array = unsafe { sodium_bridge_array_new(std::ptr::null(), usize::MAX) };
        assert_eq!(array, NULL_HANDLE);
        assert!(last_error().unwrap().contains(&usize::MAX.to_string()));
    }

    #[test]
    fn test_last_error_truncates() {
        set_last_error(&BridgeError::UnknownHandle(123456));
        let mut buf = [0x7Fu8; 8];
        let len = unsafe { sodium_bridge_last_error(buf.as_mut_ptr().cast(), buf.len()) };
        assert!(len > 7);
        assert_eq!(&buf[..7], b"unknown");
        assert_eq!(buf[7], 0);
    }
}
