//! Native Memory Blocks
//!
//! Owned, natively addressable allocations. Used for the temporary copy a pin
//! produces and for the storage of direct buffers.

use std::ptr::NonNull;

use zeroize::Zeroize;

use crate::error::{BridgeError, BridgeResult};

/// Empty vector with room for exactly `len` bytes
pub(crate) fn try_vec(len: usize) -> BridgeResult<Vec<u8>> {
    let mut bytes = Vec::new();
    bytes
        .try_reserve_exact(len)
        .map_err(|_| BridgeError::AllocationFailed(len))?;
    Ok(bytes)
}

/// A heap allocation whose address stays fixed until it is dropped.
///
/// The block is held through a raw pointer rather than a `Box` so that
/// pointers handed out by [`NativeBlock::as_ptr`] stay valid while the block
/// itself is moved between owners (view, runtime, handle table).
pub struct NativeBlock {
    ptr: NonNull<u8>,
    len: usize,
}

impl NativeBlock {
    /// Allocate a zero-filled block
    pub fn zeroed(len: usize) -> Self {
        Self::from_boxed(vec![0u8; len].into_boxed_slice())
    }

    /// Allocate a block holding a copy of `bytes`
    pub fn copy_of(bytes: &[u8]) -> Self {
        Self::from_boxed(bytes.into())
    }

    /// Like [`NativeBlock::zeroed`], but reports allocation failure
    pub fn try_zeroed(len: usize) -> BridgeResult<Self> {
        let mut bytes = try_vec(len)?;
        bytes.resize(len, 0);
        Ok(Self::from_boxed(bytes.into_boxed_slice()))
    }

    /// Like [`NativeBlock::copy_of`], but reports allocation failure
    pub fn try_copy_of(bytes: &[u8]) -> BridgeResult<Self> {
        let mut copy = try_vec(bytes.len())?;
        copy.extend_from_slice(bytes);
        Ok(Self::from_boxed(copy.into_boxed_slice()))
    }

    fn from_boxed(boxed: Box<[u8]>) -> Self {
        let len = boxed.len();
        let ptr = NonNull::from(Box::leak(boxed)).cast::<u8>();
        Self { ptr, len }
    }

    /// Address of the first byte
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// Size of the block in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the block is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// View the block contents
    pub fn as_slice(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// Mutable view of the block contents
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Overwrite the contents with zeros
    pub fn wipe(&mut self) {
        self.as_mut_slice().zeroize();
    }
}

impl Drop for NativeBlock {
    fn drop(&mut self) {
        let slice = std::ptr::slice_from_raw_parts_mut(self.ptr.as_ptr(), self.len);
        // Safety: ptr/len came from Box::into_raw in from_boxed and are freed once
        unsafe {
            drop(Box::from_raw(slice));
        }
    }
}

impl std::fmt::Debug for NativeBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeBlock")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .finish()
    }
}

// Safety: NativeBlock uniquely owns its allocation
unsafe impl Send for NativeBlock {}
unsafe impl Sync for NativeBlock {}
