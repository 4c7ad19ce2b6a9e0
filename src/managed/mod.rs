//! Managed Runtime Capabilities
//!
//! The bridge never talks to a VM directly. Everything it needs from the
//! managed side goes through [`ManagedRuntime`], which mirrors the handful of
//! calls a JNI-style environment offers for byte buffers:
//!
//! ```text
//! direct buffer   ──► direct_region()          (address + capacity)
//!
//! heap buffer     ──► backing_array()          (array reference)
//!                     pin(array)               (native copy of the array)
//!                     logical_offset()         (start of the view window)
//!                     remaining_length()       (length of the view window)
//!                     commit(array, copy, win) (write window back, unpin)
//!                     discard(array, copy)     (unpin without copy-back)
//!
//! direct release  ──► release_direct(region)   (region no longer in use)
//! ```

mod memory;

use std::ops::Range;

use crate::error::BridgeResult;

pub use memory::NativeBlock;
pub(crate) use memory::try_vec;

/// A natively addressable region reported by the runtime for a direct buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRegion {
    /// Address of the first byte
    pub ptr: *mut u8,
    /// Capacity of the region in bytes
    pub capacity: usize,
}

/// Buffer capabilities a managed runtime exposes to the bridge.
///
/// Implementations are expected to be cheap to call; the resolver calls them
/// once per buffer per invocation and caches nothing.
pub trait ManagedRuntime {
    /// Opaque buffer handle as passed across the boundary
    type Buffer: ?Sized;
    /// Reference to the managed array behind a non-direct buffer
    type Array;

    /// Address and capacity when the buffer is natively addressable.
    ///
    /// A non-empty region stays in use until the matching
    /// [`ManagedRuntime::release_direct`].
    fn direct_region(&self, buffer: &Self::Buffer) -> Option<RawRegion>;

    /// Managed array backing a non-direct buffer
    fn backing_array(&self, buffer: &Self::Buffer) -> BridgeResult<Self::Array>;

    /// Start of the buffer's view window within its backing array
    fn logical_offset(&self, buffer: &Self::Buffer) -> BridgeResult<usize>;

    /// Length of the buffer's view window
    fn remaining_length(&self, buffer: &Self::Buffer) -> BridgeResult<usize>;

    /// Pin an array, returning a native copy of its full contents
    fn pin(&self, array: &Self::Array) -> BridgeResult<NativeBlock>;

    /// Copy `window` of the pinned copy back into the array and unpin it
    fn commit(&self, array: &Self::Array, elements: NativeBlock, window: Range<usize>);

    /// Unpin an array without copying anything back
    fn discard(&self, array: &Self::Array, elements: NativeBlock);

    /// Called once for each non-empty region handed out by
    /// [`ManagedRuntime::direct_region`], when the view over it is released
    fn release_direct(&self, _region: RawRegion) {}
}
