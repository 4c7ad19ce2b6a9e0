//! Buffer Resolver
//!
//! Turns an opaque buffer handle into a [`BufferView`]: a pointer, an offset
//! and a length that native code can use directly, together with the
//! bookkeeping needed to reconcile the view afterwards.
//!
//! # Addressing Modes
//!
//! | Mode | Source | Release as output | Release as input |
//! |------|--------|-------------------|------------------|
//! | `Direct` | natively addressable storage | no-op | no-op |
//! | `Pinned` | pinned copy of a managed array | copy window back, unpin | unpin, no copy |
//!
//! An absent handle resolves to a null, zero-length `Direct` view. Releasing
//! it never touches the runtime.

use std::ptr;

use tracing::{trace, warn};

use crate::error::{BridgeError, BridgeResult};
use crate::managed::{ManagedRuntime, NativeBlock, RawRegion};

/// How a view's memory is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    /// Natively addressable for the duration of the call, no copy
    Direct,
    /// Temporary native copy of managed storage, must be reconciled
    Pinned,
}

/// Addressing state carried by a view until it is released
pub enum Addressing<A> {
    Direct,
    Pinned {
        /// Managed array the copy was taken from
        backing: A,
        /// The pinned copy; the view's base pointer points into it
        elements: NativeBlock,
    },
}

/// Resolved, addressable form of a caller-supplied buffer.
///
/// A view is consumed by [`BufferResolver::release_as_output`] or
/// [`BufferResolver::release_as_input`]; it cannot be released twice.
pub struct BufferView<A> {
    base: *mut u8,
    byte_offset: usize,
    length: usize,
    addressing: Addressing<A>,
}

impl<A> BufferView<A> {
    /// The view of an absent buffer: null base, zero length
    pub fn absent() -> Self {
        Self {
            base: ptr::null_mut(),
            byte_offset: 0,
            length: 0,
            addressing: Addressing::Direct,
        }
    }

    /// True when no buffer was supplied
    pub fn is_absent(&self) -> bool {
        self.base.is_null()
    }

    /// Address of the first addressable byte of the underlying storage
    pub fn base_pointer(&self) -> *mut u8 {
        self.base
    }

    /// Offset from the base pointer to the logical start of the view
    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    /// Number of addressable bytes from the logical start
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn mode(&self) -> AddressingMode {
        match self.addressing {
            Addressing::Direct => AddressingMode::Direct,
            Addressing::Pinned { .. } => AddressingMode::Pinned,
        }
    }

    /// Managed array behind a pinned view
    pub fn backing_handle(&self) -> Option<&A> {
        match &self.addressing {
            Addressing::Direct => None,
            Addressing::Pinned { backing, .. } => Some(backing),
        }
    }

    /// `base_pointer + byte_offset`, or null for an absent view
    pub fn data_ptr(&self) -> *mut u8 {
        if self.base.is_null() {
            return ptr::null_mut();
        }
        // Safety: resolve() checked byte_offset + length against the storage size
        unsafe { self.base.add(self.byte_offset) }
    }

    fn take_addressing(&mut self) -> Addressing<A> {
        std::mem::replace(&mut self.addressing, Addressing::Direct)
    }
}

impl<A> Drop for BufferView<A> {
    fn drop(&mut self) {
        if let Addressing::Pinned { .. } = self.addressing {
            warn!(
                len = self.length,
                offset = self.byte_offset,
                "pinned buffer view dropped without release"
            );
        }
    }
}

impl<A> std::fmt::Debug for BufferView<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferView")
            .field("base", &self.base)
            .field("byte_offset", &self.byte_offset)
            .field("length", &self.length)
            .field("mode", &self.mode())
            .finish()
    }
}

/// Resolves and reconciles buffer views against a managed runtime
pub struct BufferResolver<'r, R: ManagedRuntime> {
    runtime: &'r R,
}

impl<'r, R: ManagedRuntime> BufferResolver<'r, R> {
    pub fn new(runtime: &'r R) -> Self {
        Self { runtime }
    }

    pub fn runtime(&self) -> &'r R {
        self.runtime
    }

    /// Resolve a handle into a view.
    ///
    /// Direct storage is used in place. Anything else is pinned, and the
    /// window reported by the runtime becomes the view. Any pin taken here is
    /// discarded again if a later step fails.
    pub fn resolve(&self, handle: Option<&R::Buffer>) -> BridgeResult<BufferView<R::Array>> {
        let Some(buffer) = handle else {
            trace!("resolve: absent buffer");
            return Ok(BufferView::absent());
        };

        if let Some(region) = self.runtime.direct_region(buffer) {
            trace!(capacity = region.capacity, "resolve: direct buffer");
            return Ok(BufferView {
                base: region.ptr,
                byte_offset: 0,
                length: region.capacity,
                addressing: Addressing::Direct,
            });
        }

        let backing = self.runtime.backing_array(buffer)?;
        let elements = self.runtime.pin(&backing)?;

        let window = self
            .runtime
            .logical_offset(buffer)
            .and_then(|offset| Ok((offset, self.runtime.remaining_length(buffer)?)));
        let (offset, len) = match window {
            Ok(window) => window,
            Err(err) => {
                self.runtime.discard(&backing, elements);
                return Err(err);
            }
        };

        let array_len = elements.len();
        if offset.checked_add(len).map_or(true, |end| end > array_len) {
            self.runtime.discard(&backing, elements);
            return Err(BridgeError::WindowOutOfBounds {
                offset,
                len,
                array_len,
            });
        }

        trace!(offset, len, array_len, "resolve: pinned buffer");
        Ok(BufferView {
            base: elements.as_ptr(),
            byte_offset: offset,
            length: len,
            addressing: Addressing::Pinned { backing, elements },
        })
    }

    /// Reconcile a view that was written to.
    ///
    /// Pinned views copy their window back into the backing array before the
    /// pin is released. This runs whether or not the primitive succeeded.
    pub fn release_as_output(&self, mut view: BufferView<R::Array>) {
        match view.take_addressing() {
            Addressing::Direct => self.release_direct(&view),
            Addressing::Pinned { backing, elements } => {
                let start = view.byte_offset;
                trace!(offset = start, len = view.length, "release: commit");
                self.runtime
                    .commit(&backing, elements, start..start + view.length);
            }
        }
    }

    /// Reconcile a view that was only read. Pinned views are discarded.
    pub fn release_as_input(&self, mut view: BufferView<R::Array>) {
        if view.is_absent() {
            return;
        }
        match view.take_addressing() {
            Addressing::Direct => self.release_direct(&view),
            Addressing::Pinned { backing, elements } => {
                trace!(offset = view.byte_offset, len = view.length, "release: discard");
                self.runtime.discard(&backing, elements);
            }
        }
    }
}

impl<R: ManagedRuntime> BufferResolver<'_, R> {
    fn release_direct(&self, view: &BufferView<R::Array>) {
        if view.is_absent() || view.is_empty() {
            return;
        }
        trace!(len = view.length, "release: direct");
        self.runtime.release_direct(RawRegion {
            ptr: view.base,
            capacity: view.length,
        });
    }
}
