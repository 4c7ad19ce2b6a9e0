//! Call Frames
//!
//! A [`Frame`] is what primitive glue sees while its buffers are resolved:
//! one [`Arg`] per signature parameter, each a raw `(pointer, length)` pair
//! in the parameter's logical window.
//!
//! An `Arg` borrows its frame, so it cannot be kept past the call that
//! resolved it:
//!
//! ```compile_fail
//! use sodium_bridge::{Invoker, ManagedHeap, Param, Signature};
//!
//! static ONE: Signature = Signature {
//!     name: "one",
//!     params: &[Param::output("q")],
//!     scalars: &[],
//! };
//!
//! let heap = ManagedHeap::new();
//! let q = heap.allocate_direct(8);
//! let mut saved = None;
//! Invoker::new(&heap)
//!     .invoke(&ONE, &[Some(&q)], |frame| {
//!         saved = Some(frame.arg(0));
//!         0
//!     })
//!     .unwrap();
//! saved.unwrap().write_prefix(&[1]);
//! ```
//!
//! Two arguments may name the same memory (in-place encryption passes the
//! same buffer as source and destination). Glue therefore reads fixed-size
//! inputs into local arrays, and only borrows a region as a slice when it
//! knows nothing else writes it during the borrow.

use std::marker::PhantomData;
use std::ptr;

use super::Role;

/// One resolved argument, valid for the frame it came from
#[derive(Debug, Clone, Copy)]
pub struct Arg<'c> {
    ptr: *mut u8,
    len: usize,
    role: Role,
    _frame: PhantomData<&'c mut [u8]>,
}

impl<'c> Arg<'c> {
    pub(crate) fn new(ptr: *mut u8, len: usize, role: Role) -> Self {
        Self {
            ptr,
            len,
            role,
            _frame: PhantomData,
        }
    }

    /// True when the caller supplied no buffer
    pub fn is_absent(&self) -> bool {
        self.ptr.is_null()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr
    }

    /// The first `len` bytes of this argument, clamped to its length
    pub fn prefix(&self, len: usize) -> Arg<'c> {
        Arg {
            len: len.min(self.len),
            ..*self
        }
    }

    /// Copy the first `N` bytes out. `None` when absent or shorter than `N`.
    pub fn read_array<const N: usize>(&self) -> Option<[u8; N]> {
        if self.ptr.is_null() || self.len < N {
            return None;
        }
        let mut out = [0u8; N];
        // Safety: N <= len bytes are readable at ptr for the frame's lifetime
        unsafe { ptr::copy_nonoverlapping(self.ptr, out.as_mut_ptr(), N) };
        Some(out)
    }

    /// Copy `bytes` to the start of this argument. `false` when it does not fit.
    pub fn write_prefix(&self, bytes: &[u8]) -> bool {
        if bytes.is_empty() {
            return true;
        }
        if self.ptr.is_null() || self.len < bytes.len() {
            return false;
        }
        // Safety: bytes.len() <= len bytes are writable; ptr::copy tolerates overlap
        unsafe { ptr::copy(bytes.as_ptr(), self.ptr, bytes.len()) };
        true
    }

    /// Move the first `len` bytes of `src` to the start of this argument.
    /// Both regions may overlap. `false` when either is too short.
    pub fn copy_from(&self, src: &Arg<'_>, len: usize) -> bool {
        if len == 0 {
            return true;
        }
        if self.ptr.is_null() || src.ptr.is_null() || self.len < len || src.len < len {
            return false;
        }
        if self.ptr != src.ptr {
            // Safety: both ranges are in bounds; ptr::copy is memmove
            unsafe { ptr::copy(src.ptr, self.ptr, len) };
        }
        true
    }

    /// True when the two arguments share at least one byte
    pub fn overlaps(&self, other: &Arg<'_>) -> bool {
        if self.is_absent() || other.is_absent() || self.len == 0 || other.len == 0 {
            return false;
        }
        let (a, b) = (self.ptr as usize, other.ptr as usize);
        a < b + other.len && b < a + self.len
    }

    /// Borrow the argument as a byte slice (empty when absent).
    ///
    /// # Safety
    ///
    /// Nothing may write this region while the slice is alive.
    pub unsafe fn as_slice(&self) -> &'c [u8] {
        if self.ptr.is_null() {
            return &[];
        }
        std::slice::from_raw_parts(self.ptr, self.len)
    }

    /// Borrow the argument mutably (empty when absent).
    ///
    /// # Safety
    ///
    /// No other reference to this region may be alive while the slice is.
    pub unsafe fn as_mut_slice(&self) -> &'c mut [u8] {
        if self.ptr.is_null() {
            return &mut [];
        }
        std::slice::from_raw_parts_mut(self.ptr, self.len)
    }
}

/// Resolved arguments of one invocation, valid until the context releases
pub struct Frame<'c> {
    args: Vec<Arg<'c>>,
}

impl<'c> Frame<'c> {
    pub(crate) fn new(args: Vec<Arg<'c>>) -> Self {
        Self { args }
    }

    /// Argument at `index` in signature order.
    ///
    /// Panics when `index` is outside the signature, which is a glue bug.
    pub fn arg(&self, index: usize) -> Arg<'_> {
        self.args[index]
    }

    pub fn args(&self) -> &[Arg<'c>] {
        &self.args
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}
