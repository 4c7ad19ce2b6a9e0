//! Heap Objects

use crate::managed::NativeBlock;

use super::Handle;

/// Managed byte array
#[derive(Debug)]
pub(super) struct ByteArray {
    pub data: Vec<u8>,
    /// Pins currently outstanding on this array
    pub pins: usize,
}

impl ByteArray {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, pins: 0 }
    }
}

/// Non-direct buffer: a window onto a byte array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Window {
    pub array: Handle,
    pub offset: usize,
    pub len: usize,
}

/// Everything the heap can hold
#[derive(Debug)]
pub(super) enum HeapObject {
    Array(ByteArray),
    Direct(NativeBlock),
    Wrapped(Window),
}

impl HeapObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            HeapObject::Array(_) => ObjectKind::Array,
            HeapObject::Direct(_) => ObjectKind::Direct,
            HeapObject::Wrapped(_) => ObjectKind::Wrapped,
        }
    }
}

/// Kind of object behind a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// Managed byte array
    Array,
    /// Natively addressable buffer
    Direct,
    /// Buffer viewing a window of a byte array
    Wrapped,
}
