//! Reference Managed Heap
//!
//! An in-process stand-in for a VM heap, used by the C ABI and by tests. It
//! holds three kinds of objects behind `u64` handles:
//!
//! - **arrays**: managed byte storage, never handed out by address
//! - **direct buffers**: native allocations with a stable address
//! - **wrapped buffers**: an `(offset, len)` window onto an array
//!
//! Handle `0` is never allocated and stands for "no buffer".
//!
//! # Pinning
//!
//! Pinning an array copies all of it into a [`NativeBlock`]. Committing
//! writes back only the window the buffer covers; discarding drops the copy.
//! Both wipe the copy before freeing it. An array with outstanding pins
//! cannot be freed, and neither can a direct buffer whose region is in use
//! by a call.

mod object;

use std::collections::HashMap;
use std::ops::Range;

use parking_lot::RwLock;
use tracing::warn;

use crate::error::{BridgeError, BridgeResult};
use crate::managed::{try_vec, ManagedRuntime, NativeBlock, RawRegion};

use object::{ByteArray, HeapObject, Window};

pub use object::ObjectKind;

/// Handle to a heap object
pub type Handle = u64;

/// The "no buffer" handle
pub const NULL_HANDLE: Handle = 0;

lazy_static::lazy_static! {
    /// Heap backing the exported C functions
    static ref GLOBAL_HEAP: ManagedHeap = ManagedHeap::new();
}

/// Pin bookkeeping counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HeapStats {
    /// Live objects
    pub objects: usize,
    /// Pins taken and not yet committed or discarded
    pub pins_outstanding: usize,
    /// Direct regions handed to calls and not yet released
    pub direct_leases: usize,
    pub pins: u64,
    pub commits: u64,
    pub discards: u64,
}

#[derive(Debug, Default)]
struct HeapTable {
    objects: HashMap<Handle, HeapObject>,
    /// In-use count per direct region address
    leases: HashMap<usize, usize>,
    last_handle: Handle,
    pins: u64,
    commits: u64,
    discards: u64,
}

impl HeapTable {
    fn insert(&mut self, object: HeapObject) -> Handle {
        self.last_handle += 1;
        let handle = self.last_handle;
        self.objects.insert(handle, object);
        handle
    }

    fn get(&self, handle: Handle) -> BridgeResult<&HeapObject> {
        self.objects
            .get(&handle)
            .ok_or(BridgeError::UnknownHandle(handle))
    }

    fn array(&self, handle: Handle) -> BridgeResult<&ByteArray> {
        match self.get(handle)? {
            HeapObject::Array(array) => Ok(array),
            other => Err(BridgeError::NoBackingArray(format!(
                "handle {} is a {:?}, not an array",
                handle,
                other.kind()
            ))),
        }
    }

    fn window(&self, handle: Handle) -> BridgeResult<Window> {
        match self.get(handle)? {
            HeapObject::Wrapped(window) => Ok(*window),
            other => Err(BridgeError::Metadata(format!(
                "handle {} is a {:?}, not a wrapped buffer",
                handle,
                other.kind()
            ))),
        }
    }

    /// Mutable bytes a buffer handle covers
    fn contents_mut(&mut self, handle: Handle) -> BridgeResult<&mut [u8]> {
        let window = match self.get(handle)? {
            HeapObject::Wrapped(window) => Some(*window),
            _ => None,
        };
        if let Some(w) = window {
            return match self.objects.get_mut(&w.array) {
                Some(HeapObject::Array(array)) => Ok(&mut array.data[w.offset..w.offset + w.len]),
                _ => Err(BridgeError::UnknownHandle(w.array)),
            };
        }
        match self.objects.get_mut(&handle) {
            Some(HeapObject::Array(array)) => Ok(&mut array.data),
            Some(HeapObject::Direct(block)) => Ok(block.as_mut_slice()),
            _ => Err(BridgeError::UnknownHandle(handle)),
        }
    }
}

/// Handle table implementing [`ManagedRuntime`]
#[derive(Debug, Default)]
pub struct ManagedHeap {
    table: RwLock<HeapTable>,
}

impl ManagedHeap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide heap
    pub fn global() -> &'static ManagedHeap {
        &GLOBAL_HEAP
    }

    /// New array holding a copy of `bytes`
    pub fn new_array(&self, bytes: &[u8]) -> Handle {
        self.table
            .write()
            .insert(HeapObject::Array(ByteArray::new(bytes.to_vec())))
    }

    /// New zero-filled array
    pub fn allocate_array(&self, len: usize) -> Handle {
        self.table
            .write()
            .insert(HeapObject::Array(ByteArray::new(vec![0u8; len])))
    }

    /// New zero-filled direct buffer
    pub fn allocate_direct(&self, capacity: usize) -> Handle {
        self.table
            .write()
            .insert(HeapObject::Direct(NativeBlock::zeroed(capacity)))
    }

    /// New direct buffer holding a copy of `bytes`
    pub fn direct_from(&self, bytes: &[u8]) -> Handle {
        self.table
            .write()
            .insert(HeapObject::Direct(NativeBlock::copy_of(bytes)))
    }

    /// [`ManagedHeap::new_array`] reporting allocation failure
    pub fn try_new_array(&self, bytes: &[u8]) -> BridgeResult<Handle> {
        let mut data = try_vec(bytes.len())?;
        data.extend_from_slice(bytes);
        Ok(self
            .table
            .write()
            .insert(HeapObject::Array(ByteArray::new(data))))
    }

    /// [`ManagedHeap::allocate_array`] reporting allocation failure
    pub fn try_allocate_array(&self, len: usize) -> BridgeResult<Handle> {
        let mut data = try_vec(len)?;
        data.resize(len, 0);
        Ok(self
            .table
            .write()
            .insert(HeapObject::Array(ByteArray::new(data))))
    }

    /// [`ManagedHeap::allocate_direct`] reporting allocation failure
    pub fn try_allocate_direct(&self, capacity: usize) -> BridgeResult<Handle> {
        let block = NativeBlock::try_zeroed(capacity)?;
        Ok(self.table.write().insert(HeapObject::Direct(block)))
    }

    /// New buffer viewing `array[offset..offset + len]`
    pub fn wrap(&self, array: Handle, offset: usize, len: usize) -> BridgeResult<Handle> {
        let mut table = self.table.write();
        let array_len = table.array(array)?.data.len();
        if offset.checked_add(len).map_or(true, |end| end > array_len) {
            return Err(BridgeError::WindowOutOfBounds {
                offset,
                len,
                array_len,
            });
        }
        Ok(table.insert(HeapObject::Wrapped(Window { array, offset, len })))
    }

    /// New buffer viewing all of `array`
    pub fn wrap_array(&self, array: Handle) -> BridgeResult<Handle> {
        let len = self.table.read().array(array)?.data.len();
        self.wrap(array, 0, len)
    }

    /// Copy of the bytes a handle covers: the whole array, the direct
    /// region, or the window of a wrapped buffer
    pub fn read(&self, handle: Handle) -> BridgeResult<Vec<u8>> {
        let table = self.table.read();
        match table.get(handle)? {
            HeapObject::Array(array) => Ok(array.data.clone()),
            HeapObject::Direct(block) => Ok(block.as_slice().to_vec()),
            HeapObject::Wrapped(w) => {
                let array = table.array(w.array)?;
                Ok(array.data[w.offset..w.offset + w.len].to_vec())
            }
        }
    }

    /// Overwrite the start of what a handle covers with `bytes`
    pub fn write(&self, handle: Handle, bytes: &[u8]) -> BridgeResult<()> {
        let mut table = self.table.write();
        let target = table.contents_mut(handle)?;
        if bytes.len() > target.len() {
            return Err(BridgeError::WindowOutOfBounds {
                offset: 0,
                len: bytes.len(),
                array_len: target.len(),
            });
        }
        target[..bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Full contents of the array behind a wrapped buffer (or of an array)
    pub fn array_bytes(&self, handle: Handle) -> BridgeResult<Vec<u8>> {
        let table = self.table.read();
        let array = match table.get(handle)? {
            HeapObject::Wrapped(w) => w.array,
            _ => handle,
        };
        Ok(table.array(array)?.data.clone())
    }

    /// Kind of object behind `handle`
    pub fn kind(&self, handle: Handle) -> Option<ObjectKind> {
        self.table.read().objects.get(&handle).map(HeapObject::kind)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.table.read().objects.contains_key(&handle)
    }

    /// Free an object. Returns `false` for unknown handles, for arrays that
    /// are still pinned and for direct buffers a call is using.
    pub fn free(&self, handle: Handle) -> bool {
        let mut table = self.table.write();
        let (pins, leases) = match table.objects.get(&handle) {
            None => return false,
            Some(HeapObject::Array(array)) => (array.pins, 0),
            Some(HeapObject::Direct(block)) => {
                let addr = block.as_ptr() as usize;
                (0, table.leases.get(&addr).copied().unwrap_or(0))
            }
            Some(HeapObject::Wrapped(_)) => (0, 0),
        };
        if pins > 0 {
            warn!(handle, pins, "refusing to free pinned array");
            return false;
        }
        if leases > 0 {
            warn!(handle, leases, "refusing to free direct buffer in use");
            return false;
        }
        if let Some(HeapObject::Direct(mut block)) = table.objects.remove(&handle) {
            block.wipe();
        }
        true
    }

    pub fn stats(&self) -> HeapStats {
        let table = self.table.read();
        let pins_outstanding = table
            .objects
            .values()
            .map(|obj| match obj {
                HeapObject::Array(array) => array.pins,
                _ => 0,
            })
            .sum();
        HeapStats {
            objects: table.objects.len(),
            pins_outstanding,
            direct_leases: table.leases.values().sum(),
            pins: table.pins,
            commits: table.commits,
            discards: table.discards,
        }
    }

    fn unpin(table: &mut HeapTable, array: Handle) -> Option<&mut ByteArray> {
        match table.objects.get_mut(&array) {
            Some(HeapObject::Array(array)) => {
                array.pins = array.pins.saturating_sub(1);
                Some(array)
            }
            _ => {
                warn!(array, "release of a pin on a missing array");
                None
            }
        }
    }
}

impl ManagedRuntime for ManagedHeap {
    type Buffer = Handle;
    type Array = Handle;

    fn direct_region(&self, buffer: &Handle) -> Option<RawRegion> {
        let mut table = self.table.write();
        let region = match table.objects.get(buffer) {
            Some(HeapObject::Direct(block)) => RawRegion {
                ptr: block.as_ptr(),
                capacity: block.len(),
            },
            _ => return None,
        };
        if region.capacity > 0 {
            *table.leases.entry(region.ptr as usize).or_insert(0) += 1;
        }
        Some(region)
    }

    fn release_direct(&self, region: RawRegion) {
        let mut table = self.table.write();
        let addr = region.ptr as usize;
        let Some(count) = table.leases.get_mut(&addr) else {
            warn!(capacity = region.capacity, "release of an unknown direct region");
            return;
        };
        *count -= 1;
        if *count == 0 {
            table.leases.remove(&addr);
        }
    }

    fn backing_array(&self, buffer: &Handle) -> BridgeResult<Handle> {
        match self.table.read().get(*buffer)? {
            HeapObject::Wrapped(window) => Ok(window.array),
            other => Err(BridgeError::NoBackingArray(format!(
                "handle {} is a {:?}",
                buffer,
                other.kind()
            ))),
        }
    }

    fn logical_offset(&self, buffer: &Handle) -> BridgeResult<usize> {
        Ok(self.table.read().window(*buffer)?.offset)
    }

    fn remaining_length(&self, buffer: &Handle) -> BridgeResult<usize> {
        Ok(self.table.read().window(*buffer)?.len)
    }

    fn pin(&self, array: &Handle) -> BridgeResult<NativeBlock> {
        let mut table = self.table.write();
        let elements = match table.objects.get_mut(array) {
            Some(HeapObject::Array(array)) => {
                let elements = NativeBlock::try_copy_of(&array.data)?;
                array.pins += 1;
                elements
            }
            _ => {
                return Err(BridgeError::PinFailed(format!(
                    "array {} no longer exists",
                    array
                )))
            }
        };
        table.pins += 1;
        Ok(elements)
    }

    fn commit(&self, array: &Handle, mut elements: NativeBlock, window: Range<usize>) {
        let mut table = self.table.write();
        table.commits += 1;
        if let Some(target) = Self::unpin(&mut table, *array) {
            match (target.data.get_mut(window.clone()), elements.as_slice().get(window)) {
                (Some(dst), Some(src)) => dst.copy_from_slice(src),
                _ => warn!(array, "commit window outside array"),
            }
        }
        elements.wipe();
    }

    fn discard(&self, array: &Handle, mut elements: NativeBlock) {
        let mut table = self.table.write();
        table.discards += 1;
        Self::unpin(&mut table, *array);
        elements.wipe();
    }
}
