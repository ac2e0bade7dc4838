//! Host memory management.
//!
//! Provides an RAII wrapper for pinned (page-locked semantics) host memory,
//! plus an unchecked view type that asynchronous transfers read from while
//! the controlling task keeps ownership of the allocation.

use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::error::{OverlapError, Result};

/// Pinned host memory for DMA-style transfers.
///
/// The allocation is released exactly once when the buffer is dropped,
/// including on every error path. Elements are zero-initialized; callers
/// typically overwrite them via [`fill_with`](Self::fill_with) before the
/// first transfer.
pub struct PinnedBuffer<T: Copy> {
    ptr: NonNull<T>,
    len: usize,
    layout: Layout,
    _marker: PhantomData<T>,
}

impl<T: Copy> PinnedBuffer<T> {
    /// Allocate pinned memory for `count` elements.
    pub fn new(count: usize) -> Result<Self> {
        if count == 0 {
            return Err(OverlapError::InvalidConfig(
                "cannot allocate zero-sized host buffer".to_string(),
            ));
        }

        let layout = Layout::array::<T>(count).map_err(|_| OverlapError::HostAllocationFailed {
            size: count.saturating_mul(std::mem::size_of::<T>()),
        })?;

        // A production backend would use platform pinned allocation here
        // (cuMemAllocHost, mlock). Zeroed bytes are a valid value for every
        // T this benchmark uses.
        let ptr = unsafe { alloc_zeroed(layout) };

        let ptr = NonNull::new(ptr as *mut T)
            .ok_or(OverlapError::HostAllocationFailed { size: layout.size() })?;

        Ok(Self {
            ptr,
            len: count,
            layout,
            _marker: PhantomData,
        })
    }

    /// Create pinned memory from a slice, copying the data.
    pub fn from_slice(data: &[T]) -> Result<Self> {
        let mut buf = Self::new(data.len())?;
        buf.as_mut_slice().copy_from_slice(data);
        Ok(buf)
    }

    /// Get slice reference.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: ptr/len describe a live, initialized allocation owned by
        // self.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// Get mutable slice reference.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as above, and &mut self guarantees exclusive access on the
        // host side.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Overwrite every element with `f(index)`.
    pub fn fill_with(&mut self, mut f: impl FnMut(usize) -> T) {
        for (i, slot) in self.as_mut_slice().iter_mut().enumerate() {
            *slot = f(i);
        }
    }

    /// Get number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get size in bytes.
    pub fn size_bytes(&self) -> usize {
        self.len * std::mem::size_of::<T>()
    }

    /// Create an unchecked view for an in-flight transfer to read.
    ///
    /// # Safety
    ///
    /// The view carries no lifetime. The caller must keep the buffer alive
    /// for as long as any operation reads the view, and must not mutate the
    /// buffer while such an operation is in flight. In the benchmark this is
    /// upheld by waiting on each transfer handle before the next host-side
    /// mutation.
    pub unsafe fn view(&self) -> HostView<T> {
        HostView {
            ptr: self.ptr.as_ptr(),
            len: self.len,
        }
    }
}

impl<T: Copy> Drop for PinnedBuffer<T> {
    fn drop(&mut self) {
        // SAFETY: ptr was allocated with this exact layout and is freed only
        // here.
        unsafe {
            dealloc(self.ptr.as_ptr() as *mut u8, self.layout);
        }
    }
}

// SAFETY: PinnedBuffer owns its allocation and can move between threads.
unsafe impl<T: Copy + Send> Send for PinnedBuffer<T> {}
unsafe impl<T: Copy + Sync> Sync for PinnedBuffer<T> {}

/// Borrowless read view of a [`PinnedBuffer`], handed to asynchronous
/// transfers.
///
/// Constructed only via the unsafe [`PinnedBuffer::view`]; the construction
/// contract guarantees the pointed-to memory stays valid and unmutated while
/// any holder of the view reads it.
#[derive(Debug, Clone, Copy)]
pub struct HostView<T: Copy> {
    ptr: *const T,
    len: usize,
}

impl<T: Copy> HostView<T> {
    /// Number of elements visible through the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read access to the viewed elements.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: upheld by the PinnedBuffer::view construction contract.
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }
}

// SAFETY: the view is read-only and its construction contract rules out
// concurrent host mutation, so it can cross thread boundaries.
unsafe impl<T: Copy + Send> Send for HostView<T> {}
unsafe impl<T: Copy + Sync> Sync for HostView<T> {}
