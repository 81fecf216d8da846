use core::{
    alloc::Layout,
    marker::PhantomData,
    mem::{align_of, size_of},
    ptr::NonNull,
};
use std::alloc;

use crate::collections::{ReserveStrategy, TryReserveError};

/// Low level utility for more ergonomically allocating, growing, and
/// deallocating a buffer of memory without having to worry about all the
/// corner cases involved. In particular:
///
/// - Produces a dangling pointer on zero-sized types.
/// - Produces a dangling pointer on zero-length allocations.
/// - Avoids freeing a dangling pointer.
/// - Catches all overflows in capacity computations (promotes them to
///   "capacity overflow" errors).
/// - Leaves the existing allocation untouched when a growth attempt fails.
///
/// This type does not in any way inspect the memory it manages. When dropped
/// it *will* free its memory, but it *won't* try to drop its contents. It is
/// up to the user of `RawArray` to handle the actual things *stored* inside.
///
/// Note that the capacity of a zero-sized type is always infinite, so
/// `capacity()` always returns `usize::MAX` for them.
pub(crate) struct RawArray<T, R: ReserveStrategy> {
    ptr:       NonNull<T>,
    cap:       usize,
    _strategy: PhantomData<R>,
}

impl<T, R: ReserveStrategy> RawArray<T, R> {
    /// Creates the biggest possible `RawArray` without allocating.
    ///
    /// If `T` has a non-zero size, this makes a `RawArray` with a capacity of
    /// `0`. If `T` is zero-sized, it makes a `RawArray` with a capacity of
    /// `usize::MAX`.
    #[must_use]
    pub const fn dangling() -> Self {
        Self { ptr: NonNull::dangling(), cap: 0, _strategy: PhantomData }
    }

    /// Tries to create a `RawArray` with exactly the capacity and alignment
    /// requirements for a `[T; capacity]`.
    ///
    /// This is equivalent to calling `RawArray::dangling` when `capacity` is
    /// `0` or `T` is zero-sized. Note that if `T` is zero-sized this means you
    /// will *not* get a `RawArray` with the requested capacity.
    pub fn try_with_capacity(capacity: usize) -> Result<Self, TryReserveError> {
        if size_of::<T>() == 0 || capacity == 0 {
            return Ok(Self::dangling());
        }

        let layout = match Layout::array::<T>(capacity) {
            Ok(layout) => layout,
            Err(_) => return Err(TryReserveError::CapacityOverflow),
        };
        if layout.size() > isize::MAX as usize {
            return Err(TryReserveError::CapacityOverflow);
        }

        // SAFETY: `layout` has a non-zero size here.
        let ptr = unsafe { alloc::alloc(layout) };
        match NonNull::new(ptr as *mut T) {
            Some(ptr) => Ok(Self { ptr, cap: capacity, _strategy: PhantomData }),
            None => Err(TryReserveError::AllocError(layout)),
        }
    }

    /// Get the capacity of the allocation.
    ///
    /// This will always be `usize::MAX` if `T` is zero-sized.
    pub fn capacity(&self) -> usize {
        if size_of::<T>() == 0 {
            usize::MAX
        } else {
            self.cap
        }
    }

    /// Get a raw pointer to the start of the allocation.
    ///
    /// Note that this is a dangling pointer when `capacity() == 0` or `T` is
    /// zero-sized.
    pub fn ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Grows the buffer to the strategy tier that covers `min_capacity`.
    ///
    /// `min_capacity` must exceed the current capacity. On failure the
    /// existing allocation is left untouched, so the caller's length and
    /// contents stay valid.
    pub fn try_grow(&mut self, min_capacity: usize) -> Result<(), TryReserveError> {
        debug_assert!(min_capacity > self.capacity());

        if size_of::<T>() == 0 {
            // Since the capacity is `usize::MAX` for zero-sized types, getting
            // here necessarily means the `RawArray` is overfull.
            return Err(TryReserveError::CapacityOverflow);
        }

        let new_cap = match R::calculate(self.cap, min_capacity) {
            Ok(cap) => cap,
            Err(()) => return Err(TryReserveError::CapacityOverflow),
        };
        let new_layout = match Layout::array::<T>(new_cap) {
            Ok(layout) => layout,
            Err(_) => return Err(TryReserveError::CapacityOverflow),
        };
        if new_layout.size() > isize::MAX as usize {
            return Err(TryReserveError::CapacityOverflow);
        }

        let ptr = match self.current_memory() {
            // SAFETY: `old_ptr` was allocated with `old_layout`, and the new
            // size was checked against `isize::MAX` above.
            Some((old_ptr, old_layout)) => unsafe {
                alloc::realloc(old_ptr.as_ptr(), old_layout, new_layout.size())
            },
            // SAFETY: `new_layout` has a non-zero size.
            None => unsafe { alloc::alloc(new_layout) },
        };

        match NonNull::new(ptr as *mut T) {
            Some(ptr) => {
                self.ptr = ptr;
                self.cap = new_cap;
                Ok(())
            }
            None => Err(TryReserveError::AllocError(new_layout)),
        }
    }

    fn current_memory(&self) -> Option<(NonNull<u8>, Layout)> {
        if size_of::<T>() == 0 || self.cap == 0 {
            None
        } else {
            // The allocation already exists, so the size computation cannot
            // overflow and the layout is known to be valid.
            let size = size_of::<T>() * self.cap;
            let layout = unsafe { Layout::from_size_align_unchecked(size, align_of::<T>()) };
            Some((self.ptr.cast(), layout))
        }
    }
}

impl<T, R: ReserveStrategy> Drop for RawArray<T, R> {
    fn drop(&mut self) {
        if let Some((ptr, layout)) = self.current_memory() {
            // SAFETY: the pointer was allocated by the global allocator with
            // this exact layout.
            unsafe { alloc::dealloc(ptr.as_ptr(), layout) };
        }
    }
}

/// Central function for reserve error handling
#[cold]
pub(crate) fn handle_error(e: TryReserveError) -> ! {
    match e {
        TryReserveError::CapacityOverflow => capacity_overflow(),
        TryReserveError::AllocError(layout) => alloc::handle_alloc_error(layout),
    }
}

fn capacity_overflow() -> ! {
    panic!("capacity overflow");
}
