//! Growable arrays of optional elements.
//!
//! The crate provides [`OptArr`], a contiguous growable array in which every
//! logical position holds an *optional* element: a position can own a value,
//! or it can hold the empty sentinel (`None`) while still counting towards
//! the length. Spare capacity is tracked with the same sentinel, so every
//! allocated slot is initialized at all times.
//!
//! Capacity grows through pluggable [`ReserveStrategy`] tiers; the default
//! [`GeometricGrowth`] strategy picks the smallest power of its factor that
//! covers the requested capacity, which makes a sequence of appends amortized
//! *O*(1).
//!
//! ```
//! use optarr::optarr;
//!
//! let mut arr = optarr![1, 2, 3];
//! arr.push_back(None);
//! arr.set(0, 7);
//!
//! assert_eq!(arr, [Some(7), Some(2), Some(3), None]);
//! assert_eq!(arr.capacity(), 8);
//! ```

pub mod collections;

pub use collections::{GeometricGrowth, IntoIter, OptArr, ReserveStrategy, TryReserveError};
