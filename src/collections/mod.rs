
mod imp;
mod opt_arr;

use core::alloc::Layout;

pub use opt_arr::*;

//--------------------------------------------------------------

macro_rules! impl_slot_partial_eq {
    ([$($vars:tt)*] $lhs:ty, $rhs:ty) => {
        impl<T, $($vars)*> PartialEq<$rhs> for $lhs where
            T : PartialEq
        {
            #[inline]
            fn eq(&self, other: &$rhs) -> bool { self[..] == other[..] }
            #[inline]
            fn ne(&self, other: &$rhs) -> bool { self[..] != other[..] }
        }
    };
}
pub(crate) use impl_slot_partial_eq;

//--------------------------------------------------------------

/// The error returned when a container cannot acquire the storage it was
/// asked for.
///
/// Infallible entry points funnel this into a panic (capacity overflow) or
/// [`std::alloc::handle_alloc_error`] (allocation failure). A failed growth
/// attempt leaves the container exactly as it was.
#[derive(Debug)]
pub enum TryReserveError {
    CapacityOverflow,
    AllocError(Layout),
}

//--------------------------------------------------------------

/// A trait used to define a strategy to reserve additional memory for containers.
pub trait ReserveStrategy {
    /// Calculate the new capacity for a container.
    ///
    /// `cur_capacity` represents the current capacity of the container.
    ///
    /// `min_capacity` represents the minimum required capacity to be able to resize.
    ///
    /// Returns `Err(())` if the capacity were to overflow
    fn calculate(cur_capacity: usize, min_capacity: usize) -> Result<usize, ()>;
}

/// A reserve strategy that returns the smallest power of `FACTOR` that covers
/// the required capacity.
///
/// Capacities produced by this strategy only ever sit on the tiers
/// `1, FACTOR, FACTOR^2, ...`, so a run of single-element growth requests
/// reallocates logarithmically often.
pub struct GeometricGrowth<const FACTOR: usize = 2>;

impl<const FACTOR: usize> GeometricGrowth<FACTOR> {
    const FACTOR_AT_LEAST_TWO: () = assert!(FACTOR >= 2, "growth factor must be at least 2");
}

impl<const FACTOR: usize> ReserveStrategy for GeometricGrowth<FACTOR> {
    fn calculate(_cur_capacity: usize, min_capacity: usize) -> Result<usize, ()> {
        let _: () = Self::FACTOR_AT_LEAST_TWO;

        let mut new_cap = 1usize;
        while new_cap < min_capacity {
            new_cap = match new_cap.checked_mul(FACTOR) {
                Some(cap) => cap,
                None => return Err(()),
            };
        }

        if new_cap <= isize::MAX as usize {
            Ok(new_cap)
        } else {
            Err(())
        }
    }
}
