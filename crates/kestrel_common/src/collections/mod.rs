
mod imp;

mod dyn_array;

use core::{alloc::Layout, fmt};

pub use dyn_array::*;

//--------------------------------------------------------------

macro_rules! impl_slice_partial_eq_generic {
    ([$($vars:tt)*] $lhs:ty, $rhs:ty $(where $ty:ty: $bound:ident)?) => {
        impl<T, U, $($vars)*> PartialEq<$rhs> for $lhs  where
            T : PartialEq<U>,
            $($ty: $bound)?
        {
            #[inline]
            fn eq(&self, other: &$rhs) -> bool { self[..] == other[..] }
            #[inline]
            fn ne(&self, other: &$rhs) -> bool { self[..] != other[..] }
        }
    };
}
use impl_slice_partial_eq_generic;

//--------------------------------------------------------------

/// Error returned when a container could not reserve memory.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum TryReserveError {
    /// The requested capacity exceeds the maximum size of an allocation (`isize::MAX` bytes).
    CapacityOverflow,
    /// The allocator could not provide memory for the layout.
    AllocError {
        layout: Layout
    },
}

impl fmt::Display for TryReserveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("memory allocation failed")?;
        match self {
            TryReserveError::CapacityOverflow => f.write_str(" because the computed capacity exceeded the collection's maximum"),
            TryReserveError::AllocError { layout } => write!(f, " because the memory allocator returned an error (size: {}, align: {})", layout.size(), layout.align()),
        }
    }
}

impl std::error::Error for TryReserveError {}

//--------------------------------------------------------------

/// A trait used to define a strategy to reserve additional memory for containers.
pub trait ReserveStrategy {
    /// Calculate the new capacity for a container.
    /// 
    /// `cur_capacity` represents the current capacity of the container.
    /// 
    /// `min_capacity` represents the minimum required capacity to be able to resize.
    /// 
    /// The returned capacity is never smaller than `min_capacity`.
    /// 
    /// Returns `Err(TryReserveError::CapacityOverflow)` if the capacity were to overflow
    fn calculate(cur_capacity: usize, min_capacity: usize) -> Result<usize, TryReserveError>;
}

/// A reserve strategy that grows the capacity by half of the current capacity on top of the minimum required capacity.
/// 
/// When growing by a single element, this results in `len + capacity / 2 + 1`.
/// When growing by multiple elements, containers pass `new_len + 1` as the minimum, resulting in `new_len + capacity / 2 + 1`.
pub struct HalfCapacityReserveStrategy;

impl ReserveStrategy for HalfCapacityReserveStrategy {
    fn calculate(cur_capacity: usize, min_capacity: usize) -> Result<usize, TryReserveError> {
        min_capacity.checked_add(cur_capacity / 2).ok_or(TryReserveError::CapacityOverflow)
    }
}

/// A reserve strategy that will try to either return double the current capacity, or the minimum required capacity, whichever is bigger.
pub struct DoubleOrMinReserveStrategy;

impl ReserveStrategy for DoubleOrMinReserveStrategy {
    fn calculate(cur_capacity: usize, min_capacity: usize) -> Result<usize, TryReserveError> {
        let double_cap = cur_capacity.checked_mul(2).ok_or(TryReserveError::CapacityOverflow)?;
        Ok(double_cap.max(min_capacity))
    }
}

/// A reserve strategy that will return a power of 2 capacity
pub struct Pow2ReserveStrategy;

impl ReserveStrategy for Pow2ReserveStrategy {
    fn calculate(_cur_capacity: usize, min_capacity: usize) -> Result<usize, TryReserveError> {
        min_capacity.checked_next_power_of_two().ok_or(TryReserveError::CapacityOverflow)
    }
}
