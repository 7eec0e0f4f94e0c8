//! Value-semantics containers with explicit control over allocation and element lifetimes.
//!
//! - [`collections::DynArray`]: a growable array built directly on [`alloc::allocate`] and [`alloc::free`]
//! - [`function::Function`]: a type-erased callable with an inline small buffer

#[macro_use]
extern crate scopeguard;

pub mod alloc;
pub mod collections;
pub mod function;

pub mod prelude;
