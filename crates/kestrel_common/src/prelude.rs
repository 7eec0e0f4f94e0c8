pub use core::prelude::*;

pub use crate::collections::{DynArray, ReserveStrategy};
pub use crate::function::{Function, bind_member, bind_const_member};
pub use crate::dynarray;
