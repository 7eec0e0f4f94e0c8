pub(crate) mod elements;
pub(crate) mod raw_array;
