//! A library of the standard comparison, bit-decomposition and array gadgets.
//!
//! Each function defines its template in a [`CircuitBuilder`] (once per parameter set) and returns
//! the template id. Layouts match the compiled gadgets signal for signal, so a gadget can be used
//! as a circuit's main template or as a child of a larger template.
//!
//! [`CircuitBuilder`]: crate::builder::CircuitBuilder

pub mod array;
pub mod bitify;
pub mod comparators;

pub use array::{
  array_mul, contains, generic_array_add, is_equal_array, scalar_array_mul, switch_array,
};
pub use bitify::num2bits;
pub use comparators::{
  greater_eq_than, in_range, is_equal, is_zero, less_eq_than, less_than,
};
