//! Instruction implementations by category.

pub mod bcd;
pub mod bit_manip;
pub mod bitfield;
pub mod callm;
pub mod cmp2_chk2;
pub mod compare_swap;
pub mod data_movement;
pub mod integer_arith;
pub mod logical;
pub mod moves;
pub mod mul_div;
pub mod mul_div_long;
pub mod shift_rotate;
