//! Handles, structures, and info result enumerators.

pub mod abs;
pub mod enums;
pub mod structs;
