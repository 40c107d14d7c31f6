//! Document store access.

pub mod records;

pub use records::*;
