//! Email composition and delivery.

pub mod service;

pub use service::*;
