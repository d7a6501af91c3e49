//! Core domain types
//!
//! These types are created fresh for every invocation and discarded at the end of it.
//! They are shared between the client crate (wire payloads) and the runner (pipeline).

pub mod analysis;
pub mod invocation;
pub mod knowledge;
pub mod log;
