//! Data Transfer Objects
//!
//! Wire formats exchanged with the hosting runtime, the model service and the
//! stream producer. DTOs stay close to the JSON shapes; domain types are derived from them.

pub mod event;
pub mod invocation;
pub mod model;
