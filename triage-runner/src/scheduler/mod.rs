//! Scheduler layer for the runner
//!
//! Pulls invocations from the hosting runtime, bounds each one by its
//! deadline and reports the outcome back.

pub mod poller;

pub use poller::InvocationPoller;
