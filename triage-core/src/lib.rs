//! Triage Core
//!
//! Core types and pure pipeline stages for the log triage system.
//!
//! This crate contains:
//! - Domain types: log batches, knowledge base, analysis text, verdicts and results
//! - DTOs: wire formats for stream events, model requests, stream frames and runtime responses
//! - Prompt construction
//!
//! Nothing in here performs I/O. Fetching, model calls and remediation live in the runner.

pub mod domain;
pub mod dto;
pub mod error;
pub mod prompt;

pub use error::DecodeError;
