//! Produce every web-delivery variant of a single video in one
//! all-or-nothing run.

pub mod config;
pub mod engine;
pub mod error;

pub use error::{Error, Result};
