// Orchestration engine - independent of the CLI

pub mod core;
pub mod graph;
pub mod monitor;
pub mod pipeline;
pub mod poster;
pub mod probe;
pub mod report;
pub mod signal;
pub mod transaction;
pub mod variants;
pub mod worker;

pub use core::*;
pub use monitor::CancelToken;
pub use variants::{EnabledVariants, Variant};
pub use worker::EngineSettings;
