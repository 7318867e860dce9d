//! Langbase Pipes API client and the generation service built on it.

mod client;
mod generator;
mod types;

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;

pub use client::{LangbaseClient, PipeSpec};
pub use generator::PipeGenerator;
pub use types::*;
