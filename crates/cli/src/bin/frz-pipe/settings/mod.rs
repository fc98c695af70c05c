//! Configuration loading and resolution.
//!
//! `load` is the entry point: it layers config files and environment
//! variables, applies CLI overrides and returns a validated
//! [`ResolvedConfig`].

mod loader;
mod raw;
mod resolved;
mod sources;

pub(crate) use loader::load;
pub(crate) use resolved::{ProducerConfig, ResolvedConfig};
