//! Built-in stages for `frz-pipeline`.
//!
//! Everything here is an ordinary stage built with the `define_*` factories
//! of the core crate. Stages that need paths or positions read them from the
//! well-known [`location`] fields of a [`frz_pipeline::Detail`].

pub mod actions;
pub mod curators;
pub mod host;
pub mod location;
pub mod matchers;
pub mod paths;
pub mod previewers;
pub mod refiners;
pub mod renderers;
pub mod sorters;
pub mod sources;
pub mod stat;

pub use host::{HostEvent, LocalHost};
pub use location::Location;
