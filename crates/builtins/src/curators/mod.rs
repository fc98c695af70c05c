//! Query-driven producers backed by external search tools.

mod grep;

use frz_pipeline::stream::from_items;
use frz_pipeline::{CurateParams, Payload, SharedCurator, define_curator};

pub use grep::{GrepTool, grep};

/// Curator yielding nothing for any query.
pub fn noop<D: Payload>() -> SharedCurator<D> {
	define_curator(|_, _: CurateParams, _| from_items(Vec::new()))
}
