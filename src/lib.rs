//! Composable stages for fuzzy-finder pipelines.
//!
//! A picker is assembled from a producer (a [`Source`] or a query-aware
//! [`Curator`]), then [`Matcher`]s, [`Sorter`]s, [`Renderer`]s, [`Previewer`]s
//! and named [`Action`]s. Every stage kind has a `compose_*` operator that
//! turns a list of stages into one stage of the same kind, so pipelines nest.
//!
//! Item details are transformed either dynamically with field contracts
//! ([`Refiner`], [`compose_refiners`]) or with statically typed
//! [`Projector`]s. Long-running stages observe a
//! [`CancellationToken`](tokio_util::sync::CancellationToken) and stop
//! producing items once it fires.

pub mod context;
pub mod derivable;
pub mod detail;
pub mod error;
pub mod item;
pub mod picker;
pub mod stages;
pub mod stream;

pub use context::{BufferInfo, Context, Host, OpenRequest};
pub use derivable::Derivable;
pub use detail::{Detail, Shape};
pub use error::{Error, Result};
pub use item::{Decoration, DisplayItem, Item, ItemId, Payload, PreviewItem};
pub use picker::{PickerLauncher, PickerParams, Producer, SubmatchContext};
pub use stages::*;
pub use stream::{ItemStream, collect_items, from_items, from_receiver};
pub use tokio_util::sync::CancellationToken;
