//! Pipeline stage contracts and their composition operators.

pub mod action;
pub mod args;
pub mod curator;
pub mod matcher;
pub mod previewer;
pub mod projector;
pub mod refiner;
pub mod renderer;
pub mod sorter;
pub mod source;

pub use action::{Action, ActionOutcome, InvokeParams, SharedAction, compose_actions, define_action};
pub use args::{BoundArgs, bind_curator_args, bind_source_args};
pub use curator::{CurateParams, Curator, SharedCurator, compose_curators, define_curator};
pub use matcher::{MatchParams, Matcher, SharedMatcher, compose_matchers, define_matcher};
pub use previewer::{Previewer, SharedPreviewer, compose_previewers, define_previewer};
pub use projector::{
	ProjectParams, Projector, ProjectorExt, SharedProjector, compose_projectors, define_projector, dynamic_detail,
	pipe_curator_projectors, pipe_projectors, project_each, typed_detail,
};
pub use refiner::{
	RefineParams, Refiner, RefinerChain, RefinerContract, SharedRefiner, compose_refiners, define_filter,
	define_refiner, refine_curator, refine_source,
};
pub use renderer::{Renderer, SharedRenderer, compose_renderers, define_renderer};
pub use sorter::{SharedSorter, Sorter, compose_sorters, define_sorter};
pub use source::{CollectParams, SharedSource, Source, compose_sources, define_source};
