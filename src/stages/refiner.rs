//! Additive detail transforms with field contracts.
//!
//! A refiner reads the fields it declares in `requires` and may add the
//! fields it declares in `provides`; it must keep every field it received.
//! [`compose_refiners`] checks a chain against the producer's shape when the
//! pipeline is assembled, and the assembled chain re-checks every item at
//! run time so a producer that misdeclares its shape fails with the same
//! descriptive error on first use.

use std::fmt;
use std::sync::Arc;

use futures::stream::StreamExt;
use tokio_util::sync::CancellationToken;

use super::curator::{CurateParams, Curator, SharedCurator};
use super::source::{CollectParams, SharedSource, Source};
use crate::context::Context;
use crate::derivable::{Derivable, resolve_all};
use crate::detail::Shape;
use crate::error::{Error, Result};
use crate::stream::{ItemStream, guarded};

/// Name used for the producer end of a refiner chain in contract errors.
pub const PRODUCER_STAGE: &str = "producer";

/// Name used for the consumer end of a refiner chain in contract errors.
pub const OUTPUT_STAGE: &str = "refined output";

/// Fields a refiner reads and adds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefinerContract {
	name: String,
	requires: Shape,
	provides: Shape,
}

impl RefinerContract {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			requires: Shape::new(),
			provides: Shape::new(),
		}
	}

	#[must_use]
	pub fn requires<I, S>(mut self, fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.requires = Shape::of(fields);
		self
	}

	#[must_use]
	pub fn provides<I, S>(mut self, fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.provides = Shape::of(fields);
		self
	}

	#[must_use]
	pub fn name(&self) -> &str {
		&self.name
	}

	#[must_use]
	pub fn required(&self) -> &Shape {
		&self.requires
	}

	#[must_use]
	pub fn provided(&self) -> &Shape {
		&self.provides
	}
}

/// Item stream handed to a refiner.
pub struct RefineParams {
	pub items: ItemStream,
}

/// Detail transform that preserves existing fields and may add new ones.
pub trait Refiner: Send + Sync {
	fn contract(&self) -> &RefinerContract;

	fn refine(&self, ctx: &Context, params: RefineParams, token: &CancellationToken) -> ItemStream;
}

pub type SharedRefiner = Arc<dyn Refiner>;

struct FnRefiner<F> {
	contract: RefinerContract,
	refine: F,
}

impl<F> Refiner for FnRefiner<F>
where
	F: Fn(&Context, RefineParams, &CancellationToken) -> ItemStream + Send + Sync,
{
	fn contract(&self) -> &RefinerContract {
		&self.contract
	}

	fn refine(&self, ctx: &Context, params: RefineParams, token: &CancellationToken) -> ItemStream {
		(self.refine)(ctx, params, token)
	}
}

pub fn define_refiner<F>(contract: RefinerContract, refine: F) -> SharedRefiner
where
	F: Fn(&Context, RefineParams, &CancellationToken) -> ItemStream + Send + Sync + 'static,
{
	Arc::new(FnRefiner { contract, refine })
}

/// Refiner that adds no fields: it only narrows the stream or mutates
/// fields that already exist.
pub fn define_filter<I, S, F>(name: impl Into<String>, requires: I, refine: F) -> SharedRefiner
where
	I: IntoIterator<Item = S>,
	S: Into<String>,
	F: Fn(&Context, RefineParams, &CancellationToken) -> ItemStream + Send + Sync + 'static,
{
	define_refiner(RefinerContract::new(name).requires(requires), refine)
}

/// Validated sequence of refiners, see [`compose_refiners`].
pub struct RefinerChain {
	stages: Vec<SharedRefiner>,
	contract: RefinerContract,
	input: Shape,
	output: Shape,
}

impl RefinerChain {
	/// Fields every item leaving the chain carries.
	#[must_use]
	pub fn output(&self) -> &Shape {
		&self.output
	}

	#[must_use]
	pub fn input(&self) -> &Shape {
		&self.input
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.stages.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.stages.is_empty()
	}
}

impl fmt::Debug for RefinerChain {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let stages: Vec<&str> = self.stages.iter().map(|stage| stage.contract().name()).collect();
		f.debug_struct("RefinerChain")
			.field("stages", &stages)
			.field("input", &self.input)
			.field("output", &self.output)
			.finish()
	}
}

impl Refiner for RefinerChain {
	fn contract(&self) -> &RefinerContract {
		&self.contract
	}

	fn refine(&self, ctx: &Context, params: RefineParams, token: &CancellationToken) -> ItemStream {
		let mut items = guarded(params.items, token);
		let mut upstream = PRODUCER_STAGE.to_string();
		for stage in &self.stages {
			let contract = stage.contract();
			let checked = require_fields(items, contract.name(), &upstream, contract.required());
			items = guarded(stage.refine(ctx, RefineParams { items: checked }, token), token);
			upstream = contract.name().to_string();
		}
		require_fields(items, OUTPUT_STAGE, &upstream, &self.output)
	}
}

/// Validate and assemble refiners over producer items of shape `input`.
///
/// Fails with [`Error::Contract`] naming the first refiner whose required
/// fields are neither in `input` nor provided by an earlier refiner.
pub fn compose_refiners<I>(input: &Shape, refiners: I) -> Result<RefinerChain>
where
	I: IntoIterator,
	I::Item: Into<Derivable<SharedRefiner>>,
{
	let stages: Vec<SharedRefiner> = resolve_all(refiners);
	let mut available = input.clone();
	let mut upstream = PRODUCER_STAGE;
	for stage in &stages {
		let contract = stage.contract();
		let missing = contract.required().missing(&available);
		if !missing.is_empty() {
			return Err(Error::Contract {
				stage: contract.name().to_string(),
				upstream: upstream.to_string(),
				missing,
			});
		}
		available.extend(contract.provided());
		upstream = contract.name();
	}
	let name = stages
		.iter()
		.map(|stage| stage.contract().name())
		.collect::<Vec<_>>()
		.join(" | ");
	tracing::debug!(chain = %name, input = %input, output = %available, "assembled refiner chain");
	let contract = RefinerContract {
		name,
		requires: input.clone(),
		provides: available.difference(input),
	};
	Ok(RefinerChain {
		stages,
		contract,
		input: input.clone(),
		output: available,
	})
}

fn require_fields(items: ItemStream, stage: &str, upstream: &str, required: &Shape) -> ItemStream {
	if required.is_empty() {
		return items;
	}
	let stage = stage.to_string();
	let upstream = upstream.to_string();
	let required = required.clone();
	items
		.map(move |item| {
			let item = item?;
			let missing = required.missing_from(&item.detail);
			if missing.is_empty() {
				Ok(item)
			} else {
				Err(Error::Contract {
					stage: stage.clone(),
					upstream: upstream.clone(),
					missing,
				})
			}
		})
		.boxed()
}

/// Source whose items pass through a refiner chain, see [`refine_source`].
pub struct RefinedSource {
	inner: SharedSource,
	chain: RefinerChain,
}

impl RefinedSource {
	/// Fields carried by every item this source yields.
	#[must_use]
	pub fn shape(&self) -> &Shape {
		self.chain.output()
	}
}

impl Source for RefinedSource {
	fn collect(&self, ctx: &Context, params: CollectParams, token: &CancellationToken) -> ItemStream {
		let items = self.inner.collect(ctx, params, token);
		self.chain.refine(ctx, RefineParams { items }, token)
	}
}

/// Wrap a source whose items carry `input` fields with a refiner chain.
pub fn refine_source<I>(
	source: impl Into<Derivable<SharedSource>>,
	input: &Shape,
	refiners: I,
) -> Result<RefinedSource>
where
	I: IntoIterator,
	I::Item: Into<Derivable<SharedRefiner>>,
{
	Ok(RefinedSource {
		inner: source.into().resolve(),
		chain: compose_refiners(input, refiners)?,
	})
}

/// Curator whose items pass through a refiner chain, see [`refine_curator`].
pub struct RefinedCurator {
	inner: SharedCurator,
	chain: RefinerChain,
}

impl RefinedCurator {
	#[must_use]
	pub fn shape(&self) -> &Shape {
		self.chain.output()
	}
}

impl Curator for RefinedCurator {
	fn curate(&self, ctx: &Context, params: CurateParams, token: &CancellationToken) -> ItemStream {
		let items = self.inner.curate(ctx, params, token);
		self.chain.refine(ctx, RefineParams { items }, token)
	}
}

pub fn refine_curator<I>(
	curator: impl Into<Derivable<SharedCurator>>,
	input: &Shape,
	refiners: I,
) -> Result<RefinedCurator>
where
	I: IntoIterator,
	I::Item: Into<Derivable<SharedRefiner>>,
{
	Ok(RefinedCurator {
		inner: curator.into().resolve(),
		chain: compose_refiners(input, refiners)?,
	})
}

#[cfg(test)]
mod tests;
