use futures::stream::StreamExt;
use serde_json::{Value, json};

use super::*;
use crate::detail::Detail;
use crate::item::Item;
use crate::stages::curator::define_curator;
use crate::stages::source::define_source;
use crate::stream::{collect_items, from_items};

fn mapping(contract: RefinerContract, update: fn(&mut Detail)) -> SharedRefiner {
	define_refiner(contract, move |_, params, _| {
		params
			.items
			.map(move |item| {
				item.map(|mut item| {
					update(&mut item.detail);
					item
				})
			})
			.boxed()
	})
}

/// `{a} -> {A}`, copying `a` into `A`.
fn copy_a() -> SharedRefiner {
	mapping(
		RefinerContract::new("R1").requires(["a"]).provides(["A"]),
		|detail| {
			let a = detail.get("a").cloned().unwrap_or(Value::Null);
			detail.insert("A", a);
		},
	)
}

/// `{A} -> {B}`, repeating `A` three times.
fn triple_a() -> SharedRefiner {
	mapping(
		RefinerContract::new("R2").requires(["A"]).provides(["B"]),
		|detail| {
			let tripled = detail.get_str("A").unwrap_or_default().repeat(3);
			detail.insert("B", tripled);
		},
	)
}

fn source_of(details: Vec<Detail>) -> SharedSource {
	define_source(move |_, _, _| {
		from_items(
			details
				.clone()
				.into_iter()
				.enumerate()
				.map(|(index, detail)| Item::new(index, format!("item-{index}"), detail)),
		)
	})
}

async fn collect_from(source: &dyn Source) -> Result<Vec<Item>> {
	collect_items(source.collect(
		&Context::detached(),
		CollectParams::default(),
		&CancellationToken::new(),
	))
	.await
}

#[tokio::test]
async fn refiners_accumulate_fields_in_order() {
	let source = refine_source(
		source_of(vec![Detail::new().with("a", "x")]),
		&Shape::of(["a"]),
		[copy_a(), triple_a()],
	)
	.unwrap();
	assert_eq!(source.shape(), &Shape::of(["A", "B", "a"]));

	let items = collect_from(&source).await.unwrap();
	assert_eq!(items.len(), 1);
	assert_eq!(
		serde_json::to_value(&items[0].detail).unwrap(),
		json!({"a": "x", "A": "x", "B": "xxx"})
	);
}

#[test]
fn chains_debug_print_their_stages() {
	let chain = compose_refiners(&Shape::of(["a"]), [copy_a(), triple_a()]).unwrap();
	let printed = format!("{chain:?}");
	assert!(printed.starts_with("RefinerChain"));
	assert!(printed.contains(r#"stages: ["R1", "R2"]"#));
}

#[test]
fn reversed_chain_is_rejected_at_assembly() {
	let err = compose_refiners(&Shape::of(["a"]), [triple_a(), copy_a()]).unwrap_err();
	match err {
		Error::Contract {
			stage,
			upstream,
			missing,
		} => {
			assert_eq!(stage, "R2");
			assert_eq!(upstream, PRODUCER_STAGE);
			assert_eq!(missing, vec!["A"]);
		}
		other => panic!("expected contract violation, got {other:?}"),
	}
}

#[test]
fn violation_names_the_preceding_refiner() {
	let needs_c = mapping(RefinerContract::new("R3").requires(["C"]), |_| {});
	let err = compose_refiners(&Shape::of(["a"]), [copy_a(), needs_c]).unwrap_err();
	assert_eq!(
		err.to_string(),
		"stage 'R3' requires fields [C] that 'R1' does not provide"
	);
}

#[tokio::test]
async fn misdeclared_producer_fails_on_first_use() {
	let source = refine_source(
		source_of(vec![Detail::new().with("b", 1)]),
		&Shape::of(["a"]),
		[copy_a()],
	)
	.unwrap();
	let err = collect_from(&source).await.unwrap_err();
	assert_eq!(
		err.to_string(),
		"stage 'R1' requires fields [a] that 'producer' does not provide"
	);
}

#[tokio::test]
async fn refiner_that_skips_its_fields_is_reported() {
	let lazy = mapping(RefinerContract::new("lazy").provides(["z"]), |_| {});
	let source = refine_source(source_of(vec![Detail::new()]), &Shape::new(), [lazy]).unwrap();
	let err = collect_from(&source).await.unwrap_err();
	match err {
		Error::Contract { stage, upstream, .. } => {
			assert_eq!(stage, OUTPUT_STAGE);
			assert_eq!(upstream, "lazy");
		}
		other => panic!("expected contract violation, got {other:?}"),
	}
}

#[tokio::test]
async fn filters_narrow_without_adding_fields() {
	let even = define_filter("even", ["n"], |_, params, _| {
		params
			.items
			.filter(|item| {
				let keep = match item {
					Ok(item) => item.detail.get_u64("n").is_some_and(|n| n % 2 == 0),
					Err(_) => true,
				};
				futures::future::ready(keep)
			})
			.boxed()
	});
	assert!(even.contract().provided().is_empty());

	let details = (0..5).map(|n| Detail::new().with("n", n)).collect();
	let source = refine_source(source_of(details), &Shape::of(["n"]), [even]).unwrap();
	let items = collect_from(&source).await.unwrap();
	let ns: Vec<_> = items
		.iter()
		.filter_map(|item| item.detail.get_u64("n"))
		.collect();
	assert_eq!(ns, vec![0, 2, 4]);
	assert_eq!(source.shape(), &Shape::of(["n"]));
}

#[tokio::test]
async fn curators_can_be_refined() {
	let curator = define_curator(|_, params: CurateParams, _| {
		from_items([Item::new(
			0u64,
			params.query.clone(),
			Detail::new().with("a", params.query),
		)])
	});
	let refined = refine_curator(curator, &Shape::of(["a"]), [copy_a(), triple_a()]).unwrap();
	let items = collect_items(refined.curate(
		&Context::detached(),
		CurateParams::new(Vec::<String>::new(), "q"),
		&CancellationToken::new(),
	))
	.await
	.unwrap();
	assert_eq!(items[0].detail.get_str("B"), Some("qqq"));
	assert_eq!(refined.shape(), &Shape::of(["A", "B", "a"]));
}

#[tokio::test]
async fn chains_nest_as_refiners() {
	let inner = compose_refiners(&Shape::of(["a"]), [copy_a()]).unwrap();
	assert_eq!(inner.contract().provided(), &Shape::of(["A"]));
	let outer: SharedRefiner = Arc::new(inner);
	let chain = compose_refiners(&Shape::of(["a"]), [outer, triple_a()]).unwrap();
	assert_eq!(chain.output(), &Shape::of(["A", "B", "a"]));
	assert_eq!(chain.len(), 2);
}

#[tokio::test]
async fn derived_refiners_resolve_at_assembly() {
	let chain = compose_refiners(
		&Shape::of(["a"]),
		[Derivable::derive(copy_a), Derivable::from(triple_a())],
	)
	.unwrap();
	assert_eq!(chain.output(), &Shape::of(["A", "B", "a"]));
}

#[tokio::test]
async fn cancellation_stops_refined_stream() {
	let details = (0..100).map(|n| Detail::new().with("a", n)).collect();
	let source = refine_source(source_of(details), &Shape::of(["a"]), [copy_a()]).unwrap();
	let token = CancellationToken::new();
	let mut items = source.collect(&Context::detached(), CollectParams::default(), &token);

	let mut consumed = 0;
	while let Some(item) = items.next().await {
		item.unwrap();
		consumed += 1;
		if consumed == 3 {
			token.cancel();
		}
	}
	assert_eq!(consumed, 3);
}
