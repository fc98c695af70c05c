use anyhow::Result;
use frz_pipeline_builtins::HostEvent;
use serde_json::{Value, json};

use crate::workflow::{ActionReport, PipelineOutcome};

const PREVIEW_SEPARATOR: &str = "---";

/// Print rendered labels, one per line, followed by the preview and the
/// action report when present.
pub(crate) fn print_plain(outcome: &PipelineOutcome) {
	for item in &outcome.items {
		println!("{}", item.label);
	}
	if let Some(preview) = &outcome.preview {
		match &preview.filename {
			Some(name) => println!("{PREVIEW_SEPARATOR} {name}"),
			None => println!("{PREVIEW_SEPARATOR}"),
		}
		for line in &preview.content {
			println!("{line}");
		}
	}
	if let Some(report) = &outcome.action {
		for event in &report.events {
			println!("{}: {}", report.name, describe(event));
		}
	}
}

/// Format the outcome as a JSON document.
pub(crate) fn format_outcome_json(outcome: &PipelineOutcome) -> Result<String> {
	let payload = json!({
		"query": outcome.query,
		"total": outcome.total,
		"items": outcome.items,
		"preview": outcome.preview,
		"action": outcome.action.as_ref().map(action_json),
	});

	Ok(serde_json::to_string_pretty(&payload)?)
}

/// Print the JSON representation of the outcome.
pub(crate) fn print_json(outcome: &PipelineOutcome) -> Result<()> {
	println!("{}", format_outcome_json(outcome)?);
	Ok(())
}

fn action_json(report: &ActionReport) -> Value {
	json!({
		"name": report.name,
		"chain": report.outcome.is_chain(),
		"events": report.events.iter().map(describe).collect::<Vec<_>>(),
	})
}

/// One-line description of a host primitive.
fn describe(event: &HostEvent) -> String {
	match event {
		HostEvent::Open(request) => {
			let mut text = format!(
				"{} {}",
				request.opener.as_deref().unwrap_or("edit"),
				request.path.display()
			);
			if let Some(line) = request.line {
				text.push_str(&format!(":{line}"));
				if let Some(column) = request.column {
					text.push_str(&format!(":{column}"));
				}
			}
			text
		}
		HostEvent::Execute(command) => format!("execute {command}"),
		HostEvent::Prompt { message, default } => format!("prompt {message}{default}"),
		HostEvent::Register { register, value } => format!("register {register} {value:?}"),
		HostEvent::Echo(message) => format!("echo {message}"),
	}
}

#[cfg(test)]
mod tests {
	use frz_pipeline::{ActionOutcome, Decoration, Detail, DisplayItem, Item, OpenRequest, PreviewItem};

	use super::*;

	fn outcome() -> PipelineOutcome {
		let item = Item::new(0u64, "src/main.rs", Detail::new().with("path", "src/main.rs"))
			.with_decorations(vec![Decoration::new(5, 4)]);
		PipelineOutcome {
			query: "main".into(),
			total: 4,
			items: vec![DisplayItem::from(item)],
			preview: Some(PreviewItem::from_text("fn main() {}").with_filename("main.rs")),
			action: Some(ActionReport {
				name: "open".into(),
				outcome: ActionOutcome::Done,
				events: vec![HostEvent::Open(
					OpenRequest::new("src/main.rs").with_opener("split").at(Some(3), Some(1)),
				)],
			}),
		}
	}

	#[test]
	fn json_output_carries_labels_decorations_and_preview() {
		let json = format_outcome_json(&outcome()).unwrap();
		let value: Value = serde_json::from_str(&json).unwrap();
		assert_eq!(value["query"], "main");
		assert_eq!(value["total"], 4);
		assert_eq!(value["items"][0]["label"], "src/main.rs");
		assert_eq!(value["items"][0]["decorations"][0]["column"], 5);
		assert_eq!(value["items"][0]["detail"]["path"], "src/main.rs");
		assert_eq!(value["preview"]["filename"], "main.rs");
		assert_eq!(value["action"]["events"][0], "split src/main.rs:3:1");
		assert_eq!(value["action"]["chain"], false);
	}

	#[test]
	fn events_are_described_on_one_line() {
		assert_eq!(describe(&HostEvent::Execute("cd /tmp".into())), "execute cd /tmp");
		assert_eq!(
			describe(&HostEvent::Register {
				register: "\"".into(),
				value: "a\nb".into(),
			}),
			r#"register " "a\nb""#
		);
	}

	#[test]
	fn plain_output_prints_without_panic() {
		print_plain(&outcome());
	}
}
