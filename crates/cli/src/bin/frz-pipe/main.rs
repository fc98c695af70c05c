mod app_dirs;
mod cli;
mod logging;
mod output;
mod settings;
mod workflow;

use anyhow::Result;
use clap::Parser;
use cli::{CliArgs, OutputFormat};
use frz_pipeline::CancellationToken;
use output::{print_json, print_plain};
use settings::ResolvedConfig;
use workflow::PipelineWorkflow;

#[tokio::main]
async fn main() -> Result<()> {
	logging::init();
	let cli = CliArgs::parse();
	let resolved = settings::load(&cli)?;

	if cli.print_config {
		resolved.print_summary();
	}

	run_pipeline(resolved).await
}

/// Evaluate the pipeline once and print the outcome in the chosen format.
async fn run_pipeline(settings: ResolvedConfig) -> Result<()> {
	let format = settings.format;
	let token = CancellationToken::new();
	let interrupt = token.clone();
	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			tracing::debug!("interrupted, cancelling the pipeline");
			interrupt.cancel();
		}
	});

	let workflow = PipelineWorkflow::from_config(settings)?;
	let outcome = workflow.run(&token).await?;

	match format {
		OutputFormat::Plain => print_plain(&outcome),
		OutputFormat::Json => print_json(&outcome)?,
	}

	Ok(())
}
