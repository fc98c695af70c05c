use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding the log filter, e.g. `frz_pipeline=debug`.
pub(crate) const LOG_ENV: &str = "FRZ_PIPE_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Install the stderr subscriber.
pub(crate) fn init() {
	let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
	tracing_subscriber::registry()
		.with(filter)
		.with(fmt::layer().with_writer(std::io::stderr))
		.init();
}
