//! Actions applied to the picked items.

mod cmd;
mod open;
mod submatch;

use frz_pipeline::{ActionOutcome, Context, Error, InvokeParams, Payload, SharedAction, define_action};
use serde::Serialize;

pub use cmd::{
	AttrGetter, CmdOptions, PLACEHOLDER, Restriction, cd, cmd, default_cd_actions, fnameescape, lcd,
	shellescape, tcd,
};
pub use open::{OpenOptions, default_open_actions, open};
pub use submatch::{SubmatchOptions, default_submatch_actions, submatch};

/// Register written by [`yank`] unless another is given.
pub const UNNAMED_REGISTER: &str = "\"";

/// Echo the targeted items as pretty-printed JSON.
pub fn echo<D: Payload + Clone + Serialize>() -> SharedAction<D> {
	define_action(|ctx: Context, params: InvokeParams<D>, _| async move {
		let message = serde_json::to_string_pretty(&params.targets())
			.map_err(|err| Error::Host(err.into()))?;
		ctx.host().echo(&message).await?;
		Ok(ActionOutcome::Done)
	})
}

/// Store the targeted values, one per line, in `register`.
pub fn yank<D: Payload + Clone>(register: impl Into<String>) -> SharedAction<D> {
	let register = register.into();
	define_action(move |ctx: Context, params: InvokeParams<D>, _| {
		let register = register.clone();
		async move {
			let value = params
				.targets()
				.iter()
				.map(|item| item.value.as_str())
				.collect::<Vec<_>>()
				.join("\n");
			ctx.host().set_register(&register, &value).await?;
			Ok(ActionOutcome::Done)
		}
	})
}

/// Action that does nothing.
pub fn noop<D: Payload + Clone>() -> SharedAction<D> {
	define_action(|_, _: InvokeParams<D>, _| async { Ok(ActionOutcome::Done) })
}
