//! Lazy item sequences and the cancellation discipline around them.

use futures::future;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::detail::Detail;
use crate::error::{Error, Result};
use crate::item::{Item, Payload};

/// Lazy, fallible sequence of items produced for one evaluation.
pub type ItemStream<D = Detail> = BoxStream<'static, Result<Item<D>>>;

/// Fail with [`Error::Cancelled`] once the token has fired.
pub fn ensure_active(token: &CancellationToken) -> Result<()> {
	if token.is_cancelled() {
		Err(Error::Cancelled)
	} else {
		Ok(())
	}
}

/// End `stream` quietly once `token` fires.
///
/// The token is checked before every element is handed on, and a pending
/// upstream is abandoned as soon as cancellation is signalled.
pub fn guarded<T: Send + 'static>(
	stream: BoxStream<'static, T>,
	token: &CancellationToken,
) -> BoxStream<'static, T> {
	let check = token.clone();
	stream
		.take_until(token.clone().cancelled_owned())
		.take_while(move |_| future::ready(!check.is_cancelled()))
		.boxed()
}

/// Stream over already realized items.
pub fn from_items<D, I>(items: I) -> ItemStream<D>
where
	D: Payload,
	I: IntoIterator<Item = Item<D>>,
	I::IntoIter: Send + 'static,
{
	stream::iter(items.into_iter().map(Ok)).boxed()
}

/// Stream fed by a producer task through a bounded channel.
///
/// Dropping the stream closes the channel, which producers observe as a
/// failed send.
pub fn from_receiver<D: Payload>(receiver: mpsc::Receiver<Result<Item<D>>>) -> ItemStream<D> {
	ReceiverStream::new(receiver).boxed()
}

/// Stream that yields a single error.
pub fn failed<D: Payload>(err: Error) -> ItemStream<D> {
	stream::once(future::ready(Err(err))).boxed()
}

/// Drain a stream into a vector, stopping at the first error.
pub async fn collect_items<D: Payload>(items: ItemStream<D>) -> Result<Vec<Item<D>>> {
	items.try_collect().await
}
