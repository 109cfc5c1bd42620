//! Bounded concurrent fan-out over independent storage calls.

use std::future::Future;

use futures::future;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

/// Runs `f` over `items` with at most `limit` calls in flight and returns the results in input
/// order. Once `cancel` fires, items that have not started resolve to [`Error::Cancelled`]
/// without calling `f`; started calls run to completion.
pub(crate) async fn bounded<I, T, F, Fut>(
	items: I,
	limit: usize,
	cancel: &CancellationToken,
	f: F,
) -> Vec<Result<T>>
where
	I: IntoIterator,
	F: Fn(I::Item) -> Fut,
	Fut: Future<Output = Result<T>>,
{
	let semaphore = Semaphore::new(limit.max(1));
	let semaphore = &semaphore;
	let f = &f;
	let calls = items.into_iter().map(|item| async move {
		let _permit = tokio::select! {
			biased;
			_ = cancel.cancelled() => return Err(Error::Cancelled),
			permit = semaphore.acquire() => permit.map_err(|_| Error::Cancelled)?,
		};

		if cancel.is_cancelled() {
			return Err(Error::Cancelled);
		}

		f(item).await
	});

	future::join_all(calls).await
}
