use std::future::Future;

use futures::future;
use futures::stream::{self, BoxStream, Stream, StreamExt};

use crate::error::FlowResult;

/// Value transforms for streams of [`FlowResult`]s.
///
/// A failing transform terminates the stream with its error: the upstream stream is dropped
/// right away, releasing any listener it holds, and nothing further is yielded. Upstream
/// errors pass through unchanged and terminate the stream the same way.
pub trait FlowStreamExt<T>: Stream<Item = FlowResult<T>> + Send + Sized + 'static
where
    T: Send + 'static,
{
    fn map_values<U, F>(self, mut transform: F) -> BoxStream<'static, FlowResult<U>>
    where
        U: Send + 'static,
        F: FnMut(T) -> U + Send + 'static,
    {
        self.try_map_values(move |value| Ok(transform(value)))
    }

    fn try_map_values<U, F>(self, mut transform: F) -> BoxStream<'static, FlowResult<U>>
    where
        U: Send + 'static,
        F: FnMut(T) -> FlowResult<U> + Send + 'static,
    {
        self.then_values(move |value| future::ready(transform(value)))
    }

    /// Applies an asynchronous transform; the next upstream value is not polled until the
    /// previous transform resolves, so ordering is preserved.
    fn then_values<U, F, Fut>(self, transform: F) -> BoxStream<'static, FlowResult<U>>
    where
        U: Send + 'static,
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: Future<Output = FlowResult<U>> + Send + 'static,
    {
        then_values(self.boxed(), transform)
    }
}

impl<S, T> FlowStreamExt<T> for S
where
    S: Stream<Item = FlowResult<T>> + Send + 'static,
    T: Send + 'static,
{
}

fn then_values<T, U, F, Fut>(
    upstream: BoxStream<'static, FlowResult<T>>,
    transform: F,
) -> BoxStream<'static, FlowResult<U>>
where
    T: Send + 'static,
    U: Send + 'static,
    F: FnMut(T) -> Fut + Send + 'static,
    Fut: Future<Output = FlowResult<U>> + Send + 'static,
{
    stream::unfold(Some((upstream, transform)), |state| async move {
        let Some((mut upstream, mut transform)) = state else {
            return None;
        };
        let Some(item) = upstream.next().await else {
            return None;
        };
        let outcome = match item {
            Ok(value) => transform(value).await,
            Err(error) => Err(error),
        };
        match outcome {
            Ok(value) => Some((Ok(value), Some((upstream, transform)))),
            Err(error) => {
                drop(upstream);
                Some((Err(error), None))
            }
        }
    })
    .fuse()
    .boxed()
}
