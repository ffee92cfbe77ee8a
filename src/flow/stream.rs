use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_channel::Receiver;
use futures::stream::{FusedStream, Stream};

use crate::error::{abandoned, FlowError, FlowResult};
use crate::flow::emitter::{Emitter, HandOff};
use crate::settings::{BufferPolicy, FlowSettings};

/// Detaches an SDK listener. Invoked at most once per stream.
pub type Unsubscribe = Box<dyn FnOnce() + Send + 'static>;

/// Consumer half of a bridged SDK callback.
///
/// Yields queued values in publish order and then either ends, or yields a single `Err` and
/// ends. Once terminated it never yields again.
///
/// The listener registration is released exactly once, by whichever happens first: the
/// producer closing the stream (error, completion, first value of a single-shot stream),
/// [`cancel`](Self::cancel), or drop. A producer-side close releases it from the producer's
/// thread, even if the consumer never polls again.
pub struct FlowStream<T> {
    receiver: Pin<Box<Receiver<T>>>,
    state: Arc<HandOff>,
    single_shot: bool,
    terminated: bool,
}

impl<T> FlowStream<T> {
    /// Creates a connected emitter/stream pair buffered per `settings`.
    pub fn channel(settings: FlowSettings) -> (Emitter<T>, FlowStream<T>) {
        Self::channel_with_mode(settings.buffer(), false)
    }

    /// Pair with a fixed, non-zero capacity.
    pub(crate) fn bounded_channel(capacity: usize) -> (Emitter<T>, FlowStream<T>) {
        Self::channel_with_mode(BufferPolicy::Bounded(capacity.max(1)), false)
    }

    /// Like [`channel`](Self::channel), but the stream ends right after its first value.
    pub(crate) fn single_shot_channel(capacity: usize) -> (Emitter<T>, FlowStream<T>) {
        Self::channel_with_mode(BufferPolicy::Bounded(capacity.max(1)), true)
    }

    fn channel_with_mode(policy: BufferPolicy, single_shot: bool) -> (Emitter<T>, FlowStream<T>) {
        let (sender, receiver) = policy.channel();
        let state = Arc::new(HandOff::default());
        let emitter = Emitter::new(sender, Arc::clone(&state), single_shot);
        let stream = FlowStream {
            receiver: Box::pin(receiver),
            state,
            single_shot,
            terminated: false,
        };
        (emitter, stream)
    }

    /// A stream that yields `error` and ends.
    pub fn failed(error: FlowError) -> FlowStream<T> {
        let (emitter, stream) = Self::bounded_channel(1);
        emitter.error(error);
        stream
    }

    /// Attaches the listener registration released when this stream closes.
    ///
    /// If the stream is already closed, including by a listener that fired during
    /// registration, `unsubscribe` runs immediately.
    pub fn set_registration(&mut self, unsubscribe: Unsubscribe) {
        self.state.register(unsubscribe);
    }

    /// Stops the stream: late callbacks become no-ops, undelivered values are discarded and the
    /// registration is released.
    pub fn cancel(&mut self) {
        if self.terminated {
            return;
        }
        log::debug!("stream cancelled by consumer");
        self.finish();
        while self.receiver.try_recv().is_ok() {}
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    fn finish(&mut self) {
        self.terminated = true;
        self.state.try_close();
        self.receiver.close();
        self.state.release();
    }
}

impl<T> Stream for FlowStream<T> {
    type Item = FlowResult<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.terminated {
            return Poll::Ready(None);
        }

        match this.receiver.as_mut().poll_next(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(value)) => {
                if this.single_shot {
                    this.finish();
                }
                Poll::Ready(Some(Ok(value)))
            }
            Poll::Ready(None) => {
                let outcome = match this.state.take_terminal() {
                    Some(error) => Some(error),
                    None if !this.state.is_closed() => {
                        log::warn!("stream producer dropped without completing");
                        Some(abandoned("the producer was dropped before completing the stream"))
                    }
                    None => None,
                };
                this.finish();
                Poll::Ready(outcome.map(Err))
            }
        }
    }
}

impl<T> FusedStream for FlowStream<T> {
    fn is_terminated(&self) -> bool {
        self.terminated
    }
}

impl<T> Drop for FlowStream<T> {
    fn drop(&mut self) {
        if !self.terminated {
            self.finish();
        }
    }
}

impl<T> fmt::Debug for FlowStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowStream")
            .field("terminated", &self.terminated)
            .field("single_shot", &self.single_shot)
            .field("registered", &self.state.is_registered())
            .finish()
    }
}
