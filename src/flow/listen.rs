use std::error::Error;

use crate::error::listener_failed;
use crate::flow::{Emitter, FlowStream, Unsubscribe};
use crate::settings::{FlowSettings, SINGLE_COMPLETION_CAPACITY};

/// Bridges a long-lived listener into a stream using the default [`FlowSettings`].
///
/// `subscribe` receives the [`Emitter`] to call from the listener and returns how to detach it.
/// The stream stays open until the listener reports an error through
/// [`Emitter::error`], the listener completes, or the consumer cancels or drops it; the
/// returned [`Unsubscribe`] then runs exactly once. A failing `subscribe` yields a stream that
/// ends with [`FlowErrorCode::ListenerFailed`](crate::error::FlowErrorCode::ListenerFailed).
pub fn listen<T, E, F>(subscribe: F) -> FlowStream<T>
where
    E: Error + Send + Sync + 'static,
    F: FnOnce(Emitter<T>) -> Result<Unsubscribe, E>,
{
    listen_with(FlowSettings::default(), subscribe)
}

pub fn listen_with<T, E, F>(settings: FlowSettings, subscribe: F) -> FlowStream<T>
where
    E: Error + Send + Sync + 'static,
    F: FnOnce(Emitter<T>) -> Result<Unsubscribe, E>,
{
    let (emitter, stream) = FlowStream::channel(settings);
    attach(stream, emitter, subscribe)
}

/// Single-value variant of [`listen`]: the stream yields the first value, detaches the listener
/// and ends.
pub fn listen_once<T, E, F>(subscribe: F) -> FlowStream<T>
where
    E: Error + Send + Sync + 'static,
    F: FnOnce(Emitter<T>) -> Result<Unsubscribe, E>,
{
    let (emitter, stream) = FlowStream::single_shot_channel(SINGLE_COMPLETION_CAPACITY);
    attach(stream, emitter, subscribe)
}

fn attach<T, E, F>(mut stream: FlowStream<T>, emitter: Emitter<T>, subscribe: F) -> FlowStream<T>
where
    E: Error + Send + Sync + 'static,
    F: FnOnce(Emitter<T>) -> Result<Unsubscribe, E>,
{
    match subscribe(emitter) {
        Ok(unsubscribe) => {
            stream.set_registration(unsubscribe);
            stream
        }
        Err(error) => {
            log::debug!("listener registration failed: {error}");
            FlowStream::failed(listener_failed(error))
        }
    }
}

/// Adapts an RAII registration handle (one that detaches on drop) into an [`Unsubscribe`].
pub fn unsubscribe_on_drop<H>(handle: H) -> Unsubscribe
where
    H: Send + 'static,
{
    Box::new(move || drop(handle))
}
