use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_channel::{Sender, TrySendError};

use crate::error::FlowError;
use crate::flow::stream::Unsubscribe;

/// Close state shared by every [`Emitter`] clone and the consuming
/// [`FlowStream`](crate::flow::FlowStream).
///
/// The listener registration lives here so that whichever side closes the stream first
/// releases it, without waiting for the consumer to poll.
#[derive(Default)]
pub(crate) struct HandOff {
    closed: AtomicBool,
    terminal: Mutex<Option<FlowError>>,
    registration: Mutex<Option<Unsubscribe>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl HandOff {
    /// Flips the closed flag; only the first caller gets `true`.
    pub(crate) fn try_close(&self) -> bool {
        self.closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn set_terminal(&self, error: FlowError) {
        *lock(&self.terminal) = Some(error);
    }

    pub(crate) fn take_terminal(&self) -> Option<FlowError> {
        lock(&self.terminal).take()
    }

    /// Stores `unsubscribe`, running it right away when the stream already closed.
    ///
    /// The flag is checked after storing so a close racing with this call still finds the
    /// registration in one of the two places.
    pub(crate) fn register(&self, unsubscribe: Unsubscribe) {
        let previous = lock(&self.registration).replace(unsubscribe);
        if let Some(previous) = previous {
            log::warn!("replacing an active stream registration; detaching the previous one");
            previous();
        }
        if self.is_closed() {
            self.release();
        }
    }

    /// Runs the stored registration, if any. The lock is not held while it runs.
    pub(crate) fn release(&self) {
        let registration = lock(&self.registration).take();
        if let Some(unsubscribe) = registration {
            log::debug!("releasing stream registration");
            unsubscribe();
        }
    }

    pub(crate) fn is_registered(&self) -> bool {
        lock(&self.registration).is_some()
    }
}

/// Producer half of a [`FlowStream`](crate::flow::FlowStream).
///
/// Emitters are handed to SDK callbacks, which may run on any thread and may race with the
/// consumer cancelling the stream. Every method is non-blocking and never panics on a closed
/// stream: publishing after close simply returns `false`.
pub struct Emitter<T> {
    sender: Sender<T>,
    state: Arc<HandOff>,
    single_shot: bool,
}

impl<T> Emitter<T> {
    pub(crate) fn new(sender: Sender<T>, state: Arc<HandOff>, single_shot: bool) -> Self {
        Self {
            sender,
            state,
            single_shot,
        }
    }

    /// Publishes `value`, returning whether it was queued for the consumer.
    ///
    /// Returns `false` once the stream is closed or cancelled, or when a bounded buffer is full
    /// (the value is dropped in that case). A single-shot emitter completes the stream right
    /// after its first accepted value.
    pub fn next(&self, value: T) -> bool {
        if self.state.is_closed() {
            return false;
        }
        match self.sender.try_send(value) {
            Ok(()) => {
                if self.single_shot {
                    self.complete();
                }
                true
            }
            Err(TrySendError::Full(_)) => {
                log::debug!("dropping event: stream buffer is full");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Closes the stream with `error`. Only the first terminal signal takes effect.
    ///
    /// The listener registration is released here, before the consumer sees the error.
    pub fn error(&self, error: FlowError) -> bool {
        if !self.state.try_close() {
            log::debug!("ignoring error on closed stream: {error}");
            return false;
        }
        self.state.set_terminal(error);
        self.sender.close();
        self.state.release();
        true
    }

    /// Closes the stream normally once queued values are consumed.
    pub fn complete(&self) -> bool {
        if !self.state.try_close() {
            return false;
        }
        self.sender.close();
        self.state.release();
        true
    }

    pub fn is_closed(&self) -> bool {
        self.state.is_closed() || self.sender.is_closed()
    }
}

impl<T> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            state: Arc::clone(&self.state),
            single_shot: self.single_shot,
        }
    }
}

impl<T> fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("closed", &self.is_closed())
            .field("single_shot", &self.single_shot)
            .finish()
    }
}
