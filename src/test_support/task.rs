use std::fmt;
use std::sync::{Arc, Mutex};

use crate::flow::{OnFailure, OnSuccess, Task};

/// Error type standing in for an SDK failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VendorError {
    message: String,
}

impl VendorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for VendorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vendor error: {}", self.message)
    }
}

impl std::error::Error for VendorError {}

type Callbacks<T> = (OnSuccess<T>, OnFailure<VendorError>);

/// A task settled by hand through its [`ManualTaskHandle`].
pub struct ManualTask<T> {
    callbacks: Arc<Mutex<Option<Callbacks<T>>>>,
}

pub struct ManualTaskHandle<T> {
    callbacks: Arc<Mutex<Option<Callbacks<T>>>>,
}

impl<T> ManualTask<T> {
    pub fn new() -> (ManualTask<T>, ManualTaskHandle<T>) {
        let callbacks = Arc::new(Mutex::new(None));
        (
            ManualTask {
                callbacks: Arc::clone(&callbacks),
            },
            ManualTaskHandle { callbacks },
        )
    }
}

impl<T> Task for ManualTask<T>
where
    T: Send + 'static,
{
    type Output = T;
    type Error = VendorError;

    fn on_complete(self, on_success: OnSuccess<T>, on_failure: OnFailure<VendorError>) {
        *self.callbacks.lock().unwrap() = Some((on_success, on_failure));
    }
}

impl<T> ManualTaskHandle<T> {
    fn take(&self) -> Callbacks<T> {
        self.callbacks
            .lock()
            .unwrap()
            .take()
            .expect("task callbacks registered")
    }

    pub fn succeed(&self, value: T) {
        let (on_success, _) = self.take();
        on_success(value);
    }

    pub fn fail(&self, error: VendorError) {
        let (_, on_failure) = self.take();
        on_failure(error);
    }

    /// Misbehaves by invoking both callbacks.
    pub fn succeed_and_fail(&self, value: T, error: VendorError) {
        let (on_success, on_failure) = self.take();
        on_success(value);
        on_failure(error);
    }

    /// Drops both callbacks without invoking either.
    pub fn abandon(&self) {
        drop(self.take());
    }
}
