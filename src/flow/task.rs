use std::error::Error;

use crate::error::operation_failed;
use crate::flow::FlowStream;
use crate::settings::SINGLE_COMPLETION_CAPACITY;

pub type OnSuccess<T> = Box<dyn FnOnce(T) + Send + 'static>;
pub type OnFailure<E> = Box<dyn FnOnce(E) + Send + 'static>;

/// A pending single-completion SDK operation.
///
/// Implementations invoke at most one of the two callbacks, at most once, from any thread.
pub trait Task {
    type Output: Send + 'static;
    type Error: Error + Send + Sync + 'static;

    fn on_complete(self, on_success: OnSuccess<Self::Output>, on_failure: OnFailure<Self::Error>);
}

/// An already settled operation.
impl<T, E> Task for Result<T, E>
where
    T: Send + 'static,
    E: Error + Send + Sync + 'static,
{
    type Output = T;
    type Error = E;

    fn on_complete(self, on_success: OnSuccess<T>, on_failure: OnFailure<E>) {
        match self {
            Ok(value) => on_success(value),
            Err(error) => on_failure(error),
        }
    }
}

/// Bridges `task` into a stream yielding its value once, or its failure as
/// [`FlowErrorCode::OperationFailed`](crate::error::FlowErrorCode::OperationFailed).
///
/// Dropping or cancelling the stream before the task settles makes its callbacks inert.
pub fn task_stream<K>(task: K) -> FlowStream<K::Output>
where
    K: Task,
{
    let (emitter, stream) = FlowStream::bounded_channel(SINGLE_COMPLETION_CAPACITY);
    let failure_emitter = emitter.clone();

    task.on_complete(
        Box::new(move |value| {
            if emitter.next(value) {
                emitter.complete();
            } else {
                log::debug!("discarding task result: stream already closed");
            }
        }),
        Box::new(move |error| {
            failure_emitter.error(operation_failed(error));
        }),
    );

    stream
}

/// Call-site sugar: `auth.sign_in_anonymously().into_flow()`.
pub trait TaskExt: Task + Sized {
    fn into_flow(self) -> FlowStream<Self::Output> {
        task_stream(self)
    }
}

impl<K> TaskExt for K where K: Task {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FlowErrorCode;
    use crate::test_support::{ManualTask, VendorError};
    use futures::executor::block_on;
    use futures::StreamExt;

    #[test]
    fn success_emits_value_then_completes() {
        let (task, handle) = ManualTask::<String>::new();
        let stream = task.into_flow();
        handle.succeed("user-1".to_string());

        let items: Vec<_> = block_on(stream.collect());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap(), "user-1");
    }

    #[test]
    fn failure_terminates_with_vendor_error() {
        let (task, handle) = ManualTask::<String>::new();
        let stream = task.into_flow();
        handle.fail(VendorError::new("network"));

        let items: Vec<_> = block_on(stream.collect());
        assert_eq!(items.len(), 1);
        let error = items[0].as_ref().unwrap_err();
        assert_eq!(error.code, FlowErrorCode::OperationFailed);
        assert_eq!(
            error.downcast_source::<VendorError>(),
            Some(&VendorError::new("network"))
        );
    }

    #[test]
    fn cancellation_silences_late_callbacks() {
        let (task, handle) = ManualTask::<u32>::new();
        let mut stream = task.into_flow();
        stream.cancel();
        handle.succeed(5);

        assert!(block_on(stream.next()).is_none());
    }

    #[test]
    fn late_callbacks_after_drop_are_inert() {
        let (task, handle) = ManualTask::<u32>::new();
        drop(task.into_flow());
        handle.fail(VendorError::new("late"));
    }

    #[test]
    fn second_callback_is_ignored() {
        let (task, handle) = ManualTask::<u32>::new();
        let stream = task.into_flow();
        handle.succeed_and_fail(9, VendorError::new("duplicate"));

        let items: Vec<_> = block_on(stream.collect());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap(), &9);
    }

    #[test]
    fn dropped_task_reports_abandoned() {
        let (task, handle) = ManualTask::<u32>::new();
        let stream = task.into_flow();
        handle.abandon();

        let items: Vec<_> = block_on(stream.collect());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap_err().code, FlowErrorCode::Abandoned);
    }

    #[test]
    fn settled_results_are_tasks() {
        let ok: Result<u8, VendorError> = Ok(3);
        let values: Vec<_> = block_on(ok.into_flow().collect());
        assert_eq!(values[0].as_ref().unwrap(), &3);

        let err: Result<u8, VendorError> = Err(VendorError::new("bad"));
        let values: Vec<_> = block_on(task_stream(err).collect());
        assert!(values[0].is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn resolves_from_another_thread() {
        let (task, handle) = ManualTask::<u64>::new();
        let mut stream = task.into_flow();
        std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(10));
            handle.succeed(42);
        });

        assert_eq!(stream.next().await.unwrap().unwrap(), 42);
        assert!(stream.next().await.is_none());
    }
}
