use std::fmt;
use std::sync::mpsc;

use firebase_flow::error::FlowErrorCode;
use firebase_flow::flow::{FlowStreamExt, OnFailure, OnSuccess, Task, TaskExt};
use futures::StreamExt;

#[derive(Clone, Debug, PartialEq)]
struct AuthError(String);

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "auth/{}", self.0)
    }
}

impl std::error::Error for AuthError {}

/// Settles on a background thread once the test sends the outcome.
struct ThreadTask {
    outcome: mpsc::Receiver<Result<String, AuthError>>,
}

impl Task for ThreadTask {
    type Output = String;
    type Error = AuthError;

    fn on_complete(self, on_success: OnSuccess<String>, on_failure: OnFailure<AuthError>) {
        std::thread::spawn(move || match self.outcome.recv() {
            Ok(Ok(value)) => on_success(value),
            Ok(Err(error)) => on_failure(error),
            Err(_) => {}
        });
    }
}

fn thread_task() -> (ThreadTask, mpsc::Sender<Result<String, AuthError>>) {
    let (sender, outcome) = mpsc::channel();
    (ThreadTask { outcome }, sender)
}

#[tokio::test(flavor = "multi_thread")]
async fn successful_task_emits_once_then_completes() {
    let (task, settle) = thread_task();
    let mut stream = task.into_flow();
    settle.send(Ok("uid-1".to_string())).unwrap();

    assert_eq!(stream.next().await.unwrap().unwrap(), "uid-1");
    assert!(stream.next().await.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_task_terminates_with_its_error() {
    let (task, settle) = thread_task();
    let mut stream = task.into_flow();
    settle
        .send(Err(AuthError("wrong-password".to_string())))
        .unwrap();

    let error = stream.next().await.unwrap().unwrap_err();
    assert_eq!(error.code, FlowErrorCode::OperationFailed);
    assert_eq!(
        error.downcast_source::<AuthError>(),
        Some(&AuthError("wrong-password".to_string()))
    );
    assert!(error.to_string().contains("auth/wrong-password"));
    assert!(stream.next().await.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn task_dropped_without_settling_is_reported() {
    let (task, settle) = thread_task();
    let mut stream = task.into_flow();
    drop(settle);

    let error = stream.next().await.unwrap().unwrap_err();
    assert_eq!(error.code, FlowErrorCode::Abandoned);
}

#[tokio::test(flavor = "multi_thread")]
async fn cancelled_stream_ignores_late_result() {
    let (task, settle) = thread_task();
    let mut stream = task.into_flow();
    stream.cancel();
    settle.send(Ok("late".to_string())).unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    assert!(stream.next().await.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn results_can_be_transformed() {
    let (task, settle) = thread_task();
    let mut lengths = task.into_flow().map_values(|uid| uid.len());
    settle.send(Ok("abcdef".to_string())).unwrap();

    assert_eq!(lengths.next().await.unwrap().unwrap(), 6);
    assert!(lengths.next().await.is_none());
}
