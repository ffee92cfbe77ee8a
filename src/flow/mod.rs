//! # Callback-to-stream bridges
//!
//! Turns the two callback shapes found across Firebase SDK surfaces into
//! [`futures::Stream`]s of [`FlowResult`](crate::error::FlowResult):
//!
//! - single-completion operations ([`Task`]) become a stream yielding at most one value;
//! - long-lived listeners ([`listen`]) become a stream of events that stays open until the
//!   listener fails or the consumer cancels it, at which point the listener is detached once.
//!
//! Both sit on an [`Emitter`]/[`FlowStream`] pair: a non-blocking, close-idempotent hand-off
//! that SDK callbacks may call from any thread.
//!
//! ## Example
//!
//! ```
//! use firebase_flow::flow::{listen, Unsubscribe};
//! use futures::StreamExt;
//! use std::convert::Infallible;
//!
//! # futures::executor::block_on(async {
//! let mut stream = listen(|emitter| {
//!     emitter.next("connected");
//!     let detach: Unsubscribe = Box::new(|| println!("listener removed"));
//!     Ok::<_, Infallible>(detach)
//! });
//! assert_eq!(stream.next().await.unwrap().unwrap(), "connected");
//! stream.cancel();
//! # });
//! ```

mod emitter;
mod listen;
mod stream;
mod task;
mod transform;

#[doc(inline)]
pub use emitter::Emitter;

#[doc(inline)]
pub use listen::{listen, listen_once, listen_with, unsubscribe_on_drop};

#[doc(inline)]
pub use stream::{FlowStream, Unsubscribe};

#[doc(inline)]
pub use task::{task_stream, OnFailure, OnSuccess, Task, TaskExt};

#[doc(inline)]
pub use transform::FlowStreamExt;
