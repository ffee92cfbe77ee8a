//! # Realtime Database listeners as streams
//!
//! Adapts the listener surface of a Realtime Database query into
//! [`FlowStream`](crate::flow::FlowStream)s:
//!
//! - [`QueryFlowExt::value_events`] streams every value change;
//! - [`QueryFlowExt::single_value_event`] streams the current value and completes;
//! - [`QueryFlowExt::child_events`] streams [`ChildEvent`] envelopes (added, changed, removed,
//!   moved) in the order the backend reports them.
//!
//! Any type implementing [`Query`] gets these call-sites. The `*_as` variants decode payloads
//! with `serde` through the [`mapper`] helpers. [`MemoryQuery`] is an in-memory source for
//! tests.
//!
//! ## Example
//!
//! ```
//! use firebase_flow::database::{MemoryQuery, QueryFlowExt};
//! use futures::StreamExt;
//! use serde::Deserialize;
//! use serde_json::json;
//!
//! #[derive(Debug, Deserialize, PartialEq)]
//! struct Counter {
//!     count: u32,
//! }
//!
//! # futures::executor::block_on(async {
//! let query = MemoryQuery::new();
//! let mut counters = query.value_events_as::<Counter>();
//!
//! query.emit_value(json!({ "count": 1 }));
//! assert_eq!(counters.next().await.unwrap().unwrap(), Counter { count: 1 });
//!
//! drop(counters);
//! assert_eq!(query.active_listeners(), 0);
//! # });
//! ```

pub mod error;
mod event;
pub mod mapper;
mod memory;
mod query;
mod snapshot;

#[doc(inline)]
pub use error::{DatabaseError, DatabaseErrorCode, DatabaseResult};

#[doc(inline)]
pub use event::{ChildEvent, ChildEventType};

#[doc(inline)]
pub use mapper::{ChildEventStreamExt, SnapshotStreamExt};

#[doc(inline)]
pub use memory::MemoryQuery;

#[doc(inline)]
pub use query::{ListenKind, ListenerId, Query, QueryEvent, QueryFlowExt, QueryListener};

#[doc(inline)]
pub use snapshot::DataSnapshot;
