use std::error::Error;
use std::future::Future;
use std::sync::Arc;

use futures::stream::BoxStream;
use serde::de::DeserializeOwned;

use crate::database::mapper::{self, ChildEventStreamExt, SnapshotStreamExt};
use crate::database::{ChildEvent, ChildEventType, DataSnapshot};
use crate::error::{internal_error, listener_failed, FlowResult};
use crate::flow::{listen_once, listen_with, Emitter, FlowStream, FlowStreamExt, Unsubscribe};
use crate::settings::FlowSettings;

pub type ListenerId = u64;

/// What a listener subscribes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListenKind {
    /// Every change of the query value.
    Value,
    /// The current value only; the source may drop the listener after delivering it.
    SingleValue,
    /// Child added/changed/removed/moved events.
    Children,
}

/// Event delivered by a [`Query`] to its listeners.
#[derive(Clone, Debug)]
pub enum QueryEvent<E> {
    Value(DataSnapshot),
    ChildAdded {
        snapshot: DataSnapshot,
        previous_child: Option<String>,
    },
    ChildChanged {
        snapshot: DataSnapshot,
        previous_child: Option<String>,
    },
    ChildMoved {
        snapshot: DataSnapshot,
        previous_child: Option<String>,
    },
    ChildRemoved {
        snapshot: DataSnapshot,
    },
    /// The listener was cancelled by the backend; no further events follow.
    Cancelled(E),
}

impl<E> QueryEvent<E> {
    pub fn kind_str(&self) -> &'static str {
        match self {
            QueryEvent::Value(_) => "value",
            QueryEvent::ChildAdded { .. } => ChildEventType::Added.as_str(),
            QueryEvent::ChildChanged { .. } => ChildEventType::Changed.as_str(),
            QueryEvent::ChildMoved { .. } => ChildEventType::Moved.as_str(),
            QueryEvent::ChildRemoved { .. } => ChildEventType::Removed.as_str(),
            QueryEvent::Cancelled(_) => "cancelled",
        }
    }

    /// Whether a listener of `kind` receives this event.
    pub fn is_for(&self, kind: ListenKind) -> bool {
        match self {
            QueryEvent::Value(_) => matches!(kind, ListenKind::Value | ListenKind::SingleValue),
            QueryEvent::Cancelled(_) => true,
            _ => kind == ListenKind::Children,
        }
    }
}

pub type QueryListener<E> = Arc<dyn Fn(QueryEvent<E>) + Send + Sync + 'static>;

/// A database location or query that accepts listeners.
///
/// `remove_listener` must tolerate ids that were already removed, including listeners the
/// source dropped on its own after a cancellation or a single-value delivery.
/// It may be called from inside a listener callback, so sources must not hold their listener
/// lock while invoking listeners.
pub trait Query: Clone + Send + Sync + 'static {
    type Error: Error + Send + Sync + 'static;

    fn add_listener(
        &self,
        kind: ListenKind,
        listener: QueryListener<Self::Error>,
    ) -> Result<ListenerId, Self::Error>;

    fn remove_listener(&self, id: ListenerId);
}

/// Stream call-sites for every [`Query`].
pub trait QueryFlowExt: Query {
    /// Streams the query value on every change until cancelled.
    fn value_events(&self) -> FlowStream<DataSnapshot> {
        self.value_events_with(FlowSettings::default())
    }

    fn value_events_with(&self, settings: FlowSettings) -> FlowStream<DataSnapshot> {
        let query = self.clone();
        listen_with(settings, move |emitter| {
            subscribe(query, ListenKind::Value, value_listener(emitter))
        })
    }

    /// Streams the current value once, then completes.
    fn single_value_event(&self) -> FlowStream<DataSnapshot> {
        let query = self.clone();
        listen_once(move |emitter| {
            subscribe(query, ListenKind::SingleValue, value_listener(emitter))
        })
    }

    /// Streams child events in the order the source reports them until cancelled.
    fn child_events(&self) -> FlowStream<ChildEvent<DataSnapshot>> {
        self.child_events_with(FlowSettings::default())
    }

    fn child_events_with(&self, settings: FlowSettings) -> FlowStream<ChildEvent<DataSnapshot>> {
        let query = self.clone();
        listen_with(settings, move |emitter| {
            subscribe(query, ListenKind::Children, child_listener(emitter))
        })
    }

    fn value_events_map<U, F>(&self, transform: F) -> BoxStream<'static, FlowResult<U>>
    where
        U: Send + 'static,
        F: FnMut(DataSnapshot) -> U + Send + 'static,
    {
        self.value_events().map_values(transform)
    }

    fn value_events_then<U, F, Fut>(&self, transform: F) -> BoxStream<'static, FlowResult<U>>
    where
        U: Send + 'static,
        F: FnMut(DataSnapshot) -> Fut + Send + 'static,
        Fut: Future<Output = FlowResult<U>> + Send + 'static,
    {
        self.value_events().then_values(transform)
    }

    fn value_events_as<T>(&self) -> BoxStream<'static, FlowResult<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.value_events().decode()
    }

    fn single_value_as<T>(&self) -> BoxStream<'static, FlowResult<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.single_value_event().decode()
    }

    /// Streams the query children as a list, failing on the first malformed child.
    fn value_list_as<T>(&self) -> BoxStream<'static, FlowResult<Vec<T>>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.value_events()
            .try_map_values(|snapshot| mapper::list_of::<T>(&snapshot))
    }

    /// Streams the query children as a list, leaving out malformed children.
    fn value_list_as_safe<T>(&self) -> BoxStream<'static, FlowResult<Vec<T>>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.value_events()
            .map_values(|snapshot| mapper::safe_list_of::<T>(&snapshot))
    }

    fn child_events_as<T>(&self) -> BoxStream<'static, FlowResult<ChildEvent<T>>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.child_events().decode_children()
    }

    fn child_events_as_safe<T>(&self) -> BoxStream<'static, FlowResult<ChildEvent<T>>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.child_events().decode_children_safe()
    }
}

impl<Q> QueryFlowExt for Q where Q: Query {}

fn subscribe<Q>(
    query: Q,
    kind: ListenKind,
    listener: QueryListener<Q::Error>,
) -> Result<Unsubscribe, Q::Error>
where
    Q: Query,
{
    let id = query.add_listener(kind, listener)?;
    log::debug!("registered {kind:?} listener {id}");
    Ok(Box::new(move || {
        log::debug!("removing {kind:?} listener {id}");
        query.remove_listener(id);
    }))
}

fn value_listener<E>(emitter: Emitter<DataSnapshot>) -> QueryListener<E>
where
    E: Error + Send + Sync + 'static,
{
    Arc::new(move |event: QueryEvent<E>| match event {
        QueryEvent::Value(snapshot) => {
            emitter.next(snapshot);
        }
        QueryEvent::Cancelled(error) => {
            emitter.error(listener_failed(error));
        }
        other => log::debug!("value listener ignoring {} event", other.kind_str()),
    })
}

fn child_listener<E>(emitter: Emitter<ChildEvent<DataSnapshot>>) -> QueryListener<E>
where
    E: Error + Send + Sync + 'static,
{
    Arc::new(move |event: QueryEvent<E>| {
        let (snapshot, event_type, previous_child) = match event {
            QueryEvent::ChildAdded {
                snapshot,
                previous_child,
            } => (snapshot, ChildEventType::Added, previous_child),
            QueryEvent::ChildChanged {
                snapshot,
                previous_child,
            } => (snapshot, ChildEventType::Changed, previous_child),
            QueryEvent::ChildMoved {
                snapshot,
                previous_child,
            } => (snapshot, ChildEventType::Moved, previous_child),
            QueryEvent::ChildRemoved { snapshot } => (snapshot, ChildEventType::Removed, None),
            QueryEvent::Cancelled(error) => {
                emitter.error(listener_failed(error));
                return;
            }
            QueryEvent::Value(_) => {
                log::debug!("child listener ignoring value event");
                return;
            }
        };

        let Some(key) = snapshot.key().map(str::to_string) else {
            emitter.error(internal_error(format!(
                "{event_type} event without a child key"
            )));
            return;
        };
        let envelope = match event_type {
            ChildEventType::Added => ChildEvent::added(key, snapshot, previous_child),
            ChildEventType::Changed => ChildEvent::changed(key, snapshot, previous_child),
            ChildEventType::Moved => ChildEvent::moved(key, snapshot, previous_child),
            ChildEventType::Removed => ChildEvent::removed(key, Some(snapshot)),
        };
        emitter.next(envelope);
    })
}
