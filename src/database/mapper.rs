//! Typed decoding of [`DataSnapshot`] payloads.
//!
//! Strict helpers fail with [`FlowErrorCode::DataCast`](crate::error::FlowErrorCode::DataCast)
//! when a payload does not decode into the target type or is null. `safe_*` helpers swallow
//! those failures per element instead, so one malformed child does not abort the rest.

use std::any::type_name;
use std::collections::BTreeMap;

use futures::future;
use futures::stream::{BoxStream, Stream, StreamExt};
use serde::de::DeserializeOwned;

use crate::database::{ChildEvent, DataSnapshot};
use crate::error::{data_cast, DataCastError, FlowResult};
use crate::flow::FlowStreamExt;

/// Decodes `snapshot` into `T`.
pub fn of<T>(snapshot: &DataSnapshot) -> FlowResult<T>
where
    T: DeserializeOwned,
{
    let data = snapshot.data();
    if data.is_null() {
        return Err(data_cast(DataCastError::new(
            data.clone(),
            type_name::<T>(),
            None,
        )));
    }
    serde_json::from_value(data.clone()).map_err(|err| {
        data_cast(DataCastError::new(
            data.clone(),
            type_name::<T>(),
            Some(err),
        ))
    })
}

/// Decodes `snapshot` into `T`, returning `None` when it is null or malformed.
pub fn safe_of<T>(snapshot: &DataSnapshot) -> Option<T>
where
    T: DeserializeOwned,
{
    match of(snapshot) {
        Ok(value) => Some(value),
        Err(err) => {
            log::debug!("skipping undecodable snapshot {:?}: {err}", snapshot.key());
            None
        }
    }
}

/// Decodes every child of `snapshot`, failing on the first malformed one.
pub fn list_of<T>(snapshot: &DataSnapshot) -> FlowResult<Vec<T>>
where
    T: DeserializeOwned,
{
    snapshot.children().iter().map(of::<T>).collect()
}

/// Decodes the children of `snapshot`, dropping malformed ones.
pub fn safe_list_of<T>(snapshot: &DataSnapshot) -> Vec<T>
where
    T: DeserializeOwned,
{
    snapshot.children().iter().filter_map(safe_of::<T>).collect()
}

/// Decodes every child of `snapshot` keyed by child key, failing on the first malformed one.
pub fn map_of<T>(snapshot: &DataSnapshot) -> FlowResult<BTreeMap<String, T>>
where
    T: DeserializeOwned,
{
    snapshot
        .children()
        .iter()
        .map(|child| Ok((child_key(child), of(child)?)))
        .collect()
}

pub fn safe_map_of<T>(snapshot: &DataSnapshot) -> BTreeMap<String, T>
where
    T: DeserializeOwned,
{
    snapshot
        .children()
        .iter()
        .filter_map(|child| safe_of(child).map(|value| (child_key(child), value)))
        .collect()
}

/// Decodes the payload of a child event. Payload-less removals stay payload-less.
pub fn of_child<T>(event: ChildEvent<DataSnapshot>) -> FlowResult<ChildEvent<T>>
where
    T: DeserializeOwned,
{
    let value = match &event.value {
        Some(snapshot) => Some(of(snapshot)?),
        None => None,
    };
    Ok(event.with_payload(value))
}

/// Decodes the payload of a child event, leaving it empty when it cannot be decoded.
pub fn of_child_safe<T>(event: ChildEvent<DataSnapshot>) -> ChildEvent<T>
where
    T: DeserializeOwned,
{
    let value = event.value.as_ref().and_then(safe_of::<T>);
    event.with_payload(value)
}

fn child_key(snapshot: &DataSnapshot) -> String {
    snapshot.key().unwrap_or_default().to_string()
}

/// Typed decoding overlays for snapshot streams.
pub trait SnapshotStreamExt: Stream<Item = FlowResult<DataSnapshot>> + Send + Sized + 'static {
    /// Decodes each snapshot; the first malformed one terminates the stream.
    fn decode<T>(self) -> BoxStream<'static, FlowResult<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.try_map_values(|snapshot| of(&snapshot))
    }

    /// Decodes each snapshot, dropping the ones that cannot be decoded.
    fn decode_safe<T>(self) -> BoxStream<'static, FlowResult<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.filter_map(|item| {
            future::ready(match item {
                Ok(snapshot) => safe_of(&snapshot).map(Ok),
                Err(err) => Some(Err(err)),
            })
        })
        .fuse()
        .boxed()
    }
}

impl<S> SnapshotStreamExt for S where S: Stream<Item = FlowResult<DataSnapshot>> + Send + 'static {}

/// Typed decoding overlays for child event streams.
pub trait ChildEventStreamExt:
    Stream<Item = FlowResult<ChildEvent<DataSnapshot>>> + Send + Sized + 'static
{
    /// Decodes each envelope payload; the first malformed one terminates the stream.
    fn decode_children<T>(self) -> BoxStream<'static, FlowResult<ChildEvent<T>>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.try_map_values(of_child::<T>)
    }

    /// Decodes each envelope payload, emitting an empty payload for malformed children.
    fn decode_children_safe<T>(self) -> BoxStream<'static, FlowResult<ChildEvent<T>>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.map_values(of_child_safe::<T>)
    }
}

impl<S> ChildEventStreamExt for S where
    S: Stream<Item = FlowResult<ChildEvent<DataSnapshot>>> + Send + 'static
{
}
