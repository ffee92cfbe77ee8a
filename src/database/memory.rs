use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;

use crate::database::error::{DatabaseError, DatabaseResult};
use crate::database::query::{ListenKind, ListenerId, Query, QueryEvent, QueryListener};
use crate::database::DataSnapshot;

/// In-memory listener source for tests and local prototyping.
///
/// Events pushed with [`emit`](Self::emit) (or the `emit_*` helpers) are delivered
/// synchronously to matching listeners, mimicking the SDK: single-value listeners are dropped
/// after their first value and every listener is dropped after a cancellation.
#[derive(Clone, Debug, Default)]
pub struct MemoryQuery {
    inner: Arc<MemoryQueryInner>,
}

#[derive(Default)]
struct MemoryQueryInner {
    listeners: Mutex<BTreeMap<ListenerId, (ListenKind, QueryListener<DatabaseError>)>>,
    rejection: Mutex<Option<DatabaseError>>,
    next_listener_id: AtomicU64,
    removals: AtomicUsize,
}

impl std::fmt::Debug for MemoryQueryInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryQueryInner")
            .field("listeners", &lock(&self.listeners).len())
            .field("removals", &self.removals.load(Ordering::SeqCst))
            .finish()
    }
}

impl MemoryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `event` to every listener it applies to, in registration order.
    pub fn emit(&self, event: QueryEvent<DatabaseError>) {
        let targets: Vec<_> = {
            let mut listeners = lock(&self.inner.listeners);
            let targets: Vec<_> = listeners
                .iter()
                .filter(|(_, (kind, _))| event.is_for(*kind))
                .map(|(id, (kind, listener))| (*id, *kind, Arc::clone(listener)))
                .collect();
            for (id, kind, _) in &targets {
                let one_shot = *kind == ListenKind::SingleValue;
                if one_shot || matches!(event, QueryEvent::Cancelled(_)) {
                    listeners.remove(id);
                }
            }
            targets
        };

        for (_, _, listener) in targets {
            listener(event.clone());
        }
    }

    pub fn emit_value(&self, value: Value) {
        self.emit(QueryEvent::Value(DataSnapshot::new(None, value)));
    }

    pub fn emit_child_added(&self, key: &str, value: Value, previous_child: Option<&str>) {
        self.emit(QueryEvent::ChildAdded {
            snapshot: DataSnapshot::keyed(key, value),
            previous_child: previous_child.map(str::to_string),
        });
    }

    pub fn emit_child_changed(&self, key: &str, value: Value, previous_child: Option<&str>) {
        self.emit(QueryEvent::ChildChanged {
            snapshot: DataSnapshot::keyed(key, value),
            previous_child: previous_child.map(str::to_string),
        });
    }

    pub fn emit_child_moved(&self, key: &str, value: Value, previous_child: Option<&str>) {
        self.emit(QueryEvent::ChildMoved {
            snapshot: DataSnapshot::keyed(key, value),
            previous_child: previous_child.map(str::to_string),
        });
    }

    pub fn emit_child_removed(&self, key: &str, value: Value) {
        self.emit(QueryEvent::ChildRemoved {
            snapshot: DataSnapshot::keyed(key, value),
        });
    }

    pub fn emit_cancelled(&self, error: DatabaseError) {
        self.emit(QueryEvent::Cancelled(error));
    }

    /// Makes the next `add_listener` call fail with `error`.
    pub fn reject_next_listener(&self, error: DatabaseError) {
        *lock(&self.inner.rejection) = Some(error);
    }

    pub fn active_listeners(&self) -> usize {
        lock(&self.inner.listeners).len()
    }

    /// Number of `remove_listener` calls received so far.
    pub fn total_removals(&self) -> usize {
        self.inner.removals.load(Ordering::SeqCst)
    }
}

impl Query for MemoryQuery {
    type Error = DatabaseError;

    fn add_listener(
        &self,
        kind: ListenKind,
        listener: QueryListener<DatabaseError>,
    ) -> DatabaseResult<ListenerId> {
        if let Some(error) = lock(&self.inner.rejection).take() {
            return Err(error);
        }
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::SeqCst);
        lock(&self.inner.listeners).insert(id, (kind, listener));
        Ok(id)
    }

    fn remove_listener(&self, id: ListenerId) {
        self.inner.removals.fetch_add(1, Ordering::SeqCst);
        lock(&self.inner.listeners).remove(&id);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
