use std::fmt;

/// Kinds of child events reported by a query listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChildEventType {
    Added,
    Changed,
    Removed,
    Moved,
}

impl ChildEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChildEventType::Added => "child_added",
            ChildEventType::Changed => "child_changed",
            ChildEventType::Removed => "child_removed",
            ChildEventType::Moved => "child_moved",
        }
    }
}

impl fmt::Display for ChildEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One child event: the affected child, its payload and an ordering hint.
///
/// `value` is always present for added, changed and moved events. It is absent for removals
/// without a payload and when a safe conversion could not decode the child.
#[derive(Clone, Debug, PartialEq)]
pub struct ChildEvent<T> {
    pub key: String,
    pub value: Option<T>,
    pub event_type: ChildEventType,
    /// Key of the sibling this child now follows, if any.
    pub previous_child: Option<String>,
}

impl<T> ChildEvent<T> {
    pub fn added(key: impl Into<String>, value: T, previous_child: Option<String>) -> Self {
        Self::with_value(key, value, ChildEventType::Added, previous_child)
    }

    pub fn changed(key: impl Into<String>, value: T, previous_child: Option<String>) -> Self {
        Self::with_value(key, value, ChildEventType::Changed, previous_child)
    }

    pub fn moved(key: impl Into<String>, value: T, previous_child: Option<String>) -> Self {
        Self::with_value(key, value, ChildEventType::Moved, previous_child)
    }

    pub fn removed(key: impl Into<String>, value: Option<T>) -> Self {
        Self {
            key: key.into(),
            value,
            event_type: ChildEventType::Removed,
            previous_child: None,
        }
    }

    fn with_value(
        key: impl Into<String>,
        value: T,
        event_type: ChildEventType,
        previous_child: Option<String>,
    ) -> Self {
        Self {
            key: key.into(),
            value: Some(value),
            event_type,
            previous_child,
        }
    }

    /// `true` when the envelope carries no payload.
    pub fn has_error(&self) -> bool {
        self.value.is_none()
    }

    /// Replaces the payload, keeping key, kind and ordering hint.
    pub fn with_payload<U>(self, value: Option<U>) -> ChildEvent<U> {
        ChildEvent {
            key: self.key,
            value,
            event_type: self.event_type,
            previous_child: self.previous_child,
        }
    }

    pub fn map_value<U, F>(self, transform: F) -> ChildEvent<U>
    where
        F: FnOnce(T) -> U,
    {
        let ChildEvent {
            key,
            value,
            event_type,
            previous_child,
        } = self;
        ChildEvent {
            key,
            value: value.map(transform),
            event_type,
            previous_child,
        }
    }
}
