//! Buffering configuration for listener-backed streams.

use crate::error::{invalid_argument, FlowResult};

/// Capacity used by single-completion streams; the bridge never holds more than one result.
pub const SINGLE_COMPLETION_CAPACITY: usize = 1;

/// How many undelivered events a listener-backed stream keeps before dropping new ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BufferPolicy {
    /// Keep every event until the consumer reads it.
    #[default]
    Unbounded,
    /// Keep at most `n` events; further events are dropped until the consumer catches up.
    Bounded(usize),
}

impl BufferPolicy {
    pub(crate) fn channel<T>(self) -> (async_channel::Sender<T>, async_channel::Receiver<T>) {
        match self {
            BufferPolicy::Unbounded => async_channel::unbounded(),
            BufferPolicy::Bounded(capacity) => async_channel::bounded(capacity),
        }
    }
}

/// Configuration options for listener-backed streams.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct FlowSettings {
    buffer: BufferPolicy,
}

impl FlowSettings {
    /// Creates a new settings object after validating values.
    pub fn new(buffer: BufferPolicy) -> FlowResult<Self> {
        validate_buffer(buffer)?;
        Ok(Self { buffer })
    }

    /// Shorthand for a bounded buffer of `capacity` events.
    pub fn bounded(capacity: usize) -> FlowResult<Self> {
        Self::new(BufferPolicy::Bounded(capacity))
    }

    pub fn buffer(&self) -> BufferPolicy {
        self.buffer
    }
}

pub(crate) fn validate_buffer(buffer: BufferPolicy) -> FlowResult<()> {
    if buffer == BufferPolicy::Bounded(0) {
        return Err(invalid_argument("bounded buffer capacity must be greater than zero"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_unbounded() {
        assert_eq!(FlowSettings::default().buffer(), BufferPolicy::Unbounded);
    }

    #[test]
    fn new_validates_capacity() {
        assert!(FlowSettings::bounded(4).is_ok());
        let err = FlowSettings::bounded(0).unwrap_err();
        assert_eq!(err.code_str(), "flow/invalid-argument");
    }
}
