use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use serde_json::Value;

/// Shared, thread-safe handle to the error reported by the underlying SDK.
pub type ErrorSource = Arc<dyn Error + Send + Sync + 'static>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowErrorCode {
    /// The single-completion operation reported a failure.
    OperationFailed,
    /// A listener source reported a terminal error (permission denied, disconnect, ...).
    ListenerFailed,
    /// A payload could not be decoded into the requested type.
    DataCast,
    /// Every producer handle was dropped before the stream was closed.
    Abandoned,
    /// Rejected configuration, such as a zero-capacity buffer.
    InvalidArgument,
    /// The listener source broke its own contract, such as a child event without a key.
    Internal,
}

impl FlowErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowErrorCode::OperationFailed => "flow/operation-failed",
            FlowErrorCode::ListenerFailed => "flow/listener-failed",
            FlowErrorCode::DataCast => "flow/data-cast",
            FlowErrorCode::Abandoned => "flow/abandoned",
            FlowErrorCode::InvalidArgument => "flow/invalid-argument",
            FlowErrorCode::Internal => "flow/internal",
        }
    }
}

/// Error terminating a [`FlowStream`](crate::flow::FlowStream).
///
/// Failures reported by the SDK are kept untouched as the error [`source`](Error::source) and can
/// be recovered with [`FlowError::downcast_source`].
#[derive(Clone, Debug)]
pub struct FlowError {
    pub code: FlowErrorCode,
    message: String,
    source: Option<ErrorSource>,
}

impl FlowError {
    pub fn new(code: FlowErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: ErrorSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the wrapped cause when it is of type `E`.
    pub fn downcast_source<E>(&self) -> Option<&E>
    where
        E: Error + 'static,
    {
        self.source.as_deref().and_then(|source| source.downcast_ref::<E>())
    }

    /// Returns the conversion details when this is a [`FlowErrorCode::DataCast`] error.
    pub fn as_data_cast(&self) -> Option<&DataCastError> {
        self.downcast_source::<DataCastError>()
    }

    pub fn is_data_cast(&self) -> bool {
        self.code == FlowErrorCode::DataCast
    }
}

impl Display for FlowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl Error for FlowError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_deref()
            .map(|source| source as &(dyn Error + 'static))
    }
}

pub type FlowResult<T> = Result<T, FlowError>;

/// Details of a payload that could not be coerced into the requested type.
#[derive(Clone, Debug)]
pub struct DataCastError {
    payload: Value,
    target_type: &'static str,
    cause: Option<Arc<serde_json::Error>>,
}

impl DataCastError {
    pub fn new(payload: Value, target_type: &'static str, cause: Option<serde_json::Error>) -> Self {
        Self {
            payload,
            target_type,
            cause: cause.map(Arc::new),
        }
    }

    /// The raw payload that failed to decode.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn target_type(&self) -> &'static str {
        self.target_type
    }

    /// `true` when the payload decoded to an absent value rather than failing to parse.
    pub fn is_null(&self) -> bool {
        self.cause.is_none()
    }
}

impl Display for DataCastError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(
                f,
                "Unable to cast {} to {}: {cause}",
                self.payload, self.target_type
            ),
            None => write!(
                f,
                "Unable to cast {} to {}: value is null",
                self.payload, self.target_type
            ),
        }
    }
}

impl Error for DataCastError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn Error + 'static))
    }
}

pub fn operation_failed<E>(error: E) -> FlowError
where
    E: Error + Send + Sync + 'static,
{
    FlowError::new(FlowErrorCode::OperationFailed, error.to_string()).with_source(Arc::new(error))
}

pub fn listener_failed<E>(error: E) -> FlowError
where
    E: Error + Send + Sync + 'static,
{
    FlowError::new(FlowErrorCode::ListenerFailed, error.to_string()).with_source(Arc::new(error))
}

pub fn data_cast(error: DataCastError) -> FlowError {
    FlowError::new(FlowErrorCode::DataCast, error.to_string()).with_source(Arc::new(error))
}

pub fn abandoned(message: impl Into<String>) -> FlowError {
    FlowError::new(FlowErrorCode::Abandoned, message)
}

pub fn invalid_argument(message: impl Into<String>) -> FlowError {
    FlowError::new(FlowErrorCode::InvalidArgument, message)
}

pub fn internal_error(message: impl Into<String>) -> FlowError {
    FlowError::new(FlowErrorCode::Internal, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq)]
    struct VendorError(&'static str);

    impl Display for VendorError {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            write!(f, "vendor: {}", self.0)
        }
    }

    impl Error for VendorError {}

    #[test]
    fn operation_failure_keeps_vendor_error() {
        let error = operation_failed(VendorError("quota exceeded"));
        assert_eq!(error.code_str(), "flow/operation-failed");
        assert_eq!(
            error.downcast_source::<VendorError>(),
            Some(&VendorError("quota exceeded"))
        );
        assert!(error.to_string().contains("vendor: quota exceeded"));
    }

    #[test]
    fn data_cast_exposes_payload_and_target() {
        let cause = serde_json::from_value::<u32>(json!("nope")).unwrap_err();
        let error = data_cast(DataCastError::new(json!("nope"), "u32", Some(cause)));
        assert!(error.is_data_cast());
        let details = error.as_data_cast().expect("cast details");
        assert_eq!(details.payload(), &json!("nope"));
        assert_eq!(details.target_type(), "u32");
        assert!(!details.is_null());
        assert!(error.source().is_some());
    }

    #[test]
    fn null_cast_has_no_parse_cause() {
        let error = data_cast(DataCastError::new(Value::Null, "String", None));
        let details = error.as_data_cast().unwrap();
        assert!(details.is_null());
        assert!(details.source().is_none());
        assert!(error.message().contains("value is null"));
    }
}
