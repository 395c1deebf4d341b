//! Method invocations and their replies

use serde_json::Value;

/// A single named request sent from the application layer to the host.
#[derive(Clone, Debug, PartialEq)]
pub struct Invocation {
    method: String,
    arguments: Option<Value>,
}

impl Invocation {
    /// Create an invocation without arguments.
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            arguments: None,
        }
    }

    /// Create an invocation carrying an argument payload.
    pub fn with_arguments(method: impl Into<String>, arguments: Value) -> Self {
        Self {
            method: method.into(),
            arguments: Some(arguments),
        }
    }

    /// The method name used for dispatch.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The untyped argument payload, if any.
    ///
    /// A JSON `null` payload is reported as `None`.
    pub fn arguments(&self) -> Option<&Value> {
        self.arguments.as_ref().filter(|v| !v.is_null())
    }
}

/// The resolved outcome of an [`Invocation`].
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    /// The handler produced a value.
    Success(Value),
    /// The handler recognized the method but could not complete it.
    Error {
        code: String,
        message: Option<String>,
        details: Option<Value>,
    },
    /// The method is not recognized by this host.
    NotImplemented,
}

impl Reply {
    /// Build an error reply.
    pub fn error(code: impl Into<String>, message: Option<String>, details: Option<Value>) -> Self {
        Reply::Error {
            code: code.into(),
            message,
            details,
        }
    }

    /// Check if this is a success reply
    pub fn is_success(&self) -> bool {
        matches!(self, Reply::Success(_))
    }

    /// Check if this is a not-implemented reply
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Reply::NotImplemented)
    }

    /// The success value, if any.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Reply::Success(value) => Some(value),
            _ => None,
        }
    }

    /// The success value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        self.value().and_then(Value::as_bool)
    }
}
