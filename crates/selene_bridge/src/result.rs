//! Write-once result channels
//!
//! Every [`Invocation`](crate::Invocation) is handed a [`ResultChannel`] that
//! must be resolved exactly once. The terminal operations take `self` by
//! value, so a channel cannot be resolved twice. A channel that is dropped
//! without being resolved answers its caller with an `"unresolved"` error
//! instead of leaving it waiting.

use serde_json::Value;

use crate::invocation::Reply;

/// Error code sent when a result channel is dropped unresolved.
pub const UNRESOLVED_ERROR_CODE: &str = "unresolved";

/// Callback that receives the final reply for one invocation.
pub type ReplyCallback = Box<dyn FnOnce(Reply) + Send + 'static>;

/// One-shot response sink bound to a single invocation.
pub struct ResultChannel {
    method: String,
    reply: Option<ReplyCallback>,
}

impl ResultChannel {
    /// Create a result channel for `method` that delivers its reply to `callback`.
    pub fn new<F>(method: impl Into<String>, callback: F) -> Self
    where
        F: FnOnce(Reply) + Send + 'static,
    {
        Self {
            method: method.into(),
            reply: Some(Box::new(callback)),
        }
    }

    /// Name of the method this channel answers.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Resolve with a success value.
    pub fn success(mut self, value: impl Into<Value>) {
        self.resolve(Reply::Success(value.into()));
    }

    /// Resolve with an explicit error.
    pub fn error(mut self, code: impl Into<String>, message: Option<String>, details: Option<Value>) {
        self.resolve(Reply::error(code, message, details));
    }

    /// Resolve as "not implemented" so the caller can fall back to another capability.
    pub fn not_implemented(mut self) {
        self.resolve(Reply::NotImplemented);
    }

    fn resolve(&mut self, reply: Reply) {
        if let Some(callback) = self.reply.take() {
            callback(reply);
        }
    }
}

impl Drop for ResultChannel {
    fn drop(&mut self) {
        if self.reply.is_some() {
            tracing::warn!(method = %self.method, "result channel dropped without a reply");
            let message = format!("handler for '{}' returned without replying", self.method);
            self.resolve(Reply::error(UNRESOLVED_ERROR_CODE, Some(message), None));
        }
    }
}

impl std::fmt::Debug for ResultChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultChannel")
            .field("method", &self.method)
            .field("resolved", &self.reply.is_none())
            .finish()
    }
}
