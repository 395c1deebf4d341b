//! Method channels
//!
//! A [`MethodChannel`] layers named method calls over a [`BinaryMessenger`]
//! channel. The host side installs a [`MethodCallHandler`]; the client side
//! uses [`MethodChannel::invoke_method`]. Channels speak the standard binary
//! format unless created with another [`MethodCodec`].

use std::sync::{mpsc, Arc};

use serde_json::Value;

use crate::codec::{MethodCodec, StandardMethodCodec};
use crate::error::{BridgeError, Result};
use crate::invocation::{Invocation, Reply};
use crate::messenger::{BinaryMessageHandler, BinaryMessenger, BinaryReply};
use crate::result::ResultChannel;

/// Error code sent when an incoming message cannot be decoded.
pub const MALFORMED_CALL_ERROR_CODE: &str = "malformed_call";

/// Handles method calls arriving on a channel.
pub trait MethodCallHandler: Send + Sync {
    /// Handle `call`, resolving `result` exactly once.
    fn on_method_call(&self, call: Invocation, result: ResultChannel);
}

impl<F> MethodCallHandler for F
where
    F: Fn(Invocation, ResultChannel) + Send + Sync,
{
    fn on_method_call(&self, call: Invocation, result: ResultChannel) {
        self(call, result)
    }
}

/// A named method channel.
#[derive(Clone)]
pub struct MethodChannel {
    name: String,
    messenger: Arc<dyn BinaryMessenger>,
    codec: Arc<dyn MethodCodec>,
}

impl MethodChannel {
    /// Create a channel named `name` over `messenger` using the standard codec.
    pub fn new(messenger: Arc<dyn BinaryMessenger>, name: impl Into<String>) -> Self {
        Self::with_codec(messenger, name, Arc::new(StandardMethodCodec))
    }

    /// Create a channel named `name` over `messenger` using `codec`.
    pub fn with_codec(
        messenger: Arc<dyn BinaryMessenger>,
        name: impl Into<String>,
        codec: Arc<dyn MethodCodec>,
    ) -> Self {
        Self {
            name: name.into(),
            messenger,
            codec,
        }
    }

    /// Channel name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wire format of this channel.
    pub fn codec(&self) -> &Arc<dyn MethodCodec> {
        &self.codec
    }

    /// Install or clear the handler for incoming method calls.
    pub fn set_method_call_handler(&self, handler: Option<Arc<dyn MethodCallHandler>>) {
        let Some(handler) = handler else {
            self.messenger.set_message_handler(&self.name, None);
            return;
        };

        let codec = Arc::clone(&self.codec);
        let channel = self.name.clone();
        let binary: BinaryMessageHandler = Arc::new(move |message: &[u8], reply: BinaryReply| {
            let call = match codec.decode_method_call(message) {
                Ok(call) => call,
                Err(e) => {
                    tracing::warn!(channel = %channel, "dropping malformed method call: {}", e);
                    let bad = Reply::error(MALFORMED_CALL_ERROR_CODE, Some(e.to_string()), None);
                    reply(codec.encode_reply(&bad).ok().flatten());
                    return;
                }
            };

            tracing::debug!(channel = %channel, method = call.method(), "method call");

            let method = call.method().to_string();
            let codec = Arc::clone(&codec);
            let result = ResultChannel::new(method.clone(), move |outcome| {
                match codec.encode_reply(&outcome) {
                    Ok(bytes) => reply(bytes),
                    Err(e) => {
                        tracing::error!(method = %method, "failed to encode reply: {}", e);
                        let fallback = Reply::error("encode_failed", Some(e.to_string()), None);
                        reply(codec.encode_reply(&fallback).ok().flatten());
                    }
                }
            });
            handler.on_method_call(call, result);
        });

        self.messenger.set_message_handler(&self.name, Some(binary));
    }

    /// Invoke `method` on this channel and wait for the reply.
    ///
    /// The receiving handler must reply before returning.
    pub fn invoke_method(&self, method: &str, arguments: Option<Value>) -> Result<Reply> {
        let call = match arguments {
            Some(args) => Invocation::with_arguments(method, args),
            None => Invocation::new(method),
        };
        let message = self.codec.encode_method_call(&call)?;

        let (tx, rx) = mpsc::channel();
        self.messenger.send(
            &self.name,
            &message,
            Box::new(move |reply| {
                let _ = tx.send(reply);
            }),
        );
        let bytes = rx
            .try_recv()
            .map_err(|_| BridgeError::ReplyPending(self.name.clone()))?;

        self.codec.decode_reply(bytes.as_deref())
    }
}

impl std::fmt::Debug for MethodChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodChannel").field("name", &self.name).finish()
    }
}
