//! Binary messenger
//!
//! Named-channel byte transport between the application layer and the host.
//! The host registers one handler per channel name; each message is answered
//! through a one-shot [`BinaryReply`]. An absent reply means the channel or
//! method is not implemented by this host.

use std::sync::{mpsc, Arc, RwLock};

use rustc_hash::FxHashMap;

use crate::error::{BridgeError, Result};

/// One-shot reply callback for a binary message.
pub type BinaryReply = Box<dyn FnOnce(Option<Vec<u8>>) + Send + 'static>;

/// Handler invoked for every message on a channel.
pub type BinaryMessageHandler = Arc<dyn Fn(&[u8], BinaryReply) + Send + Sync + 'static>;

/// Host capability for registering named channels and delivering messages.
pub trait BinaryMessenger: Send + Sync {
    /// Register or clear the handler for `channel`.
    fn set_message_handler(&self, channel: &str, handler: Option<BinaryMessageHandler>);

    /// Deliver `message` to the handler registered for `channel`.
    ///
    /// Messages to unregistered channels are answered with `None`.
    fn send(&self, channel: &str, message: &[u8], reply: BinaryReply);
}

/// In-process messenger backed by a handler registry.
#[derive(Default)]
pub struct LocalMessenger {
    handlers: RwLock<FxHashMap<String, BinaryMessageHandler>>,
}

impl LocalMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of all channels with a registered handler, sorted.
    pub fn channels(&self) -> Vec<String> {
        let handlers = self.handlers.read().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = handlers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check whether a handler is registered for `channel`.
    pub fn has_handler(&self, channel: &str) -> bool {
        self.handlers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(channel)
    }

    /// Deliver a message and return the reply, which the handler must
    /// produce before returning.
    pub fn send_sync(&self, channel: &str, message: &[u8]) -> Result<Option<Vec<u8>>> {
        let (tx, rx) = mpsc::channel();
        self.send(
            channel,
            message,
            Box::new(move |reply| {
                let _ = tx.send(reply);
            }),
        );
        rx.try_recv()
            .map_err(|_| BridgeError::ReplyPending(channel.to_string()))
    }
}

impl BinaryMessenger for LocalMessenger {
    fn set_message_handler(&self, channel: &str, handler: Option<BinaryMessageHandler>) {
        let mut handlers = self.handlers.write().unwrap_or_else(|e| e.into_inner());
        match handler {
            Some(handler) => {
                tracing::debug!(channel, "channel handler registered");
                handlers.insert(channel.to_string(), handler);
            }
            None => {
                tracing::debug!(channel, "channel handler cleared");
                handlers.remove(channel);
            }
        }
    }

    fn send(&self, channel: &str, message: &[u8], reply: BinaryReply) {
        // Clone the handler out so it runs without holding the registry lock
        let handler = self
            .handlers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(channel)
            .cloned();

        match handler {
            Some(handler) => handler(message, reply),
            None => {
                tracing::debug!(channel, "message to unregistered channel");
                reply(None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo() -> BinaryMessageHandler {
        Arc::new(|message: &[u8], reply: BinaryReply| reply(Some(message.to_vec())))
    }

    #[test]
    fn test_routes_by_channel_name() {
        let messenger = LocalMessenger::new();
        messenger.set_message_handler("selene/echo", Some(echo()));

        assert_eq!(
            messenger.send_sync("selene/echo", b"ping").unwrap(),
            Some(b"ping".to_vec())
        );
        assert_eq!(messenger.send_sync("selene/other", b"ping").unwrap(), None);
    }

    #[test]
    fn test_clear_handler() {
        let messenger = LocalMessenger::new();
        messenger.set_message_handler("selene/echo", Some(echo()));
        assert!(messenger.has_handler("selene/echo"));

        messenger.set_message_handler("selene/echo", None);
        assert!(!messenger.has_handler("selene/echo"));
        assert_eq!(messenger.send_sync("selene/echo", b"ping").unwrap(), None);
    }

    #[test]
    fn test_channels_sorted() {
        let messenger = LocalMessenger::new();
        messenger.set_message_handler("selene/b", Some(echo()));
        messenger.set_message_handler("selene/a", Some(echo()));

        assert_eq!(messenger.channels(), vec!["selene/a", "selene/b"]);
    }

    #[test]
    fn test_deferred_reply_is_pending() {
        let parked: Arc<std::sync::Mutex<Option<BinaryReply>>> = Default::default();
        let slot = Arc::clone(&parked);

        let messenger = LocalMessenger::new();
        messenger.set_message_handler(
            "selene/slow",
            Some(Arc::new(move |_: &[u8], reply: BinaryReply| {
                *slot.lock().unwrap() = Some(reply);
            })),
        );

        assert!(matches!(
            messenger.send_sync("selene/slow", b"{}"),
            Err(BridgeError::ReplyPending(name)) if name == "selene/slow"
        ));
        assert!(parked.lock().unwrap().is_some());
    }
}
