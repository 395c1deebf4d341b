//! Bridge host
//!
//! The attach point a native host view sets up once when it is connected to
//! the application runtime: a messenger with the device channel registered.

use std::sync::Arc;

use crate::channel::MethodChannel;
use crate::config::BridgeConfig;
use crate::device::{register_device_channel, DeviceMethod};
use crate::error::Result;
use crate::messenger::{BinaryMessenger, LocalMessenger};
use crate::ui_mode::UiModeSource;

/// Owns the messenger and the channels registered on it.
pub struct BridgeHost {
    config: BridgeConfig,
    messenger: Arc<LocalMessenger>,
    device_channel: MethodChannel,
}

impl BridgeHost {
    /// Attach the bridge, registering the device channel over `ui_mode`.
    pub fn attach<S>(config: BridgeConfig, ui_mode: S) -> Self
    where
        S: UiModeSource + 'static,
    {
        let messenger = Arc::new(LocalMessenger::new());
        let device_channel = register_device_channel(
            messenger.clone() as Arc<dyn BinaryMessenger>,
            &config.device.channel,
            config.device.codec.codec(),
            ui_mode,
        );

        Self {
            config,
            messenger,
            device_channel,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn messenger(&self) -> &Arc<LocalMessenger> {
        &self.messenger
    }

    /// The device capability channel.
    pub fn device_channel(&self) -> &MethodChannel {
        &self.device_channel
    }

    /// Methods the device channel recognizes.
    pub fn device_methods(&self) -> &'static [DeviceMethod] {
        DeviceMethod::ALL
    }

    /// Deliver one encoded message and return the encoded reply.
    ///
    /// `None` means the channel or method is not implemented.
    pub fn handle_message(&self, channel: &str, message: &[u8]) -> Result<Option<Vec<u8>>> {
        self.messenger.send_sync(channel, message)
    }
}

impl std::fmt::Debug for BridgeHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeHost")
            .field("config", &self.config)
            .field("channels", &self.messenger.channels())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{CodecKind, JsonMethodCodec, MethodCodec, StandardMethodCodec};
    use crate::invocation::{Invocation, Reply};
    use crate::ui_mode::{FixedUiMode, UiModeType};
    use serde_json::json;

    #[test]
    fn test_attach_registers_device_channel() {
        let host = BridgeHost::attach(BridgeConfig::default(), FixedUiMode(UiModeType::Normal));

        assert_eq!(host.messenger().channels(), vec!["selene/device"]);
        assert_eq!(host.device_channel().name(), "selene/device");
        assert_eq!(host.device_methods(), &[DeviceMethod::IsAndroidTv]);
    }

    #[test]
    fn test_custom_channel_name() {
        let mut config = BridgeConfig::default();
        config.device.channel = "selene/device/v2".to_string();
        let host = BridgeHost::attach(config, FixedUiMode(UiModeType::Television));

        let message = StandardMethodCodec
            .encode_method_call(&Invocation::new("isAndroidTv"))
            .unwrap();
        assert_eq!(
            host.handle_message("selene/device/v2", &message).unwrap(),
            Some(vec![0x00, 0x01])
        );
        assert_eq!(host.handle_message("selene/device", &message).unwrap(), None);
    }

    #[test]
    fn test_device_channel_round_trip() {
        let host = BridgeHost::attach(BridgeConfig::default(), FixedUiMode(UiModeType::Television));

        assert_eq!(
            host.device_channel().invoke_method("isAndroidTv", None).unwrap(),
            Reply::Success(json!(true))
        );
    }

    #[test]
    fn test_app_bytes_on_default_channel() {
        let host = BridgeHost::attach(BridgeConfig::default(), FixedUiMode(UiModeType::Television));

        let mut message = vec![7, 11];
        message.extend_from_slice(b"isAndroidTv");
        message.push(0);

        assert_eq!(
            host.handle_message("selene/device", &message).unwrap(),
            Some(vec![0x00, 0x01])
        );
    }

    #[test]
    fn test_json_codec_from_config() {
        let mut config = BridgeConfig::default();
        config.device.codec = CodecKind::Json;
        let host = BridgeHost::attach(config, FixedUiMode(UiModeType::Normal));

        let message = JsonMethodCodec
            .encode_method_call(&Invocation::new("isAndroidTv"))
            .unwrap();
        assert_eq!(
            host.handle_message("selene/device", &message).unwrap(),
            Some(b"[false]".to_vec())
        );
    }
}
