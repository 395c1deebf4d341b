//! Selene Native Bridge
//!
//! Platform-independent core of the Selene host shell:
//!
//! - **Method channels**: named request/response channels over a binary messenger,
//!   speaking Flutter's standard binary format by default
//! - **Result channels**: write-once reply sinks, one per invocation
//! - **Device bridge**: answers `isAndroidTv` on `selene/device` from the OS UI mode
//!
//! Platform glue (JNI entry points, logcat, APK assets) lives in
//! `selene_platform_android`.
//!
//! # Example
//!
//! ```rust
//! use selene_bridge::{BridgeConfig, BridgeHost, FixedUiMode, Reply, UiModeType};
//!
//! let host = BridgeHost::attach(BridgeConfig::default(), FixedUiMode(UiModeType::Television));
//!
//! let reply = host.device_channel().invoke_method("isAndroidTv", None).unwrap();
//! assert_eq!(reply.as_bool(), Some(true));
//!
//! let reply = host.device_channel().invoke_method("getBatteryLevel", None).unwrap();
//! assert_eq!(reply, Reply::NotImplemented);
//! ```

pub mod channel;
pub mod codec;
pub mod config;
pub mod device;
pub mod error;
pub mod host;
pub mod invocation;
pub mod messenger;
pub mod result;
pub mod ui_mode;

pub use channel::{MethodCallHandler, MethodChannel};
pub use codec::{CodecKind, JsonMethodCodec, MethodCodec, StandardMethodCodec};
pub use config::{BridgeConfig, DeviceConfig, LoggingConfig};
pub use device::{register_device_channel, DeviceBridge, DeviceMethod, DEVICE_CHANNEL};
pub use error::{BridgeError, Result};
pub use host::BridgeHost;
pub use invocation::{Invocation, Reply};
pub use messenger::{BinaryMessageHandler, BinaryMessenger, BinaryReply, LocalMessenger};
pub use result::{ReplyCallback, ResultChannel};
pub use ui_mode::{
    FallbackUiMode, FixedUiMode, SharedUiMode, UiModeSource, UiModeType, UnavailableUiMode,
};
