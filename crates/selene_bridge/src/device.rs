//! Device capability bridge
//!
//! Answers capability queries on the `selene/device` channel. Recognized
//! methods form a closed set ([`DeviceMethod`]); every other method name is
//! answered with "not implemented" so the application layer can check for
//! capabilities on older or newer hosts.

use std::sync::Arc;

use crate::channel::{MethodCallHandler, MethodChannel};
use crate::codec::MethodCodec;
use crate::error::Result;
use crate::invocation::Invocation;
use crate::messenger::BinaryMessenger;
use crate::result::ResultChannel;
use crate::ui_mode::{UiModeSource, UiModeType};

/// Default name of the device capability channel.
pub const DEVICE_CHANNEL: &str = "selene/device";

/// Error code sent when the UI mode service cannot be queried.
pub const UI_MODE_UNAVAILABLE_ERROR_CODE: &str = "ui_mode_unavailable";

/// Methods recognized on the device channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceMethod {
    /// `isAndroidTv`: no arguments, returns `true` iff the UI mode is television.
    IsAndroidTv,
}

impl DeviceMethod {
    pub const ALL: &'static [DeviceMethod] = &[DeviceMethod::IsAndroidTv];

    /// Wire name of the method.
    pub const fn name(self) -> &'static str {
        match self {
            DeviceMethod::IsAndroidTv => "isAndroidTv",
        }
    }

    /// Look up a method by wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.name() == name)
    }
}

/// Dispatches device capability calls against a [`UiModeSource`].
pub struct DeviceBridge<S> {
    ui_mode: S,
}

impl<S: UiModeSource> DeviceBridge<S> {
    pub fn new(ui_mode: S) -> Self {
        Self { ui_mode }
    }

    /// Query the OS and report whether the device is in television mode.
    pub fn is_television(&self) -> Result<bool> {
        let mode = self.ui_mode.current_mode_type()?;
        Ok(mode == UiModeType::Television)
    }

    /// Handle one invocation, resolving `result` exactly once.
    pub fn handle(&self, call: Invocation, result: ResultChannel) {
        let Some(method) = DeviceMethod::from_name(call.method()) else {
            tracing::debug!(method = call.method(), "device method not implemented");
            result.not_implemented();
            return;
        };

        match method {
            DeviceMethod::IsAndroidTv => match self.is_television() {
                Ok(is_tv) => {
                    tracing::debug!(is_tv, "isAndroidTv");
                    result.success(is_tv);
                }
                Err(e) => {
                    tracing::warn!("UI mode query failed: {}", e);
                    result.error(UI_MODE_UNAVAILABLE_ERROR_CODE, Some(e.to_string()), None);
                }
            },
        }
    }
}

impl<S: UiModeSource> MethodCallHandler for DeviceBridge<S> {
    fn on_method_call(&self, call: Invocation, result: ResultChannel) {
        self.handle(call, result);
    }
}

/// Register a [`DeviceBridge`] over `ui_mode` on channel `name`.
pub fn register_device_channel<S>(
    messenger: Arc<dyn BinaryMessenger>,
    name: &str,
    codec: Arc<dyn MethodCodec>,
    ui_mode: S,
) -> MethodChannel
where
    S: UiModeSource + 'static,
{
    let channel = MethodChannel::with_codec(messenger, name, codec);
    channel.set_method_call_handler(Some(Arc::new(DeviceBridge::new(ui_mode))));
    tracing::info!(channel = name, "device channel attached");
    channel
}
