//! Android UI mode sources
//!
//! Two ways to ask Android for the current UI mode type:
//!
//! - [`UiModeManagerSource`] calls `UiModeManager.getCurrentModeType()` on the
//!   `uimode` system service over JNI
//! - [`ConfigurationUiModeSource`] reads `AConfiguration_getUiModeType` from
//!   the NDK resource configuration
//!
//! Both re-query the OS on every call.

use std::sync::Arc;

use selene_bridge::{Result, UiModeSource, UiModeType};

use crate::assets::AndroidAssets;

#[cfg(not(target_os = "android"))]
use selene_bridge::BridgeError;

#[cfg(target_os = "android")]
use jni::objects::{GlobalRef, JObject, JValue};
#[cfg(target_os = "android")]
use jni::{JNIEnv, JavaVM};

/// `Context.UI_MODE_SERVICE`
pub const UI_MODE_SERVICE: &str = "uimode";

/// Queries the `UiModeManager` system service
pub struct UiModeManagerSource {
    #[cfg(target_os = "android")]
    vm: JavaVM,
    #[cfg(target_os = "android")]
    context: GlobalRef,
}

#[cfg(target_os = "android")]
impl UiModeManagerSource {
    /// Create a source bound to an Android `Context`
    ///
    /// Pass the application context; it outlives any single activity.
    pub fn new(env: &mut JNIEnv, context: &JObject) -> Result<Self> {
        let vm = match env.get_java_vm() {
            Ok(vm) => vm,
            Err(e) => return Err(crate::jni_bridge::service_error(env, "GetJavaVM", e)),
        };
        let context = match env.new_global_ref(context) {
            Ok(global) => global,
            Err(e) => return Err(crate::jni_bridge::service_error(env, "NewGlobalRef", e)),
        };
        Ok(Self { vm, context })
    }

    fn query(&self) -> Result<UiModeType> {
        use crate::jni_bridge::service_error;
        use selene_bridge::BridgeError;

        let mut env = self.vm.attach_current_thread().map_err(|e| {
            BridgeError::ServiceUnavailable(format!("failed to attach JNI thread: {}", e))
        })?;

        let service_name = match env.new_string(UI_MODE_SERVICE) {
            Ok(name) => name,
            Err(e) => return Err(service_error(&mut env, "NewStringUTF", e)),
        };
        // Local refs are deleted on every path; an already-attached thread
        // never pops this frame.
        let manager = env
            .call_method(
                &self.context,
                "getSystemService",
                "(Ljava/lang/String;)Ljava/lang/Object;",
                &[JValue::Object(&*service_name)],
            )
            .and_then(|value| value.l());
        let _ = env.delete_local_ref(service_name);
        let manager = match manager {
            Ok(manager) => manager,
            Err(e) => return Err(service_error(&mut env, "Context.getSystemService", e)),
        };

        if manager.is_null() {
            return Err(BridgeError::ServiceUnavailable(
                "UI mode service is not available on this device".to_string(),
            ));
        }

        let raw = env
            .call_method(&manager, "getCurrentModeType", "()I", &[])
            .and_then(|value| value.i());
        let _ = env.delete_local_ref(manager);
        match raw {
            Ok(raw) => Ok(UiModeType::from_raw(raw)),
            Err(e) => Err(service_error(&mut env, "UiModeManager.getCurrentModeType", e)),
        }
    }
}

#[cfg(target_os = "android")]
impl UiModeSource for UiModeManagerSource {
    fn current_mode_type(&self) -> Result<UiModeType> {
        self.query()
    }
}

// Stub implementation for non-Android builds (for cross-compilation checks)
#[cfg(not(target_os = "android"))]
impl UiModeManagerSource {
    /// Create a placeholder source (fails on non-Android)
    pub fn placeholder() -> Self {
        Self {}
    }
}

#[cfg(not(target_os = "android"))]
impl UiModeSource for UiModeManagerSource {
    fn current_mode_type(&self) -> Result<UiModeType> {
        Err(BridgeError::Unsupported(
            "UiModeManager is only available on Android".to_string(),
        ))
    }
}

/// Reads the UI mode type from the NDK resource configuration
pub struct ConfigurationUiModeSource {
    #[cfg_attr(not(target_os = "android"), allow(dead_code))]
    assets: Arc<AndroidAssets>,
}

impl ConfigurationUiModeSource {
    pub fn new(assets: Arc<AndroidAssets>) -> Self {
        Self { assets }
    }
}

#[cfg(target_os = "android")]
impl UiModeSource for ConfigurationUiModeSource {
    fn current_mode_type(&self) -> Result<UiModeType> {
        let config = ndk::configuration::Configuration::from_asset_manager(self.assets.manager());
        Ok(from_ndk(config.ui_mode_type()))
    }
}

#[cfg(not(target_os = "android"))]
impl UiModeSource for ConfigurationUiModeSource {
    fn current_mode_type(&self) -> Result<UiModeType> {
        Err(BridgeError::Unsupported(
            "AConfiguration is only available on Android".to_string(),
        ))
    }
}

#[cfg(target_os = "android")]
fn from_ndk(mode: ndk::configuration::UiModeType) -> UiModeType {
    use ndk::configuration::UiModeType as Ndk;

    match mode {
        Ndk::Normal => UiModeType::Normal,
        Ndk::Desk => UiModeType::Desk,
        Ndk::Car => UiModeType::Car,
        Ndk::Television => UiModeType::Television,
        Ndk::Appliance => UiModeType::Appliance,
        Ndk::Watch => UiModeType::Watch,
        Ndk::VrHeadset => UiModeType::VrHeadset,
        _ => UiModeType::Undefined,
    }
}
