//! Android asset loading via NDK AssetManager
//!
//! On Android, app assets are stored in the APK file and accessed
//! through the AssetManager API. The host looks here for `selene.toml`,
//! and the NDK resource configuration is read through the same manager.

use selene_bridge::{BridgeError, Result};

#[cfg(target_os = "android")]
use jni::objects::{GlobalRef, JObject};
#[cfg(target_os = "android")]
use jni::JNIEnv;
#[cfg(target_os = "android")]
use ndk::asset::AssetManager;
#[cfg(target_os = "android")]
use std::ffi::CString;

#[cfg(target_os = "android")]
#[link(name = "android")]
extern "C" {
    fn AAssetManager_fromJava(
        env: *mut jni::sys::JNIEnv,
        asset_manager: jni::sys::jobject,
    ) -> *mut std::ffi::c_void;
}

/// APK assets of the host application
pub struct AndroidAssets {
    // Keeps the Java AssetManager alive for as long as `manager` is used
    #[cfg(target_os = "android")]
    _java_manager: GlobalRef,
    #[cfg(target_os = "android")]
    manager: AssetManager,
}

// SAFETY: AAssetManager is documented as thread-safe, and the Java object
// backing it is pinned by a global reference.
#[cfg(target_os = "android")]
unsafe impl Send for AndroidAssets {}
#[cfg(target_os = "android")]
unsafe impl Sync for AndroidAssets {}

#[cfg(target_os = "android")]
impl AndroidAssets {
    /// Get the asset manager of an Android `Context`
    pub fn from_context(env: &mut JNIEnv, context: &JObject) -> Result<Self> {
        let java_manager = match env
            .call_method(context, "getAssets", "()Landroid/content/res/AssetManager;", &[])
            .and_then(|value| value.l())
        {
            Ok(obj) => obj,
            Err(e) => return Err(crate::jni_bridge::service_error(env, "Context.getAssets", e)),
        };
        if java_manager.is_null() {
            return Err(BridgeError::ServiceUnavailable(
                "Context.getAssets returned null".to_string(),
            ));
        }

        let java_manager = match env.new_global_ref(&java_manager) {
            Ok(global) => global,
            Err(e) => return Err(crate::jni_bridge::service_error(env, "NewGlobalRef", e)),
        };

        // SAFETY: both pointers are valid for the duration of this native call
        let raw = unsafe { AAssetManager_fromJava(env.get_raw(), java_manager.as_obj().as_raw()) };
        let ptr = std::ptr::NonNull::new(raw).ok_or_else(|| {
            BridgeError::ServiceUnavailable("AAssetManager_fromJava returned null".to_string())
        })?;
        // SAFETY: the pointer came from AAssetManager_fromJava and outlives
        // `manager` through the global reference held alongside it
        let manager = unsafe { AssetManager::from_ptr(ptr.cast()) };

        Ok(Self {
            _java_manager: java_manager,
            manager,
        })
    }

    /// The NDK asset manager
    pub fn manager(&self) -> &AssetManager {
        &self.manager
    }

    /// Load an asset by path (relative to assets/ folder in APK)
    pub fn load(&self, path: &str) -> Result<Vec<u8>> {
        use std::io::Read;

        let asset_path = path.trim_start_matches('/');
        let c_path = CString::new(asset_path)
            .map_err(|e| BridgeError::Config(format!("Invalid asset path: {}", e)))?;

        let mut asset = self.manager.open(&c_path).ok_or_else(|| {
            BridgeError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Asset not found: {}", path),
            ))
        })?;

        let mut buffer = Vec::new();
        asset.read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    pub fn exists(&self, path: &str) -> bool {
        let Ok(c_path) = CString::new(path.trim_start_matches('/')) else {
            return false;
        };
        self.manager.open(&c_path).is_some()
    }
}

// Stub implementation for non-Android builds (for cross-compilation checks)
#[cfg(not(target_os = "android"))]
impl AndroidAssets {
    /// Create a placeholder with no assets
    pub fn placeholder() -> Self {
        Self {}
    }

    pub fn load(&self, path: &str) -> Result<Vec<u8>> {
        Err(BridgeError::Unsupported(format!(
            "cannot load '{}': APK assets are only available on Android",
            path
        )))
    }

    pub fn exists(&self, _path: &str) -> bool {
        false
    }
}

/// Read an optional asset: `Ok(None)` when it does not exist.
pub fn load_optional(assets: &AndroidAssets, path: &str) -> Result<Option<Vec<u8>>> {
    if !assets.exists(path) {
        return Ok(None);
    }
    assets.load(path).map(Some)
}
