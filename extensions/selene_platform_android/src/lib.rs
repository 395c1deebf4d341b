//! Selene Android Platform
//!
//! Host-side glue for the Android build of Selene:
//!
//! - **JNI entry points** the host activity calls to attach the bridge and
//!   forward channel messages
//! - **UI mode sources** backed by the `UiModeManager` system service and by
//!   the NDK resource configuration
//! - **Asset access** for `selene.toml` through the NDK `AssetManager`
//! - **Logcat logging** for both `log` and `tracing`
//!
//! # Host activity
//!
//! The activity forwards the raw bytes of the `selene/device` channel. They
//! are in Flutter's standard binary format, as produced by a `MethodChannel`
//! created without a codec on the Dart side.
//!
//! ```kotlin
//! class MainActivity : FlutterActivity() {
//!     override fun configureFlutterEngine(flutterEngine: FlutterEngine) {
//!         super.configureFlutterEngine(flutterEngine)
//!         nativeAttach(null)
//!         flutterEngine.dartExecutor.binaryMessenger.setMessageHandler("selene/device") { message, reply ->
//!             val bytes = ByteArray(message!!.remaining()).also { message.get(it) }
//!             val out = nativeHandleMessage("selene/device", bytes)
//!             reply.reply(out?.let { ByteBuffer.allocateDirect(it.size).put(it) })
//!         }
//!     }
//!
//!     private external fun nativeAttach(configToml: String?)
//!     private external fun nativeHandleMessage(channel: String, message: ByteArray): ByteArray?
//!
//!     companion object { init { System.loadLibrary("selene_platform_android") } }
//! }
//! ```

pub mod activity;
pub mod assets;
pub mod ui_mode;

#[cfg(target_os = "android")]
pub mod jni_bridge;

pub use activity::{attach_host, host, resolve_config, ResolvedConfig};
pub use assets::AndroidAssets;
pub use ui_mode::{ConfigurationUiModeSource, UiModeManagerSource};
