//! JNI bridge for the host activity
//!
//! Native methods of `org.moontechlab.selene.MainActivity`:
//!
//! ```kotlin
//! private external fun nativeAttach(configToml: String?)
//! private external fun nativeHandleMessage(channel: String, message: ByteArray): ByteArray?
//! ```
//!
//! `nativeAttach` may pass TOML text that takes precedence over the
//! `selene.toml` asset; `null` uses the asset, or the defaults without one.
//!
//! `nativeHandleMessage` takes a method call in the channel's wire format
//! (Flutter's standard binary format unless `selene.toml` selects `json`) and
//! returns the encoded reply envelope, or `null` when the channel or method
//! is not implemented. Host failures surface as `IllegalStateException`.

use jni::objects::{JByteArray, JObject, JString};
use jni::sys::jbyteArray;
use jni::JNIEnv;

use selene_bridge::{BridgeError, Result};

use crate::activity::{attach_activity, host};

const ILLEGAL_STATE_EXCEPTION: &str = "java/lang/IllegalStateException";

/// Convert a JNI failure into a bridge error, clearing any pending Java
/// exception so the env stays usable.
pub(crate) fn service_error(env: &mut JNIEnv, what: &str, err: jni::errors::Error) -> BridgeError {
    if matches!(err, jni::errors::Error::JavaException) {
        let _ = env.exception_describe();
        let _ = env.exception_clear();
    }
    BridgeError::ServiceUnavailable(format!("{} failed: {}", what, err))
}

fn throw(env: &mut JNIEnv, err: &BridgeError) {
    tracing::error!("Selene bridge error: {}", err);
    if env.exception_check().unwrap_or(false) {
        return;
    }
    let _ = env.throw_new(ILLEGAL_STATE_EXCEPTION, err.to_string());
}

fn read_string(env: &mut JNIEnv, value: &JString) -> Result<Option<String>> {
    if value.is_null() {
        return Ok(None);
    }
    match env.get_string(value) {
        Ok(s) => Ok(Some(s.into())),
        Err(e) => Err(service_error(env, "GetStringUTFChars", e)),
    }
}

fn handle_message<'local>(
    env: &mut JNIEnv<'local>,
    activity: &JObject<'local>,
    channel: &JString<'local>,
    message: &JByteArray<'local>,
) -> Result<Option<JByteArray<'local>>> {
    let host = match host() {
        Some(host) => host,
        None => attach_activity(env, activity, None)?,
    };

    let Some(channel) = read_string(env, channel)? else {
        return Err(BridgeError::MalformedCall("channel name is null".to_string()));
    };
    if message.is_null() {
        return Err(BridgeError::MalformedCall("message is null".to_string()));
    }
    let bytes = match env.convert_byte_array(message) {
        Ok(bytes) => bytes,
        Err(e) => return Err(service_error(env, "GetByteArrayRegion", e)),
    };

    let Some(reply) = host.handle_message(&channel, &bytes)? else {
        return Ok(None);
    };
    match env.byte_array_from_slice(&reply) {
        Ok(array) => Ok(Some(array)),
        Err(e) => Err(service_error(env, "NewByteArray", e)),
    }
}

/// `MainActivity.nativeAttach(configToml: String?)`
#[no_mangle]
pub extern "system" fn Java_org_moontechlab_selene_MainActivity_nativeAttach<'local>(
    mut env: JNIEnv<'local>,
    activity: JObject<'local>,
    config_toml: JString<'local>,
) {
    let result = read_string(&mut env, &config_toml)
        .and_then(|config| attach_activity(&mut env, &activity, config));
    if let Err(e) = result {
        throw(&mut env, &e);
    }
}

/// `MainActivity.nativeHandleMessage(channel: String, message: ByteArray): ByteArray?`
#[no_mangle]
pub extern "system" fn Java_org_moontechlab_selene_MainActivity_nativeHandleMessage<'local>(
    mut env: JNIEnv<'local>,
    activity: JObject<'local>,
    channel: JString<'local>,
    message: JByteArray<'local>,
) -> jbyteArray {
    match handle_message(&mut env, &activity, &channel, &message) {
        Ok(Some(reply)) => reply.into_raw(),
        Ok(None) => std::ptr::null_mut(),
        Err(e) => {
            throw(&mut env, &e);
            std::ptr::null_mut()
        }
    }
}
