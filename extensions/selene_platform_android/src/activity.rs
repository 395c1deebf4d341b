//! Host activity integration
//!
//! The bridge host is attached once per process, the first time the host
//! activity connects to the application runtime. Later attaches (activity
//! recreation, configuration changes) reuse it.

use std::sync::OnceLock;

use selene_bridge::config::CONFIG_FILE_NAME;
use selene_bridge::{BridgeConfig, BridgeHost, UiModeSource};

#[cfg(target_os = "android")]
use jni::objects::JObject;
#[cfg(target_os = "android")]
use jni::JNIEnv;
#[cfg(target_os = "android")]
use selene_bridge::{LoggingConfig, Result};

/// Process-wide bridge host
static HOST: OnceLock<BridgeHost> = OnceLock::new();

/// The attached bridge host, if any
pub fn host() -> Option<&'static BridgeHost> {
    HOST.get()
}

/// Attach the bridge host. The first call wins; later calls return the
/// existing host and drop their arguments.
pub fn attach_host<S>(config: BridgeConfig, ui_mode: S) -> &'static BridgeHost
where
    S: UiModeSource + 'static,
{
    HOST.get_or_init(|| BridgeHost::attach(config, ui_mode))
}

/// Effective configuration and the inputs rejected on the way to it
#[derive(Debug, Default)]
pub struct ResolvedConfig {
    pub config: BridgeConfig,
    /// One message per rejected input. Logging is configured from `config`,
    /// so these are reported once it is up.
    pub warnings: Vec<String>,
}

/// Pick the effective configuration.
///
/// Host-supplied TOML wins over the `selene.toml` asset, which wins over
/// the defaults. Invalid input is skipped and recorded in `warnings`.
pub fn resolve_config(host_toml: Option<&str>, asset: Option<&[u8]>) -> ResolvedConfig {
    let mut warnings = Vec::new();

    if let Some(text) = host_toml.filter(|t| !t.trim().is_empty()) {
        match BridgeConfig::from_toml_str(text) {
            Ok(config) => return ResolvedConfig { config, warnings },
            Err(e) => warnings.push(format!("Ignoring host-supplied config: {}", e)),
        }
    }

    if let Some(bytes) = asset {
        let parsed = std::str::from_utf8(bytes)
            .map_err(|e| e.to_string())
            .and_then(|text| BridgeConfig::from_toml_str(text).map_err(|e| e.to_string()));
        match parsed {
            Ok(config) => return ResolvedConfig { config, warnings },
            Err(e) => warnings.push(format!("Ignoring {}: {}", CONFIG_FILE_NAME, e)),
        }
    }

    ResolvedConfig {
        config: BridgeConfig::default(),
        warnings,
    }
}

/// Initialize Android logging
#[cfg(target_os = "android")]
pub fn init_logging(config: &LoggingConfig) {
    use std::str::FromStr;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::EnvFilter;

    // Initialize android_logger for log crate
    let max_level = log::LevelFilter::from_str(&config.level).unwrap_or(log::LevelFilter::Info);
    android_logger::init_once(
        android_logger::Config::default()
            .with_max_level(max_level)
            .with_tag(config.tag.as_str()),
    );

    // Initialize tracing-android for tracing crate
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));
    match tracing_android::layer(&config.tag) {
        Ok(layer) => {
            let subscriber = tracing_subscriber::registry().with(filter).with(layer);
            let _ = tracing::subscriber::set_global_default(subscriber);
        }
        Err(e) => log::warn!("tracing-android layer unavailable: {}", e),
    }
}

/// Attach the bridge host for a host activity
///
/// Uses the activity's application context for both the `UiModeManager`
/// query and the NDK configuration fallback.
#[cfg(target_os = "android")]
pub fn attach_activity(
    env: &mut JNIEnv,
    activity: &JObject,
    host_toml: Option<String>,
) -> Result<&'static BridgeHost> {
    use std::sync::Arc;

    use selene_bridge::FallbackUiMode;

    use crate::assets::{load_optional, AndroidAssets};
    use crate::jni_bridge::service_error;
    use crate::ui_mode::{ConfigurationUiModeSource, UiModeManagerSource};

    if let Some(existing) = host() {
        return Ok(existing);
    }

    let context = match env
        .call_method(
            activity,
            "getApplicationContext",
            "()Landroid/content/Context;",
            &[],
        )
        .and_then(|value| value.l())
    {
        Ok(context) => context,
        Err(e) => return Err(service_error(env, "Activity.getApplicationContext", e)),
    };

    let assets = Arc::new(AndroidAssets::from_context(env, &context)?);
    let (asset_config, read_error) = match load_optional(&assets, CONFIG_FILE_NAME) {
        Ok(bytes) => (bytes, None),
        Err(e) => (None, Some(format!("Failed to read {}: {}", CONFIG_FILE_NAME, e))),
    };
    let ResolvedConfig { config, warnings } =
        resolve_config(host_toml.as_deref(), asset_config.as_deref());

    init_logging(&config.logging);
    for warning in read_error.iter().chain(&warnings) {
        tracing::warn!("{}", warning);
    }
    tracing::info!("Attaching Selene bridge");

    let ui_mode = FallbackUiMode::new(
        UiModeManagerSource::new(env, &context)?,
        ConfigurationUiModeSource::new(assets),
    );
    let _ = env.delete_local_ref(context);

    let host = attach_host(config, ui_mode);
    tracing::info!("Selene bridge attached: {:?}", host);
    Ok(host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use selene_bridge::{FixedUiMode, Reply, UiModeType};

    #[test]
    fn test_resolve_config_defaults() {
        for host_toml in [None, Some("   ")] {
            let resolved = resolve_config(host_toml, None);
            assert_eq!(resolved.config, BridgeConfig::default());
            assert!(resolved.warnings.is_empty());
        }
    }

    #[test]
    fn test_host_config_wins_over_asset() {
        let resolved = resolve_config(
            Some("[logging]\ntag = \"FromHost\"\n"),
            Some(b"[logging]\ntag = \"FromAsset\"\n"),
        );
        assert_eq!(resolved.config.logging.tag, "FromHost");
        assert!(resolved.warnings.is_empty());
    }

    #[test]
    fn test_asset_config_used_when_host_config_invalid() {
        let resolved = resolve_config(
            Some("[logging"),
            Some(b"[device]\nchannel = \"selene/device\"\n[logging]\nlevel = \"debug\"\n"),
        );
        assert_eq!(resolved.config.logging.level, "debug");
        assert_eq!(resolved.warnings.len(), 1);
        assert!(resolved.warnings[0].starts_with("Ignoring host-supplied config"));
    }

    #[test]
    fn test_invalid_asset_falls_back_to_defaults() {
        let resolved = resolve_config(None, Some(&[0xff, 0xfe, 0x00]));
        assert_eq!(resolved.config, BridgeConfig::default());
        assert_eq!(resolved.warnings.len(), 1);

        let resolved = resolve_config(None, Some(b"[device]\nchannel = \"\"\n"));
        assert_eq!(resolved.config, BridgeConfig::default());
        assert!(resolved.warnings[0].starts_with("Ignoring selene.toml"));
    }

    #[test]
    fn test_every_rejected_input_is_reported() {
        let resolved = resolve_config(Some("[device]\ncodec = 3\n"), Some(b"[logging"));

        assert_eq!(resolved.config, BridgeConfig::default());
        assert_eq!(resolved.warnings.len(), 2);
        assert!(resolved.warnings[0].contains("host-supplied"));
        assert!(resolved.warnings[1].contains(CONFIG_FILE_NAME));
    }

    #[test]
    fn test_attach_host_first_call_wins() {
        let first = attach_host(BridgeConfig::default(), FixedUiMode(UiModeType::Television));
        let second = attach_host(BridgeConfig::default(), FixedUiMode(UiModeType::Normal));

        assert!(std::ptr::eq(first, second));
        assert!(std::ptr::eq(host().unwrap(), first));
        assert_eq!(
            second.device_channel().invoke_method("isAndroidTv", None).unwrap(),
            Reply::Success(serde_json::json!(true))
        );
    }
}
