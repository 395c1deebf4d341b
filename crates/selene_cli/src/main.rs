//! Selene CLI - exercise the native bridge without a device
//!
//! Attaches a bridge host in-process over a simulated UI mode and sends it
//! the same encoded method calls the application layer would.
//!
//! ```bash
//! selene invoke isAndroidTv --ui-mode television
//! selene methods
//! selene config --config android/app/src/main/assets/selene.toml
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;

use selene_bridge::{BridgeConfig, BridgeHost, FixedUiMode, Invocation, Reply, UiModeType};

/// Drive Selene host capability channels against a simulated device
#[derive(Parser, Debug)]
#[command(name = "selene")]
#[command(about = "Drive Selene host capability channels against a simulated device")]
#[command(version)]
struct Cli {
    /// Configuration file (selene.toml) or directory containing one
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, overridden by RUST_LOG
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send one method call and print the reply
    Invoke {
        /// Method name, e.g. isAndroidTv
        method: String,

        /// Arguments as a JSON value
        #[arg(long)]
        args: Option<String>,

        /// Simulated device UI mode (normal, television, tv, car, desk, ...)
        #[arg(long, default_value = "normal")]
        ui_mode: UiModeType,

        /// Channel to send on (defaults to the configured device channel)
        #[arg(long)]
        channel: Option<String>,
    },
    /// List the device channel and the methods it recognizes
    Methods,
    /// Print the effective configuration
    Config,
}

fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<BridgeConfig> {
    match path {
        Some(path) => BridgeConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(BridgeConfig::default()),
    }
}

/// JSON shape printed for a reply
fn reply_to_json(reply: &Reply) -> Value {
    match reply {
        Reply::Success(value) => json!({ "success": value }),
        Reply::Error {
            code,
            message,
            details,
        } => json!({
            "error": {
                "code": code,
                "message": message,
                "details": details,
            }
        }),
        Reply::NotImplemented => json!({ "notImplemented": true }),
    }
}

fn invoke(
    config: BridgeConfig,
    method: &str,
    args: Option<&str>,
    ui_mode: UiModeType,
    channel: Option<&str>,
) -> Result<Reply> {
    let arguments = args
        .map(serde_json::from_str::<Value>)
        .transpose()
        .context("--args is not valid JSON")?;

    let channel = channel
        .map(str::to_string)
        .unwrap_or_else(|| config.device.channel.clone());
    let codec = config.device.codec.codec();
    let host = BridgeHost::attach(config, FixedUiMode(ui_mode));

    let call = match arguments {
        Some(args) => Invocation::with_arguments(method, args),
        None => Invocation::new(method),
    };
    let message = codec.encode_method_call(&call)?;

    tracing::info!(
        channel = %channel,
        method,
        ui_mode = %ui_mode,
        codec = %host.config().device.codec,
        "sending method call"
    );
    let raw = host
        .handle_message(&channel, &message)
        .with_context(|| format!("No reply on channel '{}'", channel))?;
    Ok(codec.decode_reply(raw.as_deref())?)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Invoke {
            method,
            args,
            ui_mode,
            channel,
        } => {
            let reply = invoke(config, &method, args.as_deref(), ui_mode, channel.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&reply_to_json(&reply))?);
        }
        Command::Methods => {
            let host = BridgeHost::attach(config, FixedUiMode(UiModeType::Normal));
            println!("{} ({})", host.device_channel().name(), host.config().device.codec);
            for method in host.device_methods() {
                println!("  {}", method.name());
            }
        }
        Command::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use selene_bridge::CodecKind;

    #[test]
    fn test_cli_parses_invoke() {
        let cli = Cli::try_parse_from(["selene", "invoke", "isAndroidTv", "--ui-mode", "tv"]).unwrap();

        match cli.command {
            Command::Invoke {
                method, ui_mode, ..
            } => {
                assert_eq!(method, "isAndroidTv");
                assert_eq!(ui_mode, UiModeType::Television);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["selene", "invoke", "isAndroidTv", "--ui-mode", "phone"]).is_err());
    }

    #[test]
    fn test_invoke_television() {
        let reply = invoke(
            BridgeConfig::default(),
            "isAndroidTv",
            None,
            UiModeType::Television,
            None,
        )
        .unwrap();

        assert_eq!(reply_to_json(&reply), json!({ "success": true }));
    }

    #[test]
    fn test_invoke_unknown_method() {
        let reply = invoke(
            BridgeConfig::default(),
            "unknownMethod",
            Some(r#"{"x": 1}"#),
            UiModeType::Television,
            None,
        )
        .unwrap();

        assert_eq!(reply_to_json(&reply), json!({ "notImplemented": true }));
    }

    #[test]
    fn test_invoke_unregistered_channel() {
        let reply = invoke(
            BridgeConfig::default(),
            "isAndroidTv",
            None,
            UiModeType::Television,
            Some("selene/battery"),
        )
        .unwrap();

        assert_eq!(reply, Reply::NotImplemented);
    }

    #[test]
    fn test_invoke_over_json_codec() {
        let mut config = BridgeConfig::default();
        config.device.codec = CodecKind::Json;

        let reply = invoke(config, "isAndroidTv", None, UiModeType::Desk, None).unwrap();

        assert_eq!(reply_to_json(&reply), json!({ "success": false }));
    }

    #[test]
    fn test_invoke_bad_args() {
        let err = invoke(
            BridgeConfig::default(),
            "isAndroidTv",
            Some("{not json"),
            UiModeType::Normal,
            None,
        )
        .unwrap_err();

        assert!(err.to_string().contains("--args"));
    }

    #[test]
    fn test_error_reply_json() {
        let reply = Reply::error("ui_mode_unavailable", Some("gone".to_string()), None);

        assert_eq!(
            reply_to_json(&reply),
            json!({
                "error": { "code": "ui_mode_unavailable", "message": "gone", "details": null }
            })
        );
    }
}
