use tracing_subscriber::{fmt, EnvFilter};

use crate::{config::Mode, errors::Error, Result};

/// Initialize logging/tracing for the bot.
///
/// `RUST_LOG` overrides the defaults: `info` everywhere, `debug` for our crates in dev mode.
pub fn init(service_name: &str, mode: Mode) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(service_name, mode)));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(mode == Mode::Dev)
        .try_init()
        .map_err(|e| Error::Config(format!("logging init failed: {e}")))
}

fn default_directives(service_name: &str, mode: Mode) -> String {
    let ours = match mode {
        Mode::Dev => "debug",
        Mode::Prod => "info",
    };
    let service = service_name.replace('-', "_");
    format!("info,wishbot_core={ours},wishbot_telegram={ours},{service}={ours}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_mode_raises_our_crates_to_debug() {
        assert_eq!(
            default_directives("wishbot", Mode::Dev),
            "info,wishbot_core=debug,wishbot_telegram=debug,wishbot=debug"
        );
        assert!(default_directives("wishbot", Mode::Prod).ends_with("wishbot=info"));
    }
}
