use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: OnceCell<()> = OnceCell::new();

/// Default filter for a `-v` count. `RUST_LOG` wins when set.
pub fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "employee_desk=info,warn",
        2 => "employee_desk=debug,info",
        _ => "trace",
    }
}

/// Installs the stderr subscriber once per process.
pub fn init(verbose: u8, no_color: bool) -> Result<(), String> {
    if INIT.get().is_some() {
        return Ok(());
    }

    let filter = std::env::var("RUST_LOG")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default_filter(verbose).to_string());
    let env_filter =
        EnvFilter::try_new(&filter).map_err(|e| format!("invalid log filter '{filter}': {e}"))?;

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_ansi(!no_color)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| format!("failed to install log subscriber: {e}"))?;

    let _ = INIT.set(());
    Ok(())
}
