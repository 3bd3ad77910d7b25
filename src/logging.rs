use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is not set, picked by how many `-v` flags were given.
pub fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "seventv_copy=warn",
        1 => "seventv_copy=info",
        2 => "seventv_copy=debug",
        _ => "seventv_copy=trace,reqwest=debug",
    }
}

/// Log to stderr so prompts and progress on stdout stay readable.
pub fn init_logging(verbosity: u8) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(verbosity > 1))
        .init();
}
