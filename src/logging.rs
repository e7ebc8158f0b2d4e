//! Logging and tracing infrastructure for autosign.
//!
//! The library lives inside someone else's process, so the filter comes from
//! `AUTOSIGN_LOG` rather than `RUST_LOG`, output goes to stderr, and an already
//! installed global subscriber is left untouched.

use std::sync::Once;
#[allow(unused_imports)]
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the `EnvFilter` directives.
pub const LOG_ENV: &str = "AUTOSIGN_LOG";

/// Directive used when `AUTOSIGN_LOG` is unset or invalid.
pub const DEFAULT_DIRECTIVE: &str = "warn";

static INIT: Once = Once::new();

/// Initialize the global tracing subscriber.
///
/// Safe to call from the load-time constructor and from tests; only the first
/// call has any effect.
pub fn init_tracing() {
    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true);

        if tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .is_ok()
        {
            debug!("autosign tracing initialized");
        }
    });
}
