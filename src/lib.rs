//! Election Lifecycle and Ballot Integrity Core
//!
//! Elections move `upcoming → active → completed`, candidates apply while an
//! election is upcoming, voters cast exactly one ballot while it is active,
//! and results are tabulated once it is completed. All records live behind
//! a [`store::RecordStore`].

pub mod auth;
pub mod config;
pub mod errors;
pub mod ledger;
pub mod lifecycle;
pub mod registry;
pub mod results;
pub mod scheduler;
pub mod service;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use errors::{Error, Result};
pub use service::ElectionService;
pub use store::{IdentityProvider, InMemoryStore, RecordStore, Session};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging from `RUST_LOG`
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "election_core=info".into()),
        )
        .try_init()
        .map_err(|e| Error::config(format!("Failed to initialise logging: {e}")))?;

    tracing::info!("🗳️  Election core v{} initialized", VERSION);
    Ok(())
}

/// Initialize logging from a [`config::LoggingConfig`]
///
/// `RUST_LOG` still wins when set.
pub fn init_with(logging: &config::LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("election_core={}", logging.level).into());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match logging.format.as_str() {
        "json" => builder.json().try_init(),
        "pretty" => builder.pretty().try_init(),
        "compact" => builder.compact().try_init(),
        other => return Err(Error::config(format!("Unknown LOG_FORMAT '{other}'"))),
    };
    installed.map_err(|e| Error::config(format!("Failed to initialise logging: {e}")))?;

    tracing::info!("🗳️  Election core v{} initialized ({} logs)", VERSION, logging.format);
    Ok(())
}
