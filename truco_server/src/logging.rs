//! Structured logging setup.
//!
//! The engine crate logs through `log`; those records are bridged into the
//! same `tracing` subscriber so one `RUST_LOG` filter governs both.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info,hyper=warn";

/// Initialize the global subscriber.
///
/// # Example
///
/// ```no_run
/// use truco_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true);

    // A second init (tests, embedding) keeps the first subscriber.
    if tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .is_ok()
    {
        tracing::info!("Structured logging initialized");
    }
}

/// Log a rejected client request with its connection context.
pub fn log_rejected(player_id: uuid::Uuid, room: Option<&str>, request: &str, reason: &str) {
    tracing::debug!(
        player_id = %player_id,
        room = room,
        request = request,
        reason = reason,
        "request rejected"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_does_not_panic() {
        init();
        init();
    }

    #[test]
    fn test_log_rejected() {
        log_rejected(uuid::Uuid::new_v4(), Some("ABC123"), "play card 2", "not your turn");
        log_rejected(uuid::Uuid::new_v4(), None, "start the game", "not in a room");
    }
}
