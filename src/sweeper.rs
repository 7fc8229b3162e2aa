use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::rate_limit::{
    LOGIN_FAILURE_WINDOW_SECS, OTP_FAILURE_WINDOW_SECS, RESET_REQUEST_WINDOW_SECS,
};
use crate::state::SharedState;

/// Periodically purge dead reset rows and stale limiter entries until shutdown.
pub fn spawn(state: SharedState, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
    let interval = Duration::from_secs(state.config.sweep_interval_secs.max(1));

    tokio::spawn(async move {
        tracing::debug!("Sweeper started");

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                changed = shutdown.changed() => {
                    // Sender gone: nobody can signal us any more.
                    if changed.is_err() {
                        break;
                    }
                }
            }

            if *shutdown.borrow() {
                break;
            }

            sweep(&state).await;
        }

        tracing::debug!("Sweeper stopped");
    })
}

pub async fn sweep(state: &SharedState) {
    let retention = chrono::Duration::hours(state.config.reset_retention_hours);
    match state.resets.purge_expired(retention).await {
        Ok(0) => {}
        Ok(count) => tracing::info!(purged = count, "Purged expired password resets"),
        Err(e) => tracing::error!("Failed to purge expired password resets: {e}"),
    }

    state
        .reset_request_limiter
        .cleanup(Duration::from_secs(RESET_REQUEST_WINDOW_SECS));
    state
        .otp_attempt_limiter
        .cleanup(Duration::from_secs(OTP_FAILURE_WINDOW_SECS));
    state
        .login_limiter
        .cleanup(Duration::from_secs(LOGIN_FAILURE_WINDOW_SECS));
}
