use chrono::Utc;
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};

use crate::state::AppState;

/// Background ticker driving both sweeps. A slow sweep delays the next tick instead of
/// overlapping it. Returns once `shutdown` flips to `true`.
pub async fn run_dispatcher(state: AppState, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = interval(state.config.dispatcher.tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tracing::info!(
        tick_secs = state.config.dispatcher.tick.as_secs(),
        "dispatcher started"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => sweep(&state).await,
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    tracing::info!("dispatcher stopped");
}

// Each use case logs its own report.
async fn sweep(state: &AppState) {
    let now = Utc::now();
    if let Err(e) = state.dispatch_usecase().execute(now).await {
        tracing::error!(error = %e, "dispatch sweep failed");
    }
    if let Err(e) = state.reminder_usecase().execute(now).await {
        tracing::error!(error = %e, "reminder sweep failed");
    }
}
