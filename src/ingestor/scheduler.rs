use chrono::Utc;
use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use tokio::time::Duration;
use tracing::{error, info, warn};

use crate::errors::{AppError, AppResult};
use crate::ingestor::ChannelIngestor;

/// Runs refresh cycles on a fixed cron schedule.
pub struct RefreshScheduler {
    ingestor: Arc<ChannelIngestor>,
    schedule: Schedule,
}

impl RefreshScheduler {
    pub fn new(ingestor: Arc<ChannelIngestor>, cron_expression: &str) -> AppResult<Self> {
        let schedule = Schedule::from_str(cron_expression).map_err(|e| {
            AppError::configuration(format!("invalid cron expression '{cron_expression}': {e}"))
        })?;

        Ok(Self { ingestor, schedule })
    }

    /// Sleep until each upcoming occurrence and run a refresh cycle there.
    /// A failed cycle is logged and the loop keeps going.
    pub async fn start(self) {
        loop {
            let Some(next_time) = self.schedule.upcoming(Utc).next() else {
                warn!("Refresh schedule has no upcoming occurrences, scheduler exiting");
                return;
            };

            info!(
                "Next scheduled refresh: {}",
                next_time.format("%Y-%m-%d %H:%M:%S UTC")
            );

            let wait = next_time
                .signed_duration_since(Utc::now())
                .to_std()
                .unwrap_or(Duration::ZERO);
            tokio::time::sleep(wait).await;

            match self.ingestor.refresh().await {
                Ok((channel_count, _)) => {
                    info!("Scheduled refresh completed with {} channels", channel_count);
                }
                Err(e) => error!("Scheduled refresh failed: {}", e),
            }
        }
    }
}
