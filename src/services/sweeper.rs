//! Background overdue sweep

use std::time::Duration;

use chrono::Utc;
use tracing::info;

use super::rentals::RentalsService;

/// Starts a tokio task running the overdue sweep every `interval`, so rentals
/// turn overdue even when nobody reads them.
pub fn start_overdue_sweeper(rentals: RentalsService, interval: Duration) {
    info!("[CRON] sweeping overdue rentals every {:?}", interval);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(interval);

        loop {
            interval.tick().await;

            if let Err(e) = rentals.sweep_overdue(Utc::now()).await {
                tracing::warn!("Periodic overdue sweep failed: {}", e);
            }
        }
    });
}
