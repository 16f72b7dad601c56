use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::info;

use crate::stats::{RelayStats, StatsSnapshot};

/// Periodic liveness report of the relay, driven by a cron expression
pub struct Heartbeat {
    inner: JobScheduler,
}

impl Heartbeat {
    /// Schedule the report and start ticking.
    pub async fn start(cron_expr: &str, stats: Arc<RelayStats>) -> Result<Self> {
        let inner = JobScheduler::new()
            .await
            .context("Failed to create job scheduler")?;

        let job = Job::new_async(cron_expr, move |_uuid, _lock| {
            let stats = stats.clone();
            Box::pin(async move {
                info!("{}", report(&stats.snapshot(Utc::now())));
            })
        })
        .with_context(|| format!("Invalid heartbeat cron: {}", cron_expr))?;

        inner
            .add(job)
            .await
            .context("Failed to add heartbeat job")?;
        inner
            .start()
            .await
            .context("Failed to start scheduler")?;

        info!("Heartbeat scheduled with cron: {}", cron_expr);
        Ok(Self { inner })
    }

    pub async fn stop(mut self) -> Result<()> {
        self.inner
            .shutdown()
            .await
            .context("Failed to shutdown scheduler")?;
        info!("Heartbeat stopped");
        Ok(())
    }
}

fn report(snapshot: &StatsSnapshot) -> String {
    let last = match snapshot.last_relay {
        Some(at) => format!("last relay {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
        None => "no relay yet".to_string(),
    };
    format!(
        "Heartbeat: relay is alive, up {}, {} message(s) recorded, {}",
        format_uptime(snapshot.uptime),
        snapshot.recorded,
        last
    )
}

fn format_uptime(uptime: chrono::Duration) -> String {
    let total = uptime.num_seconds().max(0);
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(Duration::seconds(59)), "0m");
        assert_eq!(format_uptime(Duration::minutes(61)), "1h 1m");
        assert_eq!(
            format_uptime(Duration::days(2) + Duration::hours(3) + Duration::minutes(4)),
            "2d 3h 4m"
        );
        // Clock skew
        assert_eq!(format_uptime(Duration::seconds(-30)), "0m");
    }

    #[test]
    fn test_report_before_first_relay() {
        let snapshot = StatsSnapshot {
            uptime: Duration::minutes(90),
            recorded: 0,
            last_relay: None,
        };

        assert_eq!(
            report(&snapshot),
            "Heartbeat: relay is alive, up 1h 30m, 0 message(s) recorded, no relay yet"
        );
    }

    #[test]
    fn test_report_after_relay() {
        let stats = RelayStats::new(Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap());
        stats.set_recorded(4);
        stats.mark_relayed(Utc.with_ymd_and_hms(2026, 3, 1, 9, 15, 0).unwrap());

        let line = report(&stats.snapshot(Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap()));

        assert_eq!(
            line,
            "Heartbeat: relay is alive, up 1d 2h 0m, 4 message(s) recorded, last relay 2026-03-01 09:15:00 UTC"
        );
    }

    #[tokio::test]
    async fn test_rejects_invalid_cron() {
        let stats = Arc::new(RelayStats::new(Utc::now()));
        assert!(Heartbeat::start("not a cron", stats).await.is_err());
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let stats = Arc::new(RelayStats::new(Utc::now()));
        let heartbeat = Heartbeat::start("0 0 * * * *", stats).await.unwrap();
        heartbeat.stop().await.unwrap();
    }
}
