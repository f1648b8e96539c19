//! Background maintenance
//!
//! One periodic task owned by the server: revokes sessions idle past the
//! inactivity window, purges audit entries past retention, and drops
//! expired one-time codes. Explicit start/shutdown lifecycle; shutdown
//! joins the task so nothing keeps running after the server stops.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::audit::AuditService;
use super::context::ServiceContext;

/// Counts from one maintenance pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub idle_sessions_revoked: u64,
    pub audit_entries_purged: u64,
    pub otp_records_cleared: u64,
}

/// Periodic maintenance task
pub struct Sweeper {
    ctx: Arc<ServiceContext>,
    shutdown_tx: Option<watch::Sender<bool>>,
    handle: Option<JoinHandle<()>>,
}

impl Sweeper {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self {
            ctx,
            shutdown_tx: None,
            handle: None,
        }
    }

    /// Spawn the maintenance loop. Calling `start` on a running sweeper is
    /// a no-op.
    pub fn start(&mut self) {
        if self.handle.is_some() {
            return;
        }

        let interval_secs = self.ctx.session_config().sweep_interval_seconds.max(1);
        let interval = Duration::from_secs(interval_secs);
        let (tx, mut rx) = watch::channel(false);
        let ctx = Arc::clone(&self.ctx);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; consume it so startup does
            // not race a sweep
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        run_pass(&ctx).await;
                    }
                    changed = rx.changed() => {
                        // A dropped sender also means stop
                        if changed.is_err() || *rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });

        self.shutdown_tx = Some(tx);
        self.handle = Some(handle);
        info!(interval_secs, "Sweeper started");
    }

    /// Signal the loop to stop and wait for the task to finish
    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(true);
        }
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "Sweeper task did not shut down cleanly");
            }
            info!("Sweeper stopped");
        }
    }

    /// Run one maintenance pass right now, outside the schedule
    pub async fn sweep_once(&self) -> SweepReport {
        run_pass(&self.ctx).await
    }
}

/// One pass over the three stores. A failing store skips its step; the
/// next pass retries.
async fn run_pass(ctx: &ServiceContext) -> SweepReport {
    let mut report = SweepReport::default();
    let now = Utc::now();

    let idle_cutoff =
        now - chrono::Duration::days(i64::from(ctx.session_config().idle_revoke_days));
    match ctx.sessions().revoke_idle_since(idle_cutoff).await {
        Ok(count) => report.idle_sessions_revoked = count,
        Err(e) => warn!(error = %e, "Failed to revoke idle sessions"),
    }

    match AuditService::new(ctx).purge_expired().await {
        Ok(count) => report.audit_entries_purged = count,
        Err(e) => warn!(error = %e, "Failed to purge audit entries"),
    }

    match ctx.otp_codes().clear_expired(now).await {
        Ok(count) => report.otp_records_cleared = count,
        Err(e) => warn!(error = %e, "Failed to clear expired codes"),
    }

    debug!(
        idle_sessions = report.idle_sessions_revoked,
        audit_purged = report.audit_entries_purged,
        otp_cleared = report.otp_records_cleared,
        "Maintenance pass finished"
    );
    report
}
