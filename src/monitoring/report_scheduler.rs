use crate::engine::FleetEngine;
use crate::monitoring::export::log_report;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Closes a tumbling report window every `period` of wall-clock time,
/// independently of how often telemetry arrives.
pub struct ReportScheduler {
    engine: Arc<FleetEngine>,
    period: Duration,
    origin_ms: u64,
    csv_path: Option<PathBuf>,
}

impl ReportScheduler {
    /// Windows are `[origin + (n-1)*period, origin + n*period]` for n = 1, 2, ...
    pub fn new(engine: Arc<FleetEngine>, origin_ms: u64) -> Self {
        let period = Duration::from_millis(engine.config().report.window_ms.max(1));
        Self {
            engine,
            period,
            origin_ms,
            csv_path: None,
        }
    }

    /// Also append every generated report to a CSV file.
    pub fn with_csv_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.csv_path = Some(path.into());
        self
    }

    /// Run until `shutdown` flips to true. Returns the number of reports generated.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> u64 {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; the first window closes one period later.
        ticker.tick().await;

        let window_ms = self.engine.config().report.window_ms;
        let mut windows_closed: u64 = 0;
        let mut generated: u64 = 0;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    windows_closed += 1;
                    let window_end_ms = self.origin_ms + windows_closed * window_ms;
                    match self.engine.generate_report(window_end_ms) {
                        Ok(report) => {
                            generated += 1;
                            if let Some(path) = &self.csv_path {
                                log_report(path, &report);
                            }
                        }
                        Err(e) => log::error!("[Report] Window ending {} skipped: {}", window_end_ms, e),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        log::info!("[Report] Scheduler stopping after {} reports", generated);
                        break;
                    }
                }
            }
        }
        generated
    }
}
