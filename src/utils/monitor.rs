//! Phase lines for an ETL run: import throughput always, process CPU and
//! resident memory when `--monitor` is on.

use crate::domain::model::ImportSummary;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessSample {
    pub cpu_usage: f32,
    pub rss_mb: u64,
    pub peak_rss_mb: u64,
}

pub struct SystemMonitor {
    sampler: Option<ProcessSampler>,
    started: Instant,
    peak_rss_mb: AtomicU64,
}

impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        Self {
            sampler: if enabled { ProcessSampler::new() } else { None },
            started: Instant::now(),
            peak_rss_mb: AtomicU64::new(0),
        }
    }

    /// `None` when monitoring is off or the process cannot be inspected.
    pub fn sample(&self) -> Option<ProcessSample> {
        let (cpu_usage, rss_mb) = self.sampler.as_ref()?.read()?;
        let previous_peak = self.peak_rss_mb.fetch_max(rss_mb, Ordering::Relaxed);
        Some(ProcessSample {
            cpu_usage,
            rss_mb,
            peak_rss_mb: previous_peak.max(rss_mb),
        })
    }

    pub fn log_phase(&self, phase: &str) {
        if let Some(sample) = self.sample() {
            tracing::info!(
                "{} - {}, elapsed {:?}",
                phase,
                describe_sample(&sample),
                self.started.elapsed()
            );
        }
    }

    /// Logged after every import, with process figures appended when enabled.
    pub fn log_import(&self, summary: &ImportSummary, elapsed: Duration) {
        let line = describe_import(summary, elapsed);
        match self.sample() {
            Some(sample) => tracing::info!("Import - {}; {}", line, describe_sample(&sample)),
            None => tracing::info!("Import - {}", line),
        }
    }

    pub fn log_final(&self) {
        if self.sampler.is_some() {
            tracing::info!(
                "Run finished in {:?}, peak RSS {}MB",
                self.started.elapsed(),
                self.peak_rss_mb.load(Ordering::Relaxed)
            );
        }
    }
}

impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Zero when no measurable time has passed.
pub fn records_per_second(records: usize, elapsed: Duration) -> f64 {
    let seconds = elapsed.as_secs_f64();
    if seconds > 0.0 {
        records as f64 / seconds
    } else {
        0.0
    }
}

fn describe_import(summary: &ImportSummary, elapsed: Duration) -> String {
    format!(
        "{} records in {:.2}s ({:.0} records/s); {} states, {} countries, {} cities staged in {} batches, {} cities promoted",
        summary.records_read,
        elapsed.as_secs_f64(),
        records_per_second(summary.records_read, elapsed),
        summary.states_written,
        summary.countries_written,
        summary.cities_staged,
        summary.batches_flushed,
        summary.cities_promoted
    )
}

fn describe_sample(sample: &ProcessSample) -> String {
    format!(
        "CPU {:.1}%, RSS {}MB (peak {}MB)",
        sample.cpu_usage, sample.rss_mb, sample.peak_rss_mb
    )
}

#[cfg(feature = "cli")]
struct ProcessSampler {
    system: std::sync::Mutex<sysinfo::System>,
    pid: sysinfo::Pid,
}

#[cfg(feature = "cli")]
impl ProcessSampler {
    fn new() -> Option<Self> {
        match sysinfo::get_current_pid() {
            Ok(pid) => Some(Self {
                system: std::sync::Mutex::new(sysinfo::System::new()),
                pid,
            }),
            Err(e) => {
                tracing::warn!("System monitoring unavailable: {}", e);
                None
            }
        }
    }

    /// CPU percent and resident memory in MB of this process only.
    fn read(&self) -> Option<(f32, u64)> {
        let mut system = self.system.lock().ok()?;
        system.refresh_processes(sysinfo::ProcessesToUpdate::Some(&[self.pid]), true);
        let process = system.process(self.pid)?;
        Some((process.cpu_usage(), process.memory() / 1024 / 1024))
    }
}

#[cfg(not(feature = "cli"))]
struct ProcessSampler;

#[cfg(not(feature = "cli"))]
impl ProcessSampler {
    fn new() -> Option<Self> {
        tracing::warn!("System monitoring needs the `cli` feature");
        None
    }

    fn read(&self) -> Option<(f32, u64)> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> ImportSummary {
        ImportSummary {
            records_read: 30_000,
            states_written: 12,
            countries_written: 2,
            cities_staged: 30_000,
            batches_flushed: 5,
            cities_promoted: 29_998,
        }
    }

    #[test]
    fn test_records_per_second() {
        assert_eq!(records_per_second(30_000, Duration::from_secs(3)), 10_000.0);
        assert_eq!(records_per_second(5, Duration::ZERO), 0.0);
    }

    #[test]
    fn test_import_line_carries_counts_and_throughput() {
        let line = describe_import(&summary(), Duration::from_millis(1500));
        assert_eq!(
            line,
            "30000 records in 1.50s (20000 records/s); 12 states, 2 countries, \
             30000 cities staged in 5 batches, 29998 cities promoted"
        );
    }

    #[test]
    fn test_disabled_monitor_takes_no_samples() {
        let monitor = SystemMonitor::default();
        assert!(monitor.sample().is_none());
        monitor.log_import(&summary(), Duration::from_secs(1));
        monitor.log_final();
    }

    #[test]
    fn test_sample_line_format() {
        let sample = ProcessSample {
            cpu_usage: 12.345,
            rss_mb: 40,
            peak_rss_mb: 64,
        };
        assert_eq!(describe_sample(&sample), "CPU 12.3%, RSS 40MB (peak 64MB)");
    }
}
