use std::collections::{HashMap, HashSet};

use log::trace;
use procfs::ProcError;

use super::source::ProcSource;
use super::ProcessSample;

/// CPU accounting remembered from the last time a pid was sampled.
#[derive(Debug, Clone, Copy)]
struct CpuMark {
    ticks: u64,
    elapsed: f64,
}

/// Turns raw per-process counters into `ProcessSample`s.
///
/// The sampler outlives refresh cycles and remembers, per pid, the ticks and
/// elapsed time seen last. A pid seen for the first time gets its average
/// CPU% since start; every later sample gets the rate over the interval since
/// the previous one, as long as the process' elapsed time moved forward.
#[derive(Debug)]
pub struct MetricsSampler<S> {
    source: S,
    history: HashMap<u32, CpuMark>,
}

impl<S: ProcSource> MetricsSampler<S> {
    pub fn new(source: S) -> Self {
        MetricsSampler {
            source,
            history: HashMap::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Sample one process. Unreadable processes come back vacant.
    pub fn sample(&mut self, pid: u32) -> ProcessSample {
        let stat = match self.source.process_stat(pid) {
            Ok(stat) => stat,
            Err(e) => {
                //Vanishing between listing and reading is routine
                if !matches!(e, ProcError::NotFound(_)) {
                    trace!("Could not read stat for PID {}: {:?}", pid, e);
                }
                return ProcessSample::vacant(pid);
            }
        };

        let hz = self.source.ticks_per_second().max(1) as f64;
        let uptime = self.source.uptime_secs().unwrap_or(0.0);
        let elapsed = uptime - stat.starttime as f64 / hz;
        let ticks = stat.total_ticks();

        let cpu_percent = match self.history.get(&pid) {
            Some(prev) if prev.elapsed < elapsed => {
                let delta_secs = ticks.saturating_sub(prev.ticks) as f64 / hz;
                100.0 * delta_secs / (elapsed - prev.elapsed)
            }
            _ if elapsed > 0.0 => 100.0 * (ticks as f64 / hz) / elapsed,
            _ => 0.0,
        };
        self.history.insert(pid, CpuMark { ticks, elapsed });

        ProcessSample {
            pid,
            name: stat.comm,
            cpu_percent,
            mem_percent: self.mem_percent(pid),
            elapsed_secs: elapsed.max(0.0) as u64,
        }
    }

    fn mem_percent(&self, pid: u32) -> f64 {
        let resident_bytes = self.source.resident_pages(pid).unwrap_or(0) * self.source.page_size();
        let total_bytes = self
            .source
            .memory()
            .map(|m| m.total_kb * 1024)
            .unwrap_or(0);

        if total_bytes == 0 {
            return 0.0;
        }
        (100.0 * resident_bytes as f64 / total_bytes as f64).clamp(0.0, 100.0)
    }

    /// Forget pids that are no longer alive.
    pub fn retain(&mut self, live: &HashSet<u32>) {
        self.history.retain(|pid, _| live.contains(pid));
    }

    #[cfg(test)]
    pub fn tracked(&self) -> usize {
        self.history.len()
    }
}
