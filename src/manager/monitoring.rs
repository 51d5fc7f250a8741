use log::trace;

use crate::process::ProcSource;

/// System-wide CPU% and Mem%.
///
/// CPU% is the busy share of the ticks that elapsed since the previous call,
/// so the sampler keeps the last total/idle tick counts for the whole session.
/// The very first call compares against zero and therefore reports the
/// average since boot.
#[derive(Debug)]
pub struct AggregateSampler<S> {
    source: S,
    prev_total: u64,
    prev_idle: u64,
}

impl<S: ProcSource> AggregateSampler<S> {
    pub fn new(source: S) -> Self {
        AggregateSampler {
            source,
            prev_total: 0,
            prev_idle: 0,
        }
    }

    pub fn sample_cpu(&mut self) -> f64 {
        let ticks = match self.source.cpu_ticks() {
            Ok(ticks) => ticks,
            Err(e) => {
                trace!("Aggregate CPU counters unavailable: {:?}", e);
                return 0.0;
            }
        };

        let total = ticks.total();
        let idle = ticks.idle_all();
        let total_diff = total as i128 - self.prev_total as i128;
        let idle_diff = idle as i128 - self.prev_idle as i128;

        self.prev_total = total;
        self.prev_idle = idle;

        if total_diff <= 0 {
            return 0.0;
        }
        100.0 * (total_diff - idle_diff) as f64 / total_diff as f64
    }

    pub fn sample_mem(&self) -> f64 {
        let mem = match self.source.memory() {
            Ok(mem) => mem,
            Err(e) => {
                trace!("Memory counters unavailable: {:?}", e);
                return 0.0;
            }
        };

        if mem.total_kb == 0 {
            return 0.0;
        }
        let used = mem.total_kb.saturating_sub(mem.available_kb);
        100.0 * used as f64 / mem.total_kb as f64
    }
}
