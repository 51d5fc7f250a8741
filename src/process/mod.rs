use std::fmt;

pub mod counters;
pub mod sampler;
pub mod source;

pub use sampler::MetricsSampler;
pub use source::{ProcSource, ProcfsSource};

// Main Process Data Structure

/// One derived sample of a single process, taken during a refresh.
///
/// A sample is either fully populated or vacant: a vacant sample carries only
/// the pid and means the process could not be read (it exited in between).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessSample {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f64,
    pub mem_percent: f64,
    pub elapsed_secs: u64,
}

impl ProcessSample {
    pub fn vacant(pid: u32) -> Self {
        ProcessSample {
            pid,
            ..Default::default()
        }
    }

    pub fn is_vacant(&self) -> bool {
        self.name.is_empty()
    }
}

impl fmt::Display for ProcessSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\tCPU:{}%\tMEM:{}%\tTIME:{}s",
            self.pid,
            self.name,
            self.cpu_percent.max(0.0),
            self.mem_percent.max(0.0),
            self.elapsed_secs
        )
    }
}
