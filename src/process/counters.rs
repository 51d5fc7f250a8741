/// Raw fields taken from /proc/[pid]/stat.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawStat {
    pub comm: String,
    pub utime: u64,     // user-mode ticks
    pub stime: u64,     // kernel-mode ticks
    pub starttime: u64, // ticks after boot
}

impl RawStat {
    pub fn total_ticks(&self) -> u64 {
        self.utime + self.stime
    }
}

/// Aggregate tick buckets from the first line of /proc/stat.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CpuTicks {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuTicks {
    /// Idle time including time spent waiting on I/O.
    pub fn idle_all(&self) -> u64 {
        self.idle + self.iowait
    }

    pub fn total(&self) -> u64 {
        self.idle_all() + self.user + self.nice + self.system + self.irq + self.softirq + self.steal
    }
}

/// Memory totals in kB, as /proc/meminfo reports them.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemoryInfo {
    pub total_kb: u64,
    pub available_kb: u64,
}
