use procfs::process::{all_processes, Process as ProcfsProcess};
use procfs::{Current, CurrentSI, KernelStats, Meminfo, ProcResult, Uptime};

use super::counters::{CpuTicks, MemoryInfo, RawStat};

/// Read-only access to the kernel counters the dashboard is built from.
///
/// Every read is independent: an implementation keeps no state between calls,
/// so a reader that fails for one pid has no effect on the next one.
pub trait ProcSource {
    /// Identifiers of every process currently listed by the kernel.
    fn pids(&self) -> ProcResult<Vec<u32>>;

    fn process_stat(&self, pid: u32) -> ProcResult<RawStat>;

    /// Resident set size in pages.
    fn resident_pages(&self, pid: u32) -> ProcResult<u64>;

    /// Seconds since boot.
    fn uptime_secs(&self) -> ProcResult<f64>;

    fn ticks_per_second(&self) -> u64;

    fn page_size(&self) -> u64;

    fn memory(&self) -> ProcResult<MemoryInfo>;

    fn cpu_ticks(&self) -> ProcResult<CpuTicks>;
}

/// `ProcSource` backed by the live /proc filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcfsSource;

impl ProcSource for ProcfsSource {
    fn pids(&self) -> ProcResult<Vec<u32>> {
        let pids = all_processes()?
            .filter_map(|p| p.ok()) //A process may vanish while the directory is being listed
            .map(|p| p.pid as u32)
            .collect();
        Ok(pids)
    }

    fn process_stat(&self, pid: u32) -> ProcResult<RawStat> {
        let stat = ProcfsProcess::new(pid as i32)?.stat()?;
        //procfs already strips the parentheses around comm
        Ok(RawStat {
            comm: stat.comm,
            utime: stat.utime,
            stime: stat.stime,
            starttime: stat.starttime,
        })
    }

    fn resident_pages(&self, pid: u32) -> ProcResult<u64> {
        Ok(ProcfsProcess::new(pid as i32)?.statm()?.resident)
    }

    fn uptime_secs(&self) -> ProcResult<f64> {
        Ok(Uptime::current()?.uptime)
    }

    fn ticks_per_second(&self) -> u64 {
        procfs::ticks_per_second()
    }

    fn page_size(&self) -> u64 {
        procfs::page_size()
    }

    fn memory(&self) -> ProcResult<MemoryInfo> {
        let meminfo = Meminfo::current()?;
        Ok(memory_info(meminfo.mem_total, meminfo.mem_free, meminfo.mem_available))
    }

    fn cpu_ticks(&self) -> ProcResult<CpuTicks> {
        let total = KernelStats::current()?.total;
        Ok(CpuTicks {
            user: total.user,
            nice: total.nice,
            system: total.system,
            idle: total.idle,
            iowait: total.iowait.unwrap_or(0),
            irq: total.irq.unwrap_or(0),
            softirq: total.softirq.unwrap_or(0),
            steal: total.steal.unwrap_or(0),
        })
    }
}

/// Meminfo byte counts to kB. Kernels older than 3.14 have no MemAvailable,
/// so MemFree stands in for it.
fn memory_info(total: u64, free: u64, available: Option<u64>) -> MemoryInfo {
    MemoryInfo {
        total_kb: total / 1024,
        available_kb: available.unwrap_or(free) / 1024,
    }
}
