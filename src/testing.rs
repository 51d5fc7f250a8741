//! Scripted stand-ins for the OS, the terminal and signal delivery.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use procfs::{ProcError, ProcResult};

use crate::manager::operations::{SignalKind, SignalSender};
use crate::process::counters::{CpuTicks, MemoryInfo, RawStat};
use crate::process::ProcSource;
use crate::tui::render::{DashboardFrame, Renderer};

#[derive(Debug, Clone)]
struct FakeProcess {
    stat: Option<RawStat>, // None: listed but unreadable
    resident: u64,
}

#[derive(Debug)]
struct FakeState {
    processes: BTreeMap<u32, FakeProcess>,
    uptime: Option<f64>,
    hz: u64,
    page_size: u64,
    memory: Option<MemoryInfo>,
    cpu: Option<CpuTicks>,
    listing_fails: bool,
}

/// In-memory `ProcSource`. Clones share state so a test can keep a handle
/// while the code under test owns another.
#[derive(Debug, Clone)]
pub struct FakeSource {
    state: Rc<RefCell<FakeState>>,
}

impl FakeSource {
    pub fn new() -> Self {
        FakeSource {
            state: Rc::new(RefCell::new(FakeState {
                processes: BTreeMap::new(),
                uptime: Some(0.0),
                hz: 100,
                page_size: 4096,
                memory: Some(MemoryInfo {
                    total_kb: 8 * 1024 * 1024,
                    available_kb: 4 * 1024 * 1024,
                }),
                cpu: None,
                listing_fails: false,
            })),
        }
    }

    pub fn add_process(&self, pid: u32, name: &str, ticks: u64, starttime: u64) {
        self.state.borrow_mut().processes.insert(
            pid,
            FakeProcess {
                stat: Some(RawStat {
                    comm: name.to_string(),
                    utime: ticks,
                    stime: 0,
                    starttime,
                }),
                resident: 0,
            },
        );
    }

    /// Keep the pid in the listing but make its counters unreadable.
    pub fn vanish(&self, pid: u32) {
        if let Some(p) = self.state.borrow_mut().processes.get_mut(&pid) {
            p.stat = None;
        }
    }

    pub fn remove_process(&self, pid: u32) {
        self.state.borrow_mut().processes.remove(&pid);
    }

    pub fn set_ticks(&self, pid: u32, ticks: u64) {
        if let Some(stat) = self
            .state
            .borrow_mut()
            .processes
            .get_mut(&pid)
            .and_then(|p| p.stat.as_mut())
        {
            stat.utime = ticks;
            stat.stime = 0;
        }
    }

    pub fn set_resident(&self, pid: u32, pages: u64) {
        if let Some(p) = self.state.borrow_mut().processes.get_mut(&pid) {
            p.resident = pages;
        }
    }

    pub fn set_uptime(&self, secs: f64) {
        self.state.borrow_mut().uptime = Some(secs);
    }

    pub fn set_hz(&self, hz: u64) {
        self.state.borrow_mut().hz = hz;
    }

    pub fn set_memory(&self, total_kb: u64, available_kb: u64) {
        self.state.borrow_mut().memory = Some(MemoryInfo {
            total_kb,
            available_kb,
        });
    }

    pub fn clear_memory(&self) {
        self.state.borrow_mut().memory = None;
    }

    pub fn set_cpu_ticks(&self, idle: u64, busy: u64) {
        self.state.borrow_mut().cpu = Some(CpuTicks {
            user: busy,
            idle,
            ..Default::default()
        });
    }

    pub fn set_cpu(&self, ticks: CpuTicks) {
        self.state.borrow_mut().cpu = Some(ticks);
    }

    pub fn set_listing_fails(&self, fails: bool) {
        self.state.borrow_mut().listing_fails = fails;
    }
}

impl ProcSource for FakeSource {
    fn pids(&self) -> ProcResult<Vec<u32>> {
        let state = self.state.borrow();
        if state.listing_fails {
            return Err(ProcError::Other("listing disabled".into()));
        }
        Ok(state.processes.keys().copied().collect())
    }

    fn process_stat(&self, pid: u32) -> ProcResult<RawStat> {
        self.state
            .borrow()
            .processes
            .get(&pid)
            .and_then(|p| p.stat.clone())
            .ok_or(ProcError::NotFound(None))
    }

    fn resident_pages(&self, pid: u32) -> ProcResult<u64> {
        self.state
            .borrow()
            .processes
            .get(&pid)
            .map(|p| p.resident)
            .ok_or(ProcError::NotFound(None))
    }

    fn uptime_secs(&self) -> ProcResult<f64> {
        self.state.borrow().uptime.ok_or(ProcError::Incomplete(None))
    }

    fn ticks_per_second(&self) -> u64 {
        self.state.borrow().hz
    }

    fn page_size(&self) -> u64 {
        self.state.borrow().page_size
    }

    fn memory(&self) -> ProcResult<MemoryInfo> {
        self.state.borrow().memory.ok_or(ProcError::NotFound(None))
    }

    fn cpu_ticks(&self) -> ProcResult<CpuTicks> {
        self.state.borrow().cpu.ok_or(ProcError::NotFound(None))
    }
}

/// What a `RecordingRenderer` saw for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    pub pids: Vec<u32>,
    pub offset: usize,
    pub selected: usize,
    pub visible_count: usize,
    pub filter_prompt: Option<String>,
    pub cpu_percent: f64,
    pub mem_percent: f64,
}

/// Renderer that remembers every frame instead of drawing it.
#[derive(Debug, Clone)]
pub struct RecordingRenderer {
    pub page_size: usize,
    pub frames: Rc<RefCell<Vec<FrameRecord>>>,
    failing: Rc<Cell<bool>>,
}

impl RecordingRenderer {
    pub fn new(page_size: usize) -> Self {
        RecordingRenderer {
            page_size,
            frames: Rc::new(RefCell::new(Vec::new())),
            failing: Rc::new(Cell::new(false)),
        }
    }

    /// Make every following draw fail, as a lost terminal would.
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    pub fn last(&self) -> Option<FrameRecord> {
        self.frames.borrow().last().cloned()
    }
}

impl Renderer for RecordingRenderer {
    fn page_size(&self) -> usize {
        self.page_size
    }

    fn draw(&mut self, frame: &DashboardFrame<'_>) -> anyhow::Result<()> {
        if self.failing.get() {
            anyhow::bail!("terminal went away");
        }
        let window = frame.window();
        self.frames.borrow_mut().push(FrameRecord {
            pids: window.iter().map(|p| p.pid).collect(),
            offset: frame.offset,
            selected: frame.selected,
            visible_count: frame.rows.len(),
            filter_prompt: frame.filter_prompt.map(str::to_string),
            cpu_percent: frame.cpu_percent,
            mem_percent: frame.mem_percent,
        });
        Ok(())
    }
}

/// Signal sender that records deliveries instead of performing them.
#[derive(Debug, Clone, Default)]
pub struct RecordingSignaller {
    pub sent: Rc<RefCell<Vec<(u32, SignalKind)>>>,
}

impl SignalSender for RecordingSignaller {
    fn send(&mut self, pid: u32, kind: SignalKind) -> Result<(), String> {
        self.sent.borrow_mut().push((pid, kind));
        Ok(())
    }
}
