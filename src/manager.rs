use std::cmp::Ordering;
use std::collections::HashSet;

use log::{debug, trace, warn};

use crate::process::{MetricsSampler, ProcSource, ProcessSample};

pub mod monitoring;
pub mod operations;

/// The three orderings the process table can be shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    ByPid,
    ByCpu,
    ByMem,
}

impl SortMode {
    pub fn label(self) -> &'static str {
        match self {
            SortMode::ByPid => "PID",
            SortMode::ByCpu => "CPU",
            SortMode::ByMem => "MEM",
        }
    }
}

/// Ascending pid.
pub fn sort_by_pid(samples: &mut [ProcessSample]) {
    samples.sort_by_key(|p| p.pid);
}

/// Descending cpu%. Stable: equal entries keep their relative order.
pub fn sort_by_cpu(samples: &mut [ProcessSample]) {
    samples.sort_by(|a, b| b.cpu_percent.partial_cmp(&a.cpu_percent).unwrap_or(Ordering::Equal));
}

/// Descending mem%. Stable, like `sort_by_cpu`.
pub fn sort_by_mem(samples: &mut [ProcessSample]) {
    samples.sort_by(|a, b| b.mem_percent.partial_cmp(&a.mem_percent).unwrap_or(Ordering::Equal));
}

pub fn sort_samples(samples: &mut [ProcessSample], mode: SortMode) {
    match mode {
        SortMode::ByPid => sort_by_pid(samples),
        SortMode::ByCpu => sort_by_cpu(samples),
        SortMode::ByMem => sort_by_mem(samples),
    }
}

type Subscriber = Box<dyn FnMut()>;

//Holds the latest process snapshot and tells subscribers when it is replaced
pub struct SnapshotStore<S> {
    sampler: MetricsSampler<S>,
    processes: Vec<ProcessSample>,
    subscribers: Vec<Subscriber>,
}

impl<S: ProcSource> SnapshotStore<S> {
    pub fn new(source: S) -> Self {
        SnapshotStore {
            sampler: MetricsSampler::new(source),
            processes: Vec::new(),
            subscribers: Vec::new(),
        }
    }

    /// Re-enumerate and re-sample every process, replace the snapshot
    /// wholesale, then notify subscribers.
    pub fn refresh(&mut self) {
        let pids = match self.sampler.source().pids() {
            Ok(pids) => pids,
            Err(e) => {
                warn!("Failed to read process list: {}", e);
                Vec::new()
            }
        };

        let mut new_processes = Vec::with_capacity(pids.len());
        for pid in pids {
            let sample = self.sampler.sample(pid);
            //A vacant sample means the process exited after being listed
            if !sample.is_vacant() {
                trace!("{}", sample);
                new_processes.push(sample);
            }
        }

        let live: HashSet<u32> = new_processes.iter().map(|p| p.pid).collect();
        self.sampler.retain(&live);

        debug!("Refreshed snapshot: {} processes", new_processes.len());
        self.processes = new_processes;

        for subscriber in self.subscribers.iter_mut() {
            subscriber();
        }
    }

    pub fn subscribe(&mut self, observer: impl FnMut() + 'static) {
        self.subscribers.push(Box::new(observer));
    }

    pub fn snapshot(&self) -> &[ProcessSample] {
        &self.processes
    }

    pub fn sort_by_pid(&mut self) {
        sort_by_pid(&mut self.processes);
    }

    pub fn sort_by_cpu(&mut self) {
        sort_by_cpu(&mut self.processes);
    }

    pub fn sort_by_mem(&mut self) {
        sort_by_mem(&mut self.processes);
    }

    pub fn sort(&mut self, mode: SortMode) {
        match mode {
            SortMode::ByPid => self.sort_by_pid(),
            SortMode::ByCpu => self.sort_by_cpu(),
            SortMode::ByMem => self.sort_by_mem(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSource;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn sample(pid: u32, cpu: f64, mem: f64) -> ProcessSample {
        ProcessSample {
            pid,
            name: format!("p{}", pid),
            cpu_percent: cpu,
            mem_percent: mem,
            elapsed_secs: 1,
        }
    }

    fn pids(samples: &[ProcessSample]) -> Vec<u32> {
        samples.iter().map(|p| p.pid).collect()
    }

    #[test]
    fn cpu_sort_is_descending_and_stable() {
        let mut samples = vec![
            sample(1, 5.0, 0.0),
            sample(2, 50.0, 0.0),
            sample(3, 5.0, 0.0),
            sample(4, 50.0, 0.0),
            sample(5, 0.0, 0.0),
        ];
        sort_by_cpu(&mut samples);

        assert_eq!(pids(&samples), vec![2, 4, 1, 3, 5]);
        assert!(samples.windows(2).all(|w| w[0].cpu_percent >= w[1].cpu_percent));
    }

    #[test]
    fn mem_sort_is_descending_and_stable() {
        let mut samples = vec![sample(8, 0.0, 1.0), sample(3, 0.0, 9.0), sample(5, 0.0, 1.0)];
        sort_by_mem(&mut samples);
        assert_eq!(pids(&samples), vec![3, 8, 5]);
    }

    #[test]
    fn pid_sort_is_ascending() {
        let mut samples = vec![sample(30, 0.0, 0.0), sample(2, 0.0, 0.0), sample(17, 0.0, 0.0)];
        sort_by_pid(&mut samples);
        assert_eq!(pids(&samples), vec![2, 17, 30]);
    }

    #[test]
    fn refresh_replaces_snapshot_and_notifies() {
        let source = FakeSource::new();
        source.set_uptime(10.0);
        source.add_process(1, "init", 10, 0);
        source.add_process(2, "sh", 20, 0);
        let mut store = SnapshotStore::new(source.clone());

        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        store.subscribe(move || seen.set(seen.get() + 1));

        store.refresh();
        assert_eq!(calls.get(), 1);
        assert_eq!(pids(store.snapshot()), vec![1, 2]);

        source.remove_process(1);
        source.add_process(3, "vim", 5, 0);
        store.refresh();
        assert_eq!(calls.get(), 2);
        assert_eq!(pids(store.snapshot()), vec![2, 3]);
    }

    #[test]
    fn subscribers_run_in_registration_order() {
        let source = FakeSource::new();
        source.set_uptime(10.0);
        source.add_process(1, "init", 10, 0);
        let mut store = SnapshotStore::new(source.clone());

        let calls = Rc::new(RefCell::new(Vec::new()));
        for name in ["first", "second"] {
            let calls = Rc::clone(&calls);
            store.subscribe(move || calls.borrow_mut().push(name));
        }

        store.refresh();
        assert_eq!(*calls.borrow(), vec!["first", "second"]);
        assert_eq!(pids(store.snapshot()), vec![1]);

        source.add_process(2, "sh", 10, 0);
        store.refresh();
        assert_eq!(*calls.borrow(), vec!["first", "second", "first", "second"]);
        assert_eq!(pids(store.snapshot()), vec![1, 2]);
    }

    #[test]
    fn refresh_drops_processes_that_vanished() {
        let source = FakeSource::new();
        source.set_uptime(10.0);
        source.add_process(1, "init", 10, 0);
        source.add_process(2, "gone", 10, 0);
        source.vanish(2);
        let mut store = SnapshotStore::new(source);

        store.refresh();
        assert_eq!(pids(store.snapshot()), vec![1]);
    }

    #[test]
    fn failed_listing_publishes_empty_snapshot() {
        let source = FakeSource::new();
        source.set_uptime(10.0);
        source.add_process(1, "init", 10, 0);
        let mut store = SnapshotStore::new(source.clone());
        store.refresh();
        assert_eq!(store.snapshot().len(), 1);

        source.set_listing_fails(true);
        store.refresh();
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn store_sorts_in_place() {
        let source = FakeSource::new();
        source.set_uptime(10.0);
        source.add_process(1, "a", 100, 0);
        source.add_process(2, "b", 900, 0);
        source.add_process(3, "c", 500, 0);
        let mut store = SnapshotStore::new(source);
        store.refresh();

        store.sort_by_cpu();
        assert_eq!(pids(store.snapshot()), vec![2, 3, 1]);
        store.sort_by_pid();
        assert_eq!(pids(store.snapshot()), vec![1, 2, 3]);
        store.sort(SortMode::ByCpu);
        assert_eq!(pids(store.snapshot()), vec![2, 3, 1]);
    }

    #[test]
    fn cpu_rate_uses_previous_refresh() {
        let source = FakeSource::new();
        source.set_uptime(10.0);
        source.add_process(1, "spin", 1000, 0);
        let mut store = SnapshotStore::new(source.clone());
        store.refresh();

        source.set_uptime(12.0);
        source.set_ticks(1, 1100);
        store.refresh();
        // 100 ticks over 2 seconds at 100 Hz
        assert!((store.snapshot()[0].cpu_percent - 50.0).abs() < 1e-9);
    }
}
