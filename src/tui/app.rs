use std::cell::Cell;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

use crate::manager::monitoring::AggregateSampler;
use crate::manager::operations::{SignalKind, SignalSender};
use crate::manager::{SnapshotStore, SortMode};
use crate::process::{ProcSource, ProcessSample};
use crate::tui::input::{InputSource, Key};
use crate::tui::render::{DashboardFrame, Renderer};
use crate::tui::view::{InputMode, ViewState};

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

/// What the loop should do after one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Pause for this long, then poll input again.
    Continue(Duration),
    Quit,
}

#[derive(Debug, Clone, Copy)]
pub struct Intervals {
    /// Pause after a browsing iteration, which re-samples every process.
    pub refresh: Duration,
    /// Pause after a filter-editing iteration, which only re-filters.
    pub filter: Duration,
}

impl Default for Intervals {
    fn default() -> Self {
        Self {
            refresh: Duration::from_millis(1000),
            filter: Duration::from_millis(50),
        }
    }
}

/// Main application state for the dashboard
pub struct Dashboard<S, R, G> {
    store: SnapshotStore<S>,
    aggregate: AggregateSampler<S>,
    renderer: R,
    signaller: G,
    view: ViewState,
    visible: Vec<ProcessSample>, // filtered + sorted rows last shown
    snapshot_replaced: Rc<Cell<bool>>,
    spinner: usize,
    intervals: Intervals,
}

impl<S, R, G> Dashboard<S, R, G>
where
    S: ProcSource + Clone,
    R: Renderer,
    G: SignalSender,
{
    pub fn new(source: S, renderer: R, signaller: G, intervals: Intervals) -> Self {
        let mut store = SnapshotStore::new(source.clone());
        let snapshot_replaced = Rc::new(Cell::new(false));
        let flag = Rc::clone(&snapshot_replaced);
        store.subscribe(move || flag.set(true));

        //Prime the aggregate counters so the first figure on screen is a delta
        let mut aggregate = AggregateSampler::new(source);
        aggregate.sample_cpu();

        let mut dashboard = Dashboard {
            store,
            aggregate,
            renderer,
            signaller,
            view: ViewState::default(),
            visible: Vec::new(),
            snapshot_replaced,
            spinner: 0,
            intervals,
        };
        dashboard.refresh_snapshot();
        dashboard.rebuild_visible(dashboard.renderer.page_size());
        dashboard
    }

    #[cfg(test)]
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    #[cfg(test)]
    pub fn visible(&self) -> &[ProcessSample] {
        &self.visible
    }

    /// Poll, step and sleep until the operator quits.
    pub fn run(&mut self, input: &mut impl InputSource) {
        let mut flow = self.show_initial();
        loop {
            match flow {
                Flow::Quit => {
                    info!("Quit requested");
                    return;
                }
                Flow::Continue(pause) if !pause.is_zero() => thread::sleep(pause),
                Flow::Continue(_) => {}
            }
            flow = self.step(input.poll_key());
        }
    }

    /// Draw the snapshot taken at construction. The first loop refresh then
    /// comes a full interval later, so its per-process rates span that interval.
    pub fn show_initial(&mut self) -> Flow {
        let page = self.renderer.page_size();
        self.render(page);
        Flow::Continue(self.intervals.refresh)
    }

    /// One loop iteration for the key polled (or not) at its start.
    pub fn step(&mut self, key: Option<Key>) -> Flow {
        if key == Some(Key::Interrupt) {
            return Flow::Quit;
        }
        match self.view.mode {
            InputMode::Browsing => self.browse(key),
            InputMode::FilterEditing => self.edit_filter(key),
        }
    }

    fn browse(&mut self, key: Option<Key>) -> Flow {
        let page = self.renderer.page_size();
        match key {
            Some(Key::Char('q' | 'Q')) => return Flow::Quit,
            Some(Key::Char('p' | 'P')) => self.view.set_sort(SortMode::ByPid),
            Some(Key::Char('c' | 'C')) => self.view.set_sort(SortMode::ByCpu),
            Some(Key::Char('m' | 'M')) => self.view.set_sort(SortMode::ByMem),
            Some(Key::Up) => self.view.move_up(1),
            Some(Key::Down) => self.view.move_down(1, self.visible.len()),
            Some(Key::PageUp) => self.view.move_up(page),
            Some(Key::PageDown) => self.view.move_down(page, self.visible.len()),
            Some(Key::Char('k')) => self.signal_selected(SignalKind::Terminate),
            Some(Key::Char('K')) => self.signal_selected(SignalKind::Kill),
            Some(Key::Char('/')) => {
                self.view.begin_filter();
                //Go straight to the filter prompt without sampling
                return Flow::Continue(Duration::ZERO);
            }
            _ => {}
        }

        self.refresh_snapshot();
        self.rebuild_visible(page);
        self.render(page);
        Flow::Continue(self.intervals.refresh)
    }

    fn edit_filter(&mut self, key: Option<Key>) -> Flow {
        match key {
            Some(Key::Enter) => self.view.commit_filter(),
            Some(Key::Esc) => self.view.cancel_filter(),
            Some(Key::Backspace) => {
                self.view.filter.pop();
            }
            Some(Key::Char(c)) if (' '..='~').contains(&c) => self.view.filter.push(c),
            _ => {}
        }

        //The snapshot is frozen while the filter is being typed
        let page = self.renderer.page_size();
        self.rebuild_visible(page);
        self.render(page);
        Flow::Continue(self.intervals.filter)
    }

    fn refresh_snapshot(&mut self) {
        self.store.refresh();
        if self.snapshot_replaced.replace(false) {
            self.store.sort(self.view.sort_mode);
        }
    }

    fn rebuild_visible(&mut self, page: usize) {
        self.visible = self.view.visible_rows(self.store.snapshot());
        self.view.clamp(self.visible.len(), page);
    }

    fn signal_selected(&mut self, kind: SignalKind) {
        let Some(pid) = self.visible.get(self.view.selected).map(|p| p.pid) else {
            return;
        };
        match self.signaller.send(pid, kind) {
            Ok(()) => info!("Sent {:?} to PID {}", kind, pid),
            Err(e) => warn!("{}", e),
        }
    }

    fn render(&mut self, page: usize) {
        let cpu_percent = self.aggregate.sample_cpu();
        let mem_percent = self.aggregate.sample_mem();
        let spinner = SPINNER[self.spinner];
        self.spinner = (self.spinner + 1) % SPINNER.len();

        let prompt = (self.view.mode == InputMode::FilterEditing).then_some(self.view.filter.as_str());
        debug!(
            "Render: {} visible, selected {}, offset {}",
            self.visible.len(),
            self.view.selected,
            self.view.offset
        );
        let drawn = self.renderer.draw(&DashboardFrame {
            cpu_percent,
            mem_percent,
            rows: &self.visible,
            offset: self.view.offset,
            selected: self.view.selected,
            page_size: page,
            sort_mode: self.view.sort_mode,
            filter_prompt: prompt,
            spinner,
        });
        //A lost frame is redrawn on the next iteration
        if let Err(e) = drawn {
            warn!("Failed to draw dashboard: {:#}", e);
        }
    }
}
