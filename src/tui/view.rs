use crate::manager::{sort_samples, SortMode};
use crate::process::ProcessSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Browsing,
    FilterEditing,
}

/// Everything the operator can change about what the table shows.
///
/// After every mutation `selected` lies inside the visible list (0 when it is
/// empty) and inside the window `offset..offset + page_size`, and `offset`
/// never scrolls past the last full page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub sort_mode: SortMode,
    pub filter: String,
    pub selected: usize,
    pub offset: usize,
    pub mode: InputMode,
}

impl ViewState {
    /// Keep `selected` and `offset` valid for a list of `visible` rows shown
    /// `page_size` at a time.
    pub fn clamp(&mut self, visible: usize, page_size: usize) {
        let page_size = page_size.max(1);
        self.selected = self.selected.min(visible.saturating_sub(1));

        if self.selected < self.offset {
            self.offset = self.selected;
        } else if self.selected >= self.offset + page_size {
            self.offset = self.selected + 1 - page_size;
        }
        self.offset = self.offset.min(visible.saturating_sub(page_size));
    }

    pub fn reset_position(&mut self) {
        self.selected = 0;
        self.offset = 0;
    }

    pub fn move_up(&mut self, rows: usize) {
        self.selected = self.selected.saturating_sub(rows);
    }

    pub fn move_down(&mut self, rows: usize, visible: usize) {
        self.selected = self.selected.saturating_add(rows).min(visible.saturating_sub(1));
    }

    pub fn set_sort(&mut self, mode: SortMode) {
        self.sort_mode = mode;
        self.reset_position();
    }

    pub fn begin_filter(&mut self) {
        self.mode = InputMode::FilterEditing;
        self.filter.clear();
    }

    pub fn commit_filter(&mut self) {
        self.mode = InputMode::Browsing;
        self.reset_position();
    }

    pub fn cancel_filter(&mut self) {
        self.filter.clear();
        self.mode = InputMode::Browsing;
        self.reset_position();
    }

    /// Rows to show: the filtered snapshot in the current sort order.
    pub fn visible_rows(&self, snapshot: &[ProcessSample]) -> Vec<ProcessSample> {
        let mut rows = filter_samples(snapshot, &self.filter);
        sort_samples(&mut rows, self.sort_mode);
        rows
    }
}

/// Case-insensitive substring match on the process name.
pub fn name_matches(name: &str, filter: &str) -> bool {
    filter.is_empty() || name.to_lowercase().contains(&filter.to_lowercase())
}

pub fn filter_samples(samples: &[ProcessSample], filter: &str) -> Vec<ProcessSample> {
    samples
        .iter()
        .filter(|p| name_matches(&p.name, filter))
        .cloned()
        .collect()
}
