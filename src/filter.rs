use std::time::Instant;

use clap::ValueEnum;
use tracing::trace;

/// Fixed cell positions of an attendance row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Identifier = 0,
    Name = 1,
    Class = 2,
    Date = 3,
    Status = 4,
}

impl CellKind {
    pub const ALL: [CellKind; 5] = [
        CellKind::Identifier,
        CellKind::Name,
        CellKind::Class,
        CellKind::Date,
        CellKind::Status,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            CellKind::Identifier => "ID",
            CellKind::Name => "Name",
            CellKind::Class => "Class",
            CellKind::Date => "Date",
            CellKind::Status => "Status",
        }
    }
}

/// One displayable attendance record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<String>,
}

impl Row {
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    pub fn from_cells<S: Into<String>>(cells: impl IntoIterator<Item = S>) -> Self {
        Self {
            cells: cells.into_iter().map(Into::into).collect(),
        }
    }

    /// Missing cells read as empty.
    pub fn cell(&self, kind: CellKind) -> &str {
        self.cells.get(kind as usize).map(String::as_str).unwrap_or("")
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    pub fn set_cell(&mut self, kind: CellKind, value: impl Into<String>) {
        let idx = kind as usize;
        if self.cells.len() <= idx {
            self.cells.resize(idx + 1, String::new());
        }
        self.cells[idx] = value.into();
    }

    pub fn text(&self) -> String {
        self.cells.join(" ")
    }
}

/// Receives the visibility decisions of the engine.
pub trait RenderTarget {
    fn set_visibility(&mut self, row: usize, visible: bool);
}

/// One visibility flag per row, in row order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibilityMask {
    flags: Vec<bool>,
}

impl VisibilityMask {
    pub fn all_visible(len: usize) -> Self {
        Self {
            flags: vec![true; len],
        }
    }

    pub fn resize(&mut self, len: usize) {
        self.flags.resize(len, true);
    }

    pub fn visible_rows(&self) -> Vec<usize> {
        self.flags
            .iter()
            .enumerate()
            .filter_map(|(idx, &v)| v.then_some(idx))
            .collect()
    }
}

impl RenderTarget for VisibilityMask {
    fn set_visibility(&mut self, row: usize, visible: bool) {
        if row >= self.flags.len() {
            self.flags.resize(row + 1, true);
        }
        self.flags[row] = visible;
    }
}

/// Inclusive bounds on the date cell. Bounds are ISO dates, so they compare as text.
/// An empty bound is open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: String,
    pub to: String,
}

impl DateRange {
    pub fn is_empty(&self) -> bool {
        self.from.is_empty() && self.to.is_empty()
    }

    pub fn contains(&self, date: &str) -> bool {
        (self.from.is_empty() || date >= self.from.as_str())
            && (self.to.is_empty() || date <= self.to.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub search_term: String,
    pub class_filter: String,
    pub status_filter: String,
    /// Session window set on the command line, narrows every filter pass.
    pub date_range: DateRange,
}

impl FilterState {
    pub fn is_empty(&self) -> bool {
        self.search_term.is_empty()
            && self.class_filter.is_empty()
            && self.status_filter.is_empty()
            && self.date_range.is_empty()
    }
}

/// How the search box and the two selects interact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum FilterMode {
    /// A row must match the search term and both selects.
    #[default]
    Composed,
    /// Only the control that fired last decides visibility.
    LastTrigger,
}

/// The control that caused a filter pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Search,
    Select,
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RowFilterEngine {
    mode: FilterMode,
}

impl RowFilterEngine {
    pub fn new(mode: FilterMode) -> Self {
        Self { mode }
    }

    pub fn search_matches(row: &Row, term: &str) -> bool {
        contains_ignore_case(&row.text(), term)
    }

    pub fn select_matches(row: &Row, class_filter: &str, status_filter: &str) -> bool {
        let mut show_row = true;
        if !class_filter.is_empty() && !contains_ignore_case(row.cell(CellKind::Class), class_filter) {
            show_row = false;
        }
        if !status_filter.is_empty() && !contains_ignore_case(row.cell(CellKind::Status), status_filter) {
            show_row = false;
        }
        show_row
    }

    pub fn apply_search<T: RenderTarget>(&self, rows: &[Row], term: &str, target: &mut T) {
        let needle = term.to_lowercase();
        for (idx, row) in rows.iter().enumerate() {
            target.set_visibility(idx, row.text().to_lowercase().contains(&needle));
        }
    }

    pub fn apply_combined_filter<T: RenderTarget>(
        &self,
        rows: &[Row],
        class_filter: &str,
        status_filter: &str,
        target: &mut T,
    ) {
        for (idx, row) in rows.iter().enumerate() {
            target.set_visibility(idx, Self::select_matches(row, class_filter, status_filter));
        }
    }

    /// Recomputes visibility of every row and returns how many stayed visible.
    pub fn apply<T: RenderTarget>(
        &self,
        rows: &[Row],
        state: &FilterState,
        trigger: Trigger,
        target: &mut T,
    ) -> usize {
        let start_time = Instant::now();
        let mut visible = 0;
        let mut counting = Windowed {
            inner: target,
            rows,
            range: &state.date_range,
            visible: &mut visible,
        };

        match (self.mode, trigger) {
            (FilterMode::Composed, _) => {
                for (idx, row) in rows.iter().enumerate() {
                    let show_row = Self::search_matches(row, &state.search_term)
                        && Self::select_matches(row, &state.class_filter, &state.status_filter);
                    counting.set_visibility(idx, show_row);
                }
            }
            (FilterMode::LastTrigger, Trigger::Search) => {
                self.apply_search(rows, &state.search_term, &mut counting)
            }
            (FilterMode::LastTrigger, Trigger::Select) => self.apply_combined_filter(
                rows,
                &state.class_filter,
                &state.status_filter,
                &mut counting,
            ),
        }

        trace!(
            "Filter {:?} via {:?} left {}/{} rows visible in {}us",
            state,
            trigger,
            visible,
            rows.len(),
            start_time.elapsed().as_micros()
        );
        visible
    }
}

/// Hides rows outside the date window and counts what stays visible.
struct Windowed<'a, T: RenderTarget> {
    inner: &'a mut T,
    rows: &'a [Row],
    range: &'a DateRange,
    visible: &'a mut usize,
}

impl<T: RenderTarget> RenderTarget for Windowed<'_, T> {
    fn set_visibility(&mut self, row: usize, visible: bool) {
        let visible = visible
            && (self.range.is_empty()
                || self
                    .rows
                    .get(row)
                    .is_some_and(|r| self.range.contains(r.cell(CellKind::Date))));
        if visible {
            *self.visible += 1;
        }
        self.inner.set_visibility(row, visible);
    }
}
