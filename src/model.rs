use std::collections::BTreeSet;
use std::path::PathBuf;

use arboard::Clipboard;
use ratatui::crossterm::event::{KeyCode, KeyEvent};
use tracing::{debug, error, info, trace};

use crate::actions::{ActionPort, StubActions};
use crate::clock::Clock;
use crate::domain::{AppConfig, HELP_TEXT, Message};
use crate::filter::{CellKind, FilterState, Row, RowFilterEngine, Trigger, VisibilityMask};
use crate::form::{AttendanceEntry, AttendanceForm, AttendanceStatus, FormOutcome};
use crate::inputter::Inputter;
use crate::loader::RecordTable;
use crate::stats::Statistics;
use crate::ui::{
    FILTERBAR_HEIGHT, HEADER_HEIGHT, STATUSLINE_HEIGHT, TABLE_BORDER_HEIGHT, TABLE_HEADER_HEIGHT,
};

#[derive(Debug, PartialEq)]
pub enum Status {
    Ready,
    Quitting,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Modus {
    Table,
    Search,
    Form,
    Confirm,
    Popup,
}

/// Visible part of the record table.
#[derive(Debug, Default)]
pub struct TableView {
    pub(crate) mask: VisibilityMask,
    pub(crate) rows: Vec<usize>, // Visible row index to record index
    pub(crate) selected: usize,  // Index into rows
    pub(crate) offset_row: usize,
    pub(crate) height: usize,
}

impl TableView {
    fn scroll_into_view(&mut self) {
        if self.rows.is_empty() {
            self.selected = 0;
            self.offset_row = 0;
            return;
        }
        self.selected = self.selected.min(self.rows.len() - 1);
        if self.selected < self.offset_row {
            self.offset_row = self.selected;
        } else if self.selected >= self.offset_row + self.height {
            self.offset_row = self.selected + 1 - self.height;
        }
    }

    pub fn selected_record(&self) -> Option<usize> {
        self.rows.get(self.selected).copied()
    }
}

/// A select control: "" means "All".
#[derive(Debug, Default)]
pub struct Select {
    pub(crate) options: Vec<String>,
    pub(crate) idx: usize,
}

impl Select {
    fn with_options(mut options: Vec<String>) -> Self {
        options.insert(0, String::new());
        Self { options, idx: 0 }
    }

    pub fn value(&self) -> &str {
        self.options.get(self.idx).map(String::as_str).unwrap_or("")
    }

    fn cycle(&mut self) {
        self.idx = (self.idx + 1) % self.options.len().max(1);
    }

    /// Keeps the current value selected if it is still an option.
    fn replace_options(&mut self, other: Select) {
        let current = self.value().to_string();
        self.idx = other.options.iter().position(|o| *o == current).unwrap_or(0);
        self.options = other.options;
    }
}

/// Session state of the attendance sheet.
pub struct Model {
    config: AppConfig,
    path: PathBuf,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    records: Vec<Row>,
    engine: RowFilterEngine,
    filter: FilterState,
    last_trigger: Trigger,
    table: TableView,
    class_select: Select,
    status_select: Select,
    search: Inputter,
    form: AttendanceForm,
    actions: Box<dyn ActionPort>,
    clipboard: Option<Clipboard>,
    now: fn() -> Clock,
    clock: Clock,
    statistics: Statistics,
    popup_message: String,
    status_message: String,
}

impl Model {
    pub fn init(config: &AppConfig, table: RecordTable, ui_width: usize, ui_height: usize) -> Self {
        let mut model = Self {
            config: config.clone(),
            path: table.path,
            status: Status::Ready,
            modus: Modus::Table,
            previous_modus: Modus::Table,
            records: table.rows,
            engine: RowFilterEngine::new(config.filter_mode),
            filter: FilterState {
                date_range: config.date_range.clone(),
                ..Default::default()
            },
            last_trigger: Trigger::Select,
            table: TableView::default(),
            class_select: Select::default(),
            status_select: Select::default(),
            search: Inputter::default(),
            form: AttendanceForm::default(),
            actions: Box::new(StubActions),
            clipboard: None,
            now: Clock::now,
            clock: Clock::now(),
            statistics: Statistics::default(),
            popup_message: String::new(),
            status_message: String::new(),
        };
        model.class_select = model.class_options();
        model.status_select = model.status_options();
        model.ui_resize(ui_width, ui_height);
        model.refilter(Trigger::Select);
        model.refresh_statistics();
        debug!("Model initialized with {:?}", model.config);
        model
    }

    #[cfg(test)]
    pub fn with_actions(mut self, actions: Box<dyn ActionPort>) -> Self {
        self.actions = actions;
        self
    }

    #[cfg(test)]
    pub fn with_clock(mut self, now: fn() -> Clock) -> Self {
        self.now = now;
        self.clock = now();
        self.refresh_statistics();
        self
    }

    // -------------------- Accessors used by the ui ---------------------- //

    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    pub fn modus(&self) -> Modus {
        self.modus
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn search_input(&self) -> &Inputter {
        &self.search
    }

    pub fn form(&self) -> &AttendanceForm {
        &self.form
    }

    pub fn table(&self) -> &TableView {
        &self.table
    }

    pub fn records(&self) -> &[Row] {
        &self.records
    }

    pub fn popup_message(&self) -> &str {
        &self.popup_message
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn visible_rows(&self) -> impl Iterator<Item = &Row> {
        self.table.rows.iter().map(|&idx| &self.records[idx])
    }

    /// True while key events are forwarded untranslated.
    pub fn raw_keyevents(&self) -> bool {
        matches!(self.modus, Modus::Search | Modus::Form | Modus::Confirm)
    }

    pub fn quit(&mut self) {
        self.status = Status::Quitting;
    }

    pub fn update(&mut self, message: Option<Message>) {
        let Some(msg) = message else {
            return;
        };

        // Key repeat can keep the poll from timing out, so every message refreshes the clock.
        self.tick();

        match msg {
            Message::Quit if !self.raw_keyevents() => return self.quit(),
            Message::Tick => return,
            Message::Resize(width, height) => return self.ui_resize(width, height),
            _ => {}
        }

        match self.modus {
            Modus::Table => match msg {
                Message::MoveUp => self.move_selection_up(1),
                Message::MoveDown => self.move_selection_down(1),
                Message::MovePageUp => self.move_selection_up(self.table.height),
                Message::MovePageDown => self.move_selection_down(self.table.height),
                Message::MoveBeginning => self.move_selection_up(usize::MAX),
                Message::MoveEnd => self.move_selection_down(usize::MAX),
                Message::Search => self.enter_search(),
                Message::CycleClass => {
                    self.class_select.cycle();
                    self.select_changed();
                }
                Message::CycleStatus => {
                    self.status_select.cycle();
                    self.select_changed();
                }
                Message::MarkPresent => self.open_form(AttendanceStatus::Present),
                Message::MarkAbsent => self.open_form(AttendanceStatus::Absent),
                Message::Delete => self.ask_delete(),
                Message::Edit => self.edit(),
                Message::ExportExcel => {
                    let rows: Vec<&Row> =
                        self.table.rows.iter().map(|&idx| &self.records[idx]).collect();
                    let notice = self.actions.export_excel(&rows);
                    self.show_popup(notice);
                }
                Message::DownloadReport => {
                    let rows: Vec<&Row> =
                        self.table.rows.iter().map(|&idx| &self.records[idx]).collect();
                    let notice = self.actions.download_report(&rows);
                    self.show_popup(notice);
                }
                Message::CopyRow => self.copy_row(),
                Message::Help => self.show_popup(HELP_TEXT.to_string()),
                Message::Exit => self.clear_filters(),
                _ => (),
            },
            Modus::Search => {
                if let Message::RawKey(key) = msg {
                    self.search_key(key)
                }
            }
            Modus::Form => {
                if let Message::RawKey(key) = msg {
                    self.form_input(key)
                }
            }
            Modus::Confirm => {
                if let Message::RawKey(key) = msg {
                    self.confirm_delete(key)
                }
            }
            Modus::Popup => {
                if matches!(msg, Message::Exit | Message::Help) {
                    self.close_popup()
                }
            }
        }
    }

    fn tick(&mut self) {
        let now = (self.now)();
        if now.is_stale(&self.clock) {
            let new_day = now.iso_date() != self.clock.iso_date();
            self.clock = now;
            if new_day {
                debug!("Date changed to {}", self.clock.iso_date());
                self.refresh_statistics();
            }
        }
    }

    fn refresh_statistics(&mut self) {
        self.statistics = Statistics::compute(&self.records, &self.clock.iso_date());
    }

    fn ui_resize(&mut self, width: usize, height: usize) {
        let chrome = HEADER_HEIGHT
            + FILTERBAR_HEIGHT
            + STATUSLINE_HEIGHT
            + TABLE_HEADER_HEIGHT
            + TABLE_BORDER_HEIGHT;
        self.table.height = height.saturating_sub(chrome).max(1);
        trace!("UI resized to {}x{}, table height {}", width, height, self.table.height);
        self.table.scroll_into_view();
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }

    fn show_popup(&mut self, message: String) {
        self.previous_modus = self.modus;
        self.modus = Modus::Popup;
        self.popup_message = message;
    }

    fn close_popup(&mut self) {
        trace!("Close popup ...");
        self.modus = self.previous_modus;
        self.previous_modus = Modus::Popup;
        self.popup_message.clear();
    }

    // -------------------- Filtering ---------------------- //

    fn refilter(&mut self, trigger: Trigger) {
        self.last_trigger = trigger;
        self.table.mask.resize(self.records.len());
        let visible = self
            .engine
            .apply(&self.records, &self.filter, trigger, &mut self.table.mask);
        self.table.rows = self.table.mask.visible_rows();
        self.table.scroll_into_view();
        let message = if self.filter.is_empty() {
            format!("Showing all {} records", self.records.len())
        } else {
            format!("Showing {} of {} records", visible, self.records.len())
        };
        self.set_status_message(message);
    }

    fn select_changed(&mut self) {
        self.filter.class_filter = self.class_select.value().to_string();
        self.filter.status_filter = self.status_select.value().to_string();
        debug!(
            "Selects changed: class {:?}, status {:?}",
            self.filter.class_filter, self.filter.status_filter
        );
        self.refilter(Trigger::Select);
    }

    /// Resets the search box and both selects. The date window stays.
    fn clear_filters(&mut self) {
        let cleared = FilterState {
            date_range: self.filter.date_range.clone(),
            ..Default::default()
        };
        if self.filter == cleared {
            return;
        }
        self.search.clear();
        self.class_select.idx = 0;
        self.status_select.idx = 0;
        self.filter = cleared;
        self.refilter(Trigger::Select);
    }

    fn class_options(&self) -> Select {
        let classes: BTreeSet<&str> = self
            .records
            .iter()
            .map(|r| r.cell(CellKind::Class))
            .filter(|c| !c.is_empty())
            .collect();
        Select::with_options(classes.into_iter().map(String::from).collect())
    }

    fn status_options(&self) -> Select {
        let mut options: Vec<String> = AttendanceStatus::ALL.iter().map(|s| s.to_string()).collect();
        for row in self.records.iter() {
            let status = row.cell(CellKind::Status);
            if !status.is_empty() && !options.iter().any(|o| o.eq_ignore_ascii_case(status)) {
                options.push(status.to_string());
            }
        }
        Select::with_options(options)
    }

    fn records_changed(&mut self) {
        let classes = self.class_options();
        let statuses = self.status_options();
        self.class_select.replace_options(classes);
        self.status_select.replace_options(statuses);
        self.filter.class_filter = self.class_select.value().to_string();
        self.filter.status_filter = self.status_select.value().to_string();
        self.refilter(self.last_trigger);
        self.refresh_statistics();
    }

    // -------------------- Search box ---------------------- //

    fn enter_search(&mut self) {
        trace!("Entering search ...");
        self.previous_modus = self.modus;
        self.modus = Modus::Search;
        let term = self.filter.search_term.clone();
        self.search.set(&term);
    }

    fn search_key(&mut self, key: KeyEvent) {
        let result = self.search.read(key);
        if result.changed || result.canceled {
            self.filter.search_term = result.input.clone();
            self.refilter(Trigger::Search);
        }
        if result.finished {
            trace!("Leaving search with {:?}", result.input);
            self.modus = Modus::Table;
            self.previous_modus = Modus::Search;
        }
    }

    // -------------------- Attendance form ---------------------- //

    fn open_form(&mut self, status: AttendanceStatus) {
        debug!("Open attendance form ({})", status);
        self.form = AttendanceForm::open(status);
        self.previous_modus = self.modus;
        self.modus = Modus::Form;
    }

    fn form_input(&mut self, key: KeyEvent) {
        let clock = &self.clock;
        match self.form.handle_key(key, || clock.timestamp()) {
            FormOutcome::Editing => {}
            FormOutcome::Closed => {
                self.form.reset();
                self.modus = Modus::Table;
                self.previous_modus = Modus::Form;
            }
            FormOutcome::Invalid(reason) => self.set_status_message(reason),
            FormOutcome::Submitted(entry) => self.submit(entry),
        }
    }

    fn submit(&mut self, entry: AttendanceEntry) {
        info!(
            student_id = %entry.student_id,
            status = %entry.status,
            remarks = %entry.remarks,
            timestamp = %entry.timestamp,
            "Attendance marked"
        );

        // One record per student and day: marking again updates it.
        let today = self.clock.iso_date();
        let existing = self.records.iter().position(|r| {
            r.cell(CellKind::Identifier) == entry.student_id && r.cell(CellKind::Date) == today
        });
        let action = match existing {
            Some(record_idx) => {
                debug!("Updating record {} of {}", record_idx, entry.student_id);
                self.records[record_idx].set_cell(CellKind::Status, entry.status.to_string());
                "updated"
            }
            None => {
                let known = self
                    .records
                    .iter()
                    .rev()
                    .find(|r| r.cell(CellKind::Identifier) == entry.student_id);
                let (name, class) = known
                    .map(|r| (r.cell(CellKind::Name).to_string(), r.cell(CellKind::Class).to_string()))
                    .unwrap_or_default();
                self.records.push(Row::new(vec![
                    entry.student_id.clone(),
                    name,
                    class,
                    today,
                    entry.status.to_string(),
                ]));
                "marked"
            }
        };

        self.form.reset();
        self.records_changed();
        self.modus = Modus::Table;
        self.show_popup(format!(
            "Attendance {action} successfully!\nStudent ID: {}\nStatus: {}",
            entry.student_id, entry.status
        ));
    }

    // -------------------- Record actions ---------------------- //

    fn ask_delete(&mut self) {
        if self.table.selected_record().is_some() {
            self.previous_modus = self.modus;
            self.modus = Modus::Confirm;
        }
    }

    fn confirm_delete(&mut self, key: KeyEvent) {
        self.modus = Modus::Table;
        self.previous_modus = Modus::Confirm;
        if !matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
            self.set_status_message("Delete canceled");
            return;
        }
        let Some(record_idx) = self.table.selected_record() else {
            return;
        };
        let removed = self.records.remove(record_idx);
        info!("Deleted record {:?}", removed.cells());

        self.records_changed();
        self.show_popup("Record deleted successfully!".to_string());
    }

    fn edit(&mut self) {
        if let Some(record_idx) = self.table.selected_record() {
            let notice = self.actions.edit(&self.records[record_idx]);
            self.show_popup(notice);
        }
    }

    fn wrap_cell_content(c: &str) -> String {
        let needs_escaping = c.contains('"');
        let needs_wrapping = c.chars().any(|c| c == ' ' || c == '\t' || c == ',');
        let mut out = String::from(c);

        if needs_escaping {
            out = out.replace('"', "\"\"");
        }
        if needs_wrapping || needs_escaping {
            out = format!("\"{out}\"");
        }
        out
    }

    fn selected_row_as_csv(&self) -> Option<String> {
        let record_idx = self.table.selected_record()?;
        let content = self.records[record_idx]
            .cells()
            .iter()
            .map(|c| Model::wrap_cell_content(c))
            .collect::<Vec<String>>();
        Some(content.join(","))
    }

    fn copy_row(&mut self) {
        let Some(row_content) = self.selected_row_as_csv() else {
            return;
        };
        if self.clipboard.is_none() {
            match Clipboard::new() {
                Ok(clipboard) => self.clipboard = Some(clipboard),
                Err(e) => {
                    error!("Clipboard unavailable: {:?}", e);
                    return self.set_status_message("Clipboard unavailable");
                }
            }
        }
        if let Some(clipboard) = self.clipboard.as_mut() {
            match clipboard.set_text(row_content) {
                Ok(_) => self.set_status_message("Copied row to clipboard"),
                Err(e) => {
                    error!("Error copying to clipboard: {:?}", e);
                    self.set_status_message("Copy to clipboard failed");
                }
            }
        }
    }

    // -------------------- Navigation ---------------------- //

    fn move_selection_up(&mut self, size: usize) {
        self.table.selected = self.table.selected.saturating_sub(size);
        self.table.scroll_into_view();
    }

    fn move_selection_down(&mut self, size: usize) {
        self.table.selected = self.table.selected.saturating_add(size);
        self.table.scroll_into_view();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{DateRange, FilterMode};
    use ratatui::crossterm::event::KeyModifiers;
    use time::macros::datetime;

    fn jan_15() -> Clock {
        Clock::at(datetime!(2024-01-15 09:00:00 UTC))
    }

    fn jan_15_later() -> Clock {
        Clock::at(datetime!(2024-01-15 09:00:05 UTC))
    }

    fn jan_16() -> Clock {
        Clock::at(datetime!(2024-01-16 00:00:01 UTC))
    }

    fn records() -> Vec<Row> {
        vec![
            Row::from_cells(["S-001", "Alice Smith", "Math-101", "2024-01-15", "Present"]),
            Row::from_cells(["S-002", "Bob Jones", "Sci-201", "2024-01-15", "Absent"]),
            Row::from_cells(["S-003", "Carol White", "Math-101", "2024-01-15", "Late"]),
        ]
    }

    fn model_with(mode: FilterMode) -> Model {
        let config = AppConfig::default().with_filter_mode(mode);
        let table = RecordTable {
            path: PathBuf::from("attendance.csv"),
            rows: records(),
        };
        Model::init(&config, table, 80, 24)
    }

    fn model() -> Model {
        model_with(FilterMode::Composed)
    }

    fn key(model: &mut Model, code: KeyCode) {
        model.update(Some(Message::RawKey(KeyEvent::new(code, KeyModifiers::NONE))));
    }

    fn type_text(model: &mut Model, text: &str) {
        for c in text.chars() {
            key(model, KeyCode::Char(c));
        }
    }

    fn visible_ids(model: &Model) -> Vec<String> {
        model
            .visible_rows()
            .map(|r| r.cell(CellKind::Identifier).to_string())
            .collect()
    }

    #[test]
    fn starts_with_all_rows_visible() {
        let mut model = model();
        assert_eq!(visible_ids(&model), vec!["S-001", "S-002", "S-003"]);
        assert_eq!(model.status_message(), "Showing all 3 records");
        model.update(Some(Message::CycleClass));
        assert_eq!(model.status_message(), "Showing 2 of 3 records");
    }

    #[test]
    fn selects_offer_found_values() {
        let model = model();
        assert_eq!(model.class_select.options, vec!["", "Math-101", "Sci-201"]);
        assert_eq!(model.status_select.options, vec!["", "Present", "Absent", "Late"]);
    }

    #[test]
    fn every_search_keystroke_refilters() {
        let mut model = model();
        model.update(Some(Message::Search));
        assert_eq!(model.modus(), Modus::Search);

        type_text(&mut model, "car");
        assert_eq!(visible_ids(&model), vec!["S-003"]);
        key(&mut model, KeyCode::Backspace);
        assert_eq!(visible_ids(&model), vec!["S-003"]);
        key(&mut model, KeyCode::Backspace);
        key(&mut model, KeyCode::Backspace);
        assert_eq!(visible_ids(&model).len(), 3);

        type_text(&mut model, "BOB");
        key(&mut model, KeyCode::Enter);
        assert_eq!(model.modus(), Modus::Table);
        assert_eq!(model.filter().search_term, "BOB");
        assert_eq!(visible_ids(&model), vec!["S-002"]);
    }

    #[test]
    fn escape_in_search_clears_term() {
        let mut model = model();
        model.update(Some(Message::Search));
        type_text(&mut model, "alice");
        key(&mut model, KeyCode::Esc);
        assert_eq!(model.modus(), Modus::Table);
        assert!(model.filter().search_term.is_empty());
        assert_eq!(visible_ids(&model).len(), 3);
    }

    #[test]
    fn second_search_session_keeps_typing() {
        let mut model = model();
        model.update(Some(Message::Search));
        type_text(&mut model, "b");
        key(&mut model, KeyCode::Enter);
        assert_eq!(model.modus(), Modus::Table);

        model.update(Some(Message::Search));
        type_text(&mut model, "o");
        assert_eq!(model.modus(), Modus::Search);
        assert_eq!(model.filter().search_term, "bo");

        // Table commands stay text while the box has focus.
        type_text(&mut model, "cad");
        assert_eq!(model.modus(), Modus::Search);
        assert_eq!(model.filter().search_term, "bocad");
        assert!(model.filter().class_filter.is_empty());
    }

    #[test]
    fn quit_key_is_text_while_searching() {
        let mut model = model();
        model.update(Some(Message::Search));
        model.update(Some(Message::Quit));
        assert_eq!(model.status, Status::Ready);
        model.update(Some(Message::Exit));
        key(&mut model, KeyCode::Enter);
        model.update(Some(Message::Quit));
        assert_eq!(model.status, Status::Quitting);
    }

    #[test]
    fn class_and_status_selects_compose_with_search() {
        let mut model = model();
        model.update(Some(Message::CycleClass));
        assert_eq!(model.filter().class_filter, "Math-101");
        assert_eq!(visible_ids(&model), vec!["S-001", "S-003"]);

        model.update(Some(Message::CycleStatus));
        model.update(Some(Message::CycleStatus));
        model.update(Some(Message::CycleStatus));
        assert_eq!(model.filter().status_filter, "Late");
        assert_eq!(visible_ids(&model), vec!["S-003"]);

        model.update(Some(Message::Search));
        type_text(&mut model, "alice");
        assert!(visible_ids(&model).is_empty());
    }

    #[test]
    fn last_trigger_mode_lets_search_override_selects() {
        let mut model = model_with(FilterMode::LastTrigger);
        model.update(Some(Message::CycleClass));
        model.update(Some(Message::CycleClass));
        assert_eq!(visible_ids(&model), vec!["S-002"]);

        model.update(Some(Message::Search));
        type_text(&mut model, "alice");
        assert_eq!(visible_ids(&model), vec!["S-001"]);
    }

    #[test]
    fn exit_clears_all_filters() {
        let mut model = model();
        model.update(Some(Message::CycleClass));
        model.update(Some(Message::Exit));
        assert!(model.filter().is_empty());
        assert_eq!(visible_ids(&model).len(), 3);
    }

    #[test]
    fn submitted_attendance_is_appended_and_reported() {
        let mut model = model().with_clock(jan_16);
        model.update(Some(Message::MarkAbsent));
        assert_eq!(model.modus(), Modus::Form);
        type_text(&mut model, "S-002");
        key(&mut model, KeyCode::Enter);

        assert_eq!(model.modus(), Modus::Popup);
        assert_eq!(
            model.popup_message(),
            "Attendance marked successfully!\nStudent ID: S-002\nStatus: Absent"
        );
        let added = model.records().last().unwrap();
        assert_eq!(added.cell(CellKind::Date), "2024-01-16");
        assert_eq!(added.cell(CellKind::Name), "Bob Jones");
        assert_eq!(added.cell(CellKind::Class), "Sci-201");
        assert_eq!(added.cell(CellKind::Status), "Absent");
        assert_eq!(visible_ids(&model).len(), 4);

        model.update(Some(Message::Exit));
        assert_eq!(model.modus(), Modus::Table);
        assert!(model.form().student_id().value().is_empty());
    }

    #[test]
    fn marking_a_student_again_on_the_same_day_updates_the_record() {
        let mut model = model().with_clock(jan_15);
        model.update(Some(Message::MarkAbsent));
        type_text(&mut model, "S-001");
        key(&mut model, KeyCode::Enter);

        assert_eq!(
            model.popup_message(),
            "Attendance updated successfully!\nStudent ID: S-001\nStatus: Absent"
        );
        assert_eq!(model.records().len(), 3);
        assert_eq!(model.records()[0].cell(CellKind::Status), "Absent");
        assert_eq!(visible_ids(&model), vec!["S-001", "S-002", "S-003"]);
    }

    #[test]
    fn statistics_follow_submitted_attendance() {
        let mut model = model().with_clock(jan_15);
        let stats = model.statistics();
        assert_eq!((stats.present, stats.absent, stats.late), (1, 1, 1));
        assert_eq!(stats.not_marked, 0);
        assert_eq!(stats.attendance_rate, 33.33);

        model.update(Some(Message::MarkPresent));
        type_text(&mut model, "S-002");
        key(&mut model, KeyCode::Enter);
        let stats = model.statistics();
        assert_eq!((stats.present, stats.absent, stats.late), (2, 0, 1));
        assert_eq!(stats.attendance_rate, 66.67);
    }

    #[test]
    fn clock_refreshes_on_every_message() {
        let mut model = model().with_clock(jan_15);
        assert_eq!(model.clock().time_line(), "09:00:00 AM");

        model.now = jan_15_later;
        model.update(Some(Message::MoveDown));
        assert_eq!(model.clock().time_line(), "09:00:05 AM");
        assert_eq!(model.statistics().date, "2024-01-15");
    }

    #[test]
    fn new_day_resets_statistics() {
        let mut model = model().with_clock(jan_15);
        model.now = jan_16;
        model.update(Some(Message::Tick));
        let stats = model.statistics();
        assert_eq!(stats.date, "2024-01-16");
        assert_eq!(stats.not_marked, 3);
        assert_eq!(stats.present, 0);
    }

    #[test]
    fn date_window_survives_clearing_filters() {
        let config = AppConfig::default().with_date_range(DateRange {
            from: String::new(),
            to: "2024-01-14".into(),
        });
        let mut rows = records();
        rows.push(Row::from_cells(["S-004", "Dan Brown", "Sci-201", "2024-01-14", "Present"]));
        let table = RecordTable {
            path: PathBuf::from("attendance.csv"),
            rows,
        };
        let mut model = Model::init(&config, table, 80, 24);
        assert_eq!(visible_ids(&model), vec!["S-004"]);

        model.update(Some(Message::CycleClass));
        assert!(visible_ids(&model).is_empty());
        model.update(Some(Message::Exit));
        assert!(model.filter().class_filter.is_empty());
        assert_eq!(model.filter().date_range.to, "2024-01-14");
        assert_eq!(visible_ids(&model), vec!["S-004"]);
    }

    #[test]
    fn empty_student_id_keeps_form_open() {
        let mut model = model();
        model.update(Some(Message::MarkPresent));
        key(&mut model, KeyCode::Enter);
        assert_eq!(model.modus(), Modus::Form);
        assert_eq!(model.status_message(), "Student ID is required");
        assert_eq!(model.records().len(), 3);

        key(&mut model, KeyCode::Esc);
        assert_eq!(model.modus(), Modus::Table);
    }

    #[test]
    fn delete_needs_confirmation() {
        let mut model = model();
        model.update(Some(Message::MoveDown));
        model.update(Some(Message::Delete));
        assert_eq!(model.modus(), Modus::Confirm);
        key(&mut model, KeyCode::Char('n'));
        assert_eq!(model.modus(), Modus::Table);
        assert_eq!(model.records().len(), 3);

        model.update(Some(Message::Delete));
        key(&mut model, KeyCode::Char('y'));
        assert_eq!(model.records().len(), 2);
        assert_eq!(visible_ids(&model), vec!["S-001", "S-003"]);
        assert_eq!(model.popup_message(), "Record deleted successfully!");
        assert_eq!(model.class_select.options, vec!["", "Math-101"]);
    }

    #[test]
    fn delete_keeps_other_rows_hidden() {
        let mut model = model_with(FilterMode::LastTrigger);
        model.update(Some(Message::CycleClass));
        assert_eq!(visible_ids(&model), vec!["S-001", "S-003"]);
        model.update(Some(Message::Delete));
        key(&mut model, KeyCode::Char('y'));
        assert_eq!(visible_ids(&model), vec!["S-003"]);
    }

    #[test]
    fn stub_actions_show_notices() {
        let mut model = model();
        model.update(Some(Message::Edit));
        assert_eq!(model.popup_message(), "Edit functionality to be implemented");
        model.update(Some(Message::Exit));
        model.update(Some(Message::ExportExcel));
        assert_eq!(model.popup_message(), "Excel export feature coming soon!");
        model.update(Some(Message::Exit));
        model.update(Some(Message::DownloadReport));
        assert_eq!(model.popup_message(), "PDF Report generation feature coming soon!");
    }

    #[derive(Default)]
    struct RecordingActions {
        exported: std::rc::Rc<std::cell::Cell<usize>>,
    }

    impl ActionPort for RecordingActions {
        fn edit(&mut self, _row: &Row) -> String {
            String::new()
        }

        fn export_excel(&mut self, rows: &[&Row]) -> String {
            self.exported.set(rows.len());
            format!("exported {}", rows.len())
        }

        fn download_report(&mut self, _rows: &[&Row]) -> String {
            String::new()
        }
    }

    #[test]
    fn actions_receive_visible_rows() {
        let actions = RecordingActions::default();
        let exported = actions.exported.clone();
        let mut model = model().with_actions(Box::new(actions));
        model.update(Some(Message::CycleClass));
        model.update(Some(Message::ExportExcel));
        assert_eq!(exported.get(), 2);
        assert_eq!(model.popup_message(), "exported 2");
    }

    #[test]
    fn selection_stays_within_visible_rows() {
        let mut model = model();
        model.update(Some(Message::MoveEnd));
        assert_eq!(model.table().selected, 2);
        model.update(Some(Message::CycleClass));
        model.update(Some(Message::CycleClass));
        assert_eq!(model.table().selected, 0);
        assert_eq!(model.table().selected_record(), Some(1));
        model.update(Some(Message::MoveBeginning));
        assert_eq!(model.table().offset_row, 0);
    }

    #[test]
    fn scrolling_follows_selection() {
        let mut model = model();
        model.update(Some(Message::Resize(80, 12)));
        assert_eq!(model.table().height, 1);
        model.update(Some(Message::MoveDown));
        model.update(Some(Message::MoveDown));
        assert_eq!(model.table().offset_row, 2);
        model.update(Some(Message::MoveUp));
        assert_eq!(model.table().offset_row, 1);
    }

    #[test]
    fn copied_rows_are_csv_quoted() {
        let model = model();
        assert_eq!(
            model.selected_row_as_csv().unwrap(),
            "S-001,\"Alice Smith\",Math-101,2024-01-15,Present"
        );
        assert_eq!(Model::wrap_cell_content("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
