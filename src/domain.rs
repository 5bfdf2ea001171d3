use std::io::Error;
use std::path::PathBuf;

use derive_setters::Setters;
use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;
use thiserror::Error;

use crate::filter::{DateRange, FilterMode};

pub const APP_NAME: &str = "rollbook";

pub const HELP_TEXT: &str = "rollbook - attendance sheet

Table
  Up/Down, PgUp/PgDn, Home/End   move selection
  /                              search (Esc clears)
  c / s                          cycle class / status filter
  p / a                          mark present / absent
  d                              delete selected record
  e                              edit selected record
  x                              export to Excel
  r                              download report
  y                              copy selected row
  ?                              this help
  q                              quit

Attendance form
  Tab / Shift-Tab                next / previous field
  Left/Right or Space            change status
  Enter                          submit (on Cancel: close)
  Esc                            close without saving

Press Esc to close.";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("io error: {0}")]
    Io(#[from] Error),
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("loading failed: {0}")]
    LoadingFailed(String),
    #[error("file not found")]
    FileNotFound,
    #[error("permission denied")]
    PermissionDenied,
    #[error("unknown file type, expected a .csv file")]
    UnknownFileType,
    #[error("logging setup failed: {0}")]
    Logging(String),
}

#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_")]
pub struct AppConfig {
    pub event_poll_time: u64,
    pub filter_mode: FilterMode,
    pub date_range: DateRange,
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            event_poll_time: 250,
            filter_mode: FilterMode::Composed,
            date_range: DateRange::default(),
            log_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    Tick,
    Resize(usize, usize),
    MoveUp,
    MoveDown,
    MovePageUp,
    MovePageDown,
    MoveBeginning,
    MoveEnd,
    Search,
    CycleClass,
    CycleStatus,
    MarkPresent,
    MarkAbsent,
    Delete,
    Edit,
    ExportExcel,
    DownloadReport,
    CopyRow,
    Help,
    Exit,
    RawKey(KeyEvent),
}
