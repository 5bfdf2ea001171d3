use tracing::debug;

use crate::filter::Row;

/// Record actions the sheet offers but does not implement itself.
/// Each call returns the notice shown to the user.
pub trait ActionPort {
    fn edit(&mut self, row: &Row) -> String;
    fn export_excel(&mut self, rows: &[&Row]) -> String;
    fn download_report(&mut self, rows: &[&Row]) -> String;
}

#[derive(Debug, Default)]
pub struct StubActions;

impl ActionPort for StubActions {
    fn edit(&mut self, row: &Row) -> String {
        debug!("Edit requested for {:?}", row.cells());
        "Edit functionality to be implemented".to_string()
    }

    fn export_excel(&mut self, rows: &[&Row]) -> String {
        debug!("Excel export requested for {} rows", rows.len());
        "Excel export feature coming soon!".to_string()
    }

    fn download_report(&mut self, rows: &[&Row]) -> String {
        debug!("Report requested for {} rows", rows.len());
        "PDF Report generation feature coming soon!".to_string()
    }
}
