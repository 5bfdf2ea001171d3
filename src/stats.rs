use std::collections::{BTreeMap, BTreeSet};

use crate::filter::{CellKind, Row};

/// Attendance counts for one day, derived from the in-memory records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statistics {
    pub date: String,
    pub total_students: usize,
    pub present: usize,
    pub absent: usize,
    pub late: usize,
    pub not_marked: usize,
    /// Present students as a percentage of all students, two decimals.
    pub attendance_rate: f64,
}

impl Statistics {
    /// Students are the distinct identifiers in `rows`. A student marked twice on `date`
    /// counts with the later row.
    pub fn compute(rows: &[Row], date: &str) -> Self {
        let students: BTreeSet<&str> = rows
            .iter()
            .map(|r| r.cell(CellKind::Identifier))
            .filter(|id| !id.is_empty())
            .collect();
        let marked: BTreeMap<&str, &str> = rows
            .iter()
            .filter(|r| r.cell(CellKind::Date) == date)
            .map(|r| (r.cell(CellKind::Identifier), r.cell(CellKind::Status)))
            .filter(|(id, _)| !id.is_empty())
            .collect();

        let count = |status: &str| {
            marked
                .values()
                .filter(|s| s.eq_ignore_ascii_case(status))
                .count()
        };
        let present = count("present");
        let total_students = students.len();
        let attendance_rate = if total_students > 0 {
            (present as f64 / total_students as f64 * 10000.0).round() / 100.0
        } else {
            0.0
        };

        Self {
            date: date.to_string(),
            total_students,
            present,
            absent: count("absent"),
            late: count("late"),
            not_marked: total_students.saturating_sub(marked.len()),
            attendance_rate,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Today {}: {} present | {} absent | {} late | {} not marked | {:.2}% of {} students",
            self.date,
            self.present,
            self.absent,
            self.late,
            self.not_marked,
            self.attendance_rate,
            self.total_students
        )
    }
}
