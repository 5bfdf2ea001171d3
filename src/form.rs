use std::fmt;

use ratatui::crossterm::event::{KeyCode, KeyEvent};

use crate::inputter::Inputter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AttendanceStatus {
    #[default]
    Present,
    Absent,
    Late,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 3] = [
        AttendanceStatus::Present,
        AttendanceStatus::Absent,
        AttendanceStatus::Late,
    ];

    pub fn next(self) -> Self {
        match self {
            AttendanceStatus::Present => AttendanceStatus::Absent,
            AttendanceStatus::Absent => AttendanceStatus::Late,
            AttendanceStatus::Late => AttendanceStatus::Present,
        }
    }

    pub fn previous(self) -> Self {
        self.next().next()
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Absent => "Absent",
            AttendanceStatus::Late => "Late",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceEntry {
    pub student_id: String,
    pub status: AttendanceStatus,
    pub remarks: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormField {
    #[default]
    StudentId,
    Status,
    Remarks,
    Submit,
    Cancel,
}

impl FormField {
    fn next(self) -> Self {
        match self {
            FormField::StudentId => FormField::Status,
            FormField::Status => FormField::Remarks,
            FormField::Remarks => FormField::Submit,
            FormField::Submit => FormField::Cancel,
            FormField::Cancel => FormField::StudentId,
        }
    }

    fn previous(self) -> Self {
        match self {
            FormField::StudentId => FormField::Cancel,
            FormField::Status => FormField::StudentId,
            FormField::Remarks => FormField::Status,
            FormField::Submit => FormField::Remarks,
            FormField::Cancel => FormField::Submit,
        }
    }
}

/// What a key press did to the form.
#[derive(Debug, Clone, PartialEq)]
pub enum FormOutcome {
    Editing,
    Closed,
    Invalid(String),
    Submitted(AttendanceEntry),
}

/// State of the "record attendance" modal.
#[derive(Debug, Default, Clone)]
pub struct AttendanceForm {
    student_id: Inputter,
    remarks: Inputter,
    status: AttendanceStatus,
    focus: FormField,
}

impl AttendanceForm {
    pub fn open(status: AttendanceStatus) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn student_id(&self) -> &Inputter {
        &self.student_id
    }

    pub fn remarks(&self) -> &Inputter {
        &self.remarks
    }

    pub fn status(&self) -> AttendanceStatus {
        self.status
    }

    pub fn focus(&self) -> FormField {
        self.focus
    }

    /// `timestamp` is only used when the key submits the form.
    pub fn handle_key(&mut self, key: KeyEvent, timestamp: impl FnOnce() -> String) -> FormOutcome {
        match (key.code, self.focus) {
            (KeyCode::Esc, _) => return FormOutcome::Closed,
            (KeyCode::Tab, _) | (KeyCode::Down, _) => self.focus = self.focus.next(),
            (KeyCode::BackTab, _) | (KeyCode::Up, _) => self.focus = self.focus.previous(),
            (KeyCode::Enter, FormField::Cancel) => return FormOutcome::Closed,
            (KeyCode::Enter, _) => return self.submit(timestamp()),
            (KeyCode::Left, FormField::Status) => self.status = self.status.previous(),
            (KeyCode::Right, FormField::Status) | (KeyCode::Char(' '), FormField::Status) => {
                self.status = self.status.next()
            }
            (_, FormField::StudentId) => {
                self.student_id.read(key);
                self.student_id.resume();
            }
            (_, FormField::Remarks) => {
                self.remarks.read(key);
                self.remarks.resume();
            }
            _ => {}
        }
        FormOutcome::Editing
    }

    fn submit(&mut self, timestamp: String) -> FormOutcome {
        let student_id = self.student_id.value().trim().to_string();
        if student_id.is_empty() {
            self.focus = FormField::StudentId;
            return FormOutcome::Invalid("Student ID is required".to_string());
        }
        FormOutcome::Submitted(AttendanceEntry {
            student_id,
            status: self.status,
            remarks: self.remarks.value().trim().to_string(),
            timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;

    fn no_modifier(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(form: &mut AttendanceForm, text: &str) {
        for c in text.chars() {
            form.handle_key(no_modifier(KeyCode::Char(c)), String::new);
        }
    }

    #[test]
    fn submit_requires_student_id() {
        let mut form = AttendanceForm::open(AttendanceStatus::Present);
        form.handle_key(no_modifier(KeyCode::Tab), String::new);
        let outcome = form.handle_key(no_modifier(KeyCode::Enter), String::new);
        assert_eq!(outcome, FormOutcome::Invalid("Student ID is required".into()));
        assert_eq!(form.focus(), FormField::StudentId);
    }

    #[test]
    fn submit_collects_fields() {
        let mut form = AttendanceForm::open(AttendanceStatus::Absent);
        type_text(&mut form, "S-042");
        form.handle_key(no_modifier(KeyCode::Tab), String::new);
        form.handle_key(no_modifier(KeyCode::Right), String::new);
        form.handle_key(no_modifier(KeyCode::Tab), String::new);
        type_text(&mut form, " bus delayed ");

        let outcome = form.handle_key(no_modifier(KeyCode::Enter), || "2024-01-05T08:30:00Z".into());
        assert_eq!(
            outcome,
            FormOutcome::Submitted(AttendanceEntry {
                student_id: "S-042".into(),
                status: AttendanceStatus::Late,
                remarks: "bus delayed".into(),
                timestamp: "2024-01-05T08:30:00Z".into(),
            })
        );
    }

    #[test]
    fn escape_and_cancel_close() {
        let mut form = AttendanceForm::open(AttendanceStatus::Present);
        assert_eq!(form.handle_key(no_modifier(KeyCode::Esc), String::new), FormOutcome::Closed);

        let mut form = AttendanceForm::open(AttendanceStatus::Present);
        form.handle_key(no_modifier(KeyCode::BackTab), String::new);
        assert_eq!(form.focus(), FormField::Cancel);
        assert_eq!(form.handle_key(no_modifier(KeyCode::Enter), String::new), FormOutcome::Closed);
    }

    #[test]
    fn status_cycles_both_ways() {
        assert_eq!(AttendanceStatus::Present.previous(), AttendanceStatus::Late);
        assert_eq!(AttendanceStatus::Late.next(), AttendanceStatus::Present);
    }

    #[test]
    fn reset_clears_everything() {
        let mut form = AttendanceForm::open(AttendanceStatus::Late);
        type_text(&mut form, "7");
        form.reset();
        assert!(form.student_id().value().is_empty());
        assert_eq!(form.status(), AttendanceStatus::Present);
        assert_eq!(form.focus(), FormField::StudentId);
    }
}
