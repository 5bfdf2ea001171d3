use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Position, Rect},
    style::{Color, Style, Stylize},
    symbols::border,
    text::{Line, Span, Text},
    widgets::{Block, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
};

use crate::domain::{APP_NAME, AppConfig};
use crate::filter::CellKind;
use crate::form::{AttendanceForm, FormField};
use crate::model::{Modus, Model};

pub const HEADER_HEIGHT: usize = 4;
pub const FILTERBAR_HEIGHT: usize = 3;
pub const STATUSLINE_HEIGHT: usize = 1;
pub const TABLE_HEADER_HEIGHT: usize = 1;
pub const TABLE_BORDER_HEIGHT: usize = 2;

const FORM_WIDTH: u16 = 50;
const FORM_HEIGHT: u16 = 11;

#[derive(Debug)]
pub struct TableUI {
    filter_mode: String,
}

impl TableUI {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            filter_mode: format!("{:?}", config.filter_mode).to_lowercase(),
        }
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let [header, filterbar, table, statusline] = Layout::vertical([
            Constraint::Length(HEADER_HEIGHT as u16),
            Constraint::Length(FILTERBAR_HEIGHT as u16),
            Constraint::Min(0),
            Constraint::Length(STATUSLINE_HEIGHT as u16),
        ])
        .areas(frame.area());

        self.draw_header(model, frame, header);
        self.draw_filterbar(model, frame, filterbar);
        self.draw_table(model, frame, table);
        self.draw_statusline(model, frame, statusline);

        match model.modus() {
            Modus::Form => self.draw_form(model.form(), frame),
            Modus::Confirm => self.draw_popup(
                frame,
                " Delete ",
                "Are you sure you want to delete this record?\n\n[y] yes   [any other key] no",
            ),
            Modus::Popup => self.draw_popup(frame, "", model.popup_message()),
            Modus::Table | Modus::Search => {}
        }
    }

    fn draw_header(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let title = Line::from(format!(" {APP_NAME} | {} ", model.name()).bold());
        let block = Block::bordered()
            .title(title.centered())
            .border_set(border::THICK);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [clock_line, stats_line] =
            Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).areas(inner);

        let clock = model.clock();
        let [date, time] =
            Layout::horizontal([Constraint::Fill(1), Constraint::Length(12)]).areas(clock_line);
        frame.render_widget(Paragraph::new(clock.date_line().yellow()), date);
        frame.render_widget(
            Paragraph::new(clock.time_line().yellow().bold()).right_aligned(),
            time,
        );
        frame.render_widget(
            Paragraph::new(model.statistics().summary().cyan()),
            stats_line,
        );
    }

    fn draw_filterbar(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let [search, class, status] = Layout::horizontal([
            Constraint::Fill(2),
            Constraint::Fill(1),
            Constraint::Fill(1),
        ])
        .areas(area);

        let searching = model.modus() == Modus::Search;
        let search_style = if searching {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let search_block = Block::bordered().title(" Search [/] ").border_style(search_style);
        let inner = search_block.inner(search);
        frame.render_widget(
            Paragraph::new(model.search_input().value()).block(search_block),
            search,
        );
        if searching {
            frame.set_cursor_position(Position::new(
                inner.x + model.search_input().cursor_pos() as u16,
                inner.y,
            ));
        }

        let filter = model.filter();
        frame.render_widget(select(" Class [c] ", &filter.class_filter), class);
        frame.render_widget(select(" Status [s] ", &filter.status_filter), status);
    }

    fn draw_table(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let view = model.table();
        let begin = view.offset_row.min(view.rows.len());
        let end = (begin + view.height).min(view.rows.len());

        let header = Row::new(
            CellKind::ALL
                .iter()
                .map(|kind| Cell::from(kind.title()))
                .chain(std::iter::once(Cell::from("Actions"))),
        )
        .style(Style::default().bold().underlined());

        let rows = view.rows[begin..end].iter().map(|&idx| {
            let record = &model.records()[idx];
            let mut cells: Vec<Cell> = CellKind::ALL
                .iter()
                .map(|kind| match kind {
                    CellKind::Status => Cell::from(status_span(record.cell(*kind))),
                    _ => Cell::from(record.cell(*kind).to_string()),
                })
                .collect();
            cells.push(Cell::from("[e]dit [d]elete".dark_gray()));
            Row::new(cells)
        });

        let widths = [
            Constraint::Length(8),
            Constraint::Min(16),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(9),
            Constraint::Length(16),
        ];

        let range = &model.filter().date_range;
        let window = if range.is_empty() {
            String::new()
        } else {
            format!("| {} .. {} ", range.from, range.to)
        };
        let title = format!(
            " Records {}/{} {window}",
            view.rows.len(),
            model.records().len()
        );
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::bordered().title(title))
            .row_highlight_style(Style::default().bg(Color::Blue));

        let mut state = TableState::default()
            .with_selected((!view.rows.is_empty()).then(|| view.selected.saturating_sub(begin)));
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_statusline(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let hints = format!(" filter: {} | ? help | q quit ", self.filter_mode);
        let [message, help] = Layout::horizontal([
            Constraint::Fill(1),
            Constraint::Length(hints.len() as u16),
        ])
        .areas(area);
        frame.render_widget(Paragraph::new(model.status_message().italic()), message);
        frame.render_widget(Paragraph::new(hints.dark_gray()), help);
    }

    fn draw_form(&self, form: &AttendanceForm, frame: &mut Frame) {
        let area = popup_area(frame.area(), FORM_WIDTH, FORM_HEIGHT);
        let block = Block::bordered()
            .title(Line::from(" Mark Attendance ".bold()).centered())
            .border_set(border::THICK);
        let inner = block.inner(area);
        frame.render_widget(Clear, area);
        frame.render_widget(block, area);

        let focus = form.focus();
        let field = |label: &str, value: String, field: FormField| {
            let style = if focus == field {
                Style::default().fg(Color::Yellow).bold()
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(format!("{label:<12}"), style),
                Span::raw(value),
            ])
        };
        let button = |label: &str, field: FormField| {
            if focus == field {
                Span::styled(format!("[ {label} ]"), Style::default().fg(Color::Black).bg(Color::Yellow))
            } else {
                Span::raw(format!("[ {label} ]"))
            }
        };

        let text = Text::from(vec![
            Line::default(),
            field("Student ID", form.student_id().value().to_string(), FormField::StudentId),
            Line::default(),
            field("Status", format!("< {} >", form.status()), FormField::Status),
            Line::default(),
            field("Remarks", form.remarks().value().to_string(), FormField::Remarks),
            Line::default(),
            Line::from(vec![
                button("Submit", FormField::Submit),
                Span::raw("  "),
                button("Cancel", FormField::Cancel),
            ])
            .centered(),
        ]);
        frame.render_widget(Paragraph::new(text), inner);

        let cursor = match focus {
            FormField::StudentId => Some((1, form.student_id().cursor_pos())),
            FormField::Remarks => Some((5, form.remarks().cursor_pos())),
            _ => None,
        };
        if let Some((line, pos)) = cursor {
            frame.set_cursor_position(Position::new(inner.x + 12 + pos as u16, inner.y + line));
        }
    }

    fn draw_popup(&self, frame: &mut Frame, title: &str, message: &str) {
        let width = message
            .lines()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0)
            .clamp(20, 70) as u16
            + 4;
        let height = message.lines().count().max(1) as u16 + 4;
        let area = popup_area(frame.area(), width, height);

        let block = Block::bordered()
            .title(Line::from(title.bold()).centered())
            .title_bottom(Line::from(" <Esc> ".blue().bold()).centered())
            .border_set(border::THICK);
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(message)
                .wrap(Wrap { trim: false })
                .block(block.padding(ratatui::widgets::Padding::uniform(1))),
            area,
        );
    }
}

fn select<'a>(title: &'a str, value: &'a str) -> Paragraph<'a> {
    let shown = if value.is_empty() {
        "All".dark_gray()
    } else {
        value.cyan()
    };
    Paragraph::new(shown).block(Block::bordered().title(title))
}

fn status_span(status: &str) -> Span<'_> {
    match status.to_lowercase().as_str() {
        "present" => status.green(),
        "absent" => status.red(),
        "late" => status.yellow(),
        _ => Span::raw(status),
    }
}

fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let [area] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(area);
    area
}
