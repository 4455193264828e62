//! Kanban board interface.
//!
//! Tasks are laid out in one column per status. Cards can be moved between
//! columns, toggled done and inspected in a detail popup; a text filter narrows
//! the board on top of the list filters it was opened with.

use std::io;
use std::time::Duration;

use chrono::Local;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};

use crate::db::{format_due, format_priority, format_status, format_timestamp, short_id, Database, Theme};
use crate::fields::Status;
use crate::query::{self, TaskFilter};
use crate::task::Task;
use crate::tui::colors::{card_colors, hex_color, panel_color, priority_color};

const COLUMN_COUNT: usize = Status::COLUMNS.len();
const CARD_HEIGHT: usize = 5;

/// Board state: the store plus selection, scrolling and filter input.
pub struct BoardApp {
    db: Database,
    filter: TaskFilter,
    theme: Theme,
    selected_column: usize,
    selected_card: usize,
    column_scroll_offsets: [usize; COLUMN_COUNT],
    status_message: String,
    show_task_detail: bool,
    filter_active: bool,
    filter_text: String,
    columns: [Vec<String>; COLUMN_COUNT],
}

impl BoardApp {
    pub fn new(db: Database, filter: TaskFilter, theme: Theme) -> Self {
        let mut app = BoardApp {
            db,
            filter,
            theme,
            selected_column: 0,
            selected_card: 0,
            column_scroll_offsets: [0; COLUMN_COUNT],
            status_message: String::new(),
            show_task_detail: false,
            filter_active: false,
            filter_text: String::new(),
            columns: Default::default(),
        };
        app.update_columns();
        app
    }

    /// Rebuild the columns from the store, the list filter and the text filter.
    fn update_columns(&mut self) {
        let needle = self.filter_text.to_lowercase();
        let categories = &self.db.categories;
        let visible = self.db.tasks.iter().filter(|task| {
            if !self.filter.matches(task) {
                return false;
            }
            if needle.is_empty() {
                return true;
            }
            task.title.to_lowercase().contains(&needle)
                || task.tags.iter().any(|tag| tag.to_lowercase().contains(&needle))
                || query::category_label(categories, task.category_id.as_deref())
                    .to_lowercase()
                    .contains(&needle)
        });

        let board = query::group_by_status(visible);
        for (i, status) in Status::COLUMNS.into_iter().enumerate() {
            self.columns[i] = board.column(status).iter().map(|t| t.id.clone()).collect();
        }
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let column_len = self.columns[self.selected_column].len();
        if column_len == 0 {
            self.selected_card = 0;
            self.column_scroll_offsets[self.selected_column] = 0;
        } else if self.selected_card >= column_len {
            self.selected_card = column_len - 1;
        }
    }

    fn selected_task_id(&self) -> Option<&str> {
        self.columns[self.selected_column]
            .get(self.selected_card)
            .map(String::as_str)
    }

    fn selected_task(&self) -> Option<&Task> {
        self.selected_task_id().and_then(|id| self.db.task(id))
    }

    fn set_status_message(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }

    /// Move the selected card one column to the left or right.
    fn move_card(&mut self, forward: bool) {
        let target = match (forward, self.selected_column) {
            (true, c) if c + 1 < COLUMN_COUNT => c + 1,
            (false, c) if c > 0 => c - 1,
            _ => return,
        };
        let Some(task_id) = self.selected_task_id().map(str::to_string) else {
            return;
        };
        let status = Status::COLUMNS[target];

        match self.db.set_status(&task_id, status) {
            Ok(_) => {
                self.update_columns();
                self.selected_column = target;
                match self.columns[target].iter().position(|id| *id == task_id) {
                    Some(position) => self.selected_card = position,
                    None => self.clamp_selection(),
                }
                self.set_status_message(format!("Moved task to {}", format_status(status)));
            }
            Err(e) => self.set_status_message(format!("Error saving: {e}")),
        }
    }

    /// Toggle the selected task between done and to do.
    fn toggle_task_completion(&mut self) {
        let Some(task_id) = self.selected_task_id().map(str::to_string) else {
            return;
        };
        match self.db.toggle_status(&task_id) {
            Ok(status) => {
                self.update_columns();
                let text = match status {
                    Status::Done => "Task marked as completed",
                    _ => "Task marked as to do",
                };
                self.set_status_message(text);
            }
            Err(e) => self.set_status_message(format!("Error saving: {e}")),
        }
    }

    /// Apply one key press. Returns true when the board should close.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.filter_active {
            match key.code {
                KeyCode::Esc => {
                    self.filter_active = false;
                    self.filter_text.clear();
                    self.update_columns();
                    self.status_message.clear();
                }
                KeyCode::Enter => {
                    self.filter_active = false;
                    if self.filter_text.is_empty() {
                        self.set_status_message("Filter cleared");
                    } else {
                        let shown: usize = self.columns.iter().map(Vec::len).sum();
                        self.set_status_message(format!("Filter: '{}' ({shown} tasks shown)", self.filter_text));
                    }
                }
                KeyCode::Backspace => {
                    if self.filter_text.pop().is_some() {
                        self.update_columns();
                    }
                }
                KeyCode::Char(c) => {
                    self.filter_text.push(c);
                    self.update_columns();
                }
                _ => {}
            }
            return false;
        }

        self.status_message.clear();

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Esc if self.show_task_detail => self.show_task_detail = false,
            KeyCode::Esc | KeyCode::Char('q') => return true,

            KeyCode::Enter => {
                self.show_task_detail = !self.show_task_detail && self.selected_task().is_some();
            }

            KeyCode::Left if key.modifiers.contains(KeyModifiers::CONTROL) => self.move_card(false),
            KeyCode::Right if key.modifiers.contains(KeyModifiers::CONTROL) => self.move_card(true),
            KeyCode::Char('<') => self.move_card(false),
            KeyCode::Char('>') => self.move_card(true),

            KeyCode::Left => {
                if self.selected_column > 0 {
                    self.selected_column -= 1;
                    self.clamp_selection();
                }
            }
            KeyCode::Right => {
                if self.selected_column + 1 < COLUMN_COUNT {
                    self.selected_column += 1;
                    self.clamp_selection();
                }
            }
            KeyCode::Up => {
                self.selected_card = self.selected_card.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.selected_card + 1 < self.columns[self.selected_column].len() {
                    self.selected_card += 1;
                }
            }

            KeyCode::Char('c') => self.toggle_task_completion(),

            KeyCode::Char('/') => {
                self.filter_active = true;
                self.set_status_message("Filter: type to search title/tags/category, Enter to apply, Esc to cancel");
            }

            KeyCode::Char('h') => {
                self.set_status_message(
                    "Help: Enter: Details | Ctrl+←/→ or </>: Move card | c: Toggle done | /: Filter | q/Esc: Exit",
                );
            }
            _ => {}
        }
        false
    }

    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(self.handle_key(key));
                }
            }
        }
        Ok(false)
    }

    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Board
                Constraint::Length(1), // Status bar
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);
        self.render_board(f, chunks[1]);
        self.render_status_bar(f, chunks[2]);

        if self.show_task_detail {
            self.render_task_detail_popup(f);
        }
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let stats = query::stats(&self.db.tasks, self.db.now());
        let summary = format!(
            "Total: {}  Completed: {}  Overdue: {}",
            stats.total, stats.completed, stats.overdue
        );
        let header = Paragraph::new(Line::from(vec![
            Span::styled("KANBAN BOARD", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(summary, Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC)),
        ]))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
        f.render_widget(header, area);
    }

    fn render_board(&mut self, f: &mut Frame, area: Rect) {
        let columns_layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, COLUMN_COUNT as u32); COLUMN_COUNT])
            .split(area);

        for (i, &column_area) in columns_layout.iter().enumerate() {
            self.render_column(f, column_area, i);
        }
    }

    fn render_column(&mut self, f: &mut Frame, area: Rect, column_index: usize) {
        let is_selected = column_index == self.selected_column;
        let status = Status::COLUMNS[column_index];
        let cards = &self.columns[column_index];

        let border_style = if is_selected {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("{} ({})", format_status(status), cards.len()))
            .border_style(border_style);
        let inner = block.inner(area);
        f.render_widget(block, area);

        if cards.is_empty() {
            return;
        }

        let available_height = inner.height as usize;
        let visible_cards = available_height / CARD_HEIGHT;

        // Keep the selected card in view.
        let scroll_offset = if is_selected {
            let start = self.column_scroll_offsets[column_index];
            let offset = if self.selected_card < start {
                self.selected_card
            } else if visible_cards > 0 && self.selected_card >= start + visible_cards {
                self.selected_card + 1 - visible_cards
            } else {
                start
            };
            self.column_scroll_offsets[column_index] = offset;
            offset
        } else {
            self.column_scroll_offsets[column_index].min(cards.len().saturating_sub(1))
        };

        let cards = &self.columns[column_index];
        let mut current_y = 0;
        let mut rendered_cards = 0;
        for (card_index, task_id) in cards.iter().enumerate().skip(scroll_offset) {
            if current_y + CARD_HEIGHT > available_height {
                break;
            }
            let Some(task) = self.db.task(task_id) else { continue };
            let card_area = Rect {
                x: inner.x,
                y: inner.y + current_y as u16,
                width: inner.width,
                height: CARD_HEIGHT as u16,
            };
            self.render_card(f, card_area, task, is_selected && card_index == self.selected_card);
            current_y += CARD_HEIGHT;
            rendered_cards += 1;
        }

        if scroll_offset > 0 {
            let indicator = Paragraph::new(format!("▲ +{scroll_offset} above")).style(Style::default().fg(Color::Cyan));
            f.render_widget(indicator, Rect { height: 1, ..inner });
        }
        let remaining = cards.len().saturating_sub(scroll_offset + rendered_cards);
        if remaining > 0 && inner.height > 0 {
            let indicator = Paragraph::new(format!("▼ +{remaining} below")).style(Style::default().fg(Color::Cyan));
            f.render_widget(
                indicator,
                Rect {
                    y: inner.y + inner.height - 1,
                    height: 1,
                    ..inner
                },
            );
        }
    }

    fn render_card(&self, f: &mut Frame, area: Rect, task: &Task, is_selected: bool) {
        let accent = priority_color(task.priority);
        let (bg, fg) = card_colors(self.theme);
        let style = if is_selected {
            Style::default().bg(accent).fg(Color::Black).add_modifier(Modifier::BOLD)
        } else {
            Style::default().bg(bg).fg(fg)
        };

        let marker = if task.is_subtask() { "↳ " } else { "" };
        let overdue = if query::is_overdue(task, self.db.now()) { " !" } else { "" };
        let mut lines = vec![Line::from(vec![
            Span::styled(format!("■ {}", format_priority(task.priority)), Style::default().fg(accent)),
            Span::raw(format!("  #{}{overdue}", short_id(&task.id))),
        ])];
        lines.push(Line::from(format!("{marker}{}", task.title)));

        let category = task
            .category_id
            .as_deref()
            .and_then(|id| self.db.category(id))
            .map(|c| Span::styled(c.name.clone(), Style::default().fg(hex_color(&c.color).unwrap_or(fg))))
            .unwrap_or_else(|| Span::raw("-"));
        lines.push(Line::from(category));

        let card = Paragraph::new(lines)
            .block(Block::default().borders(Borders::LEFT | Borders::BOTTOM))
            .style(style)
            .wrap(Wrap { trim: true });
        f.render_widget(card, area);
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let text = if self.filter_active {
            format!("Filter: {} | Type to search, Enter to apply, Esc to cancel", self.filter_text)
        } else if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            let shown: usize = self.columns.iter().map(Vec::len).sum();
            let filter = if self.filter_text.is_empty() {
                String::new()
            } else {
                format!(" [Filter: {}]", self.filter_text)
            };
            format!("Tasks: {shown}{filter} | Ctrl+←/→: Move | c: Toggle done | /: Filter | h: Help")
        };
        let (_, fg) = card_colors(self.theme);
        let status = Paragraph::new(text).style(Style::default().bg(panel_color(self.theme)).fg(fg));
        f.render_widget(status, area);
    }

    fn render_task_detail_popup(&self, f: &mut Frame) {
        let Some(task) = self.selected_task() else {
            return;
        };

        let area = f.area();
        let popup_width = area.width * 80 / 100;
        let popup_height = area.height * 80 / 100;
        let popup_area = Rect::new(
            (area.width - popup_width) / 2,
            (area.height - popup_height) / 2,
            popup_width,
            popup_height,
        );
        f.render_widget(Clear, popup_area);

        let parent = match task.parent_id.as_deref() {
            Some(id) => match self.db.task(id) {
                Some(p) => format!("{} ({})", short_id(id), p.title),
                None => "-".to_string(),
            },
            None => "-".to_string(),
        };
        let subtasks = query::children_of(&self.db.tasks, &task.id);
        let reminder = match (task.reminder_time, task.reminder_minutes) {
            (Some(at), Some(minutes)) => format!("{} ({minutes} min before)", format_timestamp(Some(at))),
            _ => "-".to_string(),
        };

        let mut lines = vec![
            Line::from(Span::styled(
                format!("#{}: {}", short_id(&task.id), task.title),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(format!("Status:     {}", format_status(task.status))),
            Line::from(format!("Priority:   {}", format_priority(task.priority))),
            Line::from(format!("Due:        {}", format_due(task.due_date, Local::now()))),
            Line::from(format!("Reminder:   {reminder}")),
            Line::from(format!(
                "Category:   {}",
                query::category_label(&self.db.categories, task.category_id.as_deref())
            )),
            Line::from(format!("Parent:     {parent}")),
            Line::from(format!(
                "Tags:       {}",
                if task.tags.is_empty() { "-".to_string() } else { task.tags.join(", ") }
            )),
            Line::from(format!("Created:    {}", format_timestamp(Some(task.created_at)))),
            Line::from(format!("Completed:  {}", format_timestamp(task.completed_at))),
            Line::from(""),
            Line::from("Description:"),
            Line::from(task.description.as_deref().unwrap_or("-")),
        ];
        if !subtasks.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(format!("Subtasks ({}):", subtasks.len())));
            for sub in subtasks {
                let check = if sub.is_done() { "[x]" } else { "[ ]" };
                lines.push(Line::from(format!("  {check} {}", sub.title)));
            }
        }

        let popup = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Task Details (Enter to close)")
                    .title_alignment(Alignment::Center)
                    .border_style(Style::default().fg(priority_color(task.priority)).add_modifier(Modifier::BOLD)),
            )
            .wrap(Wrap { trim: true })
            .style(Style::default().bg(panel_color(self.theme)).fg(card_colors(self.theme).1));
        f.render_widget(popup, popup_area);
    }

    /// Main event loop.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;
            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{at, fixture};
    use crate::fields::{Priority, PriorityFilter};
    use crate::task::TaskInput;
    use ratatui::backend::TestBackend;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::CONTROL)
    }

    fn board_with(titles: &[(&str, Priority)]) -> BoardApp {
        let (mut db, _, _) = fixture(at(2024, 6, 1, 8, 0));
        for &(title, priority) in titles {
            db.create_task(TaskInput {
                title: title.into(),
                priority,
                ..TaskInput::default()
            })
            .unwrap();
        }
        BoardApp::new(db, TaskFilter::default(), Theme::Light)
    }

    fn column_titles(app: &BoardApp, column: usize) -> Vec<String> {
        app.columns[column]
            .iter()
            .filter_map(|id| app.db.task(id))
            .map(|t| t.title.clone())
            .collect()
    }

    #[test]
    fn cards_move_between_columns_and_stamp_completion() {
        let mut app = board_with(&[("Write", Priority::High), ("Read", Priority::Low)]);
        assert_eq!(column_titles(&app, 0), vec!["Write", "Read"]);

        app.handle_key(ctrl(KeyCode::Right));
        assert_eq!(column_titles(&app, 1), vec!["Write"]);
        assert_eq!(app.selected_column, 1);

        app.handle_key(key(KeyCode::Char('>')));
        assert_eq!(column_titles(&app, 2), vec!["Write"]);
        let task = app.selected_task().unwrap();
        assert_eq!(task.status, Status::Done);
        assert!(task.completed_at.is_some());

        // Already in the last column.
        app.handle_key(ctrl(KeyCode::Right));
        assert_eq!(app.selected_column, 2);
    }

    #[test]
    fn toggle_key_completes_and_reopens() {
        let mut app = board_with(&[("Laundry", Priority::Medium)]);
        app.handle_key(key(KeyCode::Char('c')));
        assert_eq!(column_titles(&app, 2), vec!["Laundry"]);
        assert!(app.columns[0].is_empty());

        app.handle_key(key(KeyCode::Right));
        app.handle_key(key(KeyCode::Right));
        app.handle_key(key(KeyCode::Char('c')));
        assert_eq!(column_titles(&app, 0), vec!["Laundry"]);
        assert_eq!(app.db.tasks[0].completed_at, None);
    }

    #[test]
    fn text_filter_narrows_and_escape_restores() {
        let mut app = board_with(&[("Buy milk", Priority::Medium), ("Call mom", Priority::Medium)]);
        app.handle_key(key(KeyCode::Char('/')));
        for c in "MILK".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        assert_eq!(column_titles(&app, 0), vec!["Buy milk"]);

        app.handle_key(key(KeyCode::Enter));
        assert!(!app.filter_active);
        assert_eq!(column_titles(&app, 0), vec!["Buy milk"]);

        app.handle_key(key(KeyCode::Char('/')));
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(column_titles(&app, 0).len(), 2);
    }

    #[test]
    fn list_filter_applies_to_the_board() {
        let (mut db, _, _) = fixture(at(2024, 6, 1, 8, 0));
        for (title, priority) in [("Urgent", Priority::Critical), ("Later", Priority::Low)] {
            db.create_task(TaskInput {
                title: title.into(),
                priority,
                ..TaskInput::default()
            })
            .unwrap();
        }
        let filter = TaskFilter {
            priority: PriorityFilter::Only(Priority::Critical),
            ..TaskFilter::default()
        };
        let app = BoardApp::new(db, filter, Theme::Dark);
        assert_eq!(column_titles(&app, 0), vec!["Urgent"]);
    }

    #[test]
    fn enter_opens_details_only_with_a_selection() {
        let mut app = board_with(&[]);
        app.handle_key(key(KeyCode::Enter));
        assert!(!app.show_task_detail);

        let mut app = board_with(&[("Plan", Priority::Medium)]);
        app.handle_key(key(KeyCode::Enter));
        assert!(app.show_task_detail);
        assert!(!app.handle_key(key(KeyCode::Esc)));
        assert!(!app.show_task_detail);
        assert!(app.handle_key(key(KeyCode::Esc)));
    }

    fn rendered(app: &mut BoardApp) -> String {
        let mut terminal = Terminal::new(TestBackend::new(90, 30)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        terminal.backend().buffer().content.iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn board_renders_columns_and_details() {
        let mut app = board_with(&[("Plan", Priority::Medium)]);
        let text = rendered(&mut app);
        assert!(text.contains("KANBAN BOARD"));
        assert!(text.contains("To do (1)"));
        assert!(text.contains("Done (0)"));

        app.handle_key(key(KeyCode::Enter));
        assert!(rendered(&mut app).contains("Task Details"));
    }
}
