use std::mem;
use std::path::Path;

use anyhow::Result;
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use crate::catalog::{Listing, MIN_QUERY_CHARS};
use crate::db::Store;
use crate::detail::{
    BackOutcome, BookDetail, DetailAction, DetailExit, DetailMode, FormField, LoanAction,
};
use crate::settings::Settings;
use crate::spreadsheet::{export_catalog, import_spreadsheet, SpreadsheetError};

use super::forms::{ConfirmUnsaved, PromptPurpose, TextPrompt};
use super::helpers::{book_lines, centered_rect, key_hints, surface_error};
use super::screens::{CatalogScreen, DetailScreen};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Rows taken by the search bar above the list.
const SEARCH_HEIGHT: u16 = 3;
/// Width of the right-aligned `Label: ` prefix in the detail form.
const LABEL_WIDTH: u16 = 12;
/// Suggested file name for exports.
const DEFAULT_EXPORT_FILE: &str = "catalog.xlsx";

/// High-level navigation states. The catalog stays loaded underneath an open
/// book so returning to it only needs a refresh.
enum Screen {
    Catalog,
    Detail(DetailScreen),
}

/// Fine-grained modes scoped to the current screen.
enum Mode {
    Normal,
    /// Typing in the search bar; every keystroke re-queries.
    Searching,
    ConfirmDelete,
    ConfirmReturn,
    Prompt(TextPrompt),
    ConfirmUnsaved(ConfirmUnsaved),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Warning,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Warning => Style::default().fg(Color::Yellow),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    store: Store,
    settings: Settings,
    catalog: CatalogScreen,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(store: Store, settings: Settings) -> Self {
        Self {
            store,
            catalog: CatalogScreen::new(settings.paging),
            settings,
            screen: Screen::Catalog,
            mode: Mode::Normal,
            status: None,
        }
    }

    /// Route a key press to the active mode. Returns `true` when the user
    /// asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mut mode = mem::replace(&mut self.mode, Mode::Normal);

        mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::Searching => self.handle_search(code)?,
            Mode::ConfirmDelete => self.handle_confirm_delete(code)?,
            Mode::ConfirmReturn => self.handle_confirm_return(code)?,
            Mode::Prompt(prompt) => self.handle_prompt(code, prompt)?,
            Mode::ConfirmUnsaved(confirm) => self.handle_confirm_unsaved(code, confirm)?,
        };

        self.mode = mode;
        Ok(exit)
    }

    /// Ctrl+S saves the open form from any field.
    pub(crate) fn handle_ctrl_s(&mut self) -> Result<()> {
        if matches!(self.mode, Mode::Normal) {
            self.save_detail();
        }
        Ok(())
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        let detail_mode = match &self.screen {
            Screen::Catalog => None,
            Screen::Detail(screen) => Some(screen.detail.mode()),
        };
        match detail_mode {
            None => self.handle_catalog_key(code, exit),
            Some(DetailMode::Viewing) => self.handle_viewing_key(code, exit),
            Some(DetailMode::Editing) => self.handle_editing_key(code),
        }
    }

    fn handle_catalog_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                *exit = true;
            }
            KeyCode::Char('/') | KeyCode::Char('f') => {
                self.clear_status();
                return Ok(Mode::Searching);
            }
            KeyCode::Char('a') | KeyCode::Char('A') => match self.catalog.show_all(&self.store) {
                Ok(()) if self.catalog.view.is_empty_result() => {
                    self.set_status("No books found.", StatusKind::Warning)
                }
                Ok(()) => self.clear_status(),
                Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
            },
            KeyCode::Char('m') | KeyCode::Char('M') => self.load_more(),
            KeyCode::Char('+') | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.clear_status();
                self.open_detail(DetailScreen::new(BookDetail::new_book()));
            }
            KeyCode::Char('x') | KeyCode::Char('X') => {
                self.clear_status();
                return Ok(Mode::Prompt(TextPrompt::new(
                    PromptPurpose::ExportPath,
                    DEFAULT_EXPORT_FILE,
                )));
            }
            KeyCode::Char('i') | KeyCode::Char('I') => {
                self.clear_status();
                let initial = self.settings.import.path.display().to_string();
                return Ok(Mode::Prompt(TextPrompt::new(PromptPurpose::ImportPath, initial)));
            }
            KeyCode::Enter => self.open_selected_book(),
            _ => self.move_catalog_cursor(code),
        }
        Ok(Mode::Normal)
    }

    fn handle_search(&mut self, code: KeyCode) -> Result<Mode> {
        match code {
            KeyCode::Esc => return Ok(Mode::Normal),
            KeyCode::Enter => {
                self.open_selected_book();
                return Ok(Mode::Normal);
            }
            KeyCode::Backspace => {
                self.catalog.query.pop();
            }
            KeyCode::Char(ch) if !ch.is_control() => {
                self.catalog.query.push(ch);
            }
            other => {
                self.move_catalog_cursor(other);
                return Ok(Mode::Searching);
            }
        }

        if let Err(err) = self.catalog.apply_query(&self.store) {
            self.set_status(surface_error(&err), StatusKind::Error);
        } else if self.catalog.view.is_empty_result() {
            self.set_status("No books found.", StatusKind::Warning);
        } else {
            self.clear_status();
        }
        Ok(Mode::Searching)
    }

    fn move_catalog_cursor(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up => self.catalog.move_selection(-1),
            KeyCode::Down => {
                let at_end = self.catalog.selected + 1 >= self.catalog.view.books().len();
                if at_end && self.catalog.view.has_more() {
                    self.load_more();
                } else {
                    self.catalog.move_selection(1);
                }
            }
            KeyCode::PageUp => self.catalog.move_selection(-5),
            KeyCode::PageDown => self.catalog.move_selection(5),
            KeyCode::Home => self.catalog.select_first(),
            KeyCode::End => self.catalog.select_last(),
            _ => {}
        }
    }

    fn load_more(&mut self) {
        match self.catalog.load_more(&self.store) {
            Ok(0) => self.set_status("No more books.", StatusKind::Info),
            Ok(added) => self.set_status(format!("Loaded {added} more."), StatusKind::Info),
            Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
        }
    }

    /// Open the highlighted book, re-reading it so the detail screen never
    /// starts from a stale list entry.
    fn open_selected_book(&mut self) {
        let Some(id) = self.catalog.current_book().map(|book| book.id) else {
            return;
        };
        match self.store.get(id) {
            Ok(Some(book)) => {
                self.clear_status();
                self.open_detail(DetailScreen::new(BookDetail::open(book)));
            }
            Ok(None) => {
                self.set_status("That book no longer exists.", StatusKind::Warning);
                self.refresh_catalog();
            }
            Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
        }
    }

    fn open_detail(&mut self, mut screen: DetailScreen) {
        if screen.detail.mode() == DetailMode::Editing {
            screen.load_lookups(&self.store);
        }
        self.screen = Screen::Detail(screen);
    }

    /// Leave the detail screen and re-query the list underneath.
    fn close_detail(&mut self, exit: DetailExit) {
        self.screen = Screen::Catalog;
        self.refresh_catalog();
        match exit {
            DetailExit::Returned => {}
            DetailExit::Saved => self.set_status("Book saved.", StatusKind::Info),
            DetailExit::Discarded => self.set_status("Changes discarded.", StatusKind::Info),
            DetailExit::Deleted => self.set_status("Book deleted.", StatusKind::Info),
        }
    }

    fn refresh_catalog(&mut self) {
        if let Err(err) = self.catalog.refresh(&self.store) {
            self.set_status(surface_error(&err), StatusKind::Error);
        }
    }

    fn handle_viewing_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        let Screen::Detail(screen) = &mut self.screen else {
            return Ok(Mode::Normal);
        };

        match code {
            KeyCode::Char('q') => {
                *exit = true;
            }
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('b') => {
                if let BackOutcome::Exit(outcome) = screen.detail.request_back() {
                    self.close_detail(outcome);
                }
            }
            KeyCode::Char('e') | KeyCode::Char('E') => {
                if screen.detail.begin_edit() {
                    screen.editor = Default::default();
                    screen.load_lookups(&self.store);
                    self.clear_status();
                }
            }
            KeyCode::Char('d') | KeyCode::Char('D') => {
                if screen.detail.can_delete() {
                    self.clear_status();
                    return Ok(Mode::ConfirmDelete);
                }
            }
            KeyCode::Char('l') | KeyCode::Char('L') => match screen.detail.loan_action() {
                Some(LoanAction::Lend) => {
                    self.clear_status();
                    return Ok(Mode::Prompt(TextPrompt::new(PromptPurpose::Borrower, "")));
                }
                Some(LoanAction::Return) => {
                    self.clear_status();
                    return Ok(Mode::ConfirmReturn);
                }
                None => {}
            },
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_editing_key(&mut self, code: KeyCode) -> Result<Mode> {
        let Screen::Detail(screen) = &mut self.screen else {
            return Ok(Mode::Normal);
        };

        match code {
            KeyCode::Esc => {
                if screen.editor.cancel_autocomplete() {
                    return Ok(Mode::Normal);
                }
                match screen.detail.request_back() {
                    BackOutcome::ConfirmUnsaved => {
                        return Ok(Mode::ConfirmUnsaved(ConfirmUnsaved::new()));
                    }
                    BackOutcome::Exit(outcome) => self.close_detail(outcome),
                    BackOutcome::Viewing => {
                        screen.editor = Default::default();
                        self.set_status("Edit cancelled.", StatusKind::Info);
                    }
                    BackOutcome::Editing => {}
                }
            }
            KeyCode::Tab => {
                let consumed = screen.editor.has_active_suggestion()
                    && match screen.detail.form_mut() {
                        Some(form) => screen.editor.accept_suggestion(form),
                        None => false,
                    };
                if !consumed {
                    screen.editor.focus_next();
                }
                screen.refresh_suggestion();
            }
            KeyCode::BackTab | KeyCode::Up => {
                screen.editor.focus_previous();
                screen.refresh_suggestion();
            }
            KeyCode::Down => {
                screen.editor.focus_next();
                screen.refresh_suggestion();
            }
            KeyCode::Right => {
                screen.editor.cycle_suggestion(true);
            }
            KeyCode::Left => {
                screen.editor.cycle_suggestion(false);
            }
            KeyCode::Backspace => {
                if let Some(form) = screen.detail.form_mut() {
                    screen.editor.backspace(form);
                }
                screen.refresh_suggestion();
            }
            KeyCode::Enter => self.save_detail(),
            KeyCode::Char(ch) => {
                if let Some(form) = screen.detail.form_mut() {
                    if screen.editor.push_char(form, ch) {
                        screen.editor.error = None;
                    }
                }
                screen.refresh_suggestion();
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    /// Persist the open form. Failures stay on screen next to the inputs.
    fn save_detail(&mut self) {
        let Screen::Detail(screen) = &mut self.screen else {
            return;
        };
        if screen.detail.mode() != DetailMode::Editing {
            return;
        }
        match screen.detail.save(&self.store) {
            Ok(()) => {
                screen.editor = Default::default();
                let title = screen
                    .detail
                    .book()
                    .map(|book| book.display_title())
                    .unwrap_or_default();
                self.set_status(format!("Saved {title}."), StatusKind::Info);
            }
            Err(err) => {
                let message = surface_error(&err);
                screen.editor.error = Some(message.clone());
                self.set_status(message, StatusKind::Error);
            }
        }
    }

    fn handle_confirm_delete(&mut self, code: KeyCode) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                let Screen::Detail(screen) = &mut self.screen else {
                    return Ok(Mode::Normal);
                };
                match screen.detail.delete(&self.store) {
                    Ok(outcome) => {
                        self.close_detail(outcome);
                        Ok(Mode::Normal)
                    }
                    Err(err) => {
                        self.set_status(surface_error(&err), StatusKind::Error);
                        Ok(Mode::ConfirmDelete)
                    }
                }
            }
            _ => Ok(Mode::ConfirmDelete),
        }
    }

    fn handle_confirm_return(&mut self, code: KeyCode) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => Ok(Mode::Normal),
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                let Screen::Detail(screen) = &mut self.screen else {
                    return Ok(Mode::Normal);
                };
                match screen.detail.return_book(&self.store) {
                    Ok(()) => self.set_status("Marked as returned.", StatusKind::Info),
                    Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
                }
                Ok(Mode::Normal)
            }
            _ => Ok(Mode::ConfirmReturn),
        }
    }

    fn handle_prompt(&mut self, code: KeyCode, mut prompt: TextPrompt) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Backspace => {
                prompt.backspace();
                Ok(Mode::Prompt(prompt))
            }
            KeyCode::Char(ch) => {
                prompt.push_char(ch);
                Ok(Mode::Prompt(prompt))
            }
            KeyCode::Enter => {
                let value = prompt.value.trim().to_string();
                match prompt.purpose {
                    PromptPurpose::Borrower => self.lend(&value),
                    PromptPurpose::ExportPath | PromptPurpose::ImportPath if value.is_empty() => {
                        self.set_status("Enter a file name.", StatusKind::Error);
                        return Ok(Mode::Prompt(prompt));
                    }
                    PromptPurpose::ExportPath => self.export(Path::new(&value)),
                    PromptPurpose::ImportPath => self.import(Path::new(&value)),
                }
                Ok(Mode::Normal)
            }
            _ => Ok(Mode::Prompt(prompt)),
        }
    }

    fn lend(&mut self, borrower: &str) {
        let Screen::Detail(screen) = &mut self.screen else {
            return;
        };
        match screen.detail.lend(&self.store, borrower) {
            Ok(true) => self.set_status(format!("Lent to {borrower}."), StatusKind::Info),
            Ok(false) => self.set_status("No borrower entered.", StatusKind::Info),
            Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
        }
    }

    fn export(&mut self, path: &Path) {
        match export_catalog(&self.store, path, &self.settings.export) {
            Ok(count) => self.set_status(
                format!("Exported {count} books to {}.", path.display()),
                StatusKind::Info,
            ),
            Err(SpreadsheetError::EmptyCatalog) => self.set_status(
                "The catalog is empty; nothing to export.",
                StatusKind::Warning,
            ),
            Err(err) => {
                tracing::error!("export failed: {err}");
                self.set_status(err.to_string(), StatusKind::Error)
            }
        }
    }

    fn import(&mut self, path: &Path) {
        match import_spreadsheet(&self.store, path, &self.settings.import) {
            Ok(report) => {
                let mut message = format!("Imported {} books.", report.inserted);
                if !report.unmatched.is_empty() {
                    message.push_str(&format!(" No column for: {}.", report.unmatched.join(", ")));
                }
                self.set_status(message, StatusKind::Info);
                self.refresh_catalog();
            }
            Err(err) => {
                tracing::error!("import failed: {err}");
                self.set_status(err.to_string(), StatusKind::Error)
            }
        }
    }

    fn handle_confirm_unsaved(
        &mut self,
        code: KeyCode,
        mut confirm: ConfirmUnsaved,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc => Ok(Mode::Normal),
            KeyCode::Left | KeyCode::Up | KeyCode::BackTab => {
                confirm.previous();
                Ok(Mode::ConfirmUnsaved(confirm))
            }
            KeyCode::Right | KeyCode::Down | KeyCode::Tab => {
                confirm.next();
                Ok(Mode::ConfirmUnsaved(confirm))
            }
            KeyCode::Enter => {
                let Screen::Detail(screen) = &mut self.screen else {
                    return Ok(Mode::Normal);
                };
                match screen.detail.resolve_unsaved(&self.store, confirm.selection) {
                    Ok(BackOutcome::Exit(outcome)) => self.close_detail(outcome),
                    Ok(BackOutcome::Viewing) => {
                        screen.editor = Default::default();
                        self.set_status("Changes discarded.", StatusKind::Info);
                    }
                    Ok(BackOutcome::Editing | BackOutcome::ConfirmUnsaved) => {}
                    Err(err) => {
                        let message = surface_error(&err);
                        screen.editor.error = Some(message.clone());
                        self.set_status(message, StatusKind::Error);
                    }
                }
                Ok(Mode::Normal)
            }
            _ => Ok(Mode::ConfirmUnsaved(confirm)),
        }
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match &self.screen {
            Screen::Catalog => self.draw_catalog(frame, content_area),
            Screen::Detail(screen) => self.draw_detail(frame, content_area, screen),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::ConfirmDelete => self.draw_confirm(
                frame,
                area,
                "Delete Book",
                &[
                    format!("Delete '{}' permanently?", self.open_title()),
                    "This cannot be undone.".to_string(),
                ],
            ),
            Mode::ConfirmReturn => self.draw_confirm(
                frame,
                area,
                "Return Book",
                &[format!("Mark '{}' as returned?", self.open_title())],
            ),
            Mode::Prompt(prompt) => self.draw_prompt(frame, area, prompt),
            Mode::ConfirmUnsaved(confirm) => self.draw_confirm_unsaved(frame, area, confirm),
            Mode::Normal | Mode::Searching => {}
        }
    }

    fn open_title(&self) -> String {
        match &self.screen {
            Screen::Detail(screen) => screen
                .detail
                .book()
                .map(|book| book.display_title())
                .unwrap_or_default(),
            Screen::Catalog => String::new(),
        }
    }

    fn draw_catalog(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(SEARCH_HEIGHT), Constraint::Min(1)])
            .split(area);

        let searching = matches!(self.mode, Mode::Searching);
        let search_style = if searching {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let search_block = Block::default()
            .borders(Borders::ALL)
            .title("Search")
            .border_style(search_style);
        let search = Paragraph::new(Line::from(vec![
            Span::raw("Search: "),
            Span::styled(self.catalog.query.clone(), search_style),
        ]))
        .block(search_block.clone());
        frame.render_widget(search, chunks[0]);

        if searching {
            let inner = search_block.inner(chunks[0]);
            let cursor_x =
                inner.x + "Search: ".len() as u16 + self.catalog.query.chars().count() as u16;
            frame.set_cursor_position((cursor_x, inner.y));
        }

        let view = &self.catalog.view;
        let title = match view.listing() {
            Listing::Welcome => "Library".to_string(),
            Listing::All => "All Books".to_string(),
            Listing::Search(query) => format!("Results for '{query}'"),
        };
        let title = if view.has_more() {
            format!("{title} · {} shown, more available", view.books().len())
        } else if !view.books().is_empty() {
            format!("{title} · {} shown", view.books().len())
        } else {
            title
        };
        let block = Block::default().borders(Borders::ALL).title(title);

        if view.listing() == &Listing::Welcome {
            let message = Paragraph::new(vec![
                Line::from(Span::styled(
                    "Welcome to your library.",
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(format!(
                    "Press / and type at least {MIN_QUERY_CHARS} characters to search, or 'a' to list every book."
                )),
            ])
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(block);
            frame.render_widget(message, chunks[1]);
            return;
        }

        if view.is_empty_result() {
            let message = Paragraph::new("No books found.")
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, chunks[1]);
            return;
        }

        let items: Vec<ListItem> = view
            .books()
            .iter()
            .enumerate()
            .map(|(idx, book)| ListItem::new(book_lines(book, idx == self.catalog.selected)))
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().fg(Color::Yellow));

        let mut list_state = ListState::default();
        list_state.select(Some(self.catalog.selected));
        frame.render_stateful_widget(list, chunks[1], &mut list_state);
    }

    fn draw_detail(&self, frame: &mut Frame, area: Rect, screen: &DetailScreen) {
        let view = screen.detail.presentation();
        let form = screen.detail.form();
        let block = Block::default().borders(Borders::ALL).title(view.header);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let mut lines: Vec<Line> = FormField::ALL
            .iter()
            .map(|field| screen.editor.build_line(form, *field, view.editable))
            .collect();
        lines.push(Line::from(""));

        if let Some(status) = &view.loan_status {
            let on_loan = screen.detail.book().is_some_and(|book| book.is_loaned);
            let style = if on_loan {
                Style::default().fg(Color::Magenta)
            } else {
                Style::default().fg(Color::Green)
            };
            lines.push(Line::from(vec![
                Span::raw(format!("{:>10}: ", "Status")),
                Span::styled(status.clone(), style),
            ]));
        }

        if let Some(error) = &screen.editor.error {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        }

        frame.render_widget(Paragraph::new(lines), inner);

        if view.editable && matches!(self.mode, Mode::Normal) {
            let active = screen.editor.active;
            let row = FormField::ALL
                .iter()
                .position(|field| *field == active)
                .unwrap_or_default() as u16;
            let cursor_x = inner.x + LABEL_WIDTH + form.value(active).chars().count() as u16;
            frame.set_cursor_position((cursor_x, inner.y + row));
        }
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        match (&self.screen, &self.mode) {
            (_, Mode::Prompt(_)) => key_hints(&[("Enter", "Confirm"), ("Esc", "Cancel")]),
            (_, Mode::ConfirmDelete | Mode::ConfirmReturn) => {
                key_hints(&[("y", "Yes"), ("n", "No")])
            }
            (_, Mode::ConfirmUnsaved(_)) => key_hints(&[
                ("←→", "Choose"),
                ("Enter", "Confirm"),
                ("Esc", "Keep Editing"),
            ]),
            (Screen::Catalog, Mode::Searching) => key_hints(&[
                ("type", "Search"),
                ("↑↓", "Select"),
                ("Enter", "Open"),
                ("Esc", "Done"),
            ]),
            (Screen::Catalog, _) => key_hints(&[
                ("/", "Search"),
                ("a", "All"),
                ("m", "More"),
                ("Enter", "Open"),
                ("n", "New"),
                ("i", "Import"),
                ("x", "Export"),
                ("q", "Quit"),
            ]),
            (Screen::Detail(screen), _) => {
                let view = screen.detail.presentation();
                let mut hints: Vec<(&str, &str)> = view
                    .actions
                    .iter()
                    .map(|action| match action {
                        DetailAction::Back => ("Esc", "Back"),
                        DetailAction::Edit => ("e", "Edit"),
                        DetailAction::Delete => ("d", "Delete"),
                        DetailAction::Loan(LoanAction::Lend) => ("l", "Lend"),
                        DetailAction::Loan(LoanAction::Return) => ("l", "Return"),
                        DetailAction::Save => ("Enter", "Save"),
                    })
                    .collect();
                if view.editable {
                    if screen.editor.suggestions.len() > 1 {
                        hints.push(("←→", "Suggestions"));
                    }
                    hints.push(("Tab", "Accept/Next"));
                } else {
                    hints.push(("q", "Quit"));
                }
                key_hints(&hints)
            }
        }
    }

    fn draw_confirm(&self, frame: &mut Frame, area: Rect, title: &str, message: &[String]) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(title.to_string())
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = message
            .iter()
            .map(|text| Line::from(text.clone()))
            .collect();
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Press Y to confirm or N / Esc to cancel.",
            Style::default().fg(Color::Gray),
        )));

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_prompt(&self, frame: &mut Frame, area: Rect, prompt: &TextPrompt) {
        let popup_area = centered_rect(60, 25, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(prompt.title()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(vec![
                Span::raw(prompt.label()),
                Span::styled(prompt.value.clone(), Style::default().fg(Color::Yellow)),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                "Enter to confirm • Esc to cancel",
                Style::default().fg(Color::Gray),
            )),
        ];
        frame.render_widget(Paragraph::new(lines), inner);

        let cursor_x =
            inner.x + prompt.label().len() as u16 + prompt.value.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn draw_confirm_unsaved(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmUnsaved) {
        let popup_area = centered_rect(70, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Unsaved Changes")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut option_spans = Vec::new();
        for (idx, label) in confirm.labels().iter().enumerate() {
            if idx > 0 {
                option_spans.push(Span::raw("   "));
            }
            let style = if confirm.selected_index() == idx {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            option_spans.push(Span::styled(*label, style));
        }

        let lines = vec![
            Line::from("You have unsaved changes. Save them before leaving?"),
            Line::from(""),
            Line::from(option_spans),
            Line::from(""),
            Line::from(Span::styled(
                "Use ←/→ to choose • Enter to confirm • Esc to keep editing",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }
}
