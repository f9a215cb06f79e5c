//! Per-book detail screen state. A book is either being viewed or edited;
//! edits are compared against a snapshot taken when editing started, and the
//! store is only written on an explicit save, delete or loan change.
//!
//! Rendering lives elsewhere: `BookDetail::presentation` turns the current
//! state into the header, field mode and actions a front-end should show.

use anyhow::{anyhow, bail, Context, Result};

use crate::db::Store;
use crate::models::{Book, BookRecord, LookupField};

/// Editable fields, in on-screen order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FormField {
    #[default]
    Title,
    Author,
    Genre,
    Year,
    Publisher,
    Location,
    Language,
}

impl FormField {
    pub const ALL: [FormField; 7] = [
        FormField::Title,
        FormField::Author,
        FormField::Genre,
        FormField::Year,
        FormField::Publisher,
        FormField::Location,
        FormField::Language,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormField::Title => "Title",
            FormField::Author => "Author",
            FormField::Genre => "Genre",
            FormField::Year => "Year",
            FormField::Publisher => "Publisher",
            FormField::Location => "Location",
            FormField::Language => "Language",
        }
    }

    /// Autocomplete source for the field, if it has one.
    pub fn lookup(self) -> Option<LookupField> {
        match self {
            FormField::Title | FormField::Year => None,
            FormField::Author => Some(LookupField::Author),
            FormField::Genre => Some(LookupField::Genre),
            FormField::Publisher => Some(LookupField::Publisher),
            FormField::Location => Some(LookupField::Location),
            FormField::Language => Some(LookupField::Language),
        }
    }

    fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|field| *field == self)
            .unwrap_or_default()
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Raw text of every editable field, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookForm {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub year: String,
    pub publisher: String,
    pub location: String,
    pub language: String,
}

impl BookForm {
    /// Populate the form from an existing book.
    pub fn from_book(book: &Book) -> Self {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        Self {
            title: text(&book.title),
            author: text(&book.author),
            genre: text(&book.genre),
            year: book.year.map(|year| year.to_string()).unwrap_or_default(),
            publisher: text(&book.publisher),
            location: text(&book.location),
            language: text(&book.language),
        }
    }

    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::Title => &self.title,
            FormField::Author => &self.author,
            FormField::Genre => &self.genre,
            FormField::Year => &self.year,
            FormField::Publisher => &self.publisher,
            FormField::Location => &self.location,
            FormField::Language => &self.language,
        }
    }

    pub fn value_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::Title => &mut self.title,
            FormField::Author => &mut self.author,
            FormField::Genre => &mut self.genre,
            FormField::Year => &mut self.year,
            FormField::Publisher => &mut self.publisher,
            FormField::Location => &mut self.location,
            FormField::Language => &mut self.language,
        }
    }

    /// Validate and normalize the inputs. Blank fields become `None`; the
    /// year must be a whole number when present. Loan columns are left at
    /// their defaults for the caller to fill in.
    pub fn parse(&self) -> Result<BookRecord> {
        let text = |value: &str| {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };
        let year = match self.year.trim() {
            "" => None,
            raw => Some(
                raw.parse::<i64>()
                    .map_err(|_| anyhow!("Year must be a whole number."))?,
            ),
        };

        Ok(BookRecord {
            title: text(&self.title),
            author: text(&self.author),
            genre: text(&self.genre),
            year,
            publisher: text(&self.publisher),
            location: text(&self.location),
            language: text(&self.language),
            is_loaned: false,
            loaned_to: None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailMode {
    Viewing,
    Editing,
}

/// How the detail screen was left. Front-ends use it to decide whether the
/// list they return to needs refreshing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailExit {
    /// Left without writing anything in this step.
    Returned,
    Saved,
    Discarded,
    Deleted,
}

/// Result of asking to go back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackOutcome {
    Exit(DetailExit),
    /// Editing ended and the book is shown read-only again.
    Viewing,
    /// Still editing.
    Editing,
    /// Unsaved edits: the caller must ask save / discard / stay.
    ConfirmUnsaved,
}

/// Answer to the unsaved-changes prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsavedChoice {
    Save,
    Discard,
    Stay,
}

/// What the loan button does for the current book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanAction {
    /// Ask for a borrower name, then lend.
    Lend,
    /// Ask for confirmation, then mark returned.
    Return,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailAction {
    Back,
    Edit,
    Delete,
    Loan(LoanAction),
    Save,
}

/// Everything a front-end needs to draw the detail screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presentation {
    pub header: &'static str,
    pub editable: bool,
    pub actions: Vec<DetailAction>,
    pub loan_status: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BookDetail {
    /// `None` while a new book has not been saved yet.
    book: Option<Book>,
    mode: DetailMode,
    form: BookForm,
    baseline: BookForm,
}

impl BookDetail {
    /// Start editing a brand new, not yet persisted, book.
    pub fn new_book() -> Self {
        Self {
            book: None,
            mode: DetailMode::Editing,
            form: BookForm::default(),
            baseline: BookForm::default(),
        }
    }

    /// Show an existing book read-only.
    pub fn open(book: Book) -> Self {
        let form = BookForm::from_book(&book);
        Self {
            book: Some(book),
            mode: DetailMode::Viewing,
            baseline: form.clone(),
            form,
        }
    }

    pub fn mode(&self) -> DetailMode {
        self.mode
    }

    pub fn book(&self) -> Option<&Book> {
        self.book.as_ref()
    }

    pub fn is_new(&self) -> bool {
        self.book.is_none()
    }

    pub fn form(&self) -> &BookForm {
        &self.form
    }

    /// Mutable access to the live inputs, only while editing.
    pub fn form_mut(&mut self) -> Option<&mut BookForm> {
        match self.mode {
            DetailMode::Editing => Some(&mut self.form),
            DetailMode::Viewing => None,
        }
    }

    /// Whether the inputs differ from the snapshot taken when editing began.
    pub fn is_dirty(&self) -> bool {
        self.mode == DetailMode::Editing && self.form != self.baseline
    }

    /// Viewing → Editing. Snapshots the current values as the dirty-check
    /// baseline. Returns `false` when already editing.
    pub fn begin_edit(&mut self) -> bool {
        if self.mode == DetailMode::Editing {
            return false;
        }
        self.baseline = self.form.clone();
        self.mode = DetailMode::Editing;
        true
    }

    /// Back navigation. Clean edits end quietly; dirty ones need a decision.
    pub fn request_back(&mut self) -> BackOutcome {
        match self.mode {
            DetailMode::Viewing => BackOutcome::Exit(DetailExit::Returned),
            DetailMode::Editing if self.is_dirty() => BackOutcome::ConfirmUnsaved,
            DetailMode::Editing => self.leave_editing(),
        }
    }

    /// Apply the answer to the unsaved-changes prompt. A failed save keeps the
    /// screen in editing mode with every input intact.
    pub fn resolve_unsaved(
        &mut self,
        store: &Store,
        choice: UnsavedChoice,
    ) -> Result<BackOutcome> {
        match choice {
            UnsavedChoice::Save => {
                self.save(store)?;
                Ok(BackOutcome::Exit(DetailExit::Saved))
            }
            UnsavedChoice::Discard => Ok(self.leave_editing()),
            UnsavedChoice::Stay => Ok(BackOutcome::Editing),
        }
    }

    fn leave_editing(&mut self) -> BackOutcome {
        if self.is_new() {
            return BackOutcome::Exit(DetailExit::Discarded);
        }
        self.form = self.baseline.clone();
        self.mode = DetailMode::Viewing;
        BackOutcome::Viewing
    }

    /// Persist the form. New books are inserted and receive their id;
    /// existing ones are fully updated, carrying the loan columns forward
    /// since the form does not expose them. On success the screen returns to
    /// viewing with the saved values as the new baseline.
    pub fn save(&mut self, store: &Store) -> Result<()> {
        if self.mode != DetailMode::Editing {
            bail!("Nothing to save.");
        }
        let mut record = self.form.parse()?;

        let book = match &self.book {
            None => {
                let id = store.add(&record).context("Could not add the book.")?;
                record.with_id(id)
            }
            Some(existing) => {
                record.is_loaned = existing.is_loaned;
                record.loaned_to = existing.loaned_to.clone();
                store
                    .update(existing.id, &record)
                    .context("Could not save the book.")?;
                record.with_id(existing.id)
            }
        };

        tracing::info!(id = book.id, "detail saved");
        self.form = BookForm::from_book(&book);
        self.baseline = self.form.clone();
        self.book = Some(book);
        self.mode = DetailMode::Viewing;
        Ok(())
    }

    /// Whether delete may be offered (existing book, read-only mode).
    pub fn can_delete(&self) -> bool {
        self.mode == DetailMode::Viewing && self.book.is_some()
    }

    /// Delete the book after the user confirmed. There is no undo.
    pub fn delete(&mut self, store: &Store) -> Result<DetailExit> {
        if !self.can_delete() {
            bail!("Only saved books can be deleted.");
        }
        if let Some(book) = &self.book {
            store.delete(book.id)?;
        }
        Ok(DetailExit::Deleted)
    }

    /// Which loan step applies right now, if any.
    pub fn loan_action(&self) -> Option<LoanAction> {
        match (&self.book, self.mode) {
            (Some(book), DetailMode::Viewing) if book.is_loaned => Some(LoanAction::Return),
            (Some(_), DetailMode::Viewing) => Some(LoanAction::Lend),
            _ => None,
        }
    }

    /// Lend the book to `borrower`. A blank name is a no-op and returns
    /// `false`. The in-memory book is updated without re-reading the store.
    pub fn lend(&mut self, store: &Store, borrower: &str) -> Result<bool> {
        if self.loan_action() != Some(LoanAction::Lend) {
            bail!("This book cannot be lent right now.");
        }
        let borrower = borrower.trim();
        if borrower.is_empty() {
            return Ok(false);
        }
        let book = self.book.as_mut().ok_or_else(|| anyhow!("No book loaded."))?;
        book.is_loaned = store.toggle_loan(book.id, false, Some(borrower))?;
        book.loaned_to = Some(borrower.to_string());
        Ok(true)
    }

    /// Mark the book as returned after the user confirmed.
    pub fn return_book(&mut self, store: &Store) -> Result<()> {
        if self.loan_action() != Some(LoanAction::Return) {
            bail!("This book is not on loan.");
        }
        let book = self.book.as_mut().ok_or_else(|| anyhow!("No book loaded."))?;
        book.is_loaned = store.toggle_loan(book.id, true, None)?;
        book.loaned_to = None;
        Ok(())
    }

    /// Pure mapping from state to what the screen shows.
    pub fn presentation(&self) -> Presentation {
        let loan_status = self.book.as_ref().map(Book::loan_status);
        match (self.mode, self.book.is_some()) {
            (DetailMode::Viewing, _) => {
                let mut actions = vec![
                    DetailAction::Back,
                    DetailAction::Edit,
                    DetailAction::Delete,
                ];
                if let Some(loan) = self.loan_action() {
                    actions.push(DetailAction::Loan(loan));
                }
                Presentation {
                    header: "Book details",
                    editable: false,
                    actions,
                    loan_status,
                }
            }
            (DetailMode::Editing, existing) => Presentation {
                header: if existing { "Edit book" } else { "New book" },
                editable: true,
                actions: vec![DetailAction::Back, DetailAction::Save],
                loan_status,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, Store) {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("library.db"));
        store.initialize().unwrap();
        (dir, store)
    }

    fn stored_dune(store: &Store) -> Book {
        let id = store
            .add(&BookRecord {
                title: Some("Dune".into()),
                author: Some("Herbert".into()),
                year: Some(1965),
                ..BookRecord::default()
            })
            .unwrap();
        store.get(id).unwrap().unwrap()
    }

    #[test]
    fn field_focus_cycles_in_both_directions() {
        assert_eq!(FormField::Title.next(), FormField::Author);
        assert_eq!(FormField::Language.next(), FormField::Title);
        assert_eq!(FormField::Title.previous(), FormField::Language);
        assert_eq!(FormField::Year.lookup(), None);
        assert_eq!(FormField::Genre.lookup(), Some(LookupField::Genre));
    }

    #[test]
    fn form_parse_trims_and_validates_year() {
        let mut form = BookForm {
            title: "  Dune ".into(),
            year: " 1965".into(),
            ..BookForm::default()
        };
        let record = form.parse().unwrap();
        assert_eq!(record.title.as_deref(), Some("Dune"));
        assert_eq!(record.year, Some(1965));
        assert_eq!(record.author, None);

        form.year = "sixties".into();
        assert!(form.parse().is_err());
    }

    #[test]
    fn existing_book_opens_read_only() {
        let (_dir, store) = store();
        let detail = BookDetail::open(stored_dune(&store));

        assert_eq!(detail.mode(), DetailMode::Viewing);
        let view = detail.presentation();
        assert_eq!(view.header, "Book details");
        assert!(!view.editable);
        assert_eq!(
            view.actions,
            [
                DetailAction::Back,
                DetailAction::Edit,
                DetailAction::Delete,
                DetailAction::Loan(LoanAction::Lend)
            ]
        );
        assert_eq!(view.loan_status.as_deref(), Some("Available"));
    }

    #[test]
    fn new_book_starts_editing_without_loan_status() {
        let detail = BookDetail::new_book();
        let view = detail.presentation();
        assert_eq!(detail.mode(), DetailMode::Editing);
        assert_eq!(view.header, "New book");
        assert!(view.editable);
        assert_eq!(view.actions, [DetailAction::Back, DetailAction::Save]);
        assert_eq!(view.loan_status, None);
    }

    #[test]
    fn clean_back_from_edit_returns_to_viewing() {
        let (_dir, store) = store();
        let mut detail = BookDetail::open(stored_dune(&store));

        assert!(detail.begin_edit());
        assert!(!detail.is_dirty());
        assert_eq!(detail.request_back(), BackOutcome::Viewing);
        assert_eq!(detail.mode(), DetailMode::Viewing);
    }

    #[test]
    fn clean_back_from_new_book_abandons_it() {
        let mut detail = BookDetail::new_book();
        assert_eq!(
            detail.request_back(),
            BackOutcome::Exit(DetailExit::Discarded)
        );
    }

    #[test]
    fn dirty_back_asks_and_stay_keeps_edits() {
        let (_dir, store) = store();
        let mut detail = BookDetail::open(stored_dune(&store));
        detail.begin_edit();
        detail.form_mut().unwrap().title.push_str(" Messiah");

        assert_eq!(detail.request_back(), BackOutcome::ConfirmUnsaved);
        assert_eq!(
            detail.resolve_unsaved(&store, UnsavedChoice::Stay).unwrap(),
            BackOutcome::Editing
        );
        assert_eq!(detail.form().title, "Dune Messiah");
        assert!(detail.is_dirty());
    }

    #[test]
    fn discard_reverts_to_the_snapshot() {
        let (_dir, store) = store();
        let mut detail = BookDetail::open(stored_dune(&store));
        detail.begin_edit();
        detail.form_mut().unwrap().author = "Someone Else".into();

        assert_eq!(
            detail.resolve_unsaved(&store, UnsavedChoice::Discard).unwrap(),
            BackOutcome::Viewing
        );
        assert_eq!(detail.form().author, "Herbert");
        let id = detail.book().unwrap().id;
        assert_eq!(store.get(id).unwrap().unwrap().author.as_deref(), Some("Herbert"));
    }

    #[test]
    fn discarding_a_new_book_persists_nothing() {
        let (_dir, store) = store();
        let mut detail = BookDetail::new_book();
        detail.form_mut().unwrap().title = "Draft".into();

        assert_eq!(detail.request_back(), BackOutcome::ConfirmUnsaved);
        assert_eq!(
            detail.resolve_unsaved(&store, UnsavedChoice::Discard).unwrap(),
            BackOutcome::Exit(DetailExit::Discarded)
        );
        assert!(store.list(50, 0).unwrap().is_empty());
    }

    #[test]
    fn saving_a_new_book_assigns_an_id_and_shows_it() {
        let (_dir, store) = store();
        let mut detail = BookDetail::new_book();
        {
            let form = detail.form_mut().unwrap();
            form.title = "Emma".into();
            form.year = "1815".into();
        }

        detail.save(&store).unwrap();

        assert_eq!(detail.mode(), DetailMode::Viewing);
        let book = detail.book().unwrap().clone();
        assert!(!book.is_loaned);
        assert_eq!(store.get(book.id).unwrap().unwrap(), book);
        assert_eq!(detail.presentation().header, "Book details");
    }

    #[test]
    fn save_then_exit_keeps_loan_columns() {
        let (_dir, store) = store();
        let dune = stored_dune(&store);
        store.toggle_loan(dune.id, false, Some("Alice")).unwrap();
        let mut detail = BookDetail::open(store.get(dune.id).unwrap().unwrap());

        detail.begin_edit();
        detail.form_mut().unwrap().genre = "Sci-Fi".into();
        assert_eq!(
            detail.resolve_unsaved(&store, UnsavedChoice::Save).unwrap(),
            BackOutcome::Exit(DetailExit::Saved)
        );

        let stored = store.get(dune.id).unwrap().unwrap();
        assert_eq!(stored.genre.as_deref(), Some("Sci-Fi"));
        assert!(stored.is_loaned);
        assert_eq!(stored.loaned_to.as_deref(), Some("Alice"));
    }

    #[test]
    fn save_and_leave_persists_a_new_book() {
        let (_dir, store) = store();
        let mut detail = BookDetail::new_book();
        {
            let form = detail.form_mut().unwrap();
            form.title = "Dune".into();
            form.author = "Herbert".into();
        }
        assert_eq!(detail.request_back(), BackOutcome::ConfirmUnsaved);

        assert_eq!(
            detail.resolve_unsaved(&store, UnsavedChoice::Save).unwrap(),
            BackOutcome::Exit(DetailExit::Saved)
        );

        let books = store.list(50, 0).unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title.as_deref(), Some("Dune"));
        assert_eq!(books[0].author.as_deref(), Some("Herbert"));
        assert!(!books[0].is_loaned);
        assert_eq!(detail.book().map(|book| book.id), Some(books[0].id));
    }

    #[test]
    fn failed_save_stays_in_edit_mode_with_input_intact() {
        let (_dir, store) = store();
        let mut detail = BookDetail::open(stored_dune(&store));
        detail.begin_edit();
        detail.form_mut().unwrap().year = "nineteen".into();

        assert!(detail.save(&store).is_err());
        assert_eq!(detail.mode(), DetailMode::Editing);
        assert_eq!(detail.form().year, "nineteen");
        assert!(detail.is_dirty());
    }

    #[test]
    fn store_failure_on_save_keeps_edits() {
        let dir = TempDir::new().unwrap();
        // Never initialized, so the books table does not exist.
        let broken = Store::new(dir.path().join("missing.db"));
        let mut detail = BookDetail::new_book();
        detail.form_mut().unwrap().title = "Lost?".into();

        assert!(detail.save(&broken).is_err());
        assert_eq!(detail.mode(), DetailMode::Editing);
        assert!(detail.is_new());
        assert_eq!(detail.form().title, "Lost?");
    }

    #[test]
    fn delete_removes_from_store() {
        let (_dir, store) = store();
        let book = stored_dune(&store);
        let mut detail = BookDetail::open(book.clone());

        assert_eq!(detail.delete(&store).unwrap(), DetailExit::Deleted);
        assert!(store.get(book.id).unwrap().is_none());
    }

    #[test]
    fn delete_is_refused_while_editing() {
        let (_dir, store) = store();
        let mut detail = BookDetail::open(stored_dune(&store));
        detail.begin_edit();
        assert!(!detail.can_delete());
        assert!(detail.delete(&store).is_err());
    }

    #[test]
    fn lending_and_returning_update_the_snapshot() {
        let (_dir, store) = store();
        let mut detail = BookDetail::open(stored_dune(&store));

        assert!(!detail.lend(&store, "   ").unwrap());
        assert_eq!(detail.loan_action(), Some(LoanAction::Lend));

        assert!(detail.lend(&store, "Alice").unwrap());
        assert_eq!(detail.loan_action(), Some(LoanAction::Return));
        assert_eq!(
            detail.presentation().loan_status.as_deref(),
            Some("On loan (Alice)")
        );

        detail.return_book(&store).unwrap();
        let book = detail.book().unwrap();
        assert!(!book.is_loaned);
        assert_eq!(book.loaned_to, None);
        assert_eq!(store.get(book.id).unwrap().unwrap().loaned_to, None);
    }

    #[test]
    fn loan_actions_are_unavailable_while_editing() {
        let (_dir, store) = store();
        let mut detail = BookDetail::open(stored_dune(&store));
        detail.begin_edit();
        assert_eq!(detail.loan_action(), None);
        assert!(detail.lend(&store, "Alice").is_err());
    }
}
