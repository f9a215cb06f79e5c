use std::collections::HashMap;

use anyhow::Result;

use crate::catalog::CatalogView;
use crate::db::Store;
use crate::detail::BookDetail;
use crate::models::{Book, LookupField};
use crate::settings::PagingSettings;

use super::forms::FieldEditor;

/// The searchable book list plus the cursor over it.
pub(crate) struct CatalogScreen {
    pub(crate) view: CatalogView,
    pub(crate) query: String,
    pub(crate) selected: usize,
}

impl CatalogScreen {
    pub(crate) fn new(paging: PagingSettings) -> Self {
        Self {
            view: CatalogView::new(paging),
            query: String::new(),
            selected: 0,
        }
    }

    pub(crate) fn current_book(&self) -> Option<&Book> {
        self.view.books().get(self.selected)
    }

    /// Push the edited query to the controller. The cursor returns to the top
    /// whenever the list is replaced.
    pub(crate) fn apply_query(&mut self, store: &Store) -> Result<()> {
        let before = self.view.listing().clone();
        self.view.set_query(store, &self.query)?;
        if self.view.listing() != &before || self.view.books().is_empty() {
            self.selected = 0;
        }
        Ok(())
    }

    pub(crate) fn show_all(&mut self, store: &Store) -> Result<()> {
        self.query.clear();
        self.view.show_all(store)?;
        self.selected = 0;
        Ok(())
    }

    /// Append the next page and move the cursor onto its first entry.
    pub(crate) fn load_more(&mut self, store: &Store) -> Result<usize> {
        let before = self.view.books().len();
        self.view.load_more(store)?;
        let added = self.view.books().len() - before;
        if added > 0 {
            self.selected = before;
        }
        Ok(added)
    }

    /// Re-run the listing after the detail screen closed.
    pub(crate) fn refresh(&mut self, store: &Store) -> Result<()> {
        self.view.refresh(store)?;
        self.ensure_in_bounds();
        Ok(())
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        let len = self.view.books().len();
        if len == 0 {
            return;
        }
        let new = (self.selected as isize + offset).clamp(0, len as isize - 1);
        self.selected = new as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.view.books().len().saturating_sub(1);
    }

    fn ensure_in_bounds(&mut self) {
        let len = self.view.books().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }
}

/// One open book, together with form focus and the autocomplete sources
/// loaded when editing started.
pub(crate) struct DetailScreen {
    pub(crate) detail: BookDetail,
    pub(crate) editor: FieldEditor,
    pub(crate) lookups: HashMap<LookupField, Vec<String>>,
}

impl DetailScreen {
    pub(crate) fn new(detail: BookDetail) -> Self {
        Self {
            detail,
            editor: FieldEditor::default(),
            lookups: HashMap::new(),
        }
    }

    /// Fetch suggestion lists for every autocompleted field. Failures only
    /// cost suggestions, so they are logged and skipped.
    pub(crate) fn load_lookups(&mut self, store: &Store) {
        self.lookups.clear();
        for field in LookupField::ALL {
            match store.distinct_values(field) {
                Ok(values) => {
                    self.lookups.insert(field, values);
                }
                Err(err) => tracing::warn!(?field, "autocomplete unavailable: {err:#}"),
            }
        }
    }

    /// Recompute the suggestions for the focused field.
    pub(crate) fn refresh_suggestion(&mut self) {
        let candidates = self
            .editor
            .active
            .lookup()
            .and_then(|field| self.lookups.get(&field))
            .map(Vec::as_slice)
            .unwrap_or_default();
        self.editor.update_suggestion(self.detail.form(), candidates);
    }
}
