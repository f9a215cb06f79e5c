//! Catalog list state: what is being listed (nothing, a search, or
//! everything), how far the user has paged, and the books accumulated so far.
//! Every page comes straight from the store; nothing is cached between
//! refreshes.

use anyhow::Result;

use crate::db::Store;
use crate::models::Book;
use crate::settings::PagingSettings;

/// Searches start once the query is longer than this many characters.
pub const MIN_QUERY_CHARS: usize = 3;

/// What the list is currently showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    /// Neutral start state; nothing is listed until the user searches or asks
    /// for everything.
    Welcome,
    Search(String),
    All,
}

#[derive(Debug, Clone)]
pub struct CatalogView {
    paging: PagingSettings,
    listing: Listing,
    /// Offset of the most recently fetched page.
    offset: usize,
    /// Size requested for the most recently fetched page.
    page_size: usize,
    books: Vec<Book>,
    has_more: bool,
}

impl CatalogView {
    pub fn new(paging: PagingSettings) -> Self {
        Self {
            paging,
            listing: Listing::Welcome,
            offset: 0,
            page_size: paging.initial_size,
            books: Vec::new(),
            has_more: false,
        }
    }

    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    /// A full last page is the only hint that more rows may exist.
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// True when a search or full listing ran and found nothing.
    pub fn is_empty_result(&self) -> bool {
        self.listing != Listing::Welcome && self.books.is_empty()
    }

    /// React to the search box changing. Clearing it returns to the welcome
    /// state; one or two characters leave the current list alone; anything
    /// longer restarts at the first page of results.
    pub fn set_query(&mut self, store: &Store, query: &str) -> Result<()> {
        if query.trim().is_empty() {
            self.show_welcome();
            return Ok(());
        }
        if query.chars().count() < MIN_QUERY_CHARS {
            return Ok(());
        }
        self.load_first_page(store, Listing::Search(query.to_string()))
    }

    /// List the whole catalog from the first page.
    pub fn show_all(&mut self, store: &Store) -> Result<()> {
        self.load_first_page(store, Listing::All)
    }

    /// Clear the list and go back to the neutral state.
    pub fn show_welcome(&mut self) {
        self.listing = Listing::Welcome;
        self.offset = 0;
        self.page_size = self.paging.initial_size;
        self.books.clear();
        self.has_more = false;
    }

    /// Fetch the next page and append it to what is already shown. Pages are
    /// appended as-is; rows shifted by concurrent writes can repeat or be
    /// skipped.
    pub fn load_more(&mut self, store: &Store) -> Result<()> {
        if self.listing == Listing::Welcome || !self.has_more {
            return Ok(());
        }
        let offset = self.offset + self.page_size;
        let limit = self.paging.more_size;
        let page = fetch(store, &self.listing, limit, offset)?;

        tracing::debug!(offset, limit, returned = page.len(), "loaded more books");
        self.offset = offset;
        self.page_size = limit;
        self.has_more = page.len() == limit;
        self.books.extend(page);
        Ok(())
    }

    /// Re-run the current listing from its first page, e.g. after a delete.
    pub fn refresh(&mut self, store: &Store) -> Result<()> {
        match self.listing.clone() {
            Listing::Welcome => Ok(()),
            listing => self.load_first_page(store, listing),
        }
    }

    fn load_first_page(&mut self, store: &Store, listing: Listing) -> Result<()> {
        let limit = self.paging.initial_size;
        let page = fetch(store, &listing, limit, 0)?;

        self.listing = listing;
        self.offset = 0;
        self.page_size = limit;
        self.has_more = page.len() == limit;
        self.books = page;
        Ok(())
    }
}

fn fetch(store: &Store, listing: &Listing, limit: usize, offset: usize) -> Result<Vec<Book>> {
    match listing {
        Listing::Welcome => Ok(Vec::new()),
        Listing::Search(query) => store.search(query, limit, offset),
        Listing::All => store.list(limit, offset),
    }
}
