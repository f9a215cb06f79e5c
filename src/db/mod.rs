//! Persistence module split across logical submodules. `Store` owns the path
//! to the SQLite file; the CRUD, search and lookup queries hang off it as
//! methods defined next to the SQL they run.

mod books;
mod connection;
mod lookups;

pub use connection::Store;
