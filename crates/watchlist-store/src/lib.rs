mod db;
mod store;

pub use db::WatchlistDb;
pub use store::SqliteWatchlistStore;
