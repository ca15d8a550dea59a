mod db;
mod recency;

pub use db::{Database, DatabaseError};
pub use recency::{
    BoundedRecencyStore, RecencyKey, SEARCH_HISTORY_CAPACITY, SEARCH_HISTORY_KEY,
    WATCH_HISTORY_CAPACITY, WATCH_HISTORY_KEY,
};
