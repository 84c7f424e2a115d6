//! Install history (SQLite via sqlx).
//!
//! One row per installed `name@version`, with the url and digest it was
//! installed from. The rows feed the release identity check.

pub mod db;
pub mod types;

mod installs;

pub use db::*;
pub use types::*;
