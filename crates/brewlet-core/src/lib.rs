pub mod config;
pub mod logging;

pub mod audit;
pub mod cache;
pub mod checksum;
pub mod error;
pub mod fetch;
pub mod formula;
pub mod fs;
pub mod install_db;
pub mod installer;
pub mod keg;
pub mod layout;
pub mod receipt;
pub mod retry;
pub mod stage;
pub mod url_model;
