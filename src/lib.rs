// Public API for the binary and integration tests

pub mod backend;
pub mod config;
pub mod confirm;
pub mod draw;
pub mod error;
pub mod flag;
pub mod link;
pub mod lobby;
pub mod membership;
pub mod poller;
pub mod protocol;
pub mod session;
pub mod store;
pub mod types;
