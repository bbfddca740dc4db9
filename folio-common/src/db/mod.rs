//! Database access for the local cache

pub mod init;

pub use init::{init_database, init_in_memory};
