//! Persistence layer
//!
//! SQLite-based storage for the question bank.

mod bank;
mod database;

pub use bank::{BankEntry, BankStore, CategoryStock};
pub use database::Database;
