//! Question bank
//!
//! Generated questions, the sanitizer that recovers them from provider text,
//! and the dispenser that hands them out at most once.

pub mod dispenser;
#[cfg(test)]
mod dispenser_tests;
pub mod item;
pub mod sanitize;

pub use dispenser::{BankDispenser, Dispensed, RefillOutcome, UnavailableReason};
pub use item::{GeneratedItem, ItemError, OPTION_COUNT};
pub use sanitize::{sanitize, MalformedContent};
