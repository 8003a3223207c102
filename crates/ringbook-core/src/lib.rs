//! Core types and trait definitions for the Ringbook phone directory.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; storage backends implement
//! [`store::DirectoryStore`] and the [`phonebook::Phonebook`] service runs
//! the search, registration and reporting flows on top of it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod directory;
pub mod error;
pub mod phone;
pub mod phonebook;
pub mod result;
pub mod search;
pub mod store;

pub use error::{Error, Result};
pub use phone::{CanonicalPhone, PhoneNormalizer};
pub use phonebook::Phonebook;
