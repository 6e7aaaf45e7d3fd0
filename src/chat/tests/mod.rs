//! Unit tests for the conversation subsystem.
//!
//! Tests are organised by concept, covering happy paths, error cases,
//! and edge cases for all public APIs.

mod correction_tests;
mod dedup_tests;
mod stanza_tests;
mod upload_tests;
