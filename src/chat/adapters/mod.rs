//! Adapter implementations of the conversation ports.

pub mod memory;
