//! Core shared types for sweep.
//!
//! This crate is intentionally small and dependency-free.

pub mod fs;
pub mod indent;
pub mod text;

pub use text::{LineCol, LineIndex, TextRange};
