//! Foundation types for keyloop.
//!
//! This crate contains the types shared by every keyloop crate: the error
//! enum, key events with their display names, and the loop configuration.

pub mod config;
pub mod error;
pub mod input;
