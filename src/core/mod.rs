//! Core data model and shared infrastructure.
//!
//! This module contains the pieces every other layer depends on:
//! - [`key`] - Key normalization
//! - [`types`] - Entries, write options, change events
//! - [`error`] - Error taxonomy

pub mod error;
pub mod key;
pub mod types;
