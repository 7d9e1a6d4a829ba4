#![deny(unused)]
//! Core types, traits, and error definitions for Oneul.
//!
//! This crate provides the closed emotion taxonomies, the shout detection
//! record, and the collaborator traits shared by the storage, model and
//! gateway crates.

pub mod config;
pub mod error;
pub mod mocks;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::*;
pub use types::*;
