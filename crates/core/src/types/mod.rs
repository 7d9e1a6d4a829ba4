//! Core type definitions for Oneul.
//!
//! Broken down into submodules: the emotion taxonomies, the shout detection
//! record, and media descriptors for uploads and classifier inputs.

pub mod emotion;
pub mod media;
pub mod shout;

pub use emotion::*;
pub use media::*;
pub use shout::*;
