//! Storage gateway for Oneul.
//!
//! Uploads land under `<root>/<image|audio>/<session_id>/<uuid><ext>` and are
//! addressed by a public URL built from the configured base.

pub mod keys;
pub mod memory;
pub mod s3;

pub use keys::{public_url, KeyLayout};
pub use memory::InMemoryMediaStore;
pub use s3::S3MediaStore;
