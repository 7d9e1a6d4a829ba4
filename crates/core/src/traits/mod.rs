//! Core traits for Oneul.
//!
//! Traits are organized by collaborator:
//! - `vision`: emotion classification of images (EmotionClassifier)
//! - `audio`: audio retrieval and shout detection (AudioSource, ShoutDetector)
//! - `store`: object storage for uploads (MediaStore)

pub mod audio;
pub mod store;
pub mod vision;

pub use audio::*;
pub use store::*;
pub use vision::*;
