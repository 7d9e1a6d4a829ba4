//! Vision model gateway for Oneul.
//!
//! This crate provides:
//! - The emotion classification prompt
//! - An OpenAI Responses API client implementing `EmotionClassifier`
//! - Strict validation of model replies against the closed taxonomies

pub mod openai;
pub mod prompt;
pub mod reply;

pub use openai::OpenAiVisionClient;
pub use reply::{extract_output_text, parse_emotion_reply, ResponsesReply};
