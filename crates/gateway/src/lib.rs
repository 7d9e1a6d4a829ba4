//! HTTP surface of the Oneuleun AI API.
//!
//! - `POST /context/` and `/context/upload`: image emotion classification
//! - `POST /analyze/` and `/analyze/upload`: shout detection on audio
//! - `GET /`, `/health`, `/metrics`

pub mod analyze;
pub mod audio;
pub mod context;
pub mod form;
pub mod response;
pub mod server;
pub mod shout;
pub mod validation;
pub mod vision;

pub use analyze::{AnalyzeRequest, AnalyzeResponse};
pub use audio::{AudioFormat, AudioProcessor, HttpAudioSource};
pub use context::{ContextRequest, ContextResponse};
pub use response::{ApiError, ErrorResponse};
pub use server::{AppState, GatewayConfig, GatewayServer};
pub use shout::{detect_shout, RmsShoutDetector};
pub use vision::{validate_image, ImageInfo, VisionProcessor};
