use config::{Config, ConfigError, Environment, File};
use secrecy::Secret;
use serde::Deserialize;

/// Process-wide configuration, read once at startup.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub vision: VisionConfig,
    pub storage: StorageConfig,
    pub audio: AudioConfig,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct VisionConfig {
    pub api_key: Option<Secret<String>>,
    pub model: String,
    pub endpoint: String,
    pub timeout_ms: u64,
    pub temperature: f32,
    pub top_p: f32,
    /// Send uploaded images inline instead of by their public URL.
    pub inline_uploads: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub access_key_id: Option<Secret<String>>,
    pub secret_access_key: Option<Secret<String>>,
    pub endpoint: Option<String>,
    pub public_base: Option<String>,
    pub root_prefix: String,
    pub public_read: bool,
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AudioConfig {
    pub download_timeout_ms: u64,
    pub max_download_bytes: usize,
    pub detector: ShoutDetectorConfig,
}

/// Thresholds for the RMS window shout detector.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ShoutDetectorConfig {
    pub target_sample_rate: u32,
    pub window_ms: u32,
    pub hop_ms: u32,
    pub threshold_dbfs: f64,
    pub min_run_ms: u32,
    pub max_crest_db: f64,
    pub confidence: f64,
    /// Declared sample rates outside this range are rejected before decoding.
    pub min_sample_rate: u32,
    pub max_sample_rate: u32,
    /// Longest clip decoded; longer input is a detection error.
    pub max_duration_ms: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct TelemetryConfig {
    pub json_logs: bool,
}

/// Environment variables used by earlier deployments, mapped to config keys.
const LEGACY_ENV: &[(&str, &str)] = &[
    ("OPENAI_API_KEY", "vision.api_key"),
    ("OPENAI_VISION_MODEL", "vision.model"),
    ("AWS_ACCESS_KEY_ID", "storage.access_key_id"),
    ("AWS_SECRET_ACCESS_KEY", "storage.secret_access_key"),
    ("AWS_REGION", "storage.region"),
    ("S3_BUCKET_NAME", "storage.bucket"),
    ("S3_PUBLIC_BASE", "storage.public_base"),
    ("AWS_ENDPOINT_URL", "storage.endpoint"),
    ("HOST", "server.host"),
    ("PORT", "server.port"),
];

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ONEUL_ENV").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false))
            // Map APP__VISION__MODEL=gpt-4o to vision.model
            .add_source(Environment::with_prefix("APP").separator("__"));

        for (var, key) in LEGACY_ENV {
            let value = std::env::var(var).ok().filter(|v| !v.trim().is_empty());
            builder = builder.set_override_option(*key, value)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Whether uploaded images go to the provider inline. Forced on without a
    /// bucket, since in-memory URLs cannot be fetched by the provider.
    pub fn inline_uploads(&self) -> bool {
        self.vision.inline_uploads || self.storage.bucket.is_none()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            max_upload_bytes: 20 * 1024 * 1024, // 20MB
            allowed_origins: vec!["*".into()],
        }
    }
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-4o-mini".into(),
            endpoint: "https://api.openai.com/v1/responses".into(),
            timeout_ms: 30_000,
            temperature: 0.1,
            top_p: 0.8,
            inline_uploads: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            region: None,
            access_key_id: None,
            secret_access_key: None,
            endpoint: None,
            public_base: None,
            root_prefix: "oneuld".into(),
            public_read: true,
            timeout_ms: 30_000,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            download_timeout_ms: 30_000,
            max_download_bytes: 50 * 1024 * 1024, // 50MB
            detector: ShoutDetectorConfig::default(),
        }
    }
}

impl Default for ShoutDetectorConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 16_000,
            window_ms: 200,
            hop_ms: 100,
            threshold_dbfs: -10.0,
            min_run_ms: 600,
            max_crest_db: 18.0,
            confidence: 0.6,
            min_sample_rate: 4_000,
            max_sample_rate: 384_000,
            max_duration_ms: 10 * 60 * 1000,
        }
    }
}
