use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub download: DownloadSettings,
    #[serde(default)]
    pub limits: LimitSettings,
    #[serde(default)]
    pub normalize: NormalizeSettings,
    #[serde(default)]
    pub verifier: VerifierSettings,
    #[serde(default)]
    pub response: ResponseSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 3000 }

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: PathBuf,
    /// Where downloaded images are staged. Falls back to the OS temp dir.
    pub temp_dir: Option<PathBuf>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            uploads_dir: default_uploads_dir(),
            temp_dir: None,
        }
    }
}

impl StorageSettings {
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

fn default_uploads_dir() -> PathBuf { PathBuf::from("uploads") }

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadSettings {
    #[serde(default = "default_download_timeout")]
    pub timeout_secs: u64,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self { timeout_secs: default_download_timeout() }
    }
}

fn default_download_timeout() -> u64 { 30 }

#[derive(Debug, Clone, Deserialize)]
pub struct LimitSettings {
    #[serde(default = "default_max_bytes")]
    pub max_download_bytes: u64,
    #[serde(default = "default_max_bytes")]
    pub max_upload_bytes: u64,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            max_download_bytes: default_max_bytes(),
            max_upload_bytes: default_max_bytes(),
        }
    }
}

fn default_max_bytes() -> u64 { 10 * 1024 * 1024 }

#[derive(Debug, Clone, Deserialize)]
pub struct NormalizeSettings {
    #[serde(default = "default_normalize_size")]
    pub size: u32,
}

impl Default for NormalizeSettings {
    fn default() -> Self {
        Self { size: default_normalize_size() }
    }
}

fn default_normalize_size() -> u32 { 224 }

/// Which face-verification backend answers `verify` calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifierBackend {
    /// A DeepFace-compatible HTTP service
    #[default]
    Deepface,
    /// In-process ArcFace via ONNX Runtime (requires the `onnx` feature)
    Arcface,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifierSettings {
    #[serde(default)]
    pub backend: VerifierBackend,
    #[serde(default = "default_verifier_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_verifier_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_detector_backend")]
    pub detector_backend: String,
    #[serde(default = "default_model_path")]
    pub model_path: String,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl Default for VerifierSettings {
    fn default() -> Self {
        Self {
            backend: VerifierBackend::default(),
            endpoint: default_verifier_endpoint(),
            timeout_secs: default_verifier_timeout(),
            detector_backend: default_detector_backend(),
            model_path: default_model_path(),
            threshold: default_threshold(),
        }
    }
}

fn default_verifier_endpoint() -> String { "http://127.0.0.1:5005".to_string() }
fn default_verifier_timeout() -> u64 { 120 }
fn default_detector_backend() -> String { "opencv".to_string() }
fn default_model_path() -> String { "models/w600k_r50.onnx".to_string() }
// ArcFace cosine threshold
fn default_threshold() -> f64 { 0.68 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseSettings {
    /// Clamp `percentageMatch` to [0, 100]. Off by default: the raw value is reported.
    #[serde(default)]
    pub clamp_percentage: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with FACE__)
    /// 5. `PORT` and `DEEPFACE_URL` shorthands
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., FACE__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("FACE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = apply_env_shorthands(settings, |key| env::var(key).ok())?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("FACE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = apply_env_shorthands(settings, |key| env::var(key).ok())?;

        settings.try_deserialize()
    }
}

/// Apply the conventional `PORT` and `DEEPFACE_URL` variables on top of the layered config
fn apply_env_shorthands<F>(settings: Config, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = Config::builder().add_source(settings);

    if let Some(port) = lookup("PORT").and_then(|p| p.parse::<i64>().ok()) {
        builder = builder.set_override("server.port", port)?;
    }
    if let Some(endpoint) = lookup("DEEPFACE_URL") {
        builder = builder.set_override("verifier.endpoint", endpoint)?;
    }

    builder.build()
}
