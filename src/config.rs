//! Runtime configuration.
//!
//! Values come from the process environment, optionally seeded from
//! `.env.local` / `.env` files. Nothing here fails: malformed values
//! are logged and replaced by their defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// OCR.space parse endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.ocr.space/parse/image";

/// Public demo key. Heavily rate-limited, only meant for trying things out.
pub const DEMO_API_KEY: &str = "helloworld";

/// Upper bound on a single OCR submission.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_LANGUAGE: &str = "eng";

/// `{output}` is replaced by the path the capture must be written to.
pub const DEFAULT_CAPTURE_COMMAND: &str = "libcamera-still --nopreview -o {output}";

/// Recognition engine selector sent as the `OCREngine` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OcrEngine {
    /// Faster, supports more languages.
    Engine1,
    /// Higher accuracy on photographed text.
    #[default]
    Engine2,
}

impl OcrEngine {
    pub fn as_field(self) -> &'static str {
        match self {
            OcrEngine::Engine1 => "1",
            OcrEngine::Engine2 => "2",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "1" => Some(OcrEngine::Engine1),
            "2" => Some(OcrEngine::Engine2),
            _ => None,
        }
    }
}

/// Platform capability flag. Decides how artifacts are stored and encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Platform {
    /// Artifacts are files on local disk.
    #[default]
    Native,
    /// Artifacts live in an in-memory blob store.
    Web,
}

impl Platform {
    /// The platform this build runs on, before any override.
    pub fn current() -> Self {
        if cfg!(target_arch = "wasm32") {
            Platform::Web
        } else {
            Platform::Native
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "native" => Some(Platform::Native),
            "web" => Some(Platform::Web),
            _ => None,
        }
    }
}

/// Everything the OCR client needs to build a request.
#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub endpoint: String,
    pub api_key: String,
    pub language: String,
    pub engine: OcrEngine,
    pub overlay_required: bool,
    pub detect_orientation: bool,
    pub scale: bool,
    pub is_table: bool,
    pub timeout: Duration,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: DEMO_API_KEY.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            engine: OcrEngine::default(),
            overlay_required: false,
            detect_orientation: true,
            scale: true,
            is_table: false,
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

impl OcrConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(key) = get("OCR_SPACE_API_KEY") {
            config.api_key = key;
        }
        if let Some(endpoint) = get("OCR_ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Some(language) = get("OCR_LANGUAGE") {
            config.language = language;
        }
        if let Some(raw) = get("OCR_ENGINE") {
            match OcrEngine::parse(&raw) {
                Some(engine) => config.engine = engine,
                None => log::warn!("[CONFIG] Unknown OCR_ENGINE {:?}, using engine 2", raw),
            }
        }
        config
    }

    pub fn uses_demo_key(&self) -> bool {
        self.api_key == DEMO_API_KEY
    }
}

/// Full application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub ocr: OcrConfig,
    pub platform: Platform,
    /// Directory for transient artifacts. Everything written here is deleted by the run that wrote it.
    pub capture_dir: PathBuf,
    pub capture_command: String,
    pub diag_log: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let platform = match get("SNAPTEXT_PLATFORM") {
            Some(raw) => Platform::parse(&raw).unwrap_or_else(|| {
                log::warn!("[CONFIG] Unknown SNAPTEXT_PLATFORM {:?}, detecting", raw);
                Platform::current()
            }),
            None => Platform::current(),
        };

        Self {
            ocr: OcrConfig::from_lookup(&lookup),
            platform,
            capture_dir: get("SNAPTEXT_CAPTURE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(default_capture_dir),
            capture_command: get("SNAPTEXT_CAPTURE_COMMAND")
                .unwrap_or_else(|| DEFAULT_CAPTURE_COMMAND.to_string()),
            diag_log: get("SNAPTEXT_DIAG_LOG").map(PathBuf::from),
        }
    }
}

fn default_capture_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("snaptext")
        .join("captures")
}

/// Load `.env.local`, falling back to `.env`, from `dir`.
///
/// Only the first file found is loaded. Variables already present in the
/// process environment win over file values.
pub fn load_env_files(dir: &Path) -> Option<PathBuf> {
    for env_file in [".env.local", ".env"] {
        let path = dir.join(env_file);
        if path.exists() {
            match dotenvy::from_path(&path) {
                Ok(_) => {
                    log::info!("[STARTUP] Loaded {}", path.display());
                    return Some(path);
                }
                Err(e) => log::warn!("[STARTUP] Failed to load {}: {}", path.display(), e),
            }
        }
    }
    None
}
