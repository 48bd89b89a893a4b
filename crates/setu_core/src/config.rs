use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SetuConfig {
    pub api: ApiConfig,
    pub store: StoreConfig,
    pub plugin: PluginConfig,
    pub request: RequestConfig,
    pub onebot: Option<OneBotConfig>,
}

impl SetuConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: SetuConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if file doesn't exist, return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    /// Apply environment variable overrides on top of file-based config.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SETU_API_URL") {
            self.api.base_url = v;
        }
        if let Ok(v) = std::env::var("SETU_IMAGE_DIR") {
            self.store.image_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("SETU_PROFILE") {
            match v.parse() {
                Ok(profile) => self.plugin.profile = profile,
                Err(e) => tracing::warn!("Ignoring SETU_PROFILE: {}", e),
            }
        }
        if let Ok(v) = std::env::var("SETU_LOCK_SCOPE") {
            match v.parse() {
                Ok(scope) => self.store.lock_scope = scope,
                Err(e) => tracing::warn!("Ignoring SETU_LOCK_SCOPE: {}", e),
            }
        }
        // OneBot env overrides
        if let Ok(url) = std::env::var("ONEBOT_WS_URL") {
            let token = std::env::var("ONEBOT_ACCESS_TOKEN").ok();
            self.onebot = Some(OneBotConfig {
                ws_url: url,
                access_token: token,
            });
        }
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Endpoint receiving the JSON POST.
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.lolicon.app/setu/v2".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub image_dir: PathBuf,
    pub download_timeout_secs: u64,
    pub lock_scope: LockScope,
    /// Extensions (without the dot) reported by `list_images`.
    pub extensions: Vec<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            image_dir: PathBuf::from("imgs"),
            download_timeout_secs: 15,
            lock_scope: LockScope::PerFile,
            extensions: default_extensions(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    ["png", "jpg", "jpeg", "webp"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockScope {
    /// One lock for every operation on the directory.
    Global,
    /// Exclusive per filename; directory scans still exclude everything else.
    #[default]
    PerFile,
}

impl std::str::FromStr for LockScope {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "global" => Ok(Self::Global),
            "per_file" | "per-file" | "perfile" => Ok(Self::PerFile),
            other => Err(format!("unknown lock scope '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    pub profile: TriggerProfile,
    /// Pause between sending the image and deleting the local file.
    pub delete_delay_ms: u64,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            profile: TriggerProfile::Classic,
            delete_delay_ms: 1000,
        }
    }
}

/// Which revision of the trigger rules and reply wording is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerProfile {
    /// "色色"/"涩涩" for adult, "想要"/"我要" for filtered.
    #[default]
    Classic,
    /// Any trigger word requests an image; "健康" forces filtered mode.
    Qualifier,
}

impl std::str::FromStr for TriggerProfile {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "classic" => Ok(Self::Classic),
            "qualifier" => Ok(Self::Qualifier),
            other => Err(format!("unknown trigger profile '{}'", other)),
        }
    }
}

/// Fixed filters sent with every request; only `r18` varies per message.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    pub num: u32,
    pub tags: Vec<Vec<String>>,
    pub size: Vec<String>,
    pub uid: Vec<u64>,
    pub keyword: Option<String>,
    pub proxy: Option<String>,
    pub exclude_ai: Option<bool>,
    pub aspect_ratio: Option<String>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            num: 1,
            tags: vec![vec![], vec![]],
            size: vec![],
            uid: vec![],
            keyword: None,
            proxy: None,
            exclude_ai: Some(true),
            aspect_ratio: Some("gt1".to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OneBotConfig {
    pub ws_url: String,
    pub access_token: Option<String>,
}

// ============================================================================
// Tests
// ============================================================================
