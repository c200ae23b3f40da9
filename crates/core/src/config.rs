//! Configuration system for coursefinder.
//!
//! Config priority: explicit path > ./coursefinder.toml > user (~/.config/coursefinder/config.toml) > defaults.
//! Environment overrides are applied on top of whichever file was used.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "coursefinder.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("Failed to read config {path:?}: {source}")]
  Io { path: PathBuf, source: std::io::Error },
  #[error("Failed to parse config {path:?}: {source}")]
  Parse { path: PathBuf, source: toml::de::Error },
  #[error("Failed to serialize config: {0}")]
  Serialize(#[from] toml::ser::Error),
}

// ============================================================================
// Embedding Configuration
// ============================================================================

/// Embedding backend options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
  /// In-process sentence-embedding model
  #[default]
  Local,
  /// OpenAI-compatible embeddings API
  #[serde(rename = "openai", alias = "open_ai")]
  OpenAi,
}

impl EmbeddingProvider {
  pub fn default_model(&self) -> &'static str {
    match self {
      EmbeddingProvider::Local => "all-MiniLM-L6-v2",
      EmbeddingProvider::OpenAi => "text-embedding-3-small",
    }
  }

  pub fn default_dimensions(&self) -> usize {
    match self {
      EmbeddingProvider::Local => 384,
      EmbeddingProvider::OpenAi => 1536,
    }
  }
}

/// Embedding configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
  /// Which embedding backend to use. Fixed for the lifetime of the process.
  pub provider: EmbeddingProvider,

  /// Model name (e.g., "all-MiniLM-L6-v2", "text-embedding-3-small")
  pub model: String,

  /// Embedding dimensions (must match model output)
  pub dimensions: usize,

  /// Base URL of the OpenAI-compatible API (only used when provider = openai)
  pub api_base: String,

  /// API key (only used when provider = openai)
  /// If not set, reads from OPENAI_API_KEY env var
  #[serde(skip_serializing_if = "Option::is_none")]
  pub api_key: Option<String>,

  /// Maximum texts per remote request
  pub max_batch_size: usize,

  /// Timeout for a single remote request, in seconds
  pub request_timeout_secs: u64,

  /// Where the local model stores downloaded weights (default: model library default)
  #[serde(skip_serializing_if = "Option::is_none")]
  pub cache_dir: Option<PathBuf>,
}

impl Default for EmbeddingConfig {
  fn default() -> Self {
    Self::for_provider(EmbeddingProvider::default())
  }
}

impl EmbeddingConfig {
  /// Defaults for a specific provider
  pub fn for_provider(provider: EmbeddingProvider) -> Self {
    Self {
      provider,
      model: provider.default_model().to_string(),
      dimensions: provider.default_dimensions(),
      api_base: "https://api.openai.com/v1".to_string(),
      api_key: None,
      max_batch_size: 100,
      request_timeout_secs: 60,
      cache_dir: None,
    }
  }

  /// Switch provider, carrying model defaults along when they were left untouched.
  pub fn switch_provider(&mut self, provider: EmbeddingProvider) {
    if self.provider == provider {
      return;
    }
    if self.model == self.provider.default_model() {
      self.model = provider.default_model().to_string();
      self.dimensions = provider.default_dimensions();
    }
    self.provider = provider;
  }
}

// ============================================================================
// Search Configuration
// ============================================================================

/// Search defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
  /// Minimum cosine similarity for a course to be returned (default: 0.30)
  pub min_similarity: f64,

  /// Maximum number of courses per response (default: 5)
  pub max_results: usize,
}

impl Default for SearchConfig {
  fn default() -> Self {
    Self {
      min_similarity: 0.30,
      max_results: 5,
    }
  }
}

// ============================================================================
// Catalog & Logging Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
  /// JSON file holding the course catalog
  pub path: PathBuf,
}

impl Default for CatalogConfig {
  fn default() -> Self {
    Self {
      path: PathBuf::from("data").join("courses.json"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
  /// off, error, warn, info, debug or trace. RUST_LOG takes precedence.
  pub level: String,
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: "info".to_string(),
    }
  }
}

// ============================================================================
// Main Configuration
// ============================================================================

/// coursefinder configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Embedding backend settings
  #[serde(default)]
  pub embedding: EmbeddingConfig,

  /// Ranking thresholds
  #[serde(default)]
  pub search: SearchConfig,

  /// Dataset location
  #[serde(default)]
  pub catalog: CatalogConfig,

  /// Log verbosity
  #[serde(default)]
  pub logging: LoggingConfig,
}

impl Config {
  /// Load configuration, then apply environment overrides.
  ///
  /// An explicit path must exist and parse. Discovered files that fail to parse
  /// are skipped with a warning.
  pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
    let mut config = match explicit {
      Some(path) => Self::from_file(path)?,
      None => Self::discover(),
    };
    config.apply_env_overrides(|key| std::env::var(key).ok());
    Ok(config)
  }

  /// Read and parse a single config file.
  pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Files `load(None)` looks at, in priority order.
  fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
    paths.extend(Self::user_config_path());
    paths
  }

  /// The config file `load(None)` would use, if any exists.
  pub fn discovered_path() -> Option<PathBuf> {
    Self::candidate_paths().into_iter().find(|path| path.exists())
  }

  fn discover() -> Self {
    Self::discover_from(Self::candidate_paths())
  }

  /// First existing candidate wins. A file that fails to load is reported and
  /// replaced by the defaults.
  fn discover_from(candidates: impl IntoIterator<Item = PathBuf>) -> Self {
    let Some(path) = candidates.into_iter().find(|path| path.exists()) else {
      debug!("No config file found, using defaults");
      return Self::default();
    };

    match Self::from_file(&path) {
      Ok(config) => {
        debug!(path = %path.display(), "Loaded config");
        config
      }
      Err(e) => {
        warn!(path = %path.display(), err = %e, "Ignoring unreadable config file");
        Self::default()
      }
    }
  }

  /// Get the user-level config path
  pub fn user_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("CONFIG_DIR") {
      return Some(PathBuf::from(path).join("config.toml"));
    }

    if let Ok(path) = std::env::var("XDG_CONFIG_HOME") {
      return Some(PathBuf::from(path).join("coursefinder").join("config.toml"));
    }

    dirs::config_dir().map(|p: PathBuf| p.join("coursefinder").join("config.toml"))
  }

  /// Apply environment overrides using the given lookup.
  ///
  /// - `USE_OPENAI_EMBEDDING`: `true` selects the openai provider, `false` the local one
  /// - `OPENAI_API_KEY`: API key, only when none is configured
  /// - `COURSEFINDER_CATALOG`: catalog path
  pub fn apply_env_overrides<F>(&mut self, lookup: F)
  where
    F: Fn(&str) -> Option<String>,
  {
    if let Some(flag) = lookup("USE_OPENAI_EMBEDDING") {
      match flag.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => self.embedding.switch_provider(EmbeddingProvider::OpenAi),
        "false" | "0" | "no" => self.embedding.switch_provider(EmbeddingProvider::Local),
        other => warn!(value = other, "Ignoring unrecognized USE_OPENAI_EMBEDDING value"),
      }
    }

    if self.embedding.api_key.is_none()
      && let Some(key) = lookup("OPENAI_API_KEY").filter(|k| !k.is_empty())
    {
      debug!("OPENAI_API_KEY found in environment");
      self.embedding.api_key = Some(key);
    }

    if let Some(path) = lookup("COURSEFINDER_CATALOG").filter(|p| !p.is_empty()) {
      self.catalog.path = PathBuf::from(path);
    }
  }

  /// Render the effective configuration as TOML (API key redacted).
  pub fn to_toml(&self) -> Result<String, ConfigError> {
    let mut shown = self.clone();
    if shown.embedding.api_key.is_some() {
      shown.embedding.api_key = Some("<redacted>".to_string());
    }
    Ok(toml::to_string_pretty(&shown)?)
  }

  /// Generate a default config file as a string
  pub fn generate_template() -> String {
    let defaults = Self::default();
    format!(
      r#"# coursefinder configuration
# Place in ./{local} or ~/.config/coursefinder/config.toml

# ============================================================================
# Embedding Backend
# ============================================================================

[embedding]
# Provider: local (in-process model) or openai (remote API)
# Can also be switched with USE_OPENAI_EMBEDDING=true
provider = "local"

# Model name and output dimensions
#   local  -> all-MiniLM-L6-v2, 384
#   openai -> text-embedding-3-small, 1536
model = "{model}"
dimensions = {dimensions}

# OpenAI-compatible API base URL (openai provider)
api_base = "{api_base}"

# API key (openai provider). Can also be set via OPENAI_API_KEY env var
# api_key = "sk-..."

# Texts per remote request
max_batch_size = {max_batch_size}

# Per-request timeout in seconds
request_timeout_secs = {timeout}

# ============================================================================
# Search
# ============================================================================

[search]
# Courses below this cosine similarity are never returned
min_similarity = {min_similarity:.2}

# Maximum courses per response
max_results = {max_results}

# ============================================================================
# Catalog
# ============================================================================

[catalog]
# JSON array of course objects. Can also be set via COURSEFINDER_CATALOG
path = "{catalog}"

# ============================================================================
# Logging
# ============================================================================

[logging]
# off, error, warn, info, debug, trace (RUST_LOG overrides)
level = "{level}"
"#,
      local = LOCAL_CONFIG_FILE,
      model = defaults.embedding.model,
      dimensions = defaults.embedding.dimensions,
      api_base = defaults.embedding.api_base,
      max_batch_size = defaults.embedding.max_batch_size,
      timeout = defaults.embedding.request_timeout_secs,
      min_similarity = defaults.search.min_similarity,
      max_results = defaults.search.max_results,
      catalog = defaults.catalog.path.display(),
      level = defaults.logging.level,
    )
  }
}
