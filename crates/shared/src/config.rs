//! Application configuration for ContentIQ.
//!
//! User config lives at `~/.contentiq/contentiq.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ContentIqError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "contentiq.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".contentiq";

// ---------------------------------------------------------------------------
// Config structs (matching contentiq.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// OpenAI settings (chat + embeddings).
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Firecrawl scraping backend settings.
    #[serde(default)]
    pub firecrawl: FirecrawlConfig,

    /// Knowledge store settings.
    #[serde(default)]
    pub store: StoreConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Character budget for content sent to enrichment prompts.
    #[serde(default = "default_content_budget")]
    pub content_budget: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            content_budget: default_content_budget(),
        }
    }
}

fn default_content_budget() -> usize {
    3000
}

/// `[openai]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_openai_key_env")]
    pub api_key_env: String,

    /// Chat-completion model for classification, enrichment, and answering.
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Embedding model for the knowledge store.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// API base URL (OpenAI-compatible).
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_openai_key_env(),
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
            base_url: default_openai_base_url(),
        }
    }
}

fn default_openai_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_chat_model() -> String {
    "gpt-4o-mini".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".into()
}

/// `[firecrawl]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirecrawlConfig {
    /// Name of the env var holding the API key.
    #[serde(default = "default_firecrawl_key_env")]
    pub api_key_env: String,

    /// Scraping API base URL.
    #[serde(default = "default_firecrawl_base_url")]
    pub base_url: String,
}

impl Default for FirecrawlConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_firecrawl_key_env(),
            base_url: default_firecrawl_base_url(),
        }
    }
}

fn default_firecrawl_key_env() -> String {
    "FIRECRAWL_API_KEY".into()
}
fn default_firecrawl_base_url() -> String {
    "https://api.firecrawl.dev".into()
}

/// `[store]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the persisted vector index.
    #[serde(default = "default_store_path")]
    pub path: String,

    /// Target chunk size in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in characters.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Number of chunks retrieved per query.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
        }
    }
}

fn default_store_path() -> String {
    "vector_store".into()
}
fn default_chunk_size() -> usize {
    1000
}
fn default_chunk_overlap() -> usize {
    200
}
fn default_top_k() -> usize {
    4
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.contentiq/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ContentIqError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.contentiq/contentiq.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ContentIqError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| ContentIqError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ContentIqError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ContentIqError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ContentIqError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the configured backend API key env vars are set and non-empty.
pub fn validate_api_keys(config: &AppConfig) -> Result<()> {
    for (var_name, hint) in [
        (&config.openai.api_key_env, "https://platform.openai.com/api-keys"),
        (&config.firecrawl.api_key_env, "https://firecrawl.dev"),
    ] {
        match std::env::var(var_name) {
            Ok(val) if !val.is_empty() => {}
            _ => {
                return Err(ContentIqError::config(format!(
                    "API key not found. Set the {var_name} environment variable.\n\
                     Get a key at {hint}"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("OPENAI_API_KEY"));
        assert!(toml_str.contains("FIRECRAWL_API_KEY"));
        assert!(toml_str.contains("chunk_size"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.store.chunk_size, 1000);
        assert_eq!(parsed.store.chunk_overlap, 200);
        assert_eq!(parsed.store.top_k, 4);
        assert_eq!(parsed.defaults.content_budget, 3000);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[store]
path = "/tmp/contentiq-store"

[openai]
chat_model = "gpt-4o"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.store.path, "/tmp/contentiq-store");
        assert_eq!(config.store.chunk_size, 1000);
        assert_eq!(config.openai.chat_model, "gpt-4o");
        assert_eq!(config.openai.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn api_key_validation() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.openai.api_key_env = "CIQ_TEST_NONEXISTENT_KEY_12345".into();
        let result = validate_api_keys(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }
}
