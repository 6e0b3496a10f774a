//! Application configuration for docground.
//!
//! User config lives at `~/.docground/docground.toml`.
//! CLI flags and environment variables override config file values, which
//! override defaults. Secrets never live in the file: each section names the
//! environment variable that holds them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocgroundError, Result};
use crate::types::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_PAGES, ProviderKind, TraversalLimits};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "docground.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".docground";

// ---------------------------------------------------------------------------
// Config structs (matching docground.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Query defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Confluence document store.
    #[serde(default)]
    pub confluence: ConfluenceConfig,

    /// Amazon Bedrock provider.
    #[serde(default)]
    pub bedrock: BedrockConfig,

    /// Google Gemini provider.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// GitLab Duo provider.
    #[serde(default)]
    pub gitlab_duo: GitLabDuoConfig,

    /// Sampling parameters shared by all providers.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// HTTP server.
    #[serde(default)]
    pub server: ServerConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Root page used when a request names none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_page_url: Option<String>,

    /// Default maximum traversal depth.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Default maximum number of pages per request.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Provider used when a request names none.
    #[serde(default)]
    pub provider: ProviderKind,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            root_page_url: None,
            max_depth: default_max_depth(),
            max_pages: default_max_pages(),
            provider: ProviderKind::default(),
        }
    }
}

impl DefaultsConfig {
    /// Traversal quotas applied when a request leaves them out.
    pub fn limits(&self) -> TraversalLimits {
        TraversalLimits::new(self.max_depth, self.max_pages)
    }
}

fn default_max_depth() -> u32 {
    DEFAULT_MAX_DEPTH
}
fn default_max_pages() -> usize {
    DEFAULT_MAX_PAGES
}

/// `[confluence]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfluenceConfig {
    /// Site base URL, e.g. `https://example.atlassian.net`.
    #[serde(default)]
    pub base_url: String,

    /// Account email used for basic auth.
    #[serde(default)]
    pub email: String,

    /// Name of the env var holding the API token.
    #[serde(default = "default_confluence_token_env")]
    pub api_token_env: String,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Children requested per page of the child listing.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for ConfluenceConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            email: String::new(),
            api_token_env: default_confluence_token_env(),
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
            page_size: default_page_size(),
        }
    }
}

fn default_confluence_token_env() -> String {
    "CONFLUENCE_API_TOKEN".into()
}
fn default_connect_timeout() -> u64 {
    20
}
fn default_request_timeout() -> u64 {
    60
}
fn default_page_size() -> usize {
    100
}

/// `[bedrock]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BedrockConfig {
    #[serde(default = "default_bedrock_region")]
    pub region: String,

    #[serde(default = "default_bedrock_model")]
    pub model_id: String,

    /// Name of the env var holding the Bedrock API key.
    #[serde(default = "default_bedrock_key_env")]
    pub api_key_env: String,

    /// Override for the runtime endpoint (defaults to the regional one).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl Default for BedrockConfig {
    fn default() -> Self {
        Self {
            region: default_bedrock_region(),
            model_id: default_bedrock_model(),
            api_key_env: default_bedrock_key_env(),
            endpoint: None,
        }
    }
}

impl BedrockConfig {
    /// Runtime endpoint, honoring the override.
    pub fn endpoint(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| format!("https://bedrock-runtime.{}.amazonaws.com", self.region))
    }
}

fn default_bedrock_region() -> String {
    "us-east-1".into()
}
fn default_bedrock_model() -> String {
    "anthropic.claude-3-5-sonnet-20240620-v1:0".into()
}
fn default_bedrock_key_env() -> String {
    "AWS_BEARER_TOKEN_BEDROCK".into()
}

/// `[gemini]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// Name of the env var holding the API key.
    #[serde(default = "default_gemini_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: default_gemini_model(),
            api_key_env: default_gemini_key_env(),
            base_url: default_gemini_base_url(),
        }
    }
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".into()
}
fn default_gemini_key_env() -> String {
    "GEMINI_API_KEY".into()
}
fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".into()
}

/// `[gitlab_duo]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitLabDuoConfig {
    #[serde(default = "default_gitlab_base_url")]
    pub base_url: String,

    #[serde(default = "default_gitlab_model")]
    pub model: String,

    /// Name of the env var holding the access token.
    #[serde(default = "default_gitlab_token_env")]
    pub token_env: String,
}

impl Default for GitLabDuoConfig {
    fn default() -> Self {
        Self {
            base_url: default_gitlab_base_url(),
            model: default_gitlab_model(),
            token_env: default_gitlab_token_env(),
        }
    }
}

fn default_gitlab_base_url() -> String {
    "https://gitlab.com".into()
}
fn default_gitlab_model() -> String {
    "claude-3-5-sonnet-latest".into()
}
fn default_gitlab_token_env() -> String {
    "GITLAB_TOKEN".into()
}

/// `[generation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-call timeout for provider requests.
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_generation_timeout(),
        }
    }
}

fn default_max_tokens() -> u32 {
    2048
}
fn default_temperature() -> f32 {
    0.3
}
fn default_generation_timeout() -> u64 {
    90
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.docground/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DocgroundError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.docground/docground.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| DocgroundError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| DocgroundError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DocgroundError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DocgroundError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DocgroundError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read a secret from the named environment variable.
///
/// Fails with a config error naming the variable when it is unset or blank.
pub fn read_secret(var_name: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(DocgroundError::config(format!(
            "secret not found. Set the {var_name} environment variable."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("max_pages"));
        assert!(toml_str.contains("CONFLUENCE_API_TOKEN"));
        assert!(toml_str.contains("GEMINI_API_KEY"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.max_depth, 5);
        assert_eq!(parsed.defaults.max_pages, 200);
        assert_eq!(parsed.defaults.provider, ProviderKind::Bedrock);
        assert_eq!(parsed.confluence.page_size, 100);
        assert_eq!(parsed.server.port, 8080);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[defaults]
root_page_url = "https://example.atlassian.net/wiki/spaces/ENG/pages/327681/Architecture"
provider = "gitlab_duo"

[confluence]
base_url = "https://example.atlassian.net/wiki/"
email = "bot@example.com"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.provider, ProviderKind::GitlabDuo);
        assert_eq!(config.defaults.max_depth, 5);
        assert!(config.defaults.root_page_url.is_some());
        assert_eq!(config.confluence.api_token_env, "CONFLUENCE_API_TOKEN");
        assert_eq!(config.generation.max_tokens, 2048);
    }

    #[test]
    fn defaults_expose_limits() {
        let defaults = DefaultsConfig {
            max_depth: 2,
            max_pages: 0,
            ..Default::default()
        };
        let limits = defaults.limits();
        assert_eq!(limits.max_depth, 2);
        assert_eq!(limits.max_pages, 1);
    }

    #[test]
    fn bedrock_endpoint_follows_region() {
        let mut config = BedrockConfig {
            region: "eu-west-1".into(),
            ..Default::default()
        };
        assert_eq!(config.endpoint(), "https://bedrock-runtime.eu-west-1.amazonaws.com");

        config.endpoint = Some("http://127.0.0.1:9000".into());
        assert_eq!(config.endpoint(), "http://127.0.0.1:9000");
    }

    #[test]
    fn missing_secret_is_config_error() {
        // Use a unique env var name to avoid interfering with other tests
        let result = read_secret("DG_TEST_NONEXISTENT_SECRET_12345");
        let err = result.unwrap_err();
        assert!(matches!(err, DocgroundError::Config { .. }));
        assert!(err.to_string().contains("DG_TEST_NONEXISTENT_SECRET_12345"));
    }

    #[test]
    fn load_config_from_reports_parse_errors() {
        let dir = std::env::temp_dir().join(format!("dg-config-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.toml");
        std::fs::write(&path, "[defaults\nmax_depth = ").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
