//! Configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (nested keys use `__`, e.g. `APP_OPENAI__API_KEY`). Every settings section
//! has defaults, so an empty configuration is valid.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    /// Build from an inline TOML document; no files or env vars are read.
    pub fn from_toml_str(toml: &str) -> Self {
        Self { figment: Figment::new().merge(Toml::string(toml)) }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Like [`Config::get`], but a missing key yields `T::default()`.
    /// A present but malformed key is still an error.
    pub fn get_or_default<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        if self.figment.contains(key) { self.get(key) } else { Ok(T::default()) }
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        if matches!(env, "prod" | "production") {
            let embedding: EmbeddingSettings = self.get_or_default("embedding")?;
            if embedding.provider == EmbeddingBackend::Hashing {
                anyhow::bail!("the hashing embedder is for development only; pick `openai` or `local` in production");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseSettings {
    pub path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self { Self { path: "concierge.db".to_string() } }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OpenAiSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub request_timeout_ms: u64,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1/".to_string(),
            chat_model: "gpt-4-turbo-preview".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            request_timeout_ms: 30_000,
        }
    }
}

impl OpenAiSettings {
    pub fn request_timeout(&self) -> Duration { Duration::from_millis(self.request_timeout_ms) }

    /// Resolves `path` against `base_url`. The base is treated as a directory
    /// even without a trailing `/`, so `https://host/v1` + `embeddings` keeps
    /// the `/v1` prefix.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        let raw = &self.base_url;
        let mut base = Url::parse(raw).map_err(|e| Error::InvalidConfig(format!("invalid base url '{raw}': {e}")))?;
        if !base.path().ends_with('/') {
            let dir = format!("{}/", base.path().trim_end_matches('/'));
            base.set_path(&dir);
        }
        base.join(path).map_err(|e| Error::InvalidConfig(format!("cannot join '{path}' onto '{raw}': {e}")))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    #[default]
    OpenAi,
    Local,
    Hashing,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingBackend,
    pub dim: usize,
    pub model_dir: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self { Self { provider: EmbeddingBackend::OpenAi, dim: 1536, model_dir: None } }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalSettings {
    pub enabled: bool,
    pub faq_limit: usize,
    pub max_documents: usize,
    pub similarity_threshold: f32,
    pub top_k: usize,
    pub timeout_ms: u64,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { enabled: true, faq_limit: 20, max_documents: 10, similarity_threshold: 0.7, top_k: 3, timeout_ms: 5_000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationSettings {
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_ms: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self { Self { max_tokens: 500, temperature: 0.7, timeout_ms: 30_000 } }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IngestSettings {
    /// Approximate token budget per chunk (4 characters per token).
    pub max_tokens: usize,
}

impl Default for IngestSettings {
    fn default() -> Self { Self { max_tokens: 8_000 } }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub openai: OpenAiSettings,
    pub embedding: EmbeddingSettings,
    pub retrieval: RetrievalSettings,
    pub generation: GenerationSettings,
    pub ingest: IngestSettings,
}

impl Settings {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            database: config.get_or_default("database")?,
            openai: config.get_or_default("openai")?,
            embedding: config.get_or_default("embedding")?,
            retrieval: config.get_or_default("retrieval")?,
            generation: config.get_or_default("generation")?,
            ingest: config.get_or_default("ingest")?,
        })
    }

    /// Database path with `~` and env vars expanded.
    pub fn database_path(&self) -> PathBuf { expand_path(&self.database.path) }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
