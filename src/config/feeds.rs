// src/config/feeds.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_FEEDS_CONFIG_PATH: &str = "config/feeds.toml";

pub const ENV_FEEDS_CONFIG_PATH: &str = "FEEDS_CONFIG_PATH";
pub const ENV_FEEDS_DATA_DIR: &str = "FEEDS_DATA_DIR";
pub const ENV_SUBSTACK_RSS_URL: &str = "SUBSTACK_RSS_URL";

pub const DEFAULT_SUBSTACK_URL: &str = "https://insights.blockwall.vc/feed";
pub const DEFAULT_FALLBACK_IMAGE: &str =
    "https://images.unsplash.com/photo-1639762681057-408e52192e55?w=600&h=300&fit=crop";
pub const DEFAULT_FALLBACK_AUTHOR: &str = "Blockwall Team";

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_substack_url() -> String {
    DEFAULT_SUBSTACK_URL.to_string()
}
fn default_fallback_image() -> String {
    DEFAULT_FALLBACK_IMAGE.to_string()
}
fn default_fallback_author() -> String {
    DEFAULT_FALLBACK_AUTHOR.to_string()
}
fn default_max_articles() -> usize {
    6
}
fn default_excerpt_chars() -> usize {
    200
}
fn default_user_agent() -> String {
    concat!("blockwall-feeds/", env!("CARGO_PKG_VERSION")).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedsConfig {
    /// Directory holding substack.json, linkedin.json and the digest files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_substack_url")]
    pub substack_url: String,
    #[serde(default = "default_fallback_image")]
    pub fallback_image: String,
    #[serde(default = "default_fallback_author")]
    pub fallback_author: String,
    /// Only this many leading feed entries are ever normalized.
    #[serde(default = "default_max_articles")]
    pub max_articles: usize,
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            substack_url: default_substack_url(),
            fallback_image: default_fallback_image(),
            fallback_author: default_fallback_author(),
            max_articles: default_max_articles(),
            excerpt_chars: default_excerpt_chars(),
            user_agent: default_user_agent(),
        }
    }
}

impl FeedsConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading feeds config from {}", path.display()))?;
        let cfg: FeedsConfig = toml::from_str(&data)
            .with_context(|| format!("parsing feeds config {}", path.display()))?;
        Ok(cfg)
    }

    /// Resolve config using env var + fallbacks:
    /// 1) $FEEDS_CONFIG_PATH (must exist)
    /// 2) config/feeds.toml
    /// 3) built-in defaults
    ///
    /// `FEEDS_DATA_DIR` and `SUBSTACK_RSS_URL` are applied on top.
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_FEEDS_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("FEEDS_CONFIG_PATH points to non-existent path"));
            }
            Self::load_from_file(&pb)?
        } else {
            let p = PathBuf::from(DEFAULT_FEEDS_CONFIG_PATH);
            if p.exists() {
                Self::load_from_file(&p)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    /// `load_from_file` for an explicit path, else `load_default`. A broken or
    /// missing config is logged and replaced by built-in defaults, with env
    /// overrides still applied.
    pub fn load_or_default(explicit: Option<&Path>) -> Self {
        let loaded = match explicit {
            Some(p) => Self::load_from_file(p).map(|mut cfg| {
                cfg.apply_env_overrides();
                cfg
            }),
            None => Self::load_default(),
        };
        loaded.unwrap_or_else(|e| {
            tracing::error!(error = ?e, "feeds config unusable, using built-in defaults");
            let mut cfg = Self::default();
            cfg.apply_env_overrides();
            cfg
        })
    }

    fn apply_env_overrides(&mut self) {
        if let Some(dir) = non_empty_env(ENV_FEEDS_DATA_DIR) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(url) = non_empty_env(ENV_SUBSTACK_RSS_URL) {
            self.substack_url = url;
        }
    }

    pub fn substack_json(&self) -> PathBuf {
        self.data_dir.join("substack.json")
    }

    pub fn linkedin_json(&self) -> PathBuf {
        self.data_dir.join("linkedin.json")
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
