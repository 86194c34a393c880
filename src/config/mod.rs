use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub cluster: ClusterConfig,
    /// Named groups of pod names: a token matching a key expands to the
    /// group's members before matching against live pods.
    #[serde(default)]
    pub groups: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Base URL of the Kubernetes API server, e.g. `https://10.0.0.1:6443`.
    pub server: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Bearer token for the API server, if the cluster requires one.
    #[serde(default)]
    pub token: Option<String>,
    /// Skip TLS certificate verification (clusters with private CAs).
    #[serde(default)]
    pub insecure_skip_tls_verify: bool,
}

fn default_namespace() -> String {
    "default".to_string()
}

pub fn config_dir() -> Result<PathBuf> {
    let dir = directories::ProjectDirs::from("", "", "podtail")
        .context("Could not determine config directory")?
        .config_dir()
        .to_path_buf();
    Ok(dir)
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

pub fn load(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    if !path.exists() {
        anyhow::bail!(
            "Config file not found at {}. Create one with a [cluster] section naming the API server.",
            path.display()
        );
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", path.display()))?;

    Ok(config)
}
