use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_CONFIG_ENV: &str = "LOCALRANKLENS_CONFIG";
const DEFAULT_OUTPUT_DIR: &str = "output";

#[derive(Debug, Deserialize)]
pub(crate) struct ProxyConfig {
    #[serde(default = "default_listen_addr")]
    pub(crate) listen_addr: String,
    #[serde(default)]
    pub(crate) cors: bool,
    #[serde(default)]
    pub(crate) backend: BackendConfig,
}

/// Which backend strategy this deployment runs. Chosen once at startup.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum BackendConfig {
    RemoteHtml {
        #[serde(default)]
        origin: Option<String>,
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
    RemotePdf {
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
    LocalProcess(LocalProcessConfig),
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub(crate) struct LocalProcessConfig {
    #[serde(default = "default_command")]
    pub(crate) command: Vec<String>,
    #[serde(default = "default_config_env")]
    pub(crate) config_env: String,
    #[serde(default = "default_output_dir")]
    pub(crate) output_dir: PathBuf,
    #[serde(default)]
    pub(crate) working_dir: Option<PathBuf>,
    #[serde(default)]
    pub(crate) temp_dir: Option<PathBuf>,
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
    /// Write the grouped config instead of the raw payload.
    #[serde(default)]
    pub(crate) normalize_keywords: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            cors: false,
            backend: BackendConfig::default(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::RemoteHtml {
            origin: None,
            timeout_secs: None,
        }
    }
}

fn validate_proxy_config(config: &ProxyConfig) -> anyhow::Result<()> {
    if config.listen_addr.trim().is_empty() {
        anyhow::bail!("listen_addr cannot be empty");
    }
    match &config.backend {
        BackendConfig::RemoteHtml {
            origin: Some(origin),
            ..
        } if !origin.starts_with("http://") && !origin.starts_with("https://") => {
            anyhow::bail!("backend origin must start with http:// or https://");
        }
        BackendConfig::LocalProcess(local) => {
            let program = local.command.first().map(|value| value.trim()).unwrap_or("");
            if program.is_empty() {
                anyhow::bail!("local_process backend must set a command");
            }
            if local.config_env.trim().is_empty() {
                anyhow::bail!("local_process config_env cannot be empty");
            }
        }
        _ => {}
    }
    Ok(())
}

pub(crate) fn load_proxy_config(path: Option<&Path>) -> anyhow::Result<ProxyConfig> {
    let Some(path) = path else {
        return Ok(ProxyConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: ProxyConfig = toml::from_str(&raw)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    validate_proxy_config(&config)?;
    Ok(config)
}

fn default_listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}

fn default_command() -> Vec<String> {
    vec!["python3".to_string(), "run_localranklens.py".to_string()]
}

fn default_config_env() -> String {
    DEFAULT_CONFIG_ENV.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}
