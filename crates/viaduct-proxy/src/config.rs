use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct ProxyConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Address of the server being proxied.
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Version name of the backend, e.g. `1.20.3`.
    #[serde(default = "default_server_version")]
    pub server_version: String,
    /// Directory with `<server>-to-<client>.json` files overriding the bundled mappings.
    #[serde(default)]
    pub mappings_dir: Option<PathBuf>,
}

fn default_bind() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    25565
}

fn default_backend() -> String {
    "127.0.0.1:25566".into()
}

fn default_server_version() -> String {
    "1.20.3".into()
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            backend: default_backend(),
            server_version: default_server_version(),
            mappings_dir: None,
        }
    }
}

impl ProxyConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: ProxyConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::info!("No config file found at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }
}
