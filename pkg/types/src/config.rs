use serde::{Deserialize, Serialize};

/// `barbicanctl` configuration file (YAML).
///
/// Example `config.yaml`:
/// ```yaml
/// endpoint: https://barbican.example.com:9311
/// token: gAAAAABl...
/// timeout-secs: 15
/// insecure: false
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyManagerConfigFile {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default, alias = "timeout-secs")]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub insecure: Option<bool>,
}

/// Load a YAML config file, returning the default if the file doesn't exist.
pub fn load_config_file<T: serde::de::DeserializeOwned + Default>(path: &str) -> anyhow::Result<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(T::default());
        }
        Err(e) => return Err(e.into()),
    };
    let config: T = serde_yaml::from_str(&content)?;
    Ok(config)
}
