use serde::Deserialize;
use std::path::Path;

use crate::api::model::DEFAULT_TIMEOUT_MS;
use crate::pedal::model::PedalMapping;

pub const DEFAULT_BACKEND: &str = "http://localhost:18000";

// YAML specific configuration

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Origin of the device backend; the `/api` prefix is added by the transport.
    pub backend: String,
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            backend: DEFAULT_BACKEND.to_owned(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl ClientConfig {
    pub fn with_overrides(self, backend: Option<String>, timeout_ms: Option<u64>) -> ClientConfig {
        ClientConfig {
            backend: backend.unwrap_or(self.backend),
            timeout_ms: timeout_ms.unwrap_or(self.timeout_ms),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Couldn't read configuration file. Reason: {0}")]
    Io(#[from] std::io::Error),
    #[error("Couldn't parse configuration file. Reason: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<ClientConfig, ConfigError> {
    let conf_file = std::fs::File::open(path)?;
    from_reader(conf_file)
}

pub fn from_reader<R: std::io::Read>(reader: R) -> Result<ClientConfig, ConfigError> {
    // A null document means "all defaults".
    let yaml_value: serde_yaml::Value = serde_yaml::from_reader(reader)?;
    if yaml_value.is_null() {
        return Ok(ClientConfig::default());
    }
    Ok(serde_yaml::from_value(yaml_value)?)
}

/// Reads a pedal mapping file. JSON is valid YAML, so both formats work.
pub fn load_pedals_from_yaml<P: AsRef<Path>>(path: P) -> Result<PedalMapping, ConfigError> {
    let pedals_file = std::fs::File::open(path)?;
    Ok(serde_yaml::from_reader(pedals_file)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_fields_take_defaults() {
        let config = from_reader("backend: http://10.0.0.7:18000\n".as_bytes()).unwrap();
        assert_eq!(
            config,
            ClientConfig {
                backend: "http://10.0.0.7:18000".to_owned(),
                timeout_ms: 5000,
            }
        );
    }

    #[test]
    fn null_document_is_default() {
        assert_eq!(from_reader("~\n".as_bytes()).unwrap(), ClientConfig::default());
    }

    #[test]
    fn overrides_replace_only_given_fields() {
        let config = ClientConfig::default().with_overrides(None, Some(250));
        assert_eq!(config.backend, DEFAULT_BACKEND);
        assert_eq!(config.timeout_ms, 250);
    }

    #[test]
    fn pedal_file_accepts_yaml_and_json() {
        let dir = std::env::temp_dir().join(format!("stepkeys-pedals-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let yaml = dir.join("pedals.yaml");
        let json = dir.join("pedals.json");
        std::fs::write(
            &yaml,
            "\"1\":\n  mode: combo\n  behaviour: hold\n  keys: [ctrl, c]\n",
        )
        .unwrap();
        std::fs::write(
            &json,
            r#"{"1": {"mode": "combo", "behaviour": "hold", "keys": ["ctrl", "c"]}}"#,
        )
        .unwrap();

        let from_yaml = load_pedals_from_yaml(&yaml).unwrap();
        let from_json = load_pedals_from_yaml(&json).unwrap();
        assert_eq!(from_yaml, from_json);
        assert_eq!(from_yaml.len(), 1);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn malformed_yaml_is_reported() {
        let error = from_reader("timeout_ms: soon\n".as_bytes()).unwrap_err();
        assert!(matches!(error, ConfigError::Yaml(_)));
    }
}
