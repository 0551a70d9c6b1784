use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_ENV: &str = "LEAFCHECK_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/leafcheck.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: &'static str, value: String },
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelBackend {
    #[default]
    Onnx,
    Torch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: PathBuf,
    pub backend: ModelBackend,
    pub input_size: u32,
    pub apply_softmax: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub static_dir: PathBuf,
    pub file_name: String,
    pub max_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8081,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("models/plant_disease_model.onnx"),
            backend: ModelBackend::Onnx,
            input_size: 224,
            apply_softmax: false,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            static_dir: PathBuf::from("static"),
            file_name: "uploaded_image.jpg".to_string(),
            max_bytes: 50 * 1024 * 1024,
        }
    }
}

impl UploadConfig {
    /// Location on disk the latest upload is written to.
    pub fn upload_path(&self) -> PathBuf {
        self.static_dir.join(&self.file_name)
    }

    /// URL the latest upload is served from.
    pub fn public_path(&self) -> String {
        format!("/static/{}", self.file_name)
    }
}

impl AppConfig {
    /// Reads the YAML file named by `LEAFCHECK_CONFIG`, falling back to
    /// `config/leafcheck.yaml` and then to defaults, and applies environment
    /// overrides on top.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = std::env::var(CONFIG_ENV).ok().map(PathBuf::from);
        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => {
                log::info!("No config file found, using defaults");
                Self::default()
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let config_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded config from {}", path.display());
        Self::from_yaml(&config_str)
    }

    pub fn from_yaml(config_str: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_yaml::from_str(config_str)?;
        Ok(config)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidEnv { key: "PORT", value: port })?;
        }
        if let Some(path) = lookup("MODEL_PATH") {
            self.model.path = PathBuf::from(path);
        }
        if let Some(backend) = lookup("MODEL_BACKEND") {
            self.model.backend = match backend.to_ascii_lowercase().as_str() {
                "onnx" => ModelBackend::Onnx,
                "torch" => ModelBackend::Torch,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        key: "MODEL_BACKEND",
                        value: backend,
                    });
                }
            };
        }
        if let Some(dir) = lookup("STATIC_DIR") {
            self.upload.static_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.input_size == 0 {
            return Err(ConfigError::Invalid("model.input_size must be positive".into()));
        }
        if self.upload.file_name.is_empty() || self.upload.file_name.contains(['/', '\\']) {
            return Err(ConfigError::Invalid(format!(
                "upload.file_name must be a bare file name, got {:?}",
                self.upload.file_name
            )));
        }
        if self.upload.max_bytes == 0 {
            return Err(ConfigError::Invalid("upload.max_bytes must be positive".into()));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_single_page_layout() {
        let config = AppConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:8081");
        assert_eq!(config.model.input_size, 224);
        assert_eq!(config.model.backend, ModelBackend::Onnx);
        assert_eq!(
            config.upload.upload_path(),
            PathBuf::from("static/uploaded_image.jpg")
        );
        assert_eq!(config.upload.public_path(), "/static/uploaded_image.jpg");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_remaining_defaults() {
        let yaml = r#"
server:
  port: 9000
model:
  backend: torch
  path: models/leaf.pt
  apply_softmax: true
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.model.backend, ModelBackend::Torch);
        assert_eq!(config.model.path, PathBuf::from("models/leaf.pt"));
        assert!(config.model.apply_softmax);
        assert_eq!(config.model.input_size, 224);
        assert_eq!(config.upload, UploadConfig::default());
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let yaml = "model:\n  backend: keras\n";
        assert!(matches!(
            AppConfig::from_yaml(yaml),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn env_overrides_win_over_file() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("PORT", "5000"),
            ("MODEL_PATH", "/srv/model.onnx"),
            ("MODEL_BACKEND", "ONNX"),
            ("STATIC_DIR", "/srv/static"),
        ]);
        let mut config = AppConfig::from_yaml("server:\n  port: 9000\n").unwrap();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server.port, 5000);
        assert_eq!(config.model.path, PathBuf::from("/srv/model.onnx"));
        assert_eq!(config.model.backend, ModelBackend::Onnx);
        assert_eq!(
            config.upload.upload_path(),
            PathBuf::from("/srv/static/uploaded_image.jpg")
        );
    }

    #[test]
    fn bad_port_override_fails() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(|key| (key == "PORT").then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { key: "PORT", .. }));
    }

    #[test]
    fn validation_rejects_nested_file_name() {
        let mut config = AppConfig::default();
        config.upload.file_name = "../escape.jpg".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
