//! Configuration file handling for the CLI.
//!
//! One TOML file drives a run. Pipeline keys (`questions`, `[controls]`,
//! `[few_shot]`, `[generation]`) sit at the top level next to the CLI's own
//! sections:
//!
//! ```toml
//! questions = ["Is the vendor on the approved list?"]
//!
//! [controls]
//! vendor_whitelist = ["Acme", "Globex"]
//!
//! [paths]
//! data_dir = "data"
//! input_file = "payments.json"
//! audit_file = "audit.jsonl"
//!
//! [model]
//! provider = "gemini"
//! name = "gemini-1.5-flash"
//! api_key_env = "GEMINI_API_KEY"
//! temperature = 0.0
//!
//! [report]
//! metadata_fields = ["record_id", "vendor", "amount"]
//! ```

use crate::error::{CliError, Result};
use payqa_generator::GeneratorConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Full run configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Controls, questions, few-shot sources and generation settings
    #[serde(flatten)]
    pub generator: GeneratorConfig,

    /// File locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Backend selection
    #[serde(default)]
    pub model: ModelConfig,

    /// Report layout
    #[serde(default)]
    pub report: ReportConfig,

    /// Output settings
    #[serde(default)]
    pub settings: Settings,

    /// Directory of the loaded config file; relative paths start here
    #[serde(skip)]
    base_dir: PathBuf,
}

/// File locations, relative to `data_dir` unless absolute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Base directory for data files, relative to the config file
    pub data_dir: PathBuf,
    /// Input records (JSON array)
    pub input_file: PathBuf,
    /// Predictions output (JSONL)
    pub predictions_file: PathBuf,
    /// Rendered prompts output (JSONL)
    pub prompts_file: PathBuf,
    /// Audit log (JSONL); no audit log when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_file: Option<PathBuf>,
    /// Report output (CSV)
    pub report_file: PathBuf,
}

/// Which backend serves the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Google Generative Language API
    Gemini,
    /// Local Ollama server
    Ollama,
    /// Canned replies, no network
    Mock,
}

/// Backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Backend provider
    pub provider: Provider,
    /// Model name passed to the provider
    pub name: String,
    /// Override the provider's API base URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// API key; prefer `api_key_env`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum generated tokens per reply
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Reply returned by the mock provider
    pub mock_reply: String,
    /// Serve whole batches in one call (mock provider only)
    pub bulk: bool,
}

/// Report layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Record attributes copied into the leading report columns
    pub metadata_fields: Vec<String>,
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl AppConfig {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CliError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let contents = fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&contents)?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(config)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.generator.validate()?;
        if self.model.name.trim().is_empty() {
            return Err(CliError::Config("model.name must not be empty".into()));
        }
        Ok(())
    }

    /// Resolved data directory.
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join(&self.paths.data_dir)
    }

    /// Resolve a file name against the data directory.
    pub fn resolve(&self, file: &Path) -> PathBuf {
        self.data_dir().join(file)
    }

    /// Input records file.
    pub fn input_path(&self) -> PathBuf {
        self.resolve(&self.paths.input_file)
    }

    /// Predictions file.
    pub fn predictions_path(&self) -> PathBuf {
        self.resolve(&self.paths.predictions_file)
    }

    /// Prompt export file.
    pub fn prompts_path(&self) -> PathBuf {
        self.resolve(&self.paths.prompts_file)
    }

    /// Report file.
    pub fn report_path(&self) -> PathBuf {
        self.resolve(&self.paths.report_file)
    }

    /// Audit log file, if configured.
    pub fn audit_path(&self) -> Option<PathBuf> {
        self.paths.audit_file.as_deref().map(|file| self.resolve(file))
    }
}

impl ModelConfig {
    /// API key from the config, falling back to `api_key_env`.
    pub fn api_key(&self) -> Result<String> {
        if let Some(key) = &self.api_key {
            return Ok(key.clone());
        }
        env::var(&self.api_key_env).map_err(|_| {
            CliError::Config(format!(
                "No API key: set model.api_key or the {} environment variable",
                self.api_key_env
            ))
        })
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            input_file: PathBuf::from("payments.json"),
            predictions_file: PathBuf::from("predictions.jsonl"),
            prompts_file: PathBuf::from("prompts.jsonl"),
            audit_file: None,
            report_file: PathBuf::from("report.csv"),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Gemini,
            name: "gemini-1.5-flash".to_string(),
            endpoint: None,
            api_key: None,
            api_key_env: "GEMINI_API_KEY".to_string(),
            temperature: None,
            max_tokens: None,
            mock_reply: "[]".to_string(),
            bulk: false,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            metadata_fields: vec!["record_id".to_string()],
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
questions = ["Q1", "Q2"]

[controls]
amount_threshold = 10000

[few_shot]
file = "few_shot.jsonl"

[generation]
batch_size = 5
call_timeout_secs = 30

[paths]
data_dir = "data"
input_file = "in.json"
audit_file = "/var/log/payqa/audit.jsonl"

[model]
provider = "ollama"
name = "llama3"
temperature = 0.2

[report]
metadata_fields = ["record_id", "vendor"]

[settings]
color = false
format = "json"
"#;

    #[test]
    fn test_full_config() {
        let config = AppConfig::from_toml_str(FULL).unwrap();
        assert_eq!(config.generator.questions, vec!["Q1", "Q2"]);
        assert_eq!(config.generator.generation.batch_size, Some(5));
        assert_eq!(config.generator.generation.call_timeout_secs, 30);
        assert!(config.generator.controls.get("amount_threshold").is_some());
        assert_eq!(config.model.provider, Provider::Ollama);
        assert_eq!(config.model.temperature, Some(0.2));
        assert_eq!(config.report.metadata_fields, vec!["record_id", "vendor"]);
        assert!(!config.settings.color);
        assert!(matches!(config.settings.format, OutputFormat::Json));

        assert_eq!(config.input_path(), PathBuf::from("data/in.json"));
        assert_eq!(config.predictions_path(), PathBuf::from("data/predictions.jsonl"));
        assert_eq!(config.audit_path(), Some(PathBuf::from("/var/log/payqa/audit.jsonl")));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert!(config.generator.questions.is_empty());
        assert_eq!(config.model.provider, Provider::Gemini);
        assert_eq!(config.report.metadata_fields, vec!["record_id"]);
        assert!(config.audit_path().is_none());
        assert!(config.settings.color);
    }

    #[test]
    fn test_paths_relative_to_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payqa.toml");
        fs::write(&path, "[paths]\ndata_dir = \"data\"\n").unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.input_path(), dir.path().join("data").join("payments.json"));
    }

    #[test]
    fn test_invalid_generation_rejected() {
        let err = AppConfig::from_toml_str("[generation]\nbatch_size = 0\n").unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        assert!(matches!(
            AppConfig::from_toml_str("[model]\nprovider = \"openai\"\n"),
            Err(CliError::Toml(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::load(Path::new("/definitely/not/payqa.toml")).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn test_api_key_precedence() {
        let model = ModelConfig {
            api_key: Some("inline-key".to_string()),
            api_key_env: "PAYQA_TEST_UNSET_KEY_VAR".to_string(),
            ..Default::default()
        };
        assert_eq!(model.api_key().unwrap(), "inline-key");

        let model = ModelConfig {
            api_key: None,
            ..model
        };
        assert!(model.api_key().is_err());
    }
}
