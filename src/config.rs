use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main configuration structure for shopscout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// OpenAI provider configuration
    #[serde(default)]
    pub openai: OpenAIConfig,

    /// Product catalog configuration
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Report output configuration
    #[serde(default)]
    pub report: ReportConfig,

    /// Terminal output configuration
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,

    /// Temperature for report generation
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Cost per 1M input tokens in USD, used for the session summary
    #[serde(default)]
    pub cost_per_1m_input_tokens: f32,

    /// Cost per 1M output tokens in USD
    #[serde(default)]
    pub cost_per_1m_output_tokens: f32,

    /// Override base URL (for API-compatible services)
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Path to the products JSON file
    #[serde(default = "default_products_path")]
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Directory where saved reports land
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Maximum tokens for a generated report
    #[serde(default = "default_report_max_tokens")]
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Enable colorful output
    #[serde(default = "default_colorful")]
    pub colorful: bool,
}

// Default value functions
fn default_model() -> String { "gpt-4.1-mini".to_string() }
fn default_temperature() -> f32 { 0.7 }
fn default_products_path() -> String { "products.json".to_string() }
fn default_output_dir() -> String { ".".to_string() }
fn default_report_max_tokens() -> u32 { 2500 }
fn default_colorful() -> bool { true }

impl Default for OpenAIConfig {
    fn default() -> Self {
        OpenAIConfig {
            model: default_model(),
            temperature: default_temperature(),
            cost_per_1m_input_tokens: 0.0,
            cost_per_1m_output_tokens: 0.0,
            base_url: None,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            path: default_products_path(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            output_dir: default_output_dir(),
            max_tokens: default_report_max_tokens(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            colorful: default_colorful(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            openai: OpenAIConfig::default(),
            catalog: CatalogConfig::default(),
            report: ReportConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))
    }

    /// Load configuration from command line argument or default locations
    pub fn load(config_path: &Option<String>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::from_file(path);
        }

        // Try loading from default locations
        let default_paths = vec![
            "shopscout.toml",
            ".shopscout.toml",
            "~/.config/shopscout/config.toml",
        ];

        for path in default_paths {
            let expanded_path = shellexpand::tilde(path);
            if Path::new(expanded_path.as_ref()).exists() {
                match Self::from_file(expanded_path.as_ref()) {
                    Ok(config) => return Ok(config),
                    Err(e) => eprintln!("Warning: Failed to load config from {}: {}", path, e),
                }
            }
        }

        // Return default config if no file found
        Ok(Self::default())
    }
}
