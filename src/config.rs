use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::core::{CompliancePolicy, GeographyConfig};
use crate::models::ScoringWeights;
use crate::routes::RankingLimits;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub catalog: CatalogSettings,
    #[serde(default)]
    pub embedding: EmbeddingSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub ranking: RankingSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSettings {
    #[serde(default = "default_catalog_path")]
    pub path: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self { path: default_catalog_path() }
    }
}

fn default_catalog_path() -> String { "data/universities.csv".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingSettings {
    #[serde(default = "default_embedding_base_url")]
    pub base_url: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    pub api_key: Option<String>,
    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,
    /// Programs embedded concurrently while warming the catalog
    #[serde(default = "default_embedding_concurrency")]
    pub concurrency: usize,
}

impl EmbeddingSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            base_url: default_embedding_base_url(),
            model: default_embedding_model(),
            api_key: None,
            timeout_secs: default_embedding_timeout_secs(),
            concurrency: default_embedding_concurrency(),
        }
    }
}

fn default_embedding_base_url() -> String { "http://localhost:11434/v1".to_string() }
fn default_embedding_model() -> String { "granite-embedding:30m".to_string() }
fn default_embedding_timeout_secs() -> u64 { 30 }
fn default_embedding_concurrency() -> usize { 8 }

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    #[serde(default = "default_session_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: u64,
}

impl SessionSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_session_ttl_secs(),
            max_sessions: default_max_sessions(),
        }
    }
}

fn default_session_ttl_secs() -> u64 { 3600 }
fn default_max_sessions() -> u64 { 10_000 }

#[derive(Debug, Clone, Deserialize)]
pub struct RankingSettings {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

impl From<&RankingSettings> for RankingLimits {
    fn from(settings: &RankingSettings) -> Self {
        RankingLimits {
            default_limit: settings.default_limit,
            max_limit: settings.max_limit,
        }
    }
}

fn default_limit() -> usize { 3 }
fn default_max_limit() -> usize { 50 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
    #[serde(default)]
    pub geography: GeographyConfig,
    #[serde(default)]
    pub compliance: CompliancePolicy,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_academic_weight")]
    pub academic: f64,
    #[serde(default = "default_aspiration_weight")]
    pub aspiration: f64,
    #[serde(default = "default_lifestyle_weight")]
    pub lifestyle: f64,
    #[serde(default = "default_budget_weight")]
    pub budget: f64,
    #[serde(default = "default_geography_weight")]
    pub geography: f64,
    #[serde(default = "default_boolean_weight")]
    pub boolean: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            academic: default_academic_weight(),
            aspiration: default_aspiration_weight(),
            lifestyle: default_lifestyle_weight(),
            budget: default_budget_weight(),
            geography: default_geography_weight(),
            boolean: default_boolean_weight(),
        }
    }
}

impl From<WeightsConfig> for ScoringWeights {
    fn from(config: WeightsConfig) -> Self {
        ScoringWeights {
            academic: config.academic,
            aspiration: config.aspiration,
            lifestyle: config.lifestyle,
            budget: config.budget,
            geography: config.geography,
            boolean: config.boolean,
        }
    }
}

fn default_academic_weight() -> f64 { 0.25 }
fn default_aspiration_weight() -> f64 { 0.15 }
fn default_lifestyle_weight() -> f64 { 0.10 }
fn default_budget_weight() -> f64 { 0.15 }
fn default_geography_weight() -> f64 { 0.15 }
fn default_boolean_weight() -> f64 { 0.20 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with UNIMATCH__)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., UNIMATCH__SERVER__PORT -> server.port
            .add_source(environment())
            .build()?;

        let settings = apply_api_key_fallback(settings)?;
        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        let settings = apply_api_key_fallback(settings)?;
        settings.try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("UNIMATCH")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Use `OPENAI_API_KEY` when no embedding key was configured
fn apply_api_key_fallback(settings: Config) -> Result<Config, ConfigError> {
    if settings.get_string("embedding.api_key").is_ok() {
        return Ok(settings);
    }

    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Config::builder()
            .add_source(settings)
            .set_override("embedding.api_key", key)?
            .build(),
        _ => Ok(settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let weights = ScoringWeights::from(WeightsConfig::default());
        assert_eq!(weights, ScoringWeights::default());
    }

    #[test]
    fn test_default_logging() {
        let level = default_log_level();
        let format = default_log_format();
        assert_eq!(level, "info");
        assert_eq!(format, "json");
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("uni-match-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"
[server]
port = 9090

[catalog]
path = "fixtures/catalog.csv"

[scoring.weights]
academic = 0.5
boolean = 0.0

[scoring.geography]
fallback_distance_km = 150.0
"#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.catalog.path, "fixtures/catalog.csv");
        assert_eq!(settings.scoring.weights.academic, 0.5);
        assert_eq!(settings.scoring.weights.aspiration, 0.15);
        assert_eq!(settings.scoring.geography.fallback_distance_km, 150.0);
        assert_eq!(settings.scoring.geography.reference_max_km, 1045.75);
        assert!(settings.scoring.compliance.accepts_test_when_unset);
        assert_eq!(settings.session.ttl_secs, 3600);
        assert_eq!(settings.ranking.default_limit, 3);
        assert_eq!(settings.embedding.model, "granite-embedding:30m");
    }

    #[test]
    fn test_ranking_limits_from_settings() {
        let limits = RankingLimits::from(&RankingSettings::default());
        assert_eq!(limits.default_limit, 3);
        assert_eq!(limits.max_limit, 50);
    }
}
