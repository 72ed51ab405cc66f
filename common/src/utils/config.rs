use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Runtime knobs for the pipeline thresholds from §4.3/§4.4 and the store connection.
/// Loaded the way the teacher loads settings: an optional `config` file, then environment
/// overrides, matching the convention that env vars win in a deployed container.
#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    #[serde(default = "default_surrealdb_address")]
    pub surrealdb_address: String,
    #[serde(default = "default_surrealdb_namespace")]
    pub surrealdb_namespace: String,
    #[serde(default = "default_surrealdb_database")]
    pub surrealdb_database: String,

    #[serde(default = "default_http_port")]
    pub http_port: u16,

    #[serde(default = "default_lease_ttl_seconds")]
    pub lease_ttl_seconds: i64,
    #[serde(default = "default_max_attempts")]
    pub default_max_attempts: u32,
    #[serde(default = "default_compare_fanout")]
    pub compare_fanout: usize,

    #[serde(default = "default_review_threshold")]
    pub review_threshold: f32,
    #[serde(default = "default_contested_threshold")]
    pub contested_threshold: f32,
    #[serde(default = "default_integrated_threshold")]
    pub integrated_threshold: f32,
    #[serde(default = "default_min_comparisons")]
    pub min_comparisons: u32,

    #[serde(default = "default_min_similarity")]
    pub min_similarity: f32,
    #[serde(default = "default_rrf_k")]
    pub rrf_k: u32,

    #[serde(default = "default_request_deadline_seconds")]
    pub request_deadline_seconds: u64,
}

fn default_surrealdb_address() -> String {
    "mem://".to_string()
}
fn default_surrealdb_namespace() -> String {
    "notebook".to_string()
}
fn default_surrealdb_database() -> String {
    "notebook".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_lease_ttl_seconds() -> i64 {
    60
}
fn default_max_attempts() -> u32 {
    5
}
fn default_compare_fanout() -> usize {
    20
}
fn default_review_threshold() -> f32 {
    0.2
}
fn default_contested_threshold() -> f32 {
    0.5
}
fn default_integrated_threshold() -> f32 {
    0.2
}
fn default_min_comparisons() -> u32 {
    1
}
fn default_min_similarity() -> f32 {
    0.3
}
fn default_rrf_k() -> u32 {
    60
}
fn default_request_deadline_seconds() -> u64 {
    30
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default())
        .build()?;

    config.try_deserialize()
}
