use crate::error::Error;
use serde::Deserialize;
use std::time::Duration;

fn default_postgres_port() -> u16 {
    5432
}

fn default_pool_size() -> u32 {
    4
}

fn default_explorer_url() -> String {
    "https://explorer.theqrl.org".to_string()
}

fn default_node_state_url() -> String {
    "https://zeus-proxy.automated.theqrl.org/grpc/mainnet/GetNodeState".to_string()
}

fn default_max_concurrent_requests() -> usize {
    32
}

fn default_gap_threshold() -> u64 {
    0
}

fn default_staleness_secs() -> u64 {
    2 * 24 * 3600
}

fn default_request_timeout_secs() -> u64 {
    30
}

#[derive(Deserialize)]
pub struct PostgresConfig {
    pub host: String,
    #[serde(default = "default_postgres_port")]
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

#[derive(Deserialize)]
struct FlatScraperConfig {
    #[serde(default = "default_explorer_url")]
    pub explorer_url: String,
    #[serde(default = "default_node_state_url")]
    pub node_state_url: String,
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
    #[serde(default = "default_gap_threshold")]
    pub gap_threshold: u64,
    #[serde(default = "default_staleness_secs")]
    pub staleness_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ScraperConfig {
    pub explorer_url: String,
    pub node_state_url: String,
    pub max_concurrent_requests: usize,
    pub gap_threshold: u64,
    pub staleness: Duration,
    pub request_timeout: Duration,
}

pub fn load_postgres() -> Result<PostgresConfig, Error> {
    Ok(envy::prefixed("POSTGRES__").from_env::<PostgresConfig>()?)
}

pub fn load_scraper() -> Result<ScraperConfig, Error> {
    let flat_config = envy::prefixed("SCRAPER__").from_env::<FlatScraperConfig>()?;

    Ok(ScraperConfig {
        explorer_url: flat_config.explorer_url,
        node_state_url: flat_config.node_state_url,
        max_concurrent_requests: flat_config.max_concurrent_requests,
        gap_threshold: flat_config.gap_threshold,
        staleness: Duration::from_secs(flat_config.staleness_secs),
        request_timeout: Duration::from_secs(flat_config.request_timeout_secs),
    })
}
