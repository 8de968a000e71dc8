use std::{
  env::{self, VarError},
  fmt::Display,
  str::FromStr,
  time::Duration,
};

use libvigil::prelude::*;

use crate::api::errors::AppError;

#[derive(Clone, Debug)]
pub struct Config {
  pub env: Env,
  pub listen_addr: String,

  // Watchlist feeds
  pub ofac_sdn_url: String,
  pub us_csl_url: String,
  pub eu_csl_url: String,
  pub uk_csl_url: String,
  pub source_timeout: Duration,
  pub refresh_interval: Duration,

  // Screening
  pub batch_workers: usize,
  pub job_ttl: Duration,

  // Observability
  pub enable_prometheus: bool,
  pub enable_tracing: bool,
}

impl Config {
  pub fn from_env() -> Result<Config, AppError> {
    Ok(Config {
      env: Env::from(env::var("ENV").unwrap_or("dev".into())),
      listen_addr: env::var("LISTEN_ADDR").unwrap_or("0.0.0.0:8000".into()),
      ofac_sdn_url: env::var("OFAC_SDN_URL").unwrap_or_default(),
      us_csl_url: env::var("US_CSL_URL").unwrap_or_default(),
      eu_csl_url: env::var("EU_CSL_URL").unwrap_or_default(),
      uk_csl_url: env::var("UK_CSL_URL").unwrap_or_default(),
      source_timeout: Duration::from_secs(parse_env("SOURCE_TIMEOUT_SECS", 30)?),
      refresh_interval: Duration::from_secs(parse_env("REFRESH_INTERVAL_SECS", 3600)?),
      batch_workers: parse_env("BATCH_WORKERS", 6)?,
      job_ttl: Duration::from_secs(parse_env("JOB_TTL_SECS", 24 * 60 * 60)?),
      enable_prometheus: env::var("ENABLE_PROMETHEUS").unwrap_or_default() == "1",
      enable_tracing: env::var("ENABLE_TRACING").unwrap_or_default() == "1",
    })
  }

  pub fn endpoints(&self) -> Vec<(Source, String)> {
    [
      (Source::OfacSdn, &self.ofac_sdn_url),
      (Source::UsCsl, &self.us_csl_url),
      (Source::EuCsl, &self.eu_csl_url),
      (Source::UkCsl, &self.uk_csl_url),
    ]
    .into_iter()
    .filter(|(_, url)| !url.is_empty())
    .map(|(source, url)| (source, url.clone()))
    .collect()
  }
}

impl Default for Config {
  fn default() -> Config {
    Config {
      env: Env::Dev,
      listen_addr: "0.0.0.0:8000".to_string(),
      ofac_sdn_url: String::new(),
      us_csl_url: String::new(),
      eu_csl_url: String::new(),
      uk_csl_url: String::new(),
      source_timeout: Duration::from_secs(30),
      refresh_interval: Duration::from_secs(3600),
      batch_workers: 6,
      job_ttl: Duration::from_secs(24 * 60 * 60),
      enable_prometheus: false,
      enable_tracing: false,
    }
  }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Env {
  Dev,
  Production,
}

impl From<String> for Env {
  fn from(value: String) -> Self {
    match value.as_ref() {
      "production" => Env::Production,
      _ => Env::Dev,
    }
  }
}

pub fn parse_env<T>(name: &str, default: T) -> Result<T, AppError>
where
  T: FromStr,
  T::Err: Display,
{
  match env::var(name) {
    Ok(value) if value.is_empty() => Ok(default),
    Ok(value) => value.parse::<T>().map_err(|err| AppError::ConfigError(format!("could not read {name}: {err}"))),
    Err(VarError::NotPresent) => Ok(default),
    Err(err) => Err(AppError::ConfigError(format!("could not read {name}: {err}"))),
  }
}
