pub mod cli;
pub mod core;
pub mod providers;
pub mod server;

use crate::core::config::AppConfig;
use crate::core::{BimonthlyRateService, Clock, PeriodRateResolver, RateCache, SystemClock};
use crate::providers::PtaxProvider;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Rate,
    Info,
    Serve,
}

/// Wires the PTAX provider, resolver and cache into a service running on the system clock.
pub fn build_service(config: &AppConfig) -> Result<BimonthlyRateService> {
    build_service_with_clock(config, Arc::new(SystemClock))
}

pub fn build_service_with_clock(
    config: &AppConfig,
    clock: Arc<dyn Clock>,
) -> Result<BimonthlyRateService> {
    let provider = PtaxProvider::new(
        config.ptax_base_url(),
        config.rate.request_timeout(),
        config.rate.retry_policy(),
    )?;
    let resolver = PeriodRateResolver::new(Arc::new(provider), config.rate.max_lookahead_days);
    let cache = Arc::new(RateCache::new(Arc::clone(&clock)));

    Ok(BimonthlyRateService::new(
        resolver,
        cache,
        clock,
        config.rate.cache_ttl(),
    ))
}

pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("PTAX starting...");

    let config = load_config(config_path)?;
    let service = build_service(&config)?;

    match command {
        AppCommand::Rate => cli::rate::run(&service).await,
        AppCommand::Info => cli::info::run(&service),
        AppCommand::Serve => server::serve(Arc::new(service), &config.server.bind_address()).await,
    }
}
