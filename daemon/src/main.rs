use anyhow::Result;
use statwatch_daemon::{
    collector::{InstantSampler, LinuxSampler},
    config::Config,
    monitor::Monitor,
};
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

async fn monitoring_loop(config: Config) {
    let sampler = LinuxSampler::new();
    let mut monitor = Monitor::new(&config);
    let mut interval = tokio::time::interval(config.sample_interval());
    let mut last_tick = Instant::now();

    loop {
        interval.tick().await;
        let now = Instant::now();
        let report = monitor.tick(&sampler, now.duration_since(last_tick));
        last_tick = now;
        report.log(config.trend.rate_warning_percent);
    }
}

fn load_config() -> Config {
    let config_path = std::env::args_os()
        .nth(1)
        .map(std::path::PathBuf::from)
        .unwrap_or_else(Config::config_path);
    if config_path.exists() {
        Config::load(&config_path).unwrap_or_else(|e| {
            warn!("Failed to load config {:?}: {}, using defaults", config_path, e);
            Config::default()
        })
    } else {
        info!("No config file at {:?}, using defaults", config_path);
        Config::default()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    info!("statwatch daemon starting...");

    let config = load_config();

    // fail early on a host the sampler cannot describe
    let cpus = LinuxSampler::new().sample_cpu_jiffies()?;
    info!(
        "Sampling {} CPUs and {} processes every {}s, history depth {}",
        cpus.len() - 1,
        config.process.pids.len(),
        config.general.sample_interval_secs,
        config.general.history_depth
    );

    tokio::select! {
        _ = monitoring_loop(config) => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutting down");
        }
    }
    Ok(())
}
