use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use uht_admin::{mock::MockGateway, prelude::*};

use crate::{app::App, config::ConsoleConfig};

/// Simulated round-trip time for `--demo`
const DEMO_LATENCY: Duration = Duration::from_millis(400);

#[derive(Parser, Debug)]
#[command(name = "uht-console")]
#[command(author, version, about = "Choose which objects and fields are tracked", long_about = None)]
pub struct Cli {
    /// Controller endpoint URL. Default: config file, environment `UHT_URL`, or <http://127.0.0.1:8080/uht>
    #[arg(short = 'u', long, env = "UHT_URL")]
    pub url: Option<String>,

    /// Use a built-in sample catalog instead of a controller
    #[arg(long)]
    pub demo: bool,

    /// Path to json config file
    #[arg(long, env = "UHT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write logs to this file. Logs are discarded when not set.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Verbose mode (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = ConsoleConfig::load(cli.config.as_deref())?;
    let toast = config.toast_duration();

    if cli.demo {
        info!("demo mode");
        let gateway = MockGateway::demo();
        gateway.set_latency(DEMO_LATENCY);
        return App::new(gateway, toast).run().await;
    }

    let gateway_config = config.gateway_config(cli.url.as_deref());
    info!(url = %gateway_config.base_url, "connecting");
    let gateway = HttpGateway::with_config(gateway_config).context("create http gateway")?;
    App::new(gateway, toast).run().await
}
