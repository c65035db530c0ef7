mod config;

use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use metrics_exporter_statsd::StatsdBuilder;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Parser)]
enum CliCommand {
    /// Run the CMS gateway.
    Gateway {
        #[arg(long, default_value = "example_config.yaml")]
        config: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = CliCommand::parse();

    match cli {
        CliCommand::Gateway { config } => run_gateway(&config),
    }
}

fn run_gateway(path: &Path) {
    let config = match Config::from_file(path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "could not load configuration");
            process::exit(1);
        }
    };

    let Some(gateway_config) = config.gateway else {
        tracing::error!("configuration has no gateway section");
        process::exit(1);
    };
    if let Err(e) = gateway_config.validate() {
        tracing::error!(error = %e, "invalid gateway configuration");
        process::exit(1);
    }

    // Keep the guard alive for the life of the process so events still flush
    // on the way out.
    let _sentry_guard = config.common.logging.as_ref().map(|logging| {
        sentry::init((
            logging.sentry_dsn.clone(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    if let Some(metrics_config) = &config.common.metrics {
        install_metrics(metrics_config);
    }

    let token = std::env::var("CMS_API_TOKEN")
        .ok()
        .filter(|token| !token.is_empty());
    if token.is_none() {
        tracing::warn!("CMS_API_TOKEN is not set; upstream calls will fail until it is");
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "could not start runtime");
            process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(gateway::run(gateway_config, token)) {
        tracing::error!(error = %e, "gateway exited with an error");
        process::exit(1);
    }
}

fn install_metrics(metrics_config: &config::MetricsConfig) {
    let recorder = match StatsdBuilder::from(
        metrics_config.statsd_host.as_str(),
        metrics_config.statsd_port,
    )
    .build(Some("collate"))
    {
        Ok(recorder) => recorder,
        Err(e) => {
            tracing::warn!(error = %e, "could not build statsd recorder");
            return;
        }
    };

    if let Err(e) = metrics::set_global_recorder(recorder) {
        tracing::warn!(error = %e, "metrics recorder already installed");
        return;
    }

    shared::metrics_defs::register(gateway::metrics_defs::ALL_METRICS);
    shared::metrics_defs::register(cms_client::metrics_defs::ALL_METRICS);
}
