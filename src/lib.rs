pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod db;
pub mod domain;
pub mod entities;
pub mod parser;
pub mod services;

use anyhow::Context;
use clap::Parser;
use cli::{
    Cli, Commands, cmd_catalog, cmd_entities, cmd_entity_info, cmd_import, cmd_jobs,
    cmd_mark_read, cmd_notifications, cmd_scan_sequels,
};
pub use config::Config;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        if let Some(port) = config.observability.metrics_port {
            builder
                .with_http_listener(([0, 0, 0, 0], port))
                .install()
                .context("Failed to install Prometheus exporter")?;
            info!("Prometheus exporter listening on port {}", port);
        } else {
            let _handle = builder
                .install_recorder()
                .context("Failed to install Prometheus recorder")?;
            info!("Prometheus metrics recorder initialized");
        }
    }

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let mut log_level = config.general.log_level.clone();
    if config.general.suppress_connection_errors {
        log_level.push_str(",reqwest::retry=off,hyper_util=off");
    }

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let mut builder = tracing_loki::builder();
        for (key, value) in &config.observability.loki_labels {
            builder = builder.label(key, value)?;
        }
        let (layer, task) = builder.build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Import { file, user, source }) => {
            cmd_import(&config, &file, &user.to_string(), source.as_deref()).await
        }

        Some(Commands::Catalog { user }) => cmd_catalog(&config, &user.to_string()).await,

        Some(Commands::Entities { limit }) => cmd_entities(&config, limit).await,

        Some(Commands::Info { id }) => cmd_entity_info(&config, id).await,

        Some(Commands::Notifications { user, unread }) => {
            cmd_notifications(&config, &user.to_string(), unread).await
        }

        Some(Commands::MarkRead { id, user, all }) => {
            let user = user.map(|u| u.to_string());
            cmd_mark_read(&config, id, user.as_deref(), all).await
        }

        Some(Commands::ScanSequels { user }) => cmd_scan_sequels(&config, &user.to_string()).await,

        Some(Commands::Jobs { limit }) => cmd_jobs(&config, limit).await,

        Some(Commands::Init) => {
            Config::create_default_if_missing()?;
            println!("✓ Config file created. Edit config.toml and run again.");
            Ok(())
        }

        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            Ok(())
        }
    }
}
