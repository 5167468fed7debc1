use anyhow::{anyhow, Result};
use is_terminal::IsTerminal;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wordcrab::error::Error::DNSError;
use wordcrab::{Config, Shared, Zones};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_init();

    let mut first_args = std::env::args().take(2);
    let (program_name, config_file) = (
        first_args.next().unwrap_or("wordcrab".to_string()),
        first_args.next(),
    );

    let config = config_init(&program_name, config_file)?;
    let store = config.slot_store().await?;
    let registry = Arc::new(config.name_registry(store).await?);
    let zones = Arc::new(Zones::from_config(&config, &registry)?);
    let registrar = config.registrar(registry);

    if std::io::stdout().is_terminal() {
        println!("{}", wordcrab::crab::CRAB);
    }

    tracing::info!("DNS listening on UDP {}", &config.dns_udp_bind_addr);
    tracing::info!("DNS listening on TCP {}", &config.dns_tcp_bind_addr);
    let dns_server = wordcrab::dns::new(config.clone(), zones).await?;
    let dns_handle = tokio::spawn(dns_server.block_until_done());

    // The API only serves registrations, skip it without words zones.
    let api_handle = if registrar.is_empty() {
        tracing::info!("no words zones configured, API disabled");
        tokio::spawn(std::future::pending::<hyper::Result<()>>())
    } else {
        tracing::info!("API listening on {}", &config.api_bind_addr);
        tokio::spawn(wordcrab::api::new(config.clone(), registrar))
    };

    tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::info!("quitting from signal");
        },
        Ok(dns_res) = dns_handle => {
            if let Err(err) = dns_res {
                return Err(DNSError(err).into())
            }
        }
        Ok(api_res) = api_handle => {
            if let Err(err) = api_res {
                return Err(err.into())
            }
        }
    }
    tracing::info!("goodbye");
    Ok(())
}

fn tracing_init() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wordcrab=info".into()),
        )
        .init();
}

fn config_init(program_name: &str, config_file: Option<String>) -> Result<Shared> {
    match config_file {
        None => Err(anyhow!("usage: {program_name} /path/to/config.json")),
        Some(config_file) => {
            let config = Config::try_from_file(&config_file)?;
            tracing::debug!("loaded config from {config_file}");
            Ok(Arc::new(config))
        }
    }
}
