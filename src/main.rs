use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use simplelog::{ColorChoice, Config as LogConfig, LevelFilter, TermLogger, TerminalMode};

use netweave_migration::{Migrator, MigratorTrait};

mod collector;
mod config;
mod error;
mod model;
mod oid;
mod persist;
mod scheduler;
mod snmp;

use crate::collector::Registry;
use crate::config::{split_community, Config};
use crate::error::CollectorError;
use crate::persist::Writer;
use crate::scheduler::{Explorer, UdpFactory};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Start with toml configuration file.
    let config: Config = Figment::from(Toml::file("netweave.toml"))
        // Override with anything set in environment variables.
        .merge(Env::prefixed("NETWEAVE_"))
        // Override with anything set via flags.
        .merge(Serialized::defaults(Config::parse()))
        .extract()?;

    let level = match config.log_level.as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };
    TermLogger::init(
        level,
        LogConfig::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    let default_db_name = "netweave.db".to_string();
    let database_name = config.database.as_ref().unwrap_or(&default_db_name);
    let database_url = format!("sqlite://{}?mode=rwc", database_name);
    let db = sea_orm::Database::connect(&database_url).await?;
    Migrator::up(&db, None).await?;

    let writer = Writer::new(db).with_expiry(config.fdb_expire, config.arp_expire);
    let factory = Arc::new(UdpFactory::new(
        Duration::from_secs(config.timeout),
        config.tries,
    ));
    let explorer = Arc::new(Explorer::new(
        config.clone(),
        Registry::new(),
        writer,
        factory,
    ));

    // One-shot refresh of a single device, then exit.
    if let Some(entry) = &config.explore {
        let (host, community) = split_community(entry);
        let addr: Ipv4Addr = host.parse()?;
        explorer.start_explore_ip(addr, community.as_deref()).await?;
        return Ok(());
    }

    // Targets must be configured (typically in `netweave.toml` or NETWEAVE_TARGETS.)
    if config.targets.is_empty() {
        eprintln!("\nNo targets configured.");
        println!("Usage: netweave --targets <TARGET1,TARGET2,...>\n");
        std::process::exit(1);
    }

    if config.interval == 0 {
        explorer.start_exploration()?;
        while explorer.is_exploring() {
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
        return Ok(());
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(config.interval * 60));
    loop {
        ticker.tick().await;
        match explorer.start_exploration() {
            Ok(()) => {}
            Err(CollectorError::AlreadyRunning) => {
                log::warn!("previous exploration still running, skipping this interval");
            }
            Err(e) => return Err(e.into()),
        }
    }
}
