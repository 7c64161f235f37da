//! Campaign Discovery CLI
//!
//! One-shot queries against a live LCD endpoint:
//!
//!   campaign_discovery page ["status:open rocket"] [page] [size]
//!   campaign_discovery campaign <address-or-name>
//!   campaign_discovery featured
//!   campaign_discovery all
//!
//! Configuration comes from the environment (see `DiscoveryConfig::from_env`).

use campaign_discovery::models::Campaign;
use campaign_discovery::{DiscoveryConfig, DiscoveryEngine, LcdClient};

use eyre::{bail, Result};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .compact()
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("page");

    let config = DiscoveryConfig::from_env()?;
    let client = LcdClient::new(&config)?;
    let engine = DiscoveryEngine::with_client(config, Arc::new(client));

    match command {
        "page" => {
            let query = args.get(1).map(String::as_str).unwrap_or("");
            let page = parse_arg(&args, 2)?.unwrap_or(1);
            let size = parse_arg(&args, 3)?.unwrap_or(engine.config().page_size);

            let result = engine.get_page(query, page, size).await?;
            for campaign in &result.campaigns {
                print_row(campaign);
            }
            println!(
                "-- page {} ({} campaigns){}",
                page,
                result.campaigns.len(),
                if result.has_more { ", more available" } else { "" }
            );
        }
        "campaign" => {
            let Some(input) = args.get(1) else {
                bail!("usage: campaign_discovery campaign <address-or-name>");
            };
            let address = engine.resolve_campaign_address(input).await?;
            let response = engine.get_campaign(&address, true).await;
            match (response.campaign, response.error) {
                (Some(campaign), _) => println!("{}", serde_json::to_string_pretty(&campaign)?),
                (None, Some(error)) => bail!(error),
                (None, None) => bail!("campaign {} not found", address),
            }
        }
        "featured" => {
            for campaign in engine.featured_campaigns().await? {
                print_row(&campaign);
            }
        }
        "all" => {
            let campaigns = engine.all_campaigns().await?;
            for campaign in &campaigns {
                print_row(campaign);
            }
            println!("-- {} campaigns", campaigns.len());
        }
        other => bail!("unknown command: {} (expected page, campaign, featured or all)", other),
    }

    Ok(())
}

fn parse_arg(args: &[String], index: usize) -> Result<Option<usize>> {
    match args.get(index) {
        Some(raw) => match raw.parse() {
            Ok(value) => Ok(Some(value)),
            Err(_) => bail!("expected a number, got {}", raw),
        },
        None => Ok(None),
    }
}

fn print_row(campaign: &Campaign) {
    println!(
        "{:<10} {:>6.1}%  {}  {}{}",
        campaign.status,
        campaign.progress_percent(),
        campaign.address,
        campaign.name,
        if campaign.featured { "  ★" } else { "" }
    );
}
