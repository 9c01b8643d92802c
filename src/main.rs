use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::{info, warn};

use clashsub::{FileInventory, Settings, SubClashService};

/// Generate a Clash subscription from a panel inventory
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the inventory JSON file
    #[arg(short, long, value_name = "FILE")]
    inventory: PathBuf,

    /// Subscription ID to generate
    #[arg(short, long, value_name = "ID")]
    sub_id: String,

    /// Host clients dial when an inbound lists no external proxies
    #[arg(long, value_name = "HOST")]
    host: String,

    /// Path to the configuration file (TOML, or YAML by extension)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the document here instead of stdout
    #[arg(short, long, value_name = "OUTPUT_FILE")]
    output: Option<PathBuf>,

    /// Write the subscription-userinfo header value here
    #[arg(long, value_name = "FILE")]
    header_output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };
    let inventory = FileInventory::load(&args.inventory).with_context(|| {
        format!("failed to load inventory from {}", args.inventory.display())
    })?;

    let service = SubClashService::new(settings, inventory);
    let Some(subscription) = service.get_clash_yaml(&args.sub_id, &args.host)? else {
        warn!("Subscription {} has no proxies", args.sub_id);
        return Ok(());
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, &subscription.yaml)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!("Successfully wrote subscription to {}", path.display());
        }
        None => print!("{}", subscription.yaml),
    }

    match &args.header_output {
        Some(path) => std::fs::write(path, &subscription.header)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => info!("subscription-userinfo: {}", subscription.header),
    }

    Ok(())
}
