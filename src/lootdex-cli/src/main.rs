mod cli;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::*;
use commands::Indexed;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load()?;
    let format = cli.format;
    let open = || Indexed::open(cli.catalog.as_deref(), &config);

    match cli.command {
        Commands::Drops { entity } => {
            commands::drops::drops(&open()?, &entity.join(" "), format)?;
        }

        Commands::Sources { item } => {
            commands::drops::sources(&open()?, &item.join(" "), format)?;
        }

        Commands::Bag { item } => {
            let query = (!item.is_empty()).then(|| item.join(" "));
            commands::bag::handle(&open()?, query.as_deref(), format)?;
        }

        Commands::Classify {
            item,
            all,
            no_heuristic,
        } => {
            let query = (!all).then(|| item.join(" "));
            let heuristic = (!no_heuristic).then(|| config.heuristic());
            commands::classify::handle(&open()?, query.as_deref(), heuristic, format)?;
        }

        Commands::Bosses { mod_name } => {
            commands::drops::bosses(&open()?, mod_name.as_deref(), format)?;
        }

        Commands::Stats => commands::stats::handle(&open()?, format)?,

        Commands::Configure { set_catalog, show } => {
            commands::configure::handle(set_catalog, show)?;
        }
    }

    Ok(())
}

/// Log to stderr so table and JSON output stay clean
fn init_tracing(verbose: bool) {
    let default = if verbose { "lootdex=debug" } else { "lootdex=info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
