use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wedding_photos::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { host, port }) => {
            wedding_photos::cli::serve::run(&cli.config, host, port).await?;
        }
        Some(Commands::Migrate) => {
            wedding_photos::cli::migrate::run(&cli.config).await?;
        }
        Some(Commands::Stats) => {
            wedding_photos::cli::stats::run(&cli.config).await?;
        }
        Some(Commands::Delete { filename }) => {
            wedding_photos::cli::delete::run(&cli.config, &filename).await?;
        }
        Some(Commands::Rethumb) => {
            wedding_photos::cli::rethumb::run(&cli.config).await?;
        }
        None => {
            // No subcommand provided, print help
            use clap::CommandFactory;
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

/// `DEBUG=true` raises the crate's default level before any config is parsed.
fn default_filter() -> &'static str {
    let debug = std::env::var("DEBUG")
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false);
    if debug {
        "wedding_photos=debug,tower_http=debug"
    } else {
        "wedding_photos=info,tower_http=info"
    }
}
