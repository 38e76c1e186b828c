mod api;
mod cli;
mod comparison;
mod dashboard;
mod feed;
mod logging;
mod model;
mod orchestrator;
#[cfg(test)]
mod test_support;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;

use clap::Parser;

#[tokio::main]
async fn main() {
    let args = cli::Cli::parse();
    let is_dashboard = args.opens_dashboard();

    if let Err(e) = cli::run(args).await {
        // Subcommand logs already go to stderr.
        if is_dashboard {
            tracing::error!("{e:#}");
        }
        eprintln!("{e:#}");
        std::process::exit(1);
    }
    // Subcommands may leave the blocking output writer parked; exit explicitly.
    if !is_dashboard {
        std::process::exit(0);
    }
}
