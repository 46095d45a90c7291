use colored::Colorize;
use sitetree::commands::command_argument_builder;
use sitetree::{handle_crawl, handle_serve};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let matches = command_argument_builder().get_matches();

    let outcome = match matches.subcommand() {
        Some(("serve", args)) => handle_serve(args).await,
        Some(("crawl", args)) => handle_crawl(args).await,
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = outcome {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}
