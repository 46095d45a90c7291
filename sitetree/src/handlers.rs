use crate::server::{self, ServerState};
use anyhow::Context;
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use sitetree_core::crawl::parse_start_url;
use sitetree_core::report::{ReportFormat, generate_report, save_report};
use sitetree_core::{AllowList, AppConfig, CrawlOptions, crawl_site, max_depth_from};
use sitetree_scanner::ProgressCallback;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

fn print_divider() {
    eprintln!("{}", "═".repeat(60).bright_blue().bold());
}

/// Layer `serve` flags over the environment-derived config.
pub fn apply_serve_args(mut config: AppConfig, args: &ArgMatches) -> AppConfig {
    if let Some(port) = args.get_one::<u16>("port") {
        config.port = *port;
    }
    if let Some(host) = args.get_one::<String>("host") {
        config.host = host.clone();
    }
    if let Some(path) = args.get_one::<PathBuf>("allowed-sites") {
        config.allowed_sites_file = path.clone();
    }
    if let Some(dir) = args.get_one::<PathBuf>("static-dir") {
        config.static_dir = dir.clone();
    }
    if args.get_flag("verbose-errors") {
        config.verbose_errors = true;
    }
    config
}

pub async fn handle_serve(args: &ArgMatches) -> anyhow::Result<()> {
    let config = apply_serve_args(AppConfig::from_env()?, args);
    let allow_list = AllowList::load(&config.allowed_sites_file)
        .with_context(|| format!("loading allow-list {}", config.allowed_sites_file.display()))?;

    print_divider();
    eprintln!("{}", "  SITETREE SERVER".bright_white().bold());
    print_divider();
    eprintln!("{} Listening on {}", "→".blue(), config.bind_address().bright_white());
    eprintln!("{} Allowed sites: {}", "→".blue(), allow_list.len());
    eprintln!("{} Static files: {}", "→".blue(), config.static_dir.display());
    if config.verbose_errors {
        eprintln!("{} Verbose errors enabled", "⚠".yellow().bold());
    }
    eprintln!();

    let state = ServerState::new(allow_list, CrawlOptions::default(), config.verbose_errors);
    server::serve(&config, state).await
}

/// Show the path of the page being fetched; the host is fixed per crawl.
pub fn display_path(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.path().to_string())
        .ok()
        .filter(|path| !path.is_empty())
        .unwrap_or_else(|| url.to_string())
}

pub async fn handle_crawl(args: &ArgMatches) -> anyhow::Result<()> {
    let raw_url = args.get_one::<String>("url").context("--url is required")?;
    let url = parse_start_url(raw_url)?;
    let max_depth = max_depth_from(*args.get_one::<i64>("max-depth").unwrap_or(&10))?;
    let format_name = args.get_one::<String>("format").map(String::as_str).unwrap_or("treemap");
    let format = ReportFormat::from_str(format_name).with_context(|| format!("unknown format {}", format_name))?;
    let workers = *args.get_one::<usize>("workers").unwrap_or(&1);
    let output = args.get_one::<PathBuf>("output");

    eprintln!("\n{} Crawling {}", "→".blue(), url.as_str().bright_white());
    eprintln!("{} Workers: {}", "→".blue(), workers);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));

    let spinner_clone = spinner.clone();
    let progress: ProgressCallback = Arc::new(move |worker_id: usize, url: String| {
        spinner_clone.set_message(format!("[{}] {}", worker_id, display_path(&url)));
    });

    let options = CrawlOptions {
        workers,
        ..CrawlOptions::default()
    };
    let crawled = crawl_site(&url, &options, Some(progress)).await;
    spinner.finish_and_clear();

    let mut graph = crawled?;
    eprintln!("{} Crawl complete: {} pages", "✓".green().bold(), graph.len().saturating_sub(1));

    let report = generate_report(&mut graph, format, max_depth)?;

    match output {
        Some(path) => {
            save_report(&report, path).with_context(|| format!("writing {}", path.display()))?;
            eprintln!("{} Saved {} to {}", "✓".green().bold(), format_name, path.display());
        }
        None => println!("{}", report),
    }

    Ok(())
}
