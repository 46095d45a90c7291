use clap::{arg, command};

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("sitetree")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("sitetree")
        .styles(CLAP_STYLING)
        .subcommand_required(true)
        .subcommand(
            command!("serve")
                .about("Serve treemap and treegraph JSON for allow-listed sites, plus the static frontend")
                .arg(
                    arg!(-p --"port" <PORT>)
                        .required(false)
                        .help("Port to listen on (overrides PORT)")
                        .value_parser(clap::value_parser!(u16)),
                )
                .arg(
                    arg!(--"host" <HOST>)
                        .required(false)
                        .help("Address to bind (overrides HOST)"),
                )
                .arg(
                    arg!(-a --"allowed-sites" <PATH>)
                        .required(false)
                        .help("Newline-delimited file of hostnames that may be crawled (overrides ALLOWED_SITES_FILE)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-s --"static-dir" <PATH>)
                        .required(false)
                        .help("Directory of static files served on every other GET path (overrides STATIC_DIR)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(--"verbose-errors")
                        .required(false)
                        .help("Return error details to HTTP clients")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            command!("crawl")
                .about("Crawl one site and print or save its link tree")
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The URL to start crawling from"),
                )
                .arg(
                    arg!(-d --"max-depth" <DEPTH>)
                        .required(false)
                        .help("Levels of the tree to render")
                        .value_parser(clap::value_parser!(i64))
                        .default_value("10"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Output format: treemap, treegraph, csv")
                        .value_parser(["treemap", "treegraph", "csv"])
                        .default_value("treemap"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save output to file (default: print to stdout)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-t --"workers" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of async crawl workers")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("1"),
                ),
        )
}
