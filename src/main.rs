use std::{io, path::PathBuf, process::ExitCode};

use clap::{Arg, ArgAction};
use tracing::{error, info, span, Level};
use tracing_subscriber::EnvFilter;

mod adapters;
mod config;
mod fs;
mod ftp;
mod model;
mod path;
mod pattern;
mod shell;
mod util;

#[tokio::main]
async fn main() -> ExitCode {
    let matches = clap::Command::new("objectftp")
        .version(clap::crate_version!())
        .about("FTP-style shell for S3 and GCS buckets")
        .arg(
            Arg::new("LOCATION")
                .help("s3://bucket[/dir], gs://bucket[/dir] or bucket[/dir] to open on start")
                .index(1),
        )
        .arg(
            Arg::new("provider")
                .long("provider")
                .help("provider for locations without a scheme")
                .value_parser(["s3", "gs"])
                .default_value("s3"),
        )
        .arg(
            Arg::new("param")
                .long("param")
                .value_name("KEY=VALUE")
                .help("default transfer parameter, overriding .objectftp.json")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("strict-params")
                .long("strict-params")
                .help("reject transfer parameters the backend does not recognize")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .help("log filter used when RUST_LOG is unset")
                .default_value("warn"),
        )
        .get_matches();

    let level = matches
        .get_one::<String>("log-level")
        .map(String::as_str)
        .unwrap_or("warn");
    tracing_subscriber::fmt()
        .json()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    let span = span!(Level::INFO, "main", context = "main");
    let _e = span.enter();
    info!("called");

    let local_working_dir = match std::env::current_dir() {
        Err(err) => {
            eprintln!("Error: {}", model::fs::FSError::local_io(".", err));
            return ExitCode::FAILURE;
        }
        Ok(dir) => dir,
    };

    let mut overrides = config::ObjectParams::new();
    for arg in matches.get_many::<String>("param").unwrap_or_default() {
        match config::parse_param_override(arg) {
            Err(err) => {
                eprintln!("Error: {}", err);
                return ExitCode::FAILURE;
            }
            Ok((name, value)) => {
                overrides.insert(name, value);
            }
        }
    }

    let home = std::env::var_os("HOME").map(PathBuf::from);
    let default_params =
        match config::load_default_params(&local_working_dir, home.as_deref(), overrides) {
            Err(err) => {
                error!(error_message=%err, error_group="config");
                eprintln!("Error: {}", err);
                return ExitCode::FAILURE;
            }
            Ok(params) => params,
        };

    let provider = match matches
        .get_one::<String>("provider")
        .map(|p| util::object::parse_provider(p))
    {
        Some(Err(err)) => {
            eprintln!("Error: {}", err);
            return ExitCode::FAILURE;
        }
        Some(Ok(provider)) => provider,
        None => util::object::Provider::AWS,
    };

    let mut fs = fs::ObjectFS::new(
        Box::new(adapters::CloudConnector {}),
        local_working_dir,
        provider,
        default_params,
        matches.get_flag("strict-params"),
    );

    if let Some(location) = matches.get_one::<String>("LOCATION") {
        info!(location = location, "args");
        if let Err(err) = fs.open(location) {
            eprintln!("Error: {}", err);
        }
    }

    let stdin = io::stdin();
    match shell::run(&mut fs, stdin.lock(), io::stdout(), io::stderr()) {
        Err(err) => {
            error!(error_message=%err, error_group="shell");
            ExitCode::FAILURE
        }
        Ok(()) => ExitCode::SUCCESS,
    }
}
