use clap::Parser;
use colored::Colorize;
use env_logger::Env;
use std::time::Instant;

use rfi::cli::{execute, Cli};
use rfi::{ApiErrorKind, Client, Error};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let start = Instant::now();

    let result = match cli.global.client_config() {
        Ok(config) => match Client::new(config) {
            Ok(client) => execute(&cli, &client).await,
            Err(e) => Err(e.into()),
        },
        Err(e) => Err(e),
    };

    if cli.global.verbose {
        eprintln!("{} {:.2?}", "Elapsed:".dimmed(), start.elapsed());
    }

    if let Err(e) = result {
        eprintln!("\n{} {}\n", "Error:".red().bold(), e);
        if let Some(err) = e.downcast_ref::<Error>() {
            print_hint(err);
        }
        std::process::exit(1);
    }
}

fn print_hint(err: &Error) {
    match err {
        Error::Config(_) => {
            eprintln!("{}", "💡 Suggestion:".yellow());
            eprintln!("   - Set RFI_EMAIL and RFI_PASSWORD, or RFI_TOKEN");
            eprintln!("   - Or pass --auth email:password / --auth bearer:TOKEN");
        }
        Error::Authentication(_) => {
            eprintln!("{}", "💡 Possible causes:".yellow());
            eprintln!("   - Wrong email or password");
            eprintln!("   - Token expired and no credentials to refresh it");
        }
        Error::Timeout(_) => {
            eprintln!("{}", "💡 Suggestion:".yellow());
            eprintln!("   - Increase timeout with --timeout <seconds>");
            eprintln!("   - Check if the server is responsive");
        }
        Error::Connection(_) => {
            eprintln!("{}", "💡 Possible causes:".yellow());
            eprintln!("   - Check your network connection");
            eprintln!("   - Check --base-url / RFI_BASE_URL");
        }
        Error::Api { .. } => match err.kind() {
            Some(ApiErrorKind::NotFound) => {
                eprintln!("{}", "💡 The id does not exist or is not visible to you".yellow());
            }
            Some(ApiErrorKind::RateLimited) => {
                eprintln!("{}", "💡 Rate limited, wait a moment and retry".yellow());
            }
            _ => {}
        },
        _ => {}
    }
}
