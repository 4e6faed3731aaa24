pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "packdeal",
    about = "Packdeal operator CLI",
    long_about = "Operate the pack service: migrations, config inspection, readiness checks, demo data and offline pricing.",
    after_help = "Examples:\n  packdeal doctor --json\n  packdeal seed\n  packdeal quote --discount 10 --price 20.00 --price 30.00"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Insert the demo pack set, skipping packs whose name already exists")]
    Seed,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, catalog credentials, and DB connectivity checks")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "List stored packs with their product counts")]
    List,
    #[command(about = "Price a set of product amounts at a discount without touching the store")]
    Quote {
        #[arg(long, allow_hyphen_values = true, help = "Discount percentage as submitted")]
        discount: String,
        #[arg(long = "price", help = "Minimum variant price of one product (repeatable)")]
        prices: Vec<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::List => commands::list::run(),
        Command::Quote { discount, prices } => commands::quote::run(&discount, &prices),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
