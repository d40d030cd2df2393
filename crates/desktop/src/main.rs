//! `shopledger` entry point.

use std::process::ExitCode;

use clap::Parser;

use shopledger_desktop::{AppConfig, Cli, run};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = AppConfig::from_cli(&cli);
    shopledger_observability::init(config.log_format);

    let mut stdout = std::io::stdout().lock();
    match run(cli.command, &config, &mut stdout).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
