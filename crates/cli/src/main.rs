mod args;
mod runner;
mod output;

use anyhow::Result;
use clap::Parser;

use args::{Cli, Commands};
use runner::{run_scan, ScanArgs};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    defcred_telemetry::init_logging(cli.verbose, cli.log_json);

    match cli.command {
        Commands::Scan {
            targets,
            target_file,
            catalog,
            name,
            category,
            timeout,
            proxy,
            user_agent,
            concurrency,
            skip_entry_on_missing_token,
            output_format,
        } => {
            run_scan(ScanArgs {
                targets,
                target_file,
                catalog,
                name,
                category,
                timeout,
                proxy,
                user_agent,
                concurrency,
                skip_entry_on_missing_token,
                output_format,
            })
            .await?;
        }
    }

    Ok(())
}
