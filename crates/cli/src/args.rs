use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "defcred")]
#[command(version = "0.1.0")]
#[command(about = "Fingerprint HTTP services and build default-credential login attempts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    Scan {
        /// Targets. Example: 10.0.0.1,10.0.0.0/28,printer.local:8080
        #[arg(short = 't', long, required_unless_present = "target_file")]
        targets: Option<String>,

        /// File with one target per line (e.g. host:port pairs of open ports)
        #[arg(long)]
        target_file: Option<PathBuf>,

        /// Directory of YAML credential signatures
        #[arg(short = 'C', long, default_value = "./creds")]
        catalog: PathBuf,

        /// Only use signatures whose name contains this text
        #[arg(short, long)]
        name: Option<String>,

        /// Only use signatures of this category
        #[arg(long)]
        category: Option<String>,

        /// Request timeout in seconds
        #[arg(long, default_value = "10")]
        timeout: u64,

        /// Outbound proxy, e.g. http://127.0.0.1:8080 or socks5://127.0.0.1:9050
        #[arg(long)]
        proxy: Option<String>,

        /// User-Agent for fingerprint requests
        #[arg(long)]
        user_agent: Option<String>,

        /// Max concurrent probes
        #[arg(short, long, default_value = "10")]
        concurrency: usize,

        /// When a matched signature's CSRF token or session cookie is missing,
        /// skip only that signature instead of the whole probe
        #[arg(long)]
        skip_entry_on_missing_token: bool,

        /// Output format: table, json, csv
        #[arg(short, long, default_value = "table", value_parser = ["table", "text", "json", "csv"])]
        output_format: String,
    },
}
