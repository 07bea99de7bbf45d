use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "confstore",
    about = "Versioned configuration store with label-filtered config groups",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Print the resolved server configuration as TOML
    ShowConfig(ConfigArgs),
}

#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Address to listen on
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// Consul agent address; selects the Consul backend
    #[arg(long)]
    pub consul: Option<String>,
    /// Disable the global rate limit
    #[arg(long)]
    pub no_rate_limit: bool,
    /// Preload demo configs at startup
    #[arg(long)]
    pub seed: bool,
}

#[derive(Args)]
pub struct ServeArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}
