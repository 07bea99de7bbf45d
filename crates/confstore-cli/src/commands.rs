use anyhow::Context;
use colored::Colorize;
use confstore_server::{BackendConfig, ConfStoreServer, ServerConfig};
use confstore_store::ConsulConfig;

use crate::cli::{Cli, Command, ConfigArgs, ServeArgs};

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args),
        Command::ShowConfig(args) => cmd_show_config(args),
    }
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = resolve_config(&args.config)?;
    let backend = match &config.backend {
        BackendConfig::Memory => "memory".to_string(),
        BackendConfig::Consul(consul) => format!("consul at {}", consul.address),
    };
    println!(
        "{} confstore on {} ({})",
        "▶".green().bold(),
        config.bind_addr.to_string().bold(),
        backend.yellow()
    );

    let server = ConfStoreServer::new(config).context("failed to set up backend")?;
    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    runtime.block_on(server.serve())?;
    println!("{} Stopped.", "✓".green());
    Ok(())
}

fn cmd_show_config(args: ConfigArgs) -> anyhow::Result<()> {
    let config = resolve_config(&args)?;
    print!("{}", toml::to_string(&config)?);
    Ok(())
}

/// File, then environment, then command-line flags.
fn resolve_config(args: &ConfigArgs) -> anyhow::Result<ServerConfig> {
    let mut config =
        ServerConfig::load(args.config.as_deref()).with_context(|| match &args.config {
            Some(path) => format!("failed to load {}", path.display()),
            None => "failed to load configuration".to_string(),
        })?;
    apply_flags(&mut config, args);
    Ok(config)
}

fn apply_flags(config: &mut ServerConfig, args: &ConfigArgs) {
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(address) = &args.consul {
        match &mut config.backend {
            BackendConfig::Consul(consul) => consul.address = address.clone(),
            BackendConfig::Memory => {
                config.backend = BackendConfig::Consul(ConsulConfig {
                    address: address.clone(),
                    ..ConsulConfig::default()
                });
            }
        }
    }
    if args.no_rate_limit {
        config.rate_limit.enabled = false;
    }
    if args.seed {
        config.seed_demo_data = true;
    }
}
