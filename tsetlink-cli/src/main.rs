use std::net::IpAddr;
use std::time::Duration;

use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tsetlink_api::config::{EnvironmentOptions, GatewaySettings, PORT_VAR};
use tsetlink_api::environment::{Environment, Launch};
use tsetlink_api::tsetlink_core::network::TcpGateway;
use tsetlink_api::tsetlink_core::types::Value;

#[derive(Parser, Debug)]
#[command(name = "tsetlink")]
#[command(about = "Drive a remote dataflow engine through its gateway", long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct GatewayArgs {
    /// Gateway port; falls back to T2_PORT
    #[arg(long)]
    port: Option<u16>,
    /// Gateway host; falls back to T2_HOST, then 127.0.0.1
    #[arg(long)]
    host: Option<IpAddr>,
}

impl GatewayArgs {
    fn settings(&self, bootstrap: bool) -> anyhow::Result<GatewaySettings> {
        self.resolve(bootstrap, |key| std::env::var(key).ok())
    }

    /// Flags win over the variables read through `lookup`.
    fn resolve<F>(&self, bootstrap: bool, lookup: F) -> anyhow::Result<GatewaySettings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = match self.port {
            Some(port) => GatewaySettings::from_lookup(|key| match key {
                PORT_VAR => Some(port.to_string()),
                _ => lookup(key),
            })?,
            None => GatewaySettings::from_lookup(lookup)?,
        };
        if let Some(host) = self.host {
            settings.host = host;
        }
        settings.bootstrap = bootstrap;
        Ok(settings)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Submit a job: push configuration and resources, then commit
    Submit {
        #[command(flatten)]
        gateway: GatewayArgs,
        #[arg(long)]
        name: Option<String>,
        /// Configuration override as KEY=VALUE, repeatable
        #[arg(long = "config", value_parser = parse_config)]
        config: Vec<(String, Value)>,
        /// Resource request as CPU:RAM_MB:INSTANCES, repeatable
        #[arg(long = "resource", value_parser = parse_resource)]
        resources: Vec<(f64, u32, u32)>,
        #[arg(long, default_value_t = 5000)]
        grace_ms: u64,
    },
    /// Print the worker id of a session
    WorkerId {
        #[command(flatten)]
        gateway: GatewayArgs,
    },
    /// Print the engine's configuration
    Config {
        #[command(flatten)]
        gateway: GatewayArgs,
    },
    /// List the predefined functions the engine offers
    Functions {
        #[command(flatten)]
        gateway: GatewayArgs,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::filter::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::filter::EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Submit {
            gateway,
            name,
            config,
            resources,
            grace_ms,
        } => {
            let settings = gateway.settings(true)?;
            let mut options = EnvironmentOptions::default()
                .with_submit_grace(Duration::from_millis(grace_ms));
            options.name = name;
            options.config = config;
            for (cpu, ram_mb, instances) in resources {
                options = options.with_resource(cpu, ram_mb, instances);
            }
            launch(&settings, options)?;
            println!("job submitted via {}", settings.addr());
        }
        Commands::WorkerId { gateway } => {
            let env = session(&gateway.settings(false)?)?;
            println!("worker_id={}", env.worker_id()?);
        }
        Commands::Config { gateway } => {
            let env = session(&gateway.settings(false)?)?;
            for (key, value) in env.config()? {
                println!("{}={}", key, value);
            }
        }
        Commands::Functions { gateway } => {
            let env = session(&gateway.settings(false)?)?;
            println!("functions={}", env.functions().names().len());
            for name in env.functions().names() {
                println!("{}", name);
            }
        }
    }
    Ok(())
}

fn launch(settings: &GatewaySettings, options: EnvironmentOptions) -> anyhow::Result<Launch> {
    tracing::debug!(addr = %settings.addr(), bootstrap = settings.bootstrap, "connecting");
    let gateway = TcpGateway::connect(settings.addr())?;
    Environment::launch(gateway, settings.bootstrap, options)
}

fn session(settings: &GatewaySettings) -> anyhow::Result<Environment> {
    match launch(settings, EnvironmentOptions::default())? {
        Launch::Session(env) => Ok(env),
        Launch::Submitted => Err(anyhow!("gateway settings requested the bootstrap leg")),
    }
}

/// Parse `KEY=VALUE`, reading the value as bool, int, float, then string.
fn parse_config(input: &str) -> anyhow::Result<(String, Value)> {
    let (key, raw) = input
        .split_once('=')
        .ok_or_else(|| anyhow!("expected KEY=VALUE, got {:?}", input))?;
    if key.is_empty() {
        anyhow::bail!("empty configuration key in {:?}", input);
    }
    let value = if let Ok(b) = raw.parse::<bool>() {
        Value::Bool(b)
    } else if let Ok(i) = raw.parse::<i64>() {
        Value::Int(i)
    } else if let Ok(x) = raw.parse::<f64>() {
        Value::Float(x)
    } else {
        Value::Str(raw.to_string())
    };
    Ok((key.to_string(), value))
}

fn parse_resource(input: &str) -> anyhow::Result<(f64, u32, u32)> {
    let parts: Vec<&str> = input.split(':').collect();
    let [cpu, ram, instances] = parts.as_slice() else {
        anyhow::bail!("expected CPU:RAM_MB:INSTANCES, got {:?}", input);
    };
    Ok((
        cpu.parse().with_context(|| format!("invalid cpu in {:?}", input))?,
        ram.parse().with_context(|| format!("invalid ram in {:?}", input))?,
        instances
            .parse()
            .with_context(|| format!("invalid instance count in {:?}", input))?,
    ))
}
