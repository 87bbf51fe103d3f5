use std::str::FromStr;

use clap::Parser;
use gossipd::config::{Mode, NodeConfig};
use gossipd::log_layer::GossipLogLayer;
use gossipd::node::GossipNode;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Epidemic dissemination node: joins an overlay over UDP, gossips peers
/// and application payloads, tolerates packet loss and churn.
#[derive(Debug, Parser)]
#[command(name = "gossipd", version, about)]
struct Cli {
    #[arg(long)]
    port: u16,

    #[arg(long)]
    bootstrap: Option<String>,

    #[arg(long, default_value_t = 3)]
    fanout: usize,

    #[arg(long, default_value_t = 8)]
    ttl: u32,

    #[arg(long = "peer-limit", default_value_t = 20)]
    peer_limit: usize,

    #[arg(long = "ping-interval", default_value_t = 2.0)]
    ping_interval: f64,

    #[arg(long = "peer-timeout", default_value_t = 6.0)]
    peer_timeout: f64,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    #[arg(long, default_value = "push")]
    mode: String,

    #[arg(long = "pull-interval", default_value_t = 2.0)]
    pull_interval: f64,

    #[arg(long = "ihave-max-ids", default_value_t = 32)]
    ihave_max_ids: usize,

    #[arg(long = "pow-k", default_value_t = 0)]
    pow_k: u32,

    /// Repeatable; raises the default log level. RUST_LOG still overrides.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(port: u16, verbosity: u8) {
    let default_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(GossipLogLayer::stderr(port))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.port, cli.verbose);

    let mode = Mode::from_str(&cli.mode).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let config = NodeConfig {
        port: cli.port,
        bootstrap: cli.bootstrap,
        fanout: cli.fanout,
        ttl: cli.ttl,
        peer_limit: cli.peer_limit,
        ping_interval: cli.ping_interval,
        peer_timeout: cli.peer_timeout,
        seed: cli.seed,
        mode,
        pull_interval: cli.pull_interval,
        ihave_max_ids: cli.ihave_max_ids,
        pow_k: cli.pow_k,
    };

    let (node, _handle) = GossipNode::bind(config).await?;
    node.run().await;
    Ok(())
}
