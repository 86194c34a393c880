use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use podtail::cluster::HttpCluster;
use podtail::{config, tail};

#[derive(Parser, Debug)]
#[command(name = "podtail")]
#[command(about = "Follow the logs of one or more pod replicas")]
#[command(version)]
struct Args {
    /// Pods to follow: configured group aliases, or names prefix-matched
    /// against the live pod list
    #[arg(required = true)]
    names: Vec<String>,

    /// Namespace to search for pods (overrides the configured one)
    #[arg(long, short)]
    namespace: Option<String>,

    /// Path to config file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Disable the dimmed label styling
    #[arg(long)]
    no_color: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Diagnostics go to stderr so the merged log stream on stdout stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("podtail=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = config::load(args.config.as_deref())?;
    if let Some(namespace) = args.namespace {
        config.cluster.namespace = namespace;
    }

    let cluster = Arc::new(HttpCluster::new(&config.cluster)?);

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_token.cancel();
        }
    });

    let color = !args.no_color && std::io::stdout().is_terminal();
    let mut stdout = tokio::io::stdout();

    tail::run(
        cluster,
        &args.names,
        &config.groups,
        color,
        shutdown,
        &mut stdout,
    )
    .await
}
