#![allow(clippy::print_stdout)]

use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::Parser;
use gradflow::{Graph, GraphDescription, Network};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Infers the layouts of a graph, validates them and dumps its nodes.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// JSON description of the graph to inspect.
    #[arg(short, long, env = "GRADFLOW_GRAPH")]
    graph: PathBuf,

    /// Only dump the node with this id.
    #[arg(short, long)]
    node: Option<String>,

    /// Emit logs as JSON.
    #[arg(long, env = "GRADFLOW_LOG_JSON")]
    log_json: bool,
}

fn init_logging(json: bool) -> anyhow::Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr);
    if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    }
    .map_err(|e| anyhow!(e))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_json)?;

    let description = GraphDescription::load(&args.graph)
        .with_context(|| format!("loading {}", args.graph.display()))?;
    let graph = Graph::from_description(description)?;
    graph.finalize_layouts()?;

    match &args.node {
        Some(id) => {
            let node = graph
                .node(id)
                .with_context(|| format!("no primitive with id {id:?}"))?;
            println!("{node}");
        }
        None => println!("{}", graph.dump_all()),
    }

    let network = Network::build(&graph).context("validating graph")?;
    info!(
        network = %network.id(),
        instances = network.instances().len(),
        "all instances validated"
    );
    Ok(())
}
