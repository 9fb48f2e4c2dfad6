use clap::{Parser, Subcommand};
use nnscope::codec::TopologyVariant;
use nnscope::config::Config;
use nnscope::error::Result;
use nnscope::output;
use nnscope::render;
use nnscope::run::{select_step, RunLayout, Session, Source};
use nnscope::stats::Stats;
use std::io::{self, Write};
use std::path::PathBuf;

/// Inspect nanowire-network simulation snapshots
#[derive(Parser)]
#[command(name = "nnscope", version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print load stats to stderr
    #[arg(long, global = true)]
    stats: bool,

    /// Topology files end with the engine's component map
    #[arg(long, global = true)]
    with_map: bool,

    /// Also write the edge list of the selected step
    #[arg(long, global = true)]
    edges: bool,

    /// Step to output (defaults to the last one loaded)
    #[arg(long, global = true)]
    step: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a device folder written by the engine
    Device {
        /// Device id (folder `device_<ID>`)
        device: i32,
        /// Number of state snapshots to load
        state_count: usize,
        /// Folder holding the device folders (overrides the config)
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Load explicit files
    Files {
        /// Topology file
        network: PathBuf,
        /// State files, in step order
        #[arg(required = true)]
        states: Vec<PathBuf>,
        /// Interface file
        #[arg(long)]
        interface: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut stats = if cli.stats { Some(Stats::new()) } else { None };

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let mut options = config.session_options();
    if cli.with_map {
        options.decode.variant = TopologyVariant::WithComponentMap;
    }

    let (source, count) = match cli.command {
        Command::Device {
            device,
            state_count,
            root,
        } => {
            let root = root.or(config.root).unwrap_or_else(|| PathBuf::from("."));
            (Source::Layout(RunLayout::new(root, device)), state_count)
        }
        Command::Files {
            network,
            states,
            interface,
        } => {
            let count = states.len();
            let source = Source::Files {
                topology: network,
                interface,
                states,
            };
            (source, count)
        }
    };
    let step = select_step(count, cli.step)?;

    let session = Session::open(source, options, stats.as_mut())?;
    let states = session.load_states(count, stats.as_mut())?;
    let state = &states[step];

    let step = step as i32;
    let interface = match session.load_interface(step, stats.as_mut())? {
        Some(interface) => Some(interface),
        None => session.load_mea(step, stats.as_mut())?.map(|mea| mea.to_interface()),
    };
    if let Some(interface) = interface {
        tracing::info!(
            sources = interface.sources.len(),
            grounds = interface.grounds.len(),
            loads = interface.loads.len(),
            "interface loaded"
        );
    }
    if let Some(largest) = session.load_component(0, stats.as_mut())? {
        if largest.wires_count != session.components.dominant_size() {
            tracing::warn!(
                engine = largest.wires_count,
                mapped = session.components.dominant_size(),
                "largest exported component differs from the dominant one"
            );
        }
    }
    if let Some((lo, hi)) = render::voltage_range(&states) {
        tracing::info!(min = lo, max = hi, "voltage range");
    }
    if let Some((lo, hi)) = render::admittance_range(&states) {
        tracing::info!(min = lo, max = hi, "admittance range");
    }

    let nodes = render::node_layout(&session.topology, &session.components, state)?;
    let dominant = session.components.dominant_members();
    let edge_state = if state.size() == session.topology.wires_count() {
        session.components.largest_state(state)?
    } else {
        state.clone()
    };

    let mut summary = Vec::new();
    output::write_summary(&session.datasheet, &session.topology, &session.components, &mut summary)?;
    io::stderr().write_all(&summary)?;

    let mut stdout = io::stdout().lock();
    output::write_nodes_csv(&nodes, &mut stdout)?;
    if cli.edges {
        writeln!(stdout)?;
        output::write_edges_csv(&edge_state, Some(&dominant), &mut stdout)?;
    }

    if let Some(ref stats) = stats {
        stats.display();
    }
    Ok(())
}
