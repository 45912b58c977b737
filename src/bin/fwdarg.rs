use anyhow::Result;
use clap::Parser;
use fwdarg::{SimulationDriver, SimulationParams};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(about = "Wright-Fisher simulation with ancestry recording and periodic compaction")]
struct Args {
    /// Number of diploids
    #[arg(short = 'N', long, default_value_t = 500)]
    popsize: usize,
    /// Number of diploids in the final sample
    #[arg(short = 'n', long, default_value_t = 5)]
    sample_size: usize,
    /// Random seed
    #[arg(short = 'S', long, default_value_t = 42)]
    seed: u64,
    /// Generations between compactions (0 compacts only at the end)
    #[arg(short = 'G', long, default_value_t = 100)]
    compaction_interval: u64,
    /// Generations to simulate (default: 20 * popsize)
    #[arg(long)]
    generations: Option<u64>,
    /// Effective size of the founder coalescent (default: 2 * popsize)
    #[arg(long)]
    prior_effective_size: Option<f64>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let mut params = SimulationParams::for_popsize(args.popsize);
    if let Some(generations) = args.generations {
        params = params.with_generations(generations);
    }
    params.sample_size = args.sample_size;
    params.seed = args.seed;
    params.compaction_interval = args.compaction_interval;
    if let Some(ne) = args.prior_effective_size {
        params.prior_effective_size = ne;
    }

    let output = SimulationDriver::new(params)?.run()?;
    let (reduced, _) = output.reduce_to_samples()?;

    println!("compactions: {}", output.compaction_records().len());
    println!("nodes: {}", output.tables().num_nodes());
    println!("edges: {}", output.tables().num_edges());
    println!("ancestral samples: {}", output.ancestral_samples().len());
    println!("samples: {}", output.samples().len());
    println!("reduced nodes: {}", reduced.num_nodes());
    println!("reduced edges: {}", reduced.num_edges());
    Ok(())
}
