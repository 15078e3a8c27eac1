use clap::Parser;
use log::info;

use mdd_rs::layer::Layer;
use mdd_rs::mdd::{Diagram, DiagramKind, Mdd};
use mdd_rs::node::OutArcs;
use mdd_rs::reference::{DiagramId, NodeId};
use mdd_rs::types::{Label, Level};
use mdd_rs::visit::Visitor;

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Inclusive label domain of every variable.
    #[arg(long, num_args = 2, value_names = ["LO", "HI"], default_values_t = [0, 2])]
    domain: Vec<Label>,

    /// Number of variables.
    #[arg(long, value_name = "INT", default_value = "4")]
    layers: usize,

    /// Keep only sequences whose labels are pairwise different.
    #[arg(long)]
    all_different: bool,
}

/// Prints a diagram layer by layer.
struct Printer;

impl Visitor for Printer {
    fn visit_diagram(&mut self, id: DiagramId, diagram: &Diagram) {
        println!("diagram {} ({:?}, size {})", id, diagram.kind(), diagram.size());
    }

    fn visit_layer(&mut self, level: Level, layer: &Layer) {
        println!("{}: {} nodes", level, layer.len());
    }

    fn visit_out_arcs(&mut self, id: NodeId, arcs: &OutArcs) {
        for (label, child) in arcs.iter() {
            println!("  {} --{}--> {}", id, label, child);
        }
    }
}

/// Every sequence of `len` labels drawn from `lo..=hi`.
fn sequences(lo: Label, hi: Label, len: usize) -> Vec<Vec<Label>> {
    let mut result = vec![vec![]];
    for _ in 0..len {
        result = result
            .into_iter()
            .flat_map(|prefix| {
                (lo..=hi).map(move |label| {
                    let mut seq = prefix.clone();
                    seq.push(label);
                    seq
                })
            })
            .collect();
    }
    result
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    println!("args = {:?}", args);
    let (lo, hi) = (args.domain[0], args.domain[1]);
    if lo > hi {
        color_eyre::eyre::bail!("empty domain [{}, {}]", lo, hi);
    }

    let mut mdd = Mdd::new();
    let full = mdd.create_diagram(DiagramKind::Plain);
    mdd.set_size(full, args.layers + 1)?;
    for seq in sequences(lo, hi, args.layers) {
        mdd.add_path(full, &seq)?;
    }
    info!("built {} with {} nodes", full, mdd.node_count(full)?);
    mdd.reduce(full)?;
    info!("reduced {} to {} nodes", full, mdd.node_count(full)?);

    let result = if args.all_different {
        let distinct = mdd.create_diagram(DiagramKind::Plain);
        mdd.set_size(distinct, args.layers + 1)?;
        for seq in sequences(lo, hi, args.layers) {
            let mut sorted = seq.clone();
            sorted.sort_unstable();
            sorted.dedup();
            if sorted.len() == seq.len() {
                mdd.add_path(distinct, &seq)?;
            }
        }
        let product = mdd.intersection(full, distinct)?;
        mdd.reduce(product)?;
        product
    } else {
        full
    };

    mdd.accept(result, &mut Printer)?;
    println!("paths: {}", mdd.count_paths(result)?);
    println!("mdd = {:?}", mdd);

    let time_total = time_total.elapsed();
    println!("Done in {:.3} s", time_total.as_secs_f64());

    Ok(())
}
