use clap::Parser;

use mdd_rs::stochastic::dichotomous::DichotomousFilter;
use mdd_rs::stochastic::polynomial::PolynomialFilter;
use mdd_rs::stochastic::pseudo_linear::PseudoLinearFilter;
use mdd_rs::stochastic::{apply_bounds, CostThreshold, MinCostFilter, Outcome, StochasticVariable};

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Smallest admissible aggregate cost.
    #[arg(long, value_name = "INT", default_value = "60")]
    min_cost: i64,

    /// Largest admissible aggregate cost.
    #[arg(long, value_name = "INT", default_value = "90")]
    max_cost: i64,

    /// Refinement passes of the dichotomous filter.
    #[arg(long, value_name = "INT", default_value = "8")]
    passes: usize,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Debug,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let args = Cli::parse();
    println!("args = {:?}", args);

    // Precision 2: values and probabilities are hundredths.
    let mut vars = vec![
        StochasticVariable::new(2, [Outcome::new(10, 50), Outcome::new(40, 30), Outcome::new(90, 20)])?,
        StochasticVariable::new(2, [Outcome::new(25, 100)])?,
        StochasticVariable::new(2, [Outcome::new(0, 40), Outcome::new(100, 60)])?,
        StochasticVariable::new(2, [Outcome::new(5, 20), Outcome::new(60, 80)])?,
    ];
    let threshold = CostThreshold::new(args.min_cost, args.max_cost);

    let filters: [(&str, &dyn MinCostFilter); 3] = [
        ("pseudo-linear", &PseudoLinearFilter),
        ("polynomial", &PolynomialFilter),
        ("dichotomous", &DichotomousFilter::new(args.passes)),
    ];

    let mut agreed = None;
    for (name, filter) in filters {
        let time = std::time::Instant::now();
        let bounds = filter.filter(&vars, threshold)?;
        let time = time.elapsed();
        println!("{:>14}: {:?} in {:.3} ms", name, bounds, time.as_secs_f64() * 1000.0);
        if let Some(previous) = &agreed {
            assert_eq!(previous, &bounds, "{} disagrees", name);
        }
        agreed = Some(bounds);
    }

    if let Some(bounds) = agreed {
        apply_bounds(&mut vars, &bounds)?;
        for (i, var) in vars.iter().enumerate() {
            let q = var.quantity();
            println!("x{}: quantity [{}, {}], cost [{}, {}]", i, q.min, q.max, var.cost(q.min), var.cost(q.max));
        }
    }

    Ok(())
}
