use std::path::PathBuf;

use snevo_network::Activation;
use snevo_training::FitnessStats;

use crate::util;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct InspectArg {
    /// Saved network to inspect
    #[arg(long)]
    genome: PathBuf,
}

pub(crate) fn run(arg: &InspectArg) -> anyhow::Result<()> {
    let InspectArg { genome } = arg;
    // Parameters are stored without the activation, which inspection never uses.
    let network = util::load_network(genome, Activation::default())?;

    println!("Network: {}", genome.display());
    println!("  Topology:   {:?}", network.layer_sizes());
    println!("  Parameters: {}", network.parameter_count());
    for (i, layer) in network.layers().iter().enumerate() {
        println!("  Layer #{i} ({} -> {}):", layer.inputs(), layer.outputs());
        print_summary("Weights", layer.weights());
        print_summary("Biases", layer.biases());
    }
    if let Some(summary) = parameter_stats(&network.to_flat()) {
        println!("  All parameters:");
        print_summary_line("", summary);
    }
    Ok(())
}

/// Distribution of parameter values; `worst` and `best` are the minimum and maximum.
fn parameter_stats(values: &[f64]) -> Option<FitnessStats> {
    FitnessStats::new(values.iter().copied())
}

fn print_summary(label: &str, values: &[f64]) {
    if let Some(summary) = parameter_stats(values) {
        println!("    {label}:");
        print_summary_line("  ", summary);
    }
}

fn print_summary_line(indent: &str, summary: FitnessStats) {
    let FitnessStats {
        best: max,
        worst: min,
        mean,
        median,
        std_dev,
    } = summary;
    println!(
        "    {indent}Min: {min:.4}  Max: {max:.4}  Mean: {mean:.4}  Median: {median:.4}  Stddev: {std_dev:.4}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_stats() {
        assert_eq!(parameter_stats(&[]), None);
        let summary = parameter_stats(&[-1.0, 1.0, 3.0, 1.0]).unwrap();
        assert_eq!(summary.worst, -1.0);
        assert_eq!(summary.best, 3.0);
        assert_eq!(summary.mean, 1.0);
        assert_eq!(summary.median, 1.0);
        assert_eq!(summary.std_dev, 2.0_f64.sqrt());
    }

    #[test]
    fn test_missing_genome_is_an_error() {
        let arg = InspectArg {
            genome: std::env::temp_dir().join("snevo-missing-inspect.bin"),
        };
        assert!(run(&arg).is_err());
    }
}
