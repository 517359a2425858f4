use std::path::{Path, PathBuf};

use anyhow::ensure;
use log::info;
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg64;
use serde::Serialize;
use snevo_engine::SimulationOutcome;
use snevo_evaluator::{EpisodeEvaluator, ScoreOutcome};
use snevo_network::NetworkModel;

use crate::{
    config::TrainingConfig,
    model::network_summary::NetworkSummary,
    util::{self, Output},
};

const DEFAULT_EPISODES: usize = 10;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct EvaluateArg {
    /// Saved network to play
    #[arg(long)]
    genome: PathBuf,
    /// Configuration file with the board and encoding the network was trained on
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of episodes to play
    #[arg(long, default_value_t = DEFAULT_EPISODES)]
    episodes: usize,
    /// Random seed of the episode boards
    #[arg(long)]
    seed: Option<u64>,
    /// Output file path for the JSON report
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
struct EpisodeReport {
    seed: u64,
    fitness: f64,
    #[serde(flatten)]
    outcome: SimulationOutcome,
}

#[derive(Debug, Clone, Serialize)]
struct EvaluationReport {
    genome: PathBuf,
    layer_sizes: Vec<usize>,
    mean_fitness: f64,
    mean_score: f64,
    max_score: usize,
    episodes: Vec<EpisodeReport>,
}

pub(crate) fn run(arg: &EvaluateArg) -> anyhow::Result<()> {
    let EvaluateArg {
        genome,
        config,
        episodes,
        seed,
        output,
    } = arg;
    ensure!(*episodes > 0, "episodes must be positive");

    let config = resolve_config(genome, config.as_deref())?;
    let network = util::load_network(genome, config.hidden_activation)?;
    ensure!(
        network.layer_sizes() == config.layer_sizes,
        "network topology {:?} does not match the configured topology {:?}",
        network.layer_sizes(),
        config.layer_sizes
    );
    config.validate()?;

    let seed = (*seed).or(config.seed).unwrap_or_else(|| rand::rng().random());
    info!(
        "evaluating {} over {episodes} episodes (seed {seed})",
        genome.display()
    );
    let mut rng = Pcg64::seed_from_u64(seed);
    let seeds = (0..*episodes).map(|_| rng.random()).collect::<Vec<u64>>();

    let report = evaluate_network(&network, &config, &seeds, genome)?;
    for (i, episode) in report.episodes.iter().enumerate() {
        let outcome = &episode.outcome;
        let cause = outcome
            .cause
            .map_or_else(|| "running".to_owned(), |cause| cause.to_string());
        eprintln!(
            "  Episode {i:3}: score {:3}, steps {:5}, visited {:4}/{}, {cause} => {:.3}",
            outcome.score,
            outcome.steps_survived,
            outcome.cells_visited,
            outcome.board_cells,
            episode.fitness
        );
    }
    eprintln!();
    eprintln!("  Mean fitness: {:.3}", report.mean_fitness);
    eprintln!("  Mean score:   {:.3}", report.mean_score);
    eprintln!("  Max score:    {}", report.max_score);

    Output::save_json(&report, output.clone())?;
    Ok(())
}

/// Picks the settings the network is played with.
///
/// An explicit configuration file wins; otherwise the summary written next to
/// the network by `train` is used when present, then the defaults.
fn resolve_config(genome: &Path, config_path: Option<&Path>) -> anyhow::Result<TrainingConfig> {
    if config_path.is_some() {
        return TrainingConfig::load_or_default(config_path);
    }
    let mut config = TrainingConfig::default();
    let summary_path = genome.with_extension("json");
    if summary_path.is_file() {
        info!("using settings from {}", summary_path.display());
        NetworkSummary::open(&summary_path)?.apply_to(&mut config);
    }
    Ok(config)
}

fn evaluate_network(
    network: &NetworkModel,
    config: &TrainingConfig,
    seeds: &[u64],
    genome: &Path,
) -> anyhow::Result<EvaluationReport> {
    let player = EpisodeEvaluator::new(config.board_config()?, config.state_encoding, ());
    let scorer = config.scorer();

    let episodes = seeds
        .iter()
        .map(|&seed| -> anyhow::Result<EpisodeReport> {
            let outcome = player.play(network, seed)?;
            Ok(EpisodeReport {
                seed,
                fitness: scorer.score_outcome(&outcome),
                outcome,
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    #[expect(clippy::cast_precision_loss)]
    let count = episodes.len() as f64;
    #[expect(clippy::cast_precision_loss)]
    let total_score = episodes.iter().map(|e| e.outcome.score as f64).sum::<f64>();
    Ok(EvaluationReport {
        genome: genome.to_path_buf(),
        layer_sizes: network.layer_sizes().to_vec(),
        mean_fitness: episodes.iter().map(|e| e.fitness).sum::<f64>() / count,
        mean_score: total_score / count,
        max_score: episodes.iter().map(|e| e.outcome.score).max().unwrap_or(0),
        episodes,
    })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use snevo_engine::StateEncoding;
    use snevo_evaluator::FitnessEvaluator as _;
    use snevo_network::Activation;

    use super::*;

    fn minimal_config() -> TrainingConfig {
        TrainingConfig {
            state_encoding: StateEncoding::Minimal,
            layer_sizes: vec![6, 8, 4],
            ..TrainingConfig::default()
        }
    }

    #[test]
    fn test_report_matches_fitness_evaluator() {
        let config = minimal_config();
        let mut rng = Pcg64::seed_from_u64(8);
        let network = NetworkModel::random(&config.layer_sizes, Activation::Relu, &mut rng).unwrap();
        let seeds = [3, 4, 5];

        let report = evaluate_network(&network, &config, &seeds, Path::new("net.bin")).unwrap();
        let expected = config.evaluator().unwrap().evaluate(&network, &seeds).unwrap();
        assert_eq!(report.episodes.len(), 3);
        assert!((report.mean_fitness - expected).abs() < 1e-9);
        assert_eq!(
            report.episodes.iter().map(|e| e.seed).collect::<Vec<_>>(),
            seeds
        );

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["episodes"][0]["steps_survived"].is_number());
    }

    #[test]
    fn test_missing_genome_is_an_error() {
        let arg = EvaluateArg {
            genome: std::env::temp_dir().join("snevo-missing-genome.bin"),
            episodes: 1,
            ..EvaluateArg::default()
        };
        assert!(run(&arg).is_err());
    }

    #[test]
    fn test_resolve_config_without_summary_uses_defaults() {
        let genome = std::env::temp_dir().join("snevo-no-summary.bin");
        assert_eq!(
            resolve_config(&genome, None).unwrap(),
            TrainingConfig::default()
        );
    }
}
