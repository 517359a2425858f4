use std::{
    fs::{self, File},
    io::{BufWriter, Write as _},
    path::{Path, PathBuf},
};

use anyhow::{Context as _, ensure};
use chrono::Utc;
use log::{info, warn};
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg64;
use snevo_network::NetworkModel;
use snevo_training::{EvolutionEngine, EvolutionParams, GenerationReport, Genome, Population};

use crate::{config::TrainingConfig, model::network_summary::NetworkSummary, util::Output};

const LOG_FILE_NAME: &str = "evolution_log.csv";
const BEST_NETWORK_NAME: &str = "best_network";

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Training configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Saved network to seed the initial population with
    #[arg(long)]
    resume: Option<PathBuf>,
    /// Number of generations, overriding the configuration
    #[arg(long)]
    generations: Option<usize>,
    /// Random seed, overriding the configuration
    #[arg(long)]
    seed: Option<u64>,
    /// Output directory, overriding the configuration
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let TrainArg {
        config,
        resume,
        generations,
        seed,
        output_dir,
    } = arg;

    let mut config = TrainingConfig::load_or_default(config.as_deref())?;
    if let Some(generations) = generations {
        config.generations = *generations;
    }
    if seed.is_some() {
        config.seed = *seed;
    }
    if let Some(output_dir) = output_dir {
        config.output_dir.clone_from(output_dir);
    }
    config.validate()?;
    ensure!(config.generations > 0, "generations must be positive");

    let seed = config.seed.unwrap_or_else(|| rand::rng().random());
    let params = config.evolution_params();
    let evaluator = config.evaluator()?;
    info!(
        "training {} genomes {:?} for {} generations (seed {seed})",
        params.population_size, params.layer_sizes, config.generations
    );

    let mut engine = match resume.as_deref().map(|path| resume_engine(&params, path, seed)) {
        Some(Ok(engine)) => engine,
        Some(Err(err)) => {
            warn!("{err:#}; starting from a fresh population");
            EvolutionEngine::new(params, seed)?
        }
        None => EvolutionEngine::new(params, seed)?,
    };

    let output_dir = &config.output_dir;
    fs::create_dir_all(output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            output_dir.display()
        )
    })?;
    let mut log = EvolutionLog::create(output_dir.join(LOG_FILE_NAME))?;

    let mut last_checkpoint = None;
    for _ in 0..config.generations {
        let report = engine.evaluate(evaluator.as_ref())?;
        log.append(&report)?;
        print_report(&report);

        let completed = report.generation + 1;
        if completed % config.save_interval == 0 {
            save_checkpoint(&engine, output_dir, completed)?;
            last_checkpoint = Some(completed);
        }
        if completed < config.generations {
            engine.evolve()?;
        }
    }
    if last_checkpoint != Some(config.generations) {
        save_checkpoint(&engine, output_dir, config.generations)?;
    }

    let best = engine
        .best()
        .context("No genome was evaluated during training")?;
    let network_path = output_dir.join(format!("{BEST_NETWORK_NAME}.bin"));
    best.network()
        .save(&network_path)
        .with_context(|| format!("Failed to save network: {}", network_path.display()))?;

    let summary = NetworkSummary {
        name: BEST_NETWORK_NAME.to_owned(),
        trained_at: Utc::now(),
        final_fitness: best.fitness(),
        generations: config.generations,
        layer_sizes: best.network().layer_sizes().to_vec(),
        hidden_activation: best.network().hidden_activation(),
        state_encoding: config.state_encoding,
        edge_policy: config.edge_policy,
        board_width: config.board_width,
        board_height: config.board_height,
        max_steps_without_food: config.max_steps_without_food,
        initial_length: config.initial_length,
        fitness: config.fitness,
        seed,
    };
    let summary_path = output_dir.join(format!("{BEST_NETWORK_NAME}.json"));
    Output::save_json(&summary, Some(summary_path.clone()))?;

    eprintln!();
    eprintln!("Training completed");
    eprintln!("  Network: {}", network_path.display());
    eprintln!("  Summary: {}", summary_path.display());
    eprintln!("  Log: {}", log.path.display());
    eprintln!("  Trained at: {}", summary.trained_at);
    eprintln!("  Final fitness: {:.3}", summary.final_fitness);
    eprintln!("  Topology: {:?}", summary.layer_sizes);

    Ok(())
}

/// Builds an engine whose population descends from the network at `path`.
fn resume_engine(
    params: &EvolutionParams,
    path: &Path,
    seed: u64,
) -> anyhow::Result<EvolutionEngine> {
    let mut network = NetworkModel::zeros(&params.layer_sizes, params.hidden_activation)?;
    network
        .load_into(path)
        .with_context(|| format!("Failed to resume from {}", path.display()))?;
    info!("resuming from {}", path.display());

    let mut rng = Pcg64::seed_from_u64(seed);
    let population = Population::from_seed_network(
        network,
        params.population_size,
        params.mutation_rate,
        params.mutation_strength,
        &mut rng,
    );
    let engine = EvolutionEngine::with_population(params.clone(), population, rng.random())?;
    Ok(engine)
}

fn save_checkpoint(engine: &EvolutionEngine, dir: &Path, generation: usize) -> anyhow::Result<()> {
    let Some(best) = engine.best() else {
        return Ok(());
    };
    let path = dir.join(checkpoint_file_name(generation, best));
    best.network()
        .save(&path)
        .with_context(|| format!("Failed to save checkpoint: {}", path.display()))?;
    info!("saved checkpoint {}", path.display());
    Ok(())
}

fn checkpoint_file_name(generation: usize, best: &Genome) -> String {
    format!(
        "{BEST_NETWORK_NAME}_gen{generation}_fit{:.2}.bin",
        best.fitness()
    )
}

fn print_report(report: &GenerationReport) {
    let GenerationReport {
        generation,
        fitness,
        diversity,
        best_so_far,
    } = report;
    eprintln!("Generation #{generation}:");
    eprintln!("  Fitness Stats:");
    eprintln!("    Best:   {:.3}", fitness.best);
    eprintln!("    Worst:  {:.3}", fitness.worst);
    eprintln!("    Mean:   {:.3}", fitness.mean);
    eprintln!("    Median: {:.3}", fitness.median);
    eprintln!("    Stddev: {:.3}", fitness.std_dev);
    eprintln!("  Diversity:    {diversity:.4}");
    eprintln!("  Best so far:  {best_so_far:.3}");
}

/// Per-generation CSV log.
#[derive(Debug)]
struct EvolutionLog {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl EvolutionLog {
    const HEADER: &'static str = "generation,best_fitness,average_fitness,diversity";

    fn create(path: PathBuf) -> anyhow::Result<Self> {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create log file: {}", path.display()))?;
        let mut log = Self {
            writer: BufWriter::new(file),
            path,
        };
        log.write_line(Self::HEADER)?;
        Ok(log)
    }

    fn append(&mut self, report: &GenerationReport) -> anyhow::Result<()> {
        self.write_line(&format_log_row(report))
    }

    fn write_line(&mut self, line: &str) -> anyhow::Result<()> {
        writeln!(self.writer, "{line}")
            .and_then(|()| self.writer.flush())
            .with_context(|| format!("Failed to write log file: {}", self.path.display()))
    }
}

fn format_log_row(report: &GenerationReport) -> String {
    format!(
        "{},{},{},{}",
        report.generation, report.fitness.best, report.fitness.mean, report.diversity
    )
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use snevo_network::Activation;
    use snevo_training::FitnessStats;

    use super::*;

    fn report() -> GenerationReport {
        GenerationReport {
            generation: 3,
            fitness: FitnessStats::new([1.0, 2.5, 4.0]).unwrap(),
            diversity: 0.25,
            best_so_far: 4.0,
        }
    }

    #[test]
    fn test_log_row() {
        assert_eq!(format_log_row(&report()), "3,4,2.5,0.25");
    }

    #[test]
    fn test_checkpoint_file_name() {
        let mut genome = Genome::new(NetworkModel::zeros(&[6, 4], Activation::Relu).unwrap());
        genome.set_fitness(123.456);
        assert_eq!(
            checkpoint_file_name(10, &genome),
            "best_network_gen10_fit123.46.bin"
        );
    }

    #[test]
    fn test_log_file_contents() {
        let path = std::env::temp_dir().join(format!("snevo-log-{}.csv", std::process::id()));
        {
            let mut log = EvolutionLog::create(path.clone()).unwrap();
            log.append(&report()).unwrap();
        }
        let contents = fs::read_to_string(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(contents, format!("{}\n3,4,2.5,0.25\n", EvolutionLog::HEADER));
    }

    #[test]
    fn test_resume_from_missing_file_fails() {
        let params = EvolutionParams::default();
        let path = std::env::temp_dir().join("snevo-does-not-exist.bin");
        assert!(resume_engine(&params, &path, 0).is_err());
    }

    #[test]
    fn test_resume_seeds_population() {
        let params = EvolutionParams {
            population_size: 6,
            layer_sizes: vec![6, 8, 4],
            elite_count: 1,
            ..EvolutionParams::default()
        };
        let mut rng = Pcg64::seed_from_u64(1);
        let network = NetworkModel::random(&params.layer_sizes, Activation::Relu, &mut rng).unwrap();
        let path = std::env::temp_dir().join(format!("snevo-resume-{}.bin", std::process::id()));
        network.save(&path).unwrap();
        let engine = resume_engine(&params, &path, 5).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(engine.population().len(), 6);
        assert_eq!(engine.population().genomes()[0].network(), &network);
    }
}
