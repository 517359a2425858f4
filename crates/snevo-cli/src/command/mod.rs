use clap::{Parser, Subcommand};

use self::{
    evaluate::EvaluateArg, init_config::InitConfigArg, inspect::InspectArg, train::TrainArg,
};

mod evaluate;
mod init_config;
mod inspect;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Evolve snake-playing networks with the genetic algorithm
    Train(#[clap(flatten)] TrainArg),
    /// Play a saved network without training it
    Evaluate(#[clap(flatten)] EvaluateArg),
    /// Print the topology and parameter statistics of a saved network
    Inspect(#[clap(flatten)] InspectArg),
    /// Write the default training configuration
    InitConfig(#[clap(flatten)] InitConfigArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Train(arg) => train::run(&arg)?,
        Mode::Evaluate(arg) => evaluate::run(&arg)?,
        Mode::Inspect(arg) => inspect::run(&arg)?,
        Mode::InitConfig(arg) => init_config::run(&arg)?,
    }
    Ok(())
}
