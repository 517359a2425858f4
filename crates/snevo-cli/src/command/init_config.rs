use std::path::PathBuf;

use crate::{config::TrainingConfig, util::Output};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct InitConfigArg {
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &InitConfigArg) -> anyhow::Result<()> {
    let InitConfigArg { output } = arg;
    Output::save_json(&TrainingConfig::default(), output.clone())?;
    if let Some(path) = output {
        eprintln!("Default configuration written to {}", path.display());
    }
    Ok(())
}
