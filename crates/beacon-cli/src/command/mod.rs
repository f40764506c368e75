use clap::{Parser, Subcommand};

use self::{play::PlayArg, train::TrainArg};

mod play;
mod train;

/// File the trained policy is written to and replayed from by default.
pub(crate) const DEFAULT_MODEL_PATH: &str = "winner-movetobeacon.json";

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Evolve a move-to-beacon policy and save the best genome
    Train(#[clap(flatten)] TrainArg),
    /// Replay one episode with a saved policy
    Play(#[clap(flatten)] PlayArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Train(arg) => train::run(&arg)?,
        Mode::Play(arg) => play::run(&arg)?,
    }
    Ok(())
}
