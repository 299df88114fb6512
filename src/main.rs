use std::{error::Error, path::PathBuf};

use clap::Parser;
use indicatif::MultiProgress;

use epoch_slice::{
    config::{Config, DEFAULT_CONFIG_PATH},
    convert::{PostprocessOptions, postprocess},
    write::Endianess,
};

#[derive(Parser, Debug)]
struct Args {
    /// Simulation output directory with one `.npz` snapshot per timestep.
    run_dir: PathBuf,
    /// Post-processing configuration (YAML).
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[arg(long, value_enum, default_value = "big")]
    endianess: Endianess,
    /// Log and skip snapshots that fail instead of stopping.
    #[arg(long)]
    skip_failed: bool,
}

fn main() -> Result<(), Box<dyn Error + Sync + Send>> {
    let env = env_logger::Env::default().filter_or("RUST_LOG", "info");
    env_logger::init_from_env(env);

    let args = Args::parse();

    let options = PostprocessOptions {
        config: Config::load(&args.config)?,
        run_dir: args.run_dir,
        endianess: args.endianess,
        skip_failed: args.skip_failed,
    };

    postprocess(&options, &MultiProgress::new())?;

    Ok(())
}
